//! Cutscene instruction catalog.
//!
//! Ordinals are the values written to binary scripts, so existing variants
//! must never be renumbered. `0` is reserved for host-defined (custom)
//! instructions and never appears as a catalog entry.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::Serialize;

/// Wire value of a custom (host-defined) instruction.
pub const CUSTOM_ORDINAL: u8 = 0x00;

macro_rules! opcodes {
    ($( $(#[$meta:meta])* $name:ident = $value:literal, )+) => {
        /// Built-in cutscene instruction.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        #[repr(u8)]
        pub enum Opcode {
            $( $(#[$meta])* $name = $value, )+
        }

        impl Opcode {
            /// Every catalog entry in ordinal order.
            pub const ALL: &'static [Opcode] = &[$(Opcode::$name,)+];

            pub fn name(self) -> &'static str {
                match self {
                    $(Opcode::$name => stringify!($name),)+
                }
            }

            pub fn from_u8(value: u8) -> Option<Self> {
                match value {
                    $($value => Some(Opcode::$name),)+
                    _ => None,
                }
            }
        }
    };
}

opcodes! {
    /// Wait a number of milliseconds. Number 1: milliseconds.
    Wait = 1,
    /// String 1: sound name. String 2: file path. String 3 (optional): loop file path.
    LoadSound = 2,
    /// String 1: sound name.
    UnloadSound = 3,
    /// String 1: sound name. Float 1 (optional): volume. Bool 1 (optional): unload when finished.
    PlaySound = 4,
    /// String 1: name prefix. String 2: file path. String 3 (optional): loop path. Float 1 (optional): volume.
    PlayIndependentSound = 5,
    /// String 1: sound name.
    ResumeSound = 6,
    /// String 1: sound name.
    PauseSound = 7,
    /// String 1: sound name.
    StopSound = 8,
    /// String 1: sound name. Decimal 1: days. Double 1: hours. Float 1: minutes.
    /// Int 1: seconds. UInt 1: milliseconds. All numbers optional.
    SoundPosition = 9,
    /// String 1: sound name. Float 1: volume.
    SoundVolume = 10,
    /// Load or replace a drawing. String 1: drawing name. String 2: image path.
    /// Bool 1 (optional): survives the end of the cutscene.
    LoadDrawing = 11,
    /// String 1: drawing name. Float 1: width. Float 2: height. Int 1-3: RGB.
    /// Int 4 (optional): alpha. Bool 1 (optional): persistence.
    LoadImageFromColor = 12,
    /// String 1: drawing name. Bool 1 (optional): persistence, toggles when absent.
    DrawingPersistence = 13,
    /// String 1: drawing name. Bool 1 (optional): ignore camera, toggles when absent.
    DrawingIgnoreCamera = 14,
    /// String 1: drawing name. Number 1: X.
    DrawingX = 15,
    /// String 1: drawing name. Number 1: Y.
    DrawingY = 16,
    /// String 1: drawing name. Number 1: width.
    DrawingWidth = 17,
    /// String 1: drawing name. Number 1: height.
    DrawingHeight = 18,
    /// String 1: drawing name. Number 1: velocity X, units per second.
    DrawingVelocityX = 19,
    /// String 1: drawing name. Number 1: velocity Y, units per second.
    DrawingVelocityY = 20,
    /// String 1: drawing name. Number 1: acceleration X.
    DrawingAccelerationX = 21,
    /// String 1: drawing name. Number 1: acceleration Y.
    DrawingAccelerationY = 22,
    /// Suspend until the drawing reaches a position. String 1: drawing name.
    /// Number 1: X. Number 2: Y.
    DrawingWaitTillPosition = 23,
    /// String 1: drawing name. UInt/Int 1: binary angle units (0 - 0x10000).
    /// Double 1: radians. Float 1: degrees.
    DrawingRotation = 24,
    /// String 1: drawing name. Either String 2: named anchor, or Number 1/2: origin X/Y.
    DrawingOrigin = 25,
    /// String 1: drawing name. Number 1: layer depth.
    DrawingLayerDepth = 26,
    /// String 1: drawing name. String 2: `none`, `fliphorizontal`, `flipvertical` or `both`.
    DrawingSpriteEffects = 27,
    /// String 1: drawing name. Number 1: X scale.
    DrawingScaleX = 28,
    /// String 1: drawing name. Number 1: Y scale.
    DrawingScaleY = 29,
    /// String 1: drawing name. Int 1-3: RGB. Int 4 (optional): alpha.
    DrawingColor = 30,
    /// String 1: drawing name. Number 1: fade time in milliseconds.
    FadeDrawing = 31,
    /// String 1: drawing name. Number 1: unfade time in milliseconds.
    UnfadeDrawing = 32,
    /// String 1: drawing name.
    ShowDrawing = 33,
    /// String 1: drawing name.
    HideDrawing = 34,
    /// Stretch a drawing over the whole resolution. String 1: drawing name.
    MaximizeDrawing = 35,
    /// String 1: drawing name. String 2: sprite group.
    ChangeDrawingSpriteGroup = 36,
    /// String 1: drawing name.
    UnloadDrawing = 37,
    /// Reserved.
    LoadFont = 38,
    /// Reserved.
    StringIndentation = 39,
    /// Reserved.
    StringAlignment = 40,
    /// Reserved.
    StringScale = 41,
    /// Reserved.
    String = 42,
    /// Reserved.
    Message = 43,
    /// Reserved.
    UnloadFont = 44,
    /// Suspend until a game button is pushed. String 1: button.
    WaitForButton = 45,
    /// Suspend until any game button is pushed.
    WaitForAnyButton = 46,
    /// String 1: button.
    ButtonDown = 47,
    /// String 1: button.
    ButtonUp = 48,
    /// String 1: button.
    PushButton = 49,
    /// String 1: button.
    BlockInput = 50,
    /// String 1: button.
    AllowInput = 51,
    BlockAllInputs = 52,
    AllowAllInputs = 53,
    /// Forward the instruction to the host. String 1: object group.
    Signal = 54,
    /// Reserved.
    X = 55,
    /// Reserved.
    Y = 56,
    /// Reserved.
    WaitTillPosition = 57,
    /// Reserved.
    Show = 58,
    /// Reserved.
    Hide = 59,
    /// Reserved.
    VelocityX = 60,
    /// Reserved.
    VelocityY = 61,
    /// Reserved.
    ApplyForceX = 62,
    /// Reserved.
    ApplyForceY = 63,
    /// Reserved.
    StopForceX = 64,
    /// Reserved.
    StopForceY = 65,
    /// Reserved.
    ChangeSpriteGroup = 66,
    /// Reserved.
    ChangeDrawing = 67,
    /// Reserved.
    EnableCollision = 68,
    /// Reserved.
    DisableCollision = 69,
    /// Number 1: camera X.
    CameraX = 70,
    /// Number 1: camera Y.
    CameraY = 71,
    /// Number 1: camera velocity X.
    CameraVelocityX = 72,
    /// Number 1: camera velocity Y.
    CameraVelocityY = 73,
    /// Number 1: camera acceleration X.
    CameraAccelerationX = 74,
    /// Number 1: camera acceleration Y.
    CameraAccelerationY = 75,
    /// Suspend until the camera reaches a position. Number 1: X. Number 2: Y.
    CameraWaitTillPosition = 76,
    ExitGame = 77,
    /// String 1: scene. Bool 1 (optional): initialize the scene.
    ChangeScene = 78,
    /// Number 1: width. Number 2: height.
    ChangeSize = 79,
    /// Number 1: width. Number 2: height. Bool 1 (optional): also change the window size.
    ChangeResolution = 80,
    /// Bool 1 (optional): fullscreen, toggles when absent.
    Fullscreen = 81,
    /// Bool 1 (optional): force the resolution on resize, toggles when absent.
    ForceResizeResolution = 82,
    /// String 1: title.
    WindowTitle = 83,
    /// End of script.
    Fin = 255,
}

static NAME_LOOKUP: Lazy<HashMap<String, Opcode>> = Lazy::new(|| {
    Opcode::ALL
        .iter()
        .map(|&opcode| (opcode.name().to_ascii_lowercase(), opcode))
        .collect()
});

impl Opcode {
    /// Case-insensitive catalog lookup. `None` means the name is a custom
    /// instruction.
    pub fn from_name(name: &str) -> Option<Self> {
        NAME_LOOKUP.get(&name.to_ascii_lowercase()).copied()
    }

    pub fn ordinal(self) -> u8 {
        self as u8
    }

    /// Instructions that leave the interpreter suspended after dispatch.
    pub fn suspends(self) -> bool {
        matches!(
            self,
            Opcode::Wait
                | Opcode::DrawingWaitTillPosition
                | Opcode::WaitForButton
                | Opcode::WaitForAnyButton
                | Opcode::CameraWaitTillPosition
        )
    }

    /// Catalog entries with no runtime behaviour in the cutscene core.
    pub fn is_reserved(self) -> bool {
        matches!(
            self,
            Opcode::LoadFont
                | Opcode::StringIndentation
                | Opcode::StringAlignment
                | Opcode::StringScale
                | Opcode::String
                | Opcode::Message
                | Opcode::UnloadFont
                | Opcode::X
                | Opcode::Y
                | Opcode::WaitTillPosition
                | Opcode::Show
                | Opcode::Hide
                | Opcode::VelocityX
                | Opcode::VelocityY
                | Opcode::ApplyForceX
                | Opcode::ApplyForceY
                | Opcode::StopForceX
                | Opcode::StopForceY
                | Opcode::ChangeSpriteGroup
                | Opcode::ChangeDrawing
                | Opcode::EnableCollision
                | Opcode::DisableCollision
        )
    }
}

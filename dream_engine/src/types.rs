use serde::Serialize;

/// RGBA tint with 8-bit channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const WHITE: Rgba = Rgba::new(255, 255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Scripts pass channels as ints; out-of-range values wrap like a byte cast.
    pub fn from_script(r: i32, g: i32, b: i32, a: Option<i32>) -> Self {
        Self::new(r as u8, g as u8, b as u8, a.map_or(255, |value| value as u8))
    }

    /// Premultiplied scale of every channel, used for opacity.
    pub fn scaled(self, factor: f32) -> Self {
        let scale = |channel: u8| (f32::from(channel) * factor).round().clamp(0.0, 255.0) as u8;
        Self::new(scale(self.r), scale(self.g), scale(self.b), scale(self.a))
    }
}

impl Default for Rgba {
    fn default() -> Self {
        Rgba::WHITE
    }
}

/// 16-bit binary angle: 0x10000 units per turn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Angle(pub u16);

const UNITS_PER_RADIAN: f64 = 10_430.378_35;
const UNITS_PER_DEGREE: f64 = 182.044_444_444_444_44;

impl Angle {
    /// Angles past a full turn, or negative ones, wrap modulo 0x10000.
    pub fn from_radians(radians: f64) -> Self {
        Angle::wrapping(radians * UNITS_PER_RADIAN)
    }

    pub fn from_degrees(degrees: f32) -> Self {
        Angle::wrapping(f64::from(degrees) * UNITS_PER_DEGREE)
    }

    fn wrapping(units: f64) -> Self {
        Angle(units as i64 as u16)
    }

    pub fn radians(self) -> f64 {
        f64::from(self.0) / UNITS_PER_RADIAN
    }

    pub fn degrees(self) -> f64 {
        f64::from(self.0) / UNITS_PER_DEGREE
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SpriteEffects {
    #[default]
    None,
    FlipHorizontal,
    FlipVertical,
    FlipBoth,
}

impl SpriteEffects {
    /// Unknown names fall back to no flipping.
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "fliphorizontal" => SpriteEffects::FlipHorizontal,
            "flipvertical" => SpriteEffects::FlipVertical,
            "both" | "flipboth" => SpriteEffects::FlipBoth,
            _ => SpriteEffects::None,
        }
    }
}

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;
use std::time::Duration;

use anyhow::Result;
use dream_formats::Instruction;
use glam::Vec2;
use serde::Serialize;

use crate::interpreter::{CustomHandler, Step};
use crate::services::{
    AudioService, DrawParams, GraphicsService, InputService, Services, Visual, WindowService,
};
use crate::types::Rgba;

/// Size reported for every image the recording graphics service "loads".
pub const RECORDED_IMAGE_SIZE: Vec2 = Vec2::new(64.0, 64.0);

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HostEvent {
    LoadSound {
        name: String,
        path: String,
        loop_path: Option<String>,
    },
    UnloadSound {
        name: String,
    },
    PlaySound {
        name: String,
        volume: f32,
        unload_on_finish: bool,
    },
    PlayIndependentSound {
        prefix: String,
        path: String,
        loop_path: Option<String>,
        volume: f32,
    },
    ResumeSound {
        name: String,
    },
    PauseSound {
        name: String,
    },
    StopSound {
        name: String,
    },
    SeekSound {
        name: String,
        millis: u64,
    },
    SoundVolume {
        name: String,
        volume: f32,
    },
    ButtonDown {
        button: String,
    },
    ButtonUp {
        button: String,
    },
    PushButton {
        button: String,
    },
    BlockInput {
        button: String,
        blocked: bool,
    },
    BlockAllInputs {
        blocked: bool,
    },
    ButtonPressed {
        button: String,
    },
    LoadImage {
        path: String,
    },
    SolidColor {
        color: Rgba,
        size: Vec2,
    },
    SpriteGroup {
        visual: String,
        group: String,
    },
    Draw {
        visual: String,
        params: DrawParams,
    },
    ExitGame,
    ChangeScene {
        scene: String,
        initialize: bool,
    },
    ChangeSize {
        width: i32,
        height: i32,
    },
    ChangeResolution {
        width: i32,
        height: i32,
        change_size: bool,
    },
    Fullscreen {
        enabled: bool,
    },
    ForceResizeResolution {
        enabled: bool,
    },
    WindowTitle {
        title: String,
    },
    Custom {
        name: String,
    },
    Signal {
        group: String,
    },
}

/// Shared, cloneable log of host calls.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Rc<RefCell<Vec<HostEvent>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, event: HostEvent) {
        self.events.borrow_mut().push(event);
    }

    pub fn events(&self) -> Vec<HostEvent> {
        self.events.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }
}

#[derive(Clone, Default)]
pub struct RecordingAudio {
    log: EventLog,
}

impl AudioService for RecordingAudio {
    fn load(&mut self, name: &str, path: &str, loop_path: Option<&str>) -> Result<()> {
        self.log.record(HostEvent::LoadSound {
            name: name.to_string(),
            path: path.to_string(),
            loop_path: loop_path.map(str::to_string),
        });
        Ok(())
    }

    fn unload(&mut self, name: &str) {
        self.log.record(HostEvent::UnloadSound {
            name: name.to_string(),
        });
    }

    fn play(&mut self, name: &str, volume: f32, unload_on_finish: bool) {
        self.log.record(HostEvent::PlaySound {
            name: name.to_string(),
            volume,
            unload_on_finish,
        });
    }

    fn play_independent(
        &mut self,
        prefix: &str,
        path: &str,
        loop_path: Option<&str>,
        volume: f32,
    ) -> Result<()> {
        self.log.record(HostEvent::PlayIndependentSound {
            prefix: prefix.to_string(),
            path: path.to_string(),
            loop_path: loop_path.map(str::to_string),
            volume,
        });
        Ok(())
    }

    fn resume(&mut self, name: &str) {
        self.log.record(HostEvent::ResumeSound {
            name: name.to_string(),
        });
    }

    fn pause(&mut self, name: &str) {
        self.log.record(HostEvent::PauseSound {
            name: name.to_string(),
        });
    }

    fn stop(&mut self, name: &str) {
        self.log.record(HostEvent::StopSound {
            name: name.to_string(),
        });
    }

    fn seek(&mut self, name: &str, position: Duration) {
        self.log.record(HostEvent::SeekSound {
            name: name.to_string(),
            millis: position.as_millis() as u64,
        });
    }

    fn set_volume(&mut self, name: &str, volume: f32) {
        self.log.record(HostEvent::SoundVolume {
            name: name.to_string(),
            volume,
        });
    }
}

#[derive(Debug, Default)]
struct ButtonState {
    down: bool,
    blocked: bool,
}

/// Scripted button table. Clones share state, so a test or runner can hold
/// buttons down after the service has moved into the interpreter.
#[derive(Clone, Default)]
pub struct RecordingInput {
    log: EventLog,
    buttons: Rc<RefCell<BTreeMap<String, ButtonState>>>,
}

impl RecordingInput {
    pub fn new<I, S>(log: EventLog, buttons: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let table = buttons
            .into_iter()
            .map(|name| (name.into(), ButtonState::default()))
            .collect();
        Self {
            log,
            buttons: Rc::new(RefCell::new(table)),
        }
    }

    /// Hold or release a button as the player would.
    pub fn hold(&self, button: &str, down: bool) {
        if let Some(state) = self.buttons.borrow_mut().get_mut(button) {
            state.down = down;
        }
    }

    pub fn is_blocked(&self, button: &str) -> bool {
        self.buttons
            .borrow()
            .get(button)
            .is_some_and(|state| state.blocked)
    }

    pub fn names(&self) -> BTreeSet<String> {
        self.buttons.borrow().keys().cloned().collect()
    }
}

impl InputService for RecordingInput {
    fn has_button(&self, button: &str) -> bool {
        self.buttons.borrow().contains_key(button)
    }

    fn is_down(&self, button: &str) -> bool {
        self.buttons
            .borrow()
            .get(button)
            .is_some_and(|state| state.down && !state.blocked)
    }

    fn any_down(&self) -> bool {
        self.buttons
            .borrow()
            .values()
            .any(|state| state.down && !state.blocked)
    }

    fn set_button_down(&mut self, button: &str) {
        self.hold(button, true);
        self.log.record(HostEvent::ButtonDown {
            button: button.to_string(),
        });
    }

    fn set_button_up(&mut self, button: &str) {
        self.hold(button, false);
        self.log.record(HostEvent::ButtonUp {
            button: button.to_string(),
        });
    }

    fn push_button(&mut self, button: &str) {
        self.log.record(HostEvent::PushButton {
            button: button.to_string(),
        });
    }

    fn set_blocked(&mut self, button: &str, blocked: bool) {
        if let Some(state) = self.buttons.borrow_mut().get_mut(button) {
            state.blocked = blocked;
        }
        self.log.record(HostEvent::BlockInput {
            button: button.to_string(),
            blocked,
        });
    }

    fn set_all_blocked(&mut self, blocked: bool) {
        for state in self.buttons.borrow_mut().values_mut() {
            state.blocked = blocked;
        }
        self.log.record(HostEvent::BlockAllInputs { blocked });
    }
}

#[derive(Debug)]
pub struct RecordedVisual {
    label: String,
    size: Vec2,
    log: EventLog,
}

impl Visual for RecordedVisual {
    fn label(&self) -> &str {
        &self.label
    }

    fn size(&self) -> Vec2 {
        self.size
    }

    fn set_sprite_group(&mut self, group: &str) -> bool {
        self.log.record(HostEvent::SpriteGroup {
            visual: self.label.clone(),
            group: group.to_string(),
        });
        true
    }
}

#[derive(Clone, Default)]
pub struct RecordingGraphics {
    log: EventLog,
}

impl GraphicsService for RecordingGraphics {
    fn load_image(&mut self, path: &str) -> Result<Box<dyn Visual>> {
        self.log.record(HostEvent::LoadImage {
            path: path.to_string(),
        });
        Ok(Box::new(RecordedVisual {
            label: path.to_string(),
            size: RECORDED_IMAGE_SIZE,
            log: self.log.clone(),
        }))
    }

    fn solid_color(&mut self, color: Rgba, size: Vec2) -> Box<dyn Visual> {
        self.log.record(HostEvent::SolidColor { color, size });
        Box::new(RecordedVisual {
            label: format!("#{:02x}{:02x}{:02x}{:02x}", color.r, color.g, color.b, color.a),
            size,
            log: self.log.clone(),
        })
    }

    fn draw(&mut self, visual: &dyn Visual, params: &DrawParams) {
        self.log.record(HostEvent::Draw {
            visual: visual.label().to_string(),
            params: *params,
        });
    }
}

#[derive(Clone)]
pub struct RecordingWindow {
    log: EventLog,
    resolution: Vec2,
    fullscreen: bool,
    force_resize: bool,
}

impl RecordingWindow {
    pub fn new(log: EventLog, resolution: Vec2) -> Self {
        Self {
            log,
            resolution,
            fullscreen: false,
            force_resize: false,
        }
    }
}

impl WindowService for RecordingWindow {
    fn exit(&mut self) {
        self.log.record(HostEvent::ExitGame);
    }

    fn change_scene(&mut self, scene: &str, initialize: bool) -> Result<()> {
        self.log.record(HostEvent::ChangeScene {
            scene: scene.to_string(),
            initialize,
        });
        Ok(())
    }

    fn change_size(&mut self, width: i32, height: i32) {
        self.log.record(HostEvent::ChangeSize { width, height });
    }

    fn change_resolution(&mut self, width: i32, height: i32, change_size: bool) {
        self.resolution = Vec2::new(width as f32, height as f32);
        self.log.record(HostEvent::ChangeResolution {
            width,
            height,
            change_size,
        });
    }

    fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    fn set_fullscreen(&mut self, fullscreen: bool) {
        self.fullscreen = fullscreen;
        self.log.record(HostEvent::Fullscreen {
            enabled: fullscreen,
        });
    }

    fn force_resize_resolution(&self) -> bool {
        self.force_resize
    }

    fn set_force_resize_resolution(&mut self, force: bool) {
        self.force_resize = force;
        self.log.record(HostEvent::ForceResizeResolution { enabled: force });
    }

    fn set_title(&mut self, title: &str) {
        self.log.record(HostEvent::WindowTitle {
            title: title.to_string(),
        });
    }

    fn resolution(&self) -> Vec2 {
        self.resolution
    }
}

/// Custom-instruction handler that logs and completes immediately.
#[derive(Clone, Default)]
pub struct RecordingHandler {
    log: EventLog,
}

impl RecordingHandler {
    pub fn new(log: EventLog) -> Self {
        Self { log }
    }
}

impl CustomHandler for RecordingHandler {
    fn interpret(&mut self, name: &str, _instruction: &Instruction) -> Step {
        self.log.record(HostEvent::Custom {
            name: name.to_string(),
        });
        Step::Done
    }

    fn signal(&mut self, group: &str, _instruction: &Instruction) {
        self.log.record(HostEvent::Signal {
            group: group.to_string(),
        });
    }
}

/// Recording implementations of every service sharing one log.
pub struct RecordingServices {
    pub log: EventLog,
    pub input: RecordingInput,
}

impl RecordingServices {
    pub const DEFAULT_BUTTONS: [&'static str; 10] = [
        "A", "B", "X", "Y", "Start", "Select", "Up", "Down", "Left", "Right",
    ];
    pub const DEFAULT_RESOLUTION: Vec2 = Vec2::new(1280.0, 720.0);

    /// Build a service bundle; the returned handles observe it after it
    /// moves into an interpreter.
    pub fn new<I, S>(buttons: I, resolution: Vec2) -> (Services, RecordingServices)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let log = EventLog::new();
        let input = RecordingInput::new(log.clone(), buttons);
        let services = Services {
            audio: Box::new(RecordingAudio { log: log.clone() }),
            input: Box::new(input.clone()),
            graphics: Box::new(RecordingGraphics { log: log.clone() }),
            window: Box::new(RecordingWindow::new(log.clone(), resolution)),
        };
        (services, RecordingServices { log, input })
    }

    pub fn with_defaults() -> (Services, RecordingServices) {
        Self::new(Self::DEFAULT_BUTTONS, Self::DEFAULT_RESOLUTION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_services_share_one_log() {
        let (mut services, handles) = RecordingServices::with_defaults();
        services.audio.play("theme", 0.5, false);
        services.window.set_title("Intro");
        let visual = services.graphics.load_image("bg.png").unwrap();
        assert_eq!(visual.size(), RECORDED_IMAGE_SIZE);

        assert_eq!(
            handles.log.events(),
            vec![
                HostEvent::PlaySound {
                    name: "theme".to_string(),
                    volume: 0.5,
                    unload_on_finish: false,
                },
                HostEvent::WindowTitle {
                    title: "Intro".to_string(),
                },
                HostEvent::LoadImage {
                    path: "bg.png".to_string(),
                },
            ]
        );
    }

    #[test]
    fn blocked_buttons_never_read_as_down() {
        let (mut services, handles) = RecordingServices::with_defaults();
        handles.input.hold("A", true);
        assert!(services.input.is_down("A"));
        assert!(services.input.any_down());

        services.input.set_blocked("A", true);
        assert!(handles.input.is_blocked("A"));
        assert!(!services.input.is_down("A"));
        assert!(!services.input.any_down());
        assert!(!services.input.has_button("Turbo"));
    }

    #[test]
    fn events_serialize_with_kind_tags() {
        let json = serde_json::to_value(HostEvent::SeekSound {
            name: "theme".to_string(),
            millis: 1500,
        })
        .unwrap();
        assert_eq!(json["kind"], "seek_sound");
        assert_eq!(json["millis"], 1500);
    }
}

//! Host collaborators the interpreter talks to.
//!
//! Every service is injected once through [`Services`]; nothing in the
//! interpreter reaches for global state.

use std::fmt;
use std::time::Duration;

use anyhow::Result;
use glam::Vec2;
use serde::Serialize;

use crate::types::{Angle, Rgba, SpriteEffects};

/// Named-registry audio playback.
pub trait AudioService {
    fn load(&mut self, _name: &str, _path: &str, _loop_path: Option<&str>) -> Result<()> {
        Ok(())
    }
    fn unload(&mut self, _name: &str) {}
    fn play(&mut self, _name: &str, _volume: f32, _unload_on_finish: bool) {}
    fn play_independent(
        &mut self,
        _prefix: &str,
        _path: &str,
        _loop_path: Option<&str>,
        _volume: f32,
    ) -> Result<()> {
        Ok(())
    }
    fn resume(&mut self, _name: &str) {}
    fn pause(&mut self, _name: &str) {}
    fn stop(&mut self, _name: &str) {}
    fn seek(&mut self, _name: &str, _position: Duration) {}
    fn set_volume(&mut self, _name: &str, _volume: f32) {}
}

/// Named game buttons.
pub trait InputService {
    fn has_button(&self, button: &str) -> bool;
    fn is_down(&self, button: &str) -> bool;
    fn any_down(&self) -> bool;
    fn set_button_down(&mut self, _button: &str) {}
    fn set_button_up(&mut self, _button: &str) {}
    fn push_button(&mut self, _button: &str) {}
    fn set_blocked(&mut self, _button: &str, _blocked: bool) {}
    fn set_all_blocked(&mut self, _blocked: bool) {}
}

/// Opaque drawable handed out by the graphics service.
pub trait Visual: fmt::Debug {
    fn label(&self) -> &str;
    /// Natural size in pixels.
    fn size(&self) -> Vec2;
    fn update(&mut self, _elapsed: Duration) {}
    /// Returns false when the visual has no sprite groups.
    fn set_sprite_group(&mut self, _group: &str) -> bool {
        false
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DrawParams {
    pub position: Vec2,
    pub size: Vec2,
    pub rotation: Angle,
    pub origin: Vec2,
    pub scale: Vec2,
    pub effects: SpriteEffects,
    pub tint: Rgba,
    pub layer_depth: f32,
}

pub trait GraphicsService {
    fn load_image(&mut self, path: &str) -> Result<Box<dyn Visual>>;
    fn solid_color(&mut self, color: Rgba, size: Vec2) -> Box<dyn Visual>;
    fn draw(&mut self, visual: &dyn Visual, params: &DrawParams);
}

/// Game window and scene control.
pub trait WindowService {
    fn exit(&mut self) {}
    fn change_scene(&mut self, _scene: &str, _initialize: bool) -> Result<()> {
        Ok(())
    }
    fn change_size(&mut self, _width: i32, _height: i32) {}
    fn change_resolution(&mut self, _width: i32, _height: i32, _change_size: bool) {}
    fn is_fullscreen(&self) -> bool {
        false
    }
    fn set_fullscreen(&mut self, _fullscreen: bool) {}
    fn force_resize_resolution(&self) -> bool {
        false
    }
    fn set_force_resize_resolution(&mut self, _force: bool) {}
    fn set_title(&mut self, _title: &str) {}
    /// Current render resolution.
    fn resolution(&self) -> Vec2;
}

pub struct Services {
    pub audio: Box<dyn AudioService>,
    pub input: Box<dyn InputService>,
    pub graphics: Box<dyn GraphicsService>,
    pub window: Box<dyn WindowService>,
}

impl fmt::Debug for Services {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Services")
    }
}

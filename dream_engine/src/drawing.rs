use std::time::Duration;

use glam::Vec2;

use crate::countdown::Countdown;
use crate::motion::Motion;
use crate::services::{DrawParams, Visual};
use crate::types::{Angle, Rgba, SpriteEffects};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FadeDirection {
    /// Opacity falls to 0.
    Out,
    /// Opacity rises to 1.
    In,
}

#[derive(Debug, Clone, Copy)]
struct Fade {
    direction: FadeDirection,
    timer: Countdown,
}

/// Named anchor accepted by `DrawingOrigin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Center,
    TopLeft,
    BottomLeft,
    TopRight,
    BottomRight,
}

impl Anchor {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "center" => Some(Anchor::Center),
            "topleft" => Some(Anchor::TopLeft),
            "bottomleft" => Some(Anchor::BottomLeft),
            "topright" => Some(Anchor::TopRight),
            "bottomright" => Some(Anchor::BottomRight),
            _ => None,
        }
    }

    pub fn origin_for(self, size: Vec2) -> Vec2 {
        match self {
            Anchor::Center => size / 2.0,
            Anchor::TopLeft => Vec2::ZERO,
            Anchor::BottomLeft => Vec2::new(0.0, size.y),
            Anchor::TopRight => Vec2::new(size.x, 0.0),
            Anchor::BottomRight => size,
        }
    }
}

/// A named overlay owned by the interpreter.
#[derive(Debug)]
pub struct Drawing {
    visual: Box<dyn Visual>,
    pub motion: Motion,
    pub size: Vec2,
    pub visible: bool,
    pub ignore_camera: bool,
    pub persistent: bool,
    pub rotation: Angle,
    pub origin: Vec2,
    pub layer_depth: f32,
    pub effects: SpriteEffects,
    pub scale: Vec2,
    pub color: Rgba,
    opacity: f32,
    fade: Option<Fade>,
}

impl Drawing {
    /// New drawings start hidden and non-persistent at the origin.
    pub fn new(visual: Box<dyn Visual>) -> Self {
        let size = visual.size();
        Self {
            visual,
            motion: Motion::default(),
            size,
            visible: false,
            ignore_camera: false,
            persistent: false,
            rotation: Angle::default(),
            origin: Vec2::ZERO,
            layer_depth: 0.0,
            effects: SpriteEffects::None,
            scale: Vec2::ONE,
            color: Rgba::WHITE,
            opacity: 1.0,
            fade: None,
        }
    }

    /// Swap the image. Position and size belong to the image and reset with
    /// it; everything else carries over.
    pub fn replace_visual(&mut self, visual: Box<dyn Visual>) {
        self.size = visual.size();
        self.motion.position = Vec2::ZERO;
        self.visual = visual;
    }

    pub fn visual(&self) -> &dyn Visual {
        self.visual.as_ref()
    }

    pub fn visual_mut(&mut self) -> &mut dyn Visual {
        self.visual.as_mut()
    }

    pub fn position(&self) -> Vec2 {
        self.motion.position
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn fading(&self) -> Option<FadeDirection> {
        self.fade.map(|fade| fade.direction)
    }

    /// Start fading out over `millis`. Replaces any fade in progress.
    pub fn fade(&mut self, millis: u32) {
        self.start_fade(FadeDirection::Out, millis);
    }

    /// Start fading in over `millis`. Replaces any fade in progress.
    pub fn unfade(&mut self, millis: u32) {
        self.start_fade(FadeDirection::In, millis);
    }

    fn start_fade(&mut self, direction: FadeDirection, millis: u32) {
        self.fade = Some(Fade {
            direction,
            timer: Countdown::new(millis),
        });
    }

    pub fn wait_till_position(&mut self, target: Vec2) {
        self.motion.wait_till_position(target);
    }

    /// Advance fades, motion and the visual. Returns true on the tick a
    /// pending position wait is met.
    pub fn update(&mut self, elapsed: Duration) -> bool {
        if let Some(fade) = self.fade.as_mut() {
            fade.timer.tick(elapsed);
            match (fade.timer.fraction_remaining(), fade.direction) {
                (Some(left), FadeDirection::Out) => self.opacity = left,
                (Some(left), FadeDirection::In) => self.opacity = 1.0 - left,
                (None, FadeDirection::Out) => {
                    self.opacity = 0.0;
                    self.fade = None;
                }
                (None, FadeDirection::In) => {
                    self.opacity = 1.0;
                    self.fade = None;
                }
            }
        }

        let arrived = self.motion.advance(elapsed.as_secs_f32());
        self.visual.update(elapsed);
        arrived
    }

    pub fn draw_params(&self, camera: Vec2) -> DrawParams {
        let position = if self.ignore_camera {
            self.motion.position
        } else {
            self.motion.position - camera
        };
        DrawParams {
            position,
            size: self.size,
            rotation: self.rotation,
            origin: self.origin,
            scale: self.scale,
            effects: self.effects,
            tint: self.color.scaled(self.opacity),
            layer_depth: self.layer_depth,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Plain(Vec2);

    impl Visual for Plain {
        fn label(&self) -> &str {
            "plain"
        }

        fn size(&self) -> Vec2 {
            self.0
        }
    }

    fn drawing() -> Drawing {
        Drawing::new(Box::new(Plain(Vec2::new(40.0, 20.0))))
    }

    #[test]
    fn defaults_for_new_drawings() {
        let drawing = drawing();
        assert!(!drawing.visible);
        assert!(!drawing.persistent);
        assert_eq!(drawing.size, Vec2::new(40.0, 20.0));
        assert_eq!(drawing.scale, Vec2::ONE);
        assert_eq!(drawing.color, Rgba::WHITE);
        assert_eq!(drawing.opacity(), 1.0);
    }

    #[test]
    fn fade_out_then_in() {
        let mut drawing = drawing();
        drawing.fade(400);
        drawing.update(Duration::from_millis(100));
        assert!((drawing.opacity() - 0.75).abs() < 1e-6);
        drawing.update(Duration::from_millis(300));
        assert_eq!(drawing.opacity(), 0.0);
        assert_eq!(drawing.fading(), None);

        drawing.unfade(200);
        drawing.update(Duration::from_millis(50));
        assert!((drawing.opacity() - 0.25).abs() < 1e-6);
        drawing.update(Duration::from_millis(500));
        assert_eq!(drawing.opacity(), 1.0);
    }

    #[test]
    fn new_fade_replaces_running_one() {
        let mut drawing = drawing();
        drawing.fade(1000);
        drawing.update(Duration::from_millis(500));
        drawing.unfade(100);
        assert_eq!(drawing.fading(), Some(FadeDirection::In));
        drawing.update(Duration::from_millis(100));
        assert_eq!(drawing.opacity(), 1.0);
    }

    #[test]
    fn anchors_follow_size() {
        let size = Vec2::new(40.0, 20.0);
        assert_eq!(Anchor::from_name("Center").unwrap().origin_for(size), Vec2::new(20.0, 10.0));
        assert_eq!(Anchor::BottomLeft.origin_for(size), Vec2::new(0.0, 20.0));
        assert_eq!(Anchor::from_name("middle"), None);
    }

    #[test]
    fn camera_offset_unless_ignored() {
        let mut drawing = drawing();
        drawing.motion.position = Vec2::new(100.0, 50.0);
        drawing.fade(100);
        drawing.update(Duration::from_millis(50));
        let camera = Vec2::new(30.0, 10.0);

        let params = drawing.draw_params(camera);
        assert_eq!(params.position, Vec2::new(70.0, 40.0));
        assert_eq!(params.tint, Rgba::new(128, 128, 128, 128));

        drawing.ignore_camera = true;
        assert_eq!(drawing.draw_params(camera).position, Vec2::new(100.0, 50.0));
    }
}

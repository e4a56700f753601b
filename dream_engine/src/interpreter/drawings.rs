use dream_formats::Instruction;
use glam::Vec2;
use log::debug;

use super::{Flow, Interpreter, Suspension};
use crate::drawing::{Anchor, Drawing};
use crate::error::{AtInstruction, CutsceneError};
use crate::services::Visual;
use crate::types::{Angle, Rgba, SpriteEffects};

impl Interpreter {
    pub(super) fn with_drawing(
        &mut self,
        index: usize,
        instruction: &Instruction,
        apply: impl FnOnce(&mut Drawing),
    ) -> Result<Flow, CutsceneError> {
        let name = instruction.string(0).at(index)?;
        apply(self.drawing_mut(index, name)?);
        Ok(Flow::Done)
    }

    /// Drawing name plus one number of any suffix.
    pub(super) fn set_drawing(
        &mut self,
        index: usize,
        instruction: &Instruction,
        apply: impl FnOnce(&mut Drawing, f32),
    ) -> Result<Flow, CutsceneError> {
        let name = instruction.string(0).at(index)?;
        let value = instruction.number(0).at(index)? as f32;
        apply(self.drawing_mut(index, name)?, value);
        Ok(Flow::Done)
    }

    /// Set a flag from the first bool, or flip it when none is given.
    pub(super) fn toggle_drawing(
        &mut self,
        index: usize,
        instruction: &Instruction,
        flag: impl FnOnce(&mut Drawing) -> &mut bool,
    ) -> Result<Flow, CutsceneError> {
        let name = instruction.string(0).at(index)?;
        let explicit = instruction.booleans.first().copied();
        let flag = flag(self.drawing_mut(index, name)?);
        *flag = explicit.unwrap_or(!*flag);
        Ok(Flow::Done)
    }

    pub(super) fn load_drawing(
        &mut self,
        index: usize,
        instruction: &Instruction,
    ) -> Result<Flow, CutsceneError> {
        let name = instruction.string(0).at(index)?;
        let path = instruction.string(1).at(index)?;
        let visual = self
            .services
            .graphics
            .load_image(path)
            .map_err(|source| CutsceneError::Service {
                index,
                command: format!("LoadDrawing {name}"),
                source,
            })?;
        let persistent = instruction.booleans.first().copied();
        self.register_drawing(name, visual, persistent);
        Ok(Flow::Done)
    }

    /// Floats give width and height, ints give RGB and an optional alpha.
    pub(super) fn load_image_from_color(
        &mut self,
        index: usize,
        instruction: &Instruction,
    ) -> Result<Flow, CutsceneError> {
        let name = instruction.string(0).at(index)?;
        let size = Vec2::new(instruction.float(0).at(index)?, instruction.float(1).at(index)?);
        let color = script_color(index, instruction)?;
        let visual = self.services.graphics.solid_color(color, size);
        let persistent = instruction.booleans.first().copied();
        self.register_drawing(name, visual, persistent);
        Ok(Flow::Done)
    }

    fn register_drawing(
        &mut self,
        name: &str,
        visual: Box<dyn Visual>,
        persistent: Option<bool>,
    ) {
        let drawing = match self.drawings.remove(name) {
            Some(mut existing) => {
                debug!("replacing image of drawing {name}");
                existing.replace_visual(visual);
                existing
            }
            None => Drawing::new(visual),
        };
        let drawing = self.drawings.entry(name.to_string()).or_insert(drawing);
        if let Some(persistent) = persistent {
            drawing.persistent = persistent;
        }
    }

    pub(super) fn drawing_wait_till_position(
        &mut self,
        index: usize,
        instruction: &Instruction,
    ) -> Result<Flow, CutsceneError> {
        let name = instruction.string(0).at(index)?;
        let target = Vec2::new(
            instruction.number(0).at(index)? as f32,
            instruction.number(1).at(index)? as f32,
        );
        self.drawing_mut(index, name)?.wait_till_position(target);
        Ok(Flow::Suspend(Suspension::DrawingPosition(name.to_string())))
    }

    /// Checked in order: uint or int as binary angle units, double as
    /// radians, float as degrees. No number resets the rotation.
    pub(super) fn drawing_rotation(
        &mut self,
        index: usize,
        instruction: &Instruction,
    ) -> Result<Flow, CutsceneError> {
        let name = instruction.string(0).at(index)?;
        let rotation = if let Some(units) = instruction.uints.first() {
            Angle(*units as u16)
        } else if let Some(units) = instruction.ints.first() {
            Angle(*units as u16)
        } else if let Some(radians) = instruction.doubles.first() {
            Angle::from_radians(*radians)
        } else if let Some(degrees) = instruction.floats.first() {
            Angle::from_degrees(*degrees)
        } else {
            Angle::default()
        };
        self.drawing_mut(index, name)?.rotation = rotation;
        Ok(Flow::Done)
    }

    pub(super) fn drawing_origin(
        &mut self,
        index: usize,
        instruction: &Instruction,
    ) -> Result<Flow, CutsceneError> {
        let name = instruction.string(0).at(index)?;
        match instruction.strings.get(1) {
            Some(anchor_name) => {
                let drawing = self.drawing_mut(index, name)?;
                match Anchor::from_name(anchor_name) {
                    Some(anchor) => drawing.origin = anchor.origin_for(drawing.size),
                    None => debug!("ignoring unknown origin anchor {anchor_name:?}"),
                }
            }
            None => {
                let origin = Vec2::new(
                    instruction.number(0).at(index)? as f32,
                    instruction.number(1).at(index)? as f32,
                );
                self.drawing_mut(index, name)?.origin = origin;
            }
        }
        Ok(Flow::Done)
    }

    pub(super) fn drawing_sprite_effects(
        &mut self,
        index: usize,
        instruction: &Instruction,
    ) -> Result<Flow, CutsceneError> {
        let name = instruction.string(0).at(index)?;
        let effects = SpriteEffects::from_name(instruction.string(1).at(index)?);
        self.drawing_mut(index, name)?.effects = effects;
        Ok(Flow::Done)
    }

    pub(super) fn drawing_color(
        &mut self,
        index: usize,
        instruction: &Instruction,
    ) -> Result<Flow, CutsceneError> {
        let name = instruction.string(0).at(index)?;
        let color = script_color(index, instruction)?;
        self.drawing_mut(index, name)?.color = color;
        Ok(Flow::Done)
    }

    /// Stretch over the whole resolution from the top-left corner.
    pub(super) fn maximize_drawing(
        &mut self,
        index: usize,
        instruction: &Instruction,
    ) -> Result<Flow, CutsceneError> {
        let name = instruction.string(0).at(index)?;
        let resolution = self.services.window.resolution();
        let drawing = self.drawing_mut(index, name)?;
        drawing.size = resolution;
        drawing.motion.position = Vec2::ZERO;
        Ok(Flow::Done)
    }

    pub(super) fn change_sprite_group(
        &mut self,
        index: usize,
        instruction: &Instruction,
    ) -> Result<Flow, CutsceneError> {
        let name = instruction.string(0).at(index)?;
        let group = instruction.string(1).at(index)?;
        if !self.drawing_mut(index, name)?.visual_mut().set_sprite_group(group) {
            debug!("drawing {name} has no sprite groups; ignoring {group:?}");
        }
        Ok(Flow::Done)
    }

    pub(super) fn unload_drawing(
        &mut self,
        index: usize,
        instruction: &Instruction,
    ) -> Result<Flow, CutsceneError> {
        let name = instruction.string(0).at(index)?;
        match self.drawings.remove(name) {
            Some(_) => Ok(Flow::Done),
            None => Err(CutsceneError::UnknownDrawing {
                index,
                name: name.to_string(),
            }),
        }
    }
}

fn script_color(index: usize, instruction: &Instruction) -> Result<Rgba, CutsceneError> {
    Ok(Rgba::from_script(
        instruction.int(0).at(index)?,
        instruction.int(1).at(index)?,
        instruction.int(2).at(index)?,
        instruction.ints.get(3).copied(),
    ))
}

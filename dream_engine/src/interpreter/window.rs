use dream_formats::Instruction;

use super::{Flow, Interpreter};
use crate::error::{AtInstruction, CutsceneError};

impl Interpreter {
    pub(super) fn change_scene(
        &mut self,
        index: usize,
        instruction: &Instruction,
    ) -> Result<Flow, CutsceneError> {
        let scene = instruction.string(0).at(index)?;
        let initialize = instruction.booleans.first().copied().unwrap_or(false);
        self.services
            .window
            .change_scene(scene, initialize)
            .map_err(|source| CutsceneError::Service {
                index,
                command: format!("ChangeScene {scene}"),
                source,
            })?;
        Ok(Flow::Done)
    }

    pub(super) fn change_size(
        &mut self,
        index: usize,
        instruction: &Instruction,
    ) -> Result<Flow, CutsceneError> {
        let (width, height) = dimensions(index, instruction)?;
        self.services.window.change_size(width, height);
        Ok(Flow::Done)
    }

    pub(super) fn change_resolution(
        &mut self,
        index: usize,
        instruction: &Instruction,
    ) -> Result<Flow, CutsceneError> {
        let (width, height) = dimensions(index, instruction)?;
        let change_size = instruction.booleans.first().copied().unwrap_or(true);
        self.services
            .window
            .change_resolution(width, height, change_size);
        Ok(Flow::Done)
    }

    pub(super) fn fullscreen(&mut self, instruction: &Instruction) -> Result<Flow, CutsceneError> {
        let window = &mut self.services.window;
        let wanted = instruction
            .booleans
            .first()
            .copied()
            .unwrap_or(!window.is_fullscreen());
        if wanted != window.is_fullscreen() {
            window.set_fullscreen(wanted);
        }
        Ok(Flow::Done)
    }

    pub(super) fn force_resize_resolution(
        &mut self,
        instruction: &Instruction,
    ) -> Result<Flow, CutsceneError> {
        let window = &mut self.services.window;
        let force = instruction
            .booleans
            .first()
            .copied()
            .unwrap_or(!window.force_resize_resolution());
        window.set_force_resize_resolution(force);
        Ok(Flow::Done)
    }
}

fn dimensions(index: usize, instruction: &Instruction) -> Result<(i32, i32), CutsceneError> {
    Ok((
        instruction.number(0).at(index)? as i32,
        instruction.number(1).at(index)? as i32,
    ))
}

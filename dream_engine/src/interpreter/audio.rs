use std::time::Duration;

use dream_formats::Instruction;
use rust_decimal::prelude::ToPrimitive;

use super::{Flow, Interpreter};
use crate::error::{AtInstruction, CutsceneError};
use crate::services::AudioService;

const DEFAULT_VOLUME: f32 = 1.0;

impl Interpreter {
    /// Instructions whose only parameter is the sound name.
    pub(super) fn with_sound(
        &mut self,
        index: usize,
        instruction: &Instruction,
        apply: impl FnOnce(&mut dyn AudioService, &str),
    ) -> Result<Flow, CutsceneError> {
        let name = instruction.string(0).at(index)?;
        apply(self.services.audio.as_mut(), name);
        Ok(Flow::Done)
    }

    pub(super) fn load_sound(
        &mut self,
        index: usize,
        instruction: &Instruction,
    ) -> Result<Flow, CutsceneError> {
        let name = instruction.string(0).at(index)?;
        let path = instruction.string(1).at(index)?;
        let loop_path = instruction.strings.get(2).map(String::as_str);
        self.services
            .audio
            .load(name, path, loop_path)
            .map_err(|source| CutsceneError::Service {
                index,
                command: format!("LoadSound {name}"),
                source,
            })?;
        Ok(Flow::Done)
    }

    pub(super) fn play_sound(
        &mut self,
        index: usize,
        instruction: &Instruction,
    ) -> Result<Flow, CutsceneError> {
        let name = instruction.string(0).at(index)?;
        let volume = instruction.floats.first().copied().unwrap_or(DEFAULT_VOLUME);
        let unload_on_finish = instruction.booleans.first().copied().unwrap_or(false);
        self.services.audio.play(name, volume, unload_on_finish);
        Ok(Flow::Done)
    }

    pub(super) fn play_independent_sound(
        &mut self,
        index: usize,
        instruction: &Instruction,
    ) -> Result<Flow, CutsceneError> {
        let prefix = instruction.string(0).at(index)?;
        let path = instruction.string(1).at(index)?;
        let loop_path = instruction.strings.get(2).map(String::as_str);
        let volume = instruction.floats.first().copied().unwrap_or(DEFAULT_VOLUME);
        self.services
            .audio
            .play_independent(prefix, path, loop_path, volume)
            .map_err(|source| CutsceneError::Service {
                index,
                command: format!("PlayIndependentSound {path}"),
                source,
            })?;
        Ok(Flow::Done)
    }

    /// Days, hours, minutes, seconds and milliseconds come from the decimal,
    /// double, float, int and uint lists; each part is truncated to a whole
    /// number and defaults to 0.
    pub(super) fn sound_position(
        &mut self,
        index: usize,
        instruction: &Instruction,
    ) -> Result<Flow, CutsceneError> {
        let name = instruction.string(0).at(index)?;
        let days = instruction
            .decimals
            .first()
            .and_then(|value| value.trunc().to_f64())
            .unwrap_or(0.0);
        let hours = instruction.doubles.first().map_or(0.0, |value| value.trunc());
        let minutes = instruction
            .floats
            .first()
            .map_or(0.0, |value| f64::from(value.trunc()));
        let seconds = instruction.ints.first().map_or(0.0, |value| f64::from(*value));
        let millis = instruction.uints.first().map_or(0.0, |value| f64::from(*value));

        // Out-of-range totals saturate; NaN lands on zero.
        let total = (((days * 24.0 + hours) * 60.0 + minutes) * 60.0 + seconds) * 1000.0 + millis;
        let position = Duration::from_millis(total.max(0.0) as u64);
        self.services.audio.seek(name, position);
        Ok(Flow::Done)
    }

    pub(super) fn sound_volume(
        &mut self,
        index: usize,
        instruction: &Instruction,
    ) -> Result<Flow, CutsceneError> {
        let name = instruction.string(0).at(index)?;
        let volume = instruction.float(0).at(index)?;
        self.services.audio.set_volume(name, volume);
        Ok(Flow::Done)
    }
}

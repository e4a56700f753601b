use dream_formats::Instruction;

use super::{Flow, Interpreter, Suspension};
use crate::error::{AtInstruction, CutsceneError};
use crate::services::InputService;

impl Interpreter {
    /// Instructions that act on one named button. Unknown buttons are a
    /// content error.
    pub(super) fn with_button(
        &mut self,
        index: usize,
        instruction: &Instruction,
        apply: impl FnOnce(&mut dyn InputService, &str),
    ) -> Result<Flow, CutsceneError> {
        let button = instruction.string(0).at(index)?;
        self.require_button(index, button)?;
        apply(self.services.input.as_mut(), button);
        Ok(Flow::Done)
    }

    pub(super) fn wait_for_button(
        &mut self,
        index: usize,
        instruction: &Instruction,
    ) -> Result<Flow, CutsceneError> {
        let button = instruction.string(0).at(index)?;
        self.require_button(index, button)?;
        Ok(Flow::Suspend(Suspension::Button(button.to_string())))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use dream_formats::{Instruction, Opcode};

    use crate::error::CutsceneError;
    use crate::interpreter::{Interpreter, Suspension};
    use crate::recording::{HostEvent, RecordingServices};

    const FRAME: Duration = Duration::from_millis(16);

    #[test]
    fn wait_for_button_clears_when_held() {
        let (services, handles) = RecordingServices::with_defaults();
        let mut interpreter = Interpreter::new(services);
        interpreter.start(
            vec![Instruction::builtin(Opcode::WaitForButton).with_string("A")],
            None,
            0,
        );
        interpreter.update(FRAME).unwrap();
        assert_eq!(
            interpreter.pending(),
            Some(&Suspension::Button("A".to_string()))
        );

        handles.input.hold("B", true);
        interpreter.update(FRAME).unwrap();
        assert_eq!(interpreter.current_index(), 0);

        handles.input.hold("A", true);
        interpreter.update(FRAME).unwrap();
        assert_eq!(interpreter.current_index(), 1);
    }

    #[test]
    fn wait_for_any_button_ignores_blocked_ones() {
        let (services, handles) = RecordingServices::with_defaults();
        let mut interpreter = Interpreter::new(services);
        interpreter.start(
            vec![
                Instruction::builtin(Opcode::BlockInput).with_string("Start"),
                Instruction::builtin(Opcode::WaitForAnyButton),
            ],
            None,
            0,
        );
        handles.input.hold("Start", true);
        for _ in 0..3 {
            interpreter.update(FRAME).unwrap();
        }
        assert_eq!(interpreter.pending(), Some(&Suspension::AnyButton));

        handles.input.hold("X", true);
        interpreter.update(FRAME).unwrap();
        assert!(interpreter.pending().is_none());
        assert_eq!(interpreter.current_index(), 2);
    }

    #[test]
    fn button_instructions_reach_the_input_service() {
        let (services, handles) = RecordingServices::with_defaults();
        let mut interpreter = Interpreter::new(services);
        interpreter.start(
            vec![
                Instruction::builtin(Opcode::ButtonDown).with_string("Left"),
                Instruction::builtin(Opcode::PushButton).with_string("A"),
                Instruction::builtin(Opcode::BlockAllInputs),
                Instruction::builtin(Opcode::AllowInput).with_string("Start"),
            ],
            None,
            0,
        );
        for _ in 0..4 {
            interpreter.update(FRAME).unwrap();
        }
        assert_eq!(
            handles.log.events(),
            vec![
                HostEvent::ButtonDown {
                    button: "Left".to_string()
                },
                HostEvent::PushButton {
                    button: "A".to_string()
                },
                HostEvent::BlockAllInputs { blocked: true },
                HostEvent::BlockInput {
                    button: "Start".to_string(),
                    blocked: false,
                },
            ]
        );
        assert!(handles.input.is_blocked("A"));
        assert!(!handles.input.is_blocked("Start"));
    }

    #[test]
    fn unknown_button_is_an_error() {
        let (services, _) = RecordingServices::with_defaults();
        let mut interpreter = Interpreter::new(services);
        interpreter.start(
            vec![Instruction::builtin(Opcode::WaitForButton).with_string("Turbo")],
            None,
            0,
        );
        let err = interpreter.update(FRAME).unwrap_err();
        assert!(matches!(
            err,
            CutsceneError::UnknownButton { index: 0, ref button } if button == "Turbo"
        ));
        assert!(!interpreter.is_running());
    }
}

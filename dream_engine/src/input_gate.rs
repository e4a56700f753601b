//! Push-side of button waits.
//!
//! The host's input layer reports presses here as they happen, so a button
//! wait can clear before the next poll. Clearing is idempotent with the
//! poll in [`Interpreter::update`]: whichever runs first advances the index.

use crate::interpreter::{Interpreter, Suspension};

/// Subscriber for input-layer button events.
pub trait InputListener {
    fn button_pushed(&mut self, _button: &str) {}
    fn button_released(&mut self, _button: &str) {}
    fn button_fired(&mut self, _button: &str) {}
}

impl InputListener for Interpreter {
    fn button_pushed(&mut self, button: &str) {
        if !self.is_running() {
            return;
        }
        let matches = match self.pending() {
            Some(Suspension::AnyButton) => true,
            Some(Suspension::Button(waiting_for)) => waiting_for == button,
            _ => false,
        };
        if matches {
            log::debug!("button {button} released the wait at {}", self.current_index());
            self.complete();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use dream_formats::{Instruction, Opcode};

    use super::*;
    use crate::recording::RecordingServices;

    const FRAME: Duration = Duration::from_millis(16);

    fn waiting_on(instruction: Instruction) -> Interpreter {
        let (services, _) = RecordingServices::with_defaults();
        let mut interpreter = Interpreter::new(services);
        interpreter.start(
            vec![instruction, Instruction::builtin(Opcode::Fin)],
            None,
            0,
        );
        interpreter.update(FRAME).unwrap();
        interpreter
    }

    #[test]
    fn push_clears_matching_button_wait() {
        let mut interpreter =
            waiting_on(Instruction::builtin(Opcode::WaitForButton).with_string("A"));

        interpreter.button_pushed("B");
        assert_eq!(interpreter.current_index(), 0);

        interpreter.button_pushed("A");
        assert_eq!(interpreter.current_index(), 1);
        assert!(interpreter.pending().is_none());
    }

    #[test]
    fn push_clears_any_button_wait() {
        let mut interpreter = waiting_on(Instruction::builtin(Opcode::WaitForAnyButton));
        interpreter.button_pushed("Select");
        assert_eq!(interpreter.current_index(), 1);
    }

    #[test]
    fn repeated_push_advances_once() {
        let mut interpreter =
            waiting_on(Instruction::builtin(Opcode::WaitForButton).with_string("A"));
        interpreter.button_pushed("A");
        interpreter.button_pushed("A");
        assert_eq!(interpreter.current_index(), 1);

        interpreter.update(FRAME).unwrap();
        assert!(!interpreter.is_running());
    }

    #[test]
    fn push_ignores_other_suspensions() {
        let mut interpreter = waiting_on(Instruction::builtin(Opcode::Wait).with_int(1000));
        interpreter.button_pushed("A");
        assert_eq!(interpreter.current_index(), 0);
        interpreter.button_released("A");
        interpreter.button_fired("A");
        assert!(matches!(interpreter.pending(), Some(Suspension::Wait(_))));
    }
}

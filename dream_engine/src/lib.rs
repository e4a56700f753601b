pub mod countdown;
pub mod drawing;
pub mod error;
pub mod input_gate;
pub mod interpreter;
pub mod motion;
pub mod recording;
pub mod services;
pub mod types;

pub use drawing::{Anchor, Drawing, FadeDirection};
pub use error::CutsceneError;
pub use input_gate::InputListener;
pub use interpreter::{CustomHandler, Interpreter, Step, Suspension};
pub use recording::{EventLog, HostEvent, RecordingHandler, RecordingServices};
pub use services::{
    AudioService, DrawParams, GraphicsService, InputService, Services, Visual, WindowService,
};

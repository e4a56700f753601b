//! Cooperative cutscene interpreter.
//!
//! The host calls [`Interpreter::update`] once per frame. Each call advances
//! every drawing and the camera, then either re-checks the pending
//! suspension or dispatches the next instruction. Nothing blocks; a
//! suspended instruction simply stays current until its condition clears.

mod audio;
mod drawings;
mod input;
mod window;

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::rc::Rc;
use std::time::Duration;

use dream_formats::{load_instructions, Command, Instruction, Opcode};
use glam::Vec2;
use log::{debug, info, warn};

use crate::countdown::Countdown;
use crate::drawing::Drawing;
use crate::error::{AtInstruction, CutsceneError};
use crate::motion::Motion;
use crate::services::Services;

/// Result of one call into a custom-instruction handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Pending,
    Done,
}

/// Host hooks for instructions the catalog does not know.
pub trait CustomHandler {
    /// First dispatch of a custom instruction.
    fn interpret(&mut self, _name: &str, _instruction: &Instruction) -> Step {
        Step::Pending
    }
    /// Every later tick while the instruction is still pending.
    fn update(&mut self, _name: &str, _instruction: &Instruction, _elapsed: Duration) -> Step {
        Step::Done
    }
    /// `Signal` instructions addressed to an object group.
    fn signal(&mut self, _group: &str, _instruction: &Instruction) {}
}

impl fmt::Debug for dyn CustomHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CustomHandler")
    }
}

/// What the current instruction is waiting on.
#[derive(Debug, Clone, PartialEq)]
pub enum Suspension {
    Wait(Countdown),
    Button(String),
    AnyButton,
    DrawingPosition(String),
    CameraPosition,
    Custom,
}

/// Outcome of dispatching one instruction.
#[derive(Debug)]
pub(crate) enum Flow {
    Done,
    Suspend(Suspension),
    End,
}

#[derive(Debug)]
struct Session {
    script: Rc<[Instruction]>,
    index: usize,
    pending: Option<Suspension>,
    active: bool,
}

impl Session {
    fn idle() -> Self {
        Self {
            script: Rc::from(Vec::new()),
            index: 0,
            pending: None,
            active: false,
        }
    }
}

#[derive(Debug)]
pub struct Interpreter {
    services: Services,
    session: Session,
    drawings: BTreeMap<String, Drawing>,
    camera: Motion,
    handler: Option<Box<dyn CustomHandler>>,
}

impl Interpreter {
    pub fn new(services: Services) -> Self {
        Self {
            services,
            session: Session::idle(),
            drawings: BTreeMap::new(),
            camera: Motion::default(),
            handler: None,
        }
    }

    /// Begin running `instructions` from `start_index`. Drawings left over
    /// from an earlier session stay loaded.
    pub fn start(
        &mut self,
        instructions: Vec<Instruction>,
        handler: Option<Box<dyn CustomHandler>>,
        start_index: usize,
    ) {
        info!(
            "starting cutscene: {} instructions from index {start_index}",
            instructions.len()
        );
        self.session = Session {
            script: instructions.into(),
            index: start_index,
            pending: None,
            active: true,
        };
        self.handler = handler;
    }

    pub fn start_file(
        &mut self,
        path: impl AsRef<Path>,
        handler: Option<Box<dyn CustomHandler>>,
        start_index: usize,
    ) -> Result<(), CutsceneError> {
        let instructions = load_instructions(path)?;
        self.start(instructions, handler, start_index);
        Ok(())
    }

    /// Run one frame. A dispatch error ends the cutscene before it is
    /// returned.
    pub fn update(&mut self, elapsed: Duration) -> Result<(), CutsceneError> {
        let dt = elapsed.as_secs_f32();
        let mut arrived = Vec::new();
        for (name, drawing) in self.drawings.iter_mut() {
            if drawing.update(elapsed) {
                arrived.push(name.clone());
            }
        }
        let camera_arrived = self.camera.advance(dt);

        if !self.session.active {
            return Ok(());
        }

        let reached = match &self.session.pending {
            Some(Suspension::DrawingPosition(name)) => arrived.contains(name),
            Some(Suspension::CameraPosition) => camera_arrived,
            _ => false,
        };
        if reached {
            self.complete();
        }

        let result = if self.session.pending.is_some() {
            self.poll(elapsed)
        } else if self.session.index >= self.session.script.len() {
            self.end();
            Ok(())
        } else {
            self.dispatch()
        };

        if let Err(err) = &result {
            warn!("cutscene aborted: {err}");
            self.end();
        }
        result
    }

    /// Draw every visible drawing.
    pub fn draw(&mut self) {
        let camera = self.camera.position;
        for drawing in self.drawings.values().filter(|drawing| drawing.visible) {
            let params = drawing.draw_params(camera);
            self.services.graphics.draw(drawing.visual(), &params);
        }
    }

    /// Stop the cutscene and drop every non-persistent drawing. Effects
    /// already applied are not undone.
    pub fn end(&mut self) {
        self.session.active = false;
        self.session.pending = None;
        let before = self.drawings.len();
        self.drawings.retain(|_, drawing| drawing.persistent);
        info!(
            "cutscene ended at index {}; released {} drawings, kept {}",
            self.session.index,
            before - self.drawings.len(),
            self.drawings.len()
        );
    }

    pub fn is_running(&self) -> bool {
        self.session.active
    }

    pub fn current_index(&self) -> usize {
        self.session.index
    }

    pub fn pending(&self) -> Option<&Suspension> {
        self.session.pending.as_ref()
    }

    pub fn drawing(&self, name: &str) -> Option<&Drawing> {
        self.drawings.get(name)
    }

    pub fn drawing_names(&self) -> impl Iterator<Item = &str> {
        self.drawings.keys().map(String::as_str)
    }

    pub fn camera(&self) -> &Motion {
        &self.camera
    }

    /// Finish the pending instruction. Safe to call twice: only the first
    /// call moves the index.
    pub(crate) fn complete(&mut self) {
        if self.session.pending.take().is_some() {
            self.session.index += 1;
        }
    }

    fn poll(&mut self, elapsed: Duration) -> Result<(), CutsceneError> {
        let index = self.session.index;
        let done = match self.session.pending.as_mut() {
            Some(Suspension::Wait(countdown)) => {
                countdown.tick(elapsed);
                countdown.finished()
            }
            Some(Suspension::Button(button)) => self.services.input.is_down(button),
            Some(Suspension::AnyButton) => self.services.input.any_down(),
            Some(Suspension::Custom) => {
                let script = Rc::clone(&self.session.script);
                let instruction = &script[index];
                match self.handler.as_mut() {
                    Some(handler) => {
                        handler.update(instruction.command.name(), instruction, elapsed)
                            == Step::Done
                    }
                    None => true,
                }
            }
            Some(Suspension::DrawingPosition(name)) => {
                if !self.drawings.contains_key(name) {
                    return Err(CutsceneError::UnknownDrawing {
                        index,
                        name: name.clone(),
                    });
                }
                false
            }
            Some(Suspension::CameraPosition) | None => false,
        };
        if done {
            self.complete();
        }
        Ok(())
    }

    fn dispatch(&mut self) -> Result<(), CutsceneError> {
        let index = self.session.index;
        let script = Rc::clone(&self.session.script);
        let instruction = &script[index];
        debug!("dispatch #{index}: {}", instruction.command);

        let flow = match &instruction.command {
            Command::Custom(name) => match self.handler.as_mut() {
                Some(handler) => match handler.interpret(name, instruction) {
                    Step::Done => Flow::Done,
                    Step::Pending => Flow::Suspend(Suspension::Custom),
                },
                None => Flow::Done,
            },
            Command::Builtin(opcode) => self.dispatch_builtin(*opcode, index, instruction)?,
        };

        match flow {
            Flow::Done => self.session.index += 1,
            Flow::Suspend(suspension) => self.session.pending = Some(suspension),
            Flow::End => self.end(),
        }
        Ok(())
    }

    fn dispatch_builtin(
        &mut self,
        opcode: Opcode,
        at: usize,
        i: &Instruction,
    ) -> Result<Flow, CutsceneError> {
        use Opcode::*;

        match opcode {
            Wait => {
                let millis = i.number(0).at(at)?;
                Ok(Flow::Suspend(Suspension::Wait(Countdown::new(millis as u32))))
            }
            Fin => Ok(Flow::End),

            LoadSound => self.load_sound(at, i),
            UnloadSound => self.with_sound(at, i, |audio, name| audio.unload(name)),
            PlaySound => self.play_sound(at, i),
            PlayIndependentSound => self.play_independent_sound(at, i),
            ResumeSound => self.with_sound(at, i, |audio, name| audio.resume(name)),
            PauseSound => self.with_sound(at, i, |audio, name| audio.pause(name)),
            StopSound => self.with_sound(at, i, |audio, name| audio.stop(name)),
            SoundPosition => self.sound_position(at, i),
            SoundVolume => self.sound_volume(at, i),

            LoadDrawing => self.load_drawing(at, i),
            LoadImageFromColor => self.load_image_from_color(at, i),
            DrawingPersistence => self.toggle_drawing(at, i, |drawing| &mut drawing.persistent),
            DrawingIgnoreCamera => {
                self.toggle_drawing(at, i, |drawing| &mut drawing.ignore_camera)
            }
            DrawingX => self.set_drawing(at, i, |drawing, value| drawing.motion.position.x = value),
            DrawingY => self.set_drawing(at, i, |drawing, value| drawing.motion.position.y = value),
            DrawingWidth => self.set_drawing(at, i, |drawing, value| drawing.size.x = value),
            DrawingHeight => self.set_drawing(at, i, |drawing, value| drawing.size.y = value),
            DrawingVelocityX => {
                self.set_drawing(at, i, |drawing, value| drawing.motion.velocity.x = value)
            }
            DrawingVelocityY => {
                self.set_drawing(at, i, |drawing, value| drawing.motion.velocity.y = value)
            }
            DrawingAccelerationX => {
                self.set_drawing(at, i, |drawing, value| drawing.motion.acceleration.x = value)
            }
            DrawingAccelerationY => {
                self.set_drawing(at, i, |drawing, value| drawing.motion.acceleration.y = value)
            }
            DrawingWaitTillPosition => self.drawing_wait_till_position(at, i),
            DrawingRotation => self.drawing_rotation(at, i),
            DrawingOrigin => self.drawing_origin(at, i),
            DrawingLayerDepth => {
                self.set_drawing(at, i, |drawing, value| drawing.layer_depth = value)
            }
            DrawingSpriteEffects => self.drawing_sprite_effects(at, i),
            DrawingScaleX => self.set_drawing(at, i, |drawing, value| drawing.scale.x = value),
            DrawingScaleY => self.set_drawing(at, i, |drawing, value| drawing.scale.y = value),
            DrawingColor => self.drawing_color(at, i),
            FadeDrawing => self.set_drawing(at, i, |drawing, millis| drawing.fade(millis as u32)),
            UnfadeDrawing => {
                self.set_drawing(at, i, |drawing, millis| drawing.unfade(millis as u32))
            }
            ShowDrawing => self.with_drawing(at, i, |drawing| drawing.visible = true),
            HideDrawing => self.with_drawing(at, i, |drawing| drawing.visible = false),
            MaximizeDrawing => self.maximize_drawing(at, i),
            ChangeDrawingSpriteGroup => self.change_sprite_group(at, i),
            UnloadDrawing => self.unload_drawing(at, i),

            WaitForButton => self.wait_for_button(at, i),
            WaitForAnyButton => Ok(Flow::Suspend(Suspension::AnyButton)),
            ButtonDown => self.with_button(at, i, |input, button| input.set_button_down(button)),
            ButtonUp => self.with_button(at, i, |input, button| input.set_button_up(button)),
            PushButton => self.with_button(at, i, |input, button| input.push_button(button)),
            BlockInput => self.with_button(at, i, |input, button| input.set_blocked(button, true)),
            AllowInput => self.with_button(at, i, |input, button| input.set_blocked(button, false)),
            BlockAllInputs => {
                self.services.input.set_all_blocked(true);
                Ok(Flow::Done)
            }
            AllowAllInputs => {
                self.services.input.set_all_blocked(false);
                Ok(Flow::Done)
            }

            Signal => {
                let group = i.string(0).at(at)?;
                if let Some(handler) = self.handler.as_mut() {
                    handler.signal(group, i);
                }
                Ok(Flow::Done)
            }

            CameraX => self.set_camera(at, i, |camera, value| camera.position.x = value),
            CameraY => self.set_camera(at, i, |camera, value| camera.position.y = value),
            CameraVelocityX => self.set_camera(at, i, |camera, value| camera.velocity.x = value),
            CameraVelocityY => self.set_camera(at, i, |camera, value| camera.velocity.y = value),
            CameraAccelerationX => {
                self.set_camera(at, i, |camera, value| camera.acceleration.x = value)
            }
            CameraAccelerationY => {
                self.set_camera(at, i, |camera, value| camera.acceleration.y = value)
            }
            CameraWaitTillPosition => {
                let target = Vec2::new(i.number(0).at(at)? as f32, i.number(1).at(at)? as f32);
                self.camera.wait_till_position(target);
                Ok(Flow::Suspend(Suspension::CameraPosition))
            }

            ExitGame => {
                self.services.window.exit();
                Ok(Flow::Done)
            }
            ChangeScene => self.change_scene(at, i),
            ChangeSize => self.change_size(at, i),
            ChangeResolution => self.change_resolution(at, i),
            Fullscreen => self.fullscreen(i),
            ForceResizeResolution => self.force_resize_resolution(i),
            WindowTitle => {
                self.services.window.set_title(i.string(0).at(at)?);
                Ok(Flow::Done)
            }

            LoadFont | StringIndentation | StringAlignment | StringScale | String | Message
            | UnloadFont | X | Y | WaitTillPosition | Show | Hide | VelocityX | VelocityY
            | ApplyForceX | ApplyForceY | StopForceX | StopForceY | ChangeSpriteGroup
            | ChangeDrawing | EnableCollision | DisableCollision => {
                warn!(
                    "instruction {at}: {} has no effect in cutscenes, skipping",
                    opcode.name()
                );
                Ok(Flow::Done)
            }
        }
    }

    fn set_camera(
        &mut self,
        index: usize,
        instruction: &Instruction,
        apply: impl FnOnce(&mut Motion, f32),
    ) -> Result<Flow, CutsceneError> {
        let value = instruction.number(0).at(index)? as f32;
        apply(&mut self.camera, value);
        Ok(Flow::Done)
    }

    pub(crate) fn drawing_mut(
        &mut self,
        index: usize,
        name: &str,
    ) -> Result<&mut Drawing, CutsceneError> {
        self.drawings
            .get_mut(name)
            .ok_or_else(|| CutsceneError::UnknownDrawing {
                index,
                name: name.to_string(),
            })
    }

    pub(crate) fn require_button(&self, index: usize, button: &str) -> Result<(), CutsceneError> {
        if self.services.input.has_button(button) {
            Ok(())
        } else {
            Err(CutsceneError::UnknownButton {
                index,
                button: button.to_string(),
            })
        }
    }
}

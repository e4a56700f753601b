use std::{fs, path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use serde::Serialize;

use dream_engine::{HostEvent, InputListener, Interpreter, RecordingHandler, RecordingServices};

use crate::cli::RunOptions;

#[derive(Serialize)]
struct RunReport<'a> {
    script: &'a PathBuf,
    frames: u32,
    finished: bool,
    final_index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    events: &'a [HostEvent],
}

pub fn execute(options: RunOptions) -> Result<()> {
    let RunOptions {
        script,
        fps,
        max_frames,
        start_index,
        mut presses,
        buttons,
        resolution,
        record_draws,
        event_log_json,
        verbose: _,
    } = options;

    let known_buttons = RecordingServices::DEFAULT_BUTTONS
        .iter()
        .map(|name| name.to_string())
        .chain(buttons);
    let (services, handles) = RecordingServices::new(known_buttons, resolution);
    let mut interpreter = Interpreter::new(services);
    interpreter
        .start_file(
            &script,
            Some(Box::new(RecordingHandler::new(handles.log.clone()))),
            start_index,
        )
        .with_context(|| format!("loading cutscene {}", script.display()))?;

    presses.sort_by_key(|press| press.frame);
    let mut scheduled = presses.into_iter().peekable();
    let frame = Duration::from_secs_f64(1.0 / f64::from(fps));
    let mut frames = 0;
    let mut failure = None;

    while interpreter.is_running() && frames < max_frames {
        while let Some(press) = scheduled.next_if(|press| press.frame <= frames) {
            handles.log.record(HostEvent::ButtonPressed {
                button: press.button.clone(),
            });
            interpreter.button_pushed(&press.button);
        }

        let result = interpreter.update(frame);
        if record_draws {
            interpreter.draw();
        }
        frames += 1;

        if let Err(err) = result {
            failure = Some(err);
            break;
        }
    }

    let finished = !interpreter.is_running() && failure.is_none();
    let events = handles.log.events();

    if let Some(path) = event_log_json.as_ref() {
        let report = RunReport {
            script: &script,
            frames,
            finished,
            final_index: interpreter.current_index(),
            error: failure.as_ref().map(|err| err.to_string()),
            events: &events,
        };
        let json = serde_json::to_string_pretty(&report)?;
        fs::write(path, json)
            .with_context(|| format!("writing event log to {}", path.display()))?;
        println!("Saved event log to {}", path.display());
    }

    println!(
        "{}: {} frames, {} host events, stopped at instruction {}",
        script.display(),
        frames,
        events.len(),
        interpreter.current_index()
    );

    if let Some(err) = failure {
        return Err(err).with_context(|| format!("cutscene {} aborted", script.display()));
    }
    if !finished {
        println!("still running after {max_frames} frames");
    }
    Ok(())
}

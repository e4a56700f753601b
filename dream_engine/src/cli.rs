use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Parser;
use glam::Vec2;

#[derive(Parser, Debug)]
#[command(
    about = "Headless cutscene player that records every host call",
    version
)]
pub struct Args {
    /// Cutscene script to play (text `.dream` or binary `.dcut`)
    pub script: PathBuf,

    /// Frames per second used to step the interpreter
    #[arg(long, default_value_t = 60)]
    pub fps: u32,

    /// Stop after this many frames even if the cutscene is still running
    #[arg(long, default_value_t = 36_000)]
    pub max_frames: u32,

    /// Instruction index to start from
    #[arg(long, default_value_t = 0)]
    pub start_index: usize,

    /// Push a button before the given frame, as FRAME:BUTTON (repeatable)
    #[arg(long = "press", value_name = "FRAME:BUTTON", value_parser = parse_press)]
    pub presses: Vec<ScheduledPress>,

    /// Extra button name known to the input service (repeatable)
    #[arg(long = "button", value_name = "NAME")]
    pub buttons: Vec<String>,

    /// Resolution reported by the window service, as WIDTHxHEIGHT
    #[arg(long, default_value = "1280x720", value_parser = parse_resolution)]
    pub resolution: Vec2,

    /// Record draw calls for every frame
    #[arg(long)]
    pub record_draws: bool,

    /// Path to write the recorded host events as JSON
    #[arg(long)]
    pub event_log_json: Option<PathBuf>,

    /// Log every dispatched instruction
    #[arg(long)]
    pub verbose: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledPress {
    pub frame: u32,
    pub button: String,
}

#[derive(Debug)]
pub struct RunOptions {
    pub script: PathBuf,
    pub fps: u32,
    pub max_frames: u32,
    pub start_index: usize,
    pub presses: Vec<ScheduledPress>,
    pub buttons: Vec<String>,
    pub resolution: Vec2,
    pub record_draws: bool,
    pub event_log_json: Option<PathBuf>,
    pub verbose: bool,
}

pub fn parse() -> Result<RunOptions> {
    let args = Args::parse();
    args.into_options()
}

impl Args {
    fn into_options(self) -> Result<RunOptions> {
        if self.fps == 0 {
            bail!("--fps must be at least 1");
        }
        if self.max_frames == 0 {
            bail!("--max-frames must be at least 1");
        }

        Ok(RunOptions {
            script: self.script,
            fps: self.fps,
            max_frames: self.max_frames,
            start_index: self.start_index,
            presses: self.presses,
            buttons: self.buttons,
            resolution: self.resolution,
            record_draws: self.record_draws,
            event_log_json: self.event_log_json,
            verbose: self.verbose,
        })
    }
}

fn parse_press(value: &str) -> Result<ScheduledPress, String> {
    let (frame, button) = value
        .split_once(':')
        .ok_or_else(|| format!("expected FRAME:BUTTON, got '{value}'"))?;
    let frame = frame
        .trim()
        .parse()
        .map_err(|err| format!("invalid frame '{frame}': {err}"))?;
    let button = button.trim();
    if button.is_empty() {
        return Err(format!("missing button name in '{value}'"));
    }
    Ok(ScheduledPress {
        frame,
        button: button.to_string(),
    })
}

fn parse_resolution(value: &str) -> Result<Vec2, String> {
    let (width, height) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{value}'"))?;
    let parse = |part: &str| {
        part.trim()
            .parse::<u32>()
            .map_err(|err| format!("invalid dimension '{part}': {err}"))
    };
    Ok(Vec2::new(parse(width)? as f32, parse(height)? as f32))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_scheduled_presses() {
        assert_eq!(
            parse_press("12:Start").unwrap(),
            ScheduledPress {
                frame: 12,
                button: "Start".to_string(),
            }
        );
        assert!(parse_press("Start").is_err());
        assert!(parse_press("x:A").is_err());
        assert!(parse_press("3:").is_err());
    }

    #[test]
    fn parses_resolutions() {
        assert_eq!(parse_resolution("640x480").unwrap(), Vec2::new(640.0, 480.0));
        assert_eq!(parse_resolution("320X200").unwrap(), Vec2::new(320.0, 200.0));
        assert!(parse_resolution("640").is_err());
    }

    #[test]
    fn rejects_zero_fps() {
        let args = Args::parse_from(["dream_engine", "intro.dream", "--fps", "0"]);
        assert!(args.into_options().is_err());

        let args = Args::parse_from(["dream_engine", "intro.dream", "--press", "4:A"]);
        let options = args.into_options().unwrap();
        assert_eq!(options.fps, 60);
        assert_eq!(options.presses.len(), 1);
    }
}

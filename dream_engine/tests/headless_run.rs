use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use anyhow::{Context, Result};
use dream_formats::{CutsceneScript, Instruction, Opcode, ScriptFormat};
use serde::Deserialize;
use serde_json::Value;
use tempfile::tempdir;

#[derive(Debug, Deserialize)]
struct RunReport {
    frames: u32,
    finished: bool,
    final_index: usize,
    #[serde(default)]
    error: Option<String>,
    events: Vec<Value>,
}

fn run_player(script: &Path, log: &Path, extra: &[&str]) -> Result<Output> {
    let script_str = script.to_str().context("script path is not valid UTF-8")?;
    let log_str = log.to_str().context("log path is not valid UTF-8")?;
    Command::new(env!("CARGO_BIN_EXE_dream_engine"))
        .arg(script_str)
        .args(["--event-log-json", log_str])
        .args(extra)
        .output()
        .context("executing dream_engine")
}

fn read_report(path: &Path) -> Result<RunReport> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("reading event log {}", path.display()))?;
    serde_json::from_str(&data).context("parsing event log JSON")
}

fn event_kinds(report: &RunReport) -> Vec<String> {
    report
        .events
        .iter()
        .filter_map(|event| event["kind"].as_str().map(str::to_string))
        .collect()
}

#[test]
fn text_script_runs_to_completion() -> Result<()> {
    let temp_dir = tempdir().context("creating temporary directory")?;
    let script_path = temp_dir.path().join("intro.dream");
    let log_path = temp_dir.path().join("events.json");
    fs::write(
        &script_path,
        "windowTitle \"Headless\"\n\
         loadSound theme theme.ogg\n\
         playSound theme 0.5f\n\
         waitForButton A\n\
         customFlash 3\n\
         wait 100\n\
         fin\n",
    )?;

    let output = run_player(&script_path, &log_path, &["--fps", "10", "--press", "5:A"])?;
    assert!(
        output.status.success(),
        "dream_engine exited with {:?}: {}",
        output.status,
        String::from_utf8_lossy(&output.stderr)
    );

    let report = read_report(&log_path)?;
    assert!(report.finished);
    assert_eq!(report.frames, 9);
    assert!(report.error.is_none());
    assert_eq!(
        event_kinds(&report),
        vec![
            "window_title",
            "load_sound",
            "play_sound",
            "button_pressed",
            "custom"
        ]
    );

    let events = &report.events;
    assert_eq!(events[0]["title"], "Headless");
    assert_eq!(events[1]["path"], "theme.ogg");
    assert_eq!(events[2]["volume"].as_f64(), Some(0.5));
    assert_eq!(events[4]["name"], "customflash");
    Ok(())
}

#[test]
fn presses_fire_in_frame_order() -> Result<()> {
    let temp_dir = tempdir().context("creating temporary directory")?;
    let script_path = temp_dir.path().join("two_buttons.dream");
    let log_path = temp_dir.path().join("events.json");
    fs::write(&script_path, "waitForButton A\nwaitForButton B\nfin\n")?;

    let output = run_player(
        &script_path,
        &log_path,
        &["--press", "9:B", "--press", "3:A"],
    )?;
    assert!(output.status.success());

    let report = read_report(&log_path)?;
    assert!(report.finished);
    assert_eq!(report.frames, 10);
    let pressed: Vec<&str> = report
        .events
        .iter()
        .filter_map(|event| event["button"].as_str())
        .collect();
    assert_eq!(pressed, vec!["A", "B"]);
    Ok(())
}

#[test]
fn unpressed_button_keeps_the_cutscene_waiting() -> Result<()> {
    let temp_dir = tempdir().context("creating temporary directory")?;
    let script_path = temp_dir.path().join("stall.dream");
    let log_path = temp_dir.path().join("events.json");
    fs::write(&script_path, "waitForButton Start\nexitGame\n")?;

    let output = run_player(&script_path, &log_path, &["--max-frames", "30"])?;
    assert!(output.status.success());

    let report = read_report(&log_path)?;
    assert!(!report.finished);
    assert_eq!(report.frames, 30);
    assert_eq!(report.final_index, 0);
    assert!(event_kinds(&report).is_empty());
    Ok(())
}

#[test]
fn binary_script_records_draws() -> Result<()> {
    let temp_dir = tempdir().context("creating temporary directory")?;
    let script_path = temp_dir.path().join("block.dcut");
    let log_path = temp_dir.path().join("events.json");

    let script = CutsceneScript::new(
        ScriptFormat::Binary,
        vec![
            Instruction::builtin(Opcode::LoadImageFromColor)
                .with_string("block")
                .with_float(32.0)
                .with_float(32.0)
                .with_int(255)
                .with_int(0)
                .with_int(0),
            Instruction::builtin(Opcode::ShowDrawing).with_string("block"),
            Instruction::builtin(Opcode::Wait).with_int(50),
            Instruction::builtin(Opcode::Fin),
        ],
    );
    script.save(&script_path)?;
    assert!(fs::read(&script_path)?.starts_with(b"DCUT"));

    let output = run_player(&script_path, &log_path, &["--fps", "20", "--record-draws"])?;
    assert!(
        output.status.success(),
        "dream_engine exited with {:?}: {}",
        output.status,
        String::from_utf8_lossy(&output.stderr)
    );

    let report = read_report(&log_path)?;
    assert!(report.finished);
    assert_eq!(report.frames, 5);
    assert_eq!(
        event_kinds(&report),
        vec!["solid_color", "draw", "draw", "draw"]
    );
    let draw = &report.events[1];
    assert!(draw["visual"]
        .as_str()
        .is_some_and(|label| label.starts_with('#')));
    Ok(())
}

#[test]
fn unknown_drawing_aborts_with_context() -> Result<()> {
    let temp_dir = tempdir().context("creating temporary directory")?;
    let script_path = temp_dir.path().join("ghost.dream");
    let log_path = temp_dir.path().join("events.json");
    fs::write(&script_path, "windowTitle Haunted\nshowDrawing ghost\nfin\n")?;

    let output = run_player(&script_path, &log_path, &[])?;
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("no drawing named \"ghost\""),
        "missing drawing not reported: {stderr}"
    );

    let report = read_report(&log_path)?;
    assert!(!report.finished);
    assert_eq!(report.final_index, 1);
    assert!(report
        .error
        .as_deref()
        .is_some_and(|message| message.starts_with("instruction 1:")));
    assert_eq!(event_kinds(&report), vec!["window_title"]);
    Ok(())
}

#[test]
fn syntax_errors_name_the_line() -> Result<()> {
    let temp_dir = tempdir().context("creating temporary directory")?;
    let script_path = temp_dir.path().join("broken.dream");
    let log_path = temp_dir.path().join("events.json");
    fs::write(&script_path, "windowTitle \"unterminated\n")?;

    let output = run_player(&script_path, &log_path, &[])?;
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("line 1"), "line number missing: {stderr}");
    assert!(!log_path.exists());
    Ok(())
}

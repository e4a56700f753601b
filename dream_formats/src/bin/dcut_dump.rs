use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use dream_formats::{CutsceneScript, disassemble_instruction};

/// List the instructions of a cutscene script, text or binary.
#[derive(Parser)]
#[command(version)]
struct Args {
    /// Path to the `.dream` or `.dcut` script to inspect
    path: PathBuf,

    /// Print the parsed instructions as JSON instead of script text
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let script = CutsceneScript::open(&args.path)
        .with_context(|| format!("loading cutscene {}", args.path.display()))?;

    if args.json {
        let json = serde_json::to_string_pretty(&script)
            .context("serializing cutscene instructions to JSON")?;
        println!("{json}");
        return Ok(());
    }

    println!(
        "{:?} script {} ({} instructions)",
        script.format,
        args.path.display(),
        script.instructions.len()
    );
    for (index, instruction) in script.instructions.iter().enumerate() {
        let marker = match instruction.opcode() {
            Some(opcode) if opcode.is_reserved() => "reserved",
            Some(opcode) if opcode.suspends() => "waits",
            Some(_) => "",
            None => "custom",
        };
        println!(
            "{index:>5}  {marker:<8}  {}",
            disassemble_instruction(instruction)
        );
    }
    Ok(())
}

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use dream_formats::{CutsceneScript, ScriptFormat};
use walkdir::WalkDir;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Target {
    Binary,
    Text,
}

impl Target {
    fn format(self) -> ScriptFormat {
        match self {
            Target::Binary => ScriptFormat::Binary,
            Target::Text => ScriptFormat::Text,
        }
    }

    fn extension(self) -> &'static str {
        match self {
            Target::Binary => "dcut",
            Target::Text => "dream",
        }
    }
}

#[derive(Parser, Debug)]
#[command(about = "Convert cutscene scripts between text and binary form", version)]
struct Args {
    /// Script to convert (may be passed multiple times)
    #[arg(long = "script", value_name = "PATH", conflicts_with = "root")]
    scripts: Vec<PathBuf>,

    /// Directory scanned recursively for `.dream` and `.dcut` scripts
    #[arg(long, value_name = "DIR", conflicts_with = "scripts")]
    root: Option<PathBuf>,

    /// Output form
    #[arg(long, value_enum, default_value = "binary")]
    to: Target,

    /// Destination directory (defaults to next to each source script)
    #[arg(long, value_name = "DIR")]
    dest: Option<PathBuf>,

    /// Overwrite existing files instead of skipping them
    #[arg(long)]
    overwrite: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let scripts = resolve_script_paths(&args);
    if scripts.is_empty() {
        bail!("no cutscene scripts to convert");
    }

    if let Some(dest) = args.dest.as_ref() {
        fs::create_dir_all(dest)
            .with_context(|| format!("creating destination {}", dest.display()))?;
    }

    let mut converted = 0usize;
    for source in scripts {
        let output = output_path(&source, args.dest.as_deref(), args.to);
        if output == source {
            log::warn!("{} is already in the requested form", source.display());
            continue;
        }
        if output.exists() && !args.overwrite {
            log::warn!("skipping existing {}", output.display());
            continue;
        }

        let mut script = CutsceneScript::open(&source)
            .with_context(|| format!("loading cutscene {}", source.display()))?;
        script.format = args.to.format();
        script
            .save(&output)
            .with_context(|| format!("writing {}", output.display()))?;
        println!("{} -> {}", source.display(), output.display());
        converted += 1;
    }

    println!("Converted {converted} script(s)");
    Ok(())
}

fn resolve_script_paths(args: &Args) -> Vec<PathBuf> {
    if !args.scripts.is_empty() {
        return args.scripts.clone();
    }
    let Some(root) = args.root.as_ref() else {
        return Vec::new();
    };
    let mut scripts: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|res| res.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext.eq_ignore_ascii_case("dream") || ext.eq_ignore_ascii_case("dcut"))
                .unwrap_or(false)
        })
        .collect();
    scripts.sort();
    scripts
}

fn output_path(source: &Path, dest: Option<&Path>, target: Target) -> PathBuf {
    let renamed = source.with_extension(target.extension());
    match (dest, renamed.file_name()) {
        (Some(dir), Some(name)) => dir.join(name),
        _ => renamed,
    }
}

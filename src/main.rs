// Riffgen CLI entry point.
//
// Rolls a batch of metal riffs and writes each one to its own MIDI file.
// The pipeline: load weight tables → render sections (matrices, chord
// vocabulary, riff length per section; several riff parts each) → report.
//
// Usage:
//   generate [--repeats N] [--parts N] [--out-dir DIR] [--seed N]
//     [--tempo BPM] [--root NOTE] [--beats N] [--tables FILE] [-v...]

use anyhow::{Context, Result};
use clap::Parser;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::{Path, PathBuf};

use riffgen::markov::WeightTables;
use riffgen::params::Tuning;
use riffgen::song::{SongOptions, render_song};

#[derive(Parser)]
#[command(name = "generate", version, about = "Markov-chain metal riff generator")]
struct Cli {
    /// Directory the .mid files are written to
    #[arg(short, long, default_value = ".")]
    out_dir: PathBuf,

    /// Independent sections, each with freshly rolled chords and feel
    #[arg(short, long, default_value_t = 5)]
    repeats: u32,

    /// Riffs per section, sharing that section's chords and length
    #[arg(short, long, default_value_t = 3)]
    parts: u32,

    /// RNG seed for reproducible output (default: OS entropy)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Tempo in beats per minute
    #[arg(short, long, default_value_t = 140)]
    tempo: u16,

    /// MIDI note of the open low string (33 = drop-A A1)
    #[arg(long, default_value_t = 33)]
    root: u8,

    /// Fix every riff to this many beats instead of rolling 4/8/16
    #[arg(short, long)]
    beats: Option<f64>,

    /// JSON weight-table file (otherwise data/weight_tables.json is probed)
    #[arg(long)]
    tables: Option<PathBuf>,

    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    let tuning = Tuning {
        tempo_bpm: cli.tempo,
        root_note: cli.root,
        ..Tuning::default()
    };
    tuning.validate().context("invalid tuning")?;

    println!("=== Riffgen ===");
    println!("Output: {}", cli.out_dir.display());
    println!("Tempo: {} BPM (root note {})", tuning.tempo_bpm, tuning.root_note);
    println!("Sections: {} x {} parts", cli.repeats, cli.parts);
    if let Some(s) = cli.seed {
        println!("Seed: {}", s);
    }
    if let Some(b) = cli.beats {
        println!("Riff length: {} beats (fixed)", b);
    }
    println!();

    // Initialize RNG
    let mut rng = if let Some(s) = cli.seed {
        StdRng::seed_from_u64(s)
    } else {
        StdRng::from_os_rng()
    };

    println!("[1/3] Loading weight tables...");
    let tables = load_tables(cli.tables.as_deref())?;

    println!("[2/3] Rendering {} sections...", cli.repeats);
    let options = SongOptions {
        repeats: cli.repeats,
        parts: cli.parts,
        out_dir: cli.out_dir,
        params: None,
        length: cli.beats,
    };
    let written =
        render_song(&tuning, &options, &tables, &mut rng).context("riff generation failed")?;

    println!("[3/3] Done. {} files written.", written.len());
    if let Some(first) = written.first() {
        println!();
        println!("Play with: timidity {} (or any MIDI player)", first.display());
    }
    Ok(())
}

fn load_tables(override_path: Option<&Path>) -> Result<WeightTables> {
    if let Some(path) = override_path {
        let tables = WeightTables::load(path)
            .with_context(|| format!("failed to load weight tables from {}", path.display()))?;
        println!("  Loaded {}.", path.display());
        return Ok(tables);
    }

    let probe = Path::new("data/weight_tables.json");
    if probe.exists() {
        println!("  Found {}, loading...", probe.display());
        match WeightTables::load(probe) {
            Ok(t) => {
                println!("  Loaded successfully.");
                Ok(t)
            }
            Err(e) => {
                println!("  Failed to load: {}. Using built-in tables.", e);
                Ok(WeightTables::default_tables())
            }
        }
    } else {
        println!("  Using built-in tables.");
        Ok(WeightTables::default_tables())
    }
}

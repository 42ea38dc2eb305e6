mod audio;
mod blank_console;
mod capture;
mod gamepad;
mod window;

use blank_console::BlankLoader;
use clap::Parser;
use log::{error, info};
use nesplay_core::audio::AudioSink;
use nesplay_core::director::Director;
use nesplay_core::storage::{
    SaveStore, default_capture_dir, default_save_dir, default_settings_path,
};
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use window::WindowHost;

#[derive(Parser)]
#[command(version, about = "NES front-end")]
struct Args {
    /// ROM files or directories containing `.nes` files
    roms: Vec<PathBuf>,

    /// Directory for save states and SRAM
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Settings file
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Initial window scale
    #[arg(long, default_value_t = 3)]
    scale: u32,
}

fn is_rom(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("nes"))
}

fn roms_in_dir(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut roms: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && is_rom(p))
        .collect();
    roms.sort();
    Ok(roms)
}

/// Expand directories to the ROMs they contain. With no arguments the
/// working directory is scanned.
fn collect_roms(args: &[PathBuf]) -> io::Result<Vec<PathBuf>> {
    if args.is_empty() {
        return roms_in_dir(Path::new("."));
    }

    let mut roms = Vec::new();
    for path in args {
        if path.is_dir() {
            roms.extend(roms_in_dir(path)?);
        } else {
            roms.push(path.clone());
        }
    }
    Ok(roms)
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    let roms = match collect_roms(&args.roms) {
        Ok(roms) => roms,
        Err(e) => {
            error!("Failed to list ROMs: {e}");
            return ExitCode::FAILURE;
        }
    };
    info!("Found {} ROM(s)", roms.len());

    let mut sink = AudioSink::new();
    let _stream = match audio::start_stream(&mut sink) {
        Ok(stream) => stream,
        Err(e) => {
            error!("Failed to open audio output: {e}");
            return ExitCode::FAILURE;
        }
    };

    let host = match WindowHost::new("nesplay", args.scale, default_capture_dir()) {
        Ok(host) => host,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let store = SaveStore::new(args.data_dir.unwrap_or_else(default_save_dir));
    let settings_path = args.settings.unwrap_or_else(default_settings_path);
    let mut director = Director::new(host, sink, Box::new(BlankLoader), store, settings_path);

    if let Err(e) = director.start(roms) {
        error!("{e}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

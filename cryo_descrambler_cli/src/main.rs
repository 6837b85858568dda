//! # cryo_descrambler_cli
//!
//! Part of the cryo_descrambler crate family.
//!
//! Command line tool which reads a Cryo ASIC `.dat` run file, descrambles every image in it
//! and reports per-channel statistics.
//!
//! ## Use
//!
//! Make a template configuration, fill in `input_path`, then run
//!
//! ```bash
//! cryo_descrambler_cli new -p config.yml
//! cryo_descrambler_cli -p config.yml
//! ```
//!
//! Terminal output is kept short; library details (framing errors, skipped frames,
//! per-channel baselines) go to `cryo_descrambler.log`.
use clap::{Arg, Command};
use indicatif::{MultiProgress, ProgressBar};
use indicatif_log_bridge::LogWrapper;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use libcryo_descrambler::config::Config;
use libcryo_descrambler::error::ConfigError;
use libcryo_descrambler::process::process;

fn make_template_config(path: &Path) -> Result<(), ConfigError> {
    let config = Config::default();
    let yaml_str = serde_yaml::to_string(&config)?;
    let mut file = File::create(path)?;
    file.write_all(yaml_str.as_bytes())?;
    Ok(())
}

/// Route the library's logs to a file
fn init_library_log(path: &Path) -> Result<(), spdlog::Error> {
    let file_sink = Arc::new(
        spdlog::sink::FileSink::builder()
            .path(path)
            .truncate(true)
            .build()?,
    );
    let logger = Arc::new(
        spdlog::Logger::builder()
            .level_filter(spdlog::LevelFilter::All)
            .flush_level_filter(spdlog::LevelFilter::All)
            .sink(file_sink)
            .build()?,
    );
    spdlog::set_default_logger(logger);
    Ok(())
}

fn main() {
    // Create a cli
    let matches = Command::new("cryo_descrambler_cli")
        .arg_required_else_help(true)
        .subcommand(Command::new("new").about("Make a template configuration yaml file"))
        .arg(
            Arg::new("path")
                .short('p')
                .long("path")
                .global(true)
                .help("Path to the configuration file"),
        )
        .get_matches();

    // Initialize feedback
    let logger = simplelog::TermLogger::new(
        simplelog::LevelFilter::Info,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );

    let pb_manager = MultiProgress::new();

    LogWrapper::new(pb_manager.clone(), logger)
        .try_init()
        .expect("Could not create logging/progress!");

    let log_path = PathBuf::from("./cryo_descrambler.log");
    if let Err(e) = init_library_log(&log_path) {
        log::warn!("Could not open log file {}: {e}", log_path.to_string_lossy());
    }

    // Parse the cli
    let config_path = match matches.get_one::<String>("path") {
        Some(p) => PathBuf::from(p),
        None => {
            log::error!("A configuration path is required (-p/--path)");
            return;
        }
    };

    if let Some(("new", _)) = matches.subcommand() {
        log::info!(
            "Making a template config at {}...",
            config_path.to_string_lossy()
        );

        match make_template_config(&config_path) {
            Ok(()) => log::info!("Done."),
            Err(e) => log::error!("Could not create template config file: {e}"),
        }
        return;
    }

    // Load our config
    log::info!("Loading config from {}...", config_path.to_string_lossy());
    let config = match Config::read_config_file(&config_path) {
        Ok(c) => c,
        Err(e) => {
            log::error!("{e}");
            return;
        }
    };
    log::info!("Config successfully loaded.");
    log::info!("Input Path: {}", config.input_path.to_string_lossy());
    log::info!("Camera: {}", config.camera);
    log::info!("Bit Mask: {:#x}", config.bit_mask);
    match config.packets_per_frame {
        Some(n) => log::info!("Packets per Frame: {n}"),
        None => log::info!("Packets per Frame: camera default"),
    }
    match config.max_frames {
        Some(n) => log::info!("Frame Limit: {n}"),
        None => log::info!("Frame Limit: none"),
    }
    log::info!("Split by ASIC: {}", config.split_by_asic);

    // Setup the progress bar
    let pb = pb_manager.add(ProgressBar::new(100));
    let status = Arc::new(Mutex::new(0.0));
    let sent_status = status.clone();
    // Spawn the task!
    let handle = std::thread::spawn(|| process(config, sent_status));

    loop {
        // No UI to drive redraws, so poll about once a second
        std::thread::sleep(std::time::Duration::from_secs(1));
        match status.lock() {
            Ok(stat) => pb.set_position((*stat * 100.0) as u64),
            Err(e) => log::error!("{e}"),
        }

        if handle.is_finished() {
            match handle.join() {
                Ok(result) => match result {
                    Ok(summary) => {
                        log::info!(
                            "Built {} images from {} packets ({} read).",
                            summary.images_built,
                            summary.packets_read,
                            human_bytes::human_bytes(summary.bytes_read as f64)
                        );
                        if summary.framing_errors > 0 || summary.shape_mismatches > 0 {
                            log::warn!(
                                "{} framing errors and {} malformed frames were skipped; check {} for details",
                                summary.framing_errors,
                                summary.shape_mismatches,
                                log_path.to_string_lossy()
                            );
                        }
                    }
                    Err(e) => log::error!("Processing failed with error: {e}"),
                },
                Err(_) => log::error!("Failed to join processing task!"),
            }
            break;
        }
    }

    pb.finish();

    log::info!("Done.");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_config_round_trips() {
        let path = std::env::temp_dir().join("cryo_descrambler_cli_template_test.yml");
        make_template_config(&path).unwrap();
        let config = Config::read_config_file(&path).unwrap();
        assert_eq!(config, Config::default());
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_template_config_bad_directory() {
        let result = make_template_config(Path::new("/no/such/directory/config.yml"));
        assert!(matches!(result, Err(ConfigError::IOError(_))));
    }
}

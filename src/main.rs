//! Takeout Restore - put Google Photos export metadata back into the files
//!
//! A CLI tool that resolves a metadata source for every exported asset,
//! embeds it with exiftool, verifies the write and sorts the results into
//! processed and unresolved trees.

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use std::path::{Path, PathBuf};
use takeout_restore::{AssetStatus, Cli, Config, LogProgress, Processor};
use tracing::{Level, error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

// CLI Output Module
mod cli_output {
    //! Colored summary output for the terminal

    use crossterm::{
        ExecutableCommand,
        style::{Color, Print, Stylize, style},
    };
    use std::io::stdout;

    pub struct CliTheme;

    impl CliTheme {
        pub const SUCCESS: Color = Color::Green;
        pub const WARNING: Color = Color::Yellow;
        pub const ERROR: Color = Color::Red;
        pub const HINT: Color = Color::DarkGrey;
        pub const ACCENT: Color = Color::Cyan;
    }

    pub fn print_separator() {
        let _ = stdout().execute(Print(format!("{}\n", "─".repeat(60))));
    }

    /// Centered bold title
    pub fn print_title(title: &str) {
        let padding = 60usize.saturating_sub(title.len()) / 2;
        let _ = stdout().execute(Print(" ".repeat(padding)));
        let _ = stdout().execute(Print(title.bold()));
        let _ = stdout().execute(Print("\n"));
    }

    pub fn print_warning(msg: &str) {
        let _ = stdout().execute(Print(style("⚠ ").with(CliTheme::WARNING).bold()));
        let _ = stdout().execute(Print(format!("{}\n", msg)));
    }

    pub fn print_error(msg: &str) {
        let _ = stdout().execute(Print(style("✗ ").with(CliTheme::ERROR).bold()));
        let _ = stdout().execute(Print(format!("{}\n", msg)));
    }

    pub fn print_hint(msg: &str) {
        let _ = stdout().execute(Print(style("→ ").with(CliTheme::HINT)));
        let _ = stdout().execute(Print(format!("{}\n", msg)));
    }

    pub fn print_stat(key: &str, value: &str, color: Color) {
        let _ = stdout().execute(Print("  "));
        let _ = stdout().execute(Print(style(format!("{:<22}", key)).with(CliTheme::HINT)));
        let _ = stdout().execute(Print(style(value).with(color).bold()));
        let _ = stdout().execute(Print("\n"));
    }

    pub fn print_result(status_icon: &str, status_color: Color, source: &str, dest_or_msg: &str) {
        let _ = stdout().execute(Print("  "));
        let _ = stdout().execute(Print(style(status_icon).with(status_color).bold()));
        let _ = stdout().execute(Print(" "));
        let _ = stdout().execute(Print(style(source).italic()));
        let _ = stdout().execute(Print(" "));
        let _ = stdout().execute(Print(style(dest_or_msg).with(CliTheme::HINT)));
        let _ = stdout().execute(Print("\n"));
    }

    pub fn print_log_path(path: &str) {
        let _ = stdout().execute(Print("\n"));
        let _ = stdout().execute(Print(style("  Log file: ").with(CliTheme::HINT)));
        let _ = stdout().execute(Print(format!("{}\n", path)));
    }

    pub fn print_blank() {
        let _ = stdout().execute(Print("\n"));
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(ref path) = cli.init_config {
        std::fs::write(path, Config::sample_config())
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("Sample configuration written to {}", path.display());
        return Ok(());
    }

    // Get the executable directory for Config and Log directories
    let exe_dir = get_executable_dir()?;
    let log_path = get_log_path(&exe_dir, &cli);
    let _guard = setup_logging(&cli, &log_path)?;

    info!(version = env!("CARGO_PKG_VERSION"), "Takeout Restore starting");

    let config = load_config(&cli, &exe_dir)?;
    if config.verbose {
        info!(?config, "Configuration loaded");
    }
    info!(log_file = %log_path.display(), "Log file location");

    validate_config(&config)?;

    // A missing exiftool is fatal before any asset is touched
    let mut processor = match Processor::with_exiftool(config) {
        Ok(processor) => processor.with_observer(Box::new(LogProgress)),
        Err(e) => {
            error!(error = %e, "exiftool is required");
            cli_output::print_error(&format!("{}", e));
            cli_output::print_hint(
                "Install exiftool, or point --exiftool / TAKEOUT_RESTORE_EXIFTOOL at the binary",
            );
            std::process::exit(2);
        }
    };

    match processor.run() {
        Ok(results) => {
            use cli_output::*;

            let report = processor.stats().report();

            print_separator();
            print_title("Restore complete");
            print_separator();

            print_blank();
            print_stat("Files found", &report.total_files.to_string(), CliTheme::ACCENT);
            print_stat("Sidecar matched", &report.json_matched.to_string(), CliTheme::SUCCESS);
            print_stat("Cross-album matched", &report.cross_album_matched.to_string(), CliTheme::SUCCESS);
            print_stat(
                "From filename",
                &report.filename_metadata_extracted.to_string(),
                CliTheme::SUCCESS,
            );
            print_stat("Camera EXIF kept", &report.exif_preserved.to_string(), CliTheme::SUCCESS);
            print_stat("From album date", &report.album_date_inferred.to_string(), CliTheme::WARNING);
            print_stat("Unresolved", &report.unresolved.to_string(), CliTheme::ERROR);
            print_blank();
            print_stat("Dates restored", &report.date_restored.to_string(), CliTheme::SUCCESS);
            print_stat("Locations restored", &report.gps_restored.to_string(), CliTheme::SUCCESS);
            print_stat(
                "Descriptions restored",
                &report.description_restored.to_string(),
                CliTheme::SUCCESS,
            );
            print_stat("Extensions fixed", &report.extensions_fixed.to_string(), CliTheme::ACCENT);
            print_stat("Live Photo pairs", &report.live_photos_paired.to_string(), CliTheme::ACCENT);
            print_stat("Verified", &report.verified.to_string(), CliTheme::SUCCESS);
            print_stat("Unverified", &report.unverified.to_string(), CliTheme::WARNING);
            print_stat("Errors", &report.errors.to_string(), CliTheme::ERROR);
            print_stat("Success rate", &format!("{:.1}%", report.success_rate), CliTheme::ACCENT);
            print_blank();

            if cli.verbose {
                print_separator();
                print_hint("Detailed results");
                print_blank();

                for result in &results {
                    let source = result.source.display().to_string();
                    let dest = result
                        .destination
                        .as_ref()
                        .map(|p| format!("→ {} [{}]", p.display(), result.strategy))
                        .unwrap_or_default();
                    match result.status {
                        AssetStatus::Verified => print_result("✓", CliTheme::SUCCESS, &source, &dest),
                        AssetStatus::Unresolved => print_result("?", CliTheme::WARNING, &source, &dest),
                        AssetStatus::DryRun => print_result("~", CliTheme::ACCENT, &source, &dest),
                        AssetStatus::Failed => print_result(
                            "✗",
                            CliTheme::ERROR,
                            &source,
                            result.error.as_deref().unwrap_or("unknown error"),
                        ),
                    }
                }
            }

            let failed: Vec<_> = results
                .iter()
                .filter(|r| r.status == AssetStatus::Failed)
                .collect();
            if !failed.is_empty() {
                print_separator();
                print_error(&format!("{} files could not be placed", failed.len()));
                print_blank();
                for result in &failed {
                    print_result(
                        "✗",
                        CliTheme::ERROR,
                        &result.source.display().to_string(),
                        result.error.as_deref().unwrap_or("unknown error"),
                    );
                }
            }

            if let Some(ref path) = cli.report {
                let json = serde_json::to_string_pretty(&report)?;
                std::fs::write(path, json)
                    .with_context(|| format!("Failed to write report {}", path.display()))?;
                info!(report = %path.display(), "Run report written");
            }

            if processor.config().dry_run {
                print_separator();
                print_warning("Dry run - no files were written");
            }

            print_separator();
            print_log_path(&log_path.display().to_string());

            info!(log_file = %log_path.display(), "Processing complete. Log saved to");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Processing failed");
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Get the directory where the executable is located
fn get_executable_dir() -> Result<PathBuf> {
    let exe_path = std::env::current_exe()?;
    Ok(exe_path
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".")))
}

/// Determine the log file path based on config file or timestamp
fn get_log_path(exe_dir: &Path, cli: &Cli) -> PathBuf {
    let log_dir = exe_dir.join("Log");
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");

    if let Some(config_name) = cli.config_name() {
        log_dir
            .join(&config_name)
            .join(format!("{}_{}.log", config_name, timestamp))
    } else {
        log_dir.join(format!("Restore_{}.log", timestamp))
    }
}

/// Resolve config path - supports shorthand syntax
///
/// `family` finds `family.toml` in the working directory or in `<exe dir>/Config/`.
fn resolve_config_path(exe_dir: &Path, config_path: &Path) -> PathBuf {
    if config_path.exists() {
        return config_path.to_path_buf();
    }

    let with_extension = if config_path.extension().is_none() {
        config_path.with_extension("toml")
    } else {
        config_path.to_path_buf()
    };
    if with_extension.exists() {
        return with_extension;
    }

    let filename = config_path.file_name().unwrap_or(config_path.as_os_str());
    let mut in_config_dir = exe_dir.join("Config").join(filename);
    if in_config_dir.extension().is_none() {
        in_config_dir = in_config_dir.with_extension("toml");
    }
    if in_config_dir.exists() {
        return in_config_dir;
    }

    config_path.to_path_buf()
}

/// Load configuration from file or CLI arguments
fn load_config(cli: &Cli, exe_dir: &Path) -> Result<Config> {
    let config = if let Some(ref config_path) = cli.config {
        let resolved_path = resolve_config_path(exe_dir, config_path);
        info!(config_file = %resolved_path.display(), "Loading configuration from file");
        let file_config = Config::load_from_file(&resolved_path)?;
        cli.merge_with_config(file_config)
    } else {
        cli.to_config()
    };

    if config.input_dirs.is_empty() {
        anyhow::bail!("No input directories given. Use --input or a config file.");
    }

    Ok(config)
}

/// Setup logging (file + console)
fn setup_logging(cli: &Cli, log_path: &Path) -> Result<WorkerGuard> {
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let env_filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(log_path)?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    let subscriber = tracing_subscriber::registry().with(env_filter);

    if cli.json_log {
        subscriber
            .with(fmt::layer().json().with_ansi(false).with_writer(non_blocking))
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    } else {
        subscriber
            .with(fmt::layer().with_ansi(false).with_writer(non_blocking))
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    Ok(guard)
}

/// Validate configuration before processing
fn validate_config(config: &Config) -> Result<()> {
    for input_dir in &config.input_dirs {
        if !input_dir.exists() {
            warn!(path = %input_dir.display(), "Input directory does not exist");
        }
    }

    for input_dir in &config.input_dirs {
        if config.output_dir.starts_with(input_dir) {
            anyhow::bail!(
                "Output directory {} is inside input directory {}",
                config.output_dir.display(),
                input_dir.display()
            );
        }
    }

    if config.batch_size == 0 {
        anyhow::bail!("batch_size must be at least 1");
    }

    Ok(())
}

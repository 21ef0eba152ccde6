use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use kpm_autoload::config::loader::{get_default_config_dir, APP_DIR_NAME};
use kpm_autoload::{init_logging, AppError, AutoLoadManager, ConfigDraft, FileConfigStore};

#[derive(Parser)]
#[command(name = "kpm_autoload")]
#[command(about = "Manage which kernel-patch modules load automatically")]
struct Cli {
    /// Data directory holding the config (defaults to the platform data dir)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Directory for log files (defaults to <data dir>/kpm_autoload/logs)
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the current configuration as canonical JSON
    Show,
    /// Validate configuration text from FILE or stdin without saving
    Check {
        file: Option<PathBuf>,
    },
    /// Save configuration text from FILE or stdin
    Save {
        file: Option<PathBuf>,
        /// Override the enabled switch (otherwise the current value is kept)
        #[arg(long)]
        enabled: Option<bool>,
    },
    /// Turn auto-loading on, keeping the module list
    Enable,
    /// Turn auto-loading off, keeping the module list
    Disable,
    /// List configured module paths in load order
    Paths,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let app_dir = match &cli.data_dir {
        Some(dir) => dir.join(APP_DIR_NAME),
        None => get_default_config_dir()?,
    };
    let log_dir = cli.log_dir.clone().unwrap_or_else(|| app_dir.join("logs"));
    let level = if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    let collector = match init_logging(&log_dir, level) {
        Ok(collector) => Some(collector),
        Err(e) => {
            eprintln!("[Main] WARNING: logging unavailable: {}", e);
            None
        }
    };

    let store = match &cli.data_dir {
        Some(dir) => FileConfigStore::in_dir(dir),
        None => FileConfigStore::with_default_path()?,
    };
    log::debug!("[Main] Using config at {}", store.path().display());

    let manager = AutoLoadManager::open(Arc::new(store)).await;
    let outcome = run(cli.command, &manager).await;

    if let Some(collector) = collector {
        let _ = collector.wait_for_empty();
    }

    if let Err(e) = outcome {
        eprintln!("{}", e.user_message());
        std::process::exit(1);
    }
    Ok(())
}

async fn run(command: Commands, manager: &AutoLoadManager) -> Result<(), AppError> {
    match command {
        Commands::Show => {
            println!("{}", manager.config_json());
        }
        Commands::Check { file } => {
            let text = read_input(file.as_deref())?;
            let config = manager.parse_config_json(&text)?;
            println!(
                "valid: enabled={}, {} module path(s)",
                config.enabled,
                config.kpm_paths.len()
            );
        }
        Commands::Save { file, enabled } => {
            let mut draft = ConfigDraft::from_manager(manager);
            draft.set_text(read_input(file.as_deref())?);
            if let Some(enabled) = enabled {
                draft.set_enabled(enabled);
            }
            if let Some(error) = draft.error() {
                return Err(AppError::InvalidConfig(error.to_string()));
            }
            let saved = draft.commit(manager).await?;
            log::info!(
                "[Main] Saved: enabled={}, {} module path(s)",
                saved.enabled,
                saved.kpm_paths.len()
            );
        }
        Commands::Enable => set_enabled(manager, true).await?,
        Commands::Disable => set_enabled(manager, false).await?,
        Commands::Paths => {
            for (i, path) in manager.current().kpm_paths.iter().enumerate() {
                println!("{:>3}  {}", i + 1, path);
            }
        }
    }
    Ok(())
}

async fn set_enabled(manager: &AutoLoadManager, enabled: bool) -> Result<(), AppError> {
    let config = manager.current().with_enabled(enabled);
    manager.save_config(config).await?;
    println!("auto-load {}", if enabled { "enabled" } else { "disabled" });
    Ok(())
}

fn read_input(file: Option<&Path>) -> Result<String, AppError> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))
            .map_err(|e| AppError::Io(format!("{:#}", e))),
        None => {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text)?;
            Ok(text)
        }
    }
}

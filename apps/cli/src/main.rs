//! Command line front-end for the mod installer
//!
//! Run with:
//! ```
//! cargo run -p mod-installer-cli -- install /path/to/instance
//! ```

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use mod_installer::{
    CancellationToken, ConsoleProgressReporter, DownloadConfig, Installer, PathValidator,
    ProgressHooks, SettingsStore,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "mod-installer", version, about = "Install the mod pack into a Minecraft instance")]
struct Cli {
    /// Enable debug tracing
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Hide the step-by-step log, keep progress and summary
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Override the manifest endpoint
    #[arg(long, env = "MOD_INSTALLER_MANIFEST_URL", global = true)]
    manifest_url: Option<String>,

    /// Override the base URL item names are appended to
    #[arg(long, env = "MOD_INSTALLER_BASE_URL", global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Install every mod from the manifest into <PATH>/mods
    Install {
        /// Instance folder; defaults to the last one used
        path: Option<PathBuf>,
    },
    /// Download a single file
    Fetch {
        url: String,
        dest: PathBuf,
    },
    /// Print the manifest
    List,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = DownloadConfig::default();
    if let Some(url) = cli.manifest_url.clone() {
        config = config.with_manifest_url(url);
    }
    if let Some(url) = cli.base_url.clone() {
        config = config.with_base_url(url);
    }

    let installer = Installer::new(config).context("failed to set up the installer")?;
    let cancel = CancellationToken::new();
    watch_ctrl_c(cancel.clone());

    let hooks = ProgressHooks::from_reporter(ConsoleProgressReporter::new(!cli.quiet));

    match cli.command {
        Command::Install { path } => install(&installer, path, &hooks, &cancel).await,
        Command::Fetch { url, dest } => fetch(&installer, &url, &dest, &hooks, &cancel).await,
        Command::List => list(&installer, &cancel).await,
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn watch_ctrl_c(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, cancelling");
            cancel.cancel();
        }
    });
}

async fn install(
    installer: &Installer,
    path: Option<PathBuf>,
    hooks: &ProgressHooks,
    cancel: &CancellationToken,
) -> anyhow::Result<ExitCode> {
    let settings = SettingsStore::new();
    let path = match path {
        Some(path) => path,
        None => match settings.load().last_instance_path {
            Some(saved) => PathBuf::from(saved),
            None => bail!("no instance path given and none saved from a previous run"),
        },
    };

    println!("📁 Validating {}", path.display());
    let validation = PathValidator::new(installer.config().mods_folder.clone())
        .validate(&path.to_string_lossy());
    if !validation.is_valid {
        eprintln!("❌ {}", validation.error_message.unwrap_or_default());
        return Ok(ExitCode::FAILURE);
    }

    let result = installer.run(&path, hooks, cancel).await;
    println!();

    match result {
        Ok(summary) => {
            settings.remember_instance_path(&path);
            if summary.is_complete_success() {
                println!("✅ {summary}");
                Ok(ExitCode::SUCCESS)
            } else {
                println!("⚠️  {summary}");
                Ok(ExitCode::FAILURE)
            }
        }
        Err(e) if e.is_cancelled() => {
            println!("🛑 Installation cancelled.");
            Ok(ExitCode::FAILURE)
        }
        Err(e) => {
            error!("Installation aborted [{}]: {}", e.category(), e);
            eprintln!("❌ {}", e.user_message());
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn fetch(
    installer: &Installer,
    url: &str,
    dest: &Path,
    hooks: &ProgressHooks,
    cancel: &CancellationToken,
) -> anyhow::Result<ExitCode> {
    let result = installer.transfer(url, dest, hooks, cancel).await;
    println!();

    match result {
        Ok(size) => {
            println!("✅ Downloaded {} bytes to {}", size, dest.display());
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            error!("Download failed [{}]: {}", e.category(), e);
            eprintln!("❌ {}", e.user_message());
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn list(installer: &Installer, cancel: &CancellationToken) -> anyhow::Result<ExitCode> {
    match installer.fetch_manifest(cancel).await {
        Ok(items) => {
            for item in &items {
                println!("{item}");
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            eprintln!("❌ {}", e.user_message());
            Ok(ExitCode::FAILURE)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_install_with_overrides() {
        let cli = Cli::try_parse_from([
            "mod-installer",
            "--base-url",
            "https://mirror.example/",
            "install",
            "/instances/pack",
        ])
        .unwrap();

        assert_eq!(cli.base_url.as_deref(), Some("https://mirror.example/"));
        match cli.command {
            Command::Install { path } => assert_eq!(path, Some(PathBuf::from("/instances/pack"))),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn install_path_is_optional() {
        let cli = Cli::try_parse_from(["mod-installer", "install"]).unwrap();
        assert!(matches!(cli.command, Command::Install { path: None }));
    }

    #[test]
    fn fetch_requires_destination() {
        assert!(Cli::try_parse_from(["mod-installer", "fetch", "https://x/a.jar"]).is_err());
    }
}

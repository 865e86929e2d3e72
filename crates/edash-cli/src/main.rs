//! edash: dashboard data bundle tool
//!
//! Commands:
//!   seal <archive.zip> -o <bundle.json>   - encrypt an archive into a bundle
//!   open <bundle.json> -o <archive.zip>   - decrypt a bundle back to its archive
//!   inspect [<bundle.json>]               - decrypt, extract and assemble; print a summary
//!   config show                           - display current configuration

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use secrecy::SecretString;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use edash_core::types::DataSourceMode;
use edash_core::EdashConfig;
use edash_crypto::{bundle_fingerprint, resolve_bytes, seal, KdfParams};
use edash_dataset::Rejection;
use edash_loader::{map_crypto_error, user_message, BundleLoader, LoadOutcome};
use edash_storage::{BundleLocation, BundleSource};

// ── CLI structure ──────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "edash",
    version,
    about = "Energy dashboard data bundles",
    long_about = "edash: seal, open and inspect password-protected dashboard data bundles"
)]
struct Cli {
    /// Path to edash.toml configuration file
    #[arg(long, short = 'c', env = "EDASH_CONFIG", default_value = "edash.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error); overrides [log] level
    #[arg(long, env = "EDASH_LOG")]
    log: Option<String>,

    /// Log format; overrides [log] format
    #[arg(long, env = "EDASH_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Debug, ValueEnum)]
enum LogFormat {
    Json,
    Text,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Encrypt a ZIP archive into a bundle
    ///
    /// The passphrase is read from EDASH_PASSPHRASE or prompted for.
    Seal {
        /// ZIP archive to seal
        archive: PathBuf,
        /// Bundle JSON to write
        #[arg(long, short = 'o')]
        output: PathBuf,
        /// PBKDF2 iteration count
        #[arg(long, default_value_t = KdfParams::default().iterations)]
        iterations: u32,
    },

    /// Decrypt a bundle back to its ZIP archive
    Open {
        /// Bundle JSON to decrypt
        bundle: PathBuf,
        /// ZIP archive to write
        #[arg(long, short = 'o')]
        output: PathBuf,
    },

    /// Load a bundle end to end and summarize what the dashboards would get
    Inspect {
        /// Bundle JSON (default: [bundle] url / path from the config)
        bundle: Option<PathBuf>,
        /// Print the assembled datasets as JSON
        #[arg(long)]
        json: bool,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the active configuration (merged defaults + config file)
    Show,
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let (config, found) = load_config(&cli.config).await?;

    let level = cli.log.clone().unwrap_or_else(|| config.log.level.clone());
    let format = cli.log_format.clone().unwrap_or(match config.log.format.as_str() {
        "json" => LogFormat::Json,
        _ => LogFormat::Text,
    });
    init_logging(&level, &format);

    if !found {
        warn!("config file not found: {}  (using defaults)", cli.config.display());
    }

    match cli.command {
        Commands::Seal {
            archive,
            output,
            iterations,
        } => cmd_seal(&archive, &output, iterations).await,
        Commands::Open { bundle, output } => cmd_open(&bundle, &output).await,
        Commands::Inspect { bundle, json } => cmd_inspect(config, bundle.as_deref(), json).await,
        Commands::Config {
            action: ConfigAction::Show,
        } => cmd_config_show(&config, &cli.config, found),
    }
}

/// Read the config file; a missing file yields defaults and `false`.
async fn load_config(path: &Path) -> Result<(EdashConfig, bool)> {
    if !path.exists() {
        return Ok((EdashConfig::default(), false));
    }
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading config: {}", path.display()))?;
    let config = EdashConfig::from_toml(&content)
        .with_context(|| format!("parsing config: {}", path.display()))?;
    Ok((config, true))
}

fn init_logging(level: &str, format: &LogFormat) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Passphrase from EDASH_PASSPHRASE, else an interactive prompt.
fn read_passphrase(confirm: bool) -> Result<SecretString> {
    if let Ok(value) = std::env::var("EDASH_PASSPHRASE") {
        return Ok(SecretString::from(value));
    }

    let first = rpassword::prompt_password("Passphrase: ").context("reading passphrase")?;
    if confirm {
        let second =
            rpassword::prompt_password("Confirm passphrase: ").context("reading passphrase")?;
        if first != second {
            anyhow::bail!("passphrases do not match");
        }
    }
    if first.is_empty() {
        anyhow::bail!("empty passphrase");
    }
    Ok(SecretString::from(first))
}

fn make_spinner(prefix: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{prefix:.bold} {spinner} {msg}") {
        pb.set_style(style);
    }
    pb.set_prefix(prefix.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

// ── `edash seal` ──────────────────────────────────────────────────────────────

async fn cmd_seal(archive: &Path, output: &Path, iterations: u32) -> Result<()> {
    let bytes = tokio::fs::read(archive)
        .await
        .with_context(|| format!("reading archive: {}", archive.display()))?;
    let passphrase = read_passphrase(true)?;

    let spinner = make_spinner("seal");
    spinner.set_message(format!("deriving key ({iterations} iterations)"));
    let params = KdfParams { iterations };
    let bundle = tokio::task::spawn_blocking(move || seal(&bytes, &passphrase, &params))
        .await
        .context("seal task failed")?
        .map_err(map_crypto_error)?;
    spinner.finish_and_clear();

    let json = bundle.to_vec().map_err(map_crypto_error)?;
    tokio::fs::write(output, &json)
        .await
        .with_context(|| format!("writing bundle: {}", output.display()))?;

    info!(output = %output.display(), bytes = json.len(), "bundle sealed");
    println!(
        "sealed {} -> {} (fingerprint {})",
        archive.display(),
        output.display(),
        bundle_fingerprint(&json)
    );
    Ok(())
}

// ── `edash open` ──────────────────────────────────────────────────────────────

async fn cmd_open(bundle: &Path, output: &Path) -> Result<()> {
    let raw = tokio::fs::read(bundle)
        .await
        .with_context(|| format!("reading bundle: {}", bundle.display()))?;
    let passphrase = read_passphrase(false)?;

    let spinner = make_spinner("open");
    spinner.set_message("decrypting");
    let result = tokio::task::spawn_blocking(move || resolve_bytes(&raw, &passphrase))
        .await
        .context("decrypt task failed")?;
    spinner.finish_and_clear();

    let archive = result.map_err(map_crypto_error)?;
    tokio::fs::write(output, &archive)
        .await
        .with_context(|| format!("writing archive: {}", output.display()))?;

    println!("opened {} -> {} ({} bytes)", bundle.display(), output.display(), archive.len());
    Ok(())
}

// ── `edash inspect` ───────────────────────────────────────────────────────────

async fn cmd_inspect(config: EdashConfig, bundle: Option<&Path>, json: bool) -> Result<()> {
    let locale = config.bundle.locale;
    let mut loader = match bundle {
        Some(path) => {
            let source = BundleSource::from_location(&BundleLocation::Path(path.to_path_buf()))?;
            BundleLoader::with_source(config, source)
        }
        None => BundleLoader::new(config)?,
    };

    let result = if loader.config().bundle.mode == DataSourceMode::Url {
        let spinner = make_spinner("inspect");
        spinner.set_message("loading workbook");
        let result = loader.load_workbook().await;
        spinner.finish_and_clear();
        result
    } else {
        let passphrase = read_passphrase(false)?;
        let spinner = make_spinner("inspect");
        spinner.set_message("decrypting bundle");
        let result = loader.load(&passphrase).await;
        spinner.finish_and_clear();
        result
    };

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(err) => {
            eprintln!("{}", user_message(&err, locale));
            return Err(err.into());
        }
    };

    if json {
        let datasets: Vec<_> = outcome.registry.iter().collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&datasets).context("serializing datasets")?
        );
        return Ok(());
    }

    print_summary(&outcome);
    if let Some(message) = loader.status().message() {
        println!();
        println!("{message}");
    }
    Ok(())
}

fn print_summary(outcome: &LoadOutcome) {
    let archive = &outcome.archive;
    println!("Files:       {}", archive.summary());
    for issue in &archive.issues {
        println!("  ! {}: {}", issue.path, issue.reason);
    }
    for collision in &archive.collisions {
        println!(
            "  ~ {}: {} replaced {}",
            collision.key, collision.kept, collision.replaced
        );
    }
    if !archive.skipped.is_empty() {
        println!("  skipped:   {}", archive.skipped.join(", "));
    }

    println!("Diagrams:    {}", outcome.registry.len());
    let active = outcome.registry.active_key();
    for dataset in outcome.registry.iter() {
        let is_active =
            active.is_some_and(|k| k.source == dataset.source && k.diagram_id == dataset.diagram_id);
        let marker = if is_active { "*" } else { " " };
        println!(
            "  {marker} {}/{}  {}x{}  links={} nodes={} legend={} remarks={}{}",
            dataset.source,
            dataset.diagram_id,
            dataset.config.width.unwrap_or_default(),
            dataset.config.height.unwrap_or_default(),
            dataset.links.len(),
            dataset.nodes.len(),
            dataset.legend.len(),
            dataset.remarks.len(),
            dataset
                .rectangles
                .as_ref()
                .map(|r| format!(" rectangles={}", r.len()))
                .unwrap_or_default(),
        );
    }

    for rejection in &outcome.assembly.rejected {
        match rejection {
            Rejection::Incomplete {
                diagram_id,
                missing,
            } => {
                let missing: Vec<&str> = missing.iter().map(|k| k.as_str()).collect();
                println!("  - {diagram_id}: incomplete, missing {}", missing.join(", "));
            }
            Rejection::IdentityMismatch {
                diagram_id,
                mismatch,
                ..
            } => println!("  - {diagram_id}: {mismatch}"),
        }
    }

    if !outcome.capacity.is_empty() {
        println!("Capacity:    {}", join_keys(outcome.capacity.keys()));
    }
    if !outcome.tables.is_empty() {
        println!("Tables:      {}", join_keys(outcome.tables.keys()));
    }
    if !outcome.documents.is_empty() {
        println!("Documents:   {}", join_keys(outcome.documents.keys()));
    }
}

fn join_keys<'a>(keys: impl Iterator<Item = &'a String>) -> String {
    keys.map(String::as_str).collect::<Vec<_>>().join(", ")
}

// ── `edash config show` ───────────────────────────────────────────────────────

fn cmd_config_show(config: &EdashConfig, config_path: &Path, found: bool) -> Result<()> {
    if found {
        println!("# Configuration from: {}", config_path.display());
    } else {
        println!("# Configuration: defaults (no file at {})", config_path.display());
    }
    println!();
    let rendered = toml::to_string_pretty(config).context("serializing config to TOML")?;
    print!("{rendered}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use secrecy::ExposeSecret;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_seal_with_iterations() {
        let cli = Cli::try_parse_from([
            "edash", "seal", "data.zip", "-o", "bundle.json", "--iterations", "1000",
        ])
        .unwrap();
        match cli.command {
            Commands::Seal {
                archive,
                output,
                iterations,
            } => {
                assert_eq!(archive, PathBuf::from("data.zip"));
                assert_eq!(output, PathBuf::from("bundle.json"));
                assert_eq!(iterations, 1000);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn seal_iterations_default() {
        let cli = Cli::try_parse_from(["edash", "seal", "a.zip", "-o", "b.json"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Seal {
                iterations: 310_000,
                ..
            }
        ));
    }

    #[test]
    fn passphrase_from_env_skips_prompt() {
        std::env::set_var("EDASH_PASSPHRASE", "zonnepaneel-2050");
        let secret = read_passphrase(true).unwrap();
        std::env::remove_var("EDASH_PASSPHRASE");

        assert_eq!(secret.expose_secret(), "zonnepaneel-2050");
        assert!(!format!("{secret:?}").contains("zonnepaneel"));
    }

    #[tokio::test]
    async fn missing_config_uses_defaults() {
        let (config, found) = load_config(Path::new("/nonexistent/edash.toml")).await.unwrap();
        assert!(!found);
        assert_eq!(config.sheets.prefix, "snky_");
    }
}

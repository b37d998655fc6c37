use anyhow::{anyhow, Context, Result};
use clap::{Arg, ArgMatches, Command};
use config::{Config, File as ConfigFile};
use eip_identity_registry::{Dispatcher, Limits, RegistryConfig};
use eip_identity_storage::{load_or_deploy, RegistryStorage, SledStorage};
use eip_identity_types::{ContractCall, Principal};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod version;

use version::{git_commit_hash, NODE_VERSION};

const ENV_PREFIX: &str = "EIP_IDENTITY";
const DEFAULT_CONFIG_PATH: &str = "config/eip-identity.toml";

#[derive(Debug, Clone)]
struct AppConfig {
    registry: RegistryConfig,
    data_dir: PathBuf,

    // Logging
    log_level: String,
    log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogFormat {
    Compact,
    Pretty,
}

impl std::str::FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(LogFormat::Compact),
            "pretty" => Ok(LogFormat::Pretty),
            other => Err(anyhow!("unknown log_format {other:?} (expected compact or pretty)")),
        }
    }
}

impl AppConfig {
    fn load(config_path_override: Option<&str>) -> Result<Self> {
        let resolved_path = match config_path_override {
            Some(path) => {
                let path = PathBuf::from(path);
                if !path.exists() {
                    anyhow::bail!(
                        "Configuration file {} not found (specified via --config)",
                        path.display()
                    );
                }
                Some(path)
            }
            None => Some(PathBuf::from(DEFAULT_CONFIG_PATH)).filter(|p| p.exists()),
        };

        let mut builder = Config::builder();
        if let Some(path) = &resolved_path {
            builder = builder.add_source(ConfigFile::from(path.as_path()));
        }
        builder = builder.add_source(config::Environment::with_prefix(ENV_PREFIX));
        let config = builder.build()?;

        Self::from_config(&config)
    }

    fn from_config(config: &Config) -> Result<Self> {
        let administrator: Principal = config
            .get_string("administrator")
            .map_err(|_| anyhow!("administrator principal is required ({ENV_PREFIX}_ADMINISTRATOR)"))?
            .parse()
            .context("administrator is not a valid principal")?;

        let defaults = Limits::default();
        let limits = Limits {
            max_handle_bytes: get_usize(config, "max_handle_bytes", defaults.max_handle_bytes)?,
            max_description_bytes: get_usize(
                config,
                "max_description_bytes",
                defaults.max_description_bytes,
            )?,
        };
        let registry = RegistryConfig::new(administrator).with_limits(limits);
        registry.validate()?;

        Ok(Self {
            registry,
            data_dir: config
                .get_string("data_dir")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./data")),
            log_level: config
                .get_string("log_level")
                .unwrap_or_else(|_| "info".to_string()),
            log_format: match config.get_string("log_format") {
                Ok(value) => value.parse()?,
                Err(_) => LogFormat::Pretty,
            },
        })
    }

    fn db_path(&self) -> PathBuf {
        self.data_dir.join("registry")
    }
}

fn get_usize(config: &Config, key: &str, default: usize) -> Result<usize> {
    match config.get_int(key) {
        Ok(value) => usize::try_from(value).map_err(|_| anyhow!("{key} must be non-negative")),
        Err(config::ConfigError::NotFound(_)) => Ok(default),
        Err(err) => Err(err.into()),
    }
}

fn init_logging(config: &AppConfig) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    match config.log_format {
        LogFormat::Compact => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().compact())
            .init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .init(),
    }

    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
}

/// Apply a JSON array of calls as the next block and commit the result.
fn apply_block(config: &AppConfig, path: &Path) -> Result<()> {
    let calls: Vec<ContractCall> = read_json(path)?;
    let storage = SledStorage::new(config.db_path())?;
    let mut state = load_or_deploy(&storage, &config.registry)?;

    let height = storage.height()? + 1;
    let block = Dispatcher::execute_block(&mut state, height, &calls);
    storage.commit(&state.snapshot(), height)?;
    storage.flush()?;

    info!(
        height,
        receipts = block.receipts.len(),
        state_root = %hex::encode(state.state_root()),
        "block committed"
    );
    println!("{}", serde_json::to_string_pretty(&block)?);
    Ok(())
}

/// Evaluate one read-only call against committed state.
fn query(config: &AppConfig, path: &Path) -> Result<()> {
    let call: ContractCall = read_json(path)?;
    let storage = SledStorage::new(config.db_path())?;
    let state = load_or_deploy(&storage, &config.registry)?;

    let receipt = Dispatcher::query(&state, &call);
    debug!(function = %call.function, ok = receipt.result.is_ok(), "query evaluated");
    println!("{}", serde_json::to_string_pretty(&receipt)?);
    Ok(())
}

fn status(config: &AppConfig) -> Result<()> {
    let storage = SledStorage::new(config.db_path())?;
    let state = load_or_deploy(&storage, &config.registry)?;
    let summary = serde_json::json!({
        "height": storage.height()?,
        "administrator": state.administrator().to_string(),
        "identities": state.identities().len(),
        "attestors": state.attestors().len(),
        "state_root": hex::encode(state.state_root()),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn cli() -> Command {
    let file_arg = || Arg::new("file").required(true).value_name("FILE");
    Command::new("eip-identity-node")
        .version(NODE_VERSION)
        .about("Identity registry host: replays contract calls against persisted state")
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .value_name("PATH")
                .global(true)
                .help("TOML configuration file"),
        )
        .subcommand_required(true)
        .subcommand(
            Command::new("apply")
                .about("Apply a JSON array of calls as the next block")
                .arg(file_arg()),
        )
        .subcommand(
            Command::new("query")
                .about("Evaluate one read-only call")
                .arg(file_arg()),
        )
        .subcommand(Command::new("status").about("Print height, counts and state root"))
}

fn file_path(matches: &ArgMatches) -> Result<PathBuf> {
    matches
        .get_one::<String>("file")
        .map(PathBuf::from)
        .ok_or_else(|| anyhow!("missing FILE argument"))
}

fn main() -> Result<()> {
    let matches = cli().get_matches();
    let config = AppConfig::load(matches.get_one::<String>("config").map(String::as_str))?;
    init_logging(&config)?;

    info!(
        version = NODE_VERSION,
        commit = git_commit_hash(),
        data_dir = %config.data_dir.display(),
        "eip-identity-node starting"
    );

    match matches.subcommand() {
        Some(("apply", sub)) => apply_block(&config, &file_path(sub)?),
        Some(("query", sub)) => query(&config, &file_path(sub)?),
        Some(("status", _)) => status(&config),
        _ => Err(anyhow!("unknown command")),
    }
}

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use gce_agents::compute::{region_from_zone, short_name_from_reference, Region};
use gce_agents::config::Config;
use gce_agents::credentials::InMemoryCredentialStore;
use gce_agents::gcp::auth::{GcpCredentials, StaticToken, TokenSource};
use gce_agents::gcp::client::ComputeClient;
use gce_agents::gcp::http::format_gcp_error;
use gce_agents::windows::{validate_credential_ids, Validation, WindowsConfiguration};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Compute Engine helpers for build agent provisioning
#[derive(Parser, Debug)]
#[command(name = "gce-agents", version, about, long_about = None)]
struct Args {
    /// GCP project to use
    #[arg(short, long, global = true)]
    project: Option<String>,

    /// Compute API endpoint (for emulators)
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Use this access token instead of Application Default Credentials
    #[arg(long, global = true, env = "GCE_AGENTS_ACCESS_TOKEN", hide_env_values = true)]
    access_token: Option<String>,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List regions available for new agents
    Regions {
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,
    },
    /// List zones of a region available for new agents
    Zones {
        /// Region name or self-link (defaults to the region of the configured zone)
        region: Option<String>,
        /// Zone whose region to list when no region is given
        #[arg(long, conflicts_with = "region")]
        zone: Option<String>,
    },
    /// Print the short name of resource self-links
    ShortName {
        #[arg(required = true)]
        references: Vec<String>,
    },
    /// Check Windows agent credential settings
    WindowsCheck {
        #[arg(long)]
        password_credentials_id: Option<String>,
        #[arg(long)]
        private_key_credentials_id: Option<String>,
        /// YAML credentials file
        #[arg(long)]
        credentials_file: Option<PathBuf>,
    },
    /// Save defaults to the config file
    Configure {
        /// Default project
        #[arg(long)]
        default_project: Option<String>,
        /// Default zone
        #[arg(long)]
        default_zone: Option<String>,
        /// Compute API endpoint
        #[arg(long = "default-endpoint")]
        default_endpoint: Option<String>,
        /// YAML credentials file
        #[arg(long)]
        credentials_file: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Yaml,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

fn setup_logging(level: LogLevel) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let tracing_level = level.to_tracing_level()?;

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Cannot open log file {}: {}", log_path.display(), e);
            return None;
        }
    };

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("gce-agents started with log level: {:?}", level);
    tracing::info!("Log file: {:?}", log_path);

    Some(guard)
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("gce-agents").join("gce-agents.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".gce-agents").join("gce-agents.log");
    }
    PathBuf::from("gce-agents.log")
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level);
    let mut config = Config::load();

    match &args.command {
        Command::Regions { format } => list_regions(&args, &config, *format).await,
        Command::Zones { region, zone } => {
            let region = match region {
                Some(region) => region.clone(),
                None => region_from_zone(&config.effective_zone(zone.as_deref())),
            };
            list_zones(&args, &config, &region).await
        }
        Command::ShortName { references } => {
            for reference in references {
                println!("{}", short_name_from_reference(reference));
            }
            Ok(())
        }
        Command::WindowsCheck {
            password_credentials_id,
            private_key_credentials_id,
            credentials_file,
        } => windows_check(
            &config,
            password_credentials_id.as_deref(),
            private_key_credentials_id.as_deref(),
            credentials_file.clone(),
        ),
        Command::Configure {
            default_project,
            default_zone,
            default_endpoint,
            credentials_file,
        } => {
            if let Some(project) = default_project {
                config.project_id = Some(project.clone());
            }
            if let Some(zone) = default_zone {
                config.zone = Some(zone.clone());
            }
            if let Some(endpoint) = default_endpoint {
                config.endpoint = Some(endpoint.clone());
            }
            if let Some(path) = credentials_file {
                config.credentials_file = Some(path.clone());
            }
            config.save().context("Failed to save configuration")?;
            match Config::config_path() {
                Some(path) => println!("Saved {}", path.display()),
                None => println!("No config directory available; nothing saved"),
            }
            Ok(())
        }
    }
}

async fn build_client(args: &Args, config: &Config) -> Result<ComputeClient> {
    // Fail on a missing project before touching credentials
    let project = config.require_project(args.project.as_deref())?;
    let endpoint = config.effective_endpoint(args.endpoint.as_deref());

    let tokens: Arc<dyn TokenSource> = match &args.access_token {
        Some(token) => Arc::new(StaticToken::new(token.clone())),
        None => Arc::new(GcpCredentials::new().await?),
    };

    tracing::info!("Using project: {:?}, endpoint: {}", project, endpoint);
    Ok(ComputeClient::with_token_source(&project, tokens, &endpoint)?)
}

async fn list_regions(args: &Args, config: &Config, format: OutputFormat) -> Result<()> {
    let client = build_client(args, config).await?;
    let regions = client
        .regions()
        .await
        .map_err(|e| anyhow::anyhow!(format_gcp_error(&e)))
        .context("Failed to list regions")?;

    tracing::info!("Loaded {} regions", regions.len());
    print_regions(&regions, format)
}

fn print_regions(regions: &[Region], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => {
            println!("{:<28} ZONES", "REGION");
            for region in regions {
                println!("{:<28} {}", region.name, region.zones.join(","));
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(regions)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(regions)?),
    }
    Ok(())
}

async fn list_zones(args: &Args, config: &Config, region: &str) -> Result<()> {
    let client = build_client(args, config).await?;
    let zones = client
        .list_available_zones(client.project_id(), region)
        .await
        .map_err(|e| anyhow::anyhow!(format_gcp_error(&e)))
        .context("Failed to list zones")?;

    for zone in zones {
        println!("{}", zone.name);
    }
    Ok(())
}

fn windows_check(
    config: &Config,
    password_id: Option<&str>,
    private_key_id: Option<&str>,
    credentials_file: Option<PathBuf>,
) -> Result<()> {
    let configured = config.windows.as_ref();
    let password_id = password_id.or_else(|| configured.and_then(|w| w.password_credentials_id()));
    let private_key_id =
        private_key_id.or_else(|| configured.and_then(|w| w.private_key_credentials_id()));

    if let Validation::Error(message) = validate_credential_ids(password_id, private_key_id) {
        anyhow::bail!(message);
    }
    let windows = WindowsConfiguration::new(password_id, private_key_id)?;

    let Some(path) = credentials_file.or_else(|| config.credentials_file.clone()) else {
        println!("Configuration valid (no credentials file to resolve against)");
        return Ok(());
    };
    let store = InMemoryCredentialStore::load(&path)?;

    if let Some(id) = windows.password_credentials_id() {
        let status = if windows.password(&store).is_some() { "ok" } else { "not found" };
        println!("password credential {}: {}", id, status);
    }
    if let Some(id) = windows.private_key_credentials_id() {
        let status = match windows.private_key_credentials(&store) {
            Some(credential) => format!("ok (user {})", credential.username()),
            None => "not found".to_string(),
        };
        println!("private key credential {}: {}", id, status);
    }
    Ok(())
}

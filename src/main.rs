mod commands;

use clap::{Parser, ValueEnum};
use commands::{Command, Context};
use solum::api::{AuthOptions, HttpOptions, SolumClient};
use solum::config::{layered, Config};
use solum::output::OutputFormat;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

/// Command-line client for the Solum application-deployment API
#[derive(Parser, Debug)]
#[command(name = "solum", version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    global: GlobalArgs,
}

/// Connection and output options shared by every command
#[derive(clap::Args, Debug)]
struct GlobalArgs {
    /// Keystone user name
    #[arg(long, env = "OS_USERNAME", global = true)]
    os_username: Option<String>,

    /// Keystone password
    #[arg(long, env = "OS_PASSWORD", global = true, hide_env_values = true)]
    os_password: Option<String>,

    /// Keystone tenant (project) name
    #[arg(long, env = "OS_TENANT_NAME", global = true)]
    os_tenant_name: Option<String>,

    /// Keystone tenant (project) id
    #[arg(long, env = "OS_TENANT_ID", global = true)]
    os_tenant_id: Option<String>,

    /// Keystone URL (`.../v2.0` or `.../v3`)
    #[arg(long, env = "OS_AUTH_URL", global = true)]
    os_auth_url: Option<String>,

    /// Pre-obtained token, used together with --solum-url
    #[arg(long, env = "OS_AUTH_TOKEN", global = true, hide_env_values = true)]
    os_auth_token: Option<String>,

    /// Region used for the catalog lookup
    #[arg(long, env = "OS_REGION_NAME", global = true)]
    os_region_name: Option<String>,

    /// Solum endpoint, skips the catalog lookup
    #[arg(long, env = "SOLUM_URL", global = true)]
    solum_url: Option<String>,

    /// Solum API version
    #[arg(long, env = "SOLUM_API_VERSION", global = true)]
    solum_api_version: Option<String>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Skip TLS certificate verification
    #[arg(short = 'k', long, global = true)]
    insecure: bool,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Log requests to stderr
    #[arg(short, long, global = true)]
    debug: bool,

    /// Log level for the log file
    #[arg(long, value_enum, default_value = "off", global = true)]
    log_level: LogLevel,
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

fn setup_logging(
    debug: bool,
    level: LogLevel,
) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    if debug {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("solum=debug"));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
        return None;
    }

    let Some(tracing_level) = level.to_tracing_level() else {
        // Warnings still reach the terminal
        tracing_subscriber::fmt()
            .with_max_level(Level::WARN)
            .with_writer(std::io::stderr)
            .with_target(false)
            .without_time()
            .init();
        return None;
    };

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
            eprintln!("WARNING: cannot open log file {:?}: {}", log_path, e);
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

    tracing::info!("solum started with log level: {:?}", level);
    tracing::info!("Log file: {:?}", log_path);

    Some(guard)
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("solum").join("solum.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".solum").join("solum.log");
    }
    PathBuf::from("solum.log")
}

/// Merge flags/env with the config file into Keystone options
fn auth_options(args: &GlobalArgs, config: &Config) -> AuthOptions {
    AuthOptions {
        auth_url: layered(args.os_auth_url.as_deref(), config.auth_url.as_deref()),
        username: layered(args.os_username.as_deref(), config.username.as_deref()),
        password: args.os_password.clone().filter(|p| !p.is_empty()),
        tenant_id: args.os_tenant_id.clone().filter(|t| !t.is_empty()),
        tenant_name: layered(args.os_tenant_name.as_deref(), config.tenant_name.as_deref()),
        token: args.os_auth_token.clone().filter(|t| !t.is_empty()),
        endpoint: layered(args.solum_url.as_deref(), config.solum_url.as_deref()),
        region_name: layered(args.os_region_name.as_deref(), config.region_name.as_deref()),
        ..Default::default()
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let config = Config::load();
    let global = &args.global;

    let auth = auth_options(global, &config);

    let http_options = HttpOptions {
        insecure: global.insecure,
        timeout: Some(config.effective_timeout(global.timeout)),
    };
    let api_version = config.effective_api_version(global.solum_api_version.as_deref());

    let client = SolumClient::connect(&auth, &http_options, &api_version).await?;
    tracing::debug!("Solum API v{} at {}", client.api_version(), client.endpoint());

    let ctx = Context {
        client,
        format: if global.json {
            OutputFormat::Json
        } else {
            OutputFormat::Table
        },
        github_api_url: config.effective_github_api_url(),
    };

    commands::dispatch(args.command, &ctx).await
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();

    let _log_guard = setup_logging(args.global.debug, args.global.log_level);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::debug!("{:?}", err);
            if let Some(status) = err.downcast_ref::<solum::Error>().and_then(solum::Error::http_status) {
                tracing::debug!("Request failed with HTTP {}", status);
            }
            eprintln!("ERROR: {err:#}");
            ExitCode::FAILURE
        }
    }
}

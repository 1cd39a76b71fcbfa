//! powgate-server - protected endpoint with rate limiting and PoW step-up.

use std::net::SocketAddr;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use powgate_defense::DefenseConfig;
use powgate_server::config::{DEFAULT_PROTECTED_PATH, DEFAULT_WORKLOAD_ITERATIONS};
use powgate_server::{DefenseServer, ServerConfig};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "powgate-server")]
#[command(version, about = "Serve an expensive endpoint behind a rate limiter with PoW step-up")]
struct Cli {
    /// Address to listen on
    #[arg(long, env = "POWGATE_BIND", default_value = "0.0.0.0:8080")]
    bind: SocketAddr,

    /// Rate limit refill, in requests per second per client
    #[arg(long, env = "POWGATE_RATE", default_value_t = 1.0)]
    rate: f64,

    /// Requests a client may send back to back before being challenged
    #[arg(long, env = "POWGATE_BURST", default_value_t = 5)]
    burst: u32,

    /// Leading zero bits required in a PoW solution
    #[arg(long, env = "POWGATE_DIFFICULTY", default_value_t = powgate_defense::pow::DEFAULT_DIFFICULTY)]
    difficulty: u32,

    /// Path of the protected endpoint
    #[arg(long, env = "POWGATE_PROTECTED_PATH", default_value = DEFAULT_PROTECTED_PATH)]
    protected_path: String,

    /// SHA-256 rounds burned per admitted request
    #[arg(long, env = "POWGATE_WORKLOAD_ITERATIONS", default_value_t = DEFAULT_WORKLOAD_ITERATIONS)]
    workload_iterations: u32,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

impl Cli {
    fn server_config(&self) -> ServerConfig {
        let defense = DefenseConfig::builder()
            .tokens_per_second(self.rate)
            .burst(self.burst)
            .difficulty(self.difficulty)
            .build();

        ServerConfig::new(self.bind)
            .with_protected_path(self.protected_path.clone())
            .with_workload_iterations(self.workload_iterations)
            .with_defense(defense)
    }
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    let server = match DefenseServer::new(cli.server_config()) {
        Ok(server) => server,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    match server.serve_with_shutdown(shutdown_signal()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Server failed");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

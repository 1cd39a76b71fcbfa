//! powgate-attacker binary entrypoint.

use std::io;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use powgate_attacker::{run_attack, AttackSummary, Cli, Format};

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run_attack(cli.to_config())) {
        Ok(summary) => match render(&summary, cli.format) {
            Ok(text) => {
                println!("{text}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Error: {e}");
                ExitCode::FAILURE
            }
        },
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn render(summary: &AttackSummary, format: Format) -> serde_json::Result<String> {
    match format {
        Format::Table => Ok(summary.to_string()),
        Format::Json => serde_json::to_string_pretty(summary),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_table_and_json() {
        let summary = AttackSummary {
            sent: 3,
            admitted: 2,
            ..AttackSummary::default()
        };

        assert!(render(&summary, Format::Table).unwrap().contains("Requests sent"));

        let json: serde_json::Value =
            serde_json::from_str(&render(&summary, Format::Json).unwrap()).unwrap();
        assert_eq!(json["sent"], 3);
        assert_eq!(json["admitted"], 2);
    }
}

pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use quoteguard_core::config::{AppConfig, LoadOptions};
use rust_decimal::Decimal;

use crate::commands::CommandResult;

#[derive(Debug, Parser)]
#[command(
    name = "quoteguard",
    about = "Quotation approval-tier operator CLI",
    long_about = "Resolve approval tiers, confirm quotations against a JSON fixture, complete approvals, and inspect configuration.",
    after_help = "Examples:\n  quoteguard resolve --total 750 --role employee\n  quoteguard confirm --fixture orders.json --order S00042 --as e-sam\n  quoteguard config"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Path to a quoteguard.toml config file")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Resolve the approval decision for an order total and acting role")]
    Resolve {
        #[arg(long, allow_negative_numbers = true, help = "Order total")]
        total: Decimal,
        #[arg(long, help = "Acting role (employee_limited, employee, manager_level_1, ...)")]
        role: Option<String>,
    },
    #[command(about = "Attempt to confirm one or more draft quotations from a fixture file")]
    Confirm {
        #[arg(long, help = "JSON fixture with employees, orders and approvals")]
        fixture: PathBuf,
        #[arg(long = "order", required = true, help = "Order id; repeat for a batch")]
        orders: Vec<String>,
        #[arg(long = "as", help = "Employee id of the acting user")]
        actor: String,
    },
    #[command(about = "Complete a pending approval and retry confirmation as the approver")]
    Approve {
        #[arg(long, help = "JSON fixture with employees, orders and approvals")]
        fixture: PathBuf,
        #[arg(long, help = "Approval request id")]
        approval: String,
        #[arg(long = "as", help = "Employee id of the approver")]
        approver: String,
        #[arg(long, default_value = "Approved.", help = "Feedback recorded on the approval")]
        note: String,
    },
    #[command(about = "Cancel a draft or confirmed quotation")]
    Cancel {
        #[arg(long, help = "JSON fixture with employees, orders and approvals")]
        fixture: PathBuf,
        #[arg(long, help = "Order id")]
        order: String,
        #[arg(long = "as", help = "Employee id of the acting user")]
        actor: String,
    },
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let result = dispatch(cli.command, cli.config);

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

fn dispatch(command: Command, config_path: Option<PathBuf>) -> CommandResult {
    match command {
        Command::Config => {
            CommandResult { exit_code: 0, output: commands::config::run(config_path.as_deref()) }
        }
        Command::Resolve { total, role } => with_config("resolve", config_path, |config| {
            commands::resolve::run(config, total, role.as_deref())
        }),
        Command::Confirm { fixture, orders, actor } => {
            with_config("confirm", config_path, |config| {
                commands::confirm::run(config, &fixture, &orders, &actor)
            })
        }
        Command::Approve { fixture, approval, approver, note } => {
            with_config("approve", config_path, |config| {
                commands::approve::run(config, &fixture, &approval, &approver, &note)
            })
        }
        Command::Cancel { fixture, order, actor } => with_config("cancel", config_path, |config| {
            commands::cancel::run(config, &fixture, &order, &actor)
        }),
    }
}

/// Loads validated config and starts logging before running `body`.
fn with_config(
    command: &'static str,
    config_path: Option<PathBuf>,
    body: impl FnOnce(&AppConfig) -> CommandResult,
) -> CommandResult {
    let options = LoadOptions { config_path, ..LoadOptions::default() };
    match AppConfig::load(options) {
        Ok(config) => {
            init_logging(&config);
            body(&config)
        }
        Err(error) => CommandResult::failure(
            command,
            "config_validation",
            format!("configuration issue: {error}"),
            2,
        ),
    }
}

/// Logs go to stderr so stdout stays a single JSON payload.
fn init_logging(config: &AppConfig) {
    use quoteguard_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(log_level)
        .with_writer(std::io::stderr);

    let _ = match config.logging.format {
        Compact => builder.compact().try_init(),
        Pretty => builder.pretty().try_init(),
        Json => builder.json().try_init(),
    };
}

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use imbridge_core::{Invocation, OperationId};
use imbridge_sdk::params::LoginParams;
use imbridge_sdk::{ImBridgeConfig, Sdk};
use imbridge_store::{LocalStore, MigrationReport, StaticTargets, StepOutcome, StoreConversationIds};
use serde_json::Value;
use tracing_subscriber::{EnvFilter, fmt};

/// Pushes watched by `listen` when no `--event` is given.
const DEFAULT_EVENTS: &[&str] = &[
    "OnConnecting",
    "OnConnectSuccess",
    "OnConnectFailed",
    "OnKickedOffline",
    "OnUserTokenExpired",
    "OnRecvNewMessages",
    "OnNewConversation",
    "OnConversationChanged",
    "OnTotalUnreadMessageCountChanged",
];

#[derive(Parser)]
#[command(name = "imbridge", about = "imbridge: drive the IM unit from the command line")]
struct Cli {
    /// Path to the TOML config
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Upgrade a local store's schema in place
    Migrate {
        /// Store file; overrides `[store] path` from the config
        #[arg(long)]
        store: Option<PathBuf>,

        /// Conversation ids for per-conversation tables. Read from the
        /// store's conversation table when omitted.
        #[arg(long, value_delimiter = ',')]
        conversations: Option<Vec<String>>,
    },

    /// Boot the unit and run a single operation
    Call {
        /// Operation name, e.g. getLoginStatus
        operation: String,

        /// Arguments after the operation id. Each is sent as JSON if it
        /// parses, otherwise as a string.
        args: Vec<String>,

        /// Native entry point, when it differs from the operation name
        #[arg(long)]
        entry_point: Option<String>,

        #[arg(long)]
        operation_id: Option<String>,

        /// Log in before the call
        #[arg(long, requires = "token")]
        user_id: Option<String>,

        #[arg(long)]
        token: Option<String>,
    },

    /// Boot the unit and print pushes as JSON lines until interrupted
    Listen {
        /// Event to watch; repeatable
        #[arg(long = "event")]
        events: Vec<String>,

        #[arg(long, requires = "token")]
        user_id: Option<String>,

        #[arg(long)]
        token: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout carries command output only
    fmt()
        .with_env_filter(EnvFilter::from_env("IMBRIDGE_LOG"))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Migrate {
            store,
            conversations,
        } => run_migrate(cli.config.as_deref(), store, conversations).await,
        Command::Call {
            operation,
            args,
            entry_point,
            operation_id,
            user_id,
            token,
        } => {
            let sdk = boot(cli.config.as_deref(), user_id, token).await?;
            let mut invocation = Invocation::new(operation)
                .operation_id(operation_id.map(OperationId::from));
            if let Some(entry) = entry_point {
                invocation = invocation.entry_point(entry);
            }
            for arg in &args {
                invocation = invocation.arg(parse_arg(arg));
            }

            let outcome = sdk.invoke(invocation).await;
            sdk.shutdown();
            match outcome {
                Ok(resp) => {
                    println!("{}", serde_json::to_string_pretty(&resp)?);
                    Ok(())
                }
                Err(err) => {
                    println!("{}", serde_json::to_string_pretty(&err)?);
                    Err(err.into())
                }
            }
        }
        Command::Listen {
            events,
            user_id,
            token,
        } => {
            let sdk = boot(cli.config.as_deref(), user_id, token).await?;
            let events: Vec<String> = if events.is_empty() {
                DEFAULT_EVENTS.iter().map(|e| e.to_string()).collect()
            } else {
                events
            };
            for event in &events {
                sdk.on(event, |push| match serde_json::to_string(push) {
                    Ok(line) => println!("{line}"),
                    Err(e) => tracing::warn!(error = %e, "Could not print push"),
                });
            }
            tracing::info!(events = events.len(), "Listening for pushes, Ctrl-C to stop");

            let exited = sdk.bridge().guard().observe_exit();
            tokio::select! {
                result = tokio::signal::ctrl_c() => result?,
                status = exited => tracing::warn!(status = %status, "Unit exited"),
            }
            sdk.shutdown();

            let metrics = sdk.metrics().snapshot();
            tracing::info!(
                received = metrics.pushes_received,
                delivered = metrics.pushes_delivered,
                unparsable = metrics.pushes_unparsable,
                "Stopped listening"
            );
            Ok(())
        }
    }
}

async fn run_migrate(
    config_path: Option<&Path>,
    store: Option<PathBuf>,
    conversations: Option<Vec<String>>,
) -> Result<()> {
    let store_path = match (store, config_path) {
        (Some(path), _) => path,
        (None, Some(config_path)) => load_config(config_path)?.store.path,
        (None, None) => bail!("no store given; pass --store or --config"),
    };

    let store = Arc::new(
        LocalStore::open(&store_path)
            .with_context(|| format!("opening store {}", store_path.display()))?,
    );
    tracing::info!(store = %store_path.display(), "Migrating store");

    let report = match conversations {
        Some(ids) => imbridge_store::migrate(&store, &StaticTargets::new(ids)).await,
        None => {
            let provider = StoreConversationIds::new(Arc::clone(&store));
            imbridge_store::migrate(&store, &provider).await
        }
    };

    print_report(&report);
    Ok(())
}

fn print_report(report: &MigrationReport) {
    for record in &report.records {
        let outcome = match &record.outcome {
            StepOutcome::Applied => "applied".to_string(),
            StepOutcome::AlreadyApplied => "already applied".to_string(),
            StepOutcome::Failed(detail) => format!("failed: {detail}"),
        };
        println!("{:<14} {:<32} {outcome}", record.version, record.table);
    }
    println!(
        "{} applied, {} already applied, {} failed",
        report.applied(),
        report.already_applied(),
        report.failed()
    );
}

async fn boot(
    config_path: Option<&Path>,
    user_id: Option<String>,
    token: Option<String>,
) -> Result<Sdk> {
    let Some(config_path) = config_path else {
        bail!("this command needs a config; pass --config");
    };
    let config = load_config(config_path)?;
    let sdk = Sdk::from_config(&config)?;

    match (user_id, token) {
        (Some(user_id), Some(token)) => {
            sdk.login(LoginParams::new(user_id, token), None).await?;
        }
        _ => sdk.start().await?,
    }
    Ok(sdk)
}

fn load_config(path: &Path) -> Result<ImBridgeConfig> {
    ImBridgeConfig::from_file(path).with_context(|| format!("loading config {}", path.display()))
}

fn parse_arg(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn args_are_json_when_they_parse() {
        assert_eq!(parse_arg("42"), json!(42));
        assert_eq!(parse_arg("true"), json!(true));
        assert_eq!(parse_arg(r#"{"a":1}"#), json!({"a": 1}));
        assert_eq!(parse_arg("si_u1_u2"), json!("si_u1_u2"));
    }

    #[test]
    fn cli_parses_call() {
        let cli = Cli::try_parse_from([
            "imbridge",
            "--config",
            "im.toml",
            "call",
            "getUsersInfo",
            r#"["u1"]"#,
            "--operation-id",
            "op-1",
        ])
        .unwrap();
        match cli.command {
            Command::Call {
                operation,
                args,
                operation_id,
                ..
            } => {
                assert_eq!(operation, "getUsersInfo");
                assert_eq!(args, vec![r#"["u1"]"#]);
                assert_eq!(operation_id.as_deref(), Some("op-1"));
            }
            _ => panic!("expected call"),
        }
    }

    #[test]
    fn user_id_requires_token() {
        assert!(
            Cli::try_parse_from(["imbridge", "listen", "--user-id", "u1"]).is_err()
        );
    }
}

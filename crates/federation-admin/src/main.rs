//! Federation Admin - manage federation upstreams through a broker's management API

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;

use config::{Config, LoggingConfig};
use federation_core::{
    AckMode, FederationManager, RawResponse, Upstream, UpstreamDefinition, UpstreamSet,
    UpstreamSetMember,
};
use federation_proxy::HttpTransport;

/// Federation Admin - manage federation upstreams and upstream sets
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config/federation-admin.toml")]
    config: String,

    /// Management API base URL
    #[arg(long, env = "FEDERATION_ADMIN_URL")]
    url: Option<String>,

    /// Management API username
    #[arg(long, env = "FEDERATION_ADMIN_USERNAME")]
    username: Option<String>,

    /// Management API password
    #[arg(long, env = "FEDERATION_ADMIN_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Manage federation upstreams
    #[command(subcommand)]
    Upstream(UpstreamCommand),

    /// Manage federation upstream sets
    #[command(subcommand)]
    Set(SetCommand),
}

#[derive(Subcommand, Debug)]
enum UpstreamCommand {
    /// Create or replace an upstream
    Put {
        vhost: String,
        name: String,
        #[command(flatten)]
        definition: DefinitionArgs,
    },
    /// Show an upstream
    Get { vhost: String, name: String },
    /// List the upstreams of a vhost
    List { vhost: String },
    /// Delete an upstream
    Delete { vhost: String, name: String },
}

#[derive(Subcommand, Debug)]
enum SetCommand {
    /// Show the members of an upstream set
    Get { vhost: String, name: String },
    /// Replace an upstream set with the given members
    Put {
        vhost: String,
        name: String,
        upstreams: Vec<String>,
    },
    /// Append an upstream to a set, creating the set if needed
    Add {
        vhost: String,
        name: String,
        upstream: String,
    },
}

#[derive(Args, Debug)]
struct DefinitionArgs {
    /// AMQP URI of the remote broker
    #[arg(long)]
    uri: String,
    #[arg(long)]
    expires: Option<u64>,
    #[arg(long, allow_negative_numbers = true)]
    message_ttl: Option<i32>,
    #[arg(long)]
    max_hops: Option<u32>,
    #[arg(long)]
    prefetch_count: Option<u32>,
    /// Seconds between reconnection attempts
    #[arg(long)]
    reconnect_delay: Option<u32>,
    /// on-confirm, on-publish or no-ack
    #[arg(long)]
    ack_mode: Option<AckMode>,
    #[arg(long)]
    trust_user_id: bool,
    #[arg(long)]
    exchange: Option<String>,
    #[arg(long)]
    queue: Option<String>,
}

impl From<DefinitionArgs> for UpstreamDefinition {
    fn from(args: DefinitionArgs) -> Self {
        UpstreamDefinition {
            uri: args.uri,
            expires: args.expires,
            message_ttl: args.message_ttl,
            max_hops: args.max_hops,
            prefetch_count: args.prefetch_count,
            reconnect_delay: args.reconnect_delay,
            ack_mode: args.ack_mode,
            trust_user_id: args.trust_user_id,
            exchange: args.exchange,
            queue: args.queue,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(&cli.config)?;
    config.apply_overrides(cli.url, cli.username, cli.password);

    init_logging(&config.logging);

    info!("Federation Admin v{}", env!("CARGO_PKG_VERSION"));

    let transport = Arc::new(
        HttpTransport::new(config.broker.client_config())
            .context("Failed to create management client")?,
    );
    let manager = FederationManager::new(transport);

    let output = run(&manager, cli.command).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}

/// Execute a command and return its JSON output
async fn run(manager: &FederationManager, command: Command) -> Result<Value> {
    let output = match command {
        Command::Upstream(UpstreamCommand::Put {
            vhost,
            name,
            definition,
        }) => {
            let definition = UpstreamDefinition::from(definition);
            let response = manager
                .put_upstream(&vhost, &name, &definition)
                .await
                .with_context(|| format!("Failed to put upstream {}", name))?;
            status_output(&response)
        }
        Command::Upstream(UpstreamCommand::Get { vhost, name }) => {
            let definition = manager
                .get_upstream(&vhost, &name)
                .await
                .with_context(|| format!("Failed to get upstream {}", name))?;
            serde_json::to_value(Upstream {
                vhost,
                name,
                definition,
            })?
        }
        Command::Upstream(UpstreamCommand::List { vhost }) => {
            let upstreams = manager
                .list_upstreams(&vhost)
                .await
                .with_context(|| format!("Failed to list upstreams in vhost {}", vhost))?;
            serde_json::to_value(upstreams)?
        }
        Command::Upstream(UpstreamCommand::Delete { vhost, name }) => {
            let response = manager
                .delete_upstream(&vhost, &name)
                .await
                .with_context(|| format!("Failed to delete upstream {}", name))?;
            status_output(&response)
        }
        Command::Set(SetCommand::Get { vhost, name }) => {
            let names = manager
                .get_upstream_set(&vhost, &name)
                .await
                .with_context(|| format!("Failed to get upstream set {}", name))?;
            serde_json::to_value(UpstreamSet {
                vhost,
                name,
                members: names.into_iter().map(UpstreamSetMember::new).collect(),
            })?
        }
        Command::Set(SetCommand::Put {
            vhost,
            name,
            upstreams,
        }) => {
            let response = manager
                .put_upstream_set(&vhost, &name, &upstreams)
                .await
                .with_context(|| format!("Failed to put upstream set {}", name))?;
            status_output(&response)
        }
        Command::Set(SetCommand::Add {
            vhost,
            name,
            upstream,
        }) => {
            let response = manager
                .add_upstream_to_set(&vhost, &name, &upstream)
                .await
                .with_context(|| format!("Failed to add {} to upstream set {}", upstream, name))?;
            status_output(&response)
        }
    };

    Ok(output)
}

fn status_output(response: &RawResponse) -> Value {
    json!({ "status": response.status })
}

/// Initialize logging
///
/// Logs go to stderr; stdout carries command output only.
fn init_logging(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let layer = if config.format == "json" {
        fmt::layer().json().with_writer(std::io::stderr).boxed()
    } else {
        fmt::layer().with_writer(std::io::stderr).boxed()
    };

    tracing_subscriber::registry().with(layer).with(filter).init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bytes::Bytes;
    use clap::CommandFactory;
    use federation_proxy::{Transport, TransportError};
    use http::Method;
    use parking_lot::Mutex;
    use std::collections::HashMap;

    #[derive(Default)]
    struct MemoryBroker {
        params: Mutex<HashMap<String, Bytes>>,
    }

    #[async_trait]
    impl Transport for MemoryBroker {
        async fn execute(
            &self,
            method: Method,
            path: &str,
            body: Option<Bytes>,
        ) -> Result<RawResponse, TransportError> {
            let mut params = self.params.lock();
            let response = match method {
                Method::PUT => {
                    params.insert(path.to_string(), body.unwrap_or_default());
                    RawResponse::new(201, "")
                }
                _ => match params.get(path) {
                    Some(body) => RawResponse::new(200, body.clone()),
                    None => RawResponse::new(404, ""),
                },
            };
            Ok(response)
        }
    }

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("federation-admin").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_upstream_put() {
        let cli = parse(&[
            "upstream",
            "put",
            "/",
            "origin",
            "--uri",
            "amqp://remote",
            "--message-ttl",
            "-1",
            "--ack-mode",
            "no-ack",
            "--trust-user-id",
        ]);
        let Command::Upstream(UpstreamCommand::Put {
            vhost,
            name,
            definition,
        }) = cli.command
        else {
            panic!("expected upstream put");
        };
        assert_eq!(vhost, "/");
        assert_eq!(name, "origin");

        let definition = UpstreamDefinition::from(definition);
        assert_eq!(definition.uri, "amqp://remote");
        assert_eq!(definition.message_ttl, Some(-1));
        assert_eq!(definition.ack_mode, Some(AckMode::NoAck));
        assert!(definition.trust_user_id);
        assert_eq!(definition.exchange, None);
    }

    #[test]
    fn test_parse_rejects_unknown_ack_mode() {
        let result = Cli::try_parse_from([
            "federation-admin",
            "upstream",
            "put",
            "/",
            "origin",
            "--uri",
            "amqp://remote",
            "--ack-mode",
            "sometimes",
        ]);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_set_add_then_get() {
        let manager = FederationManager::new(Arc::new(MemoryBroker::default()));

        let output = run(&manager, parse(&["set", "add", "/", "all", "x"]).command)
            .await
            .unwrap();
        assert_eq!(output, json!({"status": 201}));
        run(&manager, parse(&["set", "add", "/", "all", "y"]).command)
            .await
            .unwrap();

        let output = run(&manager, parse(&["set", "get", "/", "all"]).command)
            .await
            .unwrap();
        assert_eq!(
            output,
            json!({
                "vhost": "/",
                "name": "all",
                "members": [{"upstream": "x"}, {"upstream": "y"}]
            })
        );
    }

    #[tokio::test]
    async fn test_get_missing_upstream_fails() {
        let manager = FederationManager::new(Arc::new(MemoryBroker::default()));
        let err = run(&manager, parse(&["upstream", "get", "/", "origin"]).command)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Failed to get upstream origin"));
    }
}

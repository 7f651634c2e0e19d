//! Config service (v1)
//!
//! Loads a TOML configuration file, validates the built-in namespaces,
//! reports plugin enablement and audits which keys were never read.
//!
//! # Architecture Overview
//!
//! ```text
//!   config.toml ──▶ loader ──▶ ConfigSource ──▶ ConfigService ──▶ server / logging / plugins.*
//!        ▲                          ▲                  │
//!        │                          │                  └──▶ used / unused key audit
//!        └──── watcher (--watch) ───┘
//! ```

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use config_service::config::loader::load_config;
use config_service::config::watcher::ConfigWatcher;
use config_service::config::{ConfigPath, ConfigService, ConfigSource, Env, Subscription};
use config_service::namespaces::{logging_schema, server_schema, LoggingConfig, ServerConfig};
use config_service::observability::{logging, metrics};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum RunMode {
    Development,
    Production,
}

#[derive(Parser)]
#[command(name = "config-service")]
#[command(about = "Validate a configuration file and audit unused keys", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long)]
    config: PathBuf,

    /// Runtime mode passed to schema validation.
    #[arg(short, long, value_enum, default_value = "development")]
    env: RunMode,

    /// Keep running and follow changes to the configuration file.
    #[arg(short, long)]
    watch: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let env = match cli.env {
        RunMode::Development => Env::development(),
        RunMode::Production => Env::production(),
    };

    let source = ConfigSource::with_initial(load_config(&cli.config)?);
    let service = ConfigService::new(source.subscribe(), env);

    // Logging level comes from the config itself, so read it before installing the subscriber.
    service.set_schema("logging", logging_schema()).await?;
    let logging_config = match service.at_path::<LoggingConfig>("logging").next().await {
        Some(result) => result?,
        None => LoggingConfig::default(),
    };
    if !logging_config.silent {
        logging::init_logging(&logging_config.level);
    }
    metrics::describe_metrics();

    tracing::info!(
        version = %service.env().package_info.version,
        mode = %service.env().mode.name,
        "config-service starting"
    );
    tracing::debug!(
        context = %serde_json::Value::Object(service.env().validation_context().to_map()),
        "Validation context"
    );

    service.set_schema("server", server_schema()).await?;
    let mut server_config = service.at_path::<ServerConfig>("server");
    if let Some(result) = server_config.next().await {
        let server = result?;
        tracing::info!(
            host = %server.host,
            port = server.port,
            ssl = server.ssl.enabled,
            "Server configuration loaded"
        );
    }

    report_plugins(&service).await?;

    let used = service.get_used_paths().await?;
    let unused = service.log_unused_paths().await?;
    println!("used keys ({}):", used.len());
    for path in &used {
        println!("  {}", path);
    }
    println!("unused keys ({}):", unused.len());
    for path in &unused {
        println!("  {}", path);
    }

    if !cli.watch {
        return Ok(());
    }

    let _watcher = ConfigWatcher::new(&cli.config, source.clone()).run()?;
    tokio::select! {
        _ = follow_server_config(server_config) => {}
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}

/// Log every distinct server configuration until the source closes.
async fn follow_server_config(mut server_config: Subscription<ServerConfig>) {
    while let Some(result) = server_config.next().await {
        match result {
            Ok(server) => {
                tracing::info!(
                    host = %server.host,
                    port = server.port,
                    "Server configuration changed"
                );
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    "Invalid server configuration, waiting for the next change"
                );
                server_config.resume();
            }
        }
    }
}

/// Log enablement of every `[plugins.<name>]` table.
async fn report_plugins(service: &ConfigService) -> Result<(), Box<dyn std::error::Error>> {
    let Some(snapshot) = service.get_full_config().next().await else {
        return Ok(());
    };
    let names: Vec<String> = snapshot
        .get("plugins")
        .and_then(|plugins| plugins.as_object())
        .map(|plugins| plugins.keys().cloned().collect())
        .unwrap_or_default();

    for name in names {
        let path = ConfigPath::from(vec!["plugins".to_string(), name.clone()]);
        let enabled = service.is_enabled_at_path(path).await?;
        tracing::info!(plugin = %name, enabled, "Plugin enablement");
        println!("plugin {}: {}", name, if enabled { "enabled" } else { "disabled" });
    }
    Ok(())
}

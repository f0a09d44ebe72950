//! alert-dispatch - Validate alert notifiers and send test notifications.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use alert_dispatch::cli::{Cli, LogFormat, test_notification_batch};
use alert_dispatch::config::ChannelsFile;
use alert_dispatch::notify::{
    ChannelRegistry, Collaborators, DeliveryContext, HttpTransport, NotifierRegistry,
};
use alert_dispatch::register_metric_descriptions;

/// Initialize the tracing subscriber with the specified log format.
///
/// - `LogFormat::Text`: Human-readable format for journalctl
/// - `LogFormat::Json`: Structured JSON format for log aggregation
fn init_logging(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::INFO.into());

    match format {
        LogFormat::Text => {
            tracing_subscriber::fmt()
                .with_writer(std::io::stderr)
                .with_env_filter(filter)
                .init();
        }
        LogFormat::Json => {
            tracing_subscriber::fmt()
                .with_writer(std::io::stderr)
                .json()
                .with_current_span(true)
                .with_span_list(false)
                .flatten_event(true)
                .with_env_filter(filter)
                .init();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.log_format);
    register_metric_descriptions();

    info!(config_path = %cli.config.display(), "Loading configuration");

    let config = match ChannelsFile::load(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, path = %cli.config.display(), "Failed to load configuration");
            std::process::exit(1);
        }
    };

    let templates = config
        .template_renderer()
        .context("invalid named template")?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(run(cli, config, templates))
}

async fn run(
    cli: Cli,
    config: ChannelsFile,
    templates: alert_dispatch::JinjaTemplates,
) -> Result<()> {
    // Request timeouts come from the delivery context deadline.
    let http_client = reqwest::Client::builder().build()?;

    let collaborators = Collaborators::new(Arc::new(templates))
        .with_transport(Arc::new(HttpTransport::new(http_client)));

    info!("Validating configuration");
    let registry = match NotifierRegistry::from_config(
        &config.notifiers,
        &ChannelRegistry::with_builtin_channels(),
        collaborators,
    ) {
        Ok(registry) => registry,
        Err(errors) => {
            for e in &errors {
                error!(error = %e, "Configuration validation error");
            }
            error!(
                error_count = errors.len(),
                "Configuration validation failed"
            );
            std::process::exit(1);
        }
    };

    if cli.validate {
        println!("Configuration is valid: {}", cli.config.display());
        println!("  External URL: {}", config.external_url);
        println!("  Templates: {}", config.templates.len());
        println!("  Notifiers: {}", registry.len());
        for name in registry.names() {
            if let Some(notifier) = registry.get(name) {
                println!(
                    "    - {} ({}, send_resolved: {})",
                    name,
                    notifier.notifier_type(),
                    notifier.send_resolved()
                );
            }
        }
        return Ok(());
    }

    let cancel = CancellationToken::new();
    let cancel_clone = cancel.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for ctrl-c signal");
            return;
        }
        info!("Received shutdown signal, cancelling delivery");
        cancel_clone.cancel();
    });

    let ctx = DeliveryContext::new()
        .with_cancellation(cancel)
        .with_timeout(cli.timeout());
    let batch = test_notification_batch(cli.resolved);

    let outcomes = match &cli.notifier {
        Some(name) => {
            let notifier = registry
                .get(name)
                .with_context(|| format!("unknown notifier '{}'", name))?;
            vec![(name.clone(), notifier.notify(&ctx, &batch).await)]
        }
        None => registry.notify_all(&ctx, &batch).await,
    };

    let mut failures = 0;
    for (name, outcome) in &outcomes {
        match outcome {
            Ok(true) => println!("{}: delivered", name),
            Ok(false) => println!("{}: nothing to send", name),
            Err(e) => {
                failures += 1;
                println!("{}: failed: {}", name, e);
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{} of {} test notifications failed", failures, outcomes.len());
    }
    info!(notifier_count = outcomes.len(), "Test notifications sent");
    Ok(())
}

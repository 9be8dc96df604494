use anyhow::Context;
use clap::{ArgAction, Parser};
use pkg_api::server::{ServerConfig, bind, serve};
use pkg_collector::ReconciliationLoop;
use pkg_collector::platform::KubeClientFactory;
use pkg_collector::sink::{EventSinkFactory, HoneycombSinkFactory};
use pkg_constants::collector::DEFAULT_POLL_INTERVAL_SECS;
use pkg_metrics::MetricsRegistry;
use pkg_types::config::{CollectorConfig, ExporterEnv, LogFormat, mask};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "srv-exporter",
    about = "Export Kubernetes Service endpoint readiness as Prometheus metrics"
)]
struct Cli {
    /// K8s service name that you want to monitor
    #[arg(long)]
    service_name: String,

    /// K8s namespace where the service is running
    #[arg(long)]
    namespace_name: String,

    /// Seconds between metric collection calls
    #[arg(long, default_value_t = DEFAULT_POLL_INTERVAL_SECS, value_parser = clap::value_parser!(u64).range(1..))]
    polling_interval: u64,

    /// Forward every collected snapshot to the event sink
    #[arg(
        long,
        default_value_t = false,
        num_args = 0..=1,
        default_missing_value = "true",
        action = ArgAction::Set
    )]
    otel_enabled: bool,
}

fn init_tracing(env: &ExporterEnv) {
    let filter = EnvFilter::try_new(&env.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match env.log_format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

/// Resolves once Ctrl-C or SIGTERM is received.
async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

fn shutdown_future(mut rx: watch::Receiver<bool>) -> impl Future<Output = ()> + Send + 'static {
    async move {
        let _ = rx.wait_for(|stop| *stop).await;
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let env = ExporterEnv::from_env()?;
    init_tracing(&env);

    let config = CollectorConfig::new(
        cli.service_name,
        cli.namespace_name,
        Duration::from_secs(cli.polling_interval),
        cli.otel_enabled,
        env.event_sink_settings(),
    )
    .context("invalid collector configuration")?;

    info!("Starting srv-exporter");
    info!(
        "  Service:        {}/{}",
        config.namespace_name(),
        config.service_name()
    );
    info!("  Interval:       {}s", config.poll_interval().as_secs());
    info!("  Port:           {}", env.exporter_port);
    info!("  Inside cluster: {}", env.inside_cluster);
    if let Some(sink) = config.event_sink().filter(|_| config.event_sink_enabled()) {
        info!(
            "  Event sink:     {} (dataset {}, key {})",
            sink.api_host,
            sink.dataset,
            mask(&sink.api_key)
        );
    }

    let registry = Arc::new(MetricsRegistry::new());
    let sink_factory = config
        .event_sink()
        .filter(|_| config.event_sink_enabled())
        .map(|settings| {
            Arc::new(HoneycombSinkFactory::new(settings.clone())) as Arc<dyn EventSinkFactory>
        });
    let collector = ReconciliationLoop::new(
        config,
        Arc::new(KubeClientFactory::new(env.inside_cluster)),
        sink_factory,
        Arc::clone(&registry),
    );

    let server_config = ServerConfig {
        addr: SocketAddr::from(([0, 0, 0, 0], env.exporter_port)),
    };
    let listener = bind(&server_config).await?;

    let (stop_tx, stop_rx) = watch::channel(false);
    let server = tokio::spawn(serve(
        listener,
        Arc::clone(&registry),
        shutdown_future(stop_rx.clone()),
    ));

    let signal_tx = stop_tx.clone();
    tokio::spawn(async move {
        wait_for_signal().await;
        info!("Program was interrupted, shutting down");
        let _ = signal_tx.send(true);
    });

    let result = collector.run(shutdown_future(stop_rx)).await;

    // Stop the metrics server in every case.
    let _ = stop_tx.send(true);
    match server.await {
        Ok(Err(e)) => warn!("Metrics server error: {}", e),
        Err(e) => warn!("Metrics server task failed: {}", e),
        Ok(Ok(())) => {}
    }

    if let Err(e) = result {
        error!("Exporter stopped: {}", e);
        return Err(e.into());
    }
    info!("Shutdown complete");
    Ok(())
}

//! tcpweblog-client binary entry point.
//!
//! Usage: tcpweblog-client <REMOTE_IP_ADDRESS> <REMOTE_PORT> <LOCAL_CACHE_FILE>
//!        <LOGNAME> <CLUSTER_NUMBER> <CLIENT_IP> <CLIENT_HOSTNAME>
//!
//! Log lines are read from stdin until it is closed.

use clap::error::ErrorKind;
use clap::Parser;
use overflow_store::OverflowStore;
use std::process::ExitCode;
use tcpweblog_client::{Args, ClientConfig, Forwarder, MAX_LINE_LEN};
use tokio::io::BufReader;
use tracing::{error, info, warn};
use weblog_transport::TcpTransport;

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::FAILURE,
            };
        }
    };

    let config = match args.into_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("tcpweblog-client: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // Initialize logging via observability crate
    if let Err(e) = observability::init_with_config(observability::LogConfig {
        service_name: "tcpweblog-client".into(),
        default_level: config.log_level.clone(),
        log_path: config.log_file.clone(),
        also_stderr: true,
    }) {
        eprintln!("tcpweblog-client: {}", e);
        return ExitCode::FAILURE;
    }

    info!(
        remote = %config.remote,
        cache = %config.cache_path.display(),
        stream = %config.tags.stream_name,
        cluster = config.tags.cluster_id,
        client_ip = %config.tags.client_ip,
        client_host = %config.tags.client_host,
        "Configuration loaded"
    );

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(error = %e, "Failed to start async runtime");
            return ExitCode::FAILURE;
        }
    };

    runtime.block_on(run(config));

    // A pending stdin read sits on a blocking thread that cannot be
    // cancelled; do not wait for it.
    runtime.shutdown_background();
    ExitCode::SUCCESS
}

async fn run(config: ClientConfig) {
    let transport = TcpTransport::new(config.remote);
    let store = OverflowStore::new(config.cache_path);
    let mut forwarder = Forwarder::new(config.tags, transport, store);

    let input = BufReader::with_capacity(MAX_LINE_LEN, tokio::io::stdin());

    tokio::select! {
        stats = forwarder.run(input) => {
            info!(live = stats.live, cached = stats.cached, "Input closed");
        }
        _ = shutdown_signal() => {
            info!("Received shutdown signal, exiting...");
        }
    }

    forwarder.shutdown().await;
}

/// Resolve on Ctrl-C or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

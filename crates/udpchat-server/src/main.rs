//! udpchat-server entry point.

use std::process::ExitCode;

use clap::Parser;
use tracing::{Level, info};

use udpchat_core::{TracingConfig, init_tracing};
use udpchat_server::{Cli, RequestHandler, ServerResult, SignalHandler, UdpServer};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.debug { Level::DEBUG } else { Level::INFO };
    if let Err(e) = init_tracing(TracingConfig::server().with_level(level)) {
        eprintln!("error: {}", e);
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> ServerResult<()> {
    let config = cli.server_config();
    let server = UdpServer::bind(config.clone()).await?;
    let mut handler = RequestHandler::new(&config);

    let signals = SignalHandler::new();
    signals.spawn_listener();

    server
        .run_until_shutdown(&mut handler, signals.shutdown().wait())
        .await?;

    info!("Server stopped");
    Ok(())
}

//! udpchat entry point.

use std::io::BufRead;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tokio::sync::mpsc;
use tracing::{Level, debug, info};

use udpchat_client::{ChatSocket, Cli, ClientResult, ClientSession, SessionState, run_session};
use udpchat_core::{TracingConfig, init_tracing};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.debug { Level::DEBUG } else { Level::WARN };
    if let Err(e) = init_tracing(TracingConfig::client().with_level(level)) {
        eprintln!("error: {}", e);
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(SessionState::DisconnectedByServerError) => ExitCode::FAILURE,
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> ClientResult<SessionState> {
    let settings = cli.settings(cli.load_config()?)?;

    let socket = ChatSocket::connect(&settings.address, settings.port).await?;
    let session = ClientSession::new(settings.username, socket.server_addr())?;
    info!(
        server = %socket.server_addr(),
        local = %socket.local_addr()?,
        window_size = settings.window_size,
        "Connecting"
    );

    let (lines_tx, lines_rx) = mpsc::channel(16);
    spawn_stdin_reader(lines_tx.clone());
    spawn_ctrl_c_quit(lines_tx);

    let (output_tx, mut output_rx) = mpsc::unbounded_channel::<String>();
    let printer = tokio::spawn(async move {
        while let Some(line) = output_rx.recv().await {
            println!("{}", line);
        }
    });

    let state = run_session(Arc::new(socket), Arc::new(session), lines_rx, output_tx).await;
    let _ = printer.await;
    state
}

/// Blocking stdin reads live on their own thread so they never hold up
/// runtime shutdown. EOF closes the channel.
fn spawn_stdin_reader(lines: mpsc::Sender<String>) {
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if lines.blocking_send(line).is_err() {
                break;
            }
        }
        debug!("stdin reader stopped");
    });
}

/// Ctrl+C injects a `quit` line. Holds only a weak sender so stdin EOF
/// still closes the channel.
fn spawn_ctrl_c_quit(lines: mpsc::Sender<String>) {
    let lines = lines.downgrade();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl+C, quitting");
            if let Some(lines) = lines.upgrade() {
                let _ = lines.send("quit".to_string()).await;
            }
        }
    });
}

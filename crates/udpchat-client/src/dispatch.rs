//! The two client loops: inbound rendering and outbound user commands.
//!
//! Both loops share the socket and the session. A terminal state set by
//! either one stops the other through the session's watch channel.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use udpchat_protocol::MAX_DATAGRAM_SIZE;

use crate::error::ClientResult;
use crate::session::{
    ClientSession, INPUT_ERROR_TEXT, Inbound, InputError, Outbound, QUIT_TEXT, SessionState,
};
use crate::socket::ChatSocket;

/// Receives server datagrams and forwards rendered lines to `output`.
///
/// Returns once the session reaches a terminal state.
pub async fn receive_loop(
    socket: Arc<ChatSocket>,
    session: Arc<ClientSession>,
    output: mpsc::UnboundedSender<String>,
) {
    let mut state = session.subscribe();
    let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];

    while !session.state().is_terminal() {
        tokio::select! {
            received = socket.recv(&mut buf) => {
                let len = match received {
                    Ok(len) => len,
                    Err(e) => {
                        warn!(error = %e, "Failed to receive datagram");
                        continue;
                    }
                };

                match session.handle_datagram(&buf[..len]) {
                    Inbound::Render(line) => {
                        let _ = output.send(line);
                    }
                    Inbound::Disconnect(line) => {
                        let _ = output.send(line);
                        break;
                    }
                    Inbound::Ignore => {}
                }
            }
            changed = state.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }

    debug!("Receive loop stopped");
}

/// Reads user lines from `lines` and acts on them.
///
/// A closed input channel counts as `quit`. Returns once the session
/// reaches a terminal state.
pub async fn input_loop(
    socket: &ChatSocket,
    session: &ClientSession,
    mut lines: mpsc::Receiver<String>,
    output: &mpsc::UnboundedSender<String>,
) {
    let mut state = session.subscribe();

    while !session.state().is_terminal() {
        let line = tokio::select! {
            line = lines.recv() => line.unwrap_or_else(|| "quit".to_string()),
            changed = state.changed() => {
                if changed.is_err() {
                    break;
                }
                continue;
            }
        };

        match session.handle_input(&line) {
            Ok(Outbound::Send(command)) => {
                if let Err(e) = socket.send(&command).await {
                    warn!(command = command.name(), error = %e, "Failed to send command");
                    let _ = output.send(format!("error: {}", e));
                }
            }
            Ok(Outbound::Print(text)) => {
                let _ = output.send(text);
            }
            Ok(Outbound::Quit(command)) => {
                if let Err(e) = socket.send(&command).await {
                    warn!(error = %e, "Failed to send disconnect");
                }
                let _ = output.send(QUIT_TEXT.to_string());
                break;
            }
            Err(InputError::NotActive(current)) => {
                debug!(state = ?current, "Session no longer accepts input");
                break;
            }
            Err(e) => {
                debug!(input = %line, error = %e, "Rejected user input");
                let _ = output.send(INPUT_ERROR_TEXT.to_string());
            }
        }
    }

    debug!("Input loop stopped");
}

/// Joins the server and runs both loops until the session ends.
///
/// Returns the terminal state the session ended in.
pub async fn run_session(
    socket: Arc<ChatSocket>,
    session: Arc<ClientSession>,
    lines: mpsc::Receiver<String>,
    output: mpsc::UnboundedSender<String>,
) -> ClientResult<SessionState> {
    socket.send(&session.join_command()).await?;
    session.mark_joined();
    info!(
        username = %session.username(),
        server = %session.server_addr(),
        "Join sent"
    );

    let receiver = tokio::spawn(receive_loop(
        socket.clone(),
        session.clone(),
        output.clone(),
    ));

    input_loop(&socket, &session, lines, &output).await;

    if !session.state().is_terminal() {
        receiver.abort();
    }
    if let Err(e) = receiver.await {
        if e.is_panic() {
            warn!(error = %e, "Receive loop panicked");
        }
    }

    Ok(session.state())
}

//! Client session: identity, state machine, input commands, inbound rendering.
//!
//! ```text
//! CONNECTING --join sent--> ACTIVE --quit--------------> DISCONNECTED_BY_USER
//!                                  \--server full/taken--> DISCONNECTED_BY_SERVER_ERROR
//! ```
//!
//! Both disconnected states are terminal. The state is published on a
//! `tokio::sync::watch` channel so the input and receive loops observe a
//! transition made by the other one.

use std::fmt;
use std::net::SocketAddr;

use tokio::sync::watch;
use tracing::{debug, warn};

use udpchat_core::{dedup_preserving_order, validate_username};
use udpchat_protocol::{ClientCommand, PacketKind, ProtocolError, ServerCommand, decode_datagram};

use crate::error::ClientResult;

/// Usage lines printed by `help`.
pub const HELP_TEXT: &str = "msg <number_of_users> <username1> <username2> ... <message>\n\
                             list\n\
                             help\n\
                             quit";

/// Diagnostic printed for any input the session cannot use.
pub const INPUT_ERROR_TEXT: &str = "incorrect userinput format";

/// Printed when either side failed to understand a message. Not terminal.
const UNKNOWN_COMMAND_TEXT: &str = "disconnected: server received an unknown command";

/// Confirmation printed after `quit`.
pub const QUIT_TEXT: &str = "quitting";

/// Lifecycle of a client session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Join not sent yet.
    Connecting,
    /// Join sent; user commands accepted.
    Active,
    /// The user quit.
    DisconnectedByUser,
    /// The server refused the join.
    DisconnectedByServerError,
}

impl SessionState {
    /// Returns true for states with no way back to `Active`.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::DisconnectedByUser | Self::DisconnectedByServerError
        )
    }
}

/// Why a line of user input was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    /// First token is not a known command.
    UnknownCommand(String),
    /// `msg` recipient count missing, not a number, or zero.
    BadRecipientCount,
    /// `msg` announced more recipients than it listed.
    MissingRecipients { expected: usize, found: usize },
    /// Command takes no arguments but got some.
    UnexpectedArguments(&'static str),
    /// Session is not accepting commands.
    NotActive(SessionState),
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownCommand(cmd) => write!(f, "unknown command {:?}", cmd),
            Self::BadRecipientCount => write!(f, "recipient count must be a positive integer"),
            Self::MissingRecipients { expected, found } => {
                write!(f, "expected {} recipients, found {}", expected, found)
            }
            Self::UnexpectedArguments(cmd) => write!(f, "{} takes no arguments", cmd),
            Self::NotActive(state) => write!(f, "session is {:?}", state),
        }
    }
}

impl std::error::Error for InputError {}

/// What the input loop should do after a line was handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// Send this command to the server.
    Send(ClientCommand),
    /// Print this text locally.
    Print(String),
    /// Send this command, print [`QUIT_TEXT`], and stop.
    Quit(ClientCommand),
}

/// What the receive loop should do after a datagram was handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// Print this line and keep receiving.
    Render(String),
    /// Print this line and stop; the session is over.
    Disconnect(String),
    /// Nothing to show.
    Ignore,
}

/// Identity and state of one chat client.
#[derive(Debug)]
pub struct ClientSession {
    username: String,
    server_addr: SocketAddr,
    state: watch::Sender<SessionState>,
}

impl ClientSession {
    /// Creates a session in the `Connecting` state.
    pub fn new(username: impl Into<String>, server_addr: SocketAddr) -> ClientResult<Self> {
        let username = username.into();
        validate_username(&username)?;

        let (state, _) = watch::channel(SessionState::Connecting);
        Ok(Self {
            username,
            server_addr,
            state,
        })
    }

    /// Returns the username.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Returns the server address.
    pub fn server_addr(&self) -> SocketAddr {
        self.server_addr
    }

    /// Returns the current state.
    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// Subscribes to state transitions.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// The join request sent once at startup.
    pub fn join_command(&self) -> ClientCommand {
        ClientCommand::Join {
            username: self.username.clone(),
        }
    }

    /// Marks the join as sent. No acknowledgment is awaited.
    pub fn mark_joined(&self) -> bool {
        self.transition(SessionState::Active)
    }

    /// Moves to `next` unless the session already ended.
    fn transition(&self, next: SessionState) -> bool {
        self.state.send_if_modified(|state| {
            if state.is_terminal() || *state == next {
                return false;
            }
            debug!(from = ?*state, to = ?next, "Session state change");
            *state = next;
            true
        })
    }

    /// Interprets one line of user input.
    pub fn handle_input(&self, line: &str) -> Result<Outbound, InputError> {
        let state = self.state();
        if state != SessionState::Active {
            return Err(InputError::NotActive(state));
        }

        let tokens: Vec<&str> = line.split_whitespace().collect();
        match tokens.first().copied() {
            Some("msg") => self.handle_msg_command(&tokens).map(Outbound::Send),
            Some("list") => self.handle_list_command(&tokens).map(Outbound::Send),
            Some("help") => Ok(Outbound::Print(Self::handle_help_command().to_string())),
            Some("quit") => Ok(self.handle_quit_command()),
            Some(other) => Err(InputError::UnknownCommand(other.to_string())),
            None => Err(InputError::UnknownCommand(String::new())),
        }
    }

    /// `msg <n> <name>{n} <text...>`: dedups recipients before sending.
    pub fn handle_msg_command(&self, tokens: &[&str]) -> Result<ClientCommand, InputError> {
        let count = tokens
            .get(1)
            .and_then(|t| t.parse::<usize>().ok())
            .filter(|n| *n > 0)
            .ok_or(InputError::BadRecipientCount)?;

        let names = tokens.get(2..).unwrap_or_default();
        if names.len() < count {
            return Err(InputError::MissingRecipients {
                expected: count,
                found: names.len(),
            });
        }

        let recipients = dedup_preserving_order(&names[..count]);
        let text = names[count..].join(" ");
        Ok(ClientCommand::SendMessage { recipients, text })
    }

    /// `list`: no extra tokens allowed.
    pub fn handle_list_command(&self, tokens: &[&str]) -> Result<ClientCommand, InputError> {
        if tokens.len() > 1 {
            return Err(InputError::UnexpectedArguments("list"));
        }
        Ok(ClientCommand::RequestUsersList)
    }

    /// `help`: purely local.
    pub fn handle_help_command() -> &'static str {
        HELP_TEXT
    }

    /// `quit`: ends the session and returns the disconnect to send.
    pub fn handle_quit_command(&self) -> Outbound {
        self.transition(SessionState::DisconnectedByUser);
        Outbound::Quit(ClientCommand::Disconnect)
    }

    /// Decodes one inbound datagram and decides what to show.
    pub fn handle_datagram(&self, data: &[u8]) -> Inbound {
        let packet = match decode_datagram(data) {
            Ok(packet) => packet,
            Err(e) => {
                warn!(error = %e, "Dropping malformed packet from server");
                return Inbound::Ignore;
            }
        };

        if packet.kind != PacketKind::Data {
            debug!(kind = %packet.kind, "Ignoring non-data packet");
            return Inbound::Ignore;
        }

        match packet
            .message()
            .and_then(|message| ServerCommand::from_message(&message))
        {
            Ok(command) => self.handle_server_command(command),
            Err(e) => self.handle_unrecognized(&e),
        }
    }

    /// Applies a server command to the session.
    pub fn handle_server_command(&self, command: ServerCommand) -> Inbound {
        let line = match &command {
            ServerCommand::ErrServerFull => "disconnected: server full".to_string(),
            ServerCommand::ErrUsernameUnavailable => {
                "disconnected: username not available".to_string()
            }
            ServerCommand::ErrUnknownMessage => UNKNOWN_COMMAND_TEXT.to_string(),
            ServerCommand::ResponseUsersList { usernames } => {
                let mut line = String::from("list:");
                for name in usernames {
                    line.push(' ');
                    line.push_str(name);
                }
                line
            }
            ServerCommand::ForwardedMessage { sender, text } => {
                format!("msg: {}: {}", sender, text)
            }
        };

        if command.is_fatal() {
            self.transition(SessionState::DisconnectedByServerError);
            Inbound::Disconnect(line)
        } else {
            Inbound::Render(line)
        }
    }

    fn handle_unrecognized(&self, e: &ProtocolError) -> Inbound {
        warn!(error = %e, "Unrecognized message from server");
        Inbound::Render(UNKNOWN_COMMAND_TEXT.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn active_session() -> ClientSession {
        let session =
            ClientSession::new("alice", SocketAddr::from(([127, 0, 0, 1], 15000))).unwrap();
        session.mark_joined();
        session
    }

    fn datagram(command: ServerCommand) -> Vec<u8> {
        udpchat_protocol::Packet::data(0, command.to_message())
            .encode()
            .into_bytes()
    }

    #[test]
    fn rejects_invalid_username() {
        let addr = SocketAddr::from(([127, 0, 0, 1], 15000));
        assert!(ClientSession::new("", addr).is_err());
        assert!(ClientSession::new("al ice", addr).is_err());
    }

    #[test]
    fn starts_connecting_then_active() {
        let session =
            ClientSession::new("alice", SocketAddr::from(([127, 0, 0, 1], 15000))).unwrap();
        assert_eq!(session.state(), SessionState::Connecting);
        assert_eq!(
            session.handle_input("list"),
            Err(InputError::NotActive(SessionState::Connecting))
        );

        assert!(session.mark_joined());
        assert_eq!(session.state(), SessionState::Active);
    }

    #[test]
    fn join_command_carries_username() {
        let session = active_session();
        assert_eq!(
            session.join_command(),
            ClientCommand::Join {
                username: "alice".into()
            }
        );
    }

    #[test]
    fn msg_dedups_and_recounts() {
        let session = active_session();
        let outbound = session.handle_input("msg 3 bob bob carol hello  there").unwrap();
        let expected = ClientCommand::SendMessage {
            recipients: vec!["bob".into(), "carol".into()],
            text: "hello there".into(),
        };
        assert_eq!(outbound, Outbound::Send(expected.clone()));
        assert_eq!(expected.to_message().arg_count, 3);
    }

    #[test]
    fn msg_with_bad_count() {
        let session = active_session();
        assert_eq!(
            session.handle_input("msg two bob hi"),
            Err(InputError::BadRecipientCount)
        );
        assert_eq!(session.handle_input("msg"), Err(InputError::BadRecipientCount));
        assert_eq!(
            session.handle_input("msg 0 hi"),
            Err(InputError::BadRecipientCount)
        );
        assert_eq!(session.state(), SessionState::Active);
    }

    #[test]
    fn msg_with_missing_recipients() {
        let session = active_session();
        assert_eq!(
            session.handle_input("msg 3 bob carol"),
            Err(InputError::MissingRecipients {
                expected: 3,
                found: 2
            })
        );
    }

    #[test]
    fn msg_with_empty_text() {
        let session = active_session();
        assert_eq!(
            session.handle_input("msg 1 bob").unwrap(),
            Outbound::Send(ClientCommand::SendMessage {
                recipients: vec!["bob".into()],
                text: String::new(),
            })
        );
    }

    #[test]
    fn list_takes_no_arguments() {
        let session = active_session();
        assert_eq!(
            session.handle_input("list").unwrap(),
            Outbound::Send(ClientCommand::RequestUsersList)
        );
        assert_eq!(
            session.handle_input("list everyone"),
            Err(InputError::UnexpectedArguments("list"))
        );
    }

    #[test]
    fn help_is_local() {
        let session = active_session();
        let Outbound::Print(text) = session.handle_input("help").unwrap() else {
            panic!("help should print locally");
        };
        assert_eq!(text.lines().count(), 4);
        assert!(text.starts_with("msg <number_of_users>"));
    }

    #[test]
    fn unknown_input_is_not_fatal() {
        let session = active_session();
        assert!(matches!(
            session.handle_input("dance"),
            Err(InputError::UnknownCommand(_))
        ));
        assert!(session.handle_input("").is_err());
        assert_eq!(session.state(), SessionState::Active);
    }

    #[test]
    fn quit_is_terminal() {
        let session = active_session();
        let mut rx = session.subscribe();

        assert_eq!(
            session.handle_input("quit").unwrap(),
            Outbound::Quit(ClientCommand::Disconnect)
        );
        assert_eq!(session.state(), SessionState::DisconnectedByUser);
        assert!(rx.has_changed().unwrap());

        assert!(!session.mark_joined());
        assert!(session.handle_input("list").is_err());
    }

    #[test]
    fn renders_users_list() {
        let session = active_session();
        let inbound = session.handle_datagram(&datagram(ServerCommand::ResponseUsersList {
            usernames: vec!["alice".into(), "bob".into()],
        }));
        assert_eq!(inbound, Inbound::Render("list: alice bob".into()));
    }

    #[test]
    fn renders_forwarded_message() {
        let session = active_session();
        let inbound = session.handle_datagram(&datagram(ServerCommand::ForwardedMessage {
            sender: "bob".into(),
            text: "hello there".into(),
        }));
        assert_eq!(inbound, Inbound::Render("msg: bob: hello there".into()));
    }

    #[test]
    fn server_full_is_fatal() {
        let session = active_session();
        let inbound = session.handle_datagram(&datagram(ServerCommand::ErrServerFull));
        assert_eq!(
            inbound,
            Inbound::Disconnect("disconnected: server full".into())
        );
        assert_eq!(session.state(), SessionState::DisconnectedByServerError);
    }

    #[test]
    fn username_unavailable_is_fatal() {
        let session = active_session();
        let inbound = session.handle_datagram(&datagram(ServerCommand::ErrUsernameUnavailable));
        assert_eq!(
            inbound,
            Inbound::Disconnect("disconnected: username not available".into())
        );
        assert!(session.state().is_terminal());
    }

    #[test]
    fn unknown_message_reply_is_informational() {
        let session = active_session();
        let inbound = session.handle_datagram(&datagram(ServerCommand::ErrUnknownMessage));
        assert!(matches!(inbound, Inbound::Render(_)));
        assert_eq!(session.state(), SessionState::Active);
    }

    #[test]
    fn unrecognized_server_command_is_informational() {
        let session = active_session();
        let inbound = session.handle_datagram(b"data 0 self_destruct 0 ");
        assert_eq!(
            inbound,
            Inbound::Render("disconnected: server received an unknown command".into())
        );
        assert_eq!(session.state(), SessionState::Active);
    }

    #[test]
    fn malformed_packet_ignored() {
        let session = active_session();
        assert_eq!(session.handle_datagram(b"garbage"), Inbound::Ignore);
        assert_eq!(
            session.handle_datagram(b"ack 1 forwarded_message 1 bob hi"),
            Inbound::Ignore
        );
    }

    #[test]
    fn oversized_users_list_count_is_informational() {
        let session = active_session();
        let inbound = session.handle_datagram(
            b"data 0 response_users_list 18446744073709551615 18446744073709551614 bob",
        );
        assert_eq!(
            inbound,
            Inbound::Render("disconnected: server received an unknown command".into())
        );
        assert_eq!(session.state(), SessionState::Active);
    }
}

//! Command registry for both directions of the chat protocol.
//!
//! Each command has a fixed body shape. `arg_count` on the wire counts the
//! structured tokens at the front of the body; anything after them is free
//! text.
//!
//! | command                    | arg_count | body                          |
//! |----------------------------|-----------|-------------------------------|
//! | `join`                     | 1         | `<username>`                  |
//! | `request_users_list`       | 0         |                               |
//! | `send_message`             | 1 + n     | `<n> <name>{n} <text...>`     |
//! | `disconnect`               | 0         |                               |
//! | `err_server_full`          | 0         |                               |
//! | `err_username_unavailable` | 0         |                               |
//! | `err_unknown_message`      | 0         |                               |
//! | `response_users_list`      | 1 + n     | `<n> <name>{n}`               |
//! | `forwarded_message`        | 1         | `<sender> <text...>`          |

use crate::error::{ProtocolError, ProtocolResult};
use crate::framing::{Message, next_field};

/// Commands a client sends to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCommand {
    /// Register `username` for the sending address.
    Join {
        /// Requested username.
        username: String,
    },

    /// Ask for the sorted list of connected usernames.
    RequestUsersList,

    /// Deliver `text` to each listed recipient.
    SendMessage {
        /// Recipient usernames as sent; may contain repeats.
        recipients: Vec<String>,
        /// Free text, verbatim.
        text: String,
    },

    /// Leave the chat.
    Disconnect,
}

impl ClientCommand {
    /// Returns the wire name of this command.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Join { .. } => "join",
            Self::RequestUsersList => "request_users_list",
            Self::SendMessage { .. } => "send_message",
            Self::Disconnect => "disconnect",
        }
    }

    /// Builds the message frame for this command.
    pub fn to_message(&self) -> Message {
        match self {
            Self::Join { username } => Message::new(self.name(), 1, username.as_str()),
            Self::RequestUsersList | Self::Disconnect => Message::new(self.name(), 0, ""),
            Self::SendMessage { recipients, text } => Message::new(
                self.name(),
                recipients.len() + 1,
                counted_list_body(recipients, Some(text)),
            ),
        }
    }

    /// Interprets a decoded message as a client command.
    pub fn from_message(message: &Message) -> ProtocolResult<Self> {
        match message.command.as_str() {
            "join" => {
                expect_arity(message, 1)?;
                let mut tokens = message.tokens();
                match (tokens.next(), tokens.next()) {
                    (Some(username), None) => Ok(Self::Join {
                        username: username.to_string(),
                    }),
                    _ => Err(ProtocolError::malformed_message(
                        "join carries exactly one username",
                    )),
                }
            }
            "request_users_list" => {
                expect_arity(message, 0)?;
                Ok(Self::RequestUsersList)
            }
            "send_message" => {
                let (recipients, text) = parse_counted_list(message)?;
                Ok(Self::SendMessage {
                    recipients,
                    text: text.to_string(),
                })
            }
            "disconnect" => {
                expect_arity(message, 0)?;
                Ok(Self::Disconnect)
            }
            other => Err(ProtocolError::UnknownCommand(other.to_string())),
        }
    }
}

/// Commands the server sends to a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerCommand {
    /// Join refused: the registry is at capacity.
    ErrServerFull,

    /// Join refused: the username is already registered.
    ErrUsernameUnavailable,

    /// The server could not interpret the client's last message.
    ErrUnknownMessage,

    /// Sorted list of connected usernames.
    ResponseUsersList {
        /// Usernames in lexicographic order.
        usernames: Vec<String>,
    },

    /// A chat message relayed from another user.
    ForwardedMessage {
        /// Username of the author.
        sender: String,
        /// Free text, verbatim.
        text: String,
    },
}

impl ServerCommand {
    /// Returns the wire name of this command.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ErrServerFull => "err_server_full",
            Self::ErrUsernameUnavailable => "err_username_unavailable",
            Self::ErrUnknownMessage => "err_unknown_message",
            Self::ResponseUsersList { .. } => "response_users_list",
            Self::ForwardedMessage { .. } => "forwarded_message",
        }
    }

    /// Returns true for replies after which the client must disconnect.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::ErrServerFull | Self::ErrUsernameUnavailable)
    }

    /// Builds the message frame for this command.
    pub fn to_message(&self) -> Message {
        match self {
            Self::ErrServerFull | Self::ErrUsernameUnavailable | Self::ErrUnknownMessage => {
                Message::new(self.name(), 0, "")
            }
            Self::ResponseUsersList { usernames } => Message::new(
                self.name(),
                usernames.len() + 1,
                counted_list_body(usernames, None),
            ),
            Self::ForwardedMessage { sender, text } => {
                Message::new(self.name(), 1, format!("{sender} {text}"))
            }
        }
    }

    /// Interprets a decoded message as a server command.
    pub fn from_message(message: &Message) -> ProtocolResult<Self> {
        match message.command.as_str() {
            "err_server_full" => {
                expect_arity(message, 0)?;
                Ok(Self::ErrServerFull)
            }
            "err_username_unavailable" => {
                expect_arity(message, 0)?;
                Ok(Self::ErrUsernameUnavailable)
            }
            "err_unknown_message" => {
                expect_arity(message, 0)?;
                Ok(Self::ErrUnknownMessage)
            }
            "response_users_list" => {
                let (usernames, rest) = parse_counted_list(message)?;
                if !rest.trim().is_empty() {
                    return Err(ProtocolError::malformed_message(
                        "response_users_list has trailing tokens",
                    ));
                }
                Ok(Self::ResponseUsersList { usernames })
            }
            "forwarded_message" => {
                expect_arity(message, 1)?;
                let (sender, text) = next_field(&message.body).ok_or_else(|| {
                    ProtocolError::malformed_message("forwarded_message without sender")
                })?;
                Ok(Self::ForwardedMessage {
                    sender: sender.to_string(),
                    text: text.to_string(),
                })
            }
            other => Err(ProtocolError::UnknownCommand(other.to_string())),
        }
    }
}

fn expect_arity(message: &Message, expected: usize) -> ProtocolResult<()> {
    if message.arg_count != expected {
        return Err(ProtocolError::malformed_message(format!(
            "{} declares {} arguments, expected {}",
            message.command, message.arg_count, expected
        )));
    }
    Ok(())
}

/// Renders `"<n> <name_1> ... <name_n>[ <text>]"`.
fn counted_list_body(names: &[String], text: Option<&str>) -> String {
    let mut body = names.len().to_string();
    for name in names {
        body.push(' ');
        body.push_str(name);
    }
    if let Some(text) = text {
        body.push(' ');
        body.push_str(text);
    }
    body
}

/// Parses `"<n> <name_1> ... <name_n> <rest>"` and checks `arg_count == n + 1`.
fn parse_counted_list(message: &Message) -> ProtocolResult<(Vec<String>, &str)> {
    let (count, mut rest) = next_field(&message.body).ok_or_else(|| {
        ProtocolError::malformed_message(format!("{} without a name count", message.command))
    })?;
    let count = count.parse::<usize>().map_err(|_| {
        ProtocolError::malformed_message(format!("invalid name count: {count:?}"))
    })?;

    if count.checked_add(1) != Some(message.arg_count) {
        return Err(ProtocolError::malformed_message(format!(
            "{} declares {} arguments but lists {} names",
            message.command, message.arg_count, count
        )));
    }

    let available = rest.split_whitespace().count();
    if count > available {
        return Err(ProtocolError::malformed_message(format!(
            "{} lists {} names but carries {}",
            message.command, count, available
        )));
    }

    let mut names = Vec::with_capacity(count);
    for _ in 0..count {
        let (name, tail) = next_field(rest).ok_or_else(|| {
            ProtocolError::malformed_message(format!(
                "{} lists {} names but carries {}",
                message.command,
                count,
                names.len()
            ))
        })?;
        names.push(name.to_string());
        rest = tail;
    }

    Ok((names, rest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framing::decode_message;

    fn client(raw: &str) -> ProtocolResult<ClientCommand> {
        ClientCommand::from_message(&decode_message(raw).unwrap())
    }

    fn server(raw: &str) -> ProtocolResult<ServerCommand> {
        ServerCommand::from_message(&decode_message(raw).unwrap())
    }

    #[test]
    fn client_command_wire_text() {
        let join = ClientCommand::Join {
            username: "alice".into(),
        };
        insta::assert_snapshot!(join.to_message().encode(), @"join 1 alice");

        let send = ClientCommand::SendMessage {
            recipients: vec!["bob".into(), "carol".into()],
            text: "hello there".into(),
        };
        insta::assert_snapshot!(send.to_message().encode(), @"send_message 3 2 bob carol hello there");
    }

    #[test]
    fn server_command_wire_text() {
        let list = ServerCommand::ResponseUsersList {
            usernames: vec!["alice".into(), "bob".into()],
        };
        insta::assert_snapshot!(list.to_message().encode(), @"response_users_list 3 2 alice bob");

        let forward = ServerCommand::ForwardedMessage {
            sender: "alice".into(),
            text: "hello there".into(),
        };
        insta::assert_snapshot!(forward.to_message().encode(), @"forwarded_message 1 alice hello there");
    }

    #[test]
    fn client_commands_roundtrip() {
        let commands = vec![
            ClientCommand::Join {
                username: "alice".into(),
            },
            ClientCommand::RequestUsersList,
            ClientCommand::SendMessage {
                recipients: vec!["bob".into(), "bob".into()],
                text: "hi  there".into(),
            },
            ClientCommand::SendMessage {
                recipients: vec!["bob".into()],
                text: String::new(),
            },
            ClientCommand::Disconnect,
        ];
        for command in commands {
            let decoded = ClientCommand::from_message(&command.to_message()).unwrap();
            assert_eq!(decoded, command);
        }
    }

    #[test]
    fn server_commands_roundtrip() {
        let commands = vec![
            ServerCommand::ErrServerFull,
            ServerCommand::ErrUsernameUnavailable,
            ServerCommand::ErrUnknownMessage,
            ServerCommand::ResponseUsersList { usernames: vec![] },
            ServerCommand::ResponseUsersList {
                usernames: vec!["alice".into(), "bob".into(), "carol".into()],
            },
            ServerCommand::ForwardedMessage {
                sender: "alice".into(),
                text: "hello there".into(),
            },
        ];
        for command in commands {
            let decoded = ServerCommand::from_message(&command.to_message()).unwrap();
            assert_eq!(decoded, command);
        }
    }

    #[test]
    fn unknown_commands() {
        assert!(matches!(
            client("shout 0 "),
            Err(ProtocolError::UnknownCommand(name)) if name == "shout"
        ));
        assert!(matches!(
            server("join 1 alice"),
            Err(ProtocolError::UnknownCommand(_))
        ));
    }

    #[test]
    fn join_requires_exactly_one_name() {
        assert!(matches!(
            client("join 1 "),
            Err(ProtocolError::MalformedMessage { .. })
        ));
        assert!(matches!(
            client("join 1 alice bob"),
            Err(ProtocolError::MalformedMessage { .. })
        ));
        assert!(matches!(
            client("join 2 alice"),
            Err(ProtocolError::MalformedMessage { .. })
        ));
    }

    #[test]
    fn send_message_count_must_match_arity() {
        assert!(matches!(
            client("send_message 4 2 bob carol hi"),
            Err(ProtocolError::MalformedMessage { .. })
        ));
    }

    #[test]
    fn send_message_with_too_few_names() {
        assert!(matches!(
            client("send_message 4 3 bob carol"),
            Err(ProtocolError::MalformedMessage { .. })
        ));
    }

    #[test]
    fn send_message_with_bad_count() {
        assert!(matches!(
            client("send_message 3 two bob carol hi"),
            Err(ProtocolError::MalformedMessage { .. })
        ));
    }

    #[test]
    fn send_message_splits_names_from_text() {
        let command = client("send_message 3 2 bob bob hello there").unwrap();
        assert_eq!(
            command,
            ClientCommand::SendMessage {
                recipients: vec!["bob".into(), "bob".into()],
                text: "hello there".into(),
            }
        );
    }

    #[test]
    fn response_users_list_rejects_trailing_tokens() {
        assert!(matches!(
            server("response_users_list 2 1 alice bob"),
            Err(ProtocolError::MalformedMessage { .. })
        ));
    }

    #[test]
    fn fatal_replies() {
        assert!(ServerCommand::ErrServerFull.is_fatal());
        assert!(ServerCommand::ErrUsernameUnavailable.is_fatal());
        assert!(!ServerCommand::ErrUnknownMessage.is_fatal());
    }

    #[test]
    fn send_message_count_overflow_is_malformed() {
        assert!(matches!(
            client("send_message 0 18446744073709551615 bob hi"),
            Err(ProtocolError::MalformedMessage { .. })
        ));
    }

    #[test]
    fn send_message_huge_count_is_malformed() {
        assert!(matches!(
            client("send_message 1000000000001 1000000000000 bob hi"),
            Err(ProtocolError::MalformedMessage { .. })
        ));
    }

    #[test]
    fn response_users_list_huge_count_is_malformed() {
        assert!(matches!(
            server("response_users_list 1000000000001 1000000000000 alice"),
            Err(ProtocolError::MalformedMessage { .. })
        ));
    }
}

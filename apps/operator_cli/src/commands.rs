//! Operator input parsing: slash commands and plain chat lines.

use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperatorCommand {
    Connect,
    Disconnect,
    Upload(Option<PathBuf>),
    Status,
    NewChat,
    Help,
    Quit,
    Chat(String),
    Unknown(String),
}

impl OperatorCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Connect => "connect",
            Self::Disconnect => "disconnect",
            Self::Upload(_) => "upload",
            Self::Status => "status",
            Self::NewChat => "new",
            Self::Help => "help",
            Self::Quit => "quit",
            Self::Chat(_) => "chat",
            Self::Unknown(_) => "unknown",
        }
    }
}

pub const HELP: &str = "\
Commands:
  /connect          connect to a store (prompts for credentials)
  /disconnect       drop the store connection
  /upload <path>    upload a .csv, .jpg, .jpeg or .png file
  /status           show connection status
  /new              start a new chat (not available)
  /help             show this help
  /quit             exit
Anything else is sent to the assistant.";

pub fn parse_line(line: &str) -> OperatorCommand {
    let Some(rest) = line.trim_start().strip_prefix('/') else {
        return OperatorCommand::Chat(line.to_string());
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest.trim_end(), ""),
    };

    match name.to_ascii_lowercase().as_str() {
        "connect" => OperatorCommand::Connect,
        "disconnect" => OperatorCommand::Disconnect,
        "upload" => OperatorCommand::Upload((!arg.is_empty()).then(|| PathBuf::from(arg))),
        "status" => OperatorCommand::Status,
        "new" => OperatorCommand::NewChat,
        "help" | "?" => OperatorCommand::Help,
        "quit" | "exit" => OperatorCommand::Quit,
        other => OperatorCommand::Unknown(other.to_string()),
    }
}

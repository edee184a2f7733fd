//! Line-based keyboard input.
//!
//! Every line the user enters becomes one [`Command`]. Plain text is typed
//! into the address input; an empty line submits the vend, the same way
//! pressing Enter in the form does. Lines starting with `:` are terminal
//! commands.

use std::io::BufRead;
use tokio::sync::mpsc;

pub const HELP: &str = "\
Type a channel address to see its price, press Enter to vend.
Lines typed one after another are joined; after any command the next
line starts a new address.
  :vend    submit the vend for the current address
  :clear   clear the address
  :status  fetch the machine status over HTTP
  :help    show this help
  :quit    exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Text typed into the address input.
    Type(String),
    Vend,
    Clear,
    Status,
    Help,
    Quit,
    Unknown(String),
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() {
            return Command::Vend;
        }
        match line.trim().strip_prefix(':') {
            Some("vend") => Command::Vend,
            Some("clear") => Command::Clear,
            Some("status") => Command::Status,
            Some("help" | "h" | "?") => Command::Help,
            Some("quit" | "q") => Command::Quit,
            Some(other) => Command::Unknown(other.to_owned()),
            None => Command::Type(line.trim().to_owned()),
        }
    }
}

/// Read stdin on a dedicated thread and forward parsed commands.
///
/// Blocking reads would otherwise pin a runtime worker and stall runtime
/// shutdown. The channel closes at end of input.
pub fn spawn_stdin_reader() -> mpsc::Receiver<Command> {
    let (tx, rx) = mpsc::channel(16);
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    tracing::error!("Failed to read input: {}", e);
                    break;
                }
            };
            if tx.blocking_send(Command::parse(&line)).is_err() {
                break;
            }
        }
        tracing::debug!("Input reader finished");
    });
    rx
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        let cases = [
            ("", Command::Vend),
            ("   ", Command::Vend),
            (":vend", Command::Vend),
            (":clear", Command::Clear),
            (":status", Command::Status),
            (":help", Command::Help),
            (":q", Command::Quit),
            (":quit\r\n", Command::Quit),
            (":dance", Command::Unknown("dance".into())),
            ("A1", Command::Type("A1".into())),
            (" 12 ", Command::Type("12".into())),
        ];
        for (line, expected) in cases {
            assert_eq!(Command::parse(line), expected, "{line:?}");
        }
    }
}

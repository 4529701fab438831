//! Line protocol of the simulator.
//!
//! ```text
//! key 1234#                      type on the keypad
//! card 04:A1:B2:C3               hold a card in the field
//! remove                         take the card away
//! door open | door close         move the door
//! cmd credential {"action":...}  queue a remote command
//! status                         print the lock state
//! quit
//! ```

use anyhow::{Context, anyhow, bail};
use latchkey_engine::{Command, CommandKind};

/// Source tag of commands typed at the prompt.
pub const STDIN_SOURCE: &str = "stdin";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimInput {
    Keys(String),
    Card(Vec<u8>),
    RemoveCard,
    Door { open: bool },
    Remote(Command),
    Status,
    Help,
    Quit,
}

/// Parse one input line. Blank lines and `//` comments yield `None`.
pub fn parse_line(line: &str) -> anyhow::Result<Option<SimInput>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with("//") {
        return Ok(None);
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let input = match word {
        "key" | "keys" => {
            if rest.is_empty() {
                bail!("usage: key <digits, * or #>");
            }
            SimInput::Keys(rest.split_whitespace().collect())
        }
        "card" => SimInput::Card(parse_uid(rest)?),
        "remove" => SimInput::RemoveCard,
        "door" => match rest {
            "open" => SimInput::Door { open: true },
            "close" | "closed" => SimInput::Door { open: false },
            _ => bail!("usage: door open|close"),
        },
        "cmd" => {
            let (kind, payload) = rest.split_once(char::is_whitespace).unwrap_or((rest, "{}"));
            let kind: CommandKind = kind.parse().map_err(|e: String| anyhow!(e))?;
            SimInput::Remote(Command::new(kind, STDIN_SOURCE, payload.trim()))
        }
        "unlock" | "lock" => SimInput::Remote(Command::new(
            CommandKind::Control,
            STDIN_SOURCE,
            format!(r#"{{"action":"{}"}}"#, word),
        )),
        "status" => SimInput::Status,
        "help" | "?" => SimInput::Help,
        "quit" | "exit" => SimInput::Quit,
        other => bail!("unknown input '{}', try 'help'", other),
    };
    Ok(Some(input))
}

/// Card UID bytes from hex, with or without `:` separators.
fn parse_uid(text: &str) -> anyhow::Result<Vec<u8>> {
    let hex: String = text.chars().filter(|c| *c != ':' && !c.is_whitespace()).collect();
    if hex.is_empty() || hex.len() % 2 != 0 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        bail!("card UID must be an even number of hex digits");
    }
    (0..hex.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .with_context(|| format!("invalid hex byte '{}'", &hex[i..i + 2]))
        })
        .collect()
}

pub const HELP: &str = "\
key <keys>             press keypad keys, e.g. 'key 1234#'
card <hex uid>         present a card, e.g. 'card 04:A1:B2:C3'
remove                 remove the card from the field
door open|close        move the door
cmd <kind> <json>      queue a command (credential, card, control,
                       apply_network_config, sync_credentials, sync_cards)
unlock | lock          remote unlock or lock
status                 show the lock state
quit                   flush and exit";

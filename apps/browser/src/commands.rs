//! Interactive commands typed at the tutorials prompt.

use anyhow::{anyhow, Result};
use catalog::{FilterAction, FilterField};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowserCommand {
    Filter(FilterAction),
    List,
    Options,
    Help,
    Quit,
}

pub const HELP: &str = "\
commands:
  search <text>            set the search term (empty clears it)
  toggle <field> <value>   toggle a topic, difficulty or length filter
  clear                    reset every filter
  list                     show matching tutorials
  options                  show available filter values
  quit                     leave";

pub fn parse_command(line: &str) -> Result<BrowserCommand> {
    let line = line.trim();
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    match verb.to_ascii_lowercase().as_str() {
        "search" | "s" => Ok(BrowserCommand::Filter(FilterAction::SetSearchTerm(
            rest.to_string(),
        ))),
        "toggle" | "t" => {
            let (field, value) = rest
                .split_once(char::is_whitespace)
                .ok_or_else(|| anyhow!("usage: toggle <field> <value>"))?;
            Ok(BrowserCommand::Filter(FilterAction::Toggle {
                field: field.parse::<FilterField>()?,
                value: value.trim().to_string(),
            }))
        }
        "clear" => Ok(BrowserCommand::Filter(FilterAction::Clear)),
        "list" | "ls" | "" => Ok(BrowserCommand::List),
        "options" => Ok(BrowserCommand::Options),
        "help" | "?" => Ok(BrowserCommand::Help),
        "quit" | "exit" | "q" => Ok(BrowserCommand::Quit),
        other => Err(anyhow!("unknown command '{other}', type 'help'")),
    }
}

//! Parsing of terminal input lines.

/// Which saved chat a command refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// 1-based position in the last `/list` output.
    Index(usize),
    /// A record id.
    Id(String),
}

impl Target {
    fn parse(arg: &str) -> Self {
        match arg.parse::<usize>() {
            Ok(index) if index > 0 => Self::Index(index),
            _ => Self::Id(arg.to_string()),
        }
    }

    /// Resolve against the ids of the last listing.
    pub fn resolve<'a>(&'a self, listing: &'a [String]) -> Option<&'a str> {
        match self {
            Self::Index(index) => index
                .checked_sub(1)
                .and_then(|i| listing.get(i))
                .map(String::as_str),
            Self::Id(id) => Some(id.as_str()),
        }
    }
}

/// One line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Plain text: send it.
    Send(String),
    /// `/new`
    New,
    /// `/list`
    List,
    /// `/open <n|id>`
    Open(Target),
    /// `/rename <n|id> <title>`
    Rename(Target, String),
    /// `/delete <n|id>`
    Delete(Target),
    /// `/clear`
    Clear,
    /// `/attach <path>`: attach a file to the next message.
    Attach(String),
    /// `/help`
    Help,
    /// `/quit` or `/exit`
    Quit,
}

/// A command line that could not be understood.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    /// Unknown slash command.
    #[error("unknown command /{0}, try /help")]
    Unknown(String),
    /// A required argument is missing.
    #[error("usage: {0}")]
    Usage(&'static str),
}

/// Usage text for `/help`.
pub const HELP: &str = "\
/new                 start a new chat
/list                list saved chats
/open <n|id>         continue a saved chat
/rename <n|id> <t>   rename a saved chat
/delete <n|id>       delete a saved chat
/clear               delete all saved chats
/attach <path>       attach a file to the next message
/quit                exit
Ctrl-C cancels a reply in progress.";

/// Parse one input line.
pub fn parse(line: &str) -> Result<Command, CommandError> {
    let line = line.trim();
    let Some(rest) = line.strip_prefix('/') else {
        return Ok(Command::Send(line.to_string()));
    };
    let (name, args) = match rest.split_once(char::is_whitespace) {
        Some((name, args)) => (name, args.trim()),
        None => (rest, ""),
    };
    match name {
        "new" => Ok(Command::New),
        "list" | "ls" => Ok(Command::List),
        "open" => required(args, "/open <n|id>").map(|a| Command::Open(Target::parse(a))),
        "delete" | "rm" => {
            required(args, "/delete <n|id>").map(|a| Command::Delete(Target::parse(a)))
        }
        "rename" => {
            let usage = "/rename <n|id> <title>";
            let (target, title) = required(args, usage)?
                .split_once(char::is_whitespace)
                .ok_or(CommandError::Usage(usage))?;
            let title = title.trim();
            if title.is_empty() {
                return Err(CommandError::Usage(usage));
            }
            Ok(Command::Rename(Target::parse(target), title.to_string()))
        }
        "clear" => Ok(Command::Clear),
        "attach" => required(args, "/attach <path>").map(|a| Command::Attach(a.to_string())),
        "help" | "?" => Ok(Command::Help),
        "quit" | "exit" | "q" => Ok(Command::Quit),
        other => Err(CommandError::Unknown(other.to_string())),
    }
}

fn required<'a>(args: &'a str, usage: &'static str) -> Result<&'a str, CommandError> {
    if args.is_empty() {
        Err(CommandError::Usage(usage))
    } else {
        Ok(args)
    }
}

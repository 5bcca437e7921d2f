//! Slash-command parsing.

/// Commands offered for completion, in help order.
pub const COMMANDS: &[&str] = &[
    "/login",
    "/admin",
    "/active",
    "/model",
    "/temperature",
    "/topk",
    "/topp",
    "/instruction",
    "/history",
    "/edit",
    "/delete",
    "/clear",
    "/help",
];

pub const HELP: &str = "\
Chat:
  <message>              Send a message
  /history               Show the conversation with turn numbers
  /login [code]          Unlock administrator mode
  /help                  Show this help
  quit | exit            Leave

Administrator:
  /admin                 Show the settings panel
  /active on|off         Leave or enter maintenance mode
  /model <name|number>   Select the model
  /temperature <0-2>     Set the sampling temperature
  /topk <n>              Set top-k
  /topp <0-1>            Set top-p
  /instruction <text>    Replace the system instruction
  /edit <n> <text>       Rewrite turn n
  /delete <n>            Delete turn n
  /clear                 Delete the whole conversation";

/// A parsed REPL command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Quit,
    Help,
    Login(Option<String>),
    Admin,
    Active(bool),
    Model(String),
    Temperature(f64),
    TopK(u32),
    TopP(f64),
    Instruction(String),
    History,
    /// `index` is 1-based, as shown by `/history`.
    Edit { index: usize, text: String },
    Delete(usize),
    Clear,
    /// Unknown command or bad arguments; carries the message to show.
    Invalid(String),
}

impl Command {
    /// Parses `line`, or returns `None` if it is a chat message.
    pub fn parse(line: &str) -> Option<Command> {
        // The code is compared byte for byte, so it is taken before any trimming
        if let Some((_, code)) = login_argument(line) {
            return Some(Command::Login((!code.is_empty()).then(|| code.to_string())));
        }

        let line = line.trim();
        if line == "quit" || line == "exit" {
            return Some(Command::Quit);
        }
        if !line.starts_with('/') {
            return None;
        }

        let (name, rest) = match line.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (line, ""),
        };

        let command = match name {
            "/help" => Command::Help,
            "/admin" => Command::Admin,
            "/history" => Command::History,
            "/clear" => Command::Clear,
            "/active" => match rest {
                "on" => Command::Active(true),
                "off" => Command::Active(false),
                _ => usage("/active on|off"),
            },
            "/model" if !rest.is_empty() => Command::Model(rest.to_string()),
            "/model" => usage("/model <name|number>"),
            "/temperature" => rest
                .parse()
                .map(Command::Temperature)
                .unwrap_or_else(|_| usage("/temperature <0-2>")),
            "/topk" => rest
                .parse()
                .map(Command::TopK)
                .unwrap_or_else(|_| usage("/topk <n>")),
            "/topp" => rest
                .parse()
                .map(Command::TopP)
                .unwrap_or_else(|_| usage("/topp <0-1>")),
            "/instruction" => Command::Instruction(rest.to_string()),
            "/edit" => parse_edit(rest).unwrap_or_else(|| usage("/edit <n> <text>")),
            "/delete" => parse_index(rest)
                .map(Command::Delete)
                .unwrap_or_else(|| usage("/delete <n>")),
            other => Command::Invalid(format!("Unknown command: {other}. Type /help.")),
        };
        Some(command)
    }

    /// Whether the line may contain a secret and must stay out of history.
    pub fn is_sensitive(&self) -> bool {
        matches!(self, Command::Login(Some(_)))
    }
}

/// Splits a `/login` line into the command part and the raw code.
///
/// The code is everything after the first whitespace character following
/// `/login`, untouched: `"/login  x "` gives `" x "`.
pub fn login_argument(line: &str) -> Option<(&str, &str)> {
    let rest = line.trim_start().strip_prefix("/login")?;
    match rest.chars().next() {
        None => Some((line, "")),
        Some(separator) if separator.is_whitespace() => {
            Some(line.split_at(line.len() - rest.len() + separator.len_utf8()))
        }
        Some(_) => None,
    }
}

fn usage(text: &str) -> Command {
    Command::Invalid(format!("Usage: {text}"))
}

fn parse_index(text: &str) -> Option<usize> {
    text.parse::<usize>().ok().filter(|index| *index > 0)
}

fn parse_edit(rest: &str) -> Option<Command> {
    let (index, text) = rest.split_once(char::is_whitespace)?;
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    Some(Command::Edit {
        index: parse_index(index)?,
        text: text.to_string(),
    })
}

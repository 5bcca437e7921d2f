//! NEUROBOT terminal chat.

use std::io::Write;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use rustyline::Editor;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use tokio::sync::mpsc::UnboundedReceiver;

use neurobot_application::{ChatEvent, ChatSession, SubmitOutcome};
use neurobot_core::{GenerationConfig, ModelName, NeurobotError, Sender, Turn};
use neurobot_infrastructure::NeurobotPaths;

mod bootstrap;
mod command;
mod helper;
mod logging;
mod render;

use bootstrap::{AppBootstrap, BootstrapOptions};
use command::{Command, HELP};
use helper::CliHelper;
use render::{Output, StreamRenderer};

type Repl = Editor<CliHelper, DefaultHistory>;

const MAINTENANCE_NOTICE: &str =
    "NEUROBOT is under maintenance. Please come back later.";

#[derive(Parser, Debug)]
#[command(name = "neurobot")]
#[command(about = "NEUROBOT - streaming chat with Gemini in the terminal", long_about = None)]
struct Cli {
    /// Settings file (default: <config dir>/neurobot/settings.toml)
    #[arg(long, value_name = "PATH")]
    settings: Option<PathBuf>,

    /// File holding the persisted generation config
    #[arg(long, value_name = "PATH")]
    storage: Option<PathBuf>,

    /// Switch to this model at startup (persisted)
    #[arg(long, value_name = "NAME")]
    model: Option<ModelName>,
}

/// Entry point of the NEUROBOT REPL.
///
/// Plain lines are sent to the model and the reply is printed as it
/// streams in; lines starting with `/` are commands (see `/help`).
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let paths = NeurobotPaths::new(None);
    let _log_guard = logging::init(paths.logs_dir().ok().as_deref());

    let options = BootstrapOptions {
        settings: cli.settings,
        storage: cli.storage,
        model: cli.model,
    };
    let AppBootstrap { chat, mut events } = AppBootstrap::build(&options, &paths)?;

    let mut rl: Repl = Editor::new()?;
    rl.set_helper(Some(CliHelper::new()));

    println!("{}", "=== NEUROBOT ===".bright_magenta().bold());
    println!("{}", "Type a message, '/help' for commands, or 'quit' to exit.".bright_black());
    println!();
    for turn in chat.turns() {
        print_turn(&turn);
    }

    let mut renderer = StreamRenderer::new();

    loop {
        let admin = chat.clearance().is_admin();
        if admin && !chat.config().is_system_active {
            println!(
                "{}",
                "[MAINTENANCE MODE] Only administrators can chat right now.".on_red().white().bold()
            );
        }
        let prompt = if admin { "admin>> " } else { ">> " };

        match rl.readline(prompt) {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }

                match Command::parse(&line) {
                    Some(Command::Quit) => {
                        println!("{}", "Goodbye!".bright_green());
                        break;
                    }
                    Some(command) => {
                        if !command.is_sensitive() {
                            let _ = rl.add_history_entry(line.as_str());
                        }
                        execute(command, &chat, &mut rl);
                    }
                    None => {
                        let _ = rl.add_history_entry(line.as_str());
                        send_message(&chat, &line, &mut events, &mut renderer).await;
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type 'quit' to exit.".yellow());
            }
            Err(ReadlineError::Eof) => {
                println!("{}", "CTRL-D detected. Exiting...".bright_green());
                break;
            }
            Err(err) => {
                eprintln!("{}", format!("Error: {:?}", err).red());
                break;
            }
        }
    }

    Ok(())
}

/// Submits `text` and renders the reply while it streams.
async fn send_message(
    chat: &ChatSession,
    text: &str,
    events: &mut UnboundedReceiver<ChatEvent>,
    renderer: &mut StreamRenderer,
) {
    // Events left over from commands are already reflected on screen
    while events.try_recv().is_ok() {}

    let submit = chat.submit(text);
    tokio::pin!(submit);

    let outcome = loop {
        tokio::select! {
            outcome = &mut submit => break outcome,
            Some(event) = events.recv() => print_output(renderer.apply(&event)),
        }
    };
    while let Ok(event) = events.try_recv() {
        print_output(renderer.apply(&event));
    }

    match outcome {
        Ok(SubmitOutcome::Unavailable) => println!("{}", MAINTENANCE_NOTICE.yellow().bold()),
        Ok(_) => {}
        Err(e) => eprintln!("{}", format!("Error: {}", e).red()),
    }
}

fn print_output(output: Option<Output>) {
    let Some(output) = output else {
        return;
    };
    match output {
        Output::ReplyStart => print!("{} ", "NEUROBOT:".bright_blue().bold()),
        Output::Delta(text) => print!("{}", text.bright_blue()),
        Output::Rewrite(text) => print!("\n{} {}", "NEUROBOT:".bright_blue().bold(), text.bright_blue()),
        Output::Error(text) => print!("\n{}", text.red()),
        Output::Removed => print!(" {}", "(message deleted)".bright_black()),
        Output::ReplyEnd => println!(),
    }
    let _ = std::io::stdout().flush();
}

fn print_turn(turn: &Turn) {
    match turn.sender {
        Sender::User => println!("{}", format!("> {}", turn.text).green()),
        Sender::Model => {
            println!("{} {}", "NEUROBOT:".bright_blue().bold(), turn.text.bright_blue())
        }
    }
}

fn execute(command: Command, chat: &ChatSession, rl: &mut Repl) {
    match command {
        Command::Quit => {}
        Command::Help => println!("{}", HELP.bright_black()),
        Command::Invalid(message) => println!("{}", message.yellow()),
        Command::History => print_history(chat),
        Command::Login(code) => login(chat, code, rl),
        Command::Admin => {
            if chat.clearance().is_admin() {
                print_panel(&chat.config());
            } else {
                report_error(&NeurobotError::access_denied("'admin panel' requires administrator mode"));
            }
        }
        Command::Active(active) => {
            if let Some(config) = report(chat.set_system_active(active)) {
                let state = if config.is_system_active { "ACTIVE" } else { "MAINTENANCE" };
                println!("{}", format!("System is now {state}.").green());
            }
        }
        Command::Model(name) => match resolve_model(&name) {
            Some(model) => {
                if report(chat.update_config(chat.config().with_model(model))).is_some() {
                    println!("{}", format!("Model set to {} ({}).", model, model.label()).green());
                }
            }
            None => println!("{}", format!("Unknown model: {name}. See /admin for the list.").yellow()),
        },
        Command::Temperature(value) => {
            update(chat, |config| config.with_temperature(value), "Temperature updated.")
        }
        Command::TopK(value) => update(chat, |config| config.with_top_k(value), "Top-k updated."),
        Command::TopP(value) => update(chat, |config| config.with_top_p(value), "Top-p updated."),
        Command::Instruction(text) => update(
            chat,
            |config| Ok(config.with_system_instruction(text)),
            "System instruction updated.",
        ),
        Command::Edit { index, text } => {
            if let Some(turn) = turn_at(chat, index) {
                if report(chat.edit_turn(&turn.id, text)) == Some(true) {
                    println!("{}", format!("Turn {index} updated.").green());
                }
            }
        }
        Command::Delete(index) => {
            if let Some(turn) = turn_at(chat, index) {
                if report(chat.delete_turn(&turn.id)).flatten().is_some() {
                    println!("{}", format!("Turn {index} deleted.").green());
                }
            }
        }
        Command::Clear => {
            if report(chat.clear_history()).is_some() {
                println!("{}", "History cleared.".green());
            }
        }
    }
}

fn login(chat: &ChatSession, code: Option<String>, rl: &mut Repl) {
    if chat.clearance().is_admin() {
        println!("{}", "Already in administrator mode.".bright_black());
        return;
    }

    let code = match code {
        Some(code) => code,
        None => {
            if let Some(helper) = rl.helper_mut() {
                helper.set_secret_input(true);
            }
            let read = rl.readline("Admin code: ");
            if let Some(helper) = rl.helper_mut() {
                helper.set_secret_input(false);
            }
            match read {
                Ok(code) => code,
                Err(_) => return,
            }
        }
    };

    if chat.login(&code) {
        println!("{}", "Administrator mode unlocked.".bright_green().bold());
        print_panel(&chat.config());
    } else {
        println!("{}", "ACCESS DENIED: wrong admin code.".on_red().white().bold());
    }
}

/// Applies `edit` to the current config and saves the result.
fn update<F>(chat: &ChatSession, edit: F, done: &str)
where
    F: FnOnce(GenerationConfig) -> neurobot_core::Result<GenerationConfig>,
{
    let result = edit(chat.config()).and_then(|config| chat.update_config(config));
    if report(result).is_some() {
        println!("{}", done.green());
    }
}

fn report<T>(result: neurobot_core::Result<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            report_error(&e);
            None
        }
    }
}

fn report_error(error: &NeurobotError) {
    if error.is_access_denied() {
        println!(
            "{}",
            "Administrator mode required. Use /login first.".yellow()
        );
    } else {
        println!("{}", error.to_string().red());
    }
}

fn resolve_model(name: &str) -> Option<ModelName> {
    if let Ok(number) = name.parse::<usize>() {
        return number
            .checked_sub(1)
            .and_then(|index| ModelName::all().get(index).copied());
    }
    ModelName::from_str(name).ok()
}

fn turn_at(chat: &ChatSession, index: usize) -> Option<Turn> {
    let turn = chat.turns().into_iter().nth(index.saturating_sub(1));
    if turn.is_none() {
        println!("{}", format!("No turn {index}. See /history.").yellow());
    }
    turn
}

fn print_history(chat: &ChatSession) {
    let turns = chat.turns();
    if turns.is_empty() {
        println!("{}", "(no messages)".bright_black());
        return;
    }
    for (number, turn) in turns.iter().enumerate() {
        let who = match turn.sender {
            Sender::User => "You".green().bold(),
            Sender::Model => "NEUROBOT".bright_blue().bold(),
        };
        let text = if turn.is_placeholder() { "…" } else { turn.text.as_str() };
        println!("{} {}: {}", format!("[{}]", number + 1).bright_black(), who, text);
    }
}

fn print_panel(config: &GenerationConfig) {
    println!("{}", "--- Administrator panel ---".bright_magenta().bold());

    let state = if config.is_system_active {
        "ACTIVE".green().bold()
    } else {
        "MAINTENANCE".red().bold()
    };
    println!("System state:   {state}   (/active on|off)");
    println!("Instruction:    {}", config.system_instruction);
    println!("Models:         (/model <number|name>)");
    for (number, model) in ModelName::all().iter().enumerate() {
        let marker = if model.to_string() == config.model_name { "*" } else { " " };
        println!("  {marker} {}. {} [{}]", number + 1, model.label(), model);
    }
    if config.model().is_none() {
        println!("  * {} [custom]", config.model_name);
    }
    println!("Temperature:    {}", config.temperature);
    println!("Top-k:          {}", config.top_k);
    println!("Top-p:          {}", config.top_p);
}

//! Slash command parsing for the chat REPL

use agora_domain::Phase;
use std::path::PathBuf;

/// One line of REPL input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    /// Plain text sent to the council
    Say(String),
    /// Reply to the message with the given 1-based index
    Reply { index: usize, text: String },
    Help,
    Quit,
    Start,
    Pause,
    Resume,
    Nudge(String),
    Interview,
    Plan,
    Phase(Phase),
    Regenerate,
    Edit { index: usize, text: String },
    Toggle { index: usize, item: usize },
    Clear,
    Summary,
    Minutes(Option<PathBuf>),
    RefreshContext,
    Starters,
    Status,
    History,
    Who,
}

/// Parse one trimmed, non-empty input line
pub fn parse_line(line: &str) -> Result<ReplCommand, String> {
    let Some(rest) = line.strip_prefix('/') else {
        return Ok(ReplCommand::Say(line.to_string()));
    };

    let (name, args) = match rest.split_once(char::is_whitespace) {
        Some((name, args)) => (name, args.trim()),
        None => (rest, ""),
    };

    let command = match name {
        "help" | "h" | "?" => ReplCommand::Help,
        "quit" | "exit" | "q" => ReplCommand::Quit,
        "start" | "go" => ReplCommand::Start,
        "pause" | "stop" => ReplCommand::Pause,
        "resume" | "continue" => ReplCommand::Resume,
        "nudge" | "ask" => ReplCommand::Nudge(required(args, "/nudge <participant>")?.to_string()),
        "interview" => ReplCommand::Interview,
        "plan" => ReplCommand::Plan,
        "phase" => {
            let phase = required(args, "/phase <exploration|synthesis|action>")?;
            ReplCommand::Phase(phase.parse().map_err(|e| format!("{e}"))?)
        }
        "regen" | "regenerate" => ReplCommand::Regenerate,
        "reply" => {
            let (index, text) = index_and_text(args, "/reply <n> <text>")?;
            ReplCommand::Reply { index, text }
        }
        "edit" => {
            let (index, text) = index_and_text(args, "/edit <n> <text>")?;
            ReplCommand::Edit { index, text }
        }
        "toggle" | "done" => {
            let usage = "/toggle <n> <item>";
            let (index, item) = index_and_text(args, usage)?;
            let item = parse_index(&item, usage)?;
            ReplCommand::Toggle { index, item }
        }
        "clear" => ReplCommand::Clear,
        "summary" | "summarize" => ReplCommand::Summary,
        "minutes" => ReplCommand::Minutes((!args.is_empty()).then(|| PathBuf::from(args))),
        "context" => ReplCommand::RefreshContext,
        "starters" => ReplCommand::Starters,
        "status" => ReplCommand::Status,
        "history" | "log" => ReplCommand::History,
        "who" | "participants" => ReplCommand::Who,
        other => return Err(format!("Unknown command: /{other} (type /help)")),
    };
    Ok(command)
}

fn required<'a>(args: &'a str, usage: &str) -> Result<&'a str, String> {
    if args.is_empty() {
        Err(format!("Usage: {usage}"))
    } else {
        Ok(args)
    }
}

fn parse_index(raw: &str, usage: &str) -> Result<usize, String> {
    match raw.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(format!("Usage: {usage}")),
    }
}

fn index_and_text(args: &str, usage: &str) -> Result<(usize, String), String> {
    let (index, text) = args
        .split_once(char::is_whitespace)
        .ok_or_else(|| format!("Usage: {usage}"))?;
    let text = text.trim();
    if text.is_empty() {
        return Err(format!("Usage: {usage}"));
    }
    Ok((parse_index(index, usage)?, text.to_string()))
}

/// Help text listing every command
pub const HELP: &str = "\
Commands:
  <text>                 Send a message to the council
  /reply <n> <text>      Reply to message n, quoting it
  /start, /pause, /resume  Control the autonomous discussion
  /nudge <id>            Make a participant speak next
  /interview             Ask the council to interview you
  /plan                  Generate an action plan
  /phase <name>          Move to exploration, synthesis or action
  /regen                 Regenerate the last reply
  /edit <n> <text>       Edit message n
  /toggle <n> <item>     Toggle action item <item> of message n
  /clear                 Clear the conversation
  /summary               Refresh the long-term summary
  /minutes [path]        Print or save meeting minutes
  /context               Refresh the session context from the discussion
  /starters              Suggest conversation starters
  /status, /history, /who  Show status, the log, or the participants
  /quit                  Exit";

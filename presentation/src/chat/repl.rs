//! REPL (Read-Eval-Print Loop) for interactive chat
//!
//! Line editing runs on a dedicated thread because rustyline blocks; lines
//! are forwarded to the async loop, which interleaves them with session
//! events from the controller.

use super::command::{HELP, ReplCommand, parse_line};
use crate::output::console::ConsoleFormatter;
use agora_application::{ControllerError, SessionCommand, SessionEvent, SessionHandle};
use agora_domain::{Attachment, Message, ParticipantRegistry};
use colored::Colorize;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};

/// Raw input from the line editor thread
enum Input {
    Line(String),
    Interrupted,
    Eof,
}

/// Interactive chat REPL over a running session
pub struct ChatRepl {
    handle: SessionHandle,
    registry: Arc<ParticipantRegistry>,
    formatter: ConsoleFormatter,
    history_file: Option<PathBuf>,
    /// Number of messages in the log, for 1-based indices
    log_len: usize,
}

impl ChatRepl {
    pub fn new(handle: SessionHandle, registry: Arc<ParticipantRegistry>) -> Self {
        Self {
            handle,
            registry,
            formatter: ConsoleFormatter::new(),
            history_file: dirs::data_dir().map(|p| p.join("agora").join("history.txt")),
            log_len: 0,
        }
    }

    pub fn with_formatter(mut self, formatter: ConsoleFormatter) -> Self {
        self.formatter = formatter;
        self
    }

    pub fn with_history_file(mut self, path: Option<PathBuf>) -> Self {
        if path.is_some() {
            self.history_file = path;
        }
        self
    }

    /// Run the interactive REPL until the user quits, then stop the session
    pub async fn run(mut self) -> rustyline::Result<()> {
        let mut editor = DefaultEditor::new()?;
        if let Some(path) = &self.history_file {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            let _ = editor.load_history(path);
        }

        let mut events = self.handle.subscribe();
        self.print_welcome().await;

        let (tx, mut lines) = mpsc::unbounded_channel();
        let history_file = self.history_file.clone();
        std::thread::spawn(move || read_lines(editor, tx, history_file));

        loop {
            tokio::select! {
                input = lines.recv() => match input {
                    Some(Input::Line(line)) => {
                        if !self.handle_line(&line).await {
                            break;
                        }
                    }
                    Some(Input::Interrupted) => {
                        println!("^C (type /quit to exit)");
                    }
                    Some(Input::Eof) | None => break,
                },
                event = events.recv() => match event {
                    Ok(event) => self.on_event(&event),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        println!("{}", format!("({skipped} updates skipped)").dimmed());
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
            }
        }

        println!("Bye!");
        self.handle.shutdown().await;
        Ok(())
    }

    async fn print_welcome(&mut self) {
        let Ok(snapshot) = self.handle.snapshot().await else {
            return;
        };
        self.log_len = snapshot.messages.len();

        println!();
        println!(
            "{}",
            ConsoleFormatter::format_session_header(&snapshot.session, &self.registry)
        );
        for (i, message) in snapshot.messages.iter().enumerate() {
            println!("{}", self.formatter.format_message(i + 1, message, &self.registry));
        }
        if snapshot.messages.is_empty() && !snapshot.session.starters.is_empty() {
            println!("{}", ConsoleFormatter::format_starters(&snapshot.session.starters));
        }
        println!("{}", "Type /help for commands.".dimmed());
        println!();
    }

    fn on_event(&mut self, event: &SessionEvent) {
        match event {
            SessionEvent::MessageAppended(_) => self.log_len += 1,
            SessionEvent::MessageRemoved(_) => self.log_len = self.log_len.saturating_sub(1),
            SessionEvent::HistoryCleared => self.log_len = 0,
            SessionEvent::HistoryReloaded(messages) => self.log_len = messages.len(),
            _ => {}
        }
        if let Some(text) = self.formatter.format_event(event, self.log_len, &self.registry) {
            println!("{}", text);
        }
    }

    /// Handle one input line. Returns false when the user wants to exit.
    async fn handle_line(&mut self, line: &str) -> bool {
        let command = match parse_line(line) {
            Ok(command) => command,
            Err(message) => {
                println!("{}", message.yellow());
                return true;
            }
        };
        if command == ReplCommand::Quit {
            return false;
        }
        if let Err(e) = self.dispatch(command).await {
            println!("{}", format!("Error: {e}").red());
        }
        true
    }

    async fn dispatch(&mut self, command: ReplCommand) -> Result<(), ControllerError> {
        let handle = &self.handle;
        match command {
            ReplCommand::Say(text) => handle.send_message(text)?,
            ReplCommand::Reply { index, text } => {
                let target = self.message_at(index).await?;
                handle.send(SessionCommand::SendMessage {
                    text,
                    attachments: Vec::<Attachment>::new(),
                    reply_to: Some(target.id),
                })?;
            }
            ReplCommand::Help => println!("{HELP}"),
            ReplCommand::Quit => {}
            ReplCommand::Start => handle.send(SessionCommand::Start)?,
            ReplCommand::Pause => {
                handle.send(SessionCommand::Pause)?;
                println!("{}", "Paused.".dimmed());
            }
            ReplCommand::Resume => handle.send(SessionCommand::Resume)?,
            ReplCommand::Nudge(id) => handle.nudge(id)?,
            ReplCommand::Interview => handle.send(SessionCommand::RequestInterview)?,
            ReplCommand::Plan => {
                println!("{}", "Drafting an action plan...".dimmed());
                handle.send(SessionCommand::RequestActionPlan)?;
            }
            ReplCommand::Phase(phase) => handle.send(SessionCommand::SetPhase(phase))?,
            ReplCommand::Regenerate => handle.send(SessionCommand::RegenerateLast)?,
            ReplCommand::Edit { index, text } => {
                let target = self.message_at(index).await?;
                handle.send(SessionCommand::EditMessage { id: target.id, text })?;
            }
            ReplCommand::Toggle { index, item } => {
                let target = self.message_at(index).await?;
                let Some(item) = target
                    .action_plan
                    .as_ref()
                    .and_then(|plan| plan.items.get(item - 1))
                else {
                    println!("{}", format!("Message {index} has no item {item}.").yellow());
                    return Ok(());
                };
                handle.send(SessionCommand::ToggleActionItem {
                    message_id: target.id.clone(),
                    item_id: item.id.clone(),
                })?;
            }
            ReplCommand::Clear => handle.send(SessionCommand::ClearHistory)?,
            ReplCommand::Summary => {
                handle.send(SessionCommand::Summarize)?;
                println!("{}", "Summarizing in the background...".dimmed());
            }
            ReplCommand::Minutes(path) => {
                println!("{}", "Writing minutes...".dimmed());
                let minutes = handle.meeting_minutes().await?;
                match path {
                    Some(path) => match tokio::fs::write(&path, minutes).await {
                        Ok(()) => println!("Minutes saved to {}", path.display()),
                        Err(e) => println!("{}", format!("Could not write minutes: {e}").red()),
                    },
                    None => println!("{minutes}"),
                }
            }
            ReplCommand::RefreshContext => {
                handle.send(SessionCommand::RefreshContext)?;
                let snapshot = handle.snapshot().await?;
                println!("{} {}", "Context:".bold(), snapshot.session.context);
            }
            ReplCommand::Starters => {
                handle.send(SessionCommand::RegenerateStarters)?;
                let snapshot = handle.snapshot().await?;
                println!("{}", ConsoleFormatter::format_starters(&snapshot.session.starters));
            }
            ReplCommand::Status => {
                let snapshot = handle.snapshot().await?;
                println!(
                    "{}",
                    ConsoleFormatter::format_status(
                        snapshot.status,
                        snapshot.consecutive_bot_turns,
                        snapshot.session.phase
                    )
                );
                if let Some(summary) = &snapshot.session.summary {
                    println!("{} {}", "Summary:".bold(), summary);
                }
            }
            ReplCommand::History => {
                let snapshot = handle.snapshot().await?;
                for (i, message) in snapshot.messages.iter().enumerate() {
                    println!("{}", self.formatter.format_message(i + 1, message, &self.registry));
                }
            }
            ReplCommand::Who => {
                let snapshot = handle.snapshot().await?;
                for id in &snapshot.session.active_participants {
                    if let Some(participant) = self.registry.get(id.as_str()) {
                        println!("{}", ConsoleFormatter::format_participant(participant));
                    }
                }
            }
        }
        Ok(())
    }

    async fn message_at(&self, index: usize) -> Result<Message, ControllerError> {
        let snapshot = self.handle.snapshot().await?;
        snapshot
            .messages
            .into_iter()
            .nth(index.saturating_sub(1))
            .ok_or_else(|| agora_domain::DomainError::MessageNotFound(format!("#{index}")).into())
    }
}

fn read_lines(
    mut editor: DefaultEditor,
    tx: mpsc::UnboundedSender<Input>,
    history_file: Option<PathBuf>,
) {
    loop {
        let input = match editor.readline("> ") {
            Ok(line) => {
                let line = line.trim().to_string();
                if line.is_empty() {
                    continue;
                }
                let _ = editor.add_history_entry(line.as_str());
                let quit = matches!(parse_line(&line), Ok(ReplCommand::Quit));
                if tx.send(Input::Line(line)).is_err() || quit {
                    break;
                }
                continue;
            }
            Err(ReadlineError::Interrupted) => Input::Interrupted,
            Err(ReadlineError::Eof) => Input::Eof,
            Err(err) => {
                eprintln!("Error: {:?}", err);
                Input::Eof
            }
        };
        let stop = matches!(input, Input::Eof);
        if tx.send(input).is_err() || stop {
            break;
        }
    }

    if let Some(path) = &history_file {
        let _ = editor.save_history(path);
    }
}

//! Console rendering of session events and messages

use agora_application::ports::notifier::{Notifier, Severity};
use agora_application::ports::session_event::SessionEvent;
use agora_domain::{
    ConversationStatus, Message, MessageKind, Participant, ParticipantRegistry, Phase, Session,
};
use colored::{Color, Colorize};

/// Formats session output for the terminal
pub struct ConsoleFormatter {
    show_rationale: bool,
}

impl Default for ConsoleFormatter {
    fn default() -> Self {
        Self {
            show_rationale: true,
        }
    }
}

impl ConsoleFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rationale(mut self, show: bool) -> Self {
        self.show_rationale = show;
        self
    }

    /// Render one log entry; `index` is the 1-based position used by commands
    pub fn format_message(
        &self,
        index: usize,
        message: &Message,
        registry: &ParticipantRegistry,
    ) -> String {
        if message.kind == MessageKind::System {
            return format!("{} {}", format!("[{index}]").dimmed(), message.text.italic().dimmed());
        }

        let mut output = String::new();
        if self.show_rationale
            && let Some(rationale) = &message.rationale
        {
            output.push_str(&format!("  {}\n", format!("↳ {rationale}").dimmed()));
        }

        let name = registry.display_name(&message.sender);
        let color = registry
            .get(message.sender.as_str())
            .and_then(|p| p.color.as_deref())
            .map(Color::from)
            .unwrap_or(if message.is_from_human() {
                Color::Green
            } else {
                Color::Yellow
            });
        output.push_str(&format!(
            "{} {} {}\n",
            format!("[{index}]").dimmed(),
            name.color(color).bold(),
            message.timestamp.format("%H:%M").to_string().dimmed()
        ));
        output.push_str(&Self::indent(&message.text, "  "));

        for attachment in &message.attachments {
            output.push_str(&format!("\n  {} {}", "📎".dimmed(), attachment.name));
        }

        if let Some(plan) = &message.action_plan {
            output.push_str(&format!("\n\n  {}", plan.title.cyan().bold()));
            for (n, item) in plan.items.iter().enumerate() {
                let mark = if item.completed { "[x]" } else { "[ ]" };
                output.push_str(&format!("\n  {} {}. {}", mark, n + 1, item.text));
            }
            output.push_str(&format!(
                "\n  {}",
                format!("{}/{} done", plan.completed_count(), plan.items.len()).dimmed()
            ));
        }
        output
    }

    /// Render an event; `None` for events the chat view does not show
    pub fn format_event(
        &self,
        event: &SessionEvent,
        next_index: usize,
        registry: &ParticipantRegistry,
    ) -> Option<String> {
        match event {
            SessionEvent::MessageAppended(message) => {
                // human input is already on screen
                if message.is_from_human() {
                    None
                } else {
                    Some(self.format_message(next_index, message, registry))
                }
            }
            SessionEvent::MessageUpdated(_) => Some("Message updated.".dimmed().to_string()),
            SessionEvent::MessageRemoved(_) => {
                Some("Last reply removed, regenerating...".dimmed().to_string())
            }
            SessionEvent::SpeakerSelected { speaker, .. } => Some(
                format!("{} is thinking...", registry.display_name(speaker))
                    .dimmed()
                    .to_string(),
            ),
            SessionEvent::PhaseChanged { to, .. } => Some(Self::phase_banner(*to)),
            SessionEvent::SafetyValveTripped { consecutive_turns } => Some(
                format!("⏸ Paused after {consecutive_turns} turns. Type to continue or /resume.")
                    .yellow()
                    .to_string(),
            ),
            SessionEvent::HistoryCleared => Some("Conversation cleared.".dimmed().to_string()),
            SessionEvent::HistoryReloaded(messages) => Some(
                format!("History reloaded ({} messages).", messages.len())
                    .dimmed()
                    .to_string(),
            ),
            SessionEvent::SessionUpdated(_) | SessionEvent::StatusChanged(_) => None,
        }
    }

    pub fn format_status(status: ConversationStatus, consecutive: usize, phase: Phase) -> String {
        let status_text = match status {
            ConversationStatus::Idle => "idle".normal(),
            ConversationStatus::Active => "active".green(),
            ConversationStatus::Thinking => "thinking".cyan(),
            ConversationStatus::Paused => "paused".yellow(),
        };
        format!(
            "{} {}  {} {}  {} {}",
            "Status:".bold(),
            status_text,
            "Phase:".bold(),
            phase.display_name(),
            "Turns without you:".bold(),
            consecutive
        )
    }

    pub fn phase_banner(phase: Phase) -> String {
        format!("── {} ──", phase.display_name().to_uppercase())
            .magenta()
            .bold()
            .to_string()
    }

    pub fn format_session_header(session: &Session, registry: &ParticipantRegistry) -> String {
        let line = "=".repeat(60);
        let mut output = format!(
            "{}\n{:^60}\n{}\n",
            line.cyan(),
            session.title.bold(),
            line.cyan()
        );
        output.push_str(&format!("{} {}\n", "Session:".dimmed(), session.id));
        output.push_str(&format!(
            "{} {} ({})\n",
            "Mode:".dimmed(),
            session.mode,
            session.phase.display_name()
        ));
        output.push_str(&format!(
            "{} {}\n",
            "With:".dimmed(),
            registry.names_for(&session.active_participants).join(", ")
        ));
        if !session.context.is_empty() {
            output.push_str(&format!("{} {}\n", "Context:".dimmed(), session.context));
        }
        output
    }

    pub fn format_session_list(sessions: &[Session]) -> String {
        if sessions.is_empty() {
            return "No sessions yet.".to_string();
        }
        sessions
            .iter()
            .map(|s| {
                format!(
                    "{}  {}  {} {}",
                    s.id.to_string().dimmed(),
                    s.last_active_at.format("%Y-%m-%d %H:%M"),
                    s.title.bold(),
                    format!("[{}, {}]", s.mode, s.phase).dimmed()
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn format_participant(participant: &Participant) -> String {
        format!(
            "  {:<14} {} {}",
            participant.id.as_str(),
            participant.name.bold(),
            format!("({})", participant.role).dimmed()
        )
    }

    pub fn format_starters(starters: &[String]) -> String {
        let mut output = format!("{}\n", "Try asking:".cyan());
        for starter in starters {
            output.push_str(&format!("  • {}\n", starter));
        }
        output
    }

    /// Indent a multi-line string
    pub fn indent(text: &str, prefix: &str) -> String {
        text.lines()
            .map(|line| format!("{}{}", prefix, line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Prints notifications to stderr
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, message: &str, severity: Severity) {
        let line = match severity {
            Severity::Info => format!("ℹ {}", message).blue(),
            Severity::Warning => format!("⚠ {}", message).yellow(),
            Severity::Error => format!("✖ {}", message).red().bold(),
        };
        eprintln!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_domain::{ActionPlan, Participant};

    fn registry() -> ParticipantRegistry {
        ParticipantRegistry::from_participants([
            Participant::new("nova", "Nova", "Product", "Ask about value.").with_color("cyan"),
        ])
    }

    #[test]
    fn test_format_persona_message_with_plan() {
        colored::control::set_override(false);
        let plan = ActionPlan::from_texts("Next week", vec!["Call investors".to_string()]);
        let message = Message::persona("nova".into(), "Here you go")
            .with_rationale("Nova owns the roadmap")
            .with_action_plan(plan);

        let text = ConsoleFormatter::new().format_message(2, &message, &registry());

        assert!(text.contains("↳ Nova owns the roadmap"));
        assert!(text.contains("[2] Nova"));
        assert!(text.contains("  Here you go"));
        assert!(text.contains("[ ] 1. Call investors"));
        assert!(text.contains("0/1 done"));
    }

    #[test]
    fn test_rationale_can_be_hidden() {
        colored::control::set_override(false);
        let message = Message::persona("nova".into(), "Hi").with_rationale("because");

        let text = ConsoleFormatter::new()
            .with_rationale(false)
            .format_message(1, &message, &registry());

        assert!(!text.contains("because"));
    }

    #[test]
    fn test_human_echo_is_suppressed() {
        let event = SessionEvent::MessageAppended(Message::human("Hello"));
        assert!(ConsoleFormatter::new()
            .format_event(&event, 1, &registry())
            .is_none());
    }

    #[test]
    fn test_system_message_is_single_line() {
        colored::control::set_override(false);
        let message = Message::phase_changed(Phase::Exploration, Phase::Synthesis, false);

        let text = ConsoleFormatter::new().format_message(5, &message, &registry());

        assert_eq!(text, "[5] The moderator advanced the phase to: SYNTHESIS");
    }

    #[test]
    fn test_session_list() {
        colored::control::set_override(false);
        assert_eq!(ConsoleFormatter::format_session_list(&[]), "No sessions yet.");

        let session = Session::new("Launch", vec!["nova".into()]);
        let listing = ConsoleFormatter::format_session_list(&[session.clone()]);
        assert!(listing.contains("Launch"));
        assert!(listing.contains(session.id.as_str()));
    }

    #[test]
    fn test_indent() {
        assert_eq!(ConsoleFormatter::indent("a\nb", "> "), "> a\n> b");
    }
}

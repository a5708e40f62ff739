//! Prompt templates for council turns and artifacts

use crate::conversation::message::Message;
use crate::orchestration::phase::Phase;
use crate::participant::entities::Participant;
use crate::participant::registry::ParticipantRegistry;
use crate::util::truncate_str;
use serde::{Deserialize, Serialize};

/// Content shaping instruction for a persona reply
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyTone {
    #[default]
    Default,
    /// Ask the user a single clarifying question instead of giving advice
    Interview,
}

/// Templates for generating prompts at each step of a turn
pub struct PromptTemplate;

impl PromptTemplate {
    /// Render messages as `Name: text` lines
    pub fn transcript(history: &[Message], registry: &ParticipantRegistry) -> String {
        history
            .iter()
            .map(|m| {
                let name = registry.display_name(&m.sender);
                if m.attachments.is_empty() {
                    format!("{}: {}", name, m.text)
                } else {
                    let names: Vec<&str> = m.attachments.iter().map(|a| a.name.as_str()).collect();
                    format!("{}: {} [Attached: {}]", name, m.text, names.join(", "))
                }
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// What each phase expects from the speakers
    pub fn phase_guidance(phase: Phase) -> &'static str {
        match phase {
            Phase::Exploration => {
                "CURRENT PHASE: EXPLORATION. Open up the problem. Offer perspectives, raise \
                 questions and challenge assumptions. Do not rush to conclusions."
            }
            Phase::Synthesis => {
                "CURRENT PHASE: SYNTHESIS. Converge. Connect the strongest ideas raised so far, \
                 resolve disagreements and name the emerging consensus."
            }
            Phase::Action => {
                "CURRENT PHASE: ACTION. Be concrete. Propose next steps, owners and first moves. \
                 Avoid reopening settled debates."
            }
        }
    }

    /// System prompt for a persona reply
    pub fn reply_system(participant: &Participant, phase: Phase, tone: ReplyTone) -> String {
        let mut system = format!(
            "You are {}, {}.\n\n{}\n\n{}",
            participant.name,
            participant.role,
            participant.instruction.trim(),
            Self::phase_guidance(phase)
        );
        if tone == ReplyTone::Interview {
            system.push_str(
                "\n\nINTERVIEW MODE: Do not give advice yet. Ask the user exactly one short, \
                 specific clarifying question that would most improve the council's \
                 understanding of their situation.",
            );
        }
        system
    }

    /// User prompt for a persona reply
    pub fn reply_prompt(
        history: &[Message],
        registry: &ParticipantRegistry,
        context: &str,
        summary: Option<&str>,
    ) -> String {
        let mut prompt =
            String::from("The following is a conversation between several council members and a user.\n");

        if !context.trim().is_empty() {
            prompt.push_str(&format!(
                "\nCONTEXT / OBJECTIVE OF THIS DISCUSSION:\n\"{}\"\nKeep this objective in mind when speaking.\n",
                context.trim()
            ));
        }

        if let Some(summary) = summary.filter(|s| !s.trim().is_empty()) {
            prompt.push_str(&format!(
                "\nPREVIOUS DISCUSSION SUMMARY:\n\"{}\"\nUse it to recall points that are no longer in the recent history.\n",
                summary.trim()
            ));
        }

        prompt.push_str(&format!(
            r#"
CONVERSATION HISTORY:
{}

INSTRUCTION:
Respond to the last message or the general topic as your persona.
Stay in character. Do not prefix your reply with your name.
If the last message quotes you or asks you directly, address it."#,
            Self::transcript(history, registry)
        ));

        prompt
    }

    /// System prompt for the speaker router
    pub fn router_system() -> &'static str {
        r#"You are the moderator of a council discussion. You never speak yourself.
You decide which council member should speak next and whether the discussion is ready to move to its next phase.
Always answer with a single JSON object and nothing else."#
    }

    /// User prompt for the speaker router
    pub fn router_prompt(
        history: &[Message],
        candidates: &[&Participant],
        registry: &ParticipantRegistry,
        context: &str,
        phase: Phase,
        interview: bool,
    ) -> String {
        let roster = candidates
            .iter()
            .map(|p| format!("- id: {} | name: {} | role: {}", p.id, p.name, p.role))
            .collect::<Vec<_>>()
            .join("\n");

        let context = if context.trim().is_empty() {
            "General discussion"
        } else {
            context.trim()
        };

        let mut prompt = format!(
            r#"Context: "{}"
Current phase: {}

Candidates:
{}

History:
{}

Rules:
1. If a specific member was asked a question, pick them.
2. If the topic fits a member's expertise, pick them.
3. Avoid picking the same member twice in a row unless they are answering a follow-up.
4. Set "advancePhase" to true only when the current phase has run its course."#,
            context,
            phase.as_str(),
            roster,
            Self::transcript(history, registry)
        );

        if interview {
            prompt.push_str(
                "\n5. The user asked to be interviewed: pick the member best placed to ask them a clarifying question.",
            );
        }

        prompt.push_str(
            r#"

Return JSON: {"nextSpeakerId": "<candidate id>" | null, "reasoning": "<one sentence>", "advancePhase": true | false}"#,
        );
        prompt
    }

    /// Prompt for the rolling long-term summary
    pub fn summary_prompt(history: &[Message], registry: &ParticipantRegistry) -> String {
        format!(
            r#"Summarize the key points, decisions and facts from this conversation.
The summary is long-term memory for a council of AI personas. Keep it dense and factual.

History:
{}"#,
            Self::transcript(history, registry)
        )
    }

    /// Prompt for Markdown meeting minutes
    pub fn minutes_prompt(history: &[Message], registry: &ParticipantRegistry, title: &str) -> String {
        format!(
            r#"Write structured meeting minutes for the session "{}" in Markdown.
Include:
1. Executive Summary
2. Key Discussion Points (bulleted)
3. Consensus Reached
4. Divergent Opinions
5. Recommended Actions / Next Steps

Conversation:
{}"#,
            title,
            Self::transcript(history, registry)
        )
    }

    /// Prompt for a structured action plan
    pub fn action_plan_prompt(
        history: &[Message],
        registry: &ParticipantRegistry,
        title: &str,
    ) -> String {
        format!(
            r#"Based on the discussion of "{}", produce a practical action plan.

Conversation:
{}

Return JSON: {{"title": "<short plan title>", "items": ["<concrete step>", ...]}}
Use between 3 and 8 items. Each item is one actionable sentence."#,
            title,
            Self::transcript(history, registry)
        )
    }

    /// Prompt for suggested conversation starters
    pub fn starters_prompt(title: &str, context: &str) -> String {
        format!(
            r#"Generate 5 thought-provoking, open-ended questions to open a panel discussion.

Session title: "{}"
Context / objective: "{}"

Keep each question under 15 words.
Return JSON: an array of strings."#,
            title, context
        )
    }

    /// Prompt for evolving the session objective from recent discussion
    pub fn context_refresh_prompt(
        current: &str,
        history: &[Message],
        registry: &ParticipantRegistry,
    ) -> String {
        format!(
            r#"Based on the recent conversation, refine the context / objective of this session.

Current context: "{}"

Recent conversation:
{}

Rewrite the context to reflect the group's new direction or focus.
Keep it professional and concise (at most 3 sentences). Answer with the new context only."#,
            current,
            Self::transcript(history, registry)
        )
    }

    /// Short one-line preview of a message, used in logs
    pub fn preview(text: &str) -> &str {
        truncate_str(text.lines().next().unwrap_or(""), 80)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::message::{Attachment, AttachmentKind};

    fn registry() -> ParticipantRegistry {
        ParticipantRegistry::from_participants(vec![
            Participant::new("luna", "Luna", "Artist", "Think in images."),
            Participant::new("max", "Max", "Engineer", "Be pragmatic."),
        ])
    }

    #[test]
    fn test_transcript_names_and_attachments() {
        let history = vec![
            Message::human("Look at this").with_attachments(vec![Attachment {
                kind: AttachmentKind::Image,
                mime_type: "image/png".to_string(),
                name: "sketch.png".to_string(),
                data: String::new(),
            }]),
            Message::persona("luna".into(), "Lovely colours"),
        ];
        let transcript = PromptTemplate::transcript(&history, &registry());
        assert!(transcript.contains("You: Look at this [Attached: sketch.png]"));
        assert!(transcript.contains("Luna: Lovely colours"));
    }

    #[test]
    fn test_reply_system_interview_tone() {
        let registry = registry();
        let luna = registry.get("luna").unwrap();
        let default = PromptTemplate::reply_system(luna, Phase::Synthesis, ReplyTone::Default);
        assert!(default.contains("You are Luna, Artist."));
        assert!(default.contains("SYNTHESIS"));
        assert!(!default.contains("INTERVIEW"));

        let interview = PromptTemplate::reply_system(luna, Phase::Synthesis, ReplyTone::Interview);
        assert!(interview.contains("exactly one"));
    }

    #[test]
    fn test_reply_prompt_optional_sections() {
        let registry = registry();
        let history = vec![Message::human("Hi")];
        let bare = PromptTemplate::reply_prompt(&history, &registry, "", None);
        assert!(!bare.contains("OBJECTIVE"));
        assert!(!bare.contains("SUMMARY"));

        let full = PromptTemplate::reply_prompt(&history, &registry, "Plan a mural", Some("Earlier: blue"));
        assert!(full.contains("\"Plan a mural\""));
        assert!(full.contains("\"Earlier: blue\""));
    }

    #[test]
    fn test_router_prompt_lists_candidates() {
        let registry = registry();
        let candidates = registry.all();
        let prompt = PromptTemplate::router_prompt(&[], &candidates, &registry, "", Phase::Exploration, true);
        assert!(prompt.contains("id: luna | name: Luna | role: Artist"));
        assert!(prompt.contains("General discussion"));
        assert!(prompt.contains("interviewed"));
        assert!(prompt.contains("nextSpeakerId"));
    }

    #[test]
    fn test_preview() {
        assert_eq!(PromptTemplate::preview("first line\nsecond"), "first line");
    }
}

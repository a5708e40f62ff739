//! Operations over a session's ordered message log

use super::message::{Message, MessageId};
use crate::core::error::DomainError;

/// Clamp `message.timestamp` so it never precedes the last entry of `log`
pub fn clamp_timestamp(log: &[Message], message: &mut Message) {
    if let Some(last) = log.last()
        && message.timestamp < last.timestamp
    {
        message.timestamp = last.timestamp;
    }
}

/// Stable sort by timestamp ascending
pub fn sort_chronologically(log: &mut [Message]) {
    log.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
}

pub fn find<'a>(log: &'a [Message], id: &MessageId) -> Option<&'a Message> {
    log.iter().find(|m| &m.id == id)
}

/// Replace the text of a message in place
pub fn edit_text(log: &mut [Message], id: &MessageId, text: &str) -> Result<(), DomainError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(DomainError::EmptyMessage);
    }
    let message = log
        .iter_mut()
        .find(|m| &m.id == id)
        .ok_or_else(|| DomainError::MessageNotFound(id.to_string()))?;
    message.text = text.to_string();
    Ok(())
}

/// Flip one action item's completion flag, returning the new value
pub fn toggle_action_item(
    log: &mut [Message],
    id: &MessageId,
    item_id: &str,
) -> Result<bool, DomainError> {
    let message = log
        .iter_mut()
        .find(|m| &m.id == id)
        .ok_or_else(|| DomainError::MessageNotFound(id.to_string()))?;
    let plan = message
        .action_plan
        .as_mut()
        .ok_or_else(|| DomainError::NoActionPlan(id.to_string()))?;
    plan.toggle(item_id)
}

/// The trailing non-human message that a regenerate would remove
pub fn regenerate_target(log: &[Message]) -> Result<&Message, DomainError> {
    match log.last() {
        Some(last) if !last.is_from_human() => Ok(last),
        _ => Err(DomainError::NothingToRegenerate),
    }
}

/// The last `n` entries of `log`
pub fn window(log: &[Message], n: usize) -> &[Message] {
    &log[log.len().saturating_sub(n)..]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::action_plan::ActionPlan;
    use crate::orchestration::phase::Phase;
    use chrono::Duration;

    #[test]
    fn test_clamp_timestamp_is_monotonic() {
        let mut first = Message::human("first");
        first.timestamp += Duration::seconds(30);
        let log = vec![first.clone()];

        let mut second = Message::persona("max".into(), "second");
        clamp_timestamp(&log, &mut second);
        assert_eq!(second.timestamp, first.timestamp);
    }

    #[test]
    fn test_edit_text() {
        let mut log = vec![Message::human("typo")];
        let id = log[0].id.clone();
        edit_text(&mut log, &id, " fixed ").unwrap();
        assert_eq!(log[0].text, "fixed");
        assert_eq!(edit_text(&mut log, &id, "  "), Err(DomainError::EmptyMessage));
        assert!(matches!(
            edit_text(&mut log, &MessageId::from("missing"), "x"),
            Err(DomainError::MessageNotFound(_))
        ));
    }

    #[test]
    fn test_toggle_action_item() {
        let plan = ActionPlan::from_texts("Plan", vec!["Call investors".to_string()]);
        let mut log = vec![
            Message::human("plan please"),
            Message::persona("atlas".into(), "Here you go").with_action_plan(plan),
        ];
        let human_id = log[0].id.clone();
        let plan_id = log[1].id.clone();
        assert!(toggle_action_item(&mut log, &plan_id, "item-1").unwrap());
        assert!(matches!(
            toggle_action_item(&mut log, &human_id, "item-1"),
            Err(DomainError::NoActionPlan(_))
        ));
    }

    #[test]
    fn test_regenerate_target() {
        let mut log = vec![Message::human("hi")];
        assert_eq!(
            regenerate_target(&log).unwrap_err(),
            DomainError::NothingToRegenerate
        );
        log.push(Message::persona("luna".into(), "hello"));
        assert_eq!(regenerate_target(&log).unwrap().text, "hello");
    }

    #[test]
    fn test_regenerate_target_accepts_system_event() {
        let log = vec![
            Message::human("hi"),
            Message::persona("luna".into(), "hello"),
            Message::phase_changed(Phase::Exploration, Phase::Action, true),
        ];
        assert!(regenerate_target(&log).unwrap().is_phase_change());
    }

    #[test]
    fn test_window() {
        let log: Vec<Message> = (0..5).map(|i| Message::human(format!("{i}"))).collect();
        assert_eq!(window(&log, 2).len(), 2);
        assert_eq!(window(&log, 2)[0].text, "3");
        assert_eq!(window(&log, 10).len(), 5);
    }
}

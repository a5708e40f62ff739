use crate::conversation::action_plan::ActionPlan;
use crate::core::error::DomainError;
use crate::orchestration::decision::SpeakerProposal;
use serde::Deserialize;

/// Maximum number of starters kept from a response
pub const MAX_STARTERS: usize = 5;

/// Isolate the JSON payload of a response.
///
/// Accepts a fenced ` ```json ` block, a bare fenced block, or the outermost
/// `{...}` / `[...]` span of the text.
pub fn extract_json_block(response: &str) -> Option<&str> {
    let trimmed = response.trim();

    if let Some(start) = trimmed.find("```") {
        let after = &trimmed[start + 3..];
        let body_start = after.find('\n').map(|i| i + 1).unwrap_or(0);
        let body = &after[body_start..];
        if let Some(end) = body.find("```") {
            let block = body[..end].trim();
            if !block.is_empty() {
                return Some(block);
            }
        }
    }

    let open = trimmed.find(['{', '['])?;
    let close_char = if trimmed[open..].starts_with('{') { '}' } else { ']' };
    let close = trimmed.rfind(close_char)?;
    (close > open).then(|| &trimmed[open..=close])
}

fn malformed(what: &str, response: &str) -> DomainError {
    DomainError::MalformedResponse(format!(
        "{}: {}",
        what,
        crate::util::truncate_str(response.trim(), 120)
    ))
}

/// Parse the router's speaker proposal.
///
/// A `null` or missing speaker id is a valid "no candidate" answer.
pub fn parse_speaker_proposal(response: &str) -> Result<SpeakerProposal, DomainError> {
    let json = extract_json_block(response).ok_or_else(|| malformed("no JSON object", response))?;
    serde_json::from_str::<SpeakerProposal>(json)
        .map(|mut proposal| {
            if proposal
                .next_speaker_id
                .as_deref()
                .is_some_and(|id| id.trim().is_empty() || id.eq_ignore_ascii_case("null"))
            {
                proposal.next_speaker_id = None;
            }
            proposal
        })
        .map_err(|e| malformed(&format!("invalid speaker proposal ({e})"), response))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PlanItem {
    Text(String),
    Object { text: String },
}

#[derive(Deserialize)]
struct PlanPayload {
    #[serde(default)]
    title: String,
    #[serde(default, alias = "steps", alias = "actions")]
    items: Vec<PlanItem>,
}

/// Parse an action plan; item ids are assigned as `item-1`, `item-2`, ...
pub fn parse_action_plan(response: &str) -> Result<ActionPlan, DomainError> {
    let json = extract_json_block(response).ok_or_else(|| malformed("no JSON object", response))?;
    let payload: PlanPayload = serde_json::from_str(json)
        .map_err(|e| malformed(&format!("invalid action plan ({e})"), response))?;

    let title = if payload.title.trim().is_empty() {
        "Action Plan".to_string()
    } else {
        payload.title.trim().to_string()
    };
    let texts = payload.items.into_iter().map(|item| match item {
        PlanItem::Text(text) | PlanItem::Object { text } => text,
    });
    let plan = ActionPlan::from_texts(title, texts);

    if plan.items.is_empty() {
        return Err(malformed("action plan has no items", response));
    }
    Ok(plan)
}

/// Parse suggested starters, keeping at most [`MAX_STARTERS`] non-empty entries
pub fn parse_starters(response: &str) -> Result<Vec<String>, DomainError> {
    let json = extract_json_block(response).ok_or_else(|| malformed("no JSON array", response))?;
    let starters: Vec<String> = serde_json::from_str(json)
        .map_err(|e| malformed(&format!("invalid starters ({e})"), response))?;

    Ok(starters
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .take(MAX_STARTERS)
        .collect())
}

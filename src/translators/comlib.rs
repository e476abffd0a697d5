// logsleuth-analyzer - translators/comlib.rs
//
// Humanizes a handful of high-value ComLib message shapes: message delivery
// state transitions and group-chat info updates. Everything else is left to
// the raw renderer.

use crate::model::{LineRecord, MatchType};
use crate::repo::LinesRepo;

pub fn translate(repo: &LinesRepo, line: &LineRecord) -> Option<String> {
    translate_message_state(repo, line).or_else(|| translate_gc_info(repo, line))
}

fn message_state_name(state: i64) -> &'static str {
    match state {
        0 => "none",
        1 => "pending",
        2 => "sending",
        3 => "sent",
        4 => "received",
        5 => "failed",
        6 => "delivered",
        7 => "displayed",
        _ => "unknown",
    }
}

fn translate_message_state(repo: &LinesRepo, line: &LineRecord) -> Option<String> {
    let bytes = repo.bytes_for(line);
    let tag = line.tag_str(bytes);
    let is_chat_tag = tag.starts_with(b"ChatController");
    if !is_chat_tag {
        return None;
    }
    if !(line.check_msg(bytes, "storing updated state", MatchType::Exact)
        || line.check_msg(bytes, "storing new message state", MatchType::Exact)
        || line.check_msg(bytes, "message state changed", MatchType::StartsWith))
    {
        return None;
    }
    let state = line.param_extract_i64(bytes, "state")?;
    let id = line.param_extract_str(bytes, "id").unwrap_or_default();
    Some(format!(
        "message {id} state -> {}",
        message_state_name(state)
    ))
}

fn gc_info_type_name(kind: i64) -> &'static str {
    match kind {
        0 => "none",
        1 => "rcs",
        2 => "broadcast",
        3 => "groupMMS",
        _ => "unknown",
    }
}

fn gc_info_state_name(state: i64) -> &'static str {
    match state {
        0 => "none",
        1 => "inviting",
        2 => "invited",
        3 => "connecting",
        4 => "connected",
        5 => "disconnected",
        6 => "closed",
        _ => "unknown",
    }
}

fn translate_gc_info(repo: &LinesRepo, line: &LineRecord) -> Option<String> {
    let bytes = repo.bytes_for(line);
    if !line.check_tag(bytes, "GroupChatController", MatchType::Exact) {
        return None;
    }
    if !(line.check_msg(bytes, "storing updated gc info", MatchType::Exact)
        || line.check_msg(bytes, "storing new gc info", MatchType::Exact))
    {
        return None;
    }

    let mut parts = Vec::new();
    if let Some(kind) = line.param_extract_i64(bytes, "type") {
        parts.push(format!("type={}", gc_info_type_name(kind)));
    }
    if let Some(state) = line.param_extract_i64(bytes, "state") {
        parts.push(format!("state={}", gc_info_state_name(state)));
    }
    if parts.is_empty() {
        return None;
    }
    Some(format!("group chat info updated: {}", parts.join(", ")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_state_names_cover_known_values() {
        assert_eq!(message_state_name(3), "sent");
        assert_eq!(message_state_name(99), "unknown");
    }
}

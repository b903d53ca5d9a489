//! `@mention` extraction and resolution for comment text.
//!
//! Two token forms are recognised, scanned left to right:
//!
//! - `@"Full Name"`: anything except a double quote between the quotes
//! - `@word`: one or more word characters (letters, digits, `_`)
//!
//! Anything else after an `@` is left as literal text.

use once_cell::sync::Lazy;
use regex::Regex;
use uuid::Uuid;

use crate::models::member::Member;

static MENTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"@"([^"]+)"|@(\w+)"#).expect("valid mention regex"));

/// Every mentioned name in order of appearance, duplicates included.
pub fn extract_mentions(text: &str) -> Vec<&str> {
    MENTION_RE
        .captures_iter(text)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| m.as_str())
        .collect()
}

/// Resolve mentioned names to member ids.
///
/// A name matches a member when it equals the member's full name,
/// ignoring case. One name can match several members. The result is
/// deduplicated and keeps first-seen order.
pub fn resolve_mentions(names: &[&str], members: &[Member]) -> Vec<Uuid> {
    let mut ids = Vec::new();
    for name in names {
        let wanted = name.to_lowercase();
        for member in members {
            if member.name.to_lowercase() == wanted && !ids.contains(&member.id) {
                ids.push(member.id);
            }
        }
    }
    ids
}

/// Extract and resolve in one pass.
pub fn mentioned_member_ids(text: &str, members: &[Member]) -> Vec<Uuid> {
    resolve_mentions(&extract_mentions(text), members)
}

//! Tenant domain model.
//!
//! A tenant is a company. Every other entity is scoped to exactly one
//! tenant through its `tenant_id` field.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An isolated company workspace.
///
/// Name and slug are fixed after creation; the only later mutation is
/// a soft delete.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    pub id: Uuid,
    /// Human-readable name.
    pub name: String,
    /// Lowercase, URL-safe, unique across all tenants.
    pub slug: String,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Fields required to create a new tenant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTenant {
    pub name: String,
    /// Derived from `name` via [`slugify`] when absent.
    pub slug: Option<String>,
}

/// Derive a URL-safe slug from a display name.
///
/// ASCII letters and digits are lowercased and kept; every other run
/// of characters becomes a single `-`. Leading and trailing dashes are
/// trimmed.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

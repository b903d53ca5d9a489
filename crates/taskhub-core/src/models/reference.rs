//! Polymorphic references to other entities.
//!
//! Notifications and activity entries point at "some entity". In memory
//! that is a tagged enum; storage splits it into a `(type, id)` column
//! pair via [`EntityRef::kind`] / [`EntityRef::from_parts`].

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "type", content = "id")]
pub enum EntityRef {
    Task(Uuid),
    Comment(Uuid),
    Project(Uuid),
    Member(Uuid),
}

impl EntityRef {
    /// The type tag stored alongside the id.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Task(_) => "Task",
            Self::Comment(_) => "Comment",
            Self::Project(_) => "Project",
            Self::Member(_) => "Member",
        }
    }

    pub fn id(&self) -> Uuid {
        match *self {
            Self::Task(id) | Self::Comment(id) | Self::Project(id) | Self::Member(id) => id,
        }
    }

    /// Rebuild a reference from its storage columns. Unknown tags yield `None`.
    pub fn from_parts(kind: &str, id: Uuid) -> Option<Self> {
        match kind {
            "Task" => Some(Self::Task(id)),
            "Comment" => Some(Self::Comment(id)),
            "Project" => Some(Self::Project(id)),
            "Member" => Some(Self::Member(id)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parts_round_trip() {
        let id = Uuid::new_v4();
        for r in [
            EntityRef::Task(id),
            EntityRef::Comment(id),
            EntityRef::Project(id),
            EntityRef::Member(id),
        ] {
            assert_eq!(EntityRef::from_parts(r.kind(), r.id()), Some(r));
        }
    }

    #[test]
    fn unknown_kind_is_rejected() {
        assert_eq!(EntityRef::from_parts("Invoice", Uuid::new_v4()), None);
    }
}

//! References between records
//!
//! A reference is either just the target's identifier or the resolved target
//! itself. On the wire the first form is the id string and the second the
//! embedded object.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::id::ObjectId;

/// Anything addressable by an [`ObjectId`]
pub trait Identified {
    fn id(&self) -> ObjectId;
}

/// Reference to another record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Ref<T> {
    /// Only the identifier is known
    Unresolved(ObjectId),
    /// The referenced record has been loaded
    Resolved(T),
}

impl<T: Identified> Ref<T> {
    /// Identifier of the referenced record, whichever form this is in
    pub fn id(&self) -> ObjectId {
        match self {
            Ref::Unresolved(id) => *id,
            Ref::Resolved(target) => target.id(),
        }
    }

    /// The resolved record, if loaded
    pub fn resolved(&self) -> Option<&T> {
        match self {
            Ref::Unresolved(_) => None,
            Ref::Resolved(target) => Some(target),
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Ref::Resolved(_))
    }

    /// Swap in the loaded record when `loaded` has it; otherwise keep as is
    pub fn resolve_from(self, loaded: &HashMap<ObjectId, T>) -> Self
    where
        T: Clone,
    {
        match self {
            Ref::Unresolved(id) => match loaded.get(&id) {
                Some(target) => Ref::Resolved(target.clone()),
                None => Ref::Unresolved(id),
            },
            resolved => resolved,
        }
    }

    /// Drop back to the bare identifier
    pub fn unresolve(self) -> Self {
        Ref::Unresolved(self.id())
    }
}

impl<T> From<ObjectId> for Ref<T> {
    fn from(id: ObjectId) -> Self {
        Ref::Unresolved(id)
    }
}

/// Index records by id for use with [`Ref::resolve_from`]
pub fn index_by_id<T: Identified>(items: impl IntoIterator<Item = T>) -> HashMap<ObjectId, T> {
    items.into_iter().map(|item| (item.id(), item)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Target {
        #[serde(rename = "_id")]
        id: ObjectId,
        name: String,
    }

    impl Identified for Target {
        fn id(&self) -> ObjectId {
            self.id
        }
    }

    #[test]
    fn test_id_is_available_in_both_forms() {
        let target = Target {
            id: ObjectId::new(),
            name: "Leo".into(),
        };
        let unresolved: Ref<Target> = Ref::Unresolved(target.id);
        let resolved = Ref::Resolved(target.clone());

        assert_eq!(unresolved.id(), resolved.id());
        assert!(!unresolved.is_resolved());
        assert_eq!(resolved.resolved(), Some(&target));
    }

    #[test]
    fn test_resolve_from_index() {
        let target = Target {
            id: ObjectId::new(),
            name: "Basil".into(),
        };
        let missing: Ref<Target> = Ref::Unresolved(ObjectId::new());
        let index = index_by_id(vec![target.clone()]);

        let resolved = Ref::<Target>::Unresolved(target.id).resolve_from(&index);
        assert_eq!(resolved, Ref::Resolved(target));

        let still_missing = missing.clone().resolve_from(&index);
        assert_eq!(still_missing, missing);
    }

    #[test]
    fn test_wire_forms() {
        let id = ObjectId::new();
        let unresolved: Ref<Target> = Ref::Unresolved(id);
        assert_eq!(serde_json::to_value(&unresolved).unwrap(), json!(id.to_string()));

        let resolved = Ref::Resolved(Target {
            id,
            name: "Jewel".into(),
        });
        let value = serde_json::to_value(&resolved).unwrap();
        assert_eq!(value["_id"], json!(id.to_string()));
        assert_eq!(value["name"], "Jewel");

        let back: Ref<Target> = serde_json::from_value(value).unwrap();
        assert!(back.is_resolved());
        let back: Ref<Target> = serde_json::from_value(json!(id.to_string())).unwrap();
        assert_eq!(back, Ref::Unresolved(id));
    }
}

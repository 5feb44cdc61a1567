//! Secrets and their revisions.

use std::collections::BTreeMap;

use crate::model::{Collection, Entity, EntityKind, SecretId};
use crate::util::Timestamp;

/// Owner value for secrets owned by the model itself.
pub const MODEL_SECRET_OWNER: &str = "model";

#[derive(Debug, Clone, PartialEq)]
pub struct Secret {
    pub id: SecretId,
    pub description: String,
    pub label: String,
    pub rotate_policy: String,
    /// `model`, an application name or a unit name.
    pub owner: String,
    pub create_time: Timestamp,
    pub update_time: Timestamp,
    pub next_rotate_time: Option<Timestamp>,
    pub auto_prune: bool,
    pub(crate) revisions: Collection<SecretRevision>,
}

impl Entity for Secret {
    const KIND: EntityKind = EntityKind::Secret;
    const LATEST_VERSION: u32 = 2;
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SecretArgs {
    pub id: SecretId,
    pub description: String,
    pub label: String,
    pub rotate_policy: String,
    pub owner: String,
    pub create_time: Timestamp,
    pub update_time: Timestamp,
    pub next_rotate_time: Option<Timestamp>,
    pub auto_prune: bool,
}

impl Secret {
    pub fn new(args: SecretArgs) -> Self {
        Self {
            id: args.id,
            description: args.description,
            label: args.label,
            rotate_policy: args.rotate_policy,
            owner: args.owner,
            create_time: args.create_time,
            update_time: args.update_time,
            next_rotate_time: args.next_rotate_time,
            auto_prune: args.auto_prune,
            revisions: Collection::new(),
        }
    }

    pub fn revisions(&self) -> &Collection<SecretRevision> {
        &self.revisions
    }

    pub fn add_revision(&mut self, args: SecretRevisionArgs) -> &mut SecretRevision {
        self.revisions.push(SecretRevision::new(args))
    }

    /// The highest-numbered revision.
    pub fn latest_revision(&self) -> Option<&SecretRevision> {
        self.revisions.iter().max_by_key(|r| r.number)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretRevision {
    pub number: i64,
    pub create_time: Timestamp,
    pub update_time: Timestamp,
    pub obsolete: bool,
    pub pending_delete: bool,
    /// Inline content; empty when held by an external backend.
    pub content: BTreeMap<String, String>,
    pub expire_time: Option<Timestamp>,
    pub backend_id: Option<String>,
}

impl Entity for SecretRevision {
    const KIND: EntityKind = EntityKind::SecretRevision;
    const LATEST_VERSION: u32 = 2;
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SecretRevisionArgs {
    pub number: i64,
    pub create_time: Timestamp,
    pub update_time: Timestamp,
    pub obsolete: bool,
    pub pending_delete: bool,
    pub content: BTreeMap<String, String>,
    pub expire_time: Option<Timestamp>,
    pub backend_id: Option<String>,
}

impl SecretRevision {
    pub fn new(args: SecretRevisionArgs) -> Self {
        Self {
            number: args.number,
            create_time: args.create_time,
            update_time: args.update_time,
            obsolete: args.obsolete,
            pending_delete: args.pending_delete,
            content: args.content,
            expire_time: args.expire_time,
            backend_id: args.backend_id,
        }
    }
}

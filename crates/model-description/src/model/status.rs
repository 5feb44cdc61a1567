//! Entity status.

use std::collections::BTreeMap;

use crate::codec::Document;
use crate::model::{Entity, EntityKind};
use crate::util::Timestamp;

/// Status of an application, unit, machine, relation or storage entity.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Status {
    /// Status value, e.g. `active`, `blocked`, `started`.
    pub value: String,
    pub message: String,
    /// Free-form status data.
    pub data: BTreeMap<String, Document>,
    pub updated: Timestamp,
    /// The status was synthesized and never set by an agent.
    pub never_set: bool,
}

impl Entity for Status {
    const KIND: EntityKind = EntityKind::Status;
    const LATEST_VERSION: u32 = 2;
}

/// Arguments for [`Status::new`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StatusArgs {
    pub value: String,
    pub message: String,
    pub data: BTreeMap<String, Document>,
    pub updated: Timestamp,
    pub never_set: bool,
}

impl Status {
    pub fn new(args: StatusArgs) -> Self {
        Self {
            value: args.value,
            message: args.message,
            data: args.data,
            updated: args.updated,
            never_set: args.never_set,
        }
    }

    /// A status with just a value and update time.
    pub fn simple(value: impl Into<String>, updated: Timestamp) -> Self {
        Self::new(StatusArgs {
            value: value.into(),
            updated,
            ..Default::default()
        })
    }
}

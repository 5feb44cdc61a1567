//! Versioned model descriptions: decode, migrate, validate and encode.
//!
//! A model description is a nested document that captures a deployment:
//! machines, applications and their units, relations, network spaces,
//! storage, secrets and the cloud credential. Every entity collection in the
//! document carries its own schema `version`, and documents written by older
//! producers use older schemas.
//!
//! # Overview
//!
//! Decoding proceeds in three steps:
//! - **Dispatch**: each collection's `version` selects a schema from the
//!   kind's version history
//! - **Coercion**: fields are checked against the schema, with defaults
//!   filled in for fields that older versions lacked
//! - **Migration**: legacy shapes (series names, flat attachment hosts,
//!   certificate credentials) are rewritten into the current model
//!
//! The result is a version-independent [`Model`] graph. [`validate`] checks
//! the invariants that span entities, and encoding always writes the latest
//! version of every kind.
//!
//! # Quick Start
//!
//! ```rust
//! use model_description::codec::{export_model, import_model, DecodeOptions, EncodeOptions};
//! use model_description::model::{ApplicationArgs, MachineArgs, ModelBuilder, UnitArgs};
//!
//! let model = ModelBuilder::new("admin")
//!     .uuid("bd3fae18-5ea1-4bc5-8837-45400cf1f8f6")
//!     .machine(
//!         MachineArgs {
//!             id: "0".into(),
//!             jobs: vec!["host-units".to_string()],
//!             ..Default::default()
//!         },
//!         |m| m,
//!     )
//!     .application(
//!         ApplicationArgs {
//!             name: "mysql".into(),
//!             ..Default::default()
//!         },
//!         |a| {
//!             a.unit(UnitArgs {
//!                 name: "mysql/0".into(),
//!                 machine: Some("0".into()),
//!                 ..Default::default()
//!             })
//!             .leader("mysql/0")
//!         },
//!     )
//!     .build();
//!
//! let text = export_model(&model, &EncodeOptions::new())?;
//! let decoded = import_model(&text, &DecodeOptions::new())?;
//! assert_eq!(decoded, model);
//! # Ok::<(), model_description::ImportError>(())
//! ```
//!
//! # Modules
//!
//! - [`model`]: Entity types, typed identifiers and the [`ModelBuilder`]
//! - [`codec`]: Version histories, per-kind decoders/encoders and migrations
//! - [`validate`]: Cross-entity graph validation
//! - [`error`]: Error types with decode context paths
//! - [`limits`]: Bounds applied to untrusted input
//!
//! # Security
//!
//! Decoding untrusted input is bounded:
//! - Document text size and nesting depth are capped
//! - Collection lengths are capped before any entity is built
//! - Every failure names the path to the offending field

pub mod codec;
pub mod error;
pub mod limits;
pub mod model;
pub mod util;
pub mod validate;

#[cfg(test)]
mod testing;

// Re-export commonly used types at crate root
pub use codec::{
    decode_model, encode_model, export_model, import_model, DecodeOptions, Document,
    EncodeOptions, Registry,
};
pub use error::{
    ContextFrame, DecodeError, DecodeErrorKind, ImportError, MigrationError, ShapeError,
    ValidationError, ValidationReason, VersionError,
};
pub use model::{Entity, EntityKind, Model, ModelBuilder, ModelType};
pub use util::Timestamp;
pub use validate::{validate, validate_all, ModelIndex};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

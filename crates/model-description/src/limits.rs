//! Bounds applied while reading untrusted documents.

/// Maximum nesting depth of a document (lists and mappings).
pub const MAX_NESTING_DEPTH: usize = 64;

/// Maximum number of entities in a single versioned collection.
pub const MAX_COLLECTION_LEN: usize = 1_000_000;

/// Maximum size in bytes of a document's text form.
pub const MAX_DOCUMENT_SIZE: usize = 64 * 1024 * 1024;

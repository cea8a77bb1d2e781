//! TigerStyle Constants
//!
//! Every limit in the engine and store is named here, with units in the name.

// =============================================================================
// Documents
// =============================================================================

/// Maximum size of a request document in bytes.
pub const DOCUMENT_BYTES_MAX: usize = 64 * 1024;

/// Maximum nesting depth of field selections (root fields are depth 1).
pub const SELECTION_DEPTH_MAX: usize = 12;

/// Maximum number of variables accepted with a request.
pub const VARIABLES_COUNT_MAX: usize = 64;

// =============================================================================
// Entities
// =============================================================================

/// Maximum identifier length in bytes.
pub const ENTITY_ID_BYTES_MAX: usize = 64;

/// Maximum user name length in bytes.
pub const USER_NAME_BYTES_MAX: usize = 256;

/// Maximum email length in bytes.
pub const USER_EMAIL_BYTES_MAX: usize = 320;

/// Maximum post title length in bytes.
pub const POST_TITLE_BYTES_MAX: usize = 512;

/// Maximum post body length in bytes.
pub const POST_BODY_BYTES_MAX: usize = 64 * 1024;

/// Maximum comment text length in bytes.
pub const COMMENT_TEXT_BYTES_MAX: usize = 8 * 1024;

/// Maximum search string length in bytes.
pub const SEARCH_QUERY_BYTES_MAX: usize = 256;

// =============================================================================
// DST
// =============================================================================

/// Environment variable holding the simulation seed.
pub const DST_SEED_ENV: &str = "DST_SEED";

/// Upper bound for a fault probability.
pub const DST_FAULT_PROBABILITY_MAX: f64 = 1.0;

/// Pause applied by a slow-write fault, in milliseconds.
pub const DST_WRITE_DELAY_MS: u64 = 50;

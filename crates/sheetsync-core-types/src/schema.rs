//! Canonical schema constants for structured logging and events
//!
//! These constants ensure consistency across all logging and error reporting.

// Canonical field keys for structured logging
pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";
pub const FIELD_SYNC_ID: &str = "sync_id";

// Cache identifiers
pub const FIELD_REPO: &str = "repo";
pub const FIELD_LOCK_REF: &str = "lock_ref";
pub const FIELD_REVISION: &str = "revision";
pub const FIELD_SHEET: &str = "sheet";

// Wait loop
pub const FIELD_ATTEMPT: &str = "attempt";
pub const FIELD_AGE_SECS: &str = "age_secs";

// Error fields
pub const FIELD_ERR_KIND: &str = "err.kind";
pub const FIELD_ERR_CODE: &str = "err.code";

// Canonical event names
pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";

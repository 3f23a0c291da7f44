//! Structured logging field name constants.
//!
//! All crates use these names for `tracing` fields so log aggregation can
//! query every subsystem the same way.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Service cannot continue (startup failures) |
//! | WARN  | Store failure reported back to the caller |
//! | INFO  | Lifecycle events (startup, shutdown), accepted entries, validation rejections |
//! | DEBUG | Query construction, per-operation outcomes |
//! | TRACE | Per-item iteration (per-uuid deletes) |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "api", "gateway", "db"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "rpc", "pool", "entry_store", "memory_store"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "add", "update", "delete", "cleanup", "stats", "search"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Caller-supplied user identifier (collection key).
pub const USER_ID: &str = "user_id";

/// Entry UUID being operated on.
pub const ENTRY_UUID: &str = "entry_uuid";

/// Entry type (pim, bookmark, org).
pub const ENTRY_TYPE: &str = "entry_type";

/// JSON-RPC method name.
pub const RPC_METHOD: &str = "rpc_method";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of entries returned by a search.
pub const RESULT_COUNT: &str = "result_count";

/// Number of entries removed.
pub const DELETED_COUNT: &str = "deleted_count";

/// Number of identifiers requested for deletion.
pub const REQUESTED_COUNT: &str = "requested_count";

// ─── Database fields ───────────────────────────────────────────────────────

/// Number of active connections in the pool.
pub const POOL_SIZE: &str = "pool_size";

/// Number of idle connections in the pool.
pub const POOL_IDLE: &str = "pool_idle";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";

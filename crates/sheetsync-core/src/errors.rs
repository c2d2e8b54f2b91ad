use sheetsync_core_types::SyncId;
use thiserror::Error;

/// Result type alias using SheetSyncError
pub type Result<T> = std::result::Result<T, SheetSyncError>;

// ========== Error Facility ==========

/// Who gets to see an error
///
/// Visible errors are shown to the end caller verbatim (a student looking up
/// their record). Internal errors are logged and replaced by a generic
/// "contact staff" message at the UI boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Visible,
    Internal,
}

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code for programmatic handling,
/// test assertions and structured log fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Caller-facing
    InvalidInput,
    NotFound,
    /// The published snapshot never became fresh within the wait budget
    Timeout,

    // Configuration / credentials
    InvalidConfig,
    Unauthorised,

    // Integration/IO
    Io,
    Serialization,
    /// A shared-store command (fetch, commit, push) failed
    Persistence,
    /// The authoritative dataset source returned an error or an unexpected shape
    ExternalService,
    /// The dataset source refused the request for quota reasons
    ResourceExhausted,
    /// Another local caller held the working copy for too long
    Concurrency,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::Timeout => "ERR_TIMEOUT",
            ExErrorKind::InvalidConfig => "ERR_INVALID_CONFIG",
            ExErrorKind::Unauthorised => "ERR_UNAUTHORISED",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Persistence => "ERR_PERSISTENCE",
            ExErrorKind::ExternalService => "ERR_EXTERNAL_SERVICE",
            ExErrorKind::ResourceExhausted => "ERR_RESOURCE_EXHAUSTED",
            ExErrorKind::Concurrency => "ERR_CONCURRENCY",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }

    /// Classify this kind as user-visible or internal
    pub fn class(&self) -> ErrorClass {
        match self {
            ExErrorKind::InvalidInput | ExErrorKind::NotFound | ExErrorKind::Timeout => {
                ErrorClass::Visible
            }
            _ => ErrorClass::Internal,
        }
    }
}

/// Canonical structured error type
///
/// Carries a classification kind plus the context needed to debug a failed
/// sync from logs alone: the operation, the sheet and key involved, and
/// the sync round.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    sheet: Option<String>,
    key: Option<String>,
    sync_id: Option<SyncId>,
    message: String,
    source: Option<Box<ExError>>,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            sheet: None,
            key: None,
            sync_id: None,
            message: String::new(),
            source: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add sheet context
    pub fn with_sheet(mut self, sheet: impl Into<String>) -> Self {
        self.sheet = Some(sheet.into());
        self
    }

    /// Add lookup key context
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Add sync round context
    pub fn with_sync_id(mut self, sync_id: SyncId) -> Self {
        self.sync_id = Some(sync_id);
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Add source error
    pub fn with_source(mut self, source: ExError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn class(&self) -> ErrorClass {
        self.kind.class()
    }

    /// True if the message may be shown to the end caller
    pub fn is_user_visible(&self) -> bool {
        self.class() == ErrorClass::Visible
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn sheet(&self) -> Option<&str> {
        self.sheet.as_deref()
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn sync_id(&self) -> Option<&SyncId> {
        self.sync_id.as_ref()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the source error, if any
    pub fn source_error(&self) -> Option<&ExError> {
        self.source.as_deref()
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(sheet) = &self.sheet {
            write!(f, " (sheet: {})", sheet)?;
        }
        if let Some(key) = &self.key {
            write!(f, " (key: {})", key)?;
        }
        if let Some(source) = &self.source {
            write!(f, "; caused by {}", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

// ========== End Error Facility ==========

/// Domain error taxonomy for cache operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SheetSyncError {
    // ===== Caller-facing =====
    /// No row matched the lookup key
    #[error("No row in sheet {sheet} has {key_column} = {key}")]
    RecordNotFound {
        sheet: String,
        key_column: String,
        key: String,
    },

    /// The snapshot has no table-file for the sheet
    #[error("Sheet not found in snapshot: {sheet}")]
    SheetNotFound { sheet: String },

    /// The sheet title cannot be used as a table-file name
    #[error("Invalid sheet name: {name:?}")]
    InvalidSheetName { name: String },

    /// The waiter ran out of attempts without seeing a fresh revision
    #[error(
        "The shared cache was not refreshed after {attempts} checks \
         (freshness window {window_secs}s). Please contact course staff."
    )]
    RefreshTimedOut { attempts: u32, window_secs: u64 },

    // ===== Shared store =====
    /// A git command exited unsuccessfully
    #[error("git {args} failed ({status}): {stderr}")]
    GitCommand {
        args: String,
        status: String,
        stderr: String,
    },

    /// Another caller on this host kept the working copy leased too long
    #[error("Working copy {path} stayed leased for {waited_secs}s")]
    LeaseTimeout { path: String, waited_secs: u64 },

    // ===== Dataset source =====
    /// The dataset API failed or returned something unexpected
    #[error("Dataset source error in {op}: {message}")]
    Source { op: String, message: String },

    /// The dataset API rejected the request for quota reasons
    #[error("Dataset source exhausted in {op}: {message}")]
    ResourceExhausted { op: String, message: String },

    /// Credential file missing or unusable
    #[error("Credential error: {reason}")]
    Credential { reason: String },

    // ===== Configuration =====
    #[error("Invalid configuration: {reason}")]
    Config { reason: String },

    // ===== Local I/O =====
    #[error("I/O error in {op}: {message}")]
    Io { op: String, message: String },

    /// A table-file could not be encoded or decoded
    #[error("Table-file error for sheet {sheet}: {reason}")]
    Table { sheet: String, reason: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

impl SheetSyncError {
    /// Build an I/O error for the given operation
    pub fn io(op: &str, err: &std::io::Error) -> Self {
        SheetSyncError::Io {
            op: op.to_string(),
            message: err.to_string(),
        }
    }
}

/// Conversion from SheetSyncError to ExError
impl From<SheetSyncError> for ExError {
    fn from(err: SheetSyncError) -> Self {
        let message = err.to_string();
        match err {
            SheetSyncError::RecordNotFound {
                sheet,
                key_column,
                key,
            } => ExError::new(ExErrorKind::NotFound)
                .with_op("lookup")
                .with_sheet(sheet)
                .with_key(format!("{}={}", key_column, key))
                .with_message(message),

            SheetSyncError::SheetNotFound { sheet } => ExError::new(ExErrorKind::NotFound)
                .with_op("read_table")
                .with_sheet(sheet)
                .with_message(message),

            SheetSyncError::InvalidSheetName { name } => ExError::new(ExErrorKind::InvalidInput)
                .with_sheet(name)
                .with_message(message),

            SheetSyncError::RefreshTimedOut { .. } => ExError::new(ExErrorKind::Timeout)
                .with_op("wait_for_fresh")
                .with_message(message),

            SheetSyncError::GitCommand { .. } => ExError::new(ExErrorKind::Persistence)
                .with_op("git")
                .with_message(message),

            SheetSyncError::LeaseTimeout { .. } => ExError::new(ExErrorKind::Concurrency)
                .with_op("lease")
                .with_message(message),

            SheetSyncError::Source { op, .. } => ExError::new(ExErrorKind::ExternalService)
                .with_op(op)
                .with_message(message),

            SheetSyncError::ResourceExhausted { op, .. } => {
                ExError::new(ExErrorKind::ResourceExhausted)
                    .with_op(op)
                    .with_message(message)
            }

            SheetSyncError::Credential { .. } => {
                ExError::new(ExErrorKind::Unauthorised).with_message(message)
            }

            SheetSyncError::Config { .. } => {
                ExError::new(ExErrorKind::InvalidConfig).with_message(message)
            }

            SheetSyncError::Io { op, .. } => ExError::new(ExErrorKind::Io)
                .with_op(op)
                .with_message(message),

            SheetSyncError::Table { sheet, .. } => ExError::new(ExErrorKind::Serialization)
                .with_sheet(sheet)
                .with_message(message),

            SheetSyncError::Serialization { .. } => {
                ExError::new(ExErrorKind::Serialization).with_message(message)
            }
        }
    }
}

/// Conversion from serde_json::Error to SheetSyncError
impl From<serde_json::Error> for SheetSyncError {
    fn from(err: serde_json::Error) -> Self {
        SheetSyncError::Serialization {
            message: err.to_string(),
        }
    }
}

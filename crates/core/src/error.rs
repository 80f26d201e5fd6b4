/// Errors raised by the MDR core.
///
/// The first group of variants are domain errors that carry a client-facing message and map
/// onto a named error `type` in API payloads (see [`MdrError::error_type`]). Everything else is
/// an infrastructure failure and is reported to clients as an internal error.
#[derive(Debug, thiserror::Error)]
pub enum MdrError {
    #[error("{0}")]
    BusinessLogic(String),
    #[error("{0}")]
    AlreadyExists(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{msg}")]
    Versioning {
        msg: String,
        code: Option<&'static str>,
    },
    #[error("{0}")]
    Validation(String),

    #[error("failed to create storage directory: {0}")]
    StorageDirCreation(std::io::Error),
    #[error("failed to create item directory: {0}")]
    ItemDirCreation(std::io::Error),
    #[error(
        "initialise failed and cleanup also failed (path: {path}): init={init_error}; cleanup={cleanup_error}",
        path = path.display()
    )]
    CleanupAfterInitialiseFailed {
        path: std::path::PathBuf,
        #[source]
        init_error: Box<MdrError>,
        cleanup_error: std::io::Error,
    },
    #[error("failed to write file: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to read file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to serialize JSON: {0}")]
    Serialization(serde_json::Error),
    #[error("failed to serialize YAML: {0}")]
    YamlSerialization(serde_yaml::Error),
    #[error("failed to deserialize YAML: {0}")]
    YamlDeserialization(String),
    #[error("stored metadata is corrupt: {0}")]
    CorruptMetadata(String),

    #[error("failed to initialise git repository: {0}")]
    GitInit(git2::Error),
    #[error("failed to open git repository: {0}")]
    GitOpen(git2::Error),
    #[error("failed to access git index: {0}")]
    GitIndex(git2::Error),
    #[error("failed to add file to git index: {0}")]
    GitAdd(git2::Error),
    #[error("failed to write git tree: {0}")]
    GitWriteTree(git2::Error),
    #[error("failed to find git tree: {0}")]
    GitFindTree(git2::Error),
    #[error("failed to create git signature: {0}")]
    GitSignature(git2::Error),
    #[error("failed to create git commit: {0}")]
    GitCommit(git2::Error),
    #[error("failed to get git head: {0}")]
    GitHead(git2::Error),
    #[error("failed to set git head: {0}")]
    GitSetHead(git2::Error),
    #[error("failed to peel git commit: {0}")]
    GitPeel(git2::Error),
    #[error("failed to walk git history: {0}")]
    GitRevwalk(git2::Error),
    #[error("failed to read git object: {0}")]
    GitRead(git2::Error),
}

impl MdrError {
    pub fn versioning(msg: impl Into<String>) -> Self {
        Self::Versioning {
            msg: msg.into(),
            code: None,
        }
    }

    pub fn versioning_with_code(msg: impl Into<String>, code: &'static str) -> Self {
        Self::Versioning {
            msg: msg.into(),
            code: Some(code),
        }
    }

    /// Name of the error type reported in API error payloads.
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::BusinessLogic(_) => "BusinessLogicException",
            Self::AlreadyExists(_) => "AlreadyExistsException",
            Self::NotFound(_) => "NotFoundException",
            Self::Versioning { .. } => "VersioningException",
            Self::Validation(_) => "ValidationException",
            _ => "InternalServerError",
        }
    }

    /// Machine-readable sub-code, currently only set on versioning errors.
    pub fn code(&self) -> Option<&'static str> {
        match self {
            Self::Versioning { code, .. } => *code,
            _ => None,
        }
    }

    /// True for failures of the storage layer rather than of the request.
    pub fn is_internal(&self) -> bool {
        self.error_type() == "InternalServerError"
    }
}

pub type MdrResult<T> = std::result::Result<T, MdrError>;

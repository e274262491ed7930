use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("Upstream returned HTTP {status} for {url}")]
    UpstreamStatus { url: String, status: u16 },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Malformed upstream record: {message}")]
    MalformedRecord { message: String },

    #[error("Document store error: {0}")]
    StoreError(#[from] mongodb::error::Error),

    #[error("BSON conversion error: {0}")]
    BsonError(#[from] mongodb::bson::ser::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration value: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid configuration value for {field} ('{value}'): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Region '{name}' not found in upstream code list")]
    RegionNotFound { name: String },

    #[error("Region '{name}' is ambiguous: {matches} code list entries match")]
    AmbiguousRegion { name: String, matches: usize },

    #[error("Collection not recognized: {name}")]
    UnknownCollection { name: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl ErrorSeverity {
    /// 程式結束碼：2 可重試，1 資料問題，3 設定或系統錯誤
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

impl SyncError {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            SyncError::ApiError(_) | SyncError::UpstreamStatus { .. } => ErrorSeverity::Medium,
            SyncError::StoreError(_) => ErrorSeverity::Medium,
            SyncError::MalformedRecord { .. }
            | SyncError::SerializationError(_)
            | SyncError::BsonError(_) => ErrorSeverity::High,
            SyncError::RegionNotFound { .. } | SyncError::AmbiguousRegion { .. } => {
                ErrorSeverity::High
            }
            SyncError::ConfigError { .. }
            | SyncError::MissingConfigError { .. }
            | SyncError::InvalidConfigValueError { .. }
            | SyncError::UnknownCollection { .. }
            | SyncError::IoError(_) => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            SyncError::ApiError(_) | SyncError::UpstreamStatus { .. } => {
                "The upstream catalog may be unavailable; re-run the sync later"
            }
            SyncError::StoreError(_) => {
                "Check the MongoDB connection settings and that the database is reachable"
            }
            SyncError::MalformedRecord { .. }
            | SyncError::SerializationError(_)
            | SyncError::BsonError(_) => {
                "The upstream response shape changed; inspect the logged record"
            }
            SyncError::RegionNotFound { .. } | SyncError::AmbiguousRegion { .. } => {
                "Check the configured province name against the upstream code list"
            }
            SyncError::ConfigError { .. }
            | SyncError::MissingConfigError { .. }
            | SyncError::InvalidConfigValueError { .. }
            | SyncError::IoError(_) => "Fix the configuration and run again",
            SyncError::UnknownCollection { .. } => {
                "Use one of: services, channels, municipalities"
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;

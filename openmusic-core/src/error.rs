//! Error types for OpenMusic operations

use crate::EntityType;
use thiserror::Error;

/// Store (source of truth) errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: EntityType, id: String },

    #[error("Insert failed for {entity_type}: {reason}")]
    InsertFailed { entity_type: EntityType, reason: String },

    #[error("Constraint violation on {constraint}: {reason}")]
    ConstraintViolation { constraint: String, reason: String },

    #[error("Like toggle for album {album_id} and user {user_id} raced a concurrent toggle")]
    ToggleConflict { album_id: String, user_id: String },

    #[error("Store unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// Cache store errors. Never surfaced by repository operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("Cache unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Cache operation on {key} timed out")]
    Timeout { key: String },

    #[error("Cached value under {key} could not be decoded: {reason}")]
    Decode { key: String, reason: String },

    #[error("Value for {key} could not be encoded: {reason}")]
    Encode { key: String, reason: String },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Failed to initialize {component}: {reason}")]
    InitFailed { component: String, reason: String },
}

/// Coarse classification callers use to pick a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    InvariantViolation,
    StoreUnavailable,
    CacheUnavailable,
    Config,
}

/// Master error type for all OpenMusic errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OpenMusicError {
    #[error("{entity_type} not found: {id}")]
    NotFound { entity_type: EntityType, id: String },

    #[error("Invariant violation: {reason}")]
    InvariantViolation { reason: String },

    #[error("Store unavailable: {reason}")]
    StoreUnavailable { reason: String },

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

impl OpenMusicError {
    pub fn not_found(entity_type: EntityType, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    pub fn invariant(reason: impl Into<String>) -> Self {
        Self::InvariantViolation {
            reason: reason.into(),
        }
    }

    pub fn store_unavailable(reason: impl Into<String>) -> Self {
        Self::StoreUnavailable {
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::InvariantViolation { .. } => ErrorKind::InvariantViolation,
            Self::StoreUnavailable { .. } => ErrorKind::StoreUnavailable,
            Self::Cache(_) => ErrorKind::CacheUnavailable,
            Self::Config(_) => ErrorKind::Config,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

impl From<StorageError> for OpenMusicError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound { entity_type, id } => Self::NotFound { entity_type, id },
            StorageError::InsertFailed { .. }
            | StorageError::ConstraintViolation { .. }
            | StorageError::ToggleConflict { .. } => Self::InvariantViolation {
                reason: err.to_string(),
            },
            StorageError::Unavailable { .. } | StorageError::LockPoisoned => {
                Self::StoreUnavailable {
                    reason: err.to_string(),
                }
            }
        }
    }
}

/// Result type alias for OpenMusic operations.
pub type OpenMusicResult<T> = Result<T, OpenMusicError>;

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_not_found_maps_to_not_found() {
        let err: OpenMusicError = StorageError::NotFound {
            entity_type: EntityType::Album,
            id: "album-1".to_string(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.to_string(), "Album not found: album-1");
    }

    #[test]
    fn test_constraint_violation_maps_to_invariant() {
        let err: OpenMusicError = StorageError::ConstraintViolation {
            constraint: "user_album_likes_album_id_user_id_key".to_string(),
            reason: "duplicate key".to_string(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::InvariantViolation);
        assert!(err.to_string().contains("user_album_likes_album_id_user_id_key"));
    }

    #[test]
    fn test_toggle_conflict_maps_to_invariant() {
        let err: OpenMusicError = StorageError::ToggleConflict {
            album_id: "album-1".to_string(),
            user_id: "user-1".to_string(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::InvariantViolation);
    }

    #[test]
    fn test_lock_poisoned_maps_to_store_unavailable() {
        let err: OpenMusicError = StorageError::LockPoisoned.into();
        assert_eq!(err.kind(), ErrorKind::StoreUnavailable);
    }

    #[test]
    fn test_cache_error_display() {
        let err = CacheError::Decode {
            key: "album:album-1".to_string(),
            reason: "expected value".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("album:album-1"));
        assert!(msg.contains("expected value"));
        assert_eq!(OpenMusicError::from(err).kind(), ErrorKind::CacheUnavailable);
    }

    #[test]
    fn test_config_error_display_invalid_value() {
        let err = ConfigError::InvalidValue {
            field: "PGPORT".to_string(),
            value: "abc".to_string(),
            reason: "must be a port number".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("PGPORT"));
        assert!(msg.contains("abc"));
    }
}

use thiserror::Error;

/// Errors that can arise while operating on a guild economy.
#[derive(Debug, Error)]
pub enum EconomyError {
    /// Wrapper around sled's error type.
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    /// Wrapper around bincode serialization and deserialization errors.
    #[error("serialization error: {0}")]
    Bincode(#[from] bincode::Error),

    /// Wrapper around IO errors (directory creation, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Returned when fetching a guild that is not present.
    #[error("guild not found: {0}")]
    NotFound(String),

    /// Returned when creating a guild that already exists.
    #[error("guild already exists: {0}")]
    GuildExists(String),

    /// Returned when deserializing a record with an unexpected schema version.
    #[error("schema mismatch for {entity}: expected {expected}, got {found}")]
    SchemaMismatch {
        entity: &'static str,
        expected: u8,
        found: u8,
    },

    /// Not enough energy for the requested action. Recoverable; the caller
    /// is expected to offer a purchase, never an automatic retry.
    #[error("insufficient energy: need {required}, have {available}")]
    InsufficientEnergy { required: u32, available: u32 },

    /// Not enough gold for the requested purchase. The purchase is aborted
    /// with no partial debit.
    #[error("insufficient gold: need {required}, have {available}")]
    InsufficientGold { required: u64, available: u64 },

    /// Malformed request amount (zero, negative, or below the minimum
    /// purchase step). Over-capacity requests clamp instead of failing.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// Action identifier missing from the cost table.
    #[error("unknown action: {0}")]
    UnknownAction(String),

    /// The quest already reached its terminal state; the call made no
    /// mutation and charged nothing.
    #[error("quest already completed: {0}")]
    AlreadyCompleted(String),

    /// A competing writer won the conditional write and the bounded retry
    /// budget is exhausted. Safe to retry the whole operation.
    #[error("concurrent modification: conditional write lost after retries")]
    ConcurrentModification,
}

impl EconomyError {
    /// Whether the whole operation is safe and sensible to retry. Business
    /// rejections (energy, gold, amounts) are deliberate outcomes, not
    /// transient faults.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            EconomyError::ConcurrentModification | EconomyError::Sled(_) | EconomyError::Io(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classification() {
        assert!(EconomyError::ConcurrentModification.is_retryable());
        assert!(!EconomyError::InsufficientEnergy {
            required: 10,
            available: 3
        }
        .is_retryable());
        assert!(!EconomyError::AlreadyCompleted("forge_vision".into()).is_retryable());
    }
}

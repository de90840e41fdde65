/// Input rejected before anything is written.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Malformed identifier, expected a '{expected}' id but got '{got}'")]
    MalformedIdentifier { expected: String, got: String },
    #[error("Hours must be between 1 and {max}, got {got}")]
    HoursOutOfRange { got: u32, max: u32 },
    #[error("Listing {0} does not exist")]
    UnknownListing(String),
    #[error("Listing title must not be empty")]
    EmptyTitle,
}

/// Persistence faults. These are never mapped to a business outcome.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("Storage backend failed: {0}")]
    Backend(#[from] sled::Error),
    #[error("Stored record {key} could not be decoded: {reason}")]
    Corrupt { key: String, reason: String },
    #[error("Record could not be encoded: {0}")]
    Encode(String),
    #[error("An entry with id {0} already exists")]
    Duplicate(String),
}

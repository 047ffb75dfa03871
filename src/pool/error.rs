use thiserror::Error;

/// Error types that can occur during code pool operations.
///
/// Validation failures (`NotFound`, `Expired`, `Inactive`) are ordinary
/// result values returned to the caller so it can show a structured reason.
/// `StorageUnavailable` is raised by storage backends but absorbed inside
/// the manager: no code operation propagates a persistence failure.
///
/// # Example
///
/// ```rust
/// use code_pool::{CodePoolManager, PoolError};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let manager = CodePoolManager::builder().build_and_bootstrap().await;
///
/// match manager.validate_code("00000").await {
///     Ok(validation) => println!("valid, {} uses so far", validation.uses),
///     Err(PoolError::NotFound) => println!("unknown code"),
///     Err(PoolError::Expired) => println!("code expired"),
///     Err(PoolError::Inactive) => println!("code retired"),
///     Err(e) => println!("other error: {e}"),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Error, Debug)]
pub enum PoolError {
    /// The code string is unknown to the pool.
    #[error("Code not found")]
    NotFound,

    /// The code exists but is past its `expires_at` timestamp.
    ///
    /// Expiry is exclusive of the current instant: a record whose
    /// `expires_at` equals "now" is already expired.
    #[error("Code expired")]
    Expired,

    /// The code exists and is unexpired, but its status disallows use
    /// (currently only `retiring` records hit this path via status checks
    /// that exclude them).
    #[error("Code inactive")]
    Inactive,

    /// A snapshot import payload was not a well-formed record list.
    #[error("Invalid snapshot format: {0}")]
    InvalidFormat(String),

    /// A storage backend read or write failed.
    ///
    /// The manager catches this internally, logs it, and falls back to its
    /// in-memory state; callers of code operations never see it. It is
    /// public so storage backends can construct it and tests can assert on
    /// backend behavior directly.
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),
}

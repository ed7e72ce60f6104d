//! Result type alias for tree transformation operations

use crate::error::WeftError;

/// Standard Result type for Weft engine operations
pub type Result<T> = std::result::Result<T, WeftError>;

/// Batch-processing conveniences on [`Result`].
///
/// When a pipeline walks many independent trees, a cancellation or a closed
/// scope on one tree should not abort the batch; invariant and contract
/// violations still must. These helpers encode that split once.
pub trait ResultExt<T> {
    /// Downgrade a recoverable error to `Ok(None)`, keeping fatal errors
    fn recoverable(self) -> Result<Option<T>>;

    /// Log any error and yield `None` for it, keeping the batch going
    fn log_and_continue(self) -> Option<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn recoverable(self) -> Result<Option<T>> {
        match self {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.is_recoverable() => {
                tracing::warn!(kind = ?err.kind(), "skipping tree: {err}");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    fn log_and_continue(self) -> Option<T> {
        match &self {
            Err(err) if !err.is_recoverable() => {
                tracing::error!(kind = ?err.kind(), "fatal error: {err}");
            }
            Err(err) => {
                tracing::warn!(kind = ?err.kind(), "skipping tree: {err}");
            }
            Ok(_) => {}
        }
        self.ok()
    }
}

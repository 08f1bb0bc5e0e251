//! Utility macros for the HTTP crate.

/// Returns early with `$error` when `$predicate` does not hold.
///
/// ```text
/// ensure!(!self.writer.is_sent(), SendError::AlreadySent);
/// ```
macro_rules! ensure {
    ($predicate:expr, $error:expr) => {
        if !$predicate {
            return Err($error);
        }
    };
}

pub(crate) use ensure;

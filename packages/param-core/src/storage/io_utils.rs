//! I/O utilities for persistence operations.

use std::io::ErrorKind;

use crate::error::ParamError;

/// Classifies I/O errors into specific ParamError variants.
pub fn classify_io_error(error: std::io::Error, context: &str) -> ParamError {
    match error.kind() {
        ErrorKind::StorageFull | ErrorKind::OutOfMemory => {
            ParamError::DiskFull(format!("{}: {}", context, error))
        }
        ErrorKind::WouldBlock | ErrorKind::TimedOut | ErrorKind::Interrupted => {
            ParamError::TransientIoError(format!("{}: {}", context, error))
        }
        _ => ParamError::IoError(format!("{}: {}", context, error)),
    }
}

/// Retries an operation that may fail with transient I/O errors.
pub fn retry_io_operation<F, T>(
    operation: F,
    max_retries: u32,
    retry_delay_ms: u64,
    context: &str,
) -> Result<T, ParamError>
where
    F: Fn() -> Result<T, ParamError>,
{
    let mut attempt = 0;
    loop {
        match operation() {
            Ok(result) => return Ok(result),
            Err(err @ ParamError::TransientIoError(_)) if attempt < max_retries => {
                attempt += 1;
                tracing::warn!(
                    "Transient I/O error in {} (attempt {}/{}): {}",
                    context,
                    attempt,
                    max_retries,
                    err
                );
                if retry_delay_ms > 0 {
                    std::thread::sleep(std::time::Duration::from_millis(retry_delay_ms));
                }
            }
            Err(err) => return Err(err),
        }
    }
}

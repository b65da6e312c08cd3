//! Centralized validation of run settings.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Highest accepted mean base quality threshold
pub const MAX_QUALITY_VALUE: i64 = 92;

/// Highest accepted mapping quality threshold; 255 means "unavailable"
pub const MAX_QUALITY_MAP: i64 = 254;

#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("Not a regular file: {}", .0.display())]
    NotAFile(PathBuf),
    #[error("Chunk size must be at least 1")]
    InvalidChunkSize,
}

/// Number of threads the host can run in parallel, at least 1
#[must_use]
pub fn hardware_threads() -> usize {
    std::thread::available_parallelism().map_or(1, NonZeroUsize::get)
}

/// Clamp a requested thread count to `[1, available]`.
#[must_use]
pub fn clamp_threads(requested: usize, available: usize) -> usize {
    let clamped = requested.clamp(1, available.max(1));
    if clamped != requested {
        debug!(requested, clamped, "Clamped thread count");
    }
    clamped
}

/// Clamp a quality value threshold to `[0, 92]`.
///
/// # Examples
///
/// ```
/// use motif_count::utils::validation::clamp_quality_value;
///
/// assert_eq!(clamp_quality_value(20), 20);
/// assert_eq!(clamp_quality_value(-3), 0);
/// assert_eq!(clamp_quality_value(120), 92);
/// ```
#[must_use]
pub fn clamp_quality_value(requested: i64) -> u8 {
    clamp_u8("quality value", requested, MAX_QUALITY_VALUE)
}

/// Clamp a mapping quality threshold to `[0, 254]`.
#[must_use]
pub fn clamp_quality_map(requested: i64) -> u8 {
    clamp_u8("mapping quality", requested, MAX_QUALITY_MAP)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn clamp_u8(setting: &str, requested: i64, max: i64) -> u8 {
    let clamped = requested.clamp(0, max);
    if clamped != requested {
        debug!(setting, requested, clamped, "Clamped threshold");
    }
    clamped as u8
}

/// Validate the chunk size
///
/// # Errors
///
/// Returns `ValidationError::InvalidChunkSize` for 0.
pub fn validate_chunk_size(chunk_size: usize) -> Result<usize, ValidationError> {
    if chunk_size == 0 {
        return Err(ValidationError::InvalidChunkSize);
    }
    Ok(chunk_size)
}

/// Check that `path` names an existing regular file
///
/// # Errors
///
/// Returns `ValidationError::NotFound` or `ValidationError::NotAFile`.
pub fn validate_input_file(path: &Path) -> Result<(), ValidationError> {
    if !path.exists() {
        return Err(ValidationError::NotFound(path.to_path_buf()));
    }
    if !path.is_file() {
        return Err(ValidationError::NotAFile(path.to_path_buf()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_clamp_threads() {
        assert_eq!(clamp_threads(0, 8), 1);
        assert_eq!(clamp_threads(4, 8), 4);
        assert_eq!(clamp_threads(64, 8), 8);
        assert_eq!(clamp_threads(3, 0), 1);
        assert!(hardware_threads() >= 1);
    }

    #[test]
    fn test_clamp_quality() {
        assert_eq!(clamp_quality_value(-1), 0);
        assert_eq!(clamp_quality_value(92), 92);
        assert_eq!(clamp_quality_value(93), 92);

        assert_eq!(clamp_quality_map(-10), 0);
        assert_eq!(clamp_quality_map(30), 30);
        assert_eq!(clamp_quality_map(255), 254);
        assert_eq!(clamp_quality_map(i64::MAX), 254);
    }

    #[test]
    fn test_validate_chunk_size() {
        assert!(matches!(
            validate_chunk_size(0),
            Err(ValidationError::InvalidChunkSize)
        ));
        assert_eq!(validate_chunk_size(1).unwrap(), 1);
    }

    #[test]
    fn test_validate_input_file() {
        let temp = NamedTempFile::new().unwrap();
        assert!(validate_input_file(temp.path()).is_ok());

        assert!(matches!(
            validate_input_file(Path::new("/nonexistent/input.fq")),
            Err(ValidationError::NotFound(_))
        ));

        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            validate_input_file(dir.path()),
            Err(ValidationError::NotAFile(_))
        ));
    }
}

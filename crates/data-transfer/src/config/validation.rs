//! Settings validation.

use super::TransferSettings;
use crate::error::{Result, TransferError};

/// Longest grace period a cancelled run may wait for its workers.
const MAX_CANCEL_GRACE_MS: u64 = 3_600_000;

/// Validate the settings.
pub fn validate(settings: &TransferSettings) -> Result<()> {
    if settings.task_name.trim().is_empty() {
        return Err(TransferError::Config("task_name must not be empty".into()));
    }

    // Only check if explicitly set
    if let Some(0) = settings.max_jobs {
        return Err(TransferError::Config(
            "max_jobs must be at least 1".into(),
        ));
    }

    if settings.cancel_grace_ms > MAX_CANCEL_GRACE_MS {
        return Err(TransferError::Config(format!(
            "cancel_grace_ms must be at most {}, got {}",
            MAX_CANCEL_GRACE_MS, settings.cancel_grace_ms
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_settings() {
        let settings = TransferSettings::default().with_max_jobs(4);
        assert!(validate(&settings).is_ok());
    }

    #[test]
    fn test_zero_jobs_rejected() {
        let settings = TransferSettings::default().with_max_jobs(0);
        assert!(validate(&settings).is_err());
    }

    #[test]
    fn test_empty_task_name_rejected() {
        let mut settings = TransferSettings::default();
        settings.task_name = "  ".to_string();
        assert!(validate(&settings).is_err());
    }

    #[test]
    fn test_grace_period_bound() {
        let mut settings = TransferSettings::default();
        settings.cancel_grace_ms = MAX_CANCEL_GRACE_MS + 1;
        assert!(validate(&settings).is_err());
    }
}

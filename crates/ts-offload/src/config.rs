use std::str::FromStr;
use std::time::Duration;

use crate::error::{OffloadError, Result};

pub const ENV_SEED: &str = "TILESTREAM_SEED";
pub const ENV_ACQUIRE_TIMEOUT_MS: &str = "TILESTREAM_ACQUIRE_TIMEOUT_MS";

/// Records drained per batch-queue run by the FIFO validator.
pub const DEFAULT_BATCH: usize = 512;

fn parse_var<T: FromStr>(key: &str, raw: Option<String>) -> Result<Option<T>> {
    match raw {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| OffloadError::Config(format!("{}: cannot parse '{}'", key, raw))),
        _ => Ok(None),
    }
}

/// Host-side settings shared by the offload drivers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OffloadConfig {
    /// Seed for generated test data; `None` derives one from the clock.
    pub seed: Option<u64>,
    /// Deadline for slot acquisition; `None` blocks until capacity frees up.
    pub acquire_timeout: Option<Duration>,
}

impl OffloadConfig {
    /// Defaults overridden by `TILESTREAM_SEED` and
    /// `TILESTREAM_ACQUIRE_TIMEOUT_MS`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`OffloadConfig::from_env`] with a caller-supplied variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let seed = parse_var::<u64>(ENV_SEED, lookup(ENV_SEED))?;
        let timeout_ms = parse_var::<u64>(ENV_ACQUIRE_TIMEOUT_MS, lookup(ENV_ACQUIRE_TIMEOUT_MS))?;
        Ok(OffloadConfig {
            seed,
            acquire_timeout: timeout_ms.map(Duration::from_millis),
        })
    }
}

/// Parameters of one bounded-FIFO validation run.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatorConfig {
    /// First marker value the producer emits.
    pub base: u64,
    /// Total records to drain; a multiple of `batch`.
    pub word_count: u64,
    /// Records drained per run.
    pub batch: usize,
    /// Depth of the config slot ring.
    pub slots: usize,
    /// Deadline for acquiring the config slot.
    pub timeout: Option<Duration>,
    /// Mismatches kept in the report; all are counted.
    pub max_reported: usize,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        ValidatorConfig {
            base: 0,
            word_count: 64 * DEFAULT_BATCH as u64,
            batch: DEFAULT_BATCH,
            slots: DEFAULT_BATCH,
            timeout: None,
            max_reported: 64,
        }
    }
}

impl ValidatorConfig {
    /// Check the preconditions that must hold before touching an engine.
    ///
    /// # Errors
    /// Returns `Config` for a zero batch or ring depth, or a word count that
    /// is not a whole number of batches.
    pub fn validate(&self) -> Result<()> {
        if self.batch == 0 {
            return Err(OffloadError::Config("batch size must be > 0".to_string()));
        }
        if self.slots == 0 {
            return Err(OffloadError::Config("slot ring depth must be > 0".to_string()));
        }
        if self.word_count % self.batch as u64 != 0 {
            return Err(OffloadError::Config(format!(
                "word count {} is not a multiple of batch size {}",
                self.word_count, self.batch
            )));
        }
        Ok(())
    }

    pub fn batches(&self) -> u64 {
        self.word_count / self.batch as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_defaults() {
        let cfg = OffloadConfig::from_lookup(|_| None).unwrap();
        assert_eq!(cfg, OffloadConfig::default());
    }

    #[test]
    fn test_lookup_overrides() {
        let cfg = OffloadConfig::from_lookup(|key| match key {
            ENV_SEED => Some("42".to_string()),
            ENV_ACQUIRE_TIMEOUT_MS => Some(" 250 ".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(cfg.seed, Some(42));
        assert_eq!(cfg.acquire_timeout, Some(Duration::from_millis(250)));
    }

    #[test]
    fn test_lookup_rejects_garbage() {
        let err = OffloadConfig::from_lookup(|key| (key == ENV_SEED).then(|| "abc".to_string()))
            .unwrap_err();
        assert!(matches!(err, OffloadError::Config(_)));
    }

    #[test]
    fn test_blank_values_ignored() {
        let cfg = OffloadConfig::from_lookup(|_| Some("  ".to_string())).unwrap();
        assert_eq!(cfg.seed, None);
    }

    #[test]
    fn test_validator_defaults_valid() {
        let cfg = ValidatorConfig::default();
        cfg.validate().unwrap();
        assert_eq!(cfg.batches(), 64);
    }

    #[test]
    fn test_word_count_must_be_whole_batches() {
        let cfg = ValidatorConfig {
            word_count: 513,
            ..ValidatorConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(OffloadError::Config(_))));
    }

    #[test]
    fn test_zero_batch_rejected() {
        let cfg = ValidatorConfig {
            batch: 0,
            ..ValidatorConfig::default()
        };
        assert!(cfg.validate().is_err());
    }
}

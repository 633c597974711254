use std::fmt;

use ts_stream::Engine;

use crate::config::ValidatorConfig;
use crate::design::{ConfigWord, FifoEntry, CONFIG_STREAM, FIFO_STREAM};
use crate::error::Result;

/// One field of one drained record that did not hold its expected value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mismatch {
    /// Global index of the record since `base`.
    pub record: u64,
    pub field: usize,
    pub expected: u64,
    pub actual: u64,
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[Entry: {}, Quad: {}] Mismatch: input {:#x}, output {:#x}",
            self.record, self.field, self.expected, self.actual
        )
    }
}

/// Outcome of a validation run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    pub records: u64,
    pub batches: u64,
    /// Every mismatching field, including those not kept in `mismatches`.
    pub mismatch_count: u64,
    /// The first `max_reported` mismatches.
    pub mismatches: Vec<Mismatch>,
}

impl ValidationReport {
    pub fn passed(&self) -> bool {
        self.mismatch_count == 0
    }
}

/// Check `entries`, which start at global record `first_record`, against
/// the marker pattern from `base`.
///
/// Every field of every record is checked: field 0 must be
/// `base + global index` (wrapping), the rest must be zero. Returns mismatches found.
pub fn compare_batch(entries: &[FifoEntry], base: u64, first_record: u64) -> Vec<Mismatch> {
    let mut found = Vec::new();
    for (i, entry) in entries.iter().enumerate() {
        let record = first_record + i as u64;
        let expected = FifoEntry::marker(base.wrapping_add(record));
        for (field, (&want, &got)) in expected.data.iter().zip(entry.data.iter()).enumerate() {
            if want != got {
                found.push(Mismatch {
                    record,
                    field,
                    expected: want,
                    actual: got,
                });
            }
        }
    }
    found
}

/// Drives the bounded-FIFO integrity test against an engine.
///
/// `Init -> ConfigSent -> Draining -> Done`: send one config word over the
/// slot stream, then drain `word_count / batch` batches through batch-queue
/// runs, checking each. Mismatches never stop the drain.
#[derive(Debug)]
pub struct FifoValidator {
    config: ValidatorConfig,
}

impl FifoValidator {
    /// # Errors
    /// Returns `Config` if `config` fails [`ValidatorConfig::validate`].
    pub fn new(config: ValidatorConfig) -> Result<Self> {
        config.validate()?;
        Ok(FifoValidator { config })
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Run the full test, calling `on_mismatch` for every mismatch as it is
    /// found.
    pub fn run_with(
        &self,
        engine: &mut dyn Engine,
        mut on_mismatch: impl FnMut(&Mismatch),
    ) -> Result<ValidationReport> {
        let cfg = &self.config;

        // Init
        engine.reset()?;
        let warm_up = engine.actions();
        engine.run(warm_up)?;
        let mut staging = vec![FifoEntry::marker(0); cfg.batch];
        let mut writer = engine.setup_slot_stream(
            CONFIG_STREAM,
            cfg.slots,
            std::mem::size_of::<ConfigWord>(),
        )?;

        // ConfigSent
        let word = ConfigWord {
            base: cfg.base,
            word_count: cfg.word_count,
        };
        let mut grant = writer.acquire(1, cfg.timeout)?;
        grant.write_record(0, &word)?;
        grant.commit()?;
        tracing::debug!(base = word.base, word_count = word.word_count, "config word sent");

        // Draining
        let mut report = ValidationReport::default();
        for batch in 0..cfg.batches() {
            staging.fill(FifoEntry::marker(0));
            let mut actions = engine.actions();
            actions.queue_output(FIFO_STREAM, bytemuck::cast_slice_mut(&mut staging))?;
            engine.run(actions)?;

            let first = batch * cfg.batch as u64;
            for mismatch in compare_batch(&staging, cfg.base, first) {
                tracing::warn!(
                    record = mismatch.record,
                    field = mismatch.field,
                    "fifo record mismatch"
                );
                on_mismatch(&mismatch);
                report.mismatch_count += 1;
                if report.mismatches.len() < cfg.max_reported {
                    report.mismatches.push(mismatch);
                }
            }
            report.records += cfg.batch as u64;
            report.batches += 1;
        }

        // Done
        drop(writer);
        tracing::info!(
            records = report.records,
            mismatches = report.mismatch_count,
            "fifo validation complete"
        );
        Ok(report)
    }

    pub fn run(&self, engine: &mut dyn Engine) -> Result<ValidationReport> {
        self.run_with(engine, |_| {})
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::design::fifo_design;
    use crate::engine::PatternEngine;
    use crate::error::OffloadError;

    fn config(batch: usize, batches: u64) -> ValidatorConfig {
        ValidatorConfig {
            base: 1000,
            word_count: batch as u64 * batches,
            batch,
            slots: 4,
            ..ValidatorConfig::default()
        }
    }

    #[test]
    fn test_clean_run_passes() {
        let mut engine = PatternEngine::load(fifo_design(), "*").unwrap();
        let v = FifoValidator::new(config(8, 5)).unwrap();
        let report = v.run(&mut engine).unwrap();
        assert!(report.passed());
        assert_eq!(report.records, 40);
        assert_eq!(report.batches, 5);
        assert_eq!(engine.emitted(), 40);
    }

    #[test]
    fn test_mismatches_do_not_stop_drain() {
        let mut engine = PatternEngine::load(fifo_design(), "*").unwrap();
        engine.corrupt(3, 0);
        engine.corrupt(17, 2);
        let v = FifoValidator::new(config(8, 4)).unwrap();
        let mut seen = Vec::new();
        let report = v.run_with(&mut engine, |m| seen.push(*m)).unwrap();
        assert!(!report.passed());
        assert_eq!(report.batches, 4);
        assert_eq!(report.mismatch_count, 2);
        assert_eq!(seen, report.mismatches);
        assert_eq!(report.mismatches[0].record, 3);
        assert_eq!(report.mismatches[0].expected, 1003);
        assert_eq!((report.mismatches[1].record, report.mismatches[1].field), (17, 2));
    }

    #[test]
    fn test_report_cap() {
        let mut engine = PatternEngine::load(fifo_design(), "*").unwrap();
        for r in 0..10 {
            engine.corrupt(r, 1);
        }
        let cfg = ValidatorConfig {
            max_reported: 3,
            ..config(10, 1)
        };
        let report = FifoValidator::new(cfg).unwrap().run(&mut engine).unwrap();
        assert_eq!(report.mismatch_count, 10);
        assert_eq!(report.mismatches.len(), 3);
    }

    #[test]
    fn test_markers_wrap_past_u64_max() {
        let mut engine = PatternEngine::load(fifo_design(), "*").unwrap();
        let cfg = ValidatorConfig {
            base: u64::MAX - 1,
            word_count: 4,
            batch: 4,
            slots: 1,
            ..ValidatorConfig::default()
        };
        let report = FifoValidator::new(cfg).unwrap().run(&mut engine).unwrap();
        assert!(report.passed());
        assert_eq!(report.records, 4);

        let entries = [
            FifoEntry::marker(u64::MAX - 1),
            FifoEntry::marker(u64::MAX),
            FifoEntry::marker(0),
            FifoEntry::marker(1),
        ];
        assert!(compare_batch(&entries, u64::MAX - 1, 0).is_empty());
    }

    #[test]
    fn test_precondition_checked_before_engine() {
        let cfg = ValidatorConfig {
            word_count: 10,
            batch: 4,
            ..ValidatorConfig::default()
        };
        assert!(matches!(FifoValidator::new(cfg), Err(OffloadError::Config(_))));
    }

    #[test]
    fn test_compare_batch_checks_every_field() {
        let mut entries = vec![FifoEntry::marker(5), FifoEntry::marker(6)];
        entries[0].data[1] = 9;
        entries[0].data[3] = 1;
        entries[1].data[0] = 0;
        let found = compare_batch(&entries, 5, 0);
        assert_eq!(found.len(), 3);
        assert_eq!(found[0].field, 1);
        assert_eq!(found[1].field, 3);
        assert_eq!((found[2].record, found[2].expected, found[2].actual), (1, 6, 0));
    }

    #[test]
    fn test_mismatch_display() {
        let m = Mismatch {
            record: 2,
            field: 0,
            expected: 0x10,
            actual: 0x11,
        };
        assert_eq!(
            m.to_string(),
            "[Entry: 2, Quad: 0] Mismatch: input 0x10, output 0x11"
        );
    }
}

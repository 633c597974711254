use std::sync::Arc;
use std::time::Duration;

use ts_stream::{
    select_device, slot_stream, Actions, Design, Engine, Result, SlotReader, SlotWriter,
    StreamError,
};

use crate::design::{ConfigWord, FifoEntry, CONFIG_STREAM, FIFO_STREAM};
use crate::engine::LOCAL_DEVICES;

const ENTRY_BYTES: usize = std::mem::size_of::<FifoEntry>();

/// Synthetic producer behind the bounded-FIFO test design.
///
/// Waits for one [`ConfigWord`] on the `configWord` slot stream, then fills
/// every buffer queued on `read_fifo` with consecutive markers
/// `base, base + 1, ...`, stopping after `word_count` records in total.
#[derive(Debug)]
pub struct PatternEngine {
    design: Arc<Design>,
    config: Option<SlotReader>,
    pattern: Option<ConfigWord>,
    emitted: u64,
    config_timeout: Option<Duration>,
    faults: Vec<(u64, usize)>,
}

impl PatternEngine {
    /// Load `design` onto the local device matching `selector`.
    pub fn load(design: Design, selector: &str) -> Result<Self> {
        let device = select_device(selector, LOCAL_DEVICES)?;
        if !(design.has_slot_stream(CONFIG_STREAM) && design.has_output(FIFO_STREAM)) {
            return Err(StreamError::InvalidRequest(format!(
                "design '{}' does not expose the FIFO streams",
                design.name
            )));
        }
        tracing::debug!(design = %design.name, device, "loaded pattern engine");
        Ok(PatternEngine {
            design: Arc::new(design),
            config: None,
            pattern: None,
            emitted: 0,
            config_timeout: Some(Duration::from_secs(5)),
            faults: Vec::new(),
        })
    }

    /// How long a run waits for the config word before failing.
    pub fn with_config_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config_timeout = timeout;
        self
    }

    /// Flip bits in field `field` of the `record`-th emitted record.
    pub fn corrupt(&mut self, record: u64, field: usize) {
        assert!(field < FifoEntry::FIELDS, "field {} out of range", field);
        self.faults.push((record, field));
    }

    /// Records emitted since the config word arrived.
    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    fn pattern(&mut self) -> Result<ConfigWord> {
        if let Some(p) = self.pattern {
            return Ok(p);
        }
        let reader = self.config.as_mut().ok_or_else(|| {
            StreamError::RunFailed(format!("slot stream '{}' not set up", CONFIG_STREAM))
        })?;
        let words: Vec<ConfigWord> = reader.read_records(1, self.config_timeout)?;
        let word = words[0];
        tracing::debug!(base = word.base, word_count = word.word_count, "config word received");
        self.pattern = Some(word);
        Ok(word)
    }
}

impl Engine for PatternEngine {
    fn name(&self) -> &str {
        "pattern-ref"
    }

    fn design(&self) -> Arc<Design> {
        Arc::clone(&self.design)
    }

    fn reset(&mut self) -> Result<()> {
        self.config = None;
        self.pattern = None;
        self.emitted = 0;
        Ok(())
    }

    fn setup_slot_stream(
        &mut self,
        name: &str,
        slots: usize,
        slot_size: usize,
    ) -> Result<SlotWriter> {
        if !self.design.has_slot_stream(name) {
            return Err(StreamError::UnknownStream(name.to_string()));
        }
        if slot_size < std::mem::size_of::<ConfigWord>() {
            return Err(StreamError::InvalidRequest(format!(
                "slot size {} is smaller than a config word",
                slot_size
            )));
        }
        let (writer, reader) = slot_stream(name, slots, slot_size)?;
        self.config = Some(reader);
        Ok(writer)
    }

    fn run(&mut self, mut actions: Actions<'_>) -> Result<()> {
        let bytes = actions.output_len(FIFO_STREAM);
        if bytes == 0 {
            return Ok(());
        }
        if bytes % ENTRY_BYTES != 0 {
            return Err(StreamError::InvalidRequest(format!(
                "'{}' buffers total {} bytes, not a whole number of {} byte records",
                FIFO_STREAM, bytes, ENTRY_BYTES
            )));
        }
        let pattern = self.pattern()?;
        let count = (bytes / ENTRY_BYTES) as u64;
        if self.emitted + count > pattern.word_count {
            return Err(StreamError::RunFailed(format!(
                "drain of {} records past the configured {} (already emitted {})",
                count, pattern.word_count, self.emitted
            )));
        }

        let mut records: Vec<FifoEntry> = (0..count)
            .map(|i| FifoEntry::marker(pattern.base.wrapping_add(self.emitted + i)))
            .collect();
        for &(record, field) in &self.faults {
            if (self.emitted..self.emitted + count).contains(&record) {
                records[(record - self.emitted) as usize].data[field] ^= 0xA5A5;
            }
        }
        actions.fill_output(FIFO_STREAM, bytemuck::cast_slice(&records))?;
        self.emitted += count;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::design::{dgemm_design, fifo_design};

    fn configured(base: u64, word_count: u64) -> (PatternEngine, SlotWriter) {
        let mut e = PatternEngine::load(fifo_design(), "*").unwrap();
        let mut w = e.setup_slot_stream(CONFIG_STREAM, 4, 16).unwrap();
        let mut grant = w.try_acquire(1).unwrap().unwrap();
        grant.write_record(0, &ConfigWord { base, word_count }).unwrap();
        grant.commit().unwrap();
        (e, w)
    }

    fn drain(e: &mut PatternEngine, n: usize) -> Result<Vec<FifoEntry>> {
        let mut out = vec![FifoEntry::marker(u64::MAX); n];
        let mut actions = e.actions();
        actions.queue_output(FIFO_STREAM, bytemuck::cast_slice_mut(&mut out))?;
        e.run(actions)?;
        Ok(out)
    }

    #[test]
    fn test_load_requires_fifo_design() {
        assert!(PatternEngine::load(dgemm_design(), "*").is_err());
    }

    #[test]
    fn test_markers_continue_across_runs() {
        let (mut e, _w) = configured(100, 8);
        let first = drain(&mut e, 4).unwrap();
        let second = drain(&mut e, 4).unwrap();
        assert_eq!(first[0], FifoEntry::marker(100));
        assert_eq!(second[3], FifoEntry::marker(107));
        assert_eq!(e.emitted(), 8);
        assert!(drain(&mut e, 1).is_err());
    }

    #[test]
    fn test_run_without_config_times_out() {
        let mut e = PatternEngine::load(fifo_design(), "*")
            .unwrap()
            .with_config_timeout(Some(Duration::from_millis(10)));
        let _w = e.setup_slot_stream(CONFIG_STREAM, 1, 16).unwrap();
        assert!(matches!(drain(&mut e, 1), Err(StreamError::Timeout { .. })));
    }

    #[test]
    fn test_unknown_slot_stream() {
        let mut e = PatternEngine::load(fifo_design(), "*").unwrap();
        assert!(e.setup_slot_stream("other", 1, 16).is_err());
        assert!(e.setup_slot_stream(CONFIG_STREAM, 1, 8).is_err());
    }

    #[test]
    fn test_fault_injection() {
        let (mut e, _w) = configured(0, 4);
        e.corrupt(2, 3);
        let out = drain(&mut e, 4).unwrap();
        assert_eq!(out[1], FifoEntry::marker(1));
        assert_eq!(out[2].data[3], 0xA5A5);
    }
}

use std::collections::HashMap;
use std::sync::Arc;

use crate::design::Design;
use crate::error::{Result, StreamError};

/// A batch of queued transfers and single-shot directives for one engine run.
///
/// Buffers are borrowed for `'a`, so they cannot be freed or reused until the
/// action set has been handed to `Engine::run` and dropped. Within a stream,
/// buffers are delivered in the order they were queued; there is no ordering
/// between different streams. Tick budgets and scalars are consumed by the
/// run that receives this action set and never carry over to the next one.
#[derive(Debug)]
pub struct Actions<'a> {
    design: Arc<Design>,
    inputs: HashMap<String, Vec<&'a [u8]>>,
    outputs: HashMap<String, Vec<&'a mut [u8]>>,
    ticks: HashMap<String, u64>,
    scalars: HashMap<(String, String), u64>,
}

impl<'a> Actions<'a> {
    /// Start an empty action set for `design`.
    pub fn new(design: Arc<Design>) -> Self {
        Actions {
            design,
            inputs: HashMap::new(),
            outputs: HashMap::new(),
            ticks: HashMap::new(),
            scalars: HashMap::new(),
        }
    }

    pub fn design(&self) -> &Design {
        &self.design
    }

    /// Drop every queued buffer, tick budget, and scalar.
    pub fn clear_queues(&mut self) {
        self.inputs.clear();
        self.outputs.clear();
        self.ticks.clear();
        self.scalars.clear();
    }

    /// True when nothing has been queued or set.
    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
            && self.outputs.is_empty()
            && self.ticks.is_empty()
            && self.scalars.is_empty()
    }

    /// Queue `data` (its full byte length) on input stream `stream`.
    pub fn queue_input(&mut self, stream: &str, data: &'a [u8]) -> Result<()> {
        if !self.design.has_input(stream) {
            return Err(StreamError::UnknownStream(stream.to_string()));
        }
        tracing::trace!(stream, bytes = data.len(), "queue input");
        self.inputs.entry(stream.to_string()).or_default().push(data);
        Ok(())
    }

    pub fn queue_input_f64(&mut self, stream: &str, data: &'a [f64]) -> Result<()> {
        self.queue_input(stream, bytemuck::cast_slice(data))
    }

    /// Queue `data` to be filled from output stream `stream`.
    pub fn queue_output(&mut self, stream: &str, data: &'a mut [u8]) -> Result<()> {
        if !self.design.has_output(stream) {
            return Err(StreamError::UnknownStream(stream.to_string()));
        }
        tracing::trace!(stream, bytes = data.len(), "queue output");
        self.outputs.entry(stream.to_string()).or_default().push(data);
        Ok(())
    }

    pub fn queue_output_f64(&mut self, stream: &str, data: &'a mut [f64]) -> Result<()> {
        self.queue_output(stream, bytemuck::cast_slice_mut(data))
    }

    /// Set how many ticks `module` runs for.
    pub fn set_ticks(&mut self, module: &str, ticks: u64) -> Result<()> {
        self.check_module(module)?;
        self.ticks.insert(module.to_string(), ticks);
        Ok(())
    }

    /// Set a 64-bit scalar parameter on `module`.
    pub fn set_u64(&mut self, module: &str, param: &str, value: u64) -> Result<()> {
        self.check_module(module)?;
        if !self.design.has_scalar(param) {
            return Err(StreamError::UnknownStream(format!("{}.{}", module, param)));
        }
        self.scalars
            .insert((module.to_string(), param.to_string()), value);
        Ok(())
    }

    fn check_module(&self, module: &str) -> Result<()> {
        if self.design.module != module {
            return Err(StreamError::UnknownModule(module.to_string()));
        }
        Ok(())
    }

    pub fn ticks(&self, module: &str) -> Option<u64> {
        self.ticks.get(module).copied()
    }

    pub fn scalar(&self, module: &str, param: &str) -> Option<u64> {
        self.scalars
            .get(&(module.to_string(), param.to_string()))
            .copied()
    }

    /// Total queued bytes on input stream `stream`.
    pub fn input_len(&self, stream: &str) -> usize {
        self.inputs
            .get(stream)
            .map_or(0, |bufs| bufs.iter().map(|b| b.len()).sum())
    }

    /// Total queued bytes on output stream `stream`.
    pub fn output_len(&self, stream: &str) -> usize {
        self.outputs
            .get(stream)
            .map_or(0, |bufs| bufs.iter().map(|b| b.len()).sum())
    }

    /// The buffers queued on input stream `stream`, in queue order.
    pub fn inputs(&self, stream: &str) -> &[&'a [u8]] {
        self.inputs
            .get(stream)
            .map(|bufs| bufs.as_slice())
            .unwrap_or(&[])
    }

    /// Concatenate every buffer queued on `stream`, in queue order.
    pub fn gather_input(&self, stream: &str) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.input_len(stream));
        for buf in self.inputs(stream) {
            out.extend_from_slice(buf);
        }
        out
    }

    /// Write `bytes` across the buffers queued on output stream `stream`.
    ///
    /// # Errors
    /// Returns `RunFailed` unless `bytes` exactly fills the queued buffers.
    pub fn fill_output(&mut self, stream: &str, bytes: &[u8]) -> Result<()> {
        let queued = self.output_len(stream);
        if queued != bytes.len() {
            return Err(StreamError::RunFailed(format!(
                "stream '{}' has {} bytes queued but the engine produced {}",
                stream,
                queued,
                bytes.len()
            )));
        }
        let mut offset = 0;
        if let Some(bufs) = self.outputs.get_mut(stream) {
            for buf in bufs.iter_mut() {
                let len = buf.len();
                buf.copy_from_slice(&bytes[offset..offset + len]);
                offset += len;
            }
        }
        Ok(())
    }
}

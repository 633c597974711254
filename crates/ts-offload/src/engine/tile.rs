use std::sync::Arc;

use ts_stream::{select_device, Actions, Design, Engine, Result, StreamError};

use crate::design::{PARAM_NUM_TILES, STREAM_A, STREAM_B, STREAM_C};
use crate::engine::LOCAL_DEVICES;

const F64_BYTES: usize = std::mem::size_of::<f64>();

/// Host stand-in for the DGEMM engine.
///
/// Consumes the A and B streams one `T x T` tile at a time and emits the
/// product of each tile pair on C, in arrival order. The host is responsible
/// for replicating operands so tile pair `t` lines up with result tile `t`.
#[derive(Debug)]
pub struct TileEngine {
    design: Arc<Design>,
    device: String,
    runs: u64,
}

impl TileEngine {
    /// Load `design` onto the local device matching `selector`.
    ///
    /// # Errors
    /// Returns `DeviceUnavailable` if no device matches, and `InvalidRequest`
    /// if the design lacks the DGEMM streams or a tile size.
    pub fn load(design: Design, selector: &str) -> Result<Self> {
        let device = select_device(selector, LOCAL_DEVICES)?;
        if !(design.has_input(STREAM_A)
            && design.has_input(STREAM_B)
            && design.has_output(STREAM_C)
            && design.has_scalar(PARAM_NUM_TILES))
        {
            return Err(StreamError::InvalidRequest(format!(
                "design '{}' does not expose the DGEMM streams",
                design.name
            )));
        }
        if design.tile_size == 0 {
            return Err(StreamError::InvalidRequest(format!(
                "design '{}' has no tile size",
                design.name
            )));
        }
        tracing::debug!(design = %design.name, device, "loaded tile engine");
        Ok(TileEngine {
            design: Arc::new(design),
            device: device.to_string(),
            runs: 0,
        })
    }

    pub fn device(&self) -> &str {
        &self.device
    }

    /// Completed non-empty runs.
    pub fn runs(&self) -> u64 {
        self.runs
    }

    fn expect_bytes(actual: usize, expected: usize, stream: &str) -> Result<()> {
        if actual != expected {
            return Err(StreamError::RunFailed(format!(
                "stream '{}' carries {} bytes, expected {}",
                stream, actual, expected
            )));
        }
        Ok(())
    }
}

/// `c = a * b` for one row-major `t x t` tile.
fn tile_product(a: &[f64], b: &[f64], c: &mut [f64], t: usize) {
    for x in 0..t {
        for y in 0..t {
            let mut sum = 0.0;
            for z in 0..t {
                sum += a[x * t + z] * b[z * t + y];
            }
            c[x * t + y] = sum;
        }
    }
}

impl Engine for TileEngine {
    fn name(&self) -> &str {
        "tile-ref"
    }

    fn design(&self) -> Arc<Design> {
        Arc::clone(&self.design)
    }

    fn reset(&mut self) -> Result<()> {
        self.runs = 0;
        Ok(())
    }

    fn run(&mut self, mut actions: Actions<'_>) -> Result<()> {
        if actions.is_empty() {
            return Ok(());
        }
        let module = self.design.module.as_str();
        let t = self.design.tile_size;
        let area = t * t;

        let num_tiles = actions.scalar(module, PARAM_NUM_TILES).ok_or_else(|| {
            StreamError::RunFailed(format!("scalar '{}' not set", PARAM_NUM_TILES))
        })? as usize;
        let ticks = actions
            .ticks(module)
            .ok_or_else(|| StreamError::RunFailed(format!("no tick budget for '{}'", module)))?;
        let required = (num_tiles as u64 + 1) * area as u64;
        if ticks < required {
            return Err(StreamError::RunFailed(format!(
                "tick budget {} cannot drain {} tiles (needs {})",
                ticks, num_tiles, required
            )));
        }

        let bytes = num_tiles * area * F64_BYTES;
        Self::expect_bytes(actions.input_len(STREAM_A), bytes, STREAM_A)?;
        Self::expect_bytes(actions.input_len(STREAM_B), bytes, STREAM_B)?;
        Self::expect_bytes(actions.output_len(STREAM_C), bytes, STREAM_C)?;

        let a: Vec<f64> = bytemuck::pod_collect_to_vec(&actions.gather_input(STREAM_A));
        let b: Vec<f64> = bytemuck::pod_collect_to_vec(&actions.gather_input(STREAM_B));
        let mut c = vec![0.0f64; num_tiles * area];
        for tile in 0..num_tiles {
            let span = tile * area..(tile + 1) * area;
            tile_product(&a[span.clone()], &b[span.clone()], &mut c[span], t);
        }
        actions.fill_output(STREAM_C, bytemuck::cast_slice(&c))?;

        self.runs += 1;
        tracing::debug!(num_tiles, ticks, run = self.runs, "tile engine run complete");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::design::{dgemm_design_with_tile, fifo_design, DGEMM_MODULE};

    fn engine() -> TileEngine {
        TileEngine::load(dgemm_design_with_tile(2), "*").unwrap()
    }

    #[test]
    fn test_load_checks_device_and_design() {
        assert!(matches!(
            TileEngine::load(dgemm_design_with_tile(2), "remote"),
            Err(StreamError::DeviceUnavailable(_))
        ));
        assert!(matches!(
            TileEngine::load(fifo_design(), "*"),
            Err(StreamError::InvalidRequest(_))
        ));
        assert_eq!(engine().device(), "local0");
    }

    #[test]
    fn test_tile_pairs_multiply_in_order() {
        let mut e = engine();
        // Two tile pairs: identity * X, then 2I * X.
        let a = [1.0, 0.0, 0.0, 1.0, 2.0, 0.0, 0.0, 2.0];
        let b = [1.0, 2.0, 3.0, 4.0, 1.0, 2.0, 3.0, 4.0];
        let mut c = [0.0; 8];
        {
            let mut actions = e.actions();
            actions.set_ticks(DGEMM_MODULE, 12).unwrap();
            actions.set_u64(DGEMM_MODULE, PARAM_NUM_TILES, 2).unwrap();
            actions.queue_input_f64(STREAM_A, &a[..4]).unwrap();
            actions.queue_input_f64(STREAM_A, &a[4..]).unwrap();
            actions.queue_input_f64(STREAM_B, &b).unwrap();
            actions.queue_output_f64(STREAM_C, &mut c).unwrap();
            e.run(actions).unwrap();
        }
        assert_eq!(c, [1.0, 2.0, 3.0, 4.0, 2.0, 4.0, 6.0, 8.0]);
        assert_eq!(e.runs(), 1);
    }

    #[test]
    fn test_short_tick_budget_rejected() {
        let mut e = engine();
        let a = [0.0; 4];
        let mut c = [0.0; 4];
        let mut actions = e.actions();
        // One tile needs (1 + 1) * 4 ticks.
        actions.set_ticks(DGEMM_MODULE, 4).unwrap();
        actions.set_u64(DGEMM_MODULE, PARAM_NUM_TILES, 1).unwrap();
        actions.queue_input_f64(STREAM_A, &a).unwrap();
        actions.queue_input_f64(STREAM_B, &a).unwrap();
        actions.queue_output_f64(STREAM_C, &mut c).unwrap();
        assert!(matches!(e.run(actions), Err(StreamError::RunFailed(_))));
    }

    #[test]
    fn test_missing_operand_rejected() {
        let mut e = engine();
        let a = [0.0; 4];
        let mut c = [0.0; 4];
        let mut actions = e.actions();
        actions.set_ticks(DGEMM_MODULE, 8).unwrap();
        actions.set_u64(DGEMM_MODULE, PARAM_NUM_TILES, 1).unwrap();
        actions.queue_input_f64(STREAM_A, &a).unwrap();
        actions.queue_output_f64(STREAM_C, &mut c).unwrap();
        assert!(e.run(actions).is_err());
    }

    #[test]
    fn test_empty_run_is_noop() {
        let mut e = engine();
        let actions = e.actions();
        e.run(actions).unwrap();
        assert_eq!(e.runs(), 0);
    }
}

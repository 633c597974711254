use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use ts_stream::{Design, Engine};
use ts_tile::{
    check_gemm_dims, pack_a, pack_b, require_no_transpose, unpack_accumulate, MatrixView,
    MatrixViewMut, TileGrid, Transpose,
};

use crate::design::{tick_budget, PARAM_NUM_TILES, STREAM_A, STREAM_B, STREAM_C};
use crate::efficiency::Efficiency;
use crate::error::{OffloadError, Result};

/// Where an offload call currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OffloadState {
    Idle,
    Packing,
    Queued,
    Running,
    Draining,
}

impl fmt::Display for OffloadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OffloadState::Idle => "idle",
            OffloadState::Packing => "packing",
            OffloadState::Queued => "queued",
            OffloadState::Running => "running",
            OffloadState::Draining => "draining",
        };
        f.write_str(s)
    }
}

/// Wall-clock breakdown of one offload call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OffloadTimings {
    /// Whole call, packing through unpacking.
    pub total: Duration,
    /// Inside the blocking engine run.
    pub engine: Duration,
}

impl OffloadTimings {
    /// Host-side work: packing, queueing, and unpacking.
    pub fn host(&self) -> Duration {
        self.total.saturating_sub(self.engine)
    }
}

/// What one offload call did and how long it took.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OffloadReport {
    pub grid: TileGrid,
    pub efficiency: Efficiency,
    pub timings: OffloadTimings,
}

/// An engine loaded with the DGEMM design, owned for the lifetime of the
/// session.
///
/// Every packed buffer lives only for the duration of one [`Session::dgemm`]
/// call.
#[derive(Debug)]
pub struct Session {
    engine: Box<dyn Engine>,
    design: Arc<Design>,
    state: OffloadState,
}

impl Session {
    /// Take ownership of `engine`.
    ///
    /// # Errors
    /// Returns `Config` if the loaded design has no tile size or clock, and
    /// `Protocol` if it lacks the DGEMM streams.
    pub fn open(engine: Box<dyn Engine>) -> Result<Self> {
        let design = engine.design();
        if design.tile_size == 0 {
            return Err(OffloadError::Config(format!(
                "design '{}' has no tile size",
                design.name
            )));
        }
        if design.frequency_mhz == 0 {
            return Err(OffloadError::Config(format!(
                "design '{}' has no clock frequency",
                design.name
            )));
        }
        if !(design.has_input(STREAM_A) && design.has_input(STREAM_B) && design.has_output(STREAM_C))
        {
            return Err(OffloadError::Protocol(format!(
                "design '{}' does not expose streams {}, {}, {}",
                design.name, STREAM_A, STREAM_B, STREAM_C
            )));
        }
        tracing::info!(
            engine = engine.name(),
            design = %design.name,
            tile = design.tile_size,
            "session opened"
        );
        Ok(Session {
            engine,
            design,
            state: OffloadState::Idle,
        })
    }

    pub fn tile_size(&self) -> usize {
        self.design.tile_size
    }

    pub fn frequency_mhz(&self) -> u32 {
        self.design.frequency_mhz
    }

    pub fn design(&self) -> &Design {
        &self.design
    }

    pub fn state(&self) -> OffloadState {
        self.state
    }

    /// Tile decomposition of an `m x n x k` problem on this engine.
    pub fn grid(&self, m: usize, n: usize, k: usize) -> Result<TileGrid> {
        Ok(TileGrid::new(m, n, k, self.tile_size())?)
    }

    /// Padding efficiency and predicted engine time for `m x n x k`.
    pub fn efficiency(&self, m: usize, n: usize, k: usize) -> Result<Efficiency> {
        Ok(Efficiency::estimate(&self.grid(m, n, k)?, self.frequency_mhz()))
    }

    fn transition(&mut self, next: OffloadState) {
        tracing::debug!(from = %self.state, to = %next, "offload state");
        self.state = next;
    }

    /// `C = beta * C + alpha * A * B` on the engine.
    ///
    /// A is `M x K`, B is `K x N`, C is `M x N`; all three may be strided
    /// windows. The call blocks until the engine has drained and C is updated.
    ///
    /// # Errors
    /// Returns `Tile(Unsupported)` for transposed operands, `Tile` errors for
    /// inconsistent shapes, and `Stream` errors if the engine run fails. On
    /// error C may be partially updated only if the failure happened while
    /// draining, which cannot occur for a well-formed stream.
    #[allow(clippy::too_many_arguments)]
    pub fn dgemm(
        &mut self,
        trans_a: Transpose,
        trans_b: Transpose,
        alpha: f64,
        a: MatrixView<'_>,
        b: MatrixView<'_>,
        beta: f64,
        c: &mut MatrixViewMut<'_>,
    ) -> Result<OffloadReport> {
        let outcome = self.offload(trans_a, trans_b, alpha, a, b, beta, c);
        if self.state != OffloadState::Idle {
            self.transition(OffloadState::Idle);
        }
        outcome
    }

    #[allow(clippy::too_many_arguments)]
    fn offload(
        &mut self,
        trans_a: Transpose,
        trans_b: Transpose,
        alpha: f64,
        a: MatrixView<'_>,
        b: MatrixView<'_>,
        beta: f64,
        c: &mut MatrixViewMut<'_>,
    ) -> Result<OffloadReport> {
        let started = Instant::now();
        require_no_transpose(trans_a, trans_b)?;
        let (m, n, k) = check_gemm_dims(&a, &b, c)?;
        let grid = self.grid(m, n, k)?;
        let t = grid.tile();

        self.transition(OffloadState::Packing);
        let a_packed = pack_a(a, t)?;
        let b_packed = pack_b(b, t)?;
        let mut result = vec![0.0f64; grid.result_len()];

        let engine_time = if grid.num_tiles() == 0 {
            Duration::ZERO
        } else {
            self.transition(OffloadState::Queued);
            let module = self.design.module.clone();
            let mut actions = self.engine.actions();
            actions.clear_queues();
            actions.set_ticks(&module, tick_budget(&grid))?;
            actions.set_u64(&module, PARAM_NUM_TILES, grid.num_tiles() as u64)?;

            // The engine walks (mTile, nTile, kTile): each A row band is sent
            // once per N tile and the whole of B once per M tile.
            for mm in 0..grid.m_tiles() {
                for _ in 0..grid.n_tiles() {
                    actions.queue_input_f64(STREAM_A, a_packed.band(mm))?;
                }
            }
            for _ in 0..grid.m_tiles() {
                actions.queue_input_f64(STREAM_B, b_packed.as_slice())?;
            }
            actions.queue_output_f64(STREAM_C, &mut result)?;

            self.transition(OffloadState::Running);
            let run_start = Instant::now();
            self.engine.run(actions)?;
            run_start.elapsed()
        };

        self.transition(OffloadState::Draining);
        unpack_accumulate(&result, &grid, alpha, beta, c)?;
        self.transition(OffloadState::Idle);

        let timings = OffloadTimings {
            total: started.elapsed(),
            engine: engine_time,
        };
        tracing::info!(
            grid = %grid,
            engine_us = timings.engine.as_micros() as u64,
            total_us = timings.total.as_micros() as u64,
            "dgemm offload complete"
        );
        Ok(OffloadReport {
            grid,
            efficiency: Efficiency::estimate(&grid, self.frequency_mhz()),
            timings,
        })
    }
}

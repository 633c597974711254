use ts_tile::TileGrid;

/// Diagnostic estimate of how well a problem fits the engine's tile grid.
///
/// Nothing in the offload path branches on these numbers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Efficiency {
    /// `M * N * K`.
    pub points: f64,
    /// `paddedM * paddedN * paddedK`.
    pub padded_points: f64,
    /// `points / padded_points`; 1.0 for an empty problem.
    pub ratio: f64,
    /// `padded_points / (T * frequency)` in seconds.
    pub predicted_seconds: f64,
}

impl Efficiency {
    pub fn estimate(grid: &TileGrid, frequency_mhz: u32) -> Self {
        let points = grid.points();
        let padded_points = grid.padded_points();
        let ratio = if padded_points == 0.0 {
            1.0
        } else {
            points / padded_points
        };
        let predicted_seconds =
            padded_points / (grid.tile() as f64 * frequency_mhz as f64 * 1_000_000.0);
        Efficiency {
            points,
            padded_points,
            ratio,
            predicted_seconds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_exact_fit_is_fully_efficient() {
        let grid = TileGrid::new(32, 16, 48, 16).unwrap();
        let e = Efficiency::estimate(&grid, 200);
        assert_relative_eq!(e.ratio, 1.0);
        assert_relative_eq!(e.predicted_seconds, 32.0 * 16.0 * 48.0 / (16.0 * 200e6));
    }

    #[test]
    fn test_padding_lowers_ratio() {
        let grid = TileGrid::new(17, 16, 16, 16).unwrap();
        let e = Efficiency::estimate(&grid, 100);
        assert_relative_eq!(e.ratio, 17.0 / 32.0);
        assert_relative_eq!(e.padded_points, 32.0 * 16.0 * 16.0);
    }

    #[test]
    fn test_empty_problem() {
        let grid = TileGrid::new(0, 5, 5, 4).unwrap();
        let e = Efficiency::estimate(&grid, 100);
        assert_eq!(e.points, 0.0);
        assert_eq!(e.ratio, 1.0);
        assert_eq!(e.predicted_seconds, 0.0);
    }
}

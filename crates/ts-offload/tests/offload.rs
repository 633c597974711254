use std::thread;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use ts_offload::design::{dgemm_design_with_tile, fifo_design, DGEMM_TILE_SIZE};
use ts_offload::{
    dgemm_design, FifoValidator, PatternEngine, Session, TileEngine, ValidatorConfig,
};
use ts_stream::{slot_stream, StreamError};
use ts_tile::{compare_exact, dgemm_reference, Matrix, Transpose};

fn session(tile: usize) -> Session {
    let engine = TileEngine::load(dgemm_design_with_tile(tile), "*").unwrap();
    Session::open(Box::new(engine)).unwrap()
}

fn random_matrix(rng: &mut StdRng, rows: usize, cols: usize) -> Matrix {
    Matrix::from_fn(rows, cols, |_, _| rng.gen_range(0..100) as f64)
}

/// Offload and reference on the same inputs; integer data keeps both exact.
fn check_against_reference(s: &mut Session, rng: &mut StdRng, m: usize, n: usize, k: usize) {
    let a = random_matrix(rng, m, k);
    let b = random_matrix(rng, k, n);
    let c0 = random_matrix(rng, m, n);
    let alpha = rng.gen_range(-3..=3) as f64;
    let beta = rng.gen_range(-3..=3) as f64;

    let mut expected = c0.clone();
    dgemm_reference(
        Transpose::No,
        Transpose::No,
        alpha,
        a.view(),
        b.view(),
        beta,
        &mut expected.view_mut(),
    )
    .unwrap();

    let mut actual = c0;
    s.dgemm(
        Transpose::No,
        Transpose::No,
        alpha,
        a.view(),
        b.view(),
        beta,
        &mut actual.view_mut(),
    )
    .unwrap();

    assert!(
        compare_exact(expected.view(), actual.view()),
        "mismatch for {}x{}x{} (alpha {}, beta {})",
        m,
        n,
        k,
        alpha,
        beta
    );
}

#[test]
fn test_offload_matches_reference_around_tile_edges() {
    let t = DGEMM_TILE_SIZE;
    let sizes = [0, 1, t - 1, t, t + 1, 2 * t, 5 * t - 1];
    let mut s = session(t);
    let mut rng = StdRng::seed_from_u64(7);
    for &m in &sizes {
        for &n in &sizes {
            for &k in &sizes {
                check_against_reference(&mut s, &mut rng, m, n, k);
            }
        }
    }
}

#[test]
fn test_random_shapes_small_tile() {
    let mut s = session(3);
    let mut rng = StdRng::seed_from_u64(0xdead);
    for _ in 0..20 {
        let (m, n, k) = (
            rng.gen_range(0..15),
            rng.gen_range(0..15),
            rng.gen_range(0..15),
        );
        check_against_reference(&mut s, &mut rng, m, n, k);
    }
}

#[test]
fn test_single_element() {
    let mut s = Session::open(Box::new(TileEngine::load(dgemm_design(), "*").unwrap())).unwrap();
    let a = Matrix::new(vec![5.0], 1, 1);
    let b = Matrix::new(vec![7.0], 1, 1);
    let mut c = Matrix::zeros(1, 1);
    let report = s
        .dgemm(
            Transpose::No,
            Transpose::No,
            1.0,
            a.view(),
            b.view(),
            0.0,
            &mut c.view_mut(),
        )
        .unwrap();
    assert_eq!(c.data(), &[35.0]);
    assert_eq!(report.grid.num_tiles(), 1);
    assert_eq!(report.efficiency.points, 1.0);
    assert_eq!(report.efficiency.padded_points, 4096.0);
}

#[test]
fn test_exact_tile_has_no_padding() {
    let t = DGEMM_TILE_SIZE;
    let mut s = session(t);
    let a = Matrix::from_fn(t, t, |r, c| (r * t + c) as f64);
    let b = Matrix::from_fn(t, t, |r, c| if r == c { 1.0 } else { 0.0 });
    let mut c = Matrix::zeros(t, t);
    let report = s
        .dgemm(
            Transpose::No,
            Transpose::No,
            1.0,
            a.view(),
            b.view(),
            0.0,
            &mut c.view_mut(),
        )
        .unwrap();
    assert_eq!(c, a);
    assert_eq!(report.efficiency.ratio, 1.0);
}

#[test]
fn test_beta_applied_once_across_k_tiles() {
    let t = 4;
    let mut s = session(t);
    // Three k tiles, all contributions zero: C must come back as beta * C.
    let a = Matrix::zeros(t, 3 * t);
    let b = Matrix::from_fn(3 * t, t, |r, c| (r + c) as f64);
    let mut c = Matrix::from_fn(t, t, |r, c| (r * t + c + 1) as f64);
    let expected = Matrix::from_fn(t, t, |r, c| 2.0 * (r * t + c + 1) as f64);
    s.dgemm(
        Transpose::No,
        Transpose::No,
        1.0,
        a.view(),
        b.view(),
        2.0,
        &mut c.view_mut(),
    )
    .unwrap();
    assert_eq!(c, expected);
}

#[test]
fn test_empty_inner_dimension_scales_c() {
    let mut s = session(4);
    let a = Matrix::zeros(3, 0);
    let b = Matrix::zeros(0, 2);
    let mut c = Matrix::new(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 3, 2);
    s.dgemm(
        Transpose::No,
        Transpose::No,
        1.0,
        a.view(),
        b.view(),
        3.0,
        &mut c.view_mut(),
    )
    .unwrap();
    assert_eq!(c.data(), &[3.0, 6.0, 9.0, 12.0, 15.0, 18.0]);
}

fn validate(batch: usize, batches: u64) -> ts_offload::ValidationReport {
    let mut engine = PatternEngine::load(fifo_design(), "*").unwrap();
    let cfg = ValidatorConfig {
        base: 0x1000,
        word_count: batch as u64 * batches,
        batch,
        slots: 8,
        timeout: Some(Duration::from_secs(1)),
        ..ValidatorConfig::default()
    };
    FifoValidator::new(cfg).unwrap().run(&mut engine).unwrap()
}

#[test]
fn test_transport_preserves_order_single_record() {
    let report = validate(1, 1);
    assert!(report.passed());
    assert_eq!(report.records, 1);
}

#[test]
fn test_transport_preserves_order_one_batch() {
    let report = validate(512, 1);
    assert!(report.passed());
    assert_eq!(report.records, 512);
}

#[test]
fn test_transport_preserves_order_many_batches() {
    let report = validate(512, 10);
    assert!(report.passed());
    assert_eq!(report.batches, 10);
    assert_eq!(report.records, 5120);
}

#[test]
fn test_slot_ring_backpressure() {
    let (mut writer, mut reader) = slot_stream("configWord", 2, 16).unwrap();

    for i in 0..2u64 {
        let mut grant = writer.try_acquire(1).unwrap().unwrap();
        grant.write_record(0, &[i, i]).unwrap();
        grant.commit().unwrap();
    }
    // Full: refused without blocking, and a bounded wait times out.
    assert!(writer.try_acquire(1).unwrap().is_none());
    assert!(matches!(
        writer.acquire(1, Some(Duration::from_millis(20))),
        Err(StreamError::Timeout { .. })
    ));

    let consumer = thread::spawn(move || {
        thread::sleep(Duration::from_millis(20));
        let mut seen = Vec::new();
        for _ in 0..3 {
            let rec: Vec<[u64; 2]> = reader.read_records(1, Some(Duration::from_secs(2))).unwrap();
            seen.push(rec[0][0]);
        }
        seen
    });

    // Blocks until the consumer frees a slot.
    let mut grant = writer.acquire(1, Some(Duration::from_secs(2))).unwrap();
    grant.write_record(0, &[2u64, 2]).unwrap();
    grant.commit().unwrap();

    assert_eq!(consumer.join().unwrap(), vec![0, 1, 2]);
}

//! Correctness and invariant tests for flowstats-summarize
//!
//! These tests verify merge algebra, order independence, leave-one-out
//! semantics, degenerate inputs and column pairing across all summarizers.
//! They complement the unit tests in each module by focusing on properties
//! that must always hold.
//!
//! Run with: cargo test --test correctness --features full

// Require all features
#[cfg(not(all(feature = "zscore", feature = "correlation")))]
compile_error!(
    "Correctness tests require all features. Run: cargo test --test correctness --features full"
);

use flowstats_summarize::prelude::*;
use flowstats_summarize::summarizer::{
    CorrelationSummarizer, MultiCorrelationSummarizer, ZScoreSummarizer,
};

fn float_schema(names: &[&str]) -> Schema {
    Schema::new(
        names
            .iter()
            .map(|n| Field::new(*n, DataType::Float64))
            .collect(),
    )
}

fn zscore(exclude: bool) -> ZScoreSummarizer {
    ZScoreSummarizerFactory::new("x")
        .exclude_current_observation(exclude)
        .build(&float_schema(&["x"]))
        .unwrap()
}

fn correlation() -> CorrelationSummarizer {
    CorrelationSummarizerFactory::new("x", "y")
        .build(&float_schema(&["x", "y"]))
        .unwrap()
}

fn multi(columns: &[&str]) -> MultiCorrelationSummarizer {
    MultiCorrelationSummarizerFactory::new(columns.iter().copied())
        .build(&float_schema(&["a", "b", "c", "d"]))
        .unwrap()
}

/// Deterministic, mildly correlated test series
fn series(n: usize) -> Vec<(f64, f64)> {
    (0..n)
        .map(|i| {
            let t = i as f64;
            let x = (t * 0.37).sin() * 10.0 + t * 0.1;
            let y = 0.6 * x + (t * 1.7).cos() * 3.0;
            (x, y)
        })
        .collect()
}

fn assert_close(a: f64, b: f64, tol: f64, what: &str) {
    assert!(
        (a - b).abs() <= tol || (a.is_nan() && b.is_nan()),
        "{}: {} vs {}",
        what,
        a,
        b
    );
}

// ============================================================================
// Z-score
// ============================================================================

mod zscore {
    use super::*;

    /// rows x = [1, 2, 3, 4], scoring the last row
    #[test]
    fn end_to_end_example() {
        let schema = float_schema(&["x"]);
        let rows: Vec<Row> = [1.0, 2.0, 3.0, 4.0]
            .iter()
            .map(|&x| vec![Value::Float64(x)])
            .collect();

        let included = ZScoreSummarizerFactory::new("x").build(&schema).unwrap();
        let scores = summarize_cumulative(&included, &rows);
        assert_close(scores[3], 1.3416, 1e-4, "include current");
        assert_close(summarize(&included, &rows), scores[3], 0.0, "summarize");

        let excluded = ZScoreSummarizerFactory::new("x")
            .exclude_current_observation(true)
            .build(&schema)
            .unwrap();
        let scores = summarize_cumulative(&excluded, &rows);
        assert_close(scores[3], 2.4495, 1e-4, "exclude current");
    }

    #[test]
    fn mixed_numeric_values_are_coerced() {
        let schema = float_schema(&["x"]);
        let rows: Vec<Row> = vec![
            vec![Value::Float64(1.0)],
            vec![Value::from(2)],
            vec![Value::Int64(3)],
            vec![Value::Float32(4.0)],
        ];
        let z = ZScoreSummarizerFactory::new("x").build(&schema).unwrap();

        let state = fold(&z, rows.iter().map(|row| z.extract(row)));
        assert_eq!(state.len(), 4);
        assert_close(summarize(&z, &rows), 1.3416, 1e-4, "mixed types");
    }

    #[test]
    fn single_row_is_nan() {
        for exclude in [false, true] {
            let z = zscore(exclude);
            assert!(z.render_current(&fold(&z, [42.0]), &42.0).is_nan());
        }
    }

    #[test]
    fn merge_equivalent_to_sequential_add() {
        let z = zscore(false);
        let data: Vec<f64> = series(50).into_iter().map(|p| p.0).collect();
        let last = data[49];

        let sequential = fold(&z, data.iter().copied());
        for split in [0, 1, 17, 49, 50] {
            let mut left = fold(&z, data[..split].iter().copied());
            let right = fold(&z, data[split..].iter().copied());
            z.merge(&mut left, &right).unwrap();

            assert_eq!(left.len(), sequential.len());
            assert_close(left.mean(), sequential.mean(), 1e-10, "mean");
            assert_close(left.variance(), sequential.variance(), 1e-9, "variance");
            assert_close(
                z.render_current(&left, &last),
                z.render_current(&sequential, &last),
                1e-10,
                "z-score",
            );
        }
    }

    #[test]
    fn merge_is_associative() {
        let z = zscore(false);
        let a = fold(&z, [1.5, 3.7, 2.1]);
        let b = fold(&z, [8.9, 4.3]);
        let c = fold(&z, [6.2, 7.4, 0.5]);

        let mut ab_c = a;
        z.merge(&mut ab_c, &b).unwrap();
        z.merge(&mut ab_c, &c).unwrap();

        let mut bc = b;
        z.merge(&mut bc, &c).unwrap();
        let mut a_bc = a;
        z.merge(&mut a_bc, &bc).unwrap();

        assert_eq!(ab_c.len(), a_bc.len());
        assert_close(ab_c.mean(), a_bc.mean(), 1e-12, "mean");
        assert_close(ab_c.variance(), a_bc.variance(), 1e-12, "variance");
    }

    #[test]
    fn merge_is_commutative() {
        for exclude in [false, true] {
            let z = zscore(exclude);
            let a = fold(&z, [1.0, 2.0]);
            let b = fold(&z, [3.0, 4.0]);

            let mut ab = a;
            z.merge(&mut ab, &b).unwrap();
            let mut ba = b;
            z.merge(&mut ba, &a).unwrap();

            for x in [1.0, 4.0] {
                assert_close(
                    z.render_current(&ab, &x),
                    z.render_current(&ba, &x),
                    1e-12,
                    "z-score",
                );
            }
        }
    }

    #[test]
    fn zero_is_merge_identity() {
        let z = zscore(true);
        let populated = fold(&z, [1.0, 2.0, 3.0, 4.0]);

        let mut left = z.zero();
        z.merge(&mut left, &populated).unwrap();
        assert_eq!(left, populated);

        let mut right = populated;
        z.merge(&mut right, &z.zero()).unwrap();
        assert_eq!(right, populated);
    }

    /// The aggregate only depends on the set of rows, not their order.
    #[test]
    fn order_independence() {
        let z = zscore(false);
        let forward = [3.0, 9.0, 1.0, 4.0, 7.0, 5.0];
        let shuffled = [9.0, 1.0, 7.0, 3.0, 4.0, 5.0];

        let a = fold(&z, forward);
        let b = fold(&z, shuffled);
        assert_close(a.mean(), b.mean(), 1e-12, "mean");
        assert_close(a.variance(), b.variance(), 1e-12, "variance");
        // same scored value, same population
        assert_close(
            z.render_current(&a, &5.0),
            z.render_current(&b, &5.0),
            1e-12,
            "z-score",
        );
    }

    #[test]
    fn leave_one_out_differs_when_n_above_one() {
        let rows: Vec<Row> = series(40)
            .into_iter()
            .map(|(x, _)| vec![Value::Float64(x)])
            .collect();

        let included = summarize_cumulative(&zscore(false), &rows);
        let excluded = summarize_cumulative(&zscore(true), &rows);

        // with only two rows the leave-one-out population has one value
        for n in 2..rows.len() {
            let (a, b) = (included[n], excluded[n]);
            if a != 0.0 {
                assert!(a != b, "row {}: {} == {}", n, a, b);
            }
        }
    }

    #[test]
    fn leave_one_out_matches_subtract() {
        let included = zscore(false);
        let excluded = zscore(true);
        let state = fold(&included, [2.0, 4.0, 4.0, 5.0, 7.0, 9.0]);

        let mut reduced = state;
        included.subtract(&mut reduced, &9.0);

        assert_close(
            included.render_current(&reduced, &9.0),
            excluded.render_current(&state, &9.0),
            1e-12,
            "leave-one-out",
        );
    }

    #[test]
    fn leave_one_out_converges() {
        let included = zscore(false);
        let excluded = zscore(true);

        let gap = |n: usize| {
            let data = (0..n).map(|i| (i % 10) as f64).chain([12.0]);
            let state = fold(&included, data);
            (included.render_current(&state, &12.0) - excluded.render_current(&state, &12.0)).abs()
        };

        let small = gap(10);
        let large = gap(10_000);
        assert!(large < small, "gap did not shrink: {} -> {}", small, large);
        assert!(large < 1e-2, "gap too large: {}", large);
    }

    #[test]
    fn constant_values_render_nan() {
        let z = zscore(false);
        assert!(z.render_current(&fold(&z, [3.0; 10]), &3.0).is_nan());
    }

    #[test]
    fn leave_one_out_on_constant_history_is_nan() {
        let z = zscore(true);
        for c in [0.1, 0.2, 0.3, 1.1, 2.7, 1e-3, 123.456, -9.99] {
            for n in 2..16 {
                for x in [5.0, -3.25, 0.0, 1e3] {
                    let state = fold(&z, vec![c; n].into_iter().chain([x]));
                    let score = z.render_current(&state, &x);
                    assert!(score.is_nan(), "c={} x={} n={} -> {}", c, x, n, score);
                }
            }
        }
    }
}

// ============================================================================
// Correlation
// ============================================================================

mod correlation {
    use super::*;

    #[test]
    fn merge_equivalent_to_sequential_add() {
        let c = correlation();
        let data = series(60);
        let sequential = c.render(&fold(&c, data.iter().copied()));

        for split in [0, 1, 2, 31, 59, 60] {
            let mut left = fold(&c, data[..split].iter().copied());
            let right = fold(&c, data[split..].iter().copied());
            c.merge(&mut left, &right).unwrap();
            let merged = c.render(&left);

            assert_close(merged.correlation, sequential.correlation, 1e-12, "r");
            assert_close(merged.t_stat, sequential.t_stat, 1e-9, "t");
        }
    }

    #[test]
    fn order_independence() {
        let c = correlation();
        let data = series(30);
        let mut reversed = data.clone();
        reversed.reverse();
        let mut interleaved: Vec<_> = data.iter().step_by(2).copied().collect();
        interleaved.extend(data.iter().skip(1).step_by(2).copied());

        let expected = c.render(&fold(&c, data));
        for permuted in [reversed, interleaved] {
            let output = c.render(&fold(&c, permuted));
            assert_close(output.correlation, expected.correlation, 1e-12, "r");
            assert_close(output.t_stat, expected.t_stat, 1e-9, "t");
        }
    }

    #[test]
    fn single_row_is_nan() {
        let c = correlation();
        let output = c.render(&fold(&c, [(1.0, 2.0)]));
        assert!(output.correlation.is_nan());
        assert!(output.t_stat.is_nan());
    }

    #[test]
    fn constant_columns_do_not_fail() {
        let c = correlation();
        let output = c.render(&fold(&c, [(2.0, 2.0); 8]));
        assert!(output.correlation.is_nan());
        assert!(output.t_stat.is_nan());
    }

    #[test]
    fn perfect_correlation_t_stat_is_signed_infinity() {
        let c = correlation();
        let up: Vec<_> = (0..10).map(|i| (i as f64, 2.0 * i as f64 + 1.0)).collect();
        let down: Vec<_> = (0..10).map(|i| (i as f64, -3.0 * i as f64)).collect();

        let output = c.render(&fold(&c, up));
        assert_close(output.correlation, 1.0, 1e-12, "r");
        assert_eq!(output.t_stat, f64::INFINITY);

        let output = c.render(&fold(&c, down));
        assert_close(output.correlation, -1.0, 1e-12, "r");
        assert_eq!(output.t_stat, f64::NEG_INFINITY);
    }

    #[test]
    fn mixed_numeric_types_are_coerced() {
        let schema = Schema::new(vec![
            Field::new("x", DataType::Int32),
            Field::new("y", DataType::Float32),
        ]);
        let typed = CorrelationSummarizerFactory::new("x", "y")
            .build(&schema)
            .unwrap();
        let rows: Vec<Row> = vec![
            vec![Value::Int32(1), Value::Float32(2.5)],
            vec![Value::Int32(2), Value::Float32(1.5)],
            vec![Value::Int32(3), Value::Float32(4.0)],
            vec![Value::Int32(4), Value::Float32(3.5)],
        ];

        let c = correlation();
        let expected = c.render(&fold(
            &c,
            [(1.0, 2.5), (2.0, 1.5), (3.0, 4.0), (4.0, 3.5)],
        ));
        let output = summarize(&typed, &rows);
        assert_close(output.correlation, expected.correlation, 1e-12, "r");
    }

    #[test]
    fn cumulative_outputs_are_row_aligned() {
        let c = correlation();
        let rows: Vec<Row> = series(10)
            .into_iter()
            .map(|(x, y)| vec![Value::Float64(x), Value::Float64(y)])
            .collect();

        let outputs = summarize_cumulative(&c, &rows);
        assert_eq!(outputs.len(), rows.len());
        for (i, output) in outputs.iter().enumerate() {
            let expected = summarize(&c, &rows[..=i]);
            assert_eq!(output.correlation.is_nan(), expected.correlation.is_nan());
            if !expected.correlation.is_nan() {
                assert_close(output.correlation, expected.correlation, 1e-12, "r");
            }
        }
    }
}

// ============================================================================
// Multi-correlation
// ============================================================================

mod multi_correlation {
    use super::*;

    fn rows(n: usize) -> Vec<Vec<f64>> {
        series(n)
            .into_iter()
            .enumerate()
            .map(|(i, (x, y))| {
                let t = i as f64;
                vec![x, y, (t * 0.9).sin() + x * 0.1, t * 0.5 - y]
            })
            .collect()
    }

    #[test]
    fn all_pairs_resolution() {
        let pairs = MultiCorrelationSummarizerFactory::new(["a", "b", "c"])
            .pairs()
            .unwrap();
        let names: Vec<_> = pairs.names().collect();
        assert_eq!(names, vec![("a", "b"), ("a", "c"), ("b", "c")]);
    }

    #[test]
    fn cross_pairs_resolution() {
        let pairs = MultiCorrelationSummarizerFactory::new(["a", "b", "c"])
            .with_others(["d"])
            .pairs()
            .unwrap();
        let names: Vec<_> = pairs.names().collect();
        assert_eq!(names, vec![("a", "d"), ("b", "d"), ("c", "d")]);
    }

    #[test]
    fn overlapping_sets_fail_at_construction() {
        let err = MultiCorrelationSummarizerFactory::new(["a"])
            .with_others(["a"])
            .build(&float_schema(&["a"]))
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::OverlappingColumns {
                name: "a".to_string()
            }
        );
    }

    #[test]
    fn matches_single_pair_summarizer() {
        let m = multi(&["a", "b", "c", "d"]);
        let data = rows(40);
        let outputs = m.render(&fold(&m, data.clone()));

        for ((i, j), output) in m.pairs().pairs().iter().copied().zip(&outputs) {
            let c = correlation();
            let expected = c.render(&fold(&c, data.iter().map(|r| (r[i], r[j]))));
            assert_close(output.correlation, expected.correlation, 1e-10, "r");
            assert_close(output.t_stat, expected.t_stat, 1e-6, "t");
        }
    }

    #[test]
    fn merge_equivalent_to_sequential_add() {
        let m = multi(&["a", "b", "c", "d"]);
        let data = rows(50);
        let sequential = m.render(&fold(&m, data.clone()));

        for split in [0, 1, 25, 50] {
            let mut left = fold(&m, data[..split].to_vec());
            let right = fold(&m, data[split..].to_vec());
            m.merge(&mut left, &right).unwrap();

            for (a, b) in m.render(&left).iter().zip(&sequential) {
                assert_close(a.correlation, b.correlation, 1e-12, "r");
            }
        }
    }

    #[test]
    fn order_independence() {
        let m = multi(&["a", "b", "c"]);
        let data: Vec<Vec<f64>> = rows(30).into_iter().map(|r| r[..3].to_vec()).collect();
        let mut reversed = data.clone();
        reversed.reverse();

        let a = m.render(&fold(&m, data));
        let b = m.render(&fold(&m, reversed));
        for (x, y) in a.iter().zip(&b) {
            assert_close(x.correlation, y.correlation, 1e-12, "r");
        }
    }

    #[test]
    fn output_layout_follows_pair_order() {
        let m = MultiCorrelationSummarizerFactory::new(["b", "a"])
            .with_others(["d", "c"])
            .build(&float_schema(&["a", "b", "c", "d"]))
            .unwrap();
        let names: Vec<String> = m.output_fields().into_iter().map(|f| f.name).collect();
        assert_eq!(
            names,
            vec![
                "b_d_correlation",
                "b_d_correlation_t_stat",
                "b_c_correlation",
                "b_c_correlation_t_stat",
                "a_d_correlation",
                "a_d_correlation_t_stat",
                "a_c_correlation",
                "a_c_correlation_t_stat",
            ]
        );

        let output = m.render(&m.zero());
        assert_eq!(m.output_values(&output).len(), names.len());
    }

    #[test]
    fn single_row_is_nan() {
        let m = multi(&["a", "b"]);
        let output = m.render(&fold(&m, vec![vec![1.0, 2.0]]));
        assert!(output[0].correlation.is_nan());
    }
}

// ============================================================================
// Property tests
// ============================================================================

mod properties {
    use super::*;
    use proptest::prelude::*;

    fn values() -> impl Strategy<Value = Vec<(f64, f64)>> {
        prop::collection::vec((-1e3..1e3f64, -1e3..1e3f64), 0..64)
    }

    fn close(a: f64, b: f64) -> bool {
        (a.is_nan() && b.is_nan()) || (a - b).abs() <= 1e-6 * (1.0 + a.abs().max(b.abs()))
    }

    proptest! {
        #[test]
        fn zscore_merge_matches_fold(data in values(), split in 0usize..64) {
            let z = zscore(true);
            let xs: Vec<f64> = data.iter().map(|p| p.0).collect();
            let split = split.min(xs.len());

            let whole = fold(&z, xs.iter().copied());
            let mut left = fold(&z, xs[..split].iter().copied());
            let right = fold(&z, xs[split..].iter().copied());
            z.merge(&mut left, &right).unwrap();

            prop_assert_eq!(left.len(), whole.len());
            if let Some(&last) = xs.last() {
                prop_assert!(close(z.render_current(&left, &last), z.render_current(&whole, &last)));
            }
        }

        #[test]
        fn zscore_merge_commutes(data in values(), split in 0usize..64, x in -1e3..1e3f64) {
            let z = zscore(false);
            let xs: Vec<f64> = data.iter().map(|p| p.0).collect();
            let split = split.min(xs.len());

            let a = fold(&z, xs[..split].iter().copied());
            let b = fold(&z, xs[split..].iter().copied());
            let mut ab = a;
            z.merge(&mut ab, &b).unwrap();
            let mut ba = b;
            z.merge(&mut ba, &a).unwrap();

            prop_assert!(close(z.render_current(&ab, &x), z.render_current(&ba, &x)));
        }

        #[test]
        fn correlation_merge_matches_fold(data in values(), split in 0usize..64) {
            let c = correlation();
            let split = split.min(data.len());

            let whole = c.render(&fold(&c, data.iter().copied()));
            let mut left = fold(&c, data[..split].iter().copied());
            let right = fold(&c, data[split..].iter().copied());
            c.merge(&mut left, &right).unwrap();
            let merged = c.render(&left);

            prop_assert!(close(merged.correlation, whole.correlation));
        }

        #[test]
        fn correlation_order_independent(data in values()) {
            let c = correlation();
            let mut reversed = data.clone();
            reversed.reverse();

            let a = c.render(&fold(&c, data));
            let b = c.render(&fold(&c, reversed));
            prop_assert!(close(a.correlation, b.correlation));
        }

        #[test]
        fn correlation_within_bounds(data in values()) {
            let c = correlation();
            let r = c.render(&fold(&c, data)).correlation;
            prop_assert!(r.is_nan() || (-1.0..=1.0).contains(&r));
        }

        #[test]
        fn multi_subtract_inverts_add(data in values(), extra in (-1e3..1e3f64, -1e3..1e3f64)) {
            let m = multi(&["a", "b"]);
            let inputs: Vec<Vec<f64>> = data.iter().map(|&(x, y)| vec![x, y]).collect();

            let before = fold(&m, inputs);
            let mut state = before.clone();
            let extra = vec![extra.0, extra.1];
            m.add(&mut state, &extra);
            m.subtract(&mut state, &extra);

            prop_assert_eq!(state.len(), before.len());
            let (a, b) = (m.render(&state), m.render(&before));
            prop_assert!(close(a[0].correlation, b[0].correlation));
        }
    }
}

// ============================================================================
// Serialization
// ============================================================================

#[cfg(feature = "serde")]
mod serialization {
    use super::*;
    use flowstats_summarize::statistics::CoMoments;

    #[test]
    fn factories_deserialize_with_defaults() {
        let z: ZScoreSummarizerFactory = serde_json::from_str(r#"{"column": "x"}"#).unwrap();
        assert_eq!(z, ZScoreSummarizerFactory::new("x"));

        let m: MultiCorrelationSummarizerFactory =
            serde_json::from_str(r#"{"columns": ["a", "b"], "others": ["c"]}"#).unwrap();
        assert_eq!(
            m,
            MultiCorrelationSummarizerFactory::new(["a", "b"]).with_others(["c"])
        );
    }

    #[test]
    fn partial_states_round_trip_and_merge() {
        let c = correlation();
        let data = series(20);
        let left = fold(&c, data[..10].iter().copied());
        let right = fold(&c, data[10..].iter().copied());

        let shipped = serde_json::to_string(&right).unwrap();
        let received: CoMoments = serde_json::from_str(&shipped).unwrap();

        let mut merged = left;
        c.merge(&mut merged, &received).unwrap();
        let expected = c.render(&fold(&c, data));
        assert_close(c.render(&merged).correlation, expected.correlation, 1e-12, "r");
    }
}

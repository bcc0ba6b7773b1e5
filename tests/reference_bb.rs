mod fixtures;

use fixtures::{assert_near, load_bb_ref, load_reference_ohlcvs};
use quantedge_series::{Bb, BbConfig};
use std::num::NonZero;

const REF_PATH: &str = "tests/fixtures/data/bb-20-2-close.csv";

/// The running sum of squares loses a few digits against a two-pass
/// deviation; still well under a cent.
const TOLERANCE: f64 = 1e-8;

#[test]
fn bb_20_2_close_matches_reference() {
    let bars = load_reference_ohlcvs();
    let reference = load_bb_ref(REF_PATH);

    let config = BbConfig::close(NonZero::new(20).unwrap());
    let out = Bb::new(config).compute_bars(&bars).unwrap();

    let upper: Vec<_> = out.upper().defined().collect();
    let middle: Vec<_> = out.middle().defined().collect();
    let lower: Vec<_> = out.lower().defined().collect();

    assert_eq!(upper.len(), reference.len());
    assert_eq!(middle.len(), reference.len());
    assert_eq!(lower.len(), reference.len());

    for (i, expected) in reference.iter().enumerate() {
        assert_eq!(upper[i].0, expected.timestamp);

        for (band, actual, wanted) in [
            ("upper", upper[i].1, expected.upper),
            ("middle", middle[i].1, expected.middle),
            ("lower", lower[i].1, expected.lower),
        ] {
            assert_near(
                actual,
                wanted,
                TOLERANCE,
                &format!("BB {band} at {i} (t={})", expected.timestamp),
            );
        }
    }
}

#[test]
fn bands_are_ordered() {
    let bars = load_reference_ohlcvs();
    let out = Bb::new(BbConfig::default()).compute_bars(&bars).unwrap();

    for i in 0..bars.len() {
        if let (Some(upper), Some(middle), Some(lower)) = (
            out.upper().values()[i],
            out.middle().values()[i],
            out.lower().values()[i],
        ) {
            assert!(lower <= middle && middle <= upper, "bands out of order at {i}");
        }
    }
}

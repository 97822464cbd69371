use honest_charts::LabelSide;
use honest_charts::labels::{LabelRequest, resolve_labels, resolve_positions};
use proptest::prelude::*;

#[test]
fn crowded_labels_are_pushed_apart_in_rank_order() {
    let pos = resolve_positions(&[10.0, 10.2, 50.0], 0.5);
    assert_eq!(pos, vec![10.0, 10.5, 50.0]);

    // Input order is kept in the output even when values are unsorted.
    let pos = resolve_positions(&[5.0, 1.0, 1.1], 1.0);
    assert_eq!(pos, vec![5.0, 1.0, 2.0]);
}

#[test]
fn overflowing_labels_warn_but_still_place() {
    let reqs: Vec<LabelRequest> = (0..5)
        .map(|i| LabelRequest::new(&format!("s{i}"), "label", 9.0))
        .collect();
    let layout = resolve_labels(&reqs, LabelSide::Right, 1.0, (0.0, 10.0));
    assert_eq!(layout.placements.len(), 5);
    let w = layout.warning.expect("labels run past the top of the axis");
    assert_eq!(w.side, LabelSide::Right);
    assert!((w.overflow - 3.0).abs() < 1e-9);
}

#[test]
fn roomy_labels_stay_on_their_values() {
    let reqs = vec![
        LabelRequest::new("a", "A", 1.0),
        LabelRequest::new("b", "B", 5.0),
    ];
    let layout = resolve_labels(&reqs, LabelSide::Left, 0.5, (0.0, 10.0));
    assert!(layout.warning.is_none());
    assert!(layout.placements.iter().all(|p| p.position == p.raw));
}

#[test]
fn labels_past_float_precision_stay_distinct_and_warn() {
    let pos = resolve_positions(&[1e17, 1e17], 0.5);
    assert!(pos[0] < pos[1], "labels collapsed: {pos:?}");

    let reqs = vec![
        LabelRequest::new("a", "A", 1e17),
        LabelRequest::new("b", "B", 1e17),
    ];
    let layout = resolve_labels(&reqs, LabelSide::Right, 0.5, (0.0, 2e17));
    assert!(layout.placements[0].position < layout.placements[1].position);
    let w = layout.warning.expect("lost gap is reported");
    assert!(w.message.contains("precision"));
}

proptest! {
    #[test]
    fn positions_keep_rank_and_gap(
        raw in prop::collection::vec(-100.0f64..100.0, 1..30),
        gap in 0.1f64..10.0,
    ) {
        let pos = resolve_positions(&raw, gap);
        prop_assert_eq!(pos.len(), raw.len());
        for i in 0..raw.len() {
            prop_assert!(pos[i] >= raw[i]);
            for j in 0..raw.len() {
                if raw[i] < raw[j] {
                    prop_assert!(pos[i] < pos[j]);
                }
                if i != j {
                    prop_assert!((pos[i] - pos[j]).abs() >= gap - 1e-9);
                }
            }
        }
    }

    #[test]
    fn positions_stay_strictly_ordered_at_any_magnitude(
        base in prop::sample::select(vec![1e15, 1e17, -1e17, 1e300]),
        offsets in prop::collection::vec(0u8..4, 2..12),
        gap in 0.01f64..2.0,
    ) {
        let raw: Vec<f64> = offsets.iter().map(|o| base + *o as f64).collect();
        let pos = resolve_positions(&raw, gap);
        let mut sorted = pos.clone();
        sorted.sort_by(f64::total_cmp);
        prop_assert!(sorted.windows(2).all(|w| w[0] < w[1]), "{:?}", pos);
    }
}

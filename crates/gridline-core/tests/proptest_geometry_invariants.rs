//! Property-based invariant tests for `Rect`.
//!
//! 1. Intersection is commutative.
//! 2. Intersection fits within both inputs.
//! 3. `split_top` partitions the rectangle without losing rows.
//! 4. `row` and `column` never escape the parent.
//! 5. No panics on extreme u16 values.

use gridline_core::geometry::Rect;
use proptest::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────────

fn rect_strategy() -> impl Strategy<Value = Rect> {
    (any::<u16>(), any::<u16>(), any::<u16>(), any::<u16>())
        .prop_map(|(x, y, w, h)| Rect::new(x, y, w, h))
}

fn small_rect_strategy() -> impl Strategy<Value = Rect> {
    (0u16..=500, 0u16..=500, 0u16..=500, 0u16..=500).prop_map(|(x, y, w, h)| Rect::new(x, y, w, h))
}

fn within(inner: &Rect, outer: &Rect) -> bool {
    inner.is_empty()
        || (inner.x >= outer.x
            && inner.y >= outer.y
            && inner.right() <= outer.right()
            && inner.bottom() <= outer.bottom())
}

proptest! {
    #[test]
    fn intersection_commutative(a in small_rect_strategy(), b in small_rect_strategy()) {
        prop_assert_eq!(a.intersection(&b), b.intersection(&a));
    }

    #[test]
    fn intersection_within_both(a in small_rect_strategy(), b in small_rect_strategy()) {
        let i = a.intersection(&b);
        prop_assert!(within(&i, &a), "{:?} escapes {:?}", i, a);
        prop_assert!(within(&i, &b), "{:?} escapes {:?}", i, b);
    }

    #[test]
    fn split_top_partitions(r in small_rect_strategy(), h in 0u16..=600) {
        let (head, body) = r.split_top(h);
        prop_assert_eq!(head.height + body.height, r.height);
        prop_assert_eq!(head.width, r.width);
        prop_assert_eq!(body.y, head.bottom());
    }

    #[test]
    fn row_and_column_stay_inside(r in small_rect_strategy(), off in 0u16..=600, len in 0u16..=600) {
        let row = r.row(off, len);
        let col = r.column(off, len);
        prop_assert!(within(&row, &r));
        prop_assert!(within(&col, &r));
    }

    #[test]
    fn extreme_values_do_not_panic(r in rect_strategy(), off in any::<u16>()) {
        let _ = r.right();
        let _ = r.bottom();
        let _ = r.split_top(off);
        let _ = r.row(off, off);
        let _ = r.column(off, off);
        let _ = r.contains(off, off);
    }
}

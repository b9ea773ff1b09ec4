//! Property-based invariant tests for overflow measurement.
//!
//! 1. Measuring the same pair twice gives identical results
//! 2. Every side is non-negative
//! 3. A rect contained in the container has no overflow
//! 4. `exceeds` is strict: amounts equal to the threshold never violate
//! 5. Translating both rects together does not change the measurement

use proptest::prelude::*;
use slidefence_core::{Overflow, Rect};

fn rect_strategy() -> impl Strategy<Value = Rect> {
    (-500.0f64..2500.0, -500.0f64..2500.0, 0.0f64..3000.0, 0.0f64..3000.0)
        .prop_map(|(x, y, w, h)| Rect::new(x, y, w, h))
}

proptest! {
    #[test]
    fn measure_is_deterministic(e in rect_strategy(), c in rect_strategy()) {
        prop_assert_eq!(Overflow::measure(&e, &c), Overflow::measure(&e, &c));
    }

    #[test]
    fn sides_are_non_negative(e in rect_strategy(), c in rect_strategy()) {
        let o = Overflow::measure(&e, &c);
        prop_assert!(o.top >= 0.0 && o.right >= 0.0 && o.bottom >= 0.0 && o.left >= 0.0);
    }

    #[test]
    fn contained_rect_has_no_overflow(
        c in rect_strategy(),
        fx in 0.0f64..1.0,
        fy in 0.0f64..1.0,
        fw in 0.0f64..1.0,
        fh in 0.0f64..1.0,
    ) {
        let x = c.x + c.width * fx;
        let y = c.y + c.height * fy;
        let w = (c.right() - x) * fw;
        let h = (c.bottom() - y) * fh;
        let inner = Rect::new(x, y, w, h);
        let o = Overflow::measure(&inner, &c);
        prop_assert!(!o.exceeds(1e-6), "unexpected overflow {:?}", o);
    }

    #[test]
    fn threshold_boundary_is_non_violating(amount in 0.0f64..1000.0) {
        let o = Overflow { bottom: amount, ..Overflow::NONE };
        prop_assert!(!o.exceeds(amount));
        prop_assert!(o.exceeds(amount - 0.5) || amount < 0.5);
    }

    #[test]
    fn any_side_above_threshold_violates(
        threshold in 0.0f64..50.0,
        excess in 0.001f64..100.0,
        side in 0usize..4,
    ) {
        let mut o = Overflow::NONE;
        let v = threshold + excess;
        match side {
            0 => o.top = v,
            1 => o.right = v,
            2 => o.bottom = v,
            _ => o.left = v,
        }
        prop_assert!(o.exceeds(threshold));
    }

    #[test]
    fn translation_invariant(
        e in rect_strategy(),
        c in rect_strategy(),
        dx in -100i32..100,
        dy in -100i32..100,
    ) {
        let (dx, dy) = (f64::from(dx), f64::from(dy));
        let a = Overflow::measure(&e, &c);
        let b = Overflow::measure(&e.translate(dx, dy), &c.translate(dx, dy));
        prop_assert!((a.top - b.top).abs() < 1e-6);
        prop_assert!((a.right - b.right).abs() < 1e-6);
        prop_assert!((a.bottom - b.bottom).abs() < 1e-6);
        prop_assert!((a.left - b.left).abs() < 1e-6);
    }
}

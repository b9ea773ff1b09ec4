#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use slidefence_core::{Overflow, Rect, Side};

#[derive(Debug, Arbitrary)]
struct Input {
    element: (f64, f64, f64, f64),
    container: (f64, f64, f64, f64),
    threshold: f64,
}

fuzz_target!(|input: Input| {
    let (ex, ey, ew, eh) = input.element;
    let (cx, cy, cw, ch) = input.container;
    let element = Rect::new(ex, ey, ew, eh);
    let container = Rect::new(cx, cy, cw, ch);

    let a = Overflow::measure(&element, &container);
    let b = Overflow::measure(&element, &container);

    // Every side is non-negative, NaN included.
    for side in [Side::TOP, Side::RIGHT, Side::BOTTOM, Side::LEFT] {
        let v = a.get(side);
        assert!(v >= 0.0, "negative {side:?}: {v}");
    }

    // Deterministic, bit for bit.
    assert_eq!(a.top.to_bits(), b.top.to_bits());
    assert_eq!(a.right.to_bits(), b.right.to_bits());
    assert_eq!(a.bottom.to_bits(), b.bottom.to_bits());
    assert_eq!(a.left.to_bits(), b.left.to_bits());

    // Sides reported over the threshold agree with `exceeds`.
    if input.threshold.is_finite() && input.threshold >= 0.0 {
        let sides = a.sides_exceeding(input.threshold);
        assert_eq!(sides.is_empty(), !a.exceeds(input.threshold));
    }
});

use rust_decimal::Decimal;

/// Assert that allocated parts add back up to the amount they were split from.
pub fn assert_conserved(parts: &[Decimal], total: Decimal) {
    let sum: Decimal = parts.iter().copied().sum();
    assert_eq!(sum, total, "parts {parts:?} sum to {sum}, expected {total}");
}

/// Assert that `actual` is within `tolerance` of `expected`.
pub fn assert_decimal_near(actual: Decimal, expected: Decimal, tolerance: Decimal) {
    let diff = (actual - expected).abs();
    assert!(
        diff <= tolerance,
        "expected {} ± {}, got {}",
        expected,
        tolerance,
        actual
    );
}

//! Fixed-point quantization for quantities and money.
//!
//! Quantities carry three decimal places and money two, matching the
//! precision of the persisted columns. Intermediate arithmetic stays at full
//! `Decimal` precision; rounding happens only when a value is stored or shown.

use rust_decimal::{Decimal, RoundingStrategy};

/// Decimal places kept for quantities (kg, pcs, ...).
pub const QUANTITY_SCALE: u32 = 3;

/// Decimal places kept for money amounts.
pub const MONEY_SCALE: u32 = 2;

/// Round a quantity to storage precision, half away from zero.
#[must_use]
pub fn quantity(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(QUANTITY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Round a money amount to storage precision, half away from zero.
#[must_use]
pub fn money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Sum an iterator of decimals.
pub fn sum<I>(values: I) -> Decimal
where
    I: IntoIterator<Item = Decimal>,
{
    values.into_iter().fold(Decimal::ZERO, |acc, v| acc + v)
}

/// Split `total` across `weights` at `scale` decimal places.
///
/// Uses largest-remainder apportionment: every share is first truncated to
/// `scale`, then the leftover smallest units go to the shares with the
/// largest truncated remainder (earlier entries win ties). When `total` has
/// at most `scale` decimal places the shares sum to exactly `total`.
/// Non-positive weight sums yield all-zero shares.
#[must_use]
pub fn apportion(total: Decimal, weights: &[Decimal], scale: u32) -> Vec<Decimal> {
    let weight_sum = sum(weights.iter().copied());
    if weight_sum <= Decimal::ZERO {
        return vec![Decimal::ZERO; weights.len()];
    }

    let unit = Decimal::new(1, scale);
    let mut shares = Vec::with_capacity(weights.len());
    let mut remainders = Vec::with_capacity(weights.len());
    for (index, weight) in weights.iter().enumerate() {
        let exact = total * *weight / weight_sum;
        let truncated = exact.round_dp_with_strategy(scale, RoundingStrategy::ToZero);
        shares.push(truncated);
        remainders.push((exact - truncated, index));
    }

    let mut leftover = total - sum(shares.iter().copied());
    remainders.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
    for (_, index) in remainders {
        if leftover < unit {
            break;
        }
        shares[index] += unit;
        leftover -= unit;
    }
    shares
}

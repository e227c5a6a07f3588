/// All amounts are carried as i64 minor units (satang for THB).
/// Two decimal places of the major unit, no floats in money paths.
pub type MinorUnits = i64;

/// Whole-number percentage of an amount, rounded half-up to the minor unit.
pub fn percentage_of(amount: MinorUnits, percent: i64) -> MinorUnits {
    (amount * percent + 50) / 100
}

/// Basis-point share of an amount, rounded half-up to the minor unit.
pub fn basis_points_of(amount: MinorUnits, bps: i64) -> MinorUnits {
    (amount * bps + 5_000) / 10_000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage_rounds_half_up() {
        assert_eq!(percentage_of(5000, 20), 1000);
        assert_eq!(percentage_of(333, 10), 33); // 33.3 rounds down
        assert_eq!(percentage_of(335, 10), 34); // 33.5 rounds up
        assert_eq!(percentage_of(0, 50), 0);
    }

    #[test]
    fn test_basis_points() {
        assert_eq!(basis_points_of(10_000, 500), 500); // 5%
        assert_eq!(basis_points_of(4500, 500), 225);
        assert_eq!(basis_points_of(1, 500), 0); // 0.05 rounds down
    }
}

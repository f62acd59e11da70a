use serde::{Deserialize, Serialize};

use crate::diary::Evaluation;

/// 0.04% of the day's base price per minute: a full productive day doubles it.
pub const DEFAULT_RATE_PER_MINUTE: f64 = 0.0004;

/// Anchor price used when no day has been committed yet.
pub const DEFAULT_ANCHOR_PRICE: f64 = 1000.0;

/// Price evolution parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceModel {
    pub rate_per_minute: f64,
}

impl Default for PriceModel {
    fn default() -> Self {
        Self {
            rate_per_minute: DEFAULT_RATE_PER_MINUTE,
        }
    }
}

impl PriceModel {
    pub fn new(rate_per_minute: f64) -> Self {
        Self { rate_per_minute }
    }

    /// Swing for `elapsed_minutes` against the day's `base` (its previous close).
    pub fn variance(&self, base: f64, elapsed_minutes: f64) -> f64 {
        base * elapsed_minutes * self.rate_per_minute
    }

    /// Next price after an activity. `None` for `Cancel`.
    ///
    /// The swing is always computed from `base`, so moves within a day add up
    /// linearly instead of compounding on `previous`.
    pub fn evolve(
        &self,
        base: f64,
        previous: f64,
        elapsed_minutes: f64,
        eval: Evaluation,
    ) -> Option<f64> {
        let variance = self.variance(base, elapsed_minutes);
        match eval {
            Evaluation::Productive => Some(previous + variance),
            Evaluation::Unproductive => Some(previous - variance),
            Evaluation::Neutral => Some(previous),
            Evaluation::Cancel => None,
        }
    }
}

/// [`PriceModel::evolve`] with the default rate.
pub fn evolve(base: f64, previous: f64, elapsed_minutes: f64, eval: Evaluation) -> Option<f64> {
    PriceModel::default().evolve(base, previous, elapsed_minutes, eval)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn productive_hour_from_default_anchor() {
        let price = evolve(1000.0, 1000.0, 60.0, Evaluation::Productive).unwrap();
        assert!((price - 1024.0).abs() < 1e-9);
    }

    #[test]
    fn full_day_swing_equals_base() {
        let model = PriceModel::default();
        assert!((model.variance(1000.0, 1440.0) - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn cancel_produces_nothing() {
        assert_eq!(evolve(1000.0, 1000.0, 600.0, Evaluation::Cancel), None);
    }

    #[test]
    fn variance_uses_base_not_running_price() {
        let after_first = evolve(1000.0, 1000.0, 60.0, Evaluation::Productive).unwrap();
        let after_second = evolve(1000.0, after_first, 60.0, Evaluation::Productive).unwrap();
        assert!((after_second - 1048.0).abs() < 1e-9);
    }

    proptest! {
        #[test]
        fn neutral_keeps_previous(base in 1.0f64..1e6, prev in -1e6f64..1e6, mins in 0.0f64..1440.0) {
            prop_assert_eq!(evolve(base, prev, mins, Evaluation::Neutral), Some(prev));
        }

        #[test]
        fn productive_and_unproductive_are_symmetric(
            base in 1.0f64..1e6,
            prev in -1e6f64..1e6,
            mins in 0.0f64..1440.0,
        ) {
            let up = evolve(base, prev, mins, Evaluation::Productive).unwrap();
            let down = evolve(base, prev, mins, Evaluation::Unproductive).unwrap();
            let tolerance = 1e-9 * (1.0 + base.abs() + prev.abs());
            prop_assert!(((up - prev) - (prev - down)).abs() <= tolerance);
        }

        #[test]
        fn evolve_is_deterministic(base in 1.0f64..1e6, prev in -1e6f64..1e6, mins in 0.0f64..1440.0) {
            for eval in [Evaluation::Productive, Evaluation::Unproductive, Evaluation::Neutral] {
                prop_assert_eq!(evolve(base, prev, mins, eval), evolve(base, prev, mins, eval));
            }
        }
    }
}

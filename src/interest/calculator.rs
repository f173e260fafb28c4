use chrono::{Datelike, NaiveDate};
use tracing::trace;

use crate::decimal::{Money, Rate};
use crate::interest::InterestCalculation;

/// day count convention for late-payment interest
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum DayCountConvention {
    /// actual days / 365, leap years ignored
    #[default]
    Actual365,
    /// actual days / actual days in year, split at year boundaries
    ActualActual,
}

/// simple daily-prorated interest over a fixed 365-day year.
///
/// Returns zero when either the period or the rate is not positive.
pub fn calculate_interest(principal: Money, days_overdue: i64, annual_rate: Rate) -> Money {
    if days_overdue <= 0 || !annual_rate.is_positive() {
        return Money::ZERO;
    }
    principal.apply_rate(annual_rate, clamp_days(days_overdue), 365)
}

fn clamp_days(days: i64) -> u32 {
    u32::try_from(days).unwrap_or(u32::MAX)
}

/// engine for late-payment interest between a due date and a reference date
#[derive(Debug, Clone, Copy, Default)]
pub struct InterestEngine {
    pub convention: DayCountConvention,
}

impl InterestEngine {
    pub fn new(convention: DayCountConvention) -> Self {
        Self { convention }
    }

    /// whole days from `due_date` to `today`, zero when not yet due
    pub fn days_overdue(due_date: NaiveDate, today: NaiveDate) -> i64 {
        (today - due_date).num_days().max(0)
    }

    /// get year basis for the convention
    pub fn year_basis(&self, year: i32) -> u32 {
        match self.convention {
            DayCountConvention::Actual365 => 365,
            DayCountConvention::ActualActual => {
                if is_leap_year(year) { 366 } else { 365 }
            }
        }
    }

    /// interest accrued on `principal` from `due_date` (exclusive) to `today` (inclusive)
    pub fn interest_between(
        &self,
        principal: Money,
        annual_rate: Rate,
        due_date: NaiveDate,
        today: NaiveDate,
    ) -> InterestCalculation {
        let days = Self::days_overdue(due_date, today);
        let interest_amount = match self.convention {
            DayCountConvention::Actual365 => calculate_interest(principal, days, annual_rate),
            DayCountConvention::ActualActual => {
                self.split_by_year(principal, annual_rate, due_date, today)
            }
        };

        trace!(%principal, %annual_rate, days, %interest_amount, "interest computed");

        InterestCalculation {
            interest_amount,
            annual_rate,
            days: clamp_days(days),
            principal_base: principal,
            convention: self.convention,
        }
    }

    /// prorate each calendar-year slice of the period by that year's length
    fn split_by_year(
        &self,
        principal: Money,
        annual_rate: Rate,
        due_date: NaiveDate,
        today: NaiveDate,
    ) -> Money {
        if today <= due_date || !annual_rate.is_positive() {
            return Money::ZERO;
        }

        let mut total = Money::ZERO;
        let mut slice_start = due_date;
        while slice_start < today {
            // the first day charged in this slice decides its year
            let Some(first_charged) = slice_start.succ_opt() else {
                break;
            };
            let year = first_charged.year();
            let year_end = NaiveDate::from_ymd_opt(year, 12, 31).unwrap_or(today);
            let slice_end = year_end.min(today);
            let days = (slice_end - slice_start).num_days();
            total += principal.apply_rate(annual_rate, clamp_days(days), self.year_basis(year));
            slice_start = slice_end;
        }
        total
    }
}

/// check if year is a leap year
fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || (year % 400 == 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_zero_for_non_positive_days() {
        let principal = Money::from_major(1_000);
        let rate = Rate::from_percent(dec!(12.62));
        assert_eq!(calculate_interest(principal, 0, rate), Money::ZERO);
        assert_eq!(calculate_interest(principal, -30, rate), Money::ZERO);
    }

    #[test]
    fn test_zero_for_non_positive_rate() {
        let principal = Money::from_major(1_000);
        assert_eq!(calculate_interest(principal, 40, Rate::ZERO), Money::ZERO);
        assert_eq!(
            calculate_interest(principal, 40, Rate::from_percent(dec!(-1))),
            Money::ZERO
        );
    }

    #[test]
    fn test_simple_proration() {
        let principal = Money::from_major(1_000);
        let rate = Rate::from_percent(dec!(12.62));

        // 1000 * 12.62 * 40 / 36500
        let interest = calculate_interest(principal, 40, rate);
        assert_eq!(interest.round_cents(), Money::from_minor(1383));

        let full_year = calculate_interest(principal, 365, rate);
        assert_eq!(full_year.round_cents(), Money::from_minor(12_620));
    }

    #[test]
    fn test_days_overdue() {
        assert_eq!(InterestEngine::days_overdue(date(2024, 1, 1), date(2024, 2, 10)), 40);
        assert_eq!(InterestEngine::days_overdue(date(2024, 3, 1), date(2024, 2, 10)), 0);
        assert_eq!(InterestEngine::days_overdue(date(2024, 2, 10), date(2024, 2, 10)), 0);
    }

    #[test]
    fn test_engine_matches_plain_calculator() {
        let engine = InterestEngine::default();
        let principal = Money::from_major(2_500);
        let rate = Rate::from_percent(dec!(8.62));

        let result = engine.interest_between(principal, rate, date(2024, 1, 10), date(2024, 4, 1));
        assert_eq!(result.days, 82);
        assert_eq!(result.interest_amount, calculate_interest(principal, 82, rate));
        assert_eq!(result.convention, DayCountConvention::Actual365);
    }

    #[test]
    fn test_leap_year() {
        assert!(is_leap_year(2024));
        assert!(!is_leap_year(2023));
        assert!(is_leap_year(2000));
        assert!(!is_leap_year(1900));
    }

    #[test]
    fn test_actual_actual_in_leap_year() {
        let engine = InterestEngine::new(DayCountConvention::ActualActual);
        let principal = Money::from_major(36_600);
        let rate = Rate::from_percent(dec!(10));

        // 10 days entirely in 2024: 36600 * 10% * 10 / 366 = 100
        let result = engine.interest_between(principal, rate, date(2024, 3, 1), date(2024, 3, 11));
        assert_eq!(result.interest_amount.round_cents(), Money::from_major(100));
    }

    #[test]
    fn test_actual_actual_across_year_end() {
        let engine = InterestEngine::new(DayCountConvention::ActualActual);
        let principal = Money::from_major(100_000);
        let rate = Rate::from_percent(dec!(10));

        // 2023-12-21 -> 2024-01-10: 10 days in 2023, 10 days in 2024
        let result = engine.interest_between(principal, rate, date(2023, 12, 21), date(2024, 1, 10));
        assert_eq!(result.days, 20);

        let expected = principal.apply_rate(rate, 10, 365) + principal.apply_rate(rate, 10, 366);
        assert_eq!(result.interest_amount, expected);

        let naive = calculate_interest(principal, 20, rate);
        assert!(result.interest_amount < naive);
    }

    #[test]
    fn test_actual_actual_not_yet_due() {
        let engine = InterestEngine::new(DayCountConvention::ActualActual);
        let result = engine.interest_between(
            Money::from_major(1_000),
            Rate::from_percent(dec!(9)),
            date(2024, 5, 1),
            date(2024, 4, 1),
        );
        assert_eq!(result.interest_amount, Money::ZERO);
        assert_eq!(result.days, 0);
    }
}

//! Month partitioning into Monday-start weeks.
//!
//! The partition is the canonical week layout for a month: the
//! reconciliation pass regenerates it on every read and diffs the stored
//! weeks against it, so this module must stay pure and deterministic.

use chrono::{Datelike, Duration, NaiveDate};

use crate::{EngineError, ResultEngine};

/// One calendar week of a month, clipped to the month boundaries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WeekSpan {
    /// 1-based, sequential within the month.
    pub week_number: i32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Even share of the monthly budget, before any rollover.
    pub base_budget: i64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MonthPartition {
    pub weeks: Vec<WeekSpan>,
}

impl MonthPartition {
    pub fn total_weeks(&self) -> usize {
        self.weeks.len()
    }

    /// The week span whose date range contains `date`, if any.
    pub fn span_containing(&self, date: NaiveDate) -> Option<&WeekSpan> {
        self.weeks
            .iter()
            .find(|span| span.start_date <= date && date <= span.end_date)
    }
}

/// Returns the first and last day of a month.
pub fn month_bounds(year: i32, month: u32) -> ResultEngine<(NaiveDate, NaiveDate)> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| EngineError::Validation(format!("invalid month: {year}-{month}")))?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .ok_or_else(|| EngineError::Validation(format!("invalid month: {year}-{month}")))?;
    Ok((start, next - Duration::days(1)))
}

/// Splits a month into Monday-start weeks and the monthly budget into even
/// base shares.
///
/// Week boundaries are clipped to `[month_start, month_end]`, so the spans
/// form a contiguous, non-overlapping cover of the month. The budget is
/// divided by the actual number of intersecting weeks; integer remainder
/// units go one each to the earliest weeks so the shares sum exactly to
/// `total_budget`.
pub fn partition_month(year: i32, month: u32, total_budget: i64) -> ResultEngine<MonthPartition> {
    if total_budget < 0 {
        return Err(EngineError::Validation(
            "total budget must not be negative".to_string(),
        ));
    }
    let (month_start, month_end) = month_bounds(year, month)?;

    // Monday on/before the 1st; iterate whole weeks until past month end.
    let mut cursor =
        month_start - Duration::days(i64::from(month_start.weekday().num_days_from_monday()));
    let mut spans = Vec::new();
    while cursor <= month_end {
        spans.push((cursor.max(month_start), (cursor + Duration::days(6)).min(month_end)));
        cursor += Duration::days(7);
    }

    let total_weeks = spans.len() as i64;
    let base = total_budget / total_weeks;
    let remainder = total_budget - base * total_weeks;

    let weeks = spans
        .into_iter()
        .enumerate()
        .map(|(idx, (start_date, end_date))| WeekSpan {
            week_number: idx as i32 + 1,
            start_date,
            end_date,
            base_budget: base + i64::from((idx as i64) < remainder),
        })
        .collect();

    Ok(MonthPartition { weeks })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn four_even_weeks_split_evenly() {
        // February 2021: starts on a Monday, exactly 28 days.
        let partition = partition_month(2021, 2, 140_000).unwrap();
        assert_eq!(partition.total_weeks(), 4);
        for span in &partition.weeks {
            assert_eq!(span.base_budget, 35_000);
        }
        assert_eq!(
            partition.weeks[0].start_date,
            NaiveDate::from_ymd_opt(2021, 2, 1).unwrap()
        );
        assert_eq!(
            partition.weeks[3].end_date,
            NaiveDate::from_ymd_opt(2021, 2, 28).unwrap()
        );
    }

    #[test]
    fn spans_cover_month_contiguously() {
        for (year, month) in [(2026, 8), (2026, 2), (2025, 12), (2024, 2)] {
            let partition = partition_month(year, month, 100_000).unwrap();
            let (start, end) = month_bounds(year, month).unwrap();
            assert_eq!(partition.weeks[0].start_date, start);
            assert_eq!(partition.weeks.last().unwrap().end_date, end);
            for pair in partition.weeks.windows(2) {
                assert_eq!(
                    pair[1].start_date,
                    pair[0].end_date + Duration::days(1),
                    "{year}-{month} weeks must be contiguous"
                );
            }
            for span in &partition.weeks {
                assert!(span.start_date >= start && span.end_date <= end);
            }
        }
    }

    #[test]
    fn six_week_month_divides_by_actual_week_count() {
        // August 2026: Aug 1 is a Saturday and Aug 31 a Monday, so six
        // distinct Monday-start weeks intersect the month.
        let partition = partition_month(2026, 8, 120_000).unwrap();
        assert_eq!(partition.total_weeks(), 6);
        assert_eq!(partition.weeks[0].base_budget, 20_000);
        assert_eq!(
            partition.weeks[0].end_date,
            NaiveDate::from_ymd_opt(2026, 8, 2).unwrap()
        );
        assert_eq!(
            partition.weeks[5].start_date,
            NaiveDate::from_ymd_opt(2026, 8, 31).unwrap()
        );
    }

    #[test]
    fn base_shares_sum_to_budget_despite_rounding() {
        let partition = partition_month(2026, 8, 100_003).unwrap();
        let sum: i64 = partition.weeks.iter().map(|w| w.base_budget).sum();
        assert_eq!(sum, 100_003);
        // Remainder units land on the earliest weeks.
        assert!(partition.weeks[0].base_budget >= partition.weeks[5].base_budget);
        assert!(partition.weeks[0].base_budget - partition.weeks[5].base_budget <= 1);
    }

    #[test]
    fn span_containing_finds_owning_week() {
        let partition = partition_month(2026, 8, 120_000).unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 8, 15).unwrap();
        let span = partition.span_containing(date).unwrap();
        assert_eq!(span.week_number, 3);
        assert!(partition
            .span_containing(NaiveDate::from_ymd_opt(2026, 9, 1).unwrap())
            .is_none());
    }

    #[test]
    fn invalid_month_is_rejected() {
        assert!(matches!(
            partition_month(2026, 13, 1000),
            Err(EngineError::Validation(_))
        ));
        assert!(matches!(
            partition_month(2026, 8, -1),
            Err(EngineError::Validation(_))
        ));
    }
}

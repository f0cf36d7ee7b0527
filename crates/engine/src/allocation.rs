//! Percentage-based category allocation.

use uuid::Uuid;

use crate::{EngineError, ResultEngine};

/// Tolerance when checking that allocations sum to 100%.
pub const ALLOCATION_EPSILON: f64 = 0.01;

/// Categories seeded when a user switches to categorized mode without any
/// categories of their own. Percentages sum to 100.
pub const DEFAULT_CATEGORIES: [(&str, f64); 5] = [
    ("Alimentación", 40.0),
    ("Hogar", 20.0),
    ("Transporte", 15.0),
    ("Ocio", 15.0),
    ("Otros", 10.0),
];

/// Checks a single category percentage is within `[0, 100]`.
pub fn validate_percentage(allocation: f64) -> ResultEngine<()> {
    if !allocation.is_finite() || !(0.0..=100.0).contains(&allocation) {
        return Err(EngineError::Validation(format!(
            "allocation must be between 0 and 100, got {allocation}"
        )));
    }
    Ok(())
}

/// Checks that the allocations of a full category set sum to 100 within
/// [`ALLOCATION_EPSILON`].
pub fn validate_allocations(allocations: &[f64]) -> ResultEngine<()> {
    for allocation in allocations {
        validate_percentage(*allocation)?;
    }
    let sum: f64 = allocations.iter().sum();
    if (sum - 100.0).abs() > ALLOCATION_EPSILON {
        return Err(EngineError::Validation(format!(
            "allocations must sum to 100, got {sum:.2}"
        )));
    }
    Ok(())
}

/// Distributes a week's budget across categories.
///
/// Each amount is the rounded percentage share; the last category absorbs
/// the integer remainder so the amounts always sum exactly to
/// `weekly_budget`. Callers must pass the categories in a stable order.
pub fn allocate(weekly_budget: i64, categories: &[(Uuid, f64)]) -> Vec<(Uuid, i64)> {
    if categories.is_empty() {
        return Vec::new();
    }
    let mut out = Vec::with_capacity(categories.len());
    let mut assigned = 0i64;
    for (idx, (id, allocation)) in categories.iter().enumerate() {
        let amount = if idx == categories.len() - 1 {
            weekly_budget - assigned
        } else {
            (weekly_budget as f64 * allocation / 100.0).round() as i64
        };
        assigned += amount;
        out.push((*id, amount));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<Uuid> {
        (0..n).map(|_| Uuid::new_v4()).collect()
    }

    #[test]
    fn default_categories_sum_to_100() {
        let sum: f64 = DEFAULT_CATEGORIES.iter().map(|(_, p)| p).sum();
        assert!((sum - 100.0).abs() < ALLOCATION_EPSILON);
    }

    #[test]
    fn rejects_bad_sums_and_percentages() {
        assert!(validate_allocations(&[60.0, 30.0]).is_err());
        assert!(validate_allocations(&[60.0, 50.0]).is_err());
        assert!(validate_allocations(&[110.0, -10.0]).is_err());
        assert!(validate_allocations(&[60.0, 40.0]).is_ok());
        assert!(validate_allocations(&[60.004, 39.998]).is_ok());
    }

    #[test]
    fn allocated_amounts_sum_exactly_to_budget() {
        let ids = ids(3);
        let categories: Vec<(Uuid, f64)> =
            ids.iter().copied().zip([33.33, 33.33, 33.34]).collect();
        let amounts = allocate(10_001, &categories);
        assert_eq!(amounts.iter().map(|(_, a)| a).sum::<i64>(), 10_001);
        assert_eq!(amounts[0].1, 3_333);
    }

    #[test]
    fn shares_follow_percentages() {
        let ids = ids(2);
        let categories: Vec<(Uuid, f64)> = ids.iter().copied().zip([40.0, 60.0]).collect();
        let amounts = allocate(35_000, &categories);
        assert_eq!(amounts[0].1, 14_000);
        assert_eq!(amounts[1].1, 21_000);
    }

    #[test]
    fn empty_category_set_allocates_nothing() {
        assert!(allocate(35_000, &[]).is_empty());
    }
}

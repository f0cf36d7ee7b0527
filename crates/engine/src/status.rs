//! Budget usage status derivation.

use serde::{Deserialize, Serialize};

use crate::EngineError;

/// Traffic-light classification of remaining budget.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrafficLight {
    Green,
    Yellow,
    Red,
}

impl TrafficLight {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Green => "green",
            Self::Yellow => "yellow",
            Self::Red => "red",
        }
    }

    /// Classifies by percentage of budget remaining: more than half left is
    /// green, under 20% left is red, yellow in between.
    pub fn from_remaining_percent(remaining: f64) -> Self {
        if remaining > 50.0 {
            Self::Green
        } else if remaining >= 20.0 {
            Self::Yellow
        } else {
            Self::Red
        }
    }

    pub fn for_usage(spent: i64, budget: i64) -> Self {
        Self::from_remaining_percent(100.0 - percentage_used(spent, budget))
    }
}

impl TryFrom<&str> for TrafficLight {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "green" => Ok(Self::Green),
            "yellow" => Ok(Self::Yellow),
            "red" => Ok(Self::Red),
            other => Err(EngineError::Validation(format!(
                "invalid traffic light: {other}"
            ))),
        }
    }
}

/// Percentage of `budget` consumed by `spent`. A zero budget maps to 0 so a
/// week without budget never divides by zero; a negative budget (a deficit
/// carry larger than the base share) counts as fully used.
pub fn percentage_used(spent: i64, budget: i64) -> f64 {
    if budget < 0 {
        return 100.0;
    }
    if budget == 0 {
        return 0.0;
    }
    spent as f64 / budget as f64 * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_follow_remaining_percent() {
        assert_eq!(TrafficLight::from_remaining_percent(51.0), TrafficLight::Green);
        assert_eq!(TrafficLight::from_remaining_percent(50.0), TrafficLight::Yellow);
        assert_eq!(TrafficLight::from_remaining_percent(20.0), TrafficLight::Yellow);
        assert_eq!(TrafficLight::from_remaining_percent(19.9), TrafficLight::Red);
        assert_eq!(TrafficLight::from_remaining_percent(-30.0), TrafficLight::Red);
    }

    #[test]
    fn usage_handles_zero_budget() {
        assert_eq!(percentage_used(500, 0), 0.0);
        assert_eq!(TrafficLight::for_usage(500, 0), TrafficLight::Green);
    }

    #[test]
    fn negative_budget_counts_as_fully_used() {
        assert_eq!(percentage_used(0, -5_000), 100.0);
        assert_eq!(TrafficLight::for_usage(0, -5_000), TrafficLight::Red);
    }

    #[test]
    fn usage_over_budget_is_red() {
        assert_eq!(TrafficLight::for_usage(40_000, 35_000), TrafficLight::Red);
        assert_eq!(TrafficLight::for_usage(10_000, 35_000), TrafficLight::Green);
    }

    #[test]
    fn round_trips_as_str() {
        for light in [TrafficLight::Green, TrafficLight::Yellow, TrafficLight::Red] {
            assert_eq!(TrafficLight::try_from(light.as_str()).unwrap(), light);
        }
        assert!(TrafficLight::try_from("blue").is_err());
    }
}

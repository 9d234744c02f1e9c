//! Preference demand signal for elective placement.
//!
//! Each advisor contributes `1 / (rank + 1)` to every session on their
//! preference list, so first choices weigh most and long tails fade out.

use std::collections::HashMap;

use crate::models::Advisor;

/// Weight contributed by a preference at 0-based `rank`.
#[inline]
pub fn preference_weight(rank: usize) -> f64 {
    1.0 / (rank as f64 + 1.0)
}

/// Aggregated preference weight per session ID.
pub fn session_demand(advisors: &[Advisor]) -> HashMap<String, f64> {
    let mut demand: HashMap<String, f64> = HashMap::new();
    for advisor in advisors {
        for (rank, session_id) in advisor.unique_preferences().enumerate() {
            *demand.entry(session_id.to_string()).or_insert(0.0) += preference_weight(rank);
        }
    }
    demand
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_higher_rank_weighs_more() {
        assert!(preference_weight(0) > preference_weight(1));
        assert!((preference_weight(3) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_session_demand() {
        let advisors = vec![
            Advisor::new("A1", "Ann").with_preferences(["E1", "E2"]),
            Advisor::new("A2", "Bob").with_preferences(["E2"]),
        ];
        let d = session_demand(&advisors);
        assert!((d["E1"] - 1.0).abs() < 1e-12);
        assert!((d["E2"] - 1.5).abs() < 1e-12);
        assert!(!d.contains_key("E3"));
    }

    #[test]
    fn test_repeated_preference_counts_once() {
        let advisors = vec![Advisor {
            id: "A1".into(),
            name: "Ann".into(),
            preferences: vec!["E1".into(), "E2".into(), "E1".into()],
        }];
        let d = session_demand(&advisors);
        assert!((d["E1"] - 1.0).abs() < 1e-12);
        assert!((d["E2"] - 0.5).abs() < 1e-12);
    }
}

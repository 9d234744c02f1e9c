//! Advisor (attendee) model.

use serde::{Deserialize, Serialize};

/// An attendee with a ranked list of preferred sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advisor {
    /// Unique advisor identifier.
    pub id: String,
    /// Full name, also used to match speaker fields.
    pub name: String,
    /// Preferred session IDs, most preferred first.
    ///
    /// Input may repeat a session; only its first occurrence counts. Read
    /// ranks through [`Advisor::unique_preferences`] or [`Advisor::rank_of`].
    pub preferences: Vec<String>,
}

impl Advisor {
    /// Creates an advisor without preferences.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            preferences: Vec::new(),
        }
    }

    /// Sets the ranked preferences. Later repeats of a session are dropped.
    pub fn with_preferences<I, S>(mut self, preferences: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.preferences.clear();
        for p in preferences {
            let p = p.into();
            if !self.preferences.contains(&p) {
                self.preferences.push(p);
            }
        }
        self
    }

    /// Preferences in rank order with later repeats skipped.
    pub fn unique_preferences(&self) -> impl Iterator<Item = &str> + '_ {
        self.preferences
            .iter()
            .enumerate()
            .filter(|&(i, p)| !self.preferences[..i].contains(p))
            .map(|(_, p)| p.as_str())
    }

    /// 0-based rank of a session among the unique preferences.
    pub fn rank_of(&self, session_id: &str) -> Option<usize> {
        self.unique_preferences().position(|p| p == session_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preferences_deduplicated() {
        let a = Advisor::new("A1", "Ann").with_preferences(["E2", "E1", "E2", "E3"]);
        assert_eq!(a.preferences, vec!["E2", "E1", "E3"]);
        assert_eq!(a.rank_of("E1"), Some(1));
        assert_eq!(a.rank_of("E9"), None);
    }

    #[test]
    fn test_deserialized_repeats_keep_first_rank() {
        let a: Advisor = serde_json::from_str(
            r#"{"id":"A1","name":"Ann","preferences":["E1","E2","E1","E3","E2"]}"#,
        )
        .unwrap();
        assert_eq!(a.preferences.len(), 5);
        assert_eq!(a.unique_preferences().collect::<Vec<_>>(), vec!["E1", "E2", "E3"]);
        assert_eq!(a.rank_of("E1"), Some(0));
        assert_eq!(a.rank_of("E3"), Some(2));
    }
}

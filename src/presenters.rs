//! Presenter obligations derived from free-text speaker fields.
//!
//! # Matching
//!
//! A speaker field is split on `/`, `&`, `+`, `,` and the word "and". Each
//! fragment and each advisor name is normalized to lower-case alphanumerics
//! ("J. Vos" → "jvos"). An advisor matches a fragment when one normalized
//! string contains the other.
//!
//! Collisions: strings shorter than [`MIN_MATCH_LEN`] never match, and when a
//! fragment equals some advisor's name exactly, only exact matches count. This
//! keeps "Vos" from also obligating "Vossen" when a "Vos" is registered.
//!
//! Text that matches nobody yields no obligation; the session is then simply
//! attended by whoever the optimizer places there.

use std::collections::{BTreeMap, HashMap};

use log::warn;
use serde::{Deserialize, Serialize};

use crate::models::{Advisor, ScheduledInstance, Session};

/// Normalized strings shorter than this never match.
pub const MIN_MATCH_LEN: usize = 3;

/// An advisor compelled to be at one instance as speaker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenterObligation {
    /// Presenting advisor.
    pub advisor_id: String,
    /// Session presented.
    pub session_id: String,
    /// Slot of the instance.
    pub slot_id: String,
    /// Room of the instance.
    pub room_id: String,
}

/// Obligations grouped by slot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PresenterObligations {
    by_slot: BTreeMap<String, Vec<PresenterObligation>>,
}

impl PresenterObligations {
    /// Obligations in a slot.
    pub fn for_slot(&self, slot_id: &str) -> &[PresenterObligation] {
        self.by_slot.get(slot_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The obligation of an advisor in a slot, if any.
    pub fn find(&self, advisor_id: &str, slot_id: &str) -> Option<&PresenterObligation> {
        self.for_slot(slot_id)
            .iter()
            .find(|o| o.advisor_id == advisor_id)
    }

    /// All obligations, ordered by slot ID.
    pub fn iter(&self) -> impl Iterator<Item = &PresenterObligation> {
        self.by_slot.values().flatten()
    }

    /// Total number of obligations.
    pub fn len(&self) -> usize {
        self.by_slot.values().map(Vec::len).sum()
    }

    /// Whether no advisor presents anything.
    pub fn is_empty(&self) -> bool {
        self.by_slot.values().all(Vec::is_empty)
    }

    fn push(&mut self, obligation: PresenterObligation) {
        if let Some(existing) = self.find(&obligation.advisor_id, &obligation.slot_id) {
            warn!(
                "Advisor '{}' presents both '{}' and '{}' in slot '{}'; keeping '{}'",
                obligation.advisor_id,
                existing.session_id,
                obligation.session_id,
                obligation.slot_id,
                existing.session_id
            );
            return;
        }
        self.by_slot
            .entry(obligation.slot_id.clone())
            .or_default()
            .push(obligation);
    }
}

/// Lower-cases and strips everything but letters and digits.
pub fn normalize_name(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Splits a speaker field into normalized, non-empty fragments.
pub fn split_speakers(field: &str) -> Vec<String> {
    let mut fragments = Vec::new();
    for piece in field.split(['/', '&', '+', ',']) {
        let mut words: Vec<&str> = Vec::new();
        for word in piece.split_whitespace() {
            if word.eq_ignore_ascii_case("and") {
                flush_fragment(&mut words, &mut fragments);
            } else {
                words.push(word);
            }
        }
        flush_fragment(&mut words, &mut fragments);
    }
    fragments
}

fn flush_fragment(words: &mut Vec<&str>, fragments: &mut Vec<String>) {
    let normalized = normalize_name(&words.join(" "));
    if !normalized.is_empty() {
        fragments.push(normalized);
    }
    words.clear();
}

/// Indices of the advisors named in a speaker field.
pub fn match_speakers(field: &str, advisors: &[Advisor]) -> Vec<usize> {
    let names: Vec<String> = advisors.iter().map(|a| normalize_name(&a.name)).collect();
    let mut matched = Vec::new();

    for fragment in split_speakers(field) {
        if fragment.len() < MIN_MATCH_LEN {
            continue;
        }
        let usable = |n: &&String| n.len() >= MIN_MATCH_LEN;

        let exact: Vec<usize> = names
            .iter()
            .enumerate()
            .filter(|(_, n)| usable(n) && **n == fragment)
            .map(|(i, _)| i)
            .collect();
        let hits = if exact.is_empty() {
            names
                .iter()
                .enumerate()
                .filter(|(_, n)| usable(n) && (n.contains(&fragment) || fragment.contains(n.as_str())))
                .map(|(i, _)| i)
                .collect()
        } else {
            exact
        };

        for i in hits {
            if !matched.contains(&i) {
                matched.push(i);
            }
        }
    }
    matched
}

/// Derives obligations for every placed instance of every session with speakers.
///
/// Instances are visited in menu order, so when an advisor would present two
/// instances in one slot the earlier menu entry wins.
///
/// # Arguments
/// * `sessions` - Catalogue.
/// * `advisors` - Roster matched against speaker fields.
/// * `instances` - The master schedule.
pub fn build_obligations(
    sessions: &[Session],
    advisors: &[Advisor],
    instances: &[ScheduledInstance],
) -> PresenterObligations {
    let mut speakers: HashMap<&str, Vec<usize>> = HashMap::new();
    for session in sessions {
        if session.speakers.trim().is_empty() {
            continue;
        }
        let presenters = match_speakers(&session.speakers, advisors);
        if presenters.is_empty() {
            warn!(
                "Speaker text '{}' of session '{}' matches no advisor",
                session.speakers, session.id
            );
            continue;
        }
        speakers.insert(session.id.as_str(), presenters);
    }

    let mut obligations = PresenterObligations::default();
    for inst in instances {
        let Some(presenters) = speakers.get(inst.session_id.as_str()) else {
            continue;
        };
        for &a in presenters {
            obligations.push(PresenterObligation {
                advisor_id: advisors[a].id.clone(),
                session_id: inst.session_id.clone(),
                slot_id: inst.slot_id.clone(),
                room_id: inst.room_id.clone(),
            });
        }
    }
    obligations
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster() -> Vec<Advisor> {
        vec![
            Advisor::new("A1", "J. Vos"),
            Advisor::new("A2", "Maria de Wit"),
            Advisor::new("A3", "Pieter Jansen"),
            Advisor::new("A4", "Al"),
        ]
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("J. Vos"), "jvos");
        assert_eq!(normalize_name("  Maria de-Wit "), "mariadewit");
    }

    #[test]
    fn test_split_on_separators_and_word() {
        let parts = split_speakers("J. Vos / Maria de Wit & P. Jansen + X, Anders and Bo");
        assert_eq!(parts, vec!["jvos", "mariadewit", "pjansen", "x", "anders", "bo"]);
    }

    #[test]
    fn test_match_single_speaker() {
        assert_eq!(match_speakers("J. Vos", &roster()), vec![0]);
    }

    #[test]
    fn test_match_multiple_speakers() {
        let hits = match_speakers("Maria de Wit and Pieter Jansen", &roster());
        assert_eq!(hits, vec![1, 2]);
    }

    #[test]
    fn test_substring_match() {
        // "jansen" is contained in "pieterjansen"
        assert_eq!(match_speakers("Jansen", &roster()), vec![2]);
    }

    #[test]
    fn test_short_names_never_match() {
        assert!(match_speakers("Al", &roster()).is_empty());
        assert!(match_speakers("Alfred", &roster()).is_empty());
    }

    #[test]
    fn test_exact_match_wins_collision() {
        let advisors = vec![Advisor::new("A1", "Vos"), Advisor::new("A2", "Vossen")];
        assert_eq!(match_speakers("Vos", &advisors), vec![0]);
        assert_eq!(match_speakers("Vossen", &advisors), vec![1]);
    }

    #[test]
    fn test_unmatched_text_yields_nothing() {
        let sessions = vec![Session::elective("E1").with_speakers("Nobody Known")];
        let instances = vec![ScheduledInstance::new("E1", "S1", "R1")];
        let obl = build_obligations(&sessions, &roster(), &instances);
        assert!(obl.is_empty());
    }

    #[test]
    fn test_obligation_per_instance() {
        let sessions = vec![
            Session::elective("46").with_speakers("J. Vos"),
            Session::elective("47"),
        ];
        let instances = vec![
            ScheduledInstance::new("46", "S2", "R1"),
            ScheduledInstance::new("47", "S2", "R2"),
        ];
        let obl = build_obligations(&sessions, &roster(), &instances);
        assert_eq!(obl.len(), 1);
        let o = obl.find("A1", "S2").unwrap();
        assert_eq!(o.session_id, "46");
        assert_eq!(o.room_id, "R1");
    }

    #[test]
    fn test_clash_keeps_first_in_menu_order() {
        let sessions = vec![
            Session::elective("E1").with_speakers("J. Vos"),
            Session::elective("E2").with_speakers("J. Vos"),
        ];
        let instances = vec![
            ScheduledInstance::new("E2", "S1", "R2"),
            ScheduledInstance::new("E1", "S1", "R1"),
            ScheduledInstance::new("E1", "S2", "R1"),
        ];
        let obl = build_obligations(&sessions, &roster(), &instances);
        assert_eq!(obl.for_slot("S1").len(), 1);
        assert_eq!(obl.find("A1", "S1").unwrap().session_id, "E2");
        assert_eq!(obl.find("A1", "S2").unwrap().session_id, "E1");
    }
}

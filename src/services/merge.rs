//! Merge-by-key engine for the embedded question and user lists.
//!
//! Both lists share the same upsert-in-list discipline: records matching an
//! existing key are replaced in place (creation stamp preserved, update stamp
//! refreshed, incoming fields winning on conflict) and unmatched records are
//! appended. The `added`/`updated` partitions exist purely for response
//! reporting.

use std::time::SystemTime;

use crate::dao::models::{QuestionEntity, UserEntity};

/// A record that can participate in a keyed list merge.
pub trait MergeEntry: Clone {
    /// Domain key the merge matches on.
    fn merge_key(&self) -> &str;

    /// Combine `self` (the incoming record) with the matching stored record,
    /// if any, stamping timestamps against `now`.
    fn absorb(self, existing: Option<&Self>, now: SystemTime) -> Self;
}

/// Result of a keyed list merge.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome<T> {
    /// Full merged list: existing order preserved, new records appended.
    pub merged: Vec<T>,
    /// Keys that were not present before the merge.
    pub added: Vec<String>,
    /// Keys that matched an existing record and were replaced.
    pub updated: Vec<String>,
}

/// Merge `incoming` over `existing`, matching records by their merge key.
///
/// The key set of the result is the union of both inputs' key sets, and the
/// `added`/`updated` partitions are disjoint even when the incoming batch
/// repeats a key.
pub fn merge_by_key<T: MergeEntry>(existing: &[T], incoming: Vec<T>) -> MergeOutcome<T> {
    let now = SystemTime::now();
    let mut merged = existing.to_vec();
    let mut added = Vec::new();
    let mut updated = Vec::new();

    for record in incoming {
        let key = record.merge_key().to_owned();
        match merged.iter().position(|entry| entry.merge_key() == key) {
            Some(position) => {
                merged[position] = record.absorb(Some(&merged[position]), now);
                if !added.contains(&key) && !updated.contains(&key) {
                    updated.push(key);
                }
            }
            None => {
                merged.push(record.absorb(None, now));
                added.push(key);
            }
        }
    }

    MergeOutcome {
        merged,
        added,
        updated,
    }
}

impl MergeEntry for QuestionEntity {
    fn merge_key(&self) -> &str {
        &self.question_id
    }

    fn absorb(self, existing: Option<&Self>, now: SystemTime) -> Self {
        Self {
            // An omitted time limit keeps whatever was stored before.
            time_limit: self
                .time_limit
                .or_else(|| existing.and_then(|entry| entry.time_limit)),
            created_at: existing.map_or(now, |entry| entry.created_at),
            updated_at: now,
            ..self
        }
    }
}

impl MergeEntry for UserEntity {
    fn merge_key(&self) -> &str {
        &self.user_name
    }

    fn absorb(self, existing: Option<&Self>, now: SystemTime) -> Self {
        match existing {
            Some(entry) => Self {
                score: self.score.or(entry.score),
                rank: self.rank.or(entry.rank),
                avatar: self.avatar.or_else(|| entry.avatar.clone()),
                added_at: entry.added_at,
                updated_at: Some(now),
                ..self
            },
            None => Self {
                added_at: now,
                updated_at: None,
                ..self
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::time::Duration;

    use super::*;
    use crate::dao::models::{CorrectAnswer, QuestionType};

    #[derive(Debug, Clone, PartialEq)]
    struct Probe {
        key: String,
        payload: u32,
        born: Option<SystemTime>,
    }

    impl MergeEntry for Probe {
        fn merge_key(&self) -> &str {
            &self.key
        }

        fn absorb(self, existing: Option<&Self>, now: SystemTime) -> Self {
            Self {
                born: existing.map_or(Some(now), |entry| entry.born),
                ..self
            }
        }
    }

    fn probe(key: &str, payload: u32) -> Probe {
        Probe {
            key: key.to_owned(),
            payload,
            born: None,
        }
    }

    fn keys(list: &[Probe]) -> HashSet<String> {
        list.iter().map(|entry| entry.key.clone()).collect()
    }

    #[test]
    fn merged_key_set_is_union_of_inputs() {
        let existing = vec![probe("a", 1), probe("b", 2)];
        let incoming = vec![probe("b", 20), probe("c", 30)];

        let outcome = merge_by_key(&existing, incoming);

        let expected: HashSet<String> = ["a", "b", "c"].iter().map(|k| k.to_string()).collect();
        assert_eq!(keys(&outcome.merged), expected);
        assert_eq!(outcome.added, vec!["c".to_owned()]);
        assert_eq!(outcome.updated, vec!["b".to_owned()]);
    }

    #[test]
    fn untouched_records_are_copied_unchanged() {
        let existing = vec![probe("a", 1), probe("b", 2)];
        let outcome = merge_by_key(&existing, vec![probe("b", 20)]);

        assert_eq!(outcome.merged[0], existing[0]);
        assert_eq!(outcome.merged[1].payload, 20);
    }

    #[test]
    fn existing_order_is_preserved_and_new_records_appended() {
        let existing = vec![probe("a", 1), probe("b", 2), probe("c", 3)];
        let incoming = vec![probe("d", 4), probe("b", 20)];

        let outcome = merge_by_key(&existing, incoming);
        let order: Vec<&str> = outcome
            .merged
            .iter()
            .map(|entry| entry.key.as_str())
            .collect();
        assert_eq!(order, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn repeated_incoming_key_stays_in_one_partition() {
        let outcome = merge_by_key(&[], vec![probe("a", 1), probe("a", 2)]);
        assert_eq!(outcome.added, vec!["a".to_owned()]);
        assert!(outcome.updated.is_empty());
        assert_eq!(outcome.merged.len(), 1);
        assert_eq!(outcome.merged[0].payload, 2);
    }

    fn question(id: &str, text: &str) -> QuestionEntity {
        QuestionEntity {
            question_id: id.to_owned(),
            question_type: QuestionType::SingleChoice,
            question_text: text.to_owned(),
            options: vec!["a".to_owned(), "b".to_owned()],
            correct_answer: CorrectAnswer::Index(0),
            time_limit: None,
            created_at: SystemTime::UNIX_EPOCH,
            updated_at: SystemTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn question_merge_preserves_created_at_and_refreshes_updated_at() {
        let original_birth = SystemTime::now() - Duration::from_secs(3600);
        let mut stored = question("q1", "old text");
        stored.created_at = original_birth;
        stored.updated_at = original_birth;

        let outcome = merge_by_key(&[stored], vec![question("q1", "new text")]);

        assert_eq!(outcome.merged.len(), 1);
        let merged = &outcome.merged[0];
        assert_eq!(merged.question_text, "new text");
        assert_eq!(merged.created_at, original_birth);
        assert!(merged.updated_at > original_birth);
        assert_eq!(outcome.updated, vec!["q1".to_owned()]);
    }

    #[test]
    fn question_merge_keeps_stored_time_limit_when_incoming_omits_it() {
        let mut stored = question("q1", "text");
        stored.time_limit = Some(45);

        let outcome = merge_by_key(&[stored], vec![question("q1", "text v2")]);
        assert_eq!(outcome.merged[0].time_limit, Some(45));

        let mut override_limit = question("q1", "text v3");
        override_limit.time_limit = Some(10);
        let outcome = merge_by_key(&outcome.merged, vec![override_limit]);
        assert_eq!(outcome.merged[0].time_limit, Some(10));
    }

    fn user(name: &str) -> UserEntity {
        UserEntity {
            user_name: name.to_owned(),
            score: None,
            rank: None,
            avatar: None,
            added_at: SystemTime::UNIX_EPOCH,
            updated_at: None,
        }
    }

    #[test]
    fn new_user_gets_fresh_added_at_and_no_updated_at() {
        let outcome = merge_by_key(&[], vec![user("alice")]);
        let entry = &outcome.merged[0];
        assert!(entry.added_at > SystemTime::UNIX_EPOCH);
        assert!(entry.updated_at.is_none());
        assert_eq!(outcome.added, vec!["alice".to_owned()]);
    }

    #[test]
    fn user_merge_keeps_added_at_and_fills_absent_fields_from_stored_entry() {
        let joined = SystemTime::now() - Duration::from_secs(60);
        let mut stored = user("alice");
        stored.added_at = joined;
        stored.score = Some(100);
        stored.avatar = Some("fox".to_owned());

        let mut incoming = user("alice");
        incoming.rank = Some(1);

        let outcome = merge_by_key(&[stored], vec![incoming]);
        let merged = &outcome.merged[0];
        assert_eq!(merged.added_at, joined);
        assert_eq!(merged.score, Some(100));
        assert_eq!(merged.avatar.as_deref(), Some("fox"));
        assert_eq!(merged.rank, Some(1));
        assert!(merged.updated_at.is_some());
    }
}

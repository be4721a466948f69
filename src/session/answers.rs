use std::collections::{BTreeMap, BTreeSet};

use crate::content::model::Test;

/// Raw responses keyed by question number, restricted to the numbers a test defines.
///
/// Values are stored exactly as entered; normalization is the grader's job.
#[derive(Clone, Debug, Default)]
pub struct AnswerStore {
    valid: BTreeSet<u32>,
    values: BTreeMap<u32, String>,
    frozen: bool,
}

impl AnswerStore {
    pub fn for_test(test: &Test) -> Self {
        Self {
            valid: test.question_numbers().into_iter().collect(),
            values: BTreeMap::new(),
            frozen: false,
        }
    }

    /// Store a response. Returns false (and stores nothing) when the store is
    /// frozen or the number does not belong to the test.
    pub fn set(&mut self, number: u32, value: impl Into<String>) -> bool {
        if self.frozen || !self.valid.contains(&number) {
            return false;
        }
        self.values.insert(number, value.into());
        true
    }

    pub fn get(&self, number: u32) -> Option<&str> {
        self.values.get(&number).map(String::as_str)
    }

    pub fn clear(&mut self) {
        self.values.clear();
        self.frozen = false;
    }

    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn contains_question(&self, number: u32) -> bool {
        self.valid.contains(&number)
    }

    /// Number of questions with a non-blank response.
    pub fn answered_count(&self) -> usize {
        self.values.values().filter(|v| !v.trim().is_empty()).count()
    }

    pub fn question_count(&self) -> usize {
        self.valid.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &str)> {
        self.values.iter().map(|(&n, v)| (n, v.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::model::{Item, QuestionType, Section};

    fn make_test(numbers: &[u32]) -> Test {
        Test {
            id: "t".into(),
            title: "T".into(),
            subtitle: String::new(),
            passage: String::new(),
            sections: vec![Section {
                rubric: "Questions".into(),
                instruction: String::new(),
                kind: QuestionType::ShortAnswer,
                items: numbers
                    .iter()
                    .map(|&number| Item {
                        number,
                        prompt: String::new(),
                        answer: None,
                        options: Vec::new(),
                        paragraph: None,
                    })
                    .collect(),
                headings: Vec::new(),
                options: Vec::new(),
                letter_range: None,
            }],
        }
    }

    #[test]
    fn test_get_unset_returns_none() {
        let store = AnswerStore::for_test(&make_test(&[1, 2]));
        assert_eq!(store.get(1), None);
    }

    #[test]
    fn test_set_overwrites_raw_value() {
        let mut store = AnswerStore::for_test(&make_test(&[1]));
        assert!(store.set(1, " true "));
        assert!(store.set(1, "FALSE"));
        assert_eq!(store.get(1), Some("FALSE"));
    }

    #[test]
    fn test_unknown_number_rejected() {
        let mut store = AnswerStore::for_test(&make_test(&[1, 2]));
        assert!(!store.set(7, "A"));
        assert_eq!(store.get(7), None);
        assert_eq!(store.iter().count(), 0);
    }

    #[test]
    fn test_frozen_store_rejects_writes() {
        let mut store = AnswerStore::for_test(&make_test(&[1]));
        store.set(1, "A");
        store.freeze();
        assert!(!store.set(1, "B"));
        assert_eq!(store.get(1), Some("A"));
    }

    #[test]
    fn test_clear_empties_and_unfreezes() {
        let mut store = AnswerStore::for_test(&make_test(&[1]));
        store.set(1, "A");
        store.freeze();
        store.clear();
        assert_eq!(store.get(1), None);
        assert!(!store.is_frozen());
        assert!(store.set(1, "B"));
    }

    #[test]
    fn test_answered_count_ignores_blank_values() {
        let mut store = AnswerStore::for_test(&make_test(&[1, 2, 3]));
        store.set(1, "A");
        store.set(2, "  ");
        assert_eq!(store.answered_count(), 1);
        assert_eq!(store.question_count(), 3);
    }
}

use std::borrow::Cow;
use std::collections::BTreeMap;

use icu_normalizer::ComposingNormalizerBorrowed;

use crate::content::model::{Comparison, Test};
use crate::session::answers::AnswerStore;

/// Descending percentage thresholds and the band each one awards.
const BAND_THRESHOLDS: [(f64, u8); 7] = [
    (90.0, 9),
    (80.0, 8),
    (70.0, 7),
    (60.0, 6),
    (50.0, 5),
    (40.0, 4),
    (30.0, 3),
];
const FLOOR_BAND: u8 = 2;

#[derive(Clone, Debug, PartialEq)]
pub struct GradeReport {
    pub per_item: BTreeMap<u32, bool>,
    pub correct: usize,
    pub total: usize,
}

impl GradeReport {
    pub fn percent(&self) -> f64 {
        percent(self.correct, self.total)
    }

    pub fn band(&self) -> u8 {
        band_score(self.correct, self.total)
    }

    pub fn is_correct(&self, number: u32) -> Option<bool> {
        self.per_item.get(&number).copied()
    }
}

/// Grade every item of `test` against the stored responses.
pub fn grade(test: &Test, answers: &AnswerStore) -> GradeReport {
    let mut per_item = BTreeMap::new();
    let mut correct = 0;
    let mut total = 0;

    for (section, item) in test.items() {
        total += 1;
        let is_correct = match (item.answer.as_deref(), answers.get(item.number)) {
            (Some(expected), Some(given)) if !expected.trim().is_empty() => {
                matches(section.kind.comparison(), expected, given)
            }
            _ => false,
        };
        if is_correct {
            correct += 1;
        }
        per_item.insert(item.number, is_correct);
    }

    GradeReport {
        per_item,
        correct,
        total,
    }
}

pub fn matches(comparison: Comparison, expected: &str, given: &str) -> bool {
    match comparison {
        Comparison::Label | Comparison::Code => normalize(expected) == normalize(given),
        Comparison::FreeText => normalize_text(expected) == normalize_text(given),
    }
}

/// Compatibility-compose, trim and case-fold a response.
pub fn normalize(value: &str) -> String {
    let composed: Cow<'_, str> = ComposingNormalizerBorrowed::new_nfkc().normalize(value);
    composed.trim().to_lowercase()
}

/// Like [`normalize`], with internal whitespace runs collapsed to one space.
pub fn normalize_text(value: &str) -> String {
    normalize(value).split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn percent(correct: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    correct as f64 / total as f64 * 100.0
}

pub fn band_score(correct: usize, total: usize) -> u8 {
    let pct = percent(correct, total);
    BAND_THRESHOLDS
        .iter()
        .find(|&&(threshold, _)| pct >= threshold)
        .map(|&(_, band)| band)
        .unwrap_or(FLOOR_BAND)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::model::{Item, QuestionType, Section};

    fn item(number: u32, answer: Option<&str>) -> Item {
        Item {
            number,
            prompt: format!("q{number}"),
            answer: answer.map(str::to_string),
            options: Vec::new(),
            paragraph: None,
        }
    }

    fn section(kind: QuestionType, items: Vec<Item>) -> Section {
        Section {
            rubric: "Questions".into(),
            instruction: String::new(),
            kind,
            items,
            headings: Vec::new(),
            options: Vec::new(),
            letter_range: None,
        }
    }

    fn make_test(sections: Vec<Section>) -> Test {
        Test {
            id: "t".into(),
            title: "T".into(),
            subtitle: String::new(),
            passage: String::new(),
            sections,
        }
    }

    fn answers_for(test: &Test, given: &[(u32, &str)]) -> AnswerStore {
        let mut store = AnswerStore::for_test(test);
        for &(n, v) in given {
            assert!(store.set(n, v));
        }
        store
    }

    #[test]
    fn test_three_tfng_items_scores_band_six() {
        let test = make_test(vec![section(
            QuestionType::TrueFalseNotGiven,
            vec![
                item(1, Some("TRUE")),
                item(2, Some("FALSE")),
                item(3, Some("NOT GIVEN")),
            ],
        )]);
        let answers = answers_for(&test, &[(1, "TRUE"), (2, "TRUE"), (3, "NOT GIVEN")]);
        let report = grade(&test, &answers);
        assert_eq!(report.correct, 2);
        assert_eq!(report.total, 3);
        assert!((report.percent() - 66.666).abs() < 0.01);
        assert_eq!(report.band(), 6);
        assert_eq!(report.is_correct(2), Some(false));
    }

    #[test]
    fn test_band_boundaries_are_exact() {
        assert_eq!(band_score(9, 10), 9);
        assert_eq!(band_score(8, 10), 8);
        assert_eq!(band_score(7, 10), 7);
        assert_eq!(band_score(3, 10), 3);
        assert_eq!(band_score(2, 10), 2);
        assert_eq!(band_score(0, 10), 2);
        assert_eq!(band_score(10, 10), 9);
    }

    #[test]
    fn test_band_is_monotonic() {
        let total = 40;
        let mut previous = 0;
        for correct in 0..=total {
            let band = band_score(correct, total);
            assert!(band >= previous, "band dropped at {correct}/{total}");
            previous = band;
        }
    }

    #[test]
    fn test_band_with_no_items_is_floor() {
        assert_eq!(band_score(0, 0), 2);
    }

    #[test]
    fn test_item_without_canonical_answer_never_correct() {
        let test = make_test(vec![section(
            QuestionType::ShortAnswer,
            vec![item(1, None), item(2, Some("   "))],
        )]);
        let answers = answers_for(&test, &[(1, ""), (2, "   ")]);
        let report = grade(&test, &answers);
        assert_eq!(report.correct, 0);
        assert_eq!(report.total, 2);
    }

    #[test]
    fn test_unanswered_submission_scores_zero() {
        let test = make_test(vec![section(
            QuestionType::MultipleChoice,
            vec![item(1, Some("A")), item(2, Some("B"))],
        )]);
        let report = grade(&test, &AnswerStore::for_test(&test));
        assert_eq!(report.correct, 0);
        assert_eq!(report.total, 2);
        assert_eq!(report.per_item.len(), 2);
    }

    #[test]
    fn test_comparison_is_case_insensitive_and_trimmed() {
        let test = make_test(vec![
            section(QuestionType::YesNoNotGiven, vec![item(1, Some("NOT GIVEN"))]),
            section(QuestionType::MatchingHeadings, vec![item(2, Some("iv"))]),
            section(QuestionType::Completion, vec![item(3, Some("volcanic ash"))]),
        ]);
        let answers = answers_for(&test, &[(1, " not given "), (2, "IV"), (3, "Volcanic   Ash ")]);
        let report = grade(&test, &answers);
        assert_eq!(report.correct, 3);
    }

    #[test]
    fn test_free_text_has_no_partial_credit() {
        assert!(!matches(Comparison::FreeText, "French Alps", "Alps"));
        assert!(!matches(Comparison::FreeText, "cool", "cooling"));
    }

    #[test]
    fn test_labels_do_not_collapse_whitespace() {
        assert!(!matches(Comparison::Label, "NOT GIVEN", "NOT  GIVEN"));
    }

    #[test]
    fn test_compatibility_forms_normalize() {
        // Fullwidth letters compose to their ASCII counterparts under NFKC.
        assert!(matches(Comparison::Label, "B", "\u{FF22}"));
    }

    #[test]
    fn test_total_counts_every_section() {
        let test = make_test(vec![
            section(QuestionType::Matching, vec![item(1, Some("A")), item(2, Some("B"))]),
            section(QuestionType::Completion, vec![item(3, Some("x"))]),
        ]);
        let answers = answers_for(&test, &[(1, "a"), (2, "c"), (3, "x")]);
        let report = grade(&test, &answers);
        assert_eq!(report.total, test.item_count());
        assert!(report.correct <= report.total);
        assert_eq!(report.correct, 2);
    }
}

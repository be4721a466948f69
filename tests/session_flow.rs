use std::time::{Duration, Instant};

use tempfile::TempDir;

use readingroom::content::catalog::Catalog;
use readingroom::content::model::Test;
use readingroom::pointer::PointerHub;
use readingroom::session::controller::{SessionController, SessionStatus, TimerPrefs};
use readingroom::session::result::SessionResult;
use readingroom::store::completion::CompletionStore;
use readingroom::store::kv::{FileStorage, KeyValueStorage};

fn three_statement_test() -> Test {
    serde_json::from_str(
        r#"{
            "id": "tides",
            "title": "Tides",
            "passage": "The moon pulls the sea.",
            "sections": [{
                "rubric": "Questions 1-3",
                "type": "true-false-not-given",
                "items": [
                    { "number": 1, "prompt": "The moon affects tides.", "answer": "TRUE" },
                    { "number": 2, "prompt": "The sun has no effect.", "answer": "FALSE" },
                    { "number": 3, "prompt": "Tides are getting stronger.", "answer": "NOT GIVEN" }
                ]
            }]
        }"#,
    )
    .unwrap()
}

fn controller(completion: CompletionStore) -> SessionController {
    SessionController::new(completion, PointerHub::new(), TimerPrefs::default())
}

#[test]
fn two_of_three_statements_scores_band_six() {
    let test = three_statement_test();
    let mut c = controller(CompletionStore::in_memory());
    c.enter_test("academic", &test, Instant::now()).unwrap();
    c.set_answer(1, " true ").unwrap();
    c.set_answer(2, "TRUE").unwrap();
    c.set_answer(3, "not given").unwrap();

    let report = c.submit().unwrap().clone();
    assert_eq!(report.correct, 2);
    assert_eq!(report.total, 3);
    assert_eq!(report.band(), 6);

    let result = SessionResult::from_session(c.session().unwrap()).unwrap();
    assert_eq!(result.band, 6);
    assert_eq!(result.unanswered(), 0);
}

#[test]
fn answers_are_frozen_after_submit() {
    let test = three_statement_test();
    let mut c = controller(CompletionStore::in_memory());
    c.enter_test("academic", &test, Instant::now()).unwrap();
    c.set_answer(1, "TRUE").unwrap();
    c.submit().unwrap();

    assert_eq!(c.set_answer(1, "FALSE"), Ok(false));
    assert_eq!(c.session().unwrap().answers().get(1), Some("TRUE"));
    assert!(c.submit().is_err());
}

#[test]
fn completion_survives_restart_without_duplicates() {
    let dir = TempDir::new().unwrap();
    let test = three_statement_test();

    {
        let storage = FileStorage::with_base_dir(dir.path().to_path_buf()).unwrap();
        let mut c = controller(CompletionStore::new(Box::new(storage)));
        c.enter_test("academic", &test, Instant::now()).unwrap();
        c.submit().unwrap();
        c.retry(Instant::now()).unwrap();
        assert_eq!(c.status(), SessionStatus::Active);
        c.submit().unwrap();
    }

    let storage = FileStorage::with_base_dir(dir.path().to_path_buf()).unwrap();
    let raw = storage
        .get(&CompletionStore::storage_key("academic"))
        .unwrap()
        .unwrap();
    let stored: Vec<String> = serde_json::from_str(&raw).unwrap();
    assert_eq!(stored, vec!["tides".to_string()]);

    let mut c = controller(CompletionStore::new(Box::new(storage)));
    assert!(c.completed("academic").contains("tides"));
    assert!(c.completed("general-training").is_empty());
}

#[test]
fn leaving_a_test_stops_ticks_and_listeners() {
    let test = three_statement_test();
    let mut c = controller(CompletionStore::in_memory());
    let start = Instant::now();
    c.enter_test("academic", &test, start).unwrap();
    assert!(c.is_ticking());
    assert!(c.hub().listener_count() > 0);
    assert_eq!(c.pump(start + Duration::from_secs(3)), 3);

    assert_eq!(c.exit_test().unwrap(), "academic");
    assert_eq!(c.status(), SessionStatus::Idle);
    assert!(!c.is_ticking());
    assert_eq!(c.hub().listener_count(), 0);
    assert_eq!(c.pump(start + Duration::from_secs(10)), 0);
}

#[test]
fn bundled_catalog_tests_grade_to_full_marks() {
    let catalog = Catalog::bundled().unwrap();
    for category in catalog.categories() {
        for test in &category.tests {
            let mut c = controller(CompletionStore::in_memory());
            c.enter_test(&category.id, test, Instant::now()).unwrap();
            for (_, item) in test.items() {
                if let Some(answer) = &item.answer {
                    c.set_answer(item.number, answer).unwrap();
                }
            }
            let report = c.submit().unwrap();
            assert_eq!(report.correct, report.total, "{}/{}", category.id, test.id);
            assert_eq!(report.band(), 9);
        }
    }
}

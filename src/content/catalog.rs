use std::collections::HashSet;

use rust_embed::Embed;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::content::model::Test;

#[derive(Embed)]
#[folder = "assets/catalog/"]
struct CatalogAssets;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to parse catalog file {file}: {source}")]
    Parse {
        file: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("duplicate category id '{0}'")]
    DuplicateCategory(String),
    #[error("duplicate test id '{test}' in category '{category}'")]
    DuplicateTest { category: String, test: String },
    #[error("question {number} appears more than once in test '{test}'")]
    DuplicateQuestion { test: String, number: u32 },
    #[error("test '{0}' has no questions")]
    EmptyTest(String),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub tests: Vec<Test>,
}

impl Category {
    pub fn test(&self, id: &str) -> Option<&Test> {
        self.tests.iter().find(|t| t.id == id)
    }
}

/// Read-only set of categories and their tests, validated once at startup.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    categories: Vec<Category>,
}

impl Catalog {
    pub fn new(categories: Vec<Category>) -> Result<Self, CatalogError> {
        let mut category_ids = HashSet::new();
        for category in &categories {
            if !category_ids.insert(category.id.as_str()) {
                return Err(CatalogError::DuplicateCategory(category.id.clone()));
            }
            let mut test_ids = HashSet::new();
            for test in &category.tests {
                if !test_ids.insert(test.id.as_str()) {
                    return Err(CatalogError::DuplicateTest {
                        category: category.id.clone(),
                        test: test.id.clone(),
                    });
                }
                validate_test(test)?;
            }
        }
        Ok(Self { categories })
    }

    /// Load the catalog bundled into the binary from `assets/catalog/`.
    pub fn bundled() -> Result<Self, CatalogError> {
        let mut names: Vec<String> = CatalogAssets::iter()
            .filter(|name| name.ends_with(".json"))
            .map(|name| name.to_string())
            .collect();
        names.sort();

        let mut categories = Vec::with_capacity(names.len());
        for name in names {
            let Some(file) = CatalogAssets::get(&name) else {
                continue;
            };
            let category: Category = serde_json::from_slice(file.data.as_ref())
                .map_err(|source| CatalogError::Parse {
                    file: name.clone(),
                    source,
                })?;
            categories.push(category);
        }
        Self::new(categories)
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn category(&self, id: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    pub fn test(&self, category: &str, test_id: &str) -> Option<&Test> {
        self.category(category)?.test(test_id)
    }
}

fn validate_test(test: &Test) -> Result<(), CatalogError> {
    if test.item_count() == 0 {
        return Err(CatalogError::EmptyTest(test.id.clone()));
    }
    let mut seen = HashSet::new();
    for (_, item) in test.items() {
        if !seen.insert(item.number) {
            return Err(CatalogError::DuplicateQuestion {
                test: test.id.clone(),
                number: item.number,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::model::{Item, QuestionType, Section};

    fn item(number: u32) -> Item {
        Item {
            number,
            prompt: format!("statement {number}"),
            answer: Some("TRUE".into()),
            options: Vec::new(),
            paragraph: None,
        }
    }

    fn test_with(id: &str, numbers: &[&[u32]]) -> Test {
        Test {
            id: id.into(),
            title: id.into(),
            subtitle: String::new(),
            passage: "text".into(),
            sections: numbers
                .iter()
                .map(|nums| Section {
                    rubric: "Questions".into(),
                    instruction: String::new(),
                    kind: QuestionType::TrueFalseNotGiven,
                    items: nums.iter().map(|&n| item(n)).collect(),
                    headings: Vec::new(),
                    options: Vec::new(),
                    letter_range: None,
                })
                .collect(),
        }
    }

    fn category(id: &str, tests: Vec<Test>) -> Category {
        Category {
            id: id.into(),
            title: id.into(),
            description: String::new(),
            tests,
        }
    }

    #[test]
    fn test_bundled_catalog_is_valid() {
        let catalog = Catalog::bundled().unwrap();
        assert!(!catalog.categories().is_empty());
        for category in catalog.categories() {
            assert!(!category.tests.is_empty(), "{} has no tests", category.id);
        }
    }

    #[test]
    fn test_duplicate_question_across_sections_rejected() {
        let t = test_with("t1", &[&[1, 2], &[2, 3]]);
        let err = Catalog::new(vec![category("academic", vec![t])]).unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateQuestion { number: 2, .. }));
    }

    #[test]
    fn test_duplicate_test_id_rejected() {
        let err = Catalog::new(vec![category(
            "academic",
            vec![test_with("t1", &[&[1]]), test_with("t1", &[&[1]])],
        )])
        .unwrap_err();
        assert!(err.to_string().contains("duplicate test id 't1'"));
    }

    #[test]
    fn test_empty_test_rejected() {
        let err = Catalog::new(vec![category("academic", vec![test_with("t1", &[&[]])])])
            .unwrap_err();
        assert!(matches!(err, CatalogError::EmptyTest(_)));
    }

    #[test]
    fn test_lookup_by_category_and_id() {
        let catalog = Catalog::new(vec![
            category("academic", vec![test_with("t1", &[&[1]])]),
            category("general", vec![test_with("g1", &[&[1]])]),
        ])
        .unwrap();
        assert!(catalog.test("academic", "t1").is_some());
        assert!(catalog.test("academic", "g1").is_none());
        assert!(catalog.test("missing", "t1").is_none());
    }
}

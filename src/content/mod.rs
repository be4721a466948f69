pub mod catalog;
pub mod model;

pub use catalog::{Catalog, CatalogError, Category};
pub use model::{Comparison, Item, QuestionType, Section, Test};

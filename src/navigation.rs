//! Address paths and back/forward history for the reading section.
//!
//! A path only says which screen is open. Opening a test path always starts a
//! fresh session; nothing about answers or time is carried in the path.

use crate::content::catalog::Catalog;

pub const ROOT: &str = "/reading";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Route {
    Categories,
    Tests { category: String },
    Test { category: String, test_id: String },
}

impl Route {
    pub fn tests(category: &str) -> Self {
        Route::Tests {
            category: category.to_string(),
        }
    }

    pub fn test(category: &str, test_id: &str) -> Self {
        Route::Test {
            category: category.to_string(),
            test_id: test_id.to_string(),
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::Categories => ROOT.to_string(),
            Route::Tests { category } => format!("{ROOT}/{category}"),
            Route::Test { category, test_id } => format!("{ROOT}/{category}/{test_id}"),
        }
    }

    pub fn category(&self) -> Option<&str> {
        match self {
            Route::Categories => None,
            Route::Tests { category } | Route::Test { category, .. } => Some(category),
        }
    }
}

/// Split a path into a route without checking it against any catalog.
pub fn parse(path: &str) -> Option<Route> {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let mut segments = path.split('/').filter(|s| !s.is_empty());
    if segments.next() != Some("reading") {
        return None;
    }
    let category = segments.next();
    let test_id = segments.next();
    if segments.next().is_some() {
        return None;
    }
    Some(match (category, test_id) {
        (None, _) => Route::Categories,
        (Some(category), None) => Route::tests(category),
        (Some(category), Some(test_id)) => Route::test(category, test_id),
    })
}

/// Resolve a path against the catalog, falling back to the nearest list
/// screen when any part of it is unknown.
pub fn resolve(path: &str, catalog: &Catalog) -> Route {
    let route = match parse(path) {
        Some(route) => route,
        None => {
            tracing::info!("unrecognised path {path:?}, showing categories");
            return Route::Categories;
        }
    };
    match route {
        Route::Categories => Route::Categories,
        Route::Tests { category } => {
            if catalog.category(&category).is_some() {
                Route::Tests { category }
            } else {
                tracing::info!("unknown category {category:?}, showing categories");
                Route::Categories
            }
        }
        Route::Test { category, test_id } => {
            if catalog.category(&category).is_none() {
                tracing::info!("unknown category {category:?}, showing categories");
                Route::Categories
            } else if catalog.test(&category, &test_id).is_none() {
                tracing::info!("unknown test {test_id:?} in {category}, showing its list");
                Route::Tests { category }
            } else {
                Route::Test { category, test_id }
            }
        }
    }
}

#[derive(Clone, Debug)]
pub struct History {
    entries: Vec<String>,
    index: usize,
}

impl History {
    pub fn new(initial: &str) -> Self {
        Self {
            entries: vec![initial.to_string()],
            index: 0,
        }
    }

    pub fn current(&self) -> &str {
        &self.entries[self.index]
    }

    /// Add an entry after the current one, dropping any forward entries.
    pub fn push(&mut self, path: String) {
        if self.current() == path {
            return;
        }
        self.entries.truncate(self.index + 1);
        self.entries.push(path);
        self.index += 1;
    }

    pub fn replace(&mut self, path: String) {
        self.entries[self.index] = path;
    }

    pub fn back(&mut self) -> Option<&str> {
        if self.index == 0 {
            return None;
        }
        self.index -= 1;
        Some(self.current())
    }

    pub fn forward(&mut self) -> Option<&str> {
        if self.index + 1 >= self.entries.len() {
            return None;
        }
        self.index += 1;
        Some(self.current())
    }

    /// Number of entries, counting the current one; never below one.
    pub fn depth(&self) -> usize {
        self.entries.len()
    }
}

/// Keeps the history stack and the open screen pointing at the same route.
#[derive(Clone, Debug)]
pub struct NavigationSync {
    history: History,
}

impl NavigationSync {
    pub fn new(initial_path: &str) -> Self {
        Self {
            history: History::new(initial_path),
        }
    }

    pub fn current_path(&self) -> &str {
        self.history.current()
    }

    pub fn current_route(&self, catalog: &Catalog) -> Route {
        resolve(self.history.current(), catalog)
    }

    pub fn push(&mut self, route: &Route) {
        self.history.push(route.path());
    }

    /// Rewrite the current entry, used when a path resolved to a fallback.
    pub fn replace(&mut self, route: &Route) {
        self.history.replace(route.path());
    }

    pub fn back(&mut self, catalog: &Catalog) -> Option<Route> {
        let path = self.history.back()?.to_string();
        Some(resolve(&path, catalog))
    }

    pub fn forward(&mut self, catalog: &Catalog) -> Option<Route> {
        let path = self.history.forward()?.to_string();
        Some(resolve(&path, catalog))
    }

    pub fn history(&self) -> &History {
        &self.history
    }
}

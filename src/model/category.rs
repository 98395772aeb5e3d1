use crate::model::transaction::INCOME_CATEGORY;
use serde::{Deserialize, Serialize};

/// The categories a new user starts with.
pub const DEFAULT_CATEGORIES: &[&str] = &["Food", "Transport", "Tools", "Events", "Misc"];

/// The ordered list of expense category names for one user.
///
/// Names are unique ignoring case. Order is insertion order and is never re-sorted here.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Categories(Vec<String>);

impl Categories {
    /// Builds a list from `names`, trimming each one and dropping blanks, case-insensitive repeats
    /// and the income category.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut categories = Categories::default();
        for name in names {
            let name = name.as_ref().trim();
            if !name.is_empty() && !is_reserved(name) && categories.find(name).is_none() {
                categories.0.push(name.to_string());
            }
        }
        categories
    }

    pub fn defaults() -> Self {
        Self::new(DEFAULT_CATEGORIES)
    }

    /// Returns the stored spelling of `name`, matching without regard to case.
    pub fn find(&self, name: &str) -> Option<&str> {
        let name = name.trim();
        self.0
            .iter()
            .find(|c| c.to_lowercase() == name.to_lowercase())
            .map(String::as_str)
    }

    pub fn contains_exact(&self, name: &str) -> bool {
        self.0.iter().any(|c| c == name)
    }

    /// Appends `name` unless an equal-ignoring-case name is present. Returns whether it was added.
    pub(crate) fn push(&mut self, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() || is_reserved(name) || self.find(name).is_some() {
            return false;
        }
        self.0.push(name.to_string());
        true
    }

    /// Removes the entry that is exactly `name`. Returns whether it was present.
    pub(crate) fn remove_exact(&mut self, name: &str) -> bool {
        let before = self.0.len();
        self.0.retain(|c| c != name);
        self.0.len() != before
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Categories> for Vec<String> {
    fn from(value: Categories) -> Self {
        value.0
    }
}

/// True for the income category, which is never a managed category.
pub fn is_reserved(name: &str) -> bool {
    name.trim().eq_ignore_ascii_case(INCOME_CATEGORY)
}

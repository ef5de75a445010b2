//! An insertion-ordered map keyed by section title.
//!
//! Ranking breaks score ties by corpus order, so the order rows were read
//! in has to survive loading.

use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct TitleMap<T> {
    entries: Vec<(String, T)>,
    index: HashMap<String, usize>,
}

impl<T> TitleMap<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Append a value. Returns the value back if the title is already present.
    pub fn insert(&mut self, title: impl Into<String>, value: T) -> Result<(), T> {
        let title = title.into();
        if self.index.contains_key(&title) {
            return Err(value);
        }
        self.index.insert(title.clone(), self.entries.len());
        self.entries.push((title, value));
        Ok(())
    }

    pub fn get(&self, title: &str) -> Option<&T> {
        self.index.get(title).map(|&i| &self.entries[i].1)
    }

    pub fn contains(&self, title: &str) -> bool {
        self.index.contains_key(title)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.entries.iter().map(|(t, v)| (t.as_str(), v))
    }

    pub fn titles(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(t, _)| t.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().map(|(_, v)| v)
    }
}

impl<T> Default for TitleMap<T> {
    fn default() -> Self {
        Self::new()
    }
}

//! Ordered collection of optionally named arrays.

use std::slice;

use super::array::NdArray;

/// One (optional name, array) pair.
///
/// `name: None` is an unnamed entry and is distinct from `Some("")`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub name: Option<String>,
    pub array: NdArray,
}

impl Entry {
    pub fn named(name: impl Into<String>, array: NdArray) -> Self {
        Self {
            name: Some(name.into()),
            array,
        }
    }

    pub fn unnamed(array: NdArray) -> Self {
        Self { name: None, array }
    }

    #[inline(always)]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

/// Ordered sequence of entries, saved and loaded as a unit.
///
/// Naming is per entry: a list may mix named and unnamed arrays, and names
/// are not required to be unique. Consumers decide whether to treat an
/// all-named list as a mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NdList {
    entries: Vec<Entry>,
}

impl NdList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Append an unnamed array.
    pub fn push(&mut self, array: NdArray) {
        self.entries.push(Entry::unnamed(array));
    }

    /// Append a named array.
    pub fn push_named(&mut self, name: impl Into<String>, array: NdArray) {
        self.entries.push(Entry::named(name, array));
    }

    pub fn push_entry(&mut self, entry: Entry) {
        self.entries.push(entry);
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry at `index` as `(name, array)`.
    pub fn get_with_tag(&self, index: usize) -> Option<(Option<&str>, &NdArray)> {
        self.entries
            .get(index)
            .map(|entry| (entry.name(), &entry.array))
    }

    /// Array at `index`, ignoring its name.
    pub fn get_index(&self, index: usize) -> Option<&NdArray> {
        self.entries.get(index).map(|entry| &entry.array)
    }

    /// First array carrying `name`.
    pub fn get(&self, name: &str) -> Option<&NdArray> {
        self.entries
            .iter()
            .find(|entry| entry.name() == Some(name))
            .map(|entry| &entry.array)
    }

    /// Names in entry order.
    pub fn names(&self) -> impl Iterator<Item = Option<&str>> + '_ {
        self.entries.iter().map(Entry::name)
    }

    pub fn iter(&self) -> slice::Iter<'_, Entry> {
        self.entries.iter()
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<Entry> {
        self.entries
    }

    /// Non-empty and every entry is named.
    pub fn is_dict_style(&self) -> bool {
        !self.is_empty() && self.entries.iter().all(|entry| entry.name.is_some())
    }

    /// Non-empty and no entry is named.
    pub fn is_list_style(&self) -> bool {
        !self.is_empty() && self.entries.iter().all(|entry| entry.name.is_none())
    }
}

impl From<Vec<Entry>> for NdList {
    fn from(entries: Vec<Entry>) -> Self {
        Self { entries }
    }
}

impl FromIterator<Entry> for NdList {
    fn from_iter<I: IntoIterator<Item = Entry>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl FromIterator<NdArray> for NdList {
    fn from_iter<I: IntoIterator<Item = NdArray>>(iter: I) -> Self {
        iter.into_iter().map(Entry::unnamed).collect()
    }
}

impl<S: Into<String>> FromIterator<(S, NdArray)> for NdList {
    fn from_iter<I: IntoIterator<Item = (S, NdArray)>>(iter: I) -> Self {
        iter.into_iter()
            .map(|(name, array)| Entry::named(name, array))
            .collect()
    }
}

impl IntoIterator for NdList {
    type Item = Entry;
    type IntoIter = std::vec::IntoIter<Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a NdList {
    type Item = &'a Entry;
    type IntoIter = slice::Iter<'a, Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

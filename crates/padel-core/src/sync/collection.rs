//! Ordered, id-unique collection.

use std::collections::HashMap;

use crate::record::Identified;

use super::config::InsertPosition;

/// Result of an upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    /// An element with the same id was replaced in place.
    Replaced,
    /// The record was new and has been inserted.
    Inserted,
}

/// An ordered sequence of records in which no two elements share an id.
///
/// Insertion order is preserved. An id index keeps membership checks
/// constant-time; it is rebuilt only when elements shift position.
#[derive(Debug, Clone)]
pub struct Collection<T: Identified> {
    items: Vec<T>,
    index: HashMap<T::Id, usize>,
}

impl<T: Identified> Default for Collection<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<T: Identified> Collection<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a collection, keeping the first occurrence of each id.
    pub fn from_vec(items: Vec<T>) -> Self {
        let mut collection = Self::new();
        collection.append_new(items);
        collection
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, id: &T::Id) -> bool {
        self.index.contains_key(id)
    }

    pub fn get(&self, id: &T::Id) -> Option<&T> {
        self.index.get(id).map(|&pos| &self.items[pos])
    }

    /// Position of the element with this id.
    pub fn position(&self, id: &T::Id) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.index.clear();
    }

    /// Replace the whole contents. Duplicate ids in `items` keep their first
    /// occurrence. Returns the resulting length.
    pub fn replace_all(&mut self, items: Vec<T>) -> usize {
        self.clear();
        self.append_new(items)
    }

    /// Append every record whose id is not already present, in order.
    /// Returns how many were appended.
    pub fn append_new(&mut self, items: Vec<T>) -> usize {
        let before = self.items.len();
        for item in items {
            if self.index.contains_key(item.id()) {
                continue;
            }
            self.index.insert(item.id().clone(), self.items.len());
            self.items.push(item);
        }
        self.items.len() - before
    }

    /// Replace the element with the same id in place, or insert the record
    /// at `position` when the id is new.
    pub fn upsert(&mut self, item: T, position: InsertPosition) -> Upsert {
        if let Some(&pos) = self.index.get(item.id()) {
            self.items[pos] = item;
            return Upsert::Replaced;
        }

        match position {
            InsertPosition::Back => {
                self.index.insert(item.id().clone(), self.items.len());
                self.items.push(item);
            }
            InsertPosition::Front => {
                self.items.insert(0, item);
                self.reindex();
            }
        }
        Upsert::Inserted
    }

    /// Replace the element with the same id in place; never inserts.
    /// Returns whether a replacement happened.
    pub fn replace_existing(&mut self, item: T) -> bool {
        match self.index.get(item.id()) {
            Some(&pos) => {
                self.items[pos] = item;
                true
            }
            None => false,
        }
    }

    fn reindex(&mut self) {
        self.index.clear();
        for (pos, item) in self.items.iter().enumerate() {
            self.index.insert(item.id().clone(), pos);
        }
    }
}

impl<T: Identified + Clone> Collection<T> {
    pub fn to_vec(&self) -> Vec<T> {
        self.items.clone()
    }
}

impl<'a, T: Identified> IntoIterator for &'a Collection<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

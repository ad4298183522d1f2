//! Keyed container for one entity kind.
//!
//! # Invariants
//! - Keys are canonical names and always equal the stored value's `name()`.
//! - Iteration is in ascending name order, which is what listing and page
//!   tokens rely on.

use crate::model::Resource;
use crate::store::{check_replacement, StoreError, StoreResult};
use std::collections::BTreeMap;
use std::ops::Bound;

/// Create-once table of entities keyed by canonical name.
#[derive(Debug, Clone)]
pub struct EntityTable<T> {
    rows: BTreeMap<String, T>,
}

impl<T> Default for EntityTable<T> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
        }
    }
}

impl<T: Resource> EntityTable<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.rows.contains_key(name)
    }

    /// Stores `value` under its own name. Fails if the name is taken.
    pub fn create(&mut self, value: T) -> StoreResult<()> {
        if self.rows.contains_key(value.name()) {
            return Err(StoreError::already_exists(T::KIND, value.name()));
        }
        self.rows.insert(value.name().to_string(), value);
        Ok(())
    }

    pub fn get(&self, name: &str) -> StoreResult<&T> {
        self.rows
            .get(name)
            .ok_or_else(|| StoreError::not_found(T::KIND, name))
    }

    /// Replaces the value stored under `name` and returns the previous one.
    pub fn update(&mut self, name: &str, value: T) -> StoreResult<T> {
        check_replacement(name, &value)?;
        match self.rows.get_mut(name) {
            Some(slot) => Ok(std::mem::replace(slot, value)),
            None => Err(StoreError::not_found(T::KIND, name)),
        }
    }

    /// Removes and returns the value stored under `name`.
    pub fn delete(&mut self, name: &str) -> StoreResult<T> {
        self.rows
            .remove(name)
            .ok_or_else(|| StoreError::not_found(T::KIND, name))
    }

    /// Iterates values whose name starts with `prefix` and sorts strictly
    /// after `after`, in name order.
    pub fn scan<'a>(
        &'a self,
        prefix: &'a str,
        after: Option<&str>,
    ) -> impl Iterator<Item = &'a T> + 'a {
        let lower = match after {
            Some(after) if after >= prefix => Bound::Excluded(after.to_string()),
            _ => Bound::Included(prefix.to_string()),
        };
        self.rows
            .range((lower, Bound::Unbounded))
            .take_while(move |(name, _)| name.starts_with(prefix))
            .map(|(_, value)| value)
    }
}

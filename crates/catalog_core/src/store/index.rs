//! Note → occurrences reverse lookup.
//!
//! # Invariants
//! - An occurrence name appears under exactly the note it references while
//!   the occurrence is stored.
//! - Entries are keyed by note name, independent of whether the note still
//!   exists; note deletion does not touch the index.
//! - Empty sets are dropped.

use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone, Default)]
pub struct RelationshipIndex {
    by_note: HashMap<String, BTreeSet<String>>,
}

impl RelationshipIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `occurrence_name` references `note_name`.
    pub fn link(&mut self, note_name: &str, occurrence_name: &str) {
        self.by_note
            .entry(note_name.to_string())
            .or_default()
            .insert(occurrence_name.to_string());
    }

    /// Removes the reference. No-op when it is not recorded.
    pub fn unlink(&mut self, note_name: &str, occurrence_name: &str) {
        if let Some(occurrences) = self.by_note.get_mut(note_name) {
            occurrences.remove(occurrence_name);
            if occurrences.is_empty() {
                self.by_note.remove(note_name);
            }
        }
    }

    /// Moves an occurrence from one note to another.
    pub fn relink(&mut self, old_note_name: &str, new_note_name: &str, occurrence_name: &str) {
        if old_note_name == new_note_name {
            return;
        }
        self.unlink(old_note_name, occurrence_name);
        self.link(new_note_name, occurrence_name);
    }

    /// Occurrence names referencing `note_name`, in name order, strictly
    /// after `after` when given.
    pub fn occurrences_of<'a>(
        &'a self,
        note_name: &str,
        after: Option<&'a str>,
    ) -> impl Iterator<Item = &'a str> + 'a {
        self.by_note
            .get(note_name)
            .into_iter()
            .flat_map(|occurrences| occurrences.iter())
            .map(String::as_str)
            .filter(move |name| after.map_or(true, |after| *name > after))
    }

    pub fn count_for(&self, note_name: &str) -> usize {
        self.by_note.get(note_name).map_or(0, BTreeSet::len)
    }
}

#[cfg(test)]
mod tests {
    use super::RelationshipIndex;

    #[test]
    fn link_unlink_and_relink_keep_sets_consistent() {
        let mut index = RelationshipIndex::new();
        index.link("n1", "o2");
        index.link("n1", "o1");
        index.link("n2", "o3");

        let ordered: Vec<_> = index.occurrences_of("n1", None).collect();
        assert_eq!(ordered, vec!["o1", "o2"]);

        index.relink("n1", "n2", "o2");
        assert_eq!(index.count_for("n1"), 1);
        assert_eq!(index.count_for("n2"), 2);

        index.unlink("n1", "o1");
        index.unlink("n1", "o1");
        assert_eq!(index.count_for("n1"), 0);
        assert_eq!(index.occurrences_of("n1", None).count(), 0);
    }

    #[test]
    fn occurrences_of_skips_up_to_cursor() {
        let mut index = RelationshipIndex::new();
        for name in ["a", "b", "c"] {
            index.link("n", name);
        }
        let rest: Vec<_> = index.occurrences_of("n", Some("a")).collect();
        assert_eq!(rest, vec!["b", "c"]);
    }
}

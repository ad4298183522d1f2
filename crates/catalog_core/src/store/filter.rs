//! Listing filter hook.
//!
//! Filter expressions are opaque to the storage engine. `Filter::parse` is
//! the single place where an expression is turned into a predicate; until a
//! query language lands, every expression compiles to `MatchAll`.

use crate::model::Resource;
use log::debug;

/// Compiled listing predicate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Filter {
    /// Admits every entity.
    #[default]
    MatchAll,
}

impl Filter {
    /// Compiles a filter expression.
    ///
    /// Unrecognized expressions are accepted and have no effect. They are
    /// logged at debug level so callers relying on them can be found.
    pub fn parse(expression: &str) -> Self {
        let trimmed = expression.trim();
        if !trimmed.is_empty() {
            debug!(
                "event=filter_ignored module=store status=ok filter_len={}",
                trimmed.chars().count()
            );
        }
        Self::MatchAll
    }

    pub fn matches<T: Resource>(&self, _item: &T) -> bool {
        match self {
            Self::MatchAll => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Filter;
    use crate::model::project::Project;

    #[test]
    fn unrecognized_expression_matches_everything() {
        let filter = Filter::parse("filters_are_yet_to_be_implemented");
        assert_eq!(filter, Filter::MatchAll);
        assert!(filter.matches(&Project::new("any")));
    }
}

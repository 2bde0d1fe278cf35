//! Host query wrappers.
//!
//! The host exposes four paged collection queries. Each [`QueryKind`] knows
//! its default ordering and how to express a page request; [`QueryBackend`]
//! runs the merged query.
//!
//! Arguments merge in three layers, later layers winning on key conflicts:
//!
//! 1. [`QueryKind::default_args`] (stable ordering by primary key)
//! 2. caller arguments
//! 3. [`QueryKind::pagination_args`]
//!
//! ```
//! use batchwise_features::{QueryArgs, QueryKind};
//!
//! let caller = QueryArgs::new().with("post_type", "page").with("order", "DESC");
//! let args = QueryKind::Posts.build_args(&caller, 3, 50);
//!
//! assert_eq!(args.get("orderby"), Some(&"ID".into()));
//! assert_eq!(args.get("order"), Some(&"DESC".into()));
//! assert_eq!(args.get("paged"), Some(&3.into()));
//! assert_eq!(args.get("posts_per_page"), Some(&50.into()));
//! ```

use core::fmt;
use std::sync::Arc;

use batchwise_hooks::BoxError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ─────────────────────────────────────────────────────────────────────────────
// QueryArgs
// ─────────────────────────────────────────────────────────────────────────────

/// Ordered query arguments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryArgs(IndexMap<String, Value>);

impl QueryArgs {
    /// Creates an empty argument map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key`, returning the updated map.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Sets `key`. An existing key keeps its position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Returns the value for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Overlays every entry of `other` onto `self`.
    pub fn merge(&mut self, other: &Self) {
        for (key, value) in &other.0 {
            self.0.insert(key.clone(), value.clone());
        }
    }

    /// Number of arguments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no arguments are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the arguments in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value))
    }
}

impl From<IndexMap<String, Value>> for QueryArgs {
    fn from(map: IndexMap<String, Value>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for QueryArgs {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// QueryKind
// ─────────────────────────────────────────────────────────────────────────────

/// The paged collections a host can be queried for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryKind {
    /// Posts of any type.
    Posts,
    /// User accounts.
    Users,
    /// Taxonomy terms. Paged by offset rather than page number.
    Terms,
    /// Comments.
    Comments,
}

impl QueryKind {
    /// Every kind.
    pub const ALL: [Self; 4] = [Self::Posts, Self::Users, Self::Terms, Self::Comments];

    /// Lowercase name of the kind.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Posts => "posts",
            Self::Users => "users",
            Self::Terms => "terms",
            Self::Comments => "comments",
        }
    }

    /// Ascending order by the collection's primary key.
    #[must_use]
    pub fn default_args(self) -> QueryArgs {
        let orderby = match self {
            Self::Posts | Self::Users => "ID",
            Self::Terms => "term_id",
            Self::Comments => "comment_ID",
        };
        QueryArgs::new().with("orderby", orderby).with("order", "ASC")
    }

    /// Arguments selecting page `page` (1-based) of `page_size` items.
    #[must_use]
    pub fn pagination_args(self, page: usize, page_size: usize) -> QueryArgs {
        match self {
            Self::Posts => QueryArgs::new()
                .with("paged", page)
                .with("posts_per_page", page_size),
            Self::Users | Self::Comments => {
                QueryArgs::new().with("paged", page).with("number", page_size)
            }
            Self::Terms => QueryArgs::new()
                .with("offset", page.saturating_sub(1) * page_size)
                .with("number", page_size),
        }
    }

    /// Merges defaults, `caller` and pagination arguments, in that order.
    #[must_use]
    pub fn build_args(self, caller: &QueryArgs, page: usize, page_size: usize) -> QueryArgs {
        let mut args = self.default_args();
        args.merge(caller);
        args.merge(&self.pagination_args(page, page_size));
        args
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// QueryBackend
// ─────────────────────────────────────────────────────────────────────────────

/// Runs host collection queries.
///
/// Implementations return an empty page once the collection is exhausted.
pub trait QueryBackend<T>: 'static {
    /// Runs a `kind` query with fully merged `args`.
    ///
    /// # Errors
    ///
    /// Any backend failure. It aborts the current iteration step.
    fn query(&self, kind: QueryKind, args: &QueryArgs) -> Result<Vec<T>, BoxError>;
}

impl<T, B: QueryBackend<T> + ?Sized> QueryBackend<T> for Arc<B> {
    fn query(&self, kind: QueryKind, args: &QueryArgs) -> Result<Vec<T>, BoxError> {
        (**self).query(kind, args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_overrides_caller() {
        let caller = QueryArgs::new().with("paged", 99).with("number", 1);

        let args = QueryKind::Users.build_args(&caller, 2, 25);

        assert_eq!(args.get("paged"), Some(&Value::from(2)));
        assert_eq!(args.get("number"), Some(&Value::from(25)));
    }

    #[test]
    fn caller_overrides_defaults() {
        let caller = QueryArgs::new().with("orderby", "name");

        let args = QueryKind::Terms.build_args(&caller, 1, 10);

        assert_eq!(args.get("orderby"), Some(&Value::from("name")));
        assert_eq!(args.get("order"), Some(&Value::from("ASC")));
    }

    #[test]
    fn terms_page_by_offset() {
        let args = QueryKind::Terms.pagination_args(4, 20);

        assert_eq!(args.get("offset"), Some(&Value::from(60)));
        assert_eq!(args.get("number"), Some(&Value::from(20)));
        assert_eq!(args.get("paged"), None);
    }

    #[test]
    fn default_ordering_per_kind() {
        let orderby: Vec<Value> = QueryKind::ALL
            .iter()
            .map(|kind| kind.default_args().get("orderby").cloned().unwrap())
            .collect();

        assert_eq!(
            orderby,
            vec![
                Value::from("ID"),
                Value::from("ID"),
                Value::from("term_id"),
                Value::from("comment_ID"),
            ]
        );
    }

    #[test]
    fn merged_keys_keep_first_position() {
        let caller = QueryArgs::new().with("post_status", "publish").with("order", "DESC");

        let args = QueryKind::Posts.build_args(&caller, 1, 5);
        let keys: Vec<&str> = args.iter().map(|(key, _)| key).collect();

        assert_eq!(
            keys,
            vec!["orderby", "order", "post_status", "paged", "posts_per_page"]
        );
    }

    #[test]
    fn serializes_as_plain_object() {
        let args: QueryArgs = [("post_type", "post"), ("post_status", "draft")]
            .into_iter()
            .collect();

        let json = serde_json::to_string(&args).unwrap();
        assert_eq!(json, r#"{"post_type":"post","post_status":"draft"}"#);
        assert_eq!(QueryKind::Comments.to_string(), "comments");
    }
}

//! Lazily paginating iterator with lifecycle hooks.
//!
//! [`PaginatingIterator`] yields items one at a time from a paged data source,
//! requesting the next page only when the current one is used up. Features
//! registered through [`batchwise_hooks`] run before the first fetch, at each
//! page boundary and at termination.
//!
//! # Architecture
//!
//! - **Iterator** ([`iterator`]): configuration, locking and the
//!   `start`/`advance` protocol
//! - **Adapters** ([`adapter`]): [`Iterator`] implementations yielding owned items
//! - **Configuration** ([`config`]): page size and limit, from code, serde or
//!   the environment
//! - **State** ([`state`]): serializable diagnostic snapshots
//!
//! # Example
//!
//! ```
//! use batchwise_iter::PaginatingIterator;
//!
//! let ids = PaginatingIterator::new()
//!     .with_fetcher(|page, size| {
//!         let start = (page - 1) * size;
//!         (start..(start + size).min(7)).collect::<Vec<_>>()
//!     })?
//!     .with_page_size(3)?;
//!
//! let all: Vec<usize> = ids.into_iter().collect::<Result<_, _>>()?;
//! assert_eq!(all, vec![0, 1, 2, 3, 4, 5, 6]);
//! # Ok::<(), batchwise_iter::IterError>(())
//! ```

pub mod adapter;
pub mod config;
pub mod error;
pub mod iterator;
pub mod state;

pub use adapter::{IntoIter, Items};
pub use config::{DEFAULT_PAGE_SIZE, IteratorConfig, LIMIT_VAR, PAGE_SIZE_VAR};
pub use error::{ConfigError, IterError};
pub use iterator::PaginatingIterator;
pub use state::{HandlerNames, IteratorState};

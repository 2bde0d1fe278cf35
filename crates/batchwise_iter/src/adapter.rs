//! [`Iterator`] adapters over [`PaginatingIterator`].
//!
//! The adapters drive `start()`/`advance()` and yield owned copies of each
//! item. An error is yielded once, after which the adapter is fused.

use crate::error::IterError;
use crate::iterator::PaginatingIterator;

#[derive(Debug, Default)]
struct Cursor {
    // The iterator is already positioned on an item that has not been yielded.
    pending: bool,
    done: bool,
}

impl Cursor {
    fn for_iter<T>(iter: &PaginatingIterator<T>) -> Self {
        Self {
            pending: iter.has_current(),
            done: iter.is_finished(),
        }
    }

    fn step<T: Clone>(&mut self, iter: &mut PaginatingIterator<T>) -> Option<Result<T, IterError>> {
        if self.done {
            return None;
        }

        if self.pending {
            self.pending = false;
        } else {
            let moved = if iter.is_locked() {
                iter.advance()
            } else {
                iter.start()
            };
            if let Err(err) = moved {
                self.done = true;
                return Some(Err(err));
            }
        }

        match iter.peek_current() {
            Some(item) => Some(Ok(item.clone())),
            None => {
                self.done = true;
                None
            }
        }
    }
}

/// Owning adapter returned by [`PaginatingIterator::into_iter`].
#[derive(Debug)]
pub struct IntoIter<T> {
    inner: PaginatingIterator<T>,
    cursor: Cursor,
}

impl<T> IntoIter<T> {
    /// Returns the underlying paginating iterator.
    #[must_use]
    pub fn into_inner(self) -> PaginatingIterator<T> {
        self.inner
    }

    /// Borrows the underlying paginating iterator.
    #[must_use]
    pub fn get_ref(&self) -> &PaginatingIterator<T> {
        &self.inner
    }
}

impl<T: Clone> Iterator for IntoIter<T> {
    type Item = Result<T, IterError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.cursor.step(&mut self.inner)
    }
}

impl<T: Clone> core::iter::FusedIterator for IntoIter<T> {}

impl<T: Clone> IntoIterator for PaginatingIterator<T> {
    type Item = Result<T, IterError>;
    type IntoIter = IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        let cursor = Cursor::for_iter(&self);
        IntoIter {
            inner: self,
            cursor,
        }
    }
}

/// Borrowing adapter returned by [`PaginatingIterator::items`].
#[derive(Debug)]
pub struct Items<'a, T> {
    inner: &'a mut PaginatingIterator<T>,
    cursor: Cursor,
}

impl<T: Clone> Iterator for Items<'_, T> {
    type Item = Result<T, IterError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.cursor.step(&mut *self.inner)
    }
}

impl<T: Clone> core::iter::FusedIterator for Items<'_, T> {}

impl<T> PaginatingIterator<T> {
    /// Iterates by reference, leaving the iterator inspectable afterwards.
    ///
    /// ```
    /// use batchwise_iter::PaginatingIterator;
    ///
    /// let mut iter = PaginatingIterator::new()
    ///     .with_fetcher(|page, _| if page == 1 { vec!['a', 'b'] } else { Vec::new() })?;
    ///
    /// let items: Vec<char> = iter.items().collect::<Result<_, _>>()?;
    /// assert_eq!(items, vec!['a', 'b']);
    /// assert_eq!(iter.position_key(), 2);
    /// # Ok::<(), batchwise_iter::IterError>(())
    /// ```
    pub fn items(&mut self) -> Items<'_, T> {
        let cursor = Cursor::for_iter(self);
        Items {
            inner: self,
            cursor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn letters(page: usize, size: usize) -> Vec<char> {
        let alphabet: Vec<char> = ('a'..='g').collect();
        alphabet
            .chunks(size)
            .nth(page - 1)
            .map(<[char]>::to_vec)
            .unwrap_or_default()
    }

    #[test]
    fn into_iter_yields_every_item() {
        let iter = PaginatingIterator::new()
            .with_fetcher(letters)
            .unwrap()
            .with_page_size(3)
            .unwrap();

        let items: Vec<char> = iter.into_iter().map(Result::unwrap).collect();
        assert_eq!(items, ('a'..='g').collect::<Vec<_>>());
    }

    #[test]
    fn into_iter_resumes_after_manual_start() {
        let mut iter = PaginatingIterator::new()
            .with_fetcher(letters)
            .unwrap()
            .with_page_size(2)
            .unwrap();
        iter.start().unwrap();
        iter.advance().unwrap();

        let items: Vec<char> = iter.into_iter().map(Result::unwrap).collect();
        assert_eq!(items, ('b'..='g').collect::<Vec<_>>());
    }

    #[test]
    fn error_is_yielded_once() {
        let iter = PaginatingIterator::<u8>::new();
        let mut adapter = iter.into_iter();

        assert!(matches!(adapter.next(), Some(Err(IterError::MissingFetcher))));
        assert!(adapter.next().is_none());
    }

    #[test]
    fn into_inner_exposes_final_position() {
        let iter = PaginatingIterator::new()
            .with_fetcher(letters)
            .unwrap()
            .with_limit(4)
            .unwrap();

        let mut adapter = iter.into_iter();
        assert_eq!(adapter.by_ref().count(), 4);

        let iter = adapter.into_inner();
        assert!(iter.is_finished());
        assert_eq!(iter.position_key(), 4);
    }
}

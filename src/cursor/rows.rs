//! Lazy row iteration.

use std::iter::FusedIterator;

use crate::channel::Channel;
use crate::error::Result;
use crate::row::Row;

use super::Cursor;

/// Iterator over the remaining rows of the current result set.
///
/// Each call to `next` performs one [`Cursor::fetchone`]. Iteration ends at
/// the end of the result set or after the first error.
pub struct Rows<'r, 'c, C: Channel> {
    cursor: &'r mut Cursor<'c, C>,
    done: bool,
}

impl<'r, 'c, C: Channel> Rows<'r, 'c, C> {
    pub(super) fn new(cursor: &'r mut Cursor<'c, C>) -> Self {
        Self {
            cursor,
            done: false,
        }
    }
}

impl<C: Channel> Iterator for Rows<'_, '_, C> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.cursor.fetchone() {
            Ok(Some(row)) => Some(Ok(row)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl<C: Channel> FusedIterator for Rows<'_, '_, C> {}

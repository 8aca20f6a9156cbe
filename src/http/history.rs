//! Version chain shared by [`Uri`](crate::http::uri::Uri),
//! [`HttpRequest`](crate::http::request::HttpRequest) and
//! [`HttpResponse`](crate::http::response::HttpResponse).
//!
//! Every derivation may keep a handle on the instance it was derived from.
//! Links only point backwards, at strictly older immutable values, so a chain
//! can never form a cycle. Whether links are recorded at all is governed by
//! [`version_chain`](crate::config::MessageConfig::version_chain).

use std::sync::Arc;

use crate::config::config;

pub trait Versioned: Sized {
    /// The instance this one was derived from, if recorded.
    ///
    /// The link holds a copy taken at derivation time: it compares equal to
    /// the original instance but is not the same object in memory.
    fn previous(&self) -> Option<&Self>;

    /// Predecessors, newest first.
    fn history(&self) -> History<'_, Self> {
        History {
            next: self.previous(),
        }
    }

    /// Number of recorded predecessors.
    fn revision(&self) -> usize {
        self.history().count()
    }
}

pub struct History<'a, T> {
    next: Option<&'a T>,
}

impl<'a, T: Versioned> Iterator for History<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.previous();
        Some(current)
    }
}

/// Predecessor handle for a value about to be derived from `current`.
pub(crate) fn link<T: Clone>(current: &T) -> Option<Arc<T>> {
    if config().version_chain {
        Some(Arc::new(current.clone()))
    } else {
        None
    }
}

/// Releases a chain one link at a time instead of recursing through nested drops.
pub(crate) fn unlink<T>(mut next: Option<Arc<T>>, take: fn(&mut T) -> Option<Arc<T>>) {
    while let Some(link) = next {
        match Arc::try_unwrap(link) {
            Ok(mut value) => next = take(&mut value),
            // still referenced elsewhere, the other owner releases the rest
            Err(_) => break,
        }
    }
}

//! Stores: state holders that call the API and keep local state in step
//! with the server.

/// Session store.
pub mod auth;
/// Book collection store.
pub mod books;

pub use auth::AuthStore;
pub use books::{BookListState, BookStore};

use std::sync::atomic::{AtomicBool, Ordering};

/// Busy flag raised for the duration of a store operation.
#[derive(Debug, Default)]
pub struct Busy(AtomicBool);

impl Busy {
    /// Whether an operation is in flight.
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Raise the flag until the guard drops.
    pub fn enter(&self) -> BusyGuard<'_> {
        self.0.store(true, Ordering::SeqCst);
        BusyGuard(&self.0)
    }
}

/// Clears the busy flag on drop, whichever way the operation ended.
pub struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

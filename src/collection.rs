//! Generic collection contract
//!
//! Containers that report their size, can be flushed, and expose a serial
//! number for staleness checks. Keyed containers may refuse the blind `add`.

use crate::error::Result;

/// Minimal mapping-collection contract
pub trait Collection {
    type Item;

    /// Number of elements held
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Insert an element without any addressing information
    fn add(&self, item: Self::Item) -> Result<()>;

    /// Remove every element
    fn remove_all(&self);

    /// Monotonic counter bumped on every structural change
    fn serial_number(&self) -> u64;
}

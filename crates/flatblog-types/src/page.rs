use serde::{Deserialize, Serialize};

/// Zero-based index of a listing page.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Page(usize);

impl Page {
    pub const FIRST: Self = Self(0);

    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Translate the external 1-based page number. Both 0 and 1 name the
    /// first page.
    pub fn from_one_based(number: usize) -> Self {
        Self(number.saturating_sub(1))
    }

    pub const fn index(self) -> usize {
        self.0
    }

    /// Number of pages needed for `total` items, never less than one.
    pub fn count(total: usize, page_size: usize) -> usize {
        total.div_ceil(page_size.max(1)).max(1)
    }
}

//! Post storage for flatblog.
//!
//! [`PostStore`] owns the `posts/` namespace: one JSON record per post named
//! by its decimal identifier. It allocates identifiers, keeps the in-memory
//! [`ValiditySet`] of approved posts, and maintains the derived indexes on
//! every write:
//!
//! 1. the post record is written,
//! 2. its identifier is appended to the day's time index,
//! 3. its view counter is initialized.
//!
//! These steps are not atomic. A failure part way leaves the earlier steps
//! in place and is reported to the caller; nothing is rolled back.
//!
//! On open the store scans every post record once to recover the highest
//! assigned identifier and the set of approved posts.

pub mod error;
pub mod files;
pub mod store;
pub mod validity;

pub use error::{PostError, PostResult};
pub use files::PostFiles;
pub use store::{PostStore, DEFAULT_PAGE_SIZE};
pub use validity::ValiditySet;

//! Job board: listing, CRUD, archive toggling and drag reordering.

pub mod handlers;
pub mod ordering;

pub use handlers::{JobFilter, DEFAULT_PAGE_SIZE};

//! Data models exchanged with the backend.

mod document;
mod page;

pub use document::*;
pub use page::*;

pub mod document;
pub mod mode;

pub use document::{Document, DEFAULT_TITLE};
pub use mode::{LineAction, Mode};

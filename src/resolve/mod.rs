pub mod entry;
pub mod refs;

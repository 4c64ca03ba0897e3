pub mod api;
pub mod hash;
pub mod models;

pub use hash::RecordHash;

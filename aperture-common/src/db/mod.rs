//! Database schema, models and queries

pub mod categories;
pub mod init;
pub mod photos;

pub use categories::*;
pub use init::*;
pub use photos::*;

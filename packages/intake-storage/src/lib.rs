pub mod db;
pub mod embeddings;
pub mod events;
pub mod jobs;
pub mod ledger;
pub mod models;
pub mod schema;
pub mod sessions;

mod error;

pub use error::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

pub mod client;
pub mod error;
pub mod query;
pub mod types;

pub use client::OverpassClient;
pub use error::QueryError;
pub use query::{build_query, NameFilter, PoiSearchSpec, SearchArea};
pub use types::OverpassResponse;

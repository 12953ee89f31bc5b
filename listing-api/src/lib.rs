pub mod limits;
pub mod request;
pub mod result;
pub mod status;

pub use result::{total_pages, Provider, SearchResult};

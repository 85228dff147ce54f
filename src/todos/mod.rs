pub mod cache;
pub mod client;
pub mod repository;
pub mod types;

pub use repository::TodoRepository;
pub use types::{FetchResult, TodoRecord};

#[cfg(test)]
pub mod testing;

pub mod config;
pub mod logging;

pub mod content_type;
pub mod error;
pub mod fetch;
pub mod items;
pub mod loader;
pub mod sheet;

pub use error::{LoadError, LoadErrorKind, LoadResult};
pub use loader::{ContentLoader, ItemSource};

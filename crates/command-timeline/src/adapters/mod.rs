pub mod screenshots;

pub use screenshots::InMemoryScreenshots;

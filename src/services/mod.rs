// charrank services
// Services provide the ranking pipeline stages plus settings and scheduling.

pub mod aggregator;
pub mod autosave;
pub mod detail_fetcher;
pub mod differ;
pub mod extractor;
pub mod pipeline;
pub mod settings_engine;
pub mod snapshot_io;

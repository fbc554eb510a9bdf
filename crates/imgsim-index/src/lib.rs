//! Embedding stores, the model registry, batch ingestion and similarity search.

pub mod invoke;
pub mod pipeline;
pub mod query;
pub mod registry;
pub mod search;
pub mod store;

pub use pipeline::{IngestionPipeline, PipelineOptions};
pub use query::QuerySession;
pub use search::{cosine_similarity, rank};

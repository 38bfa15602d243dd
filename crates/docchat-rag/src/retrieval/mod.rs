//! Query-time retrieval and the question answering pipeline

mod query;
mod retriever;

pub use query::QueryPipeline;
pub use retriever::Retriever;

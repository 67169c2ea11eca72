#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod ingest;
pub mod retrieve;

pub use ingest::IngestionPipeline;
pub use retrieve::{augment_question, Answer, RetrievalFallback, RetrievalPipeline, CONTEXT_SEPARATOR};

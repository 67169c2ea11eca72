#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod store;

pub use store::{IndexStats, VectorIndex, COSINE_METRIC, DEFAULT_TOP_K};

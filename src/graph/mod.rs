//! The in-memory code graph and the builder that populates it.

mod builder;
mod resolver;
mod store;

pub use builder::{GraphBuilder, LogSink, ProgressCallback, ProgressConfig};
pub use resolver::RelationshipResolver;
pub use store::GraphStore;

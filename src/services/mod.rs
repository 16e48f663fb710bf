pub mod database;
pub mod extraction;
pub mod llm_service;
pub mod pipeline;
pub mod result_parser;
pub mod speech;
pub mod summarizer;
pub mod translator;

#[cfg(test)]
pub(crate) mod mock;

pub use database::{DatabaseAdapter, SqliteAdapter};
pub use llm_service::*;
pub use pipeline::*;
pub use speech::*;
pub use summarizer::*;
pub use translator::*;

#![allow(dead_code)]

use bson::Document;
use engine_processing::{DocumentFilterCompiler, FilterCompiler, Result};
use model::execution::expr::Filter;

pub mod utils;

/// Compile with the default compiler and unwrap the native document.
fn compile(filter: &Filter) -> Result<Document> {
    DocumentFilterCompiler::new()
        .compile(filter)
        .map(|query| query.into_document())
}

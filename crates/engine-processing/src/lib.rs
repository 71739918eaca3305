pub mod error;
pub mod filter;

pub use error::{FilterError, Result};
pub use filter::{
    compiler::FilterCompiler, document::DocumentFilterCompiler, functions::FunctionRegistry,
    parse::parse_filter, settings::FilterSettings,
};

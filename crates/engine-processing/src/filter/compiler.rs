use crate::error::Result;
use model::execution::expr::Filter;

/// A trait for compiling filter expressions into a specific format.
pub trait FilterCompiler {
    /// The type of filter that this compiler produces.
    type Filter;

    /// Compile the expression tree into a filter.
    fn compile(&self, filter: &Filter) -> Result<Self::Filter>;
}

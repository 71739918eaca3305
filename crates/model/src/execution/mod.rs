pub mod expr;
pub mod reference;

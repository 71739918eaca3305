pub mod encoder;
pub mod query;

pub use encoder::{BsonValueEncoder, ValueEncoder};
pub use query::DocumentQuery;

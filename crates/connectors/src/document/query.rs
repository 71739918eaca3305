use bson::{Bson, Document, Regex, doc};
use std::fmt;

/// A filter in the document store's native query syntax.
///
/// Every constructor produces a self-contained filter document; logical
/// combinators keep their children in order and never merge them.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentQuery(Document);

impl DocumentQuery {
    /// `{ field: value }`
    pub fn eq(field: &str, value: Bson) -> Self {
        Self(doc! { field: value })
    }

    /// `{ field: { "$ne": value } }`
    pub fn ne(field: &str, value: Bson) -> Self {
        Self::operator(field, "$ne", value)
    }

    pub fn gt(field: &str, value: Bson) -> Self {
        Self::operator(field, "$gt", value)
    }

    pub fn gte(field: &str, value: Bson) -> Self {
        Self::operator(field, "$gte", value)
    }

    pub fn lt(field: &str, value: Bson) -> Self {
        Self::operator(field, "$lt", value)
    }

    pub fn lte(field: &str, value: Bson) -> Self {
        Self::operator(field, "$lte", value)
    }

    /// `{ field: { "$in": [values] } }`
    pub fn is_in(field: &str, values: Vec<Bson>) -> Self {
        Self::operator(field, "$in", Bson::Array(values))
    }

    /// `{ field: { "$nin": [values] } }`
    pub fn not_in(field: &str, values: Vec<Bson>) -> Self {
        Self::operator(field, "$nin", Bson::Array(values))
    }

    /// `{ "$and": [queries] }`
    pub fn and(queries: Vec<DocumentQuery>) -> Self {
        Self::combine("$and", queries)
    }

    /// `{ "$or": [queries] }`
    pub fn or(queries: Vec<DocumentQuery>) -> Self {
        Self::combine("$or", queries)
    }

    /// `{ field: /pattern/options }`
    pub fn matches(field: &str, pattern: impl Into<String>, options: impl Into<String>) -> Self {
        let regex = Regex {
            pattern: pattern.into(),
            options: options.into(),
        };
        Self(doc! { field: Bson::RegularExpression(regex) })
    }

    pub fn as_document(&self) -> &Document {
        &self.0
    }

    pub fn into_document(self) -> Document {
        self.0
    }

    /// Relaxed Extended JSON form, as shown by the store's shell.
    pub fn to_extended_json(&self) -> serde_json::Value {
        Bson::Document(self.0.clone()).into_relaxed_extjson()
    }

    fn operator(field: &str, op: &str, value: Bson) -> Self {
        Self(doc! { field: { op: value } })
    }

    fn combine(op: &str, queries: Vec<DocumentQuery>) -> Self {
        let children = queries
            .into_iter()
            .map(|q| Bson::Document(q.0))
            .collect::<Vec<_>>();
        Self(doc! { op: children })
    }
}

impl From<DocumentQuery> for Document {
    fn from(query: DocumentQuery) -> Self {
        query.0
    }
}

impl fmt::Display for DocumentQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_extended_json())
    }
}

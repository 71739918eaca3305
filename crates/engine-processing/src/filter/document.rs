use super::{
    compiler::FilterCompiler, functions::FunctionRegistry, parse::parse_filter,
    settings::FilterSettings,
};
use crate::error::{FilterError, Result};
use bson::Bson;
use connectors::document::{BsonValueEncoder, DocumentQuery, ValueEncoder};
use model::{
    core::value::Value,
    execution::{
        expr::{ExprKind, Expression, Filter, Operand, Range},
        reference::{FieldPaths, FieldRef},
    },
};
use std::borrow::Cow;
use tracing::{debug, trace};

/// Compiles filter expression trees into native document-store queries.
///
/// The compiler holds no mutable state; one instance can serve any number
/// of concurrent `compile` calls.
#[derive(Debug, Clone)]
pub struct DocumentFilterCompiler<E = BsonValueEncoder> {
    encoder: E,
    registry: Cow<'static, FunctionRegistry>,
    settings: FilterSettings,
}

impl DocumentFilterCompiler {
    pub fn new() -> Self {
        Self {
            encoder: BsonValueEncoder::new(),
            registry: Cow::Borrowed(FunctionRegistry::builtin()),
            settings: FilterSettings::default(),
        }
    }
}

impl Default for DocumentFilterCompiler {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: ValueEncoder> DocumentFilterCompiler<E> {
    pub fn with_encoder<T: ValueEncoder>(self, encoder: T) -> DocumentFilterCompiler<T> {
        DocumentFilterCompiler {
            encoder,
            registry: self.registry,
            settings: self.settings,
        }
    }

    pub fn with_registry(mut self, registry: FunctionRegistry) -> Self {
        self.registry = Cow::Owned(registry);
        self
    }

    pub fn with_settings(mut self, settings: FilterSettings) -> Result<Self> {
        settings.validate()?;
        self.settings = settings;
        Ok(self)
    }

    pub fn settings(&self) -> &FilterSettings {
        &self.settings
    }

    /// Compiles a filter shipped as JSON; see [`parse_filter`].
    pub fn compile_json(&self, json: &str) -> Result<DocumentQuery> {
        self.compile(&parse_filter(json)?)
    }

    /// Dotted store path for `field`. `Id` and `id` segments are renamed to
    /// the identity field; any other spelling is left alone.
    pub fn resolve(&self, paths: &FieldPaths, field: FieldRef) -> Option<String> {
        let segments = paths
            .segments(field)?
            .into_iter()
            .map(|name| match name {
                "Id" | "id" => self.settings.identity_field.as_str(),
                other => other,
            })
            .collect::<Vec<_>>();
        Some(segments.join("."))
    }

    fn resolve_operand(
        &self,
        paths: &FieldPaths,
        kind: ExprKind,
        operand: &Operand,
    ) -> Result<String> {
        match operand {
            Operand::Field(field) => self.resolve(paths, *field).ok_or_else(|| {
                FilterError::invalid_operand(
                    kind,
                    format!("dangling field reference #{}", field.index()),
                )
            }),
            // Already a store path
            Operand::Literal(Value::String(path)) => Ok(path.clone()),
            other => Err(FilterError::invalid_operand(
                kind,
                format!("expected a field path, got {}", other.shape()),
            )),
        }
    }

    fn compile_expr(
        &self,
        paths: &FieldPaths,
        expr: &Expression,
        depth: usize,
    ) -> Result<DocumentQuery> {
        if depth > self.settings.max_depth {
            return Err(FilterError::DepthExceeded {
                limit: self.settings.max_depth,
            });
        }

        trace!(kind = %expr.kind, depth, "Compiling filter expression");

        match expr.kind {
            ExprKind::And => Ok(DocumentQuery::and(self.compile_children(paths, expr, depth)?)),
            ExprKind::Or => Ok(DocumentQuery::or(self.compile_children(paths, expr, depth)?)),
            ExprKind::Equal => self.compile_equality(paths, expr, true),
            ExprKind::NotEqual => self.compile_equality(paths, expr, false),
            ExprKind::GreaterThan => self.compile_comparison(paths, expr, DocumentQuery::gt),
            ExprKind::GreaterThanOrEqual => {
                self.compile_comparison(paths, expr, DocumentQuery::gte)
            }
            ExprKind::LessThan => self.compile_comparison(paths, expr, DocumentQuery::lt),
            ExprKind::LessThanOrEqual => self.compile_comparison(paths, expr, DocumentQuery::lte),
            ExprKind::Function => self.compile_function(paths, expr),
        }
    }

    fn compile_children(
        &self,
        paths: &FieldPaths,
        expr: &Expression,
        depth: usize,
    ) -> Result<Vec<DocumentQuery>> {
        [&expr.left, &expr.right]
            .into_iter()
            .map(|operand| match operand {
                Operand::Expression(inner) => self.compile_expr(paths, inner, depth + 1),
                other => Err(FilterError::invalid_operand(
                    expr.kind,
                    format!("expected a nested expression, got {}", other.shape()),
                )),
            })
            .collect()
    }

    fn compile_equality(
        &self,
        paths: &FieldPaths,
        expr: &Expression,
        equal: bool,
    ) -> Result<DocumentQuery> {
        let field = self.resolve_operand(paths, expr.kind, &expr.left)?;

        match &expr.right {
            Operand::Range(range) => Ok(self.compile_range(&field, range, equal)),
            Operand::List(values) => {
                let values = self.encoder.encode_values(values);
                Ok(if equal {
                    DocumentQuery::is_in(&field, values)
                } else {
                    DocumentQuery::not_in(&field, values)
                })
            }
            Operand::Literal(value) => {
                let value = self.encoder.encode_value(value);
                Ok(if equal {
                    DocumentQuery::eq(&field, value)
                } else {
                    DocumentQuery::ne(&field, value)
                })
            }
            other => Err(FilterError::invalid_operand(
                expr.kind,
                format!("cannot compare a field with a {}", other.shape()),
            )),
        }
    }

    /// Inside: `start <= v AND v <= end`. Outside: `v <= start OR v >= end`,
    /// which also matches the two bounds themselves.
    fn compile_range(&self, field: &str, range: &Range, inside: bool) -> DocumentQuery {
        let start = self.encoder.encode_value(&range.start);
        let end = self.encoder.encode_value(&range.end);

        if inside {
            DocumentQuery::and(vec![
                DocumentQuery::gte(field, start),
                DocumentQuery::lte(field, end),
            ])
        } else {
            DocumentQuery::or(vec![
                DocumentQuery::lte(field, start),
                DocumentQuery::gte(field, end),
            ])
        }
    }

    fn compile_comparison(
        &self,
        paths: &FieldPaths,
        expr: &Expression,
        operator: fn(&str, Bson) -> DocumentQuery,
    ) -> Result<DocumentQuery> {
        let field = self.resolve_operand(paths, expr.kind, &expr.left)?;

        match &expr.right {
            Operand::Literal(value) => Ok(operator(&field, self.encoder.encode_value(value))),
            other => Err(FilterError::invalid_operand(
                expr.kind,
                format!("expected a scalar, got {}", other.shape()),
            )),
        }
    }

    fn compile_function(&self, paths: &FieldPaths, expr: &Expression) -> Result<DocumentQuery> {
        let Operand::Function(call) = &expr.right else {
            return Err(FilterError::invalid_operand(
                expr.kind,
                format!("expected a function call, got {}", expr.right.shape()),
            ));
        };

        if !matches!(expr.left, Operand::Field(_)) {
            return Err(FilterError::invalid_operand(
                expr.kind,
                format!("function '{}' must target a field reference", call.name),
            ));
        }
        let field = self.resolve_operand(paths, expr.kind, &expr.left)?;
        self.registry.call(&call.name, &field, &call.args)
    }
}

impl<E: ValueEncoder> FilterCompiler for DocumentFilterCompiler<E> {
    type Filter = DocumentQuery;

    fn compile(&self, filter: &Filter) -> Result<Self::Filter> {
        let query = self.compile_expr(&filter.paths, &filter.root, 1)?;
        debug!(query = %query, "Compiled document filter");
        Ok(query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::{Bson, Regex, doc};
    use model::execution::expr::{FilterBuilder, FunctionCall};

    fn compile(filter: &Filter) -> Result<bson::Document> {
        DocumentFilterCompiler::new()
            .compile(filter)
            .map(DocumentQuery::into_document)
    }

    fn regex(pattern: &str) -> Bson {
        Bson::RegularExpression(Regex {
            pattern: pattern.to_string(),
            options: String::new(),
        })
    }

    #[test]
    fn test_resolve_renames_exact_id_segments() {
        let mut paths = FieldPaths::new();
        let order = paths.root("order");
        let id = paths.child(order, "Id");
        let lower = paths.child(order, "id");
        let upper = paths.child(order, "ID");
        let suffix = paths.child(order, "myid");

        let compiler = DocumentFilterCompiler::new();
        assert_eq!(compiler.resolve(&paths, id).as_deref(), Some("order._id"));
        assert_eq!(compiler.resolve(&paths, lower).as_deref(), Some("order._id"));
        assert_eq!(compiler.resolve(&paths, upper).as_deref(), Some("order.ID"));
        assert_eq!(compiler.resolve(&paths, suffix).as_deref(), Some("order.myid"));
    }

    #[test]
    fn test_resolve_uses_configured_identity_field() {
        let mut paths = FieldPaths::new();
        let id = paths.root("Id");
        let settings = FilterSettings {
            identity_field: "pk".to_string(),
            ..FilterSettings::default()
        };
        let compiler = DocumentFilterCompiler::new().with_settings(settings).unwrap();
        assert_eq!(compiler.resolve(&paths, id).as_deref(), Some("pk"));
    }

    #[test]
    fn test_equal_range() {
        let mut builder = FilterBuilder::new();
        let age = builder.field("age");
        let filter = builder.finish(Expression::eq(age, Range::new(1, 10)));

        assert_eq!(
            compile(&filter).unwrap(),
            doc! { "$and": [ { "age": { "$gte": 1_i64 } }, { "age": { "$lte": 10_i64 } } ] }
        );
    }

    #[test]
    fn test_not_equal_range_includes_bounds() {
        let mut builder = FilterBuilder::new();
        let age = builder.field("age");
        let filter = builder.finish(Expression::ne(age, Range::new(1, 10)));

        // Bounds 1 and 10 satisfy both the range and its complement.
        assert_eq!(
            compile(&filter).unwrap(),
            doc! { "$or": [ { "age": { "$lte": 1_i64 } }, { "age": { "$gte": 10_i64 } } ] }
        );
    }

    #[test]
    fn test_list_membership() {
        let mut builder = FilterBuilder::new();
        let status = builder.field("status");
        let values = vec![Value::Int(1), Value::Int(2), Value::Int(3)];
        let filter = builder.finish(Expression::or(
            Expression::eq(status, values.clone()),
            Expression::ne(status, values),
        ));

        assert_eq!(
            compile(&filter).unwrap(),
            doc! { "$or": [
                { "status": { "$in": [1_i64, 2_i64, 3_i64] } },
                { "status": { "$nin": [1_i64, 2_i64, 3_i64] } },
            ] }
        );
    }

    #[test]
    fn test_string_is_scalar_equality() {
        let mut builder = FilterBuilder::new();
        let status = builder.field("status");
        let filter = builder.finish(Expression::eq(status, Value::from("active")));
        assert_eq!(compile(&filter).unwrap(), doc! { "status": "active" });
    }

    #[test]
    fn test_comparisons() {
        let mut builder = FilterBuilder::new();
        let score = builder.path("stats.score");
        let cases = [
            (Expression::gt(score, 5), doc! { "stats.score": { "$gt": 5_i64 } }),
            (Expression::gte(score, 5), doc! { "stats.score": { "$gte": 5_i64 } }),
            (Expression::lt(score, 5), doc! { "stats.score": { "$lt": 5_i64 } }),
            (Expression::lte(score, 5), doc! { "stats.score": { "$lte": 5_i64 } }),
        ];

        let paths = builder.finish(Expression::gt(score, 0)).paths;
        for (expr, expected) in cases {
            let filter = Filter {
                paths: paths.clone(),
                root: expr,
            };
            assert_eq!(compile(&filter).unwrap(), expected);
        }
    }

    #[test]
    fn test_literal_path_passes_through() {
        let filter = Filter {
            paths: FieldPaths::new(),
            root: Expression::new(ExprKind::GreaterThan, Value::from("meta.rank"), Value::Int(2)),
        };
        assert_eq!(compile(&filter).unwrap(), doc! { "meta.rank": { "$gt": 2_i64 } });
    }

    #[test]
    fn test_comparison_rejects_range() {
        let mut builder = FilterBuilder::new();
        let age = builder.field("age");
        let filter = builder.finish(Expression::new(ExprKind::LessThan, age, Range::new(1, 2)));
        assert!(matches!(
            compile(&filter),
            Err(FilterError::InvalidOperand { kind: ExprKind::LessThan, .. })
        ));
    }

    #[test]
    fn test_function_lowering() {
        let mut builder = FilterBuilder::new();
        let name = builder.field("name");
        let filter = builder.finish(Expression::call(name, "StartsWith", vec!["Jo".into()]));
        assert_eq!(compile(&filter).unwrap(), doc! { "name": regex("^Jo.*") });
    }

    #[test]
    fn test_unknown_function() {
        let mut builder = FilterBuilder::new();
        let name = builder.field("name");
        let filter = builder.finish(Expression::call(name, "soundex", vec!["Jon".into()]));
        assert!(matches!(compile(&filter), Err(FilterError::UnsupportedFunction(_))));
    }

    #[test]
    fn test_function_requires_function_operand() {
        let mut builder = FilterBuilder::new();
        let name = builder.field("name");
        let filter = builder.finish(Expression::new(ExprKind::Function, name, Value::from("Jo")));
        assert!(matches!(
            compile(&filter),
            Err(FilterError::InvalidOperand { kind: ExprKind::Function, .. })
        ));
    }

    #[test]
    fn test_function_requires_field_reference() {
        let filter = Filter {
            paths: FieldPaths::new(),
            root: Expression::new(
                ExprKind::Function,
                Value::from("name"),
                FunctionCall::new("contains", vec!["x".into()]),
            ),
        };
        assert!(matches!(
            compile(&filter),
            Err(FilterError::InvalidOperand { kind: ExprKind::Function, .. })
        ));
    }

    #[test]
    fn test_logical_operand_must_be_expression() {
        let mut builder = FilterBuilder::new();
        let a = builder.field("a");
        let filter = builder.finish(Expression::new(
            ExprKind::And,
            Expression::eq(a, Value::Int(1)),
            Value::Boolean(true),
        ));
        assert!(matches!(
            compile(&filter),
            Err(FilterError::InvalidOperand { kind: ExprKind::And, .. })
        ));
    }

    #[test]
    fn test_dangling_reference() {
        let mut builder = FilterBuilder::new();
        let a = builder.field("a");
        let filter = Filter {
            paths: FieldPaths::new(),
            root: Expression::eq(a, Value::Int(1)),
        };
        assert!(matches!(compile(&filter), Err(FilterError::InvalidOperand { .. })));
    }

    #[test]
    fn test_depth_limit() {
        let mut builder = FilterBuilder::new();
        let a = builder.field("a");
        let leaf = || Expression::eq(a, Value::Int(1));
        let filter = builder.finish(Expression::and(leaf(), Expression::and(leaf(), leaf())));

        let settings = FilterSettings {
            max_depth: 2,
            ..FilterSettings::default()
        };
        let compiler = DocumentFilterCompiler::new().with_settings(settings).unwrap();
        assert!(matches!(
            compiler.compile(&filter),
            Err(FilterError::DepthExceeded { limit: 2 })
        ));
    }

    #[test]
    fn test_with_settings_validates() {
        let settings = FilterSettings {
            max_depth: 0,
            ..FilterSettings::default()
        };
        assert!(DocumentFilterCompiler::new().with_settings(settings).is_err());
    }

    #[test]
    fn test_custom_encoder() {
        struct Stringly;

        impl ValueEncoder for Stringly {
            fn encode_value(&self, value: &Value) -> Bson {
                Bson::String(value.to_string())
            }
        }

        let mut builder = FilterBuilder::new();
        let n = builder.field("n");
        let filter = builder.finish(Expression::gt(n, 3));
        let compiler = DocumentFilterCompiler::new().with_encoder(Stringly);
        assert_eq!(
            compiler.compile(&filter).unwrap().into_document(),
            doc! { "n": { "$gt": "3" } }
        );
    }
}

use crate::{
    core::value::Value,
    execution::reference::{FieldPaths, FieldRef},
};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;

/// Expression discriminant. Deserializes from its name, case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum ExprKind {
    // Logical
    And,
    Or,
    // Equality
    Equal,
    NotEqual,
    // Comparison
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    // Named function
    Function,
}

impl ExprKind {
    pub const ALL: [ExprKind; 9] = [
        ExprKind::And,
        ExprKind::Or,
        ExprKind::Equal,
        ExprKind::NotEqual,
        ExprKind::GreaterThan,
        ExprKind::GreaterThanOrEqual,
        ExprKind::LessThan,
        ExprKind::LessThanOrEqual,
        ExprKind::Function,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ExprKind::And => "And",
            ExprKind::Or => "Or",
            ExprKind::Equal => "Equal",
            ExprKind::NotEqual => "NotEqual",
            ExprKind::GreaterThan => "GreaterThan",
            ExprKind::GreaterThanOrEqual => "GreaterThanOrEqual",
            ExprKind::LessThan => "LessThan",
            ExprKind::LessThanOrEqual => "LessThanOrEqual",
            ExprKind::Function => "Function",
        }
    }
}

impl fmt::Display for ExprKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown expression kind: {0}")]
pub struct UnknownExprKind(pub String);

impl FromStr for ExprKind {
    type Err = UnknownExprKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ExprKind::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownExprKind(s.to_string()))
    }
}

impl TryFrom<String> for ExprKind {
    type Error = UnknownExprKind;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        name.parse()
    }
}

/// Inclusive interval `[start, end]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Range {
    pub start: Value,
    pub end: Value,
}

impl Range {
    pub fn new(start: impl Into<Value>, end: impl Into<Value>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }
}

/// Named function invocation with positional arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    pub args: Vec<Value>,
}

impl FunctionCall {
    pub fn new(name: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }
}

/// One side of an expression node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operand {
    Expression(Box<Expression>),
    Field(FieldRef),
    Literal(Value),
    Range(Range),
    List(Vec<Value>),
    Function(FunctionCall),
}

impl Operand {
    /// Short shape name used in diagnostics.
    pub fn shape(&self) -> &'static str {
        match self {
            Operand::Expression(_) => "expression",
            Operand::Field(_) => "field reference",
            Operand::Literal(_) => "literal",
            Operand::Range(_) => "range",
            Operand::List(_) => "list",
            Operand::Function(_) => "function",
        }
    }
}

impl From<Expression> for Operand {
    fn from(expr: Expression) -> Self {
        Operand::Expression(Box::new(expr))
    }
}

impl From<FieldRef> for Operand {
    fn from(field: FieldRef) -> Self {
        Operand::Field(field)
    }
}

impl From<Value> for Operand {
    fn from(value: Value) -> Self {
        Operand::Literal(value)
    }
}

impl From<Range> for Operand {
    fn from(range: Range) -> Self {
        Operand::Range(range)
    }
}

impl From<Vec<Value>> for Operand {
    fn from(values: Vec<Value>) -> Self {
        Operand::List(values)
    }
}

impl From<FunctionCall> for Operand {
    fn from(call: FunctionCall) -> Self {
        Operand::Function(call)
    }
}

/// A node of the filter-condition tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expression {
    pub kind: ExprKind,
    pub left: Operand,
    pub right: Operand,
}

impl Expression {
    pub fn new(kind: ExprKind, left: impl Into<Operand>, right: impl Into<Operand>) -> Self {
        Self {
            kind,
            left: left.into(),
            right: right.into(),
        }
    }

    pub fn and(left: Expression, right: Expression) -> Self {
        Self::new(ExprKind::And, left, right)
    }

    pub fn or(left: Expression, right: Expression) -> Self {
        Self::new(ExprKind::Or, left, right)
    }

    pub fn eq(field: FieldRef, right: impl Into<Operand>) -> Self {
        Self::new(ExprKind::Equal, field, right)
    }

    pub fn ne(field: FieldRef, right: impl Into<Operand>) -> Self {
        Self::new(ExprKind::NotEqual, field, right)
    }

    pub fn gt(field: FieldRef, value: impl Into<Value>) -> Self {
        Self::new(ExprKind::GreaterThan, field, value.into())
    }

    pub fn gte(field: FieldRef, value: impl Into<Value>) -> Self {
        Self::new(ExprKind::GreaterThanOrEqual, field, value.into())
    }

    pub fn lt(field: FieldRef, value: impl Into<Value>) -> Self {
        Self::new(ExprKind::LessThan, field, value.into())
    }

    pub fn lte(field: FieldRef, value: impl Into<Value>) -> Self {
        Self::new(ExprKind::LessThanOrEqual, field, value.into())
    }

    pub fn call(field: FieldRef, name: impl Into<String>, args: Vec<Value>) -> Self {
        Self::new(ExprKind::Function, field, FunctionCall::new(name, args))
    }
}

/// An expression tree together with the field arena its references point
/// into.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub paths: FieldPaths,
    pub root: Expression,
}

/// Incrementally registers field paths, then seals them with a root
/// expression into a [`Filter`].
#[derive(Debug, Default)]
pub struct FilterBuilder {
    paths: FieldPaths,
}

impl FilterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(&mut self, name: impl Into<String>) -> FieldRef {
        self.paths.root(name)
    }

    pub fn child(&mut self, owner: FieldRef, name: impl Into<String>) -> FieldRef {
        self.paths.child(owner, name)
    }

    pub fn path(&mut self, dotted: &str) -> FieldRef {
        self.paths.dotted(dotted)
    }

    pub fn finish(self, root: Expression) -> Filter {
        Filter {
            paths: self.paths,
            root,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_str_case_insensitive() {
        assert_eq!("And".parse::<ExprKind>(), Ok(ExprKind::And));
        assert_eq!(
            "greaterthanorequal".parse::<ExprKind>(),
            Ok(ExprKind::GreaterThanOrEqual)
        );
        assert_eq!(
            "Between".parse::<ExprKind>(),
            Err(UnknownExprKind("Between".to_string()))
        );
    }

    #[test]
    fn test_kind_deserializes_by_name() {
        let kind: ExprKind = serde_json::from_str(r#""lessthan""#).unwrap();
        assert_eq!(kind, ExprKind::LessThan);
        assert_eq!(serde_json::to_string(&kind).unwrap(), r#""LessThan""#);

        let err = serde_json::from_str::<ExprKind>(r#""Between""#).unwrap_err();
        assert!(err.to_string().contains("Unknown expression kind: Between"));
    }

    #[test]
    fn test_filter_serde_roundtrip() {
        let mut builder = FilterBuilder::new();
        let name = builder.path("user.name");
        let filter = builder.finish(Expression::call(name, "startswith", vec!["Jo".into()]));

        let json = serde_json::to_string(&filter).unwrap();
        let back: Filter = serde_json::from_str(&json).unwrap();
        assert_eq!(back, filter);
    }
}

use bson::{Bson, Regex};
use model::{
    core::value::Value,
    execution::expr::{Expression, Filter, FilterBuilder},
};

/// Pattern-match value with no options, as produced by the built-in functions.
pub fn regex(pattern: &str) -> Bson {
    Bson::RegularExpression(Regex {
        pattern: pattern.to_string(),
        options: String::new(),
    })
}

/// `And(Equal(a, 1), Or(Equal(b, 2), Equal(c, 3)))`
pub fn nested_filter() -> Filter {
    let mut builder = FilterBuilder::new();
    let a = builder.field("a");
    let b = builder.field("b");
    let c = builder.field("c");

    builder.finish(Expression::and(
        Expression::eq(a, Value::Int(1)),
        Expression::or(
            Expression::eq(b, Value::Int(2)),
            Expression::eq(c, Value::Int(3)),
        ),
    ))
}

/// Single-function filter over `name`.
pub fn function_filter(function: &str, arg: Value) -> Filter {
    let mut builder = FilterBuilder::new();
    let name = builder.field("name");
    builder.finish(Expression::call(name, function, vec![arg]))
}

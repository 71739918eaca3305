use crate::error::Result;
use model::execution::expr::{ExprKind, Filter};
use serde_json::Value as Json;
use tracing::warn;

/// Parses a filter shipped as JSON by an upstream query layer.
///
/// Expression kinds are checked by name before the tree is decoded, so an
/// unknown discriminant fails with `UnsupportedExpression` instead of a
/// decoding error. Anything else that does not fit the tree is `Malformed`.
pub fn parse_filter(json: &str) -> Result<Filter> {
    let raw: Json = serde_json::from_str(json)?;
    check_kinds(&raw)?;
    Ok(serde_json::from_value(raw)?)
}

fn check_kinds(raw: &Json) -> Result<()> {
    let mut pending = raw.get("root").into_iter().collect::<Vec<_>>();

    while let Some(node) = pending.pop() {
        if let Some(name) = node.get("kind").and_then(Json::as_str) {
            if let Err(err) = name.parse::<ExprKind>() {
                warn!(kind = %name, "Rejecting unsupported filter expression");
                return Err(err.into());
            }
        }

        pending.extend(
            ["left", "right"]
                .into_iter()
                .filter_map(|side| node.get(side)?.get("Expression")),
        );
    }

    Ok(())
}

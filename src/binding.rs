use crate::format;
use serde_json::Value;

/// Resolves a dotted path against the data context. A `[]` suffix on a
/// segment marks "per-row" bindings for table/list callers and is
/// stripped here; iterating the array is the caller's job, not ours.
/// Absence is a normal outcome: any missing or null step returns None.
pub fn resolve<'a>(context: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return None;
    }
    let mut current = context;
    for segment in path.split('.') {
        let segment = segment.strip_suffix("[]").unwrap_or(segment);
        if segment.is_empty() {
            return None;
        }
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => {
                let index: usize = segment.parse().ok()?;
                items.get(index)?
            }
            _ => return None,
        };
        if current.is_null() {
            return None;
        }
    }
    Some(current)
}

/// Replaces every `{{ path }}` token in literal template text with the
/// resolved value's display form. Missing paths substitute as empty;
/// an unterminated token passes through verbatim.
pub fn substitute(text: &str, context: &Value) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            out.push_str(&rest[start..]);
            return out;
        };
        let path = after[..end].trim();
        out.push_str(&display_string(resolve(context, path)));
        rest = &after[end + 2..];
    }
    out.push_str(rest);
    out
}

/// Effective content of a heading/text component: literal text wins and
/// gets placeholder substitution; otherwise the binding's display form.
/// Shared by both backends so their content always agrees.
pub(crate) fn component_text(text: &str, path: &Option<String>, context: &Value) -> String {
    if !text.is_empty() {
        substitute(text, context)
    } else if let Some(path) = path {
        display_string(resolve(context, path))
    } else {
        String::new()
    }
}

/// Effective text of one list item: the binding's value when it
/// resolves non-empty, else the literal label. Structured fields take
/// no placeholder substitution.
pub(crate) fn list_item_text(item: &crate::layout::ListItem, context: &Value) -> String {
    if let Some(path) = &item.binding {
        let resolved = display_string(resolve(context, path));
        if !resolved.is_empty() {
            return resolved;
        }
    }
    item.label.clone()
}

/// Display coercion for substituted values: numbers verbatim, ISO
/// date-time strings shortened to their calendar date, missing → empty.
pub fn display_string(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => {
            format::iso_date_part(text).unwrap_or_else(|| text.clone())
        }
        Some(Value::Number(number)) => number.to_string(),
        Some(Value::Bool(flag)) => flag.to_string(),
        Some(other) => serde_json::to_string(other).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn resolves_nested_paths() {
        let ctx = json!({"order": {"customer": {"name": "Fern & Frond"}}});
        assert_eq!(
            resolve(&ctx, "order.customer.name"),
            Some(&json!("Fern & Frond"))
        );
    }

    #[test]
    fn any_absent_prefix_yields_none() {
        let ctx = json!({"order": {"customer": {"name": "x"}}});
        assert_eq!(resolve(&ctx, "order.shipping.name"), None);
        assert_eq!(resolve(&ctx, "missing"), None);
        assert_eq!(resolve(&ctx, "order.customer.name.deeper"), None);
    }

    #[test]
    fn empty_path_and_null_steps_yield_none() {
        let ctx = json!({"a": null, "b": {"c": 1}});
        assert_eq!(resolve(&ctx, ""), None);
        assert_eq!(resolve(&ctx, "a"), None);
        assert_eq!(resolve(&ctx, "a.x"), None);
        assert_eq!(resolve(&ctx, "b..c"), None);
    }

    #[test]
    fn row_marker_is_stripped_not_iterated() {
        let ctx = json!({"items": [{"sku": "A1"}]});
        // "items[]" resolves the field itself; iteration belongs to the caller.
        assert!(resolve(&ctx, "items[]").unwrap().is_array());
        let row = json!({"sku": "A1", "batch": {"code": "B7"}});
        assert_eq!(resolve(&row, "batch.code"), Some(&json!("B7")));
    }

    #[test]
    fn numeric_segments_index_arrays() {
        let ctx = json!({"items": [{"sku": "A1"}, {"sku": "A2"}]});
        assert_eq!(resolve(&ctx, "items.1.sku"), Some(&json!("A2")));
        assert_eq!(resolve(&ctx, "items.9.sku"), None);
        assert_eq!(resolve(&ctx, "items.sku"), None);
    }

    #[test]
    fn substitution_replaces_tokens_and_blanks_missing_ones() {
        let ctx = json!({"order": {"number": "INV-1", "total": 42.5}});
        assert_eq!(
            substitute("Invoice {{order.number}} / {{ order.total }}", &ctx),
            "Invoice INV-1 / 42.5"
        );
        assert_eq!(substitute("Invoice {{order.number}}", &json!({})), "Invoice ");
    }

    #[test]
    fn unterminated_token_passes_through() {
        let ctx = json!({});
        assert_eq!(substitute("price {{oops", &ctx), "price {{oops");
    }

    #[test]
    fn display_shortens_iso_datetimes() {
        assert_eq!(
            display_string(Some(&json!("2026-03-04T09:30:00Z"))),
            "2026-03-04"
        );
        assert_eq!(display_string(Some(&json!("Lomandra 140mm"))), "Lomandra 140mm");
        assert_eq!(display_string(Some(&json!(7))), "7");
        assert_eq!(display_string(None), "");
    }
}

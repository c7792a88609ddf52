use crate::binding;
use crate::layout::{Component, Condition, Operator};
use serde_json::Value;

/// Whether a component is emitted. Both backends call this and only
/// this; a component hidden in the markup preview must be hidden in the
/// paginated document, which is a correctness invariant of the engine.
pub fn is_visible(component: &Component, context: &Value) -> bool {
    let Some(visible_when) = &component.visible_when else {
        return true;
    };
    visible_when
        .conditions()
        .iter()
        .all(|condition| condition_holds(condition, context))
}

fn condition_holds(condition: &Condition, context: &Value) -> bool {
    let resolved = binding::resolve(context, &condition.field).unwrap_or(&Value::Null);
    match condition.operator {
        Operator::Exists => match resolved {
            Value::Null => false,
            Value::String(text) => !text.is_empty(),
            _ => true,
        },
        // Strict equality on the JSON values, no coercion.
        Operator::Equals => {
            resolved == condition.value.as_ref().unwrap_or(&Value::Null)
        }
        Operator::NotEquals => {
            resolved != condition.value.as_ref().unwrap_or(&Value::Null)
        }
    }
}

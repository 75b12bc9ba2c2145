use serde_json::{json, Value};

/// Renders `{{ input.field }}` placeholders against the node's input signal.
///
/// Paths resolve against `{"input": inputs}`, then against the inputs themselves so
/// that `{{text}}` works as well as `{{input.text}}`. Strings are inserted verbatim,
/// any other value as compact JSON, and unresolved paths as the empty string.
pub fn render(template: &str, inputs: &Value) -> String {
    if !template.contains("{{") {
        return template.to_string();
    }

    let scope = json!({ "input": inputs });
    let mut rendered = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        rendered.push_str(&rest[..start]);
        let after_open = &rest[start + 2..];

        let Some(end) = after_open.find("}}") else {
            rendered.push_str(&rest[start..]);
            return rendered;
        };

        let path = after_open[..end].trim();
        if let Some(value) = lookup(&scope, path).or_else(|| lookup(inputs, path)) {
            match value {
                Value::String(s) => rendered.push_str(s),
                Value::Null => {}
                other => rendered.push_str(&other.to_string()),
            }
        }
        rest = &after_open[end + 2..];
    }

    rendered.push_str(rest);
    rendered
}

fn lookup<'a>(scope: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return None;
    }
    path.split('.').try_fold(scope, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_leave_plain_text_untouched() {
        assert_eq!(render("Summarise this", &json!({})), "Summarise this");
    }

    #[test]
    fn should_substitute_string_fields() {
        let inputs = json!({"question": "What is Bedrock?", "user": {"name": "Ada"}});
        assert_eq!(
            render("{{input.user.name}} asks: {{ input.question }}", &inputs),
            "Ada asks: What is Bedrock?"
        );
    }

    #[test]
    fn should_serialize_non_string_values_as_json() {
        let inputs = json!({"count": 3, "tags": ["a", "b"], "items": [{"id": 7}]});
        assert_eq!(
            render("{{input.count}} {{input.tags}} {{input.items.0.id}}", &inputs),
            r#"3 ["a","b"] 7"#
        );
    }

    #[test]
    fn should_render_missing_paths_as_empty() {
        assert_eq!(render("[{{input.nope}}]", &json!({})), "[]");
        assert_eq!(render("[{{}}]", &json!({})), "[]");
    }

    #[test]
    fn should_resolve_bare_paths_against_inputs() {
        let inputs = json!({"text": "hello", "input": {"text": "scoped"}});
        assert_eq!(render("{{text}}", &inputs), "hello");
        assert_eq!(render("{{input.text}}", &inputs), "hello");
    }

    #[test]
    fn should_keep_unterminated_placeholder_literal() {
        assert_eq!(
            render("Hello {{input.name", &json!({"name": "Ada"})),
            "Hello {{input.name"
        );
    }
}

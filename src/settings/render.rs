use serde_json::Value;

use crate::config::ConfigMap;

/// Turn an attribute name into a display label: `firstName` and
/// `first_name` both become `First Name`.
pub(crate) fn humanize(attribute: &str) -> String {
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();
    for c in attribute.chars() {
        if c == '_' || c == '-' || c == ' ' {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
        } else if c.is_uppercase() && !current.is_empty() {
            words.push(std::mem::take(&mut current));
            current.push(c);
        } else {
            current.push(c);
        }
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
        .iter()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// One `Label = value` line per filter attribute.
pub(crate) fn render_filter(data: &ConfigMap) -> String {
    data.iter()
        .map(|(attribute, value)| format!("{} = {}", humanize(attribute), value_text(value)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// One `Label <direction>` line per sort attribute. A `desc`-like direction
/// value reads as descending; anything else as ascending.
pub(crate) fn render_sort(data: &ConfigMap) -> String {
    data.iter()
        .map(|(attribute, value)| {
            let descending = matches!(
                value,
                Value::String(direction) if direction.eq_ignore_ascii_case("desc")
                    || direction.eq_ignore_ascii_case("descending")
            );
            let direction = if descending { "descending" } else { "ascending" };
            format!("{} {}", humanize(attribute), direction)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

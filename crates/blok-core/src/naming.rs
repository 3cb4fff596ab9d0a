//! Identifier conversions shared by the generator and the pipeline.

/// Convert `snake_case` (or space/dash separated words) to `PascalCase`.
pub fn pascal_case(s: &str) -> String {
    s.split(['_', ' ', '-'])
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                None => String::new(),
                Some(first) => first.to_uppercase().chain(chars).collect(),
            }
        })
        .collect()
}

/// Convert `snake_case` to `camelCase`.
pub fn camel_case(s: &str) -> String {
    let pascal = pascal_case(s);
    let mut chars = pascal.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_lowercase().chain(chars).collect(),
    }
}

/// Convert `snake_case` to `SCREAMING_SNAKE_CASE`.
pub fn screaming_snake_case(s: &str) -> String {
    s.to_uppercase()
}

/// Human label for a field or enum value: `due_date` → `Due Date`.
pub fn label(s: &str) -> String {
    s.split(['_', ' ', '-'])
        .filter(|word| !word.is_empty())
        .map(|word| pascal_case(word))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Simple singularization (converts plural to singular).
///
/// Only the last `_` separated word is singularized, so `order_items`
/// becomes `order_item`.
pub fn singularize(s: &str) -> String {
    match s.rsplit_once('_') {
        Some((head, last)) => format!("{}_{}", head, singularize_word(last)),
        None => singularize_word(s),
    }
}

fn singularize_word(s: &str) -> String {
    let irregulars = [
        ("people", "person"),
        ("children", "child"),
        ("men", "man"),
        ("women", "woman"),
        ("mice", "mouse"),
        ("geese", "goose"),
        ("teeth", "tooth"),
        ("feet", "foot"),
    ];

    for (plural, singular) in irregulars {
        if s == plural {
            return singular.to_string();
        }
    }

    // categories -> category
    if s.ends_with("ies") && s.len() > 3 {
        return format!("{}y", &s[..s.len() - 3]);
    }

    // boxes -> box, but leave "status" alone
    if s.ends_with("xes") || s.ends_with("ches") || s.ends_with("shes") || s.ends_with("sses") {
        return s[..s.len() - 2].to_string();
    }

    // leaves -> leaf
    if s.ends_with("ves") && s.len() > 3 {
        return format!("{}f", &s[..s.len() - 3]);
    }

    if s.ends_with('s') && !s.ends_with("ss") && !s.ends_with("us") && !s.ends_with("is") {
        return s[..s.len() - 1].to_string();
    }

    s.to_string()
}

/// Entity type name for a table: `order_items` → `OrderItem`.
pub fn entity_name(table: &str) -> String {
    pascal_case(&singularize(table))
}

/// URL-safe project slug: lowercase, spaces become `-`, anything outside
/// `[a-z0-9-]` is dropped.
pub fn slugify(name: &str) -> String {
    name.to_lowercase()
        .replace(' ', "-")
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-')
        .collect()
}

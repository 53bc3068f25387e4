// Name helpers shared by the parser and the executor.

/// Trim, collapse whitespace runs, uppercase the first character if it is a
/// word character. The rest of the casing is left alone.
pub fn fix_name(input: &str) -> String {
    let collapsed = input.split_whitespace().collect::<Vec<_>>().join(" ");

    let mut chars = collapsed.chars();
    match chars.next() {
        Some(first) if first.is_alphanumeric() || first == '_' => {
            first.to_uppercase().chain(chars).collect()
        }
        _ => collapsed,
    }
}

/// Lowercase, whitespace runs become a single `-`.
pub fn slugify(input: &str) -> String {
    input.trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

pub fn extension_of(name: &str) -> String {
    match name.rsplit_once('.') {
        Some((_, ext)) => ext.to_lowercase(),
        None => String::new(),
    }
}

//! Inline `style` attribute declaration helpers.
//!
//! Declarations are edited in place so unrelated properties an icon already
//! carries survive a recolor or restroke.

/// Returns the value of `property` in an inline style declaration list.
///
/// Property names compare case-insensitively. The value is trimmed.
pub fn style_property<'a>(style: &'a str, property: &str) -> Option<&'a str> {
    style
        .split(';')
        .filter_map(|declaration| declaration.split_once(':'))
        .find(|(key, _)| key.trim().eq_ignore_ascii_case(property))
        .map(|(_, value)| value.trim())
}

/// Sets `property` to `value`, replacing an existing declaration or
/// appending a new one. Declarations are re-joined with `"; "`.
pub fn set_style_property(style: &str, property: &str, value: &str) -> String {
    let mut replaced = false;
    let mut declarations: Vec<String> = declarations(style)
        .map(|declaration| {
            if declaration_key(declaration).eq_ignore_ascii_case(property) {
                replaced = true;
                format!("{property}:{value}")
            } else {
                declaration.to_string()
            }
        })
        .collect();

    if !replaced {
        declarations.push(format!("{property}:{value}"));
    }

    declarations.join("; ")
}

/// Removes every declaration of `property`.
pub fn remove_style_property(style: &str, property: &str) -> String {
    declarations(style)
        .filter(|declaration| {
            let key = declaration_key(declaration);
            !key.is_empty() && !key.eq_ignore_ascii_case(property)
        })
        .collect::<Vec<_>>()
        .join("; ")
}

fn declarations(style: &str) -> impl Iterator<Item = &str> {
    style
        .split(';')
        .map(str::trim)
        .filter(|declaration| !declaration.is_empty())
}

fn declaration_key(declaration: &str) -> &str {
    declaration
        .split_once(':')
        .map_or(declaration, |(key, _)| key)
        .trim()
}

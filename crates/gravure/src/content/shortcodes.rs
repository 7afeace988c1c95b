use rustc_hash::FxHashMap;
use std::str::FromStr;

pub type ComponentFn = Box<dyn Fn(&ComponentArgs) -> String + Send + Sync>;

/// Components available to MDX documents, keyed by tag name.
///
/// A component is invoked as `{{ name key=value }}`, or with a body as
/// `{{ name }}...{{ /name }}`. The body, already expanded, is passed to the
/// component under the `body` argument.
#[derive(Default)]
pub struct ComponentRegistry(FxHashMap<String, ComponentFn>);

impl ComponentRegistry {
    pub fn new() -> Self {
        Self(FxHashMap::default())
    }

    pub fn register<F>(&mut self, name: &str, func: F)
    where
        F: Fn(&ComponentArgs) -> String + Send + Sync + 'static,
    {
        self.0.insert(name.to_string(), Box::new(func));
    }

    pub(crate) fn get(&self, name: &str) -> Option<&ComponentFn> {
        self.0.get(name)
    }
}

// Valid names match ^[A-Za-z_][0-9A-Za-z_]+$
fn is_valid_component_name(name: &str) -> bool {
    if name.len() < 2 {
        return false;
    }

    let mut chars = name.chars();
    let first = chars.next().unwrap();
    if !first.is_ascii_alphabetic() && first != '_' {
        return false;
    }

    chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
}

/// Expands every component invocation in `content`. Text between
/// invocations passes through untouched, and `\{{` escapes one.
pub fn expand_components(
    content: &str,
    components: &ComponentRegistry,
) -> Result<String, String> {
    let mut output = String::new();
    let mut rest = content;

    while let Some(start) = rest.find("{{") {
        if start > 0 && rest[..start].ends_with('\\') {
            // Escaped, keep the `{{` literal and move on.
            output.push_str(&rest[..start + 2]);
            rest = &rest[start + 2..];
            continue;
        }

        output.push_str(&rest[..start]);

        let remaining = &rest[start + 2..];
        let tag_end = remaining
            .find("}}")
            .ok_or("Unclosed component tag: missing '}}'")?;

        let tag_content = remaining[..tag_end].trim();

        let mut parts = tag_content.split_whitespace();
        let name = parts.next().ok_or("Empty component tag")?;

        if name.starts_with('/') {
            return Err(format!("Unexpected closing tag: {}", name));
        }

        if !is_valid_component_name(name) {
            // Not a component invocation, keep the braces as literal text.
            output.push_str("{{");
            rest = remaining;
            continue;
        }

        let mut args = FxHashMap::default();
        for part in parts {
            let Some(eq_pos) = part.find('=') else {
                return Err(format!(
                    "Invalid argument format: '{}'. Expected 'key=value'",
                    part
                ));
            };
            args.insert(
                part[..eq_pos].trim().to_string(),
                part[eq_pos + 1..].trim().to_string(),
            );
        }

        let func = components
            .get(name)
            .ok_or_else(|| format!("Unknown component: '{}'", name))?;

        let after_opening_tag = &remaining[tag_end + 2..];

        // Both `{{/name}}` and `{{ /name }}` close a block.
        let closing_tag_compact = format!("{{{{/{}}}}}", name);
        let closing_tag_spaced = format!("{{{{ /{} }}}}", name);

        let close_pos = after_opening_tag
            .find(&closing_tag_compact)
            .or_else(|| after_opening_tag.find(&closing_tag_spaced));

        if let Some(close_pos) = close_pos {
            let closing_tag_len =
                if after_opening_tag[close_pos..].starts_with(&closing_tag_compact) {
                    closing_tag_compact.len()
                } else {
                    closing_tag_spaced.len()
                };

            // Block form: the body is expanded before the component sees it.
            let body = expand_components(&after_opening_tag[..close_pos], components)?;

            let mut component_args = ComponentArgs::new(args);
            component_args.0.insert("body".to_string(), body);
            output.push_str(&func(&component_args));

            rest = &after_opening_tag[close_pos + closing_tag_len..];
        } else {
            output.push_str(&func(&ComponentArgs::new(args)));
            rest = after_opening_tag;
        }
    }

    output.push_str(rest);
    Ok(output)
}

pub struct ComponentArgs(FxHashMap<String, String>);

impl ComponentArgs {
    pub fn new(args: FxHashMap<String, String>) -> Self {
        Self(args)
    }

    /// Get argument with automatic type conversion
    pub fn get<T>(&self, key: &str) -> Option<T>
    where
        T: FromStr,
        T::Err: std::fmt::Debug,
    {
        self.0.get(key)?.parse().ok()
    }

    /// Get argument with default value and type conversion
    pub fn get_or<T>(&self, key: &str, default: T) -> T
    where
        T: FromStr,
        T::Err: std::fmt::Debug,
    {
        self.0
            .get(key)
            .and_then(|s| s.parse().ok())
            .unwrap_or(default)
    }

    /// Get raw string (no conversion)
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(|s| s.as_str())
    }

    pub fn get_str_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.0.get(key).map(|s| s.as_str()).unwrap_or(default)
    }
}

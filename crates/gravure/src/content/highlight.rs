use std::sync::OnceLock;
use syntect::{
    Error,
    easy::HighlightLines,
    highlighting::ThemeSet,
    html::{IncludeBackground, styled_line_to_highlighted_html},
    parsing::SyntaxSet,
    util::LinesWithEndings,
};

const DEFAULT_THEME: &str = "base16-ocean.dark";

static SYNTAX_SET: OnceLock<SyntaxSet> = OnceLock::new();
static THEME_SET: OnceLock<ThemeSet> = OnceLock::new();

fn get_syntax_set() -> &'static SyntaxSet {
    SYNTAX_SET.get_or_init(SyntaxSet::load_defaults_newlines)
}

fn get_theme_set() -> &'static ThemeSet {
    THEME_SET.get_or_init(ThemeSet::load_defaults)
}

fn opening_html(language: Option<&str>) -> String {
    // The attribute lands on both tags, CSS tends to target one or the other.
    let attr = language
        .map(|lang| format!(" data-language=\"{lang}\""))
        .unwrap_or_default();

    format!("<pre{attr}><code{attr}>")
}

pub struct CodeBlock {
    language: Option<String>,
}

impl CodeBlock {
    /// Parses the info string of a fenced code block and returns the block
    /// along with the opening HTML for it.
    pub fn new(fence: &str) -> (Self, String) {
        let language = fence.split_whitespace().next().map(str::to_string);
        let opening_html = opening_html(language.as_deref());

        (Self { language }, opening_html)
    }

    pub fn highlight(&self, content: &str) -> Result<String, Error> {
        let ss = get_syntax_set();
        let theme = &get_theme_set().themes[DEFAULT_THEME];

        let syntax = self
            .language
            .as_deref()
            .and_then(|language| {
                ss.find_syntax_by_token(language)
                    .or_else(|| ss.find_syntax_by_name(language))
                    .or_else(|| ss.find_syntax_by_extension(language))
            })
            .or_else(|| ss.find_syntax_by_first_line(content))
            .unwrap_or_else(|| ss.find_syntax_plain_text());

        let mut h = HighlightLines::new(syntax, theme);

        let mut highlighted = String::new();
        for line in LinesWithEndings::from(content) {
            let regions = h.highlight_line(line, ss)?;
            let html = styled_line_to_highlighted_html(&regions, IncludeBackground::No)?;
            highlighted.push_str(&html);
        }

        Ok(highlighted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opening_html_with_language() {
        let (_, opening) = CodeBlock::new("rust");
        assert_eq!(
            opening,
            "<pre data-language=\"rust\"><code data-language=\"rust\">"
        );
    }

    #[test]
    fn test_opening_html_without_language() {
        let (_, opening) = CodeBlock::new("");
        assert_eq!(opening, "<pre><code>");
    }

    #[test]
    fn test_fence_keeps_only_the_first_token() {
        let (_, opening) = CodeBlock::new("rust ins=0");
        assert!(opening.contains("data-language=\"rust\""));
        assert!(!opening.contains("ins"));
    }

    #[test]
    fn test_highlight_known_language() {
        let (block, _) = CodeBlock::new("rust");
        let html = block.highlight("let x = 1;\n").unwrap();
        assert!(html.contains("<span"));
        assert!(html.contains("let"));
    }

    #[test]
    fn test_highlight_unknown_language_escapes_content() {
        let (block, _) = CodeBlock::new("nosuchlang");
        let html = block.highlight("a < b\n").unwrap();
        assert!(html.contains("&lt;"));
    }
}

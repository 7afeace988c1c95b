use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};

use super::highlight::CodeBlock;

/// Render a Markdown body to HTML.
///
/// Fenced code blocks are syntax highlighted; everything else goes through
/// pulldown-cmark untouched. Front matter is expected to have been split off
/// already.
pub fn render_markdown(content: &str) -> Result<String, syntect::Error> {
    let mut html_output = String::new();
    let options = Options::empty();

    let mut code_block = None;
    let mut code_block_content = String::new();
    let mut events = Vec::new();

    for event in Parser::new_ext(content, options) {
        match event {
            Event::Text(ref text) => {
                if code_block.is_some() {
                    code_block_content.push_str(text);
                } else {
                    events.push(event);
                }
            }
            Event::Start(Tag::CodeBlock(ref kind)) => {
                if let CodeBlockKind::Fenced(fence) = kind {
                    let (block, begin) = CodeBlock::new(fence);
                    code_block = Some(block);
                    events.push(Event::Html(begin.into()));
                } else {
                    // Indented code blocks pass through unhighlighted.
                    events.push(event);
                }
            }
            Event::End(TagEnd::CodeBlock) => {
                if let Some(block) = code_block.take() {
                    let html = block.highlight(&code_block_content)?;
                    code_block_content.clear();
                    events.push(Event::Html(html.into()));
                    events.push(Event::Html("</code></pre>\n".into()));
                } else {
                    events.push(event);
                }
            }
            _ => {
                events.push(event);
            }
        }
    }

    pulldown_cmark::html::push_html(&mut html_output, events.into_iter());
    Ok(html_output)
}

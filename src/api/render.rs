//! Markdown rendering for chat turns

use pulldown_cmark::{html, Event, Options, Parser};

/// Render turn text as HTML. Raw HTML in the source is escaped rather than
/// passed through, since both user and assistant text end up in the page.
pub fn markdown_to_html(text: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);

    let parser = Parser::new_ext(text, options).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        other => other,
    });

    let mut out = String::with_capacity(text.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

use scraper::{Html, Node};

/// Text that belongs to an element itself, ignoring nested elements.
///
/// `inner_html` is the element's content. Only its top-level text nodes are
/// kept, so a translation shown in a nested span is not read out along with
/// the word it annotates. Runs of whitespace collapse to a single space.
pub fn direct_text(inner_html: &str) -> String {
    let fragment = Html::parse_fragment(inner_html);

    let mut text = String::new();
    for child in fragment.root_element().children() {
        if let Node::Text(t) = child.value() {
            text.push_str(t);
        }
    }

    collapse_whitespace(&text)
}

/// Collapse runs of whitespace to single spaces and trim the ends.
pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

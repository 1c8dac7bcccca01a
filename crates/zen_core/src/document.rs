//! The editable document: a markup string plus a bounded undo history.

use std::collections::VecDeque;
use std::ops::Range;

use scraper::Html;

const MAX_UNDO_DEPTH: usize = 100;

/// The rich-text content being edited.
///
/// Content is stored as markup. Every mutation records the previous markup so
/// that toolbar undo/redo work without a native editing surface.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditorDocument {
    markup: String,
    undo_stack: VecDeque<String>,
    redo_stack: Vec<String>,
}

impl EditorDocument {
    pub fn new(markup: impl Into<String>) -> Self {
        Self {
            markup: markup.into(),
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
        }
    }

    pub fn markup(&self) -> &str {
        &self.markup
    }

    /// Plain-text content with all markup removed.
    pub fn plain_text(&self) -> String {
        strip_markup(&self.markup)
    }

    /// Replace the whole document. Returns false if nothing changed.
    pub fn set_markup(&mut self, markup: impl Into<String>) -> bool {
        let markup = markup.into();
        if markup == self.markup {
            return false;
        }
        let previous = std::mem::replace(&mut self.markup, markup);
        self.undo_stack.push_back(previous);
        if self.undo_stack.len() > MAX_UNDO_DEPTH {
            self.undo_stack.pop_front();
        }
        self.redo_stack.clear();
        true
    }

    /// Replace the whole document with plain text, one paragraph with line breaks.
    pub fn set_plain_text(&mut self, text: &str) -> bool {
        self.set_markup(text_to_paragraph(text))
    }

    /// Replace the first occurrence of `needle` with `replacement`.
    ///
    /// Returns false, leaving the document untouched, when `needle` is empty or absent.
    pub fn replace_first(&mut self, needle: &str, replacement: &str) -> bool {
        if needle.is_empty() || !self.markup.contains(needle) {
            return false;
        }
        let markup = self.markup.replacen(needle, replacement, 1);
        self.set_markup(markup)
    }

    /// The markup covered by `range`, if it is a valid range of this document.
    pub fn markup_in_range(&self, range: Range<usize>) -> Option<&str> {
        self.markup.get(range)
    }

    /// Replace the markup covered by `range` with literal text.
    ///
    /// Returns the range the inserted (escaped) text now occupies, or `None` if
    /// `range` does not fall on character boundaries of this document.
    pub fn replace_range(&mut self, range: Range<usize>, text: &str) -> Option<Range<usize>> {
        self.markup.get(range.clone())?;
        let escaped = escape_text(text);
        let mut markup = String::with_capacity(self.markup.len() + escaped.len());
        markup.push_str(&self.markup[..range.start]);
        markup.push_str(&escaped);
        markup.push_str(&self.markup[range.end..]);
        self.set_markup(markup);
        Some(range.start..range.start + escaped.len())
    }

    /// Wrap `range` in an inline element, e.g. `b` or `i`.
    pub fn wrap_range(&mut self, range: Range<usize>, open: &str, close: &str) -> bool {
        let Some(inner) = self.markup.get(range.clone()) else {
            return false;
        };
        let markup = format!(
            "{}{open}{inner}{close}{}",
            &self.markup[..range.start],
            &self.markup[range.end..]
        );
        self.set_markup(markup)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo(&mut self) -> bool {
        let Some(previous) = self.undo_stack.pop_back() else {
            return false;
        };
        let current = std::mem::replace(&mut self.markup, previous);
        self.redo_stack.push(current);
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(next) = self.redo_stack.pop() else {
            return false;
        };
        let current = std::mem::replace(&mut self.markup, next);
        self.undo_stack.push_back(current);
        true
    }
}

/// Plain text of a markup fragment, with entities decoded.
pub fn strip_markup(markup: &str) -> String {
    if !markup.contains(['<', '&']) {
        return markup.to_string();
    }
    Html::parse_fragment(markup)
        .root_element()
        .text()
        .collect()
}

/// Escape text so it can be inserted into markup literally.
pub fn escape_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// A single paragraph holding `text`, with newlines turned into line breaks.
pub fn text_to_paragraph(text: &str) -> String {
    let body = escape_text(&text.replace("\r\n", "\n")).replace('\n', "<br>");
    format!("<p>{body}</p>")
}

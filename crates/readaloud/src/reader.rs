use crate::{Line, Page, layout_lines};

/// Pages of an extracted document, with one of them on display.
///
/// An empty reader is the "no content" state: extraction failed or the document had no pages.
#[derive(Clone, Debug, Default)]
pub struct Reader {
    pages: Vec<Page>,
    current: usize,
}

impl Reader {
    pub fn new(pages: Vec<Page>) -> Self {
        Self { pages, current: 0 }
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Zero-based index of the page on display.
    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_page(&self) -> Option<&Page> {
        self.pages.get(self.current)
    }

    /// The page on display, laid out into lines.
    pub fn current_lines(&self) -> Vec<Line> {
        self.current_page()
            .map(|page| layout_lines(&page.items))
            .unwrap_or_default()
    }

    pub fn has_next(&self) -> bool {
        self.current + 1 < self.pages.len()
    }

    pub fn has_prev(&self) -> bool {
        self.current > 0
    }

    /// Returns `true` if the page changed.
    pub fn next_page(&mut self) -> bool {
        if self.has_next() {
            self.current += 1;
            true
        } else {
            false
        }
    }

    /// Returns `true` if the page changed.
    pub fn prev_page(&mut self) -> bool {
        if self.has_prev() {
            self.current -= 1;
            true
        } else {
            false
        }
    }

    /// E.g. `"Page 2 of 10"`.
    pub fn page_label(&self) -> String {
        if self.is_empty() {
            "No pages".to_owned()
        } else {
            format!("Page {} of {}", self.current + 1, self.pages.len())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LineKind, TextItem};

    fn page(text: &str) -> Page {
        Page {
            items: vec![TextItem {
                text: text.to_owned(),
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[test]
    fn navigation_is_clamped() {
        let mut reader = Reader::new(vec![page("one"), page("two")]);
        assert_eq!(reader.page_label(), "Page 1 of 2");
        assert!(!reader.prev_page());
        assert!(reader.next_page());
        assert_eq!(reader.page_label(), "Page 2 of 2");
        assert!(!reader.next_page());
        assert_eq!(reader.current_index(), 1);
        assert_eq!(reader.current_lines()[0].text, "two");
        assert_eq!(reader.current_lines()[0].kind, LineKind::Title);
    }

    #[test]
    fn empty_reader_has_no_content() {
        let mut reader = Reader::default();
        assert!(reader.is_empty());
        assert!(reader.current_lines().is_empty());
        assert!(!reader.next_page());
        assert!(!reader.prev_page());
        assert_eq!(reader.page_label(), "No pages");
    }
}

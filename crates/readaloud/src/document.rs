//! Extracted document text, and how it is laid out into lines.

/// Vertical movement (in PDF units) that starts a new line.
const NEW_LINE_THRESHOLD: f32 = 5.0;

/// Lines set in a font bigger than this are headers.
const HEADER_FONT_SIZE: f32 = 14.0;

/// One run of text as reported by the extraction library.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct TextItem {
    pub text: String,

    /// PDF text matrix `[a, b, c, d, e, f]`; `f` is the baseline's vertical position.
    pub transform: [f32; 6],

    pub font_name: String,
    pub font_size: f32,
}

impl TextItem {
    /// Vertical position of the baseline.
    #[inline]
    pub fn y(&self) -> f32 {
        self.transform[5]
    }

    /// Glyph height implied by the text matrix.
    pub fn font_size_from_transform(transform: &[f32; 6]) -> f32 {
        transform[2].hypot(transform[3])
    }
}

/// Page-level style hints.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct PageStyle {
    pub font_size: f32,
    pub font_family: String,
}

impl Default for PageStyle {
    fn default() -> Self {
        Self {
            font_size: 16.0,
            font_family: "serif".to_owned(),
        }
    }
}

impl PageStyle {
    /// Base style for a page of the given height.
    pub fn for_page_height(height: f32) -> Self {
        Self {
            font_size: height / 50.0,
            ..Default::default()
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Page {
    pub items: Vec<TextItem>,
    pub style: PageStyle,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineKind {
    Title,
    Header,
    Body,
}

impl LineKind {
    /// CSS class used by the reader view.
    pub fn css_class(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Header => "header",
            Self::Body => "body",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Line {
    pub text: String,
    pub kind: LineKind,
}

/// Group text items into lines and classify them.
///
/// The first line of the page is its title. Later lines are headers if they
/// are set large, are all capitals, end with a colon, or start with a section
/// number such as `IV.` or `3.`.
pub fn layout_lines(items: &[TextItem]) -> Vec<Line> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_font_size: f32 = 0.0;
    let mut last_y = items.first().map_or(0.0, TextItem::y);

    let flush = |text: &mut String, font_size: f32, lines: &mut Vec<Line>| {
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            let kind = if lines.is_empty() {
                LineKind::Title
            } else if is_header(trimmed, font_size) {
                LineKind::Header
            } else {
                LineKind::Body
            };
            lines.push(Line {
                text: trimmed.to_owned(),
                kind,
            });
        }
        text.clear();
    };

    for item in items {
        if (item.y() - last_y).abs() > NEW_LINE_THRESHOLD {
            flush(&mut current, current_font_size, &mut lines);
            current_font_size = 0.0;
        }
        current.push_str(&item.text);
        current_font_size = current_font_size.max(item.font_size);
        last_y = item.y();
    }
    flush(&mut current, current_font_size, &mut lines);

    lines
}

fn is_header(line: &str, font_size: f32) -> bool {
    font_size > HEADER_FONT_SIZE
        || is_shouting(line)
        || line.ends_with(':')
        || starts_with_section_marker(line, |c| matches!(c, 'I' | 'V' | 'X'))
        || starts_with_section_marker(line, |c| c.is_ascii_digit())
}

/// All letters are capitals, and there is at least one.
fn is_shouting(line: &str) -> bool {
    line.chars().any(char::is_alphabetic) && line.to_uppercase() == line
}

/// `line` starts with one or more `marker` characters followed by a `.`.
fn starts_with_section_marker(line: &str, marker: impl Fn(char) -> bool) -> bool {
    let rest = line.trim_start_matches(|c: char| marker(c));
    rest.len() < line.len() && rest.starts_with('.')
}

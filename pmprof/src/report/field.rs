//! Fixed-width field layout.

/// Field justification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Justify {
    /// Pad on the right, truncate from the end.
    Left,
    /// Pad on the left, truncate from the beginning.
    Right,
}

/// Width of the blank gap between most columns.
pub const GAP_WIDTH: usize = 2;

/// Fit `value` into exactly `width` characters.
///
/// An empty value renders as nothing at all, not as `width` spaces. Widths
/// are counted in characters.
pub fn build_field(width: usize, justify: Justify, value: &str) -> String {
    let len = value.chars().count();
    if len == 0 {
        return String::new();
    }
    if len == width {
        return value.to_string();
    }

    match justify {
        Justify::Left if len > width => value.chars().take(width).collect(),
        Justify::Left => format!("{}{}", value, " ".repeat(width - len)),
        Justify::Right if len > width => value.chars().skip(len - width).collect(),
        Justify::Right => format!("{}{}", " ".repeat(width - len), value),
    }
}

/// Column width: the longest name or `minimum`, whichever is larger.
pub fn column_width<'a>(names: impl IntoIterator<Item = &'a str>, minimum: usize) -> usize {
    names
        .into_iter()
        .map(|name| name.chars().count())
        .max()
        .unwrap_or(0)
        .max(minimum)
}

/// Accumulates one report's text field by field.
#[derive(Debug, Default)]
pub struct TextTable {
    out: String,
}

impl TextTable {
    /// Start an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a left-justified field.
    pub fn left(&mut self, width: usize, value: &str) -> &mut Self {
        self.out.push_str(&build_field(width, Justify::Left, value));
        self
    }

    /// Append a right-justified field.
    pub fn right(&mut self, width: usize, value: &str) -> &mut Self {
        self.out.push_str(&build_field(width, Justify::Right, value));
        self
    }

    /// Append the inter-column gap.
    pub fn gap(&mut self) -> &mut Self {
        self.left(GAP_WIDTH, " ")
    }

    /// Append a blank field of `width` spaces.
    pub fn blank(&mut self, width: usize) -> &mut Self {
        self.left(width, " ")
    }

    /// Append a line break.
    pub fn newline(&mut self) -> &mut Self {
        self.out.push('\n');
        self
    }

    /// The accumulated text.
    pub fn finish(self) -> String {
        self.out
    }
}

//! Text metrics used by the layout engine.

use unicode_width::UnicodeWidthStr;

/// Text measuring capability supplied by the host.
pub trait Measure {
    /// Width in pixels of `text` on one line.
    fn text_width(&self, text: &str) -> i32;

    /// Height in pixels of `text` word-wrapped to `width`.
    fn wrapped_height(&self, text: &str, width: i32) -> i32;
}

/// Fixed-pitch metrics: every terminal column is `char_width` pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonospaceMeasure {
    pub char_width: i32,
    pub line_height: i32,
}

impl MonospaceMeasure {
    pub const fn new(char_width: i32, line_height: i32) -> Self {
        Self {
            char_width,
            line_height,
        }
    }

    /// Lines needed to show `text` within `columns` terminal columns.
    fn line_count(text: &str, columns: usize) -> usize {
        let mut lines = 0;
        for paragraph in text.split('\n') {
            lines += 1;
            let mut used = 0usize;
            for word in paragraph.split_whitespace() {
                let w = word.width();
                let needed = if used == 0 { w } else { used + 1 + w };
                if needed <= columns {
                    used = needed;
                    continue;
                }
                if used > 0 {
                    lines += 1;
                }
                // Words longer than a line are broken hard.
                let extra = w.saturating_sub(1) / columns;
                lines += extra;
                used = w - extra * columns;
            }
        }
        lines
    }
}

impl Default for MonospaceMeasure {
    fn default() -> Self {
        Self::new(7, 14)
    }
}

impl Measure for MonospaceMeasure {
    fn text_width(&self, text: &str) -> i32 {
        text.width() as i32 * self.char_width
    }

    fn wrapped_height(&self, text: &str, width: i32) -> i32 {
        if width <= 0 || text.is_empty() {
            return 0;
        }
        let columns = (width / self.char_width.max(1)).max(1) as usize;
        Self::line_count(text, columns) as i32 * self.line_height
    }
}

#[cfg(test)]
mod tests {
    use super::{Measure, MonospaceMeasure};

    #[test]
    fn width_counts_display_columns() {
        let m = MonospaceMeasure::new(10, 20);
        assert_eq!(m.text_width("abc"), 30);
        assert_eq!(m.text_width("日本"), 40);
        assert_eq!(m.text_width(""), 0);
    }

    #[test]
    fn wrapping_breaks_on_words() {
        let m = MonospaceMeasure::new(10, 20);
        // 10 columns: "value must" / "be set"
        assert_eq!(m.wrapped_height("value must be set", 100), 40);
        assert_eq!(m.wrapped_height("short", 100), 20);
        assert_eq!(m.wrapped_height("a\nb", 100), 40);
    }

    #[test]
    fn long_words_are_broken_hard() {
        let m = MonospaceMeasure::new(10, 20);
        assert_eq!(m.wrapped_height("abcdefghijklmnopqrstuvwxy", 100), 60);
    }

    #[test]
    fn zero_width_has_zero_height() {
        let m = MonospaceMeasure::default();
        assert_eq!(m.wrapped_height("anything", 0), 0);
    }
}

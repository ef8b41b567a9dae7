//! Label control codes.
//!
//! A field label may start with single-character codes that tune how its row
//! is laid out and edited. They are parsed once when the label changes and
//! kept on the row as [`LabelFlags`]; the remaining text is the display label.

use crate::statics;
use std::borrow::Cow;

/// Per-row configuration decoded from the leading control codes of a label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LabelFlags {
    /// `^`: folded into the parent's row strip.
    pub inlined: bool,
    /// `^^`: folded into the parent's strip before the parent's own label.
    pub inlined_before: bool,
    /// `+`: expanded when the row is first created.
    pub expand_by_default: bool,
    /// `-`: children are never shown.
    pub hide_children: bool,
    /// `!`: value cannot be edited.
    pub read_only: bool,
    /// `<`: the value widget takes the place of the label.
    pub full_row: bool,
    /// `|`: checkbox children are packed into columns.
    pub pack_checkboxes: bool,
    /// `~`: the row is not shown at all.
    pub hidden: bool,
}

impl LabelFlags {
    /// Split `raw` into its flags and display text.
    pub fn parse(raw: &str) -> (LabelFlags, &str) {
        let mut flags = LabelFlags::default();
        let mut rest = raw;
        while let Some(ch) = rest.chars().next() {
            match ch {
                statics::CODE_INLINE => {
                    if flags.inlined {
                        flags.inlined_before = true;
                    }
                    flags.inlined = true;
                }
                statics::CODE_EXPAND => flags.expand_by_default = true,
                statics::CODE_HIDE_CHILDREN => flags.hide_children = true,
                statics::CODE_READ_ONLY => flags.read_only = true,
                statics::CODE_FULL_ROW => flags.full_row = true,
                statics::CODE_PACK => flags.pack_checkboxes = true,
                statics::CODE_HIDDEN => flags.hidden = true,
                statics::CODE_LITERAL => return (flags, &rest[ch.len_utf8()..]),
                _ => break,
            }
            rest = &rest[ch.len_utf8()..];
        }
        (flags, rest)
    }
}

const fn is_code(ch: char) -> bool {
    matches!(
        ch,
        statics::CODE_INLINE
            | statics::CODE_EXPAND
            | statics::CODE_HIDE_CHILDREN
            | statics::CODE_READ_ONLY
            | statics::CODE_FULL_ROW
            | statics::CODE_PACK
            | statics::CODE_HIDDEN
            | statics::CODE_LITERAL
    )
}

/// Raw label that displays `text` as is, with no control codes.
pub fn literal_label(text: &str) -> Cow<'_, str> {
    match text.chars().next() {
        Some(ch) if is_code(ch) => Cow::Owned(format!("{}{text}", statics::CODE_LITERAL)),
        _ => Cow::Borrowed(text),
    }
}

#[cfg(test)]
mod tests {
    use super::{LabelFlags, literal_label};

    #[test]
    fn plain_label_has_no_flags() {
        let (flags, text) = LabelFlags::parse("Speed");
        assert_eq!(flags, LabelFlags::default());
        assert_eq!(text, "Speed");
    }

    #[test]
    fn codes_are_only_read_from_the_front() {
        let (flags, text) = LabelFlags::parse("!+Max ^speed");
        assert!(flags.read_only);
        assert!(flags.expand_by_default);
        assert!(!flags.inlined);
        assert_eq!(text, "Max ^speed");
    }

    #[test]
    fn double_caret_means_inline_before() {
        let (flags, text) = LabelFlags::parse("^^x");
        assert!(flags.inlined && flags.inlined_before);
        assert_eq!(text, "x");

        let (flags, _) = LabelFlags::parse("^x");
        assert!(flags.inlined && !flags.inlined_before);
    }

    #[test]
    fn code_only_label_has_empty_text() {
        let (flags, text) = LabelFlags::parse("^|~");
        assert!(flags.inlined && flags.pack_checkboxes && flags.hidden);
        assert_eq!(text, "");
    }

    #[test]
    fn literal_marker_ends_the_codes() {
        let (flags, text) = LabelFlags::parse("!\\^x");
        assert!(flags.read_only && !flags.inlined);
        assert_eq!(text, "^x");
    }

    #[test]
    fn literal_labels_parse_back_to_their_text() {
        for text in ["~id", "-5", "^x", "\\path", "plain", ""] {
            let raw = literal_label(text);
            let (flags, shown) = LabelFlags::parse(&raw);
            assert_eq!(flags, LabelFlags::default(), "{text}");
            assert_eq!(shown, text);
        }
        assert_eq!(literal_label("plain"), "plain");
    }
}

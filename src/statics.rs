// Central place for control codes, type tags, layout constants and CLI strings.
// Keep these out of the engines to reduce duplication and make tweaks safer.

// Label control codes (leading characters of a field label).
pub const CODE_INLINE: char = '^';
pub const CODE_EXPAND: char = '+';
pub const CODE_HIDE_CHILDREN: char = '-';
pub const CODE_READ_ONLY: char = '!';
pub const CODE_FULL_ROW: char = '<';
pub const CODE_PACK: char = '|';
pub const CODE_HIDDEN: char = '~';
// Ends the code prefix; the rest of the label is literal text.
pub const CODE_LITERAL: char = '\\';

// Type tags used as declared types for dynamically typed values.
pub const TAG_NULL: &str = "null";
pub const TAG_BOOL: &str = "bool";
pub const TAG_I64: &str = "i64";
pub const TAG_U64: &str = "u64";
pub const TAG_F64: &str = "f64";
pub const TAG_STRING: &str = "string";
pub const TAG_ARRAY: &str = "array";
pub const TAG_OBJECT: &str = "object";

// Numeric tags that typed archives commonly report.
pub const NUMERIC_TAGS: [&str; 10] = [
    "i8", "i16", "i32", TAG_I64, "u8", "u16", "u32", TAG_U64, "f32", TAG_F64,
];

// Pointer rows write their concrete type under this key on apply.
pub const TYPE_FIELD: &str = "$type";
// Non-object document roots are reported as a single field with this name.
pub const ROOT_VALUE_FIELD: &str = "value";
// Exemplar cache key of the null pointer sentinel.
pub const NULL_EXEMPLAR: &str = "";

// Style defaults (pixels unless noted).
pub const DEFAULT_VALUE_COLUMN: f32 = 0.5;
pub const DEFAULT_ROW_HEIGHT: i32 = 22;
pub const DEFAULT_ROW_SPACING: f32 = 1.0;
pub const DEFAULT_FIRST_LEVEL_INDENT: i32 = 16;
pub const DEFAULT_LEVEL_INDENT: i32 = 16;
pub const DEFAULT_LABEL_PADDING: i32 = 4;
pub const MIN_ROW_SPACING: f32 = 0.1;

// Widget minimal widths.
pub const CHECKBOX_WIDTH: i32 = 18;
pub const NUMBER_WIDGET_WIDTH: i32 = 48;
pub const TEXT_WIDGET_WIDTH: i32 = 64;
pub const CONTAINER_WIDGET_WIDTH: i32 = 32;
pub const POINTER_WIDGET_WIDTH: i32 = 80;
pub const ADD_BUTTON_WIDTH: i32 = 20;

// Checkbox packing.
pub const PACK_MIN_RUN: usize = 6;
pub const MAX_COLUMNS: usize = 4;
pub const SPLIT_SEARCH_RADIUS: isize = 2;

// CLI output.
pub const EN_COL_ELEMENT: &str = "#";
pub const EN_COL_ROLE: &str = "Role";
pub const EN_COL_ROW: &str = "Row";
pub const EN_COL_RECT: &str = "Rect";
pub const EN_LITERAL_ROOT: &str = "<root>";
pub const EN_ERR_BAD_SET: &str = "expected --set PATH=JSON5";

// Newline constants (used for document formatting).
pub const NL_LF: &str = "\n";
pub const NL_CRLF: &str = "\r\n";

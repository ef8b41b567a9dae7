//! Tree and layout style settings, loadable from JSON5.

use crate::statics;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Style inputs of the layout engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeStyle {
    /// Name/value divider as a fraction of the available width.
    pub value_column: f32,
    pub row_height: i32,
    /// Multiplier applied to `row_height`.
    pub row_spacing: f32,
    /// Pack long runs of checkbox rows into columns.
    pub pack_checkboxes: bool,
    /// No toggle or indent for first-level rows; first-level composites are always open.
    pub compact: bool,
    pub first_level_indent: i32,
    pub level_indent: i32,
    /// Horizontal padding added to measured label text.
    pub label_padding: i32,
}

impl Default for TreeStyle {
    fn default() -> Self {
        Self {
            value_column: statics::DEFAULT_VALUE_COLUMN,
            row_height: statics::DEFAULT_ROW_HEIGHT,
            row_spacing: statics::DEFAULT_ROW_SPACING,
            pack_checkboxes: false,
            compact: false,
            first_level_indent: statics::DEFAULT_FIRST_LEVEL_INDENT,
            level_indent: statics::DEFAULT_LEVEL_INDENT,
            label_padding: statics::DEFAULT_LABEL_PADDING,
        }
    }
}

impl TreeStyle {
    /// Height of one row line in pixels.
    pub fn line_height(&self) -> i32 {
        (self.row_height as f32 * self.row_spacing).round() as i32
    }

    /// Clamp every field into its usable range.
    pub fn sanitized(self) -> Self {
        let value_column = if self.value_column.is_finite() {
            self.value_column.clamp(0.0, 1.0)
        } else {
            statics::DEFAULT_VALUE_COLUMN
        };
        let row_spacing = if self.row_spacing.is_finite() {
            self.row_spacing.max(statics::MIN_ROW_SPACING)
        } else {
            statics::DEFAULT_ROW_SPACING
        };
        Self {
            value_column,
            row_spacing,
            row_height: self.row_height.max(0),
            first_level_indent: self.first_level_indent.max(0),
            level_indent: self.level_indent.max(0),
            label_padding: self.label_padding.max(0),
            ..self
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// Newly created rows up to this depth start expanded.
    pub auto_expand_levels: usize,
    pub style: TreeStyle,
}

impl TreeConfig {
    pub fn from_json5(text: &str) -> anyhow::Result<Self> {
        let config: TreeConfig = json5::from_str(text).context("Failed to parse tree config")?;
        Ok(config.sanitized())
    }

    pub fn load_path(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_json5(&text).with_context(|| format!("Invalid config {}", path.display()))
    }

    pub fn sanitized(self) -> Self {
        Self {
            style: self.style.sanitized(),
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{TreeConfig, TreeStyle};

    #[test]
    fn missing_fields_take_defaults() {
        let config = TreeConfig::from_json5("{ auto_expand_levels: 2, style: { compact: true } }")
            .unwrap();
        assert_eq!(config.auto_expand_levels, 2);
        assert!(config.style.compact);
        assert_eq!(config.style.row_height, TreeStyle::default().row_height);
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let config =
            TreeConfig::from_json5("{ style: { value_column: 1.5, row_spacing: 0, level_indent: -3 } }")
                .unwrap();
        assert_eq!(config.style.value_column, 1.0);
        assert!(config.style.row_spacing > 0.0);
        assert_eq!(config.style.level_indent, 0);
    }

    #[test]
    fn line_height_applies_spacing() {
        let style = TreeStyle {
            row_height: 20,
            row_spacing: 1.25,
            ..TreeStyle::default()
        };
        assert_eq!(style.line_height(), 25);
    }

    #[test]
    fn malformed_config_is_an_error() {
        assert!(TreeConfig::from_json5("{ style: ").is_err());
    }
}

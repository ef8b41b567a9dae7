//! Row type registry.
//!
//! Maps a declared type to the widget profile its rows are built with. The
//! registry is an explicit object owned by the tree controller and handed to
//! the reconciler; nothing here is process-global.

use crate::statics;
use std::collections::HashMap;

/// Where a row's value widget sits relative to its label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WidgetPlacement {
    /// No widget; the label fills the row.
    None,
    /// Fixed widget before the label (checkboxes, icons).
    Icon,
    /// Fixed widget right after a fixed-width label.
    AfterName,
    /// Widget in the value column; the label is pulled to the divider.
    Value,
    /// Widget after the row's inlined children.
    AfterInlined,
    /// Widget replaces the label text.
    InsteadOfText,
}

/// Structural shape of a row, used to pick a fallback profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    Leaf,
    Struct,
    Container,
    Pointer,
}

/// Widget profile of a row type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WidgetSpec {
    pub placement: WidgetPlacement,
    /// Minimal width of the widget element.
    pub min_width: i32,
    /// Eligible for multi-column checkbox packing.
    pub checkbox: bool,
    /// False when the profile is a per-shape fallback.
    pub registered: bool,
}

impl WidgetSpec {
    pub const fn new(placement: WidgetPlacement, min_width: i32) -> Self {
        Self {
            placement,
            min_width,
            checkbox: false,
            registered: true,
        }
    }

    pub const fn checkbox() -> Self {
        Self {
            placement: WidgetPlacement::Icon,
            min_width: statics::CHECKBOX_WIDTH,
            checkbox: true,
            registered: true,
        }
    }

    /// Profile for a type with no registry entry.
    pub const fn fallback(shape: Shape) -> Self {
        let (placement, min_width) = match shape {
            Shape::Leaf => (WidgetPlacement::Value, statics::TEXT_WIDGET_WIDTH),
            Shape::Struct => (WidgetPlacement::None, 0),
            Shape::Container => (WidgetPlacement::AfterName, statics::CONTAINER_WIDGET_WIDTH),
            Shape::Pointer => (WidgetPlacement::Value, statics::POINTER_WIDGET_WIDTH),
        };
        Self {
            placement,
            min_width,
            checkbox: false,
            registered: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RowRegistry {
    entries: HashMap<String, WidgetSpec>,
}

impl RowRegistry {
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Registry with profiles for the primitive type tags.
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register(statics::TAG_BOOL, WidgetSpec::checkbox());
        for tag in statics::NUMERIC_TAGS {
            registry.register(
                tag,
                WidgetSpec::new(WidgetPlacement::Value, statics::NUMBER_WIDGET_WIDTH),
            );
        }
        registry.register(
            statics::TAG_STRING,
            WidgetSpec::new(WidgetPlacement::Value, statics::TEXT_WIDGET_WIDTH),
        );
        registry.register(statics::TAG_NULL, WidgetSpec::new(WidgetPlacement::None, 0));
        registry
    }

    /// Register (or replace) the profile for `type_name`.
    pub fn register(&mut self, type_name: &str, spec: WidgetSpec) -> Option<WidgetSpec> {
        self.entries.insert(
            type_name.to_string(),
            WidgetSpec {
                registered: true,
                ..spec
            },
        )
    }

    pub fn lookup(&self, type_name: &str) -> Option<&WidgetSpec> {
        self.entries.get(type_name)
    }

    /// Profile for a new row, falling back to the shape's untyped profile.
    pub fn resolve(&self, type_name: &str, shape: Shape) -> WidgetSpec {
        match self.lookup(type_name) {
            Some(spec) => *spec,
            None => {
                tracing::trace!(type_name, ?shape, "no registered row type, using fallback");
                WidgetSpec::fallback(shape)
            }
        }
    }
}

impl Default for RowRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::{RowRegistry, Shape, WidgetPlacement, WidgetSpec};
    use crate::statics;

    #[test]
    fn defaults_cover_primitive_tags() {
        let registry = RowRegistry::with_defaults();
        assert!(registry.lookup(statics::TAG_BOOL).unwrap().checkbox);
        assert_eq!(
            registry.lookup("f32").unwrap().placement,
            WidgetPlacement::Value
        );
        assert!(registry.lookup("Vec3").is_none());
    }

    #[test]
    fn unknown_type_falls_back_per_shape() {
        let registry = RowRegistry::with_defaults();
        let leaf = registry.resolve("Color", Shape::Leaf);
        assert!(!leaf.registered);
        assert_eq!(leaf.placement, WidgetPlacement::Value);
        assert_eq!(
            registry.resolve("Transform", Shape::Struct).placement,
            WidgetPlacement::None
        );
    }

    #[test]
    fn register_marks_entry_registered() {
        let mut registry = RowRegistry::empty();
        let spec = WidgetSpec {
            registered: false,
            ..WidgetSpec::new(WidgetPlacement::InsteadOfText, 30)
        };
        assert!(registry.register("Slider", spec).is_none());
        assert!(registry.resolve("Slider", Shape::Leaf).registered);
    }
}

//! Traversal contract between an edited object and the row tree.
//!
//! An object describes itself by calling an [`Archive`] once per field, with
//! explicit open/close brackets around nested structs, containers and
//! polymorphic pointers. Edits flow back through [`Inspect::apply`] as a
//! [`Value`] mirroring the same shape.

use crate::error::TreeError;
use crate::label::literal_label;
use crate::statics;
use crate::value::Value;

/// Identity and display text of one reported field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field<'a> {
    /// Identity key among siblings; must not be empty.
    pub name: &'a str,
    /// Display text, may carry leading control codes. Empty means "use name".
    pub label: &'a str,
    /// Declared type; identity key together with `name`.
    pub type_name: &'a str,
}

impl<'a> Field<'a> {
    pub const fn new(name: &'a str, label: &'a str, type_name: &'a str) -> Self {
        Self {
            name,
            label,
            type_name,
        }
    }

    /// Label to display, falling back to the name.
    pub fn display_label(&self) -> &'a str {
        if self.label.is_empty() {
            self.name
        } else {
            self.label
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerInfo<'a> {
    pub element_type: &'a str,
    pub len: usize,
    /// Elements cannot be added or removed by the user.
    pub fixed_size: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerInfo<'a> {
    pub base_type: &'a str,
    /// Concrete type of the pointee, `None` for a null pointer.
    pub concrete: Option<&'a str>,
}

/// Enumerates the concrete types a polymorphic field can hold.
pub trait TypeFactory {
    fn concrete_types(&self) -> Vec<String>;

    /// Report the fields of a default-constructed instance of `type_name`.
    fn exemplar(&self, type_name: &str, ar: &mut dyn Archive);
}

/// Receiver of a field traversal.
pub trait Archive {
    fn value(&mut self, field: Field<'_>, value: Value);

    fn open_struct(&mut self, field: Field<'_>);

    /// Open a container. `exemplar` reports one default element when called;
    /// the receiver calls it at most once per element type it has not seen.
    fn open_container(
        &mut self,
        field: Field<'_>,
        info: ContainerInfo<'_>,
        exemplar: &mut dyn FnMut(&mut dyn Archive),
    );

    fn open_pointer(&mut self, field: Field<'_>, info: PointerInfo<'_>, factory: &dyn TypeFactory);

    /// Close the innermost open struct, container or pointer.
    fn close(&mut self);
}

/// An object that can be shown and edited in the tree.
pub trait Inspect {
    fn inspect(&self, ar: &mut dyn Archive);

    /// Write back edits. `value` mirrors the shape reported by `inspect`.
    fn apply(&mut self, value: &Value) -> Result<(), TreeError>;
}

/// Name of the `index`-th element of a container.
pub fn element_name(index: usize) -> String {
    index.to_string()
}

impl Inspect for Value {
    fn inspect(&self, ar: &mut dyn Archive) {
        match self {
            Value::Object(map) => {
                for (key, v) in map {
                    inspect_value(key, v, ar);
                }
            }
            other => inspect_value(statics::ROOT_VALUE_FIELD, other, ar),
        }
    }

    fn apply(&mut self, value: &Value) -> Result<(), TreeError> {
        if matches!(self, Value::Object(_)) {
            if value.as_object().is_none() {
                return Err(TreeError::Apply(format!(
                    "expected an object, got {}",
                    value.type_tag()
                )));
            }
            // Keys the tree could not show are kept as they were.
            self.merge(value);
            return Ok(());
        }
        let Some(inner) = value.get(statics::ROOT_VALUE_FIELD) else {
            return Err(TreeError::Apply(format!(
                "missing {:?} field",
                statics::ROOT_VALUE_FIELD
            )));
        };
        self.merge(inner);
        Ok(())
    }
}

/// Report one dynamically typed value as a field named `name`. The name is
/// shown verbatim, so keys that start with a control code stay plain text.
pub fn inspect_value(name: &str, value: &Value, ar: &mut dyn Archive) {
    let label = literal_label(name);
    match value {
        Value::Object(map) => {
            ar.open_struct(Field::new(name, &label, statics::TAG_OBJECT));
            for (key, v) in map {
                inspect_value(key, v, ar);
            }
            ar.close();
        }
        Value::Array(items) => {
            let element_type = items
                .first()
                .map(Value::type_tag)
                .unwrap_or(statics::TAG_NULL);
            let info = ContainerInfo {
                element_type,
                len: items.len(),
                fixed_size: false,
            };
            let mut exemplar = |ar: &mut dyn Archive| {
                inspect_value(&element_name(0), &Value::default_for_tag(element_type), ar)
            };
            ar.open_container(Field::new(name, &label, statics::TAG_ARRAY), info, &mut exemplar);
            for (i, item) in items.iter().enumerate() {
                inspect_value(&element_name(i), item, ar);
            }
            ar.close();
        }
        leaf => ar.value(Field::new(name, &label, leaf.type_tag()), leaf.clone()),
    }
}

use crate::statics;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

/// A number that keeps the I64 / U64 / F64 distinction, so a field's declared
/// type tag survives a round trip through the row tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Number {
    I64(i64),
    U64(u64),
    F64(f64),
}

impl Number {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Number::I64(v) => Some(*v),
            Number::U64(v) => i64::try_from(*v).ok(),
            Number::F64(_) => None,
        }
    }

    pub fn as_f64(&self) -> f64 {
        match self {
            Number::I64(v) => *v as f64,
            Number::U64(v) => *v as f64,
            Number::F64(v) => *v,
        }
    }

    pub fn type_tag(&self) -> &'static str {
        match self {
            Number::I64(_) => statics::TAG_I64,
            Number::U64(_) => statics::TAG_U64,
            Number::F64(_) => statics::TAG_F64,
        }
    }

    fn write_json5(&self, out: &mut String) {
        match self {
            Number::I64(v) => out.push_str(&v.to_string()),
            Number::U64(v) => out.push_str(&v.to_string()),
            Number::F64(v) => {
                if v.is_nan() {
                    out.push_str("NaN");
                } else if v.is_infinite() {
                    out.push_str(if v.is_sign_negative() {
                        "-Infinity"
                    } else {
                        "Infinity"
                    });
                } else {
                    let mut buf = ryu::Buffer::new();
                    out.push_str(buf.format(*v));
                }
            }
        }
    }
}

impl Serialize for Number {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Number::I64(v) => serializer.serialize_i64(*v),
            Number::U64(v) => serializer.serialize_u64(*v),
            Number::F64(v) => serializer.serialize_f64(*v),
        }
    }
}

/// The dynamically typed payload carried by leaf rows and produced on apply.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<Value>),
    Object(IndexMap<String, Value>),
}

impl Value {
    pub fn as_object(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut IndexMap<String, Value>> {
        match self {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(n.as_f64()),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_object().and_then(|m| m.get(key))
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.as_object_mut().and_then(|m| m.get_mut(key))
    }

    /// Overlay `edited` onto this value. Object keys that `edited` does not
    /// mention are kept. Arrays take the edited length and merge element by
    /// element; any other pair is replaced.
    pub fn merge(&mut self, edited: &Value) {
        match (self, edited) {
            (Value::Object(map), Value::Object(fields)) => {
                for (key, v) in fields {
                    match map.get_mut(key) {
                        Some(slot) => slot.merge(v),
                        None => {
                            map.insert(key.clone(), v.clone());
                        }
                    }
                }
            }
            (Value::Array(items), Value::Array(edited)) => {
                items.truncate(edited.len());
                for (slot, v) in items.iter_mut().zip(edited) {
                    slot.merge(v);
                }
                let kept = items.len();
                items.extend(edited[kept..].iter().cloned());
            }
            (slot, v) => *slot = v.clone(),
        }
    }

    /// Declared-type tag of this value. Numbers report their storage kind.
    pub fn type_tag(&self) -> &'static str {
        match self {
            Value::Null => statics::TAG_NULL,
            Value::Bool(_) => statics::TAG_BOOL,
            Value::Number(n) => n.type_tag(),
            Value::String(_) => statics::TAG_STRING,
            Value::Array(_) => statics::TAG_ARRAY,
            Value::Object(_) => statics::TAG_OBJECT,
        }
    }

    /// Default value for a type tag, used as the exemplar of array elements.
    pub fn default_for_tag(tag: &str) -> Value {
        match tag {
            statics::TAG_BOOL => Value::Bool(false),
            statics::TAG_I64 => Value::Number(Number::I64(0)),
            statics::TAG_U64 => Value::Number(Number::U64(0)),
            statics::TAG_F64 => Value::Number(Number::F64(0.0)),
            statics::TAG_STRING => Value::String(String::new()),
            statics::TAG_ARRAY => Value::Array(Vec::new()),
            statics::TAG_OBJECT => Value::Object(IndexMap::new()),
            _ => Value::Null,
        }
    }

    pub fn parse_json5(text: &str) -> anyhow::Result<Value> {
        Ok(json5::from_str::<Value>(text)?)
    }

    pub fn to_json5_compact(&self) -> String {
        let mut out = String::new();
        self.write_json5(&mut out, 0, false, statics::NL_LF);
        out
    }

    pub fn to_json5_pretty(&self) -> String {
        self.to_json5_pretty_with_newline(statics::NL_LF)
    }

    pub fn to_json5_pretty_with_newline(&self, newline: &str) -> String {
        let mut out = String::new();
        self.write_json5(&mut out, 0, true, newline);
        out.push_str(newline);
        out
    }

    /// Short single-line rendering for value widgets and CLI output.
    pub fn preview(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            Value::Array(items) => format!("[{}]", items.len()),
            Value::Object(map) => format!("{{{}}}", map.len()),
            other => other.to_json5_compact(),
        }
    }

    fn write_json5(&self, out: &mut String, indent: usize, pretty: bool, newline: &str) {
        match self {
            Value::Null => out.push_str("null"),
            Value::Bool(v) => out.push_str(if *v { "true" } else { "false" }),
            Value::Number(n) => n.write_json5(out),
            Value::String(s) => write_escaped_string(out, s),
            Value::Array(values) => {
                out.push('[');
                for (i, v) in values.iter().enumerate() {
                    if pretty {
                        out.push_str(newline);
                        out.push_str(&" ".repeat(indent + 4));
                    } else if i > 0 {
                        out.push(' ');
                    }
                    v.write_json5(out, indent + 4, pretty, newline);
                    if i + 1 != values.len() {
                        out.push(',');
                    }
                }
                if pretty && !values.is_empty() {
                    out.push_str(newline);
                    out.push_str(&" ".repeat(indent));
                }
                out.push(']');
            }
            Value::Object(map) => {
                out.push('{');
                for (i, (k, v)) in map.iter().enumerate() {
                    if pretty {
                        out.push_str(newline);
                        out.push_str(&" ".repeat(indent + 4));
                    } else if i > 0 {
                        out.push(' ');
                    }
                    write_escaped_string(out, k);
                    out.push(':');
                    if pretty {
                        out.push(' ');
                    }
                    v.write_json5(out, indent + 4, pretty, newline);
                    if i + 1 != map.len() {
                        out.push(',');
                    }
                }
                if pretty && !map.is_empty() {
                    out.push_str(newline);
                    out.push_str(&" ".repeat(indent));
                }
                out.push('}');
            }
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Number(Number::I64(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Number(Number::F64(v))
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_owned())
    }
}

fn write_escaped_string(out: &mut String, s: &str) {
    out.push('"');
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                use std::fmt::Write as _;
                write!(out, "\\u{:04X}", c as u32).ok();
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(v) => serializer.serialize_bool(*v),
            Value::Number(n) => n.serialize(serializer),
            Value::String(s) => serializer.serialize_str(s),
            Value::Array(values) => values.serialize(serializer),
            Value::Object(map) => map.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ValueVisitor;

        impl<'de> de::Visitor<'de> for ValueVisitor {
            type Value = Value;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("a JSON5 value")
            }

            fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(Value::Null)
            }

            fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(Value::Null)
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
                Ok(Value::Bool(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                Ok(Value::Number(Number::I64(v)))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                // Keep small unsigned literals signed so `1` and `-1` share a tag.
                Ok(match i64::try_from(v) {
                    Ok(v) => Value::Number(Number::I64(v)),
                    Err(_) => Value::Number(Number::U64(v)),
                })
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
                Ok(Value::Number(Number::F64(v)))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                Ok(Value::String(v.to_owned()))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
                Ok(Value::String(v))
            }

            fn visit_seq<A: de::SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
                let mut values = Vec::new();
                while let Some(value) = seq.next_element::<Value>()? {
                    values.push(value);
                }
                Ok(Value::Array(values))
            }

            fn visit_map<A: de::MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut values = IndexMap::new();
                while let Some((key, value)) = map.next_entry::<String, Value>()? {
                    values.insert(key, value);
                }
                Ok(Value::Object(values))
            }
        }

        deserializer.deserialize_any(ValueVisitor)
    }
}

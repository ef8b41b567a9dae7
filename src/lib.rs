//! Property-grid row tree.
//!
//! Shows an object that describes itself through an [`Archive`] traversal as
//! an expandable tree of rows, keeps row identity stable across updates by
//! reconciling each new traversal against the previous tree, and lays the
//! rows out into pixel rectangles for painting, hit testing and keyboard
//! navigation.

mod archive;
mod config;
mod controller;
mod document;
mod error;
mod geometry;
mod label;
mod layout;
mod measure;
mod reconcile;
mod registry;
mod row;
pub mod statics;
mod value;

pub use archive::{
    Archive, ContainerInfo, Field, Inspect, PointerInfo, TypeFactory, element_name, inspect_value,
};
pub use config::{TreeConfig, TreeStyle};
pub use controller::{ChangeListener, TreeController};
pub use document::{Document, DocumentFormat, LineEnding};
pub use error::TreeError;
pub use geometry::{Axis, Direction, Point, Rect};
pub use label::{LabelFlags, literal_label};
pub use layout::{Column, ElementKind, Focus, Hit, Layout, LayoutElement, Role};
pub use measure::{Measure, MonospaceMeasure};
pub use reconcile::{ExemplarCache, ReconcileReport, Reconciler};
pub use registry::{RowRegistry, Shape, WidgetPlacement, WidgetSpec};
pub use row::{EditorCallback, Row, RowId, RowKind, RowTree};
pub use value::{Number, Value};

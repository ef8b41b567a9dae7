//! Layout engine.
//!
//! A pass turns the visible part of a [`RowTree`] into a flat table of
//! [`LayoutElement`]s with pixel rectangles. The table is rebuilt from scratch
//! every time:
//!
//! 1. **Populate** walks the visible rows depth-first and emits one element per
//!    role (row strip, toggle, label, widget, validation bubble, ...). Container
//!    elements reference their children through a shared pool of child lists.
//! 2. **Solve** runs four passes: minimal widths bottom-up, horizontal
//!    placement top-down, minimal heights bottom-up (wrapped text is measured
//!    against its resolved width, and checkbox columns are split here), then
//!    vertical placement top-down.
//!
//! Children always sit at higher indices than their container, so bottom-up
//! passes walk the table backwards and top-down passes walk it forwards.
//! Elements belonging to one row are emitted contiguously, starting at the
//! index recorded in the row's back-reference.

mod columns;
mod populate;
mod query;
mod solve;

pub use columns::Column;
pub use query::Hit;

use crate::config::TreeStyle;
use crate::geometry::{Axis, Rect};
use crate::measure::Measure;
use crate::row::{RowId, RowTree};
use slotmap::SecondaryMap;

/// How an element takes part in space distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    /// Never grows past its minimal size.
    Fixed,
    /// Shares leftover space with its expanding siblings.
    Expanding,
    /// Grows until its end reaches the name/value divider, then like `Fixed`.
    ExpandingMagnet,
    /// Fixed width; height comes from wrapping its text at the resolved width.
    HeightByWidth,
    HorizontalBox,
    VerticalBox,
    /// Vertical list packed into balanced columns.
    Columns,
}

impl ElementKind {
    pub const fn is_container(self) -> bool {
        matches!(
            self,
            ElementKind::HorizontalBox | ElementKind::VerticalBox | ElementKind::Columns
        )
    }

    /// Main axis of a container.
    pub(crate) const fn main_axis(self) -> Option<Axis> {
        match self {
            ElementKind::HorizontalBox => Some(Axis::Horizontal),
            ElementKind::VerticalBox | ElementKind::Columns => Some(Axis::Vertical),
            _ => None,
        }
    }

    /// Takes a share of leftover space when nothing overflows.
    pub(crate) const fn grows(self) -> bool {
        matches!(
            self,
            ElementKind::Expanding
                | ElementKind::HorizontalBox
                | ElementKind::VerticalBox
                | ElementKind::Columns
        )
    }
}

/// Which part of a row an element shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Root,
    /// Horizontal strip of one row.
    RowArea,
    /// Indentation plus the child list of an expanded row.
    ContentArea,
    ChildList,
    Indent,
    /// Expand/collapse toggle.
    Toggle,
    Label,
    /// Value widget. Sub-index 1 is the "add element" button of containers.
    Widget,
    Validation,
    CheckboxColumns,
}

impl Role {
    pub fn name(self) -> &'static str {
        match self {
            Role::Root => "root",
            Role::RowArea => "row",
            Role::ContentArea => "content",
            Role::ChildList => "children",
            Role::Indent => "indent",
            Role::Toggle => "toggle",
            Role::Label => "label",
            Role::Widget => "widget",
            Role::Validation => "validation",
            Role::CheckboxColumns => "columns",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Focus {
    None,
    Focusable,
    /// Forwards focus to the first focusable descendant.
    Forward,
}

/// One rectangle-producing unit of a layout pass.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutElement {
    pub kind: ElementKind,
    pub role: Role,
    pub focus: Focus,
    /// Row this element shows; never owns it.
    pub row: Option<RowId>,
    pub sub_index: u16,
    /// Collapse priority: higher tiers shrink first.
    pub priority: u8,
    pub rect: Rect,
    pub(crate) min: [i32; 2],
    pub(crate) child_list: Option<usize>,
    /// Text wrapped by a `HeightByWidth` element.
    pub(crate) text: Option<String>,
    pub(crate) columns: Vec<Column>,
}

impl LayoutElement {
    pub(crate) fn new(kind: ElementKind, role: Role, row: Option<RowId>) -> Self {
        Self {
            kind,
            role,
            focus: Focus::None,
            row,
            sub_index: 0,
            priority: 0,
            rect: Rect::default(),
            min: [0, 0],
            child_list: None,
            text: None,
            columns: Vec::new(),
        }
    }

    pub fn min_size(&self, axis: Axis) -> i32 {
        self.min[axis.index()]
    }

    pub fn min_width(&self) -> i32 {
        self.min[0]
    }

    pub fn min_height(&self) -> i32 {
        self.min[1]
    }

    /// Column split of a `Columns` element, empty otherwise.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }
}

/// Result of one layout pass.
#[derive(Debug, Clone, Default)]
pub struct Layout {
    elements: Vec<LayoutElement>,
    child_lists: Vec<Vec<usize>>,
    row_first_element: SecondaryMap<RowId, usize>,
    width: i32,
    magnet_x: i32,
}

impl Layout {
    /// Lay out the visible rows of `tree` into `width` pixels.
    ///
    /// Consumes the tree's label-changed and dirty flags: labels flagged since
    /// the previous pass are remeasured, the rest reuse their cached width.
    pub fn compute(tree: &mut RowTree, style: &TreeStyle, measure: &dyn Measure, width: i32) -> Layout {
        let width = width.max(0);
        let mut layout = Layout {
            width,
            magnet_x: (width as f32 * style.value_column).floor() as i32,
            ..Layout::default()
        };
        populate::Builder::new(&mut layout, tree, style, measure).run();
        layout.solve(measure);
        tree.clear_layout_dirty();

        tracing::debug!(
            elements = layout.elements.len(),
            width = layout.width,
            height = layout.height(),
            "layout pass finished"
        );
        layout
    }

    pub fn elements(&self) -> &[LayoutElement] {
        &self.elements
    }

    pub fn element(&self, index: usize) -> Option<&LayoutElement> {
        self.elements.get(index)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Child element indices of `index` (empty for leaves).
    pub fn children(&self, index: usize) -> &[usize] {
        self.elements
            .get(index)
            .and_then(|e| e.child_list)
            .and_then(|l| self.child_lists.get(l))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Index of the first element emitted for `row`, if it is laid out.
    pub fn first_element(&self, row: RowId) -> Option<usize> {
        self.row_first_element.get(row).copied()
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    /// Total height of the laid-out tree.
    pub fn height(&self) -> i32 {
        self.elements.first().map_or(0, |root| root.rect.height)
    }

    /// Horizontal position of the name/value divider.
    pub fn magnet_x(&self) -> i32 {
        self.magnet_x
    }

    pub(crate) fn push(&mut self, element: LayoutElement) -> usize {
        self.elements.push(element);
        self.elements.len() - 1
    }

    pub(crate) fn push_container(&mut self, mut element: LayoutElement) -> usize {
        self.child_lists.push(Vec::new());
        element.child_list = Some(self.child_lists.len() - 1);
        self.push(element)
    }

    pub(crate) fn add_child(&mut self, parent: usize, child: usize) {
        let list = self.elements.get(parent).and_then(|e| e.child_list);
        debug_assert!(list.is_some(), "element {parent} is not a container");
        if let Some(list) = list.and_then(|l| self.child_lists.get_mut(l)) {
            list.push(child);
        }
    }
}

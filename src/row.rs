//! Row tree storage.
//!
//! Rows live in one generational arena owned by the tree controller. Parent and
//! child links are plain [`RowId`] handles, so there are no ownership cycles and
//! a handle to a dropped row is detectably stale. A row that is detached from
//! the tree while something still pins it (an in-place editor, a pending paste,
//! a cached exemplar) stays alive, with its subtree, until it is unpinned.

use crate::error::TreeError;
use crate::label::LabelFlags;
use crate::registry::{Shape, WidgetSpec};
use crate::statics;
use crate::value::Value;
use indexmap::IndexMap;
use slotmap::{SlotMap, new_key_type};
use std::rc::Rc;

new_key_type! {
    /// Handle of a row. Doubles as the row's identity token: it survives
    /// reconciliation passes that reuse the row and is never handed out again
    /// once the row is dropped.
    pub struct RowId;
}

/// Commit hook of an in-place editor attached to a row.
pub type EditorCallback = Rc<dyn Fn(RowId, &Value)>;

/// What a row holds.
#[derive(Debug, Clone, PartialEq)]
pub enum RowKind {
    /// Primitive value.
    Leaf(Value),
    /// Fixed set of named children.
    Struct,
    /// Dynamic list of children named by position.
    Container {
        element_type: String,
        fixed_size: bool,
    },
    /// Polymorphic value; children are the fields of the concrete type.
    Pointer {
        base_type: String,
        concrete: Option<String>,
    },
}

impl RowKind {
    pub fn shape(&self) -> Shape {
        match self {
            RowKind::Leaf(_) => Shape::Leaf,
            RowKind::Struct => Shape::Struct,
            RowKind::Container { .. } => Shape::Container,
            RowKind::Pointer { .. } => Shape::Pointer,
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            RowKind::Leaf(_) => "leaf",
            RowKind::Struct => "struct",
            RowKind::Container { .. } => "container",
            RowKind::Pointer { .. } => "pointer",
        }
    }
}

pub struct Row {
    name: String,
    raw_label: String,
    label: String,
    type_name: String,
    flags: LabelFlags,
    pub kind: RowKind,
    pub widget: WidgetSpec,
    pub expanded: bool,
    pub selected: bool,
    pub visible: bool,
    /// Message shown in a word-wrapped bubble under the row.
    pub validation: Option<String>,
    parent: Option<RowId>,
    children: Vec<RowId>,
    /// Display label changed since the last layout; text width must be remeasured.
    pub(crate) label_changed: bool,
    /// Something in this subtree changed since the last layout.
    pub(crate) layout_dirty: bool,
    pub(crate) text_width: Option<i32>,
    editor: Option<EditorCallback>,
    pins: u32,
}

impl std::fmt::Debug for Row {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Row")
            .field("name", &self.name)
            .field("label", &self.label)
            .field("type_name", &self.type_name)
            .field("kind", &self.kind)
            .field("expanded", &self.expanded)
            .field("selected", &self.selected)
            .field("children", &self.children.len())
            .finish_non_exhaustive()
    }
}

impl Row {
    pub fn new(
        name: &str,
        raw_label: &str,
        type_name: &str,
        kind: RowKind,
        widget: WidgetSpec,
    ) -> Self {
        let (flags, label) = LabelFlags::parse(raw_label);
        Self {
            name: name.to_string(),
            raw_label: raw_label.to_string(),
            label: label.to_string(),
            type_name: type_name.to_string(),
            flags,
            kind,
            widget,
            expanded: flags.expand_by_default,
            selected: false,
            visible: !flags.hidden,
            validation: None,
            parent: None,
            children: Vec::new(),
            label_changed: true,
            layout_dirty: true,
            text_width: None,
            editor: None,
            pins: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Display label (control codes stripped).
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn raw_label(&self) -> &str {
        &self.raw_label
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn flags(&self) -> LabelFlags {
        self.flags
    }

    pub fn parent(&self) -> Option<RowId> {
        self.parent
    }

    pub fn children(&self) -> &[RowId] {
        &self.children
    }

    pub fn value(&self) -> Option<&Value> {
        match &self.kind {
            RowKind::Leaf(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_inlined(&self) -> bool {
        self.flags.inlined
    }

    pub fn is_inlined_before(&self) -> bool {
        self.flags.inlined_before
    }

    pub fn is_container(&self) -> bool {
        matches!(self.kind, RowKind::Container { .. })
    }

    pub fn is_read_only(&self) -> bool {
        self.flags.read_only
    }

    /// True when the row owns an ordered child list.
    pub fn is_composite(&self) -> bool {
        !matches!(self.kind, RowKind::Leaf(_))
    }

    pub fn is_checkbox(&self) -> bool {
        self.widget.checkbox && !self.is_composite()
    }

    pub fn editor(&self) -> Option<&EditorCallback> {
        self.editor.as_ref()
    }

    pub fn set_editor(&mut self, editor: Option<EditorCallback>) {
        self.editor = editor;
    }

    pub fn pin_count(&self) -> u32 {
        self.pins
    }

    /// Replace the raw label. Returns true when the display text or flags changed.
    pub(crate) fn set_raw_label(&mut self, raw_label: &str) -> bool {
        if self.raw_label == raw_label {
            return false;
        }
        let (flags, label) = LabelFlags::parse(raw_label);
        let text_changed = self.label != label;
        let flags_changed = flags != self.flags;
        if flags.hidden != self.flags.hidden {
            self.visible = !flags.hidden;
        }
        self.raw_label = raw_label.to_string();
        self.label = label.to_string();
        self.flags = flags;
        text_changed || flags_changed
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }
}

/// Arena of rows plus the handle of the root.
#[derive(Debug)]
pub struct RowTree {
    rows: SlotMap<RowId, Row>,
    root: RowId,
}

impl RowTree {
    pub fn new() -> Self {
        let mut rows = SlotMap::with_key();
        let mut root = Row::new(
            "",
            "",
            statics::TAG_OBJECT,
            RowKind::Struct,
            WidgetSpec::fallback(Shape::Struct),
        );
        root.expanded = true;
        let root = rows.insert(root);
        Self { rows, root }
    }

    pub fn root(&self) -> RowId {
        self.root
    }

    /// Number of live rows, detached ones included.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows[self.root].children.is_empty()
    }

    pub fn contains(&self, id: RowId) -> bool {
        self.rows.contains_key(id)
    }

    pub fn get(&self, id: RowId) -> Option<&Row> {
        self.rows.get(id)
    }

    pub fn get_mut(&mut self, id: RowId) -> Option<&mut Row> {
        self.rows.get_mut(id)
    }

    pub fn row(&self, id: RowId) -> Result<&Row, TreeError> {
        self.rows.get(id).ok_or(TreeError::StaleRow)
    }

    pub fn row_mut(&mut self, id: RowId) -> Result<&mut Row, TreeError> {
        self.rows.get_mut(id).ok_or(TreeError::StaleRow)
    }

    pub fn children(&self, id: RowId) -> &[RowId] {
        self.rows.get(id).map(|r| r.children.as_slice()).unwrap_or(&[])
    }

    pub fn parent(&self, id: RowId) -> Option<RowId> {
        self.rows.get(id).and_then(|r| r.parent)
    }

    /// Distance from the root (the root itself is depth 0).
    pub fn depth(&self, id: RowId) -> usize {
        let mut depth = 0;
        let mut cur = self.parent(id);
        while let Some(p) = cur {
            depth += 1;
            cur = self.parent(p);
        }
        depth
    }

    /// True when `id` is reachable from the root.
    pub fn is_attached(&self, id: RowId) -> bool {
        let mut cur = Some(id);
        while let Some(c) = cur {
            if c == self.root {
                return true;
            }
            cur = self.parent(c);
        }
        false
    }

    pub fn find_child(&self, parent: RowId, name: &str) -> Option<RowId> {
        self.children(parent)
            .iter()
            .copied()
            .find(|c| self.rows[*c].name == name)
    }

    /// Look up a row by the names of the rows leading to it from the root.
    pub fn find_path(&self, path: &[&str]) -> Option<RowId> {
        path.iter()
            .try_fold(self.root, |cur, name| self.find_child(cur, name))
    }

    /// Dotted name path, for logs and CLI output.
    pub fn path_of(&self, id: RowId) -> String {
        let mut names = Vec::new();
        let mut cur = Some(id);
        while let Some(c) = cur {
            if c == self.root {
                break;
            }
            let Some(row) = self.rows.get(c) else { break };
            names.push(row.name.as_str());
            cur = row.parent;
        }
        names.reverse();
        names.join(".")
    }

    /// All rows under `id` in pre-order, `id` excluded.
    pub fn descendants(&self, id: RowId) -> Vec<RowId> {
        let mut out = Vec::new();
        let mut stack: Vec<RowId> = self.children(id).iter().rev().copied().collect();
        while let Some(cur) = stack.pop() {
            out.push(cur);
            stack.extend(self.children(cur).iter().rev().copied());
        }
        out
    }

    pub(crate) fn insert(&mut self, row: Row) -> RowId {
        self.rows.insert(row)
    }

    pub(crate) fn append_child(&mut self, parent: RowId, child: RowId) {
        let len = self.children(parent).len();
        self.insert_child(parent, len, child);
    }

    pub(crate) fn insert_child(&mut self, parent: RowId, index: usize, child: RowId) {
        if let Some(row) = self.rows.get_mut(child) {
            row.parent = Some(parent);
        }
        if let Some(row) = self.rows.get_mut(parent) {
            let index = index.min(row.children.len());
            row.children.insert(index, child);
        }
    }

    /// Empty the child list of `parent`, returning the previous children.
    /// The children keep their parent link until reattached or dropped.
    pub(crate) fn take_children(&mut self, parent: RowId) -> Vec<RowId> {
        self.rows
            .get_mut(parent)
            .map(|r| std::mem::take(&mut r.children))
            .unwrap_or_default()
    }

    /// Unlink `id` from its parent. The row stays in the arena.
    pub fn detach(&mut self, id: RowId) {
        let Some(parent) = self.parent(id) else { return };
        if let Some(p) = self.rows.get_mut(parent) {
            p.children.retain(|c| *c != id);
        }
        if let Some(row) = self.rows.get_mut(id) {
            row.parent = None;
        }
    }

    /// Detach `id` and free it unless something pins it. Returns rows freed.
    pub(crate) fn drop_subtree(&mut self, id: RowId) -> usize {
        if id == self.root {
            return 0;
        }
        if let Some(parent) = self.parent(id) {
            self.mark_dirty_upwards(parent);
        }
        self.detach(id);
        self.release(id)
    }

    fn release(&mut self, id: RowId) -> usize {
        match self.rows.get(id) {
            Some(row) if row.pins == 0 && row.parent.is_none() && id != self.root => {}
            _ => return 0,
        }
        let Some(row) = self.rows.remove(id) else {
            return 0;
        };
        let mut freed = 1;
        for child in row.children {
            if let Some(c) = self.rows.get_mut(child) {
                c.parent = None;
            }
            freed += self.release(child);
        }
        freed
    }

    /// Keep `id` alive while detached. Returns false for a stale handle.
    pub fn pin(&mut self, id: RowId) -> bool {
        match self.rows.get_mut(id) {
            Some(row) => {
                row.pins += 1;
                true
            }
            None => false,
        }
    }

    /// Drop one pin; a detached row with no pins left is freed. Returns rows freed.
    pub fn unpin(&mut self, id: RowId) -> usize {
        let Some(row) = self.rows.get_mut(id) else {
            return 0;
        };
        row.pins = row.pins.saturating_sub(1);
        if row.pins == 0 && row.parent.is_none() {
            self.release(id)
        } else {
            0
        }
    }

    /// Deep copy of a subtree, detached. Selection is not copied.
    pub(crate) fn clone_subtree(&mut self, src: RowId) -> Option<RowId> {
        let row = self.rows.get(src)?;
        let mut copy = Row::new(
            &row.name,
            &row.raw_label,
            &row.type_name,
            row.kind.clone(),
            row.widget,
        );
        copy.expanded = row.expanded;
        copy.visible = row.visible;
        let children = row.children.clone();
        let id = self.rows.insert(copy);
        for child in children {
            if let Some(c) = self.clone_subtree(child) {
                self.append_child(id, c);
            }
        }
        Some(id)
    }

    /// The current edited value of a subtree, as written back on apply.
    pub fn to_value(&self, id: RowId) -> Value {
        let Some(row) = self.rows.get(id) else {
            return Value::Null;
        };
        match &row.kind {
            RowKind::Leaf(v) => v.clone(),
            RowKind::Struct => Value::Object(self.fields_to_map(id)),
            RowKind::Container { .. } => {
                Value::Array(row.children.iter().map(|c| self.to_value(*c)).collect())
            }
            RowKind::Pointer { concrete, .. } => match concrete {
                None => Value::Null,
                Some(t) => {
                    let mut map = IndexMap::new();
                    map.insert(statics::TYPE_FIELD.to_string(), Value::String(t.clone()));
                    map.extend(self.fields_to_map(id));
                    Value::Object(map)
                }
            },
        }
    }

    fn fields_to_map(&self, id: RowId) -> IndexMap<String, Value> {
        self.children(id)
            .iter()
            .map(|c| (self.rows[*c].name.clone(), self.to_value(*c)))
            .collect()
    }

    /// Flag the row's label for remeasuring and its ancestors for relayout.
    pub(crate) fn mark_label_changed(&mut self, id: RowId) {
        if let Some(row) = self.rows.get_mut(id) {
            row.label_changed = true;
            row.text_width = None;
        }
        self.mark_dirty_upwards(id);
    }

    /// Flag every row under `id` for remeasuring.
    pub(crate) fn mark_subtree_label_changed(&mut self, id: RowId) {
        for d in self.descendants(id) {
            if let Some(row) = self.rows.get_mut(d) {
                row.label_changed = true;
                row.layout_dirty = true;
                row.text_width = None;
            }
        }
    }

    pub(crate) fn mark_dirty_upwards(&mut self, id: RowId) {
        let mut cur = Some(id);
        while let Some(c) = cur {
            let Some(row) = self.rows.get_mut(c) else { break };
            row.layout_dirty = true;
            cur = row.parent;
        }
    }

    /// Force every label to be remeasured (font or style change).
    pub fn invalidate_labels(&mut self) {
        let root = self.root;
        self.mark_subtree_label_changed(root);
        self.mark_dirty_upwards(root);
    }

    pub(crate) fn clear_layout_dirty(&mut self) {
        for row in self.rows.values_mut() {
            row.layout_dirty = false;
        }
    }

    /// True when something changed since the last layout pass.
    pub fn needs_layout(&self) -> bool {
        self.rows[self.root].layout_dirty
    }
}

impl Default for RowTree {
    fn default() -> Self {
        Self::new()
    }
}

//! Tree controller: owns the row tree and drives reconciliation and layout.

use crate::archive::{Inspect, element_name};
use crate::config::TreeConfig;
use crate::error::TreeError;
use crate::geometry::{Direction, Point, Rect};
use crate::layout::{Hit, Layout, Role};
use crate::measure::{Measure, MonospaceMeasure};
use crate::reconcile::{ExemplarCache, ReconcileReport, Reconciler};
use crate::registry::RowRegistry;
use crate::row::{EditorCallback, RowId, RowKind, RowTree};
use crate::statics;
use crate::value::Value;
use indexmap::IndexSet;

/// Receives the rows changed since the last notification.
pub type ChangeListener = Box<dyn FnMut(&[RowId])>;

pub struct TreeController {
    tree: RowTree,
    registry: RowRegistry,
    exemplars: ExemplarCache,
    config: TreeConfig,
    measure: Box<dyn Measure>,
    layout: Layout,
    layout_valid: bool,
    update_depth: usize,
    pending: IndexSet<RowId>,
    listener: Option<ChangeListener>,
    last_report: ReconcileReport,
}

impl TreeController {
    pub fn new(config: TreeConfig) -> Self {
        Self {
            tree: RowTree::new(),
            registry: RowRegistry::with_defaults(),
            exemplars: ExemplarCache::new(),
            config: config.sanitized(),
            measure: Box::new(MonospaceMeasure::default()),
            layout: Layout::default(),
            layout_valid: false,
            update_depth: 0,
            pending: IndexSet::new(),
            listener: None,
            last_report: ReconcileReport::default(),
        }
    }

    pub fn with_registry(mut self, registry: RowRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_measure(mut self, measure: Box<dyn Measure>) -> Self {
        self.measure = measure;
        self.tree.invalidate_labels();
        self
    }

    pub fn tree(&self) -> &RowTree {
        &self.tree
    }

    pub fn registry(&self) -> &RowRegistry {
        &self.registry
    }

    pub fn exemplars(&self) -> &ExemplarCache {
        &self.exemplars
    }

    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: TreeConfig) {
        let config = config.sanitized();
        if config.style != self.config.style {
            self.tree.invalidate_labels();
            self.layout_valid = false;
        }
        self.config = config;
    }

    pub fn last_report(&self) -> &ReconcileReport {
        &self.last_report
    }

    pub fn set_listener(&mut self, listener: Option<ChangeListener>) {
        self.listener = listener;
    }

    /// Rebuild the rows from `object`, reusing rows whose identity matches.
    pub fn revert(&mut self, object: &dyn Inspect) -> &ReconcileReport {
        self.begin_update();
        let report = Reconciler::new(&mut self.tree, &self.registry, &mut self.exemplars)
            .auto_expand_levels(self.config.auto_expand_levels)
            .run(object);
        self.last_report = report;
        let root = self.tree.root();
        self.notify(root);
        self.end_update();
        &self.last_report
    }

    /// Write the edited values back into `object`.
    pub fn apply(&self, object: &mut dyn Inspect) -> Result<(), TreeError> {
        let value = self.tree.to_value(self.tree.root());
        object.apply(&value)?;
        tracing::debug!("applied edited tree");
        Ok(())
    }

    /// Current edited value of the whole tree.
    pub fn value(&self) -> Value {
        self.tree.to_value(self.tree.root())
    }

    pub fn find_path(&self, path: &[&str]) -> Option<RowId> {
        self.tree.find_path(path)
    }

    /// Set a leaf value and report it to the row's editor, if any.
    pub fn set_value(&mut self, id: RowId, value: Value) -> Result<(), TreeError> {
        let path = self.tree.path_of(id);
        let row = self.tree.row_mut(id)?;
        if row.is_read_only() {
            return Err(TreeError::ReadOnly(path));
        }
        let RowKind::Leaf(current) = &mut row.kind else {
            return Err(TreeError::WrongKind {
                name: path,
                expected: "leaf",
            });
        };
        *current = value;
        let editor = row.editor().cloned();
        if let (Some(editor), Some(value)) = (editor, row.value().cloned()) {
            editor(id, &value);
        }
        tracing::debug!(row = %path, "value set");
        self.notify(id);
        Ok(())
    }

    /// Attach or remove an in-place editor. A row with an editor stays alive
    /// while detached until the editor is removed.
    pub fn attach_editor(&mut self, id: RowId, editor: Option<EditorCallback>) -> Result<(), TreeError> {
        let row = self.tree.row_mut(id)?;
        let had = row.editor().is_some();
        let has = editor.is_some();
        row.set_editor(editor);
        match (had, has) {
            (false, true) => {
                self.tree.pin(id);
            }
            (true, false) => {
                self.tree.unpin(id);
            }
            _ => {}
        }
        Ok(())
    }

    pub fn set_expanded(&mut self, id: RowId, expanded: bool) -> Result<(), TreeError> {
        let row = self.tree.row_mut(id)?;
        if row.expanded != expanded {
            row.expanded = expanded;
            self.tree.mark_dirty_upwards(id);
            self.notify(id);
        }
        Ok(())
    }

    pub fn toggle_expanded(&mut self, id: RowId) -> Result<bool, TreeError> {
        let expanded = !self.tree.row(id)?.expanded;
        self.set_expanded(id, expanded)?;
        Ok(expanded)
    }

    pub fn expand_all(&mut self) {
        self.set_all_expanded(true);
    }

    pub fn collapse_all(&mut self) {
        self.set_all_expanded(false);
    }

    fn set_all_expanded(&mut self, expanded: bool) {
        self.batch(|this| {
            let root = this.tree.root();
            for id in this.tree.descendants(root) {
                let Some(row) = this.tree.get_mut(id) else {
                    continue;
                };
                if row.is_composite() && row.expanded != expanded {
                    row.expanded = expanded;
                    this.tree.mark_dirty_upwards(id);
                    this.notify(id);
                }
            }
        });
    }

    /// Select `id`; without `additive` every other row is deselected.
    pub fn select(&mut self, id: RowId, additive: bool) -> Result<(), TreeError> {
        self.tree.row(id)?;
        self.begin_update();
        if !additive {
            for other in self.selected_rows() {
                if other != id {
                    if let Some(row) = self.tree.get_mut(other) {
                        row.selected = false;
                    }
                    self.notify(other);
                }
            }
        }
        if let Some(row) = self.tree.get_mut(id) {
            row.selected = true;
        }
        self.notify(id);
        self.end_update();
        Ok(())
    }

    /// Selected rows in tree order.
    pub fn selected_rows(&self) -> Vec<RowId> {
        self.tree
            .descendants(self.tree.root())
            .into_iter()
            .filter(|id| self.tree.get(*id).is_some_and(|r| r.selected))
            .collect()
    }

    fn editable_container(&self, id: RowId) -> Result<String, TreeError> {
        let path = self.tree.path_of(id);
        let row = self.tree.row(id)?;
        let RowKind::Container {
            element_type,
            fixed_size,
        } = &row.kind
        else {
            return Err(TreeError::WrongKind {
                name: path,
                expected: "container",
            });
        };
        if *fixed_size {
            return Err(TreeError::FixedSize(path));
        }
        if row.is_read_only() {
            return Err(TreeError::ReadOnly(path));
        }
        Ok(element_type.clone())
    }

    /// Append a copy of the element exemplar to a container.
    pub fn add_element(&mut self, container: RowId) -> Result<RowId, TreeError> {
        let element_type = self.editable_container(container)?;
        let exemplar = self
            .exemplars
            .get(&element_type, &element_type)
            .ok_or_else(|| TreeError::NoExemplar(element_type.clone()))?;
        let element = self
            .tree
            .clone_subtree(exemplar)
            .ok_or(TreeError::StaleRow)?;

        let name = element_name(self.tree.children(container).len());
        self.rename(element, &name);
        self.tree.append_child(container, element);
        self.tree.mark_label_changed(element);
        self.tree.mark_subtree_label_changed(element);
        tracing::debug!(container = %self.tree.path_of(container), element = %name, "element added");
        self.notify(container);
        Ok(element)
    }

    /// Remove the `index`-th element; later elements are renumbered.
    pub fn remove_element(&mut self, container: RowId, index: usize) -> Result<(), TreeError> {
        self.editable_container(container)?;
        let children = self.tree.children(container).to_vec();
        let Some(&victim) = children.get(index) else {
            return Err(TreeError::IndexOutOfRange {
                name: self.tree.path_of(container),
                index,
                len: children.len(),
            });
        };
        self.tree.drop_subtree(victim);
        for (i, &child) in children.iter().enumerate().skip(index + 1) {
            self.rename(child, &element_name(i - 1));
        }
        tracing::debug!(container = %self.tree.path_of(container), index, "element removed");
        self.notify(container);
        Ok(())
    }

    /// Rename a container element, keeping a positional label in step.
    fn rename(&mut self, id: RowId, name: &str) {
        let Some(row) = self.tree.get_mut(id) else {
            return;
        };
        let positional = row.raw_label() == row.name();
        row.set_name(name.to_string());
        if positional && row.set_raw_label(name) {
            self.tree.mark_label_changed(id);
        }
    }

    /// Switch a pointer to another concrete type (`None` for null), replacing
    /// its children with a copy of that type's exemplar.
    pub fn set_pointer_type(&mut self, id: RowId, concrete: Option<&str>) -> Result<(), TreeError> {
        let path = self.tree.path_of(id);
        let RowKind::Pointer { base_type, .. } = &self.tree.row(id)?.kind else {
            return Err(TreeError::WrongKind {
                name: path,
                expected: "pointer",
            });
        };
        let base_type = base_type.clone();
        let key = concrete.unwrap_or(statics::NULL_EXEMPLAR);
        let exemplar = self
            .exemplars
            .get(&base_type, key)
            .ok_or_else(|| TreeError::NoExemplar(format!("{base_type}/{key}")))?;

        for old in self.tree.take_children(id) {
            self.tree.drop_subtree(old);
        }
        for child in self.tree.children(exemplar).to_vec() {
            if let Some(copy) = self.tree.clone_subtree(child) {
                self.tree.append_child(id, copy);
            }
        }
        if let Some(row) = self.tree.get_mut(id) {
            row.kind = RowKind::Pointer {
                base_type,
                concrete: concrete.map(str::to_string),
            };
        }
        self.tree.mark_label_changed(id);
        self.tree.mark_subtree_label_changed(id);
        tracing::debug!(row = %path, concrete = key, "pointer type set");
        self.notify(id);
        Ok(())
    }

    pub fn set_validation(&mut self, id: RowId, message: Option<String>) -> Result<(), TreeError> {
        let row = self.tree.row_mut(id)?;
        if row.validation != message {
            row.validation = message;
            self.tree.mark_dirty_upwards(id);
            self.notify(id);
        }
        Ok(())
    }

    /// Hold change notifications until the matching [`Self::end_update`].
    pub fn begin_update(&mut self) {
        self.update_depth += 1;
    }

    /// Release one update lock; the outermost release delivers every row
    /// changed meanwhile in a single notification.
    pub fn end_update(&mut self) {
        if self.update_depth == 0 {
            tracing::warn!("end_update without begin_update");
            return;
        }
        self.update_depth -= 1;
        if self.update_depth == 0 {
            self.flush();
        }
    }

    pub fn batch<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.begin_update();
        let result = f(self);
        self.end_update();
        result
    }

    pub fn is_updating(&self) -> bool {
        self.update_depth > 0
    }

    fn notify(&mut self, id: RowId) {
        self.pending.insert(id);
        if self.update_depth == 0 {
            self.flush();
        }
    }

    fn flush(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let rows: Vec<RowId> = self.pending.drain(..).collect();
        if let Some(listener) = self.listener.as_mut() {
            listener(&rows);
        }
    }

    /// Layout for `width`, recomputed only when the tree changed or the
    /// width differs from the cached one.
    pub fn layout(&mut self, width: i32) -> &Layout {
        if !self.layout_valid || self.tree.needs_layout() || self.layout.width() != width.max(0) {
            self.layout = Layout::compute(
                &mut self.tree,
                &self.config.style,
                self.measure.as_ref(),
                width,
            );
            self.layout_valid = true;
        }
        &self.layout
    }

    /// Layout from the last [`Self::layout`] call.
    pub fn cached_layout(&self) -> &Layout {
        &self.layout
    }

    pub fn hit_test(&self, point: Point) -> Option<Hit> {
        self.layout.hit_test(point)
    }

    pub fn find_rect(&self, id: RowId, role: Role, sub_index: u16) -> Rect {
        self.layout.find_rect(id, role, sub_index)
    }

    pub fn focus_next(&self, current: Option<usize>, direction: Direction, cursor: Point) -> Option<usize> {
        self.layout.find_next_focusable(current, direction, cursor)
    }
}

impl Default for TreeController {
    fn default() -> Self {
        Self::new(TreeConfig::default())
    }
}

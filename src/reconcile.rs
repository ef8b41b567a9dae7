//! Reconciliation of the row tree against a fresh traversal.
//!
//! Each open composite snapshots its previous children and rebuilds its child
//! list in traversal order. A reported field reuses the previous row with the
//! same `(name, declared type)` when there is one, so expansion, selection and
//! attached editors survive updates that keep the shape. Lookups scan the
//! snapshot from a rotating cursor and wrap around: fields reported in the
//! previous order are found on the first probe, reordered ones cost at most
//! one sweep. Rows left in the snapshot when the composite closes are dropped.

use crate::archive::{Archive, ContainerInfo, Field, Inspect, PointerInfo, TypeFactory};
use crate::error::TreeError;
use crate::registry::{RowRegistry, Shape, WidgetSpec};
use crate::row::{Row, RowId, RowKind, RowTree};
use crate::statics;
use crate::value::Value;
use indexmap::IndexMap;
use std::collections::HashMap;

/// Default-value rows per concrete type, used to synthesize container
/// elements and pointer payloads. Rows here are detached and pinned.
#[derive(Debug, Default)]
pub struct ExemplarCache {
    by_base: HashMap<String, IndexMap<String, RowId>>,
}

impl ExemplarCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, base_type: &str, derived_type: &str) -> Option<RowId> {
        self.by_base.get(base_type)?.get(derived_type).copied()
    }

    pub fn contains(&self, base_type: &str, derived_type: &str) -> bool {
        self.get(base_type, derived_type).is_some()
    }

    /// Derived types cached for `base_type`, in registration order.
    pub fn derived_types(&self, base_type: &str) -> Vec<&str> {
        self.by_base
            .get(base_type)
            .map(|m| m.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.by_base.values().map(IndexMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn insert(&mut self, tree: &mut RowTree, base_type: &str, derived_type: &str, row: RowId) {
        tree.pin(row);
        let previous = self
            .by_base
            .entry(base_type.to_string())
            .or_default()
            .insert(derived_type.to_string(), row);
        if let Some(old) = previous {
            tree.unpin(old);
        }
    }

    /// Release every exemplar row.
    pub fn clear(&mut self, tree: &mut RowTree) {
        for (_, map) in self.by_base.drain() {
            for (_, row) in map {
                tree.unpin(row);
            }
        }
    }
}

/// Outcome of one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub created: usize,
    pub reused: usize,
    /// Rows that were not reported again and were detached.
    pub dropped: usize,
    pub exemplars_built: usize,
    /// Snapshot slots inspected while matching fields.
    pub probes: usize,
    /// Malformed-traversal problems; the offending fields were skipped.
    pub errors: Vec<TreeError>,
}

/// Per-composite state while its children are being re-reported.
#[derive(Debug)]
struct Level {
    row: RowId,
    old_rows: Vec<Option<RowId>>,
    cursor: usize,
    depth: usize,
    /// Fields under a rejected composite are ignored until it closes.
    skip: bool,
    changed: bool,
}

pub struct Reconciler<'a> {
    tree: &'a mut RowTree,
    registry: &'a RowRegistry,
    exemplars: &'a mut ExemplarCache,
    auto_expand_levels: usize,
    levels: Vec<Level>,
    building_exemplar: bool,
    report: ReconcileReport,
}

impl<'a> Reconciler<'a> {
    pub fn new(
        tree: &'a mut RowTree,
        registry: &'a RowRegistry,
        exemplars: &'a mut ExemplarCache,
    ) -> Self {
        Self {
            tree,
            registry,
            exemplars,
            auto_expand_levels: 0,
            levels: Vec::new(),
            building_exemplar: false,
            report: ReconcileReport::default(),
        }
    }

    /// Rows created at depth `1..=levels` start expanded.
    pub fn auto_expand_levels(mut self, levels: usize) -> Self {
        self.auto_expand_levels = levels;
        self
    }

    /// Rebuild the children of the tree root from `object`.
    pub fn run(mut self, object: &dyn Inspect) -> ReconcileReport {
        let root = self.tree.root();
        self.begin(root, 0);
        object.inspect(&mut self);
        self.close_dangling_levels();
        self.finish_level();

        let r = &self.report;
        tracing::debug!(
            created = r.created,
            reused = r.reused,
            dropped = r.dropped,
            exemplars = r.exemplars_built,
            probes = r.probes,
            errors = r.errors.len(),
            "reconciliation pass finished"
        );
        self.report
    }

    fn begin(&mut self, row: RowId, depth: usize) {
        let old_rows = self.tree.take_children(row).into_iter().map(Some).collect();
        self.levels.push(Level {
            row,
            old_rows,
            cursor: 0,
            depth,
            skip: false,
            changed: false,
        });
    }

    fn push_skip(&mut self) {
        let (row, depth) = match self.levels.last() {
            Some(level) => (level.row, level.depth + 1),
            None => (self.tree.root(), 1),
        };
        self.levels.push(Level {
            row,
            old_rows: Vec::new(),
            cursor: 0,
            depth,
            skip: true,
            changed: false,
        });
    }

    fn finish_level(&mut self) {
        let Some(level) = self.levels.pop() else {
            return;
        };
        if level.skip {
            return;
        }
        let mut changed = level.changed;
        for id in level.old_rows.into_iter().flatten() {
            tracing::trace!(row = %self.tree.path_of(id), "dropping row not reported again");
            self.tree.drop_subtree(id);
            self.report.dropped += 1;
            changed = true;
        }
        if changed {
            self.tree.mark_dirty_upwards(level.row);
        }
    }

    fn close_dangling_levels(&mut self) {
        if self.levels.len() > 1 {
            let err = TreeError::UnclosedComposite {
                open: self.levels.len() - 1,
            };
            tracing::error!(%err, "malformed traversal");
            self.report.errors.push(err);
            while self.levels.len() > 1 {
                self.finish_level();
            }
        }
    }

    /// Find and claim the previous row with this identity.
    fn take_match(&mut self, name: &str, type_name: &str) -> Option<(RowId, usize)> {
        let level = self.levels.last_mut()?;
        let n = level.old_rows.len();
        for step in 0..n {
            let i = (level.cursor + step) % n;
            self.report.probes += 1;
            let Some(id) = level.old_rows[i] else {
                continue;
            };
            let Some(row) = self.tree.get(id) else {
                continue;
            };
            if row.name() == name && row.type_name() == type_name {
                level.old_rows[i] = None;
                level.cursor = (i + 1) % n;
                return Some((id, i));
            }
        }
        None
    }

    /// Place the row for `field` under the current composite, reusing the
    /// previous row when the identity matches. `None` when the field is skipped.
    fn enter(&mut self, field: Field<'_>, kind: RowKind) -> Option<(RowId, usize)> {
        let level = self.levels.last()?;
        if level.skip {
            return None;
        }
        let parent = level.row;
        let depth = level.depth + 1;

        if field.name.is_empty() {
            let err = TreeError::EmptyName {
                parent: self.tree.path_of(parent),
            };
            tracing::error!(%err, type_name = field.type_name, "malformed traversal, skipping field");
            self.report.errors.push(err);
            return None;
        }

        let label = field.display_label();
        let position = self.tree.children(parent).len();
        let (id, fresh, moved) = match self.take_match(field.name, field.type_name) {
            Some((id, old_index)) => {
                self.report.reused += 1;
                let row = self.tree.get_mut(id)?;
                let label_changed = row.set_raw_label(label);
                let shape_changed = !matches!(kind, RowKind::Leaf(_)) && row.kind != kind;
                row.kind = kind;
                if label_changed {
                    self.tree.mark_label_changed(id);
                } else if shape_changed {
                    self.tree.mark_dirty_upwards(id);
                }
                (id, false, old_index != position)
            }
            None => {
                let widget = self.registry.resolve(field.type_name, kind.shape());
                let mut row = Row::new(field.name, label, field.type_name, kind, widget);
                if depth <= self.auto_expand_levels {
                    row.expanded = true;
                }
                self.report.created += 1;
                (self.tree.insert(row), true, true)
            }
        };

        self.tree.append_child(parent, id);
        if fresh {
            self.tree.mark_label_changed(id);
            self.tree.mark_subtree_label_changed(id);
        }
        if let Some(level) = self.levels.last_mut() {
            level.changed |= moved;
        }
        Some((id, depth))
    }

    fn enter_composite(&mut self, field: Field<'_>, kind: RowKind) -> Option<(RowId, usize)> {
        let entered = self.enter(field, kind);
        if entered.is_none() {
            self.push_skip();
        }
        entered
    }

    /// Run a throwaway traversal into `holder` without disturbing the
    /// levels of the pass in progress.
    fn nested_pass(&mut self, holder: RowId, depth: usize, f: impl FnOnce(&mut Self)) {
        let saved = std::mem::take(&mut self.levels);
        let was_building = std::mem::replace(&mut self.building_exemplar, true);
        self.begin(holder, depth);
        f(self);
        self.close_dangling_levels();
        self.finish_level();
        self.building_exemplar = was_building;
        self.levels = saved;
    }

    fn build_container_exemplar(
        &mut self,
        element_type: &str,
        depth: usize,
        exemplar: &mut dyn FnMut(&mut dyn Archive),
    ) {
        let holder = self.tree.insert(Row::new(
            "",
            "",
            statics::TAG_OBJECT,
            RowKind::Struct,
            WidgetSpec::fallback(Shape::Struct),
        ));
        self.nested_pass(holder, depth, |this| exemplar(this));

        match self.tree.children(holder).first().copied() {
            Some(row) => {
                self.tree.detach(row);
                self.exemplars
                    .insert(&mut *self.tree, element_type, element_type, row);
                self.report.exemplars_built += 1;
                tracing::debug!(element_type, "built container exemplar");
            }
            None => {
                tracing::warn!(element_type, "container exemplar callback reported no element");
            }
        }
        self.tree.drop_subtree(holder);
    }

    fn ensure_pointer_exemplars(&mut self, base_type: &str, depth: usize, factory: &dyn TypeFactory) {
        let widget = self.registry.resolve(base_type, Shape::Pointer);
        if !self.exemplars.contains(base_type, statics::NULL_EXEMPLAR) {
            let null_row = self.tree.insert(Row::new(
                "",
                "",
                base_type,
                RowKind::Pointer {
                    base_type: base_type.to_string(),
                    concrete: None,
                },
                widget,
            ));
            self.exemplars
                .insert(&mut *self.tree, base_type, statics::NULL_EXEMPLAR, null_row);
        }
        for concrete in factory.concrete_types() {
            if self.exemplars.contains(base_type, &concrete) {
                continue;
            }
            let row = self.tree.insert(Row::new(
                "",
                "",
                base_type,
                RowKind::Pointer {
                    base_type: base_type.to_string(),
                    concrete: Some(concrete.clone()),
                },
                widget,
            ));
            self.nested_pass(row, depth, |this| factory.exemplar(&concrete, this));
            self.exemplars
                .insert(&mut *self.tree, base_type, &concrete, row);
            self.report.exemplars_built += 1;
            tracing::debug!(base_type, concrete = %concrete, "built pointer exemplar");
        }
    }
}

impl Archive for Reconciler<'_> {
    fn value(&mut self, field: Field<'_>, value: Value) {
        self.enter(field, RowKind::Leaf(value));
    }

    fn open_struct(&mut self, field: Field<'_>) {
        if let Some((id, depth)) = self.enter_composite(field, RowKind::Struct) {
            self.begin(id, depth);
        }
    }

    fn open_container(
        &mut self,
        field: Field<'_>,
        info: ContainerInfo<'_>,
        exemplar: &mut dyn FnMut(&mut dyn Archive),
    ) {
        let kind = RowKind::Container {
            element_type: info.element_type.to_string(),
            fixed_size: info.fixed_size,
        };
        let Some((id, depth)) = self.enter_composite(field, kind) else {
            return;
        };
        if !self.building_exemplar
            && !self.exemplars.contains(info.element_type, info.element_type)
        {
            self.build_container_exemplar(info.element_type, depth + 1, exemplar);
        }
        self.begin(id, depth);
    }

    fn open_pointer(&mut self, field: Field<'_>, info: PointerInfo<'_>, factory: &dyn TypeFactory) {
        let kind = RowKind::Pointer {
            base_type: info.base_type.to_string(),
            concrete: info.concrete.map(str::to_string),
        };
        let Some((id, depth)) = self.enter_composite(field, kind) else {
            return;
        };
        if !self.building_exemplar {
            self.ensure_pointer_exemplars(info.base_type, depth, factory);
        }
        self.begin(id, depth);
    }

    fn close(&mut self) {
        if self.levels.len() <= 1 {
            let err = TreeError::UnbalancedClose;
            tracing::error!(%err, "malformed traversal");
            self.report.errors.push(err);
            return;
        }
        self.finish_level();
    }
}

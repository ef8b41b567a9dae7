//! Structural pass: visible rows to layout elements.

use super::{ElementKind, Focus, Layout, LayoutElement, Role};
use crate::config::TreeStyle;
use crate::measure::Measure;
use crate::registry::WidgetPlacement;
use crate::row::{RowId, RowKind, RowTree};
use crate::statics;

impl LayoutElement {
    fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }

    fn with_focus(mut self, focus: Focus) -> Self {
        self.focus = focus;
        self
    }

    fn with_sub_index(mut self, sub_index: u16) -> Self {
        self.sub_index = sub_index;
        self
    }
}

fn inlined_priority(k: usize) -> u8 {
    u8::try_from(k.saturating_add(2)).unwrap_or(u8::MAX)
}

pub(super) struct Builder<'a> {
    layout: &'a mut Layout,
    tree: &'a mut RowTree,
    style: &'a TreeStyle,
    measure: &'a dyn Measure,
    line_height: i32,
}

impl<'a> Builder<'a> {
    pub(super) fn new(
        layout: &'a mut Layout,
        tree: &'a mut RowTree,
        style: &'a TreeStyle,
        measure: &'a dyn Measure,
    ) -> Self {
        Self {
            layout,
            tree,
            style,
            measure,
            line_height: style.line_height(),
        }
    }

    pub(super) fn run(mut self) {
        let root = self
            .layout
            .push_container(LayoutElement::new(ElementKind::VerticalBox, Role::Root, None));
        let root_row = self.tree.root();
        self.emit_children(root, root_row, 1);
    }

    fn add_leaf(&mut self, parent: usize, mut element: LayoutElement, width: i32) -> usize {
        element.min = [width.max(0), self.line_height];
        let index = self.layout.push(element);
        self.layout.add_child(parent, index);
        index
    }

    fn add_container(&mut self, parent: usize, element: LayoutElement) -> usize {
        let index = self.layout.push_container(element);
        self.layout.add_child(parent, index);
        index
    }

    /// Visible children of `id` that get their own line.
    fn line_children(&self, id: RowId) -> Vec<RowId> {
        self.tree
            .children(id)
            .iter()
            .copied()
            .filter(|c| self.tree.get(*c).is_some_and(|r| r.visible && !r.is_inlined()))
            .collect()
    }

    /// Visible children of `id` folded into its strip.
    fn inlined_children(&self, id: RowId) -> Vec<RowId> {
        self.tree
            .children(id)
            .iter()
            .copied()
            .filter(|c| self.tree.get(*c).is_some_and(|r| r.visible && r.is_inlined()))
            .collect()
    }

    fn packable(&self, id: RowId) -> bool {
        self.tree
            .get(id)
            .is_some_and(|r| r.is_checkbox() && r.validation.is_none())
    }

    fn emit_children(&mut self, list: usize, parent: RowId, depth: usize) {
        let pack = self.style.pack_checkboxes
            || self
                .tree
                .get(parent)
                .is_some_and(|r| r.flags().pack_checkboxes);
        let rows = self.line_children(parent);

        let mut i = 0;
        while i < rows.len() {
            if pack {
                let run = rows[i..].iter().take_while(|r| self.packable(**r)).count();
                if run >= statics::PACK_MIN_RUN {
                    let columns = self.add_container(
                        list,
                        LayoutElement::new(ElementKind::Columns, Role::CheckboxColumns, None),
                    );
                    for row in &rows[i..i + run] {
                        self.emit_row(columns, *row, depth);
                    }
                    i += run;
                    continue;
                }
            }
            self.emit_row(list, rows[i], depth);
            i += 1;
        }
    }

    fn emit_row(&mut self, list: usize, id: RowId, depth: usize) {
        let Some(row) = self.tree.get(id) else {
            return;
        };
        let flags = row.flags();
        let expanded = row.expanded;
        let validation = row.validation.clone().filter(|v| !v.is_empty());
        let compact_top = self.style.compact && depth == 1;
        let has_children =
            row.is_composite() && !flags.hide_children && !self.line_children(id).is_empty();
        let open = has_children && (expanded || compact_top);

        let area = self.add_container(
            list,
            LayoutElement::new(ElementKind::HorizontalBox, Role::RowArea, Some(id))
                .with_focus(Focus::Forward),
        );
        self.layout.row_first_element.insert(id, area);

        if !compact_top {
            let role = if has_children { Role::Toggle } else { Role::Indent };
            self.add_leaf(
                area,
                LayoutElement::new(ElementKind::Fixed, role, Some(id)),
                self.style.first_level_indent,
            );
        }
        self.emit_strip(area, id, None);

        if let Some(text) = validation {
            let mut bubble = LayoutElement::new(ElementKind::HeightByWidth, Role::Validation, Some(id))
                .with_priority(1);
            bubble.text = Some(text);
            self.add_leaf(list, bubble, 0);
        }

        if open {
            let content = self.add_container(
                list,
                LayoutElement::new(ElementKind::HorizontalBox, Role::ContentArea, Some(id)),
            );
            self.add_leaf(
                content,
                LayoutElement::new(ElementKind::Fixed, Role::Indent, Some(id)),
                self.style.level_indent,
            );
            let children = self.add_container(
                content,
                LayoutElement::new(ElementKind::VerticalBox, Role::ChildList, Some(id)),
            );
            self.emit_children(children, id, depth + 1);
        }
    }

    /// Label and widgets of `id` plus those of its inlined children.
    /// `inlined` carries the priority of an inlined row's whole strip.
    fn emit_strip(&mut self, area: usize, id: RowId, inlined: Option<u8>) {
        let Some(row) = self.tree.get(id) else {
            return;
        };
        let spec = row.widget;
        let flags = row.flags();
        let add_button = matches!(row.kind, RowKind::Container { fixed_size: false, .. })
            && !flags.read_only;
        let placement = if flags.full_row {
            WidgetPlacement::InsteadOfText
        } else {
            spec.placement
        };
        let (widget_priority, label_priority) = inlined.map_or((0, 1), |p| (p, p));
        let child_priority = |k: usize| inlined.unwrap_or_else(|| inlined_priority(k));

        if inlined.is_some() {
            let first = self.layout.elements.len();
            self.layout.row_first_element.insert(id, first);
        }

        let folded = self.inlined_children(id);
        let (before, after): (Vec<_>, Vec<_>) = folded
            .iter()
            .copied()
            .enumerate()
            .partition(|(_, c)| self.tree.get(*c).is_some_and(|r| r.is_inlined_before()));
        for (k, child) in before {
            self.emit_strip(area, child, Some(child_priority(k)));
        }

        let widget = |kind| {
            LayoutElement::new(kind, Role::Widget, Some(id))
                .with_focus(Focus::Focusable)
                .with_priority(widget_priority)
        };
        let label = |kind, focus| {
            LayoutElement::new(kind, Role::Label, Some(id))
                .with_focus(focus)
                .with_priority(label_priority)
        };
        match placement {
            WidgetPlacement::None => {
                let w = self.label_width(id);
                self.add_leaf(area, label(ElementKind::Expanding, Focus::Focusable), w);
            }
            WidgetPlacement::Icon => {
                self.add_leaf(area, widget(ElementKind::Fixed), spec.min_width);
                let w = self.label_width(id);
                self.add_leaf(area, label(ElementKind::Expanding, Focus::None), w);
            }
            WidgetPlacement::AfterName => {
                let w = self.label_width(id);
                self.add_leaf(area, label(ElementKind::Fixed, Focus::None), w);
                self.add_leaf(area, widget(ElementKind::Fixed), spec.min_width);
            }
            WidgetPlacement::Value => {
                let w = self.label_width(id);
                self.add_leaf(area, label(ElementKind::ExpandingMagnet, Focus::None), w);
                self.add_leaf(area, widget(ElementKind::Expanding), spec.min_width);
            }
            WidgetPlacement::AfterInlined => {
                let w = self.label_width(id);
                self.add_leaf(area, label(ElementKind::Expanding, Focus::None), w);
            }
            WidgetPlacement::InsteadOfText => {
                self.add_leaf(area, widget(ElementKind::Expanding), spec.min_width);
            }
        }

        for (k, child) in after {
            self.emit_strip(area, child, Some(child_priority(k)));
        }
        if placement == WidgetPlacement::AfterInlined {
            self.add_leaf(area, widget(ElementKind::Fixed), spec.min_width);
        }
        if add_button {
            self.add_leaf(
                area,
                widget(ElementKind::Fixed).with_sub_index(1),
                statics::ADD_BUTTON_WIDTH,
            );
        }
    }

    /// Minimal label width, remeasuring the text only when it changed.
    fn label_width(&mut self, id: RowId) -> i32 {
        let padding = self.style.label_padding;
        let measure = self.measure;
        let Some(row) = self.tree.get_mut(id) else {
            return 0;
        };
        let text = match row.text_width {
            Some(w) if !row.label_changed => w,
            _ => {
                let w = measure.text_width(row.label());
                row.text_width = Some(w);
                row.label_changed = false;
                w
            }
        };
        text + 2 * padding
    }
}

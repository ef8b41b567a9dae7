//! Hit testing, rectangle lookup and keyboard focus traversal.

use super::{Focus, Layout, LayoutElement, Role};
use crate::geometry::{Direction, Point, Rect};
use crate::row::RowId;

/// Element under a point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hit {
    pub element: usize,
    pub row: RowId,
    pub role: Role,
    pub sub_index: u16,
}

fn is_focus_target(e: &LayoutElement) -> bool {
    e.focus == Focus::Focusable && !e.rect.is_empty()
}

/// Distance from `v` to the half-open span `[start, end)`.
fn span_distance(v: i32, start: i32, end: i32) -> i32 {
    if v < start {
        start - v
    } else if v >= end {
        v - end + 1
    } else {
        0
    }
}

impl Layout {
    /// Deepest element showing a row that contains `point`.
    pub fn hit_test(&self, point: Point) -> Option<Hit> {
        self.elements.iter().enumerate().rev().find_map(|(i, e)| {
            let row = e.row?;
            e.rect.contains(point).then_some(Hit {
                element: i,
                row,
                role: e.role,
                sub_index: e.sub_index,
            })
        })
    }

    /// Rectangle of the `role`/`sub_index` element of `row`; empty when the
    /// row is not laid out or has no such element.
    pub fn find_rect(&self, row: RowId, role: Role, sub_index: u16) -> Rect {
        let Some(start) = self.first_element(row) else {
            return Rect::default();
        };
        for e in self.elements.iter().skip(start) {
            let own = e.row == Some(row);
            if own && e.role == role && e.sub_index == sub_index {
                return e.rect;
            }
            if (!own && e.role == Role::RowArea) || (own && e.role == Role::ContentArea) {
                break;
            }
        }
        Rect::default()
    }

    /// Element that takes focus when `element` is focused.
    pub fn resolve_focus(&self, element: usize) -> Option<usize> {
        let e = self.elements.get(element)?;
        match e.focus {
            Focus::Focusable => Some(element),
            Focus::None => None,
            Focus::Forward => self
                .children(element)
                .iter()
                .find_map(|&c| self.resolve_focus(c)),
        }
    }

    /// First focusable element of `row`.
    pub fn focus_row(&self, row: RowId) -> Option<usize> {
        self.resolve_focus(self.first_element(row)?)
    }

    /// Next element to focus from `current` when moving in `direction`.
    ///
    /// Spatial moves pick the nearest focusable element strictly beyond the
    /// current rectangle, preferring the one whose span across the direction
    /// of travel is closest to `cursor`. `Next`/`Prev` follow emission order.
    pub fn find_next_focusable(
        &self,
        current: Option<usize>,
        direction: Direction,
        cursor: Point,
    ) -> Option<usize> {
        let forward = direction.is_forward();
        let Some(axis) = direction.axis() else {
            return if forward {
                let from = current.map_or(0, |c| c + 1);
                (from..self.elements.len()).find(|&i| is_focus_target(&self.elements[i]))
            } else {
                let to = current.unwrap_or(self.elements.len()).min(self.elements.len());
                (0..to).rev().find(|&i| is_focus_target(&self.elements[i]))
            };
        };

        let Some(from) = current.and_then(|c| self.elements.get(c)).map(|e| e.rect) else {
            let mut targets = (0..self.elements.len()).filter(|&i| is_focus_target(&self.elements[i]));
            return if forward { targets.next() } else { targets.last() };
        };
        let across = axis.cross();
        let along = cursor.along(across);

        self.elements
            .iter()
            .enumerate()
            .filter(|(i, e)| Some(*i) != current && is_focus_target(e))
            .filter_map(|(i, e)| {
                let gap = if forward {
                    e.rect.start(axis) - from.end(axis)
                } else {
                    from.start(axis) - e.rect.end(axis)
                };
                (gap >= 0).then(|| {
                    let distance = span_distance(along, e.rect.start(across), e.rect.end(across));
                    ((gap, distance, i), i)
                })
            })
            .min_by_key(|(key, _)| *key)
            .map(|(_, i)| i)
    }
}

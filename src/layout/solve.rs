//! Sizing and placement passes.

use super::{ElementKind, Layout};
use crate::geometry::Axis;
use crate::measure::Measure;

/// Sizing input of one child along a container's main axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Item {
    pub min: i32,
    pub priority: u8,
    pub kind: ElementKind,
}

impl Layout {
    pub(super) fn solve(&mut self, measure: &dyn Measure) {
        if self.elements.is_empty() {
            return;
        }
        for axis in Axis::BOTH {
            self.measure_axis(axis, measure);
            self.place_root(axis);
            self.place_axis(axis);
        }
    }

    /// Bottom-up minimal sizes along `axis`.
    fn measure_axis(&mut self, axis: Axis, measure: &dyn Measure) {
        for i in (0..self.elements.len()).rev() {
            let min = match self.elements[i].kind {
                ElementKind::HeightByWidth if axis == Axis::Vertical => {
                    let element = &self.elements[i];
                    element
                        .text
                        .as_deref()
                        .map_or(0, |t| measure.wrapped_height(t, element.rect.width))
                }
                ElementKind::Columns if axis == Axis::Vertical => self.measure_columns(i),
                kind if kind.is_container() => self.container_min(i, axis),
                _ => continue,
            };
            self.elements[i].min[axis.index()] = min;
        }
    }

    fn container_min(&self, i: usize, axis: Axis) -> i32 {
        let kind = self.elements[i].kind;
        // Collapsible children of a vertical list do not widen it.
        let list_width = axis == Axis::Horizontal && kind.main_axis() == Some(Axis::Vertical);
        let mut sum = 0;
        let mut max = 0;
        for &c in self.children(i) {
            debug_assert!(c < self.elements.len(), "dangling child {c} of element {i}");
            let Some(child) = self.elements.get(c) else {
                continue;
            };
            let m = child.min[axis.index()];
            sum += m;
            if !(list_width && child.priority > 0) {
                max = max.max(m);
            }
        }
        if kind.main_axis() == Some(axis) { sum } else { max }
    }

    fn place_root(&mut self, axis: Axis) {
        let length = match axis {
            Axis::Horizontal => self.width,
            Axis::Vertical => self.elements[0].min_height(),
        };
        self.elements[0].rect.set_span(axis, 0, length);
    }

    /// Top-down placement along `axis`.
    fn place_axis(&mut self, axis: Axis) {
        for i in 0..self.elements.len() {
            let kind = self.elements[i].kind;
            if !kind.is_container() {
                continue;
            }
            match (kind, axis) {
                (ElementKind::Columns, Axis::Horizontal) => self.place_columns_h(i),
                (ElementKind::Columns, Axis::Vertical) => self.place_columns_v(i),
                _ if kind.main_axis() == Some(axis) => self.distribute_children(i, axis),
                _ => self.stretch_children(i, axis),
            }
        }
    }

    /// Valid child indices of `i`.
    pub(super) fn child_indices(&self, i: usize) -> Vec<usize> {
        self.children(i)
            .iter()
            .copied()
            .filter(|c| {
                debug_assert!(*c < self.elements.len(), "dangling child {c} of element {i}");
                *c < self.elements.len()
            })
            .collect()
    }

    fn stretch_children(&mut self, i: usize, axis: Axis) {
        let rect = self.elements[i].rect;
        for c in self.child_indices(i) {
            self.elements[c]
                .rect
                .set_span(axis, rect.start(axis), rect.length(axis));
        }
    }

    fn distribute_children(&mut self, i: usize, axis: Axis) {
        let rect = self.elements[i].rect;
        let children = self.child_indices(i);
        let items: Vec<Item> = children
            .iter()
            .map(|&c| {
                let e = &self.elements[c];
                Item {
                    min: e.min_size(axis),
                    priority: e.priority,
                    kind: e.kind,
                }
            })
            .collect();
        let magnet = (axis == Axis::Horizontal).then_some(self.magnet_x);
        let sizes = distribute(&items, rect.start(axis), rect.length(axis), magnet);

        let mut cursor = rect.start(axis);
        for (c, size) in children.into_iter().zip(sizes) {
            self.elements[c].rect.set_span(axis, cursor, size);
            cursor += size;
        }
    }
}

/// Split `available` pixels among `items` laid end to end from `start`.
///
/// Priority tiers are filled in increasing order. The first tier that does
/// not fit gets a water-filled share of what is left and every later tier
/// collapses to zero. When everything fits, magnet elements grow until they
/// end at `magnet`. The rest is shared evenly by the priority-0 growing
/// elements behind the last magnet, or by that magnet alone when there are
/// none. Odd pixels go to the earliest members.
pub(crate) fn distribute(items: &[Item], start: i32, available: i32, magnet: Option<i32>) -> Vec<i32> {
    let mut sizes = vec![0; items.len()];
    let mut tiers: Vec<u8> = items.iter().map(|it| it.priority).collect();
    tiers.sort_unstable();
    tiers.dedup();

    let mut remaining = available.max(0);
    for tier in tiers {
        let members: Vec<usize> = (0..items.len())
            .filter(|&k| items[k].priority == tier)
            .collect();
        let total: i32 = members.iter().map(|&k| items[k].min.max(0)).sum();
        if total > remaining {
            water_fill(items, &members, remaining, &mut sizes);
            return sizes;
        }
        for &k in &members {
            sizes[k] = items[k].min.max(0);
        }
        remaining -= total;
    }

    if remaining > 0 {
        grow(items, start, magnet, remaining, &mut sizes);
    }
    sizes
}

/// Largest common cap such that the capped minimums fit in `remaining`.
fn water_fill(items: &[Item], members: &[usize], remaining: i32, sizes: &mut [i32]) {
    let fill = |level: i32| -> i32 {
        members
            .iter()
            .map(|&k| items[k].min.max(0).min(level))
            .sum()
    };
    let (mut lo, mut hi) = (0, members.iter().map(|&k| items[k].min).max().unwrap_or(0).max(0));
    while lo < hi {
        let mid = lo + (hi - lo + 1) / 2;
        if fill(mid) <= remaining {
            lo = mid;
        } else {
            hi = mid - 1;
        }
    }
    let mut extra = remaining - fill(lo);
    for &k in members {
        let min = items[k].min.max(0);
        sizes[k] = min.min(lo);
        if min > lo && extra > 0 {
            sizes[k] += 1;
            extra -= 1;
        }
    }
}

fn grow(items: &[Item], start: i32, magnet: Option<i32>, mut leftover: i32, sizes: &mut [i32]) {
    let last_magnet = items
        .iter()
        .rposition(|it| it.kind == ElementKind::ExpandingMagnet);
    if let Some(magnet) = magnet {
        let mut pos = start;
        for (k, item) in items.iter().enumerate() {
            if item.kind == ElementKind::ExpandingMagnet && leftover > 0 {
                let extra = (magnet - (pos + sizes[k])).clamp(0, leftover);
                sizes[k] += extra;
                leftover -= extra;
            }
            pos += sizes[k];
        }
    }
    if leftover <= 0 {
        return;
    }

    // Anything in front of a magnet stays put once the magnet is sized.
    let first = last_magnet.map_or(0, |k| k + 1);
    let plain: Vec<usize> = (first..items.len())
        .filter(|&k| items[k].priority == 0 && items[k].kind.grows())
        .collect();
    let sharers: Vec<usize> = if plain.is_empty() {
        last_magnet
            .filter(|&k| items[k].priority == 0)
            .into_iter()
            .collect()
    } else {
        plain
    };
    if sharers.is_empty() {
        return;
    }
    let n = sharers.len() as i32;
    let share = leftover / n;
    let odd = (leftover % n) as usize;
    for (j, &k) in sharers.iter().enumerate() {
        sizes[k] += share + i32::from(j < odd);
    }
}

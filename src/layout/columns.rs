//! Multi-column packing of checkbox runs.

use super::Layout;
use crate::geometry::Axis;
use crate::statics;

/// One column of a packed list: children `start..end` of the container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Column {
    pub start: usize,
    pub end: usize,
    pub left: i32,
    pub width: i32,
}

/// Number of equal-width columns that fit `width`.
pub fn column_count(width: i32, widest_child: i32, children: usize) -> usize {
    if children == 0 {
        return 0;
    }
    let fit = if widest_child > 0 {
        usize::try_from(width / widest_child).unwrap_or(0)
    } else {
        statics::MAX_COLUMNS
    };
    fit.clamp(1, statics::MAX_COLUMNS).min(children)
}

/// Split `heights` into `columns` contiguous non-empty runs of similar total
/// height. Returns `columns + 1` boundaries, first 0 and last `heights.len()`.
///
/// A greedy pass picks the initial boundaries; each inner boundary is then
/// moved within a small window and the combination with the least squared
/// deviation from an even split wins.
pub fn split_columns(heights: &[i32], columns: usize) -> Vec<usize> {
    let len = heights.len();
    if len == 0 {
        return vec![0; columns.max(1) + 1];
    }
    let n = columns.clamp(1, len);
    let total: i64 = heights.iter().map(|h| i64::from(*h)).sum();
    let target = total as f64 / n as f64;

    let mut bounds = vec![0usize];
    let mut acc = 0i64;
    for (k, h) in heights.iter().enumerate() {
        let h = i64::from(*h);
        let open = n - bounds.len();
        let must_break = len - k <= open;
        if open > 0 && k > bounds[bounds.len() - 1] && ((acc + h) as f64 > target || must_break) {
            bounds.push(k);
            acc = 0;
        }
        acc += h;
    }
    bounds.push(len);

    let mut prefix = Vec::with_capacity(len + 1);
    prefix.push(0i64);
    for h in heights {
        prefix.push(prefix[prefix.len() - 1] + i64::from(*h));
    }
    let cost = |b: &[usize]| -> f64 {
        b.windows(2)
            .map(|w| (prefix[w[1]] - prefix[w[0]]) as f64 - target)
            .map(|d| d * d)
            .sum()
    };

    let radius = statics::SPLIT_SEARCH_RADIUS;
    let window = (2 * radius + 1) as usize;
    let combos = window.pow((n - 1) as u32);
    let mut best = bounds.clone();
    let mut best_cost = cost(&bounds);
    let mut candidate = bounds.clone();
    for combo in 0..combos {
        let mut code = combo;
        let mut valid = true;
        for j in 1..n {
            let offset = (code % window) as isize - radius;
            code /= window;
            let b = bounds[j] as isize + offset;
            if b <= 0 || b >= len as isize {
                valid = false;
                break;
            }
            candidate[j] = b as usize;
        }
        if !valid || !candidate.windows(2).all(|w| w[0] < w[1]) {
            continue;
        }
        let c = cost(&candidate);
        if c < best_cost {
            best_cost = c;
            best.copy_from_slice(&candidate);
        }
    }
    best
}

impl Layout {
    /// Equal-width columns; every child starts in the first one until the
    /// split is known.
    pub(super) fn place_columns_h(&mut self, i: usize) {
        let rect = self.elements[i].rect;
        let children = self.child_indices(i);
        let widest = children
            .iter()
            .map(|&c| self.elements[c].min_width())
            .max()
            .unwrap_or(0);
        let n = column_count(rect.width, widest, children.len());
        let width = if n > 0 { rect.width / n as i32 } else { 0 };

        self.elements[i].columns = (0..n)
            .map(|c| Column {
                start: 0,
                end: 0,
                left: rect.x + c as i32 * width,
                width,
            })
            .collect();
        for c in children {
            self.elements[c].rect.set_span(Axis::Horizontal, rect.x, width);
        }
    }

    /// Decide the split from the children's heights and move each child to
    /// its column. Returns the height of the tallest column.
    pub(super) fn measure_columns(&mut self, i: usize) -> i32 {
        let x = self.elements[i].rect.x;
        let children = self.child_indices(i);
        let n = self.elements[i].columns.len();
        if n == 0 || children.is_empty() {
            return 0;
        }
        let heights: Vec<i32> = children
            .iter()
            .map(|&c| self.elements[c].min_height())
            .collect();
        let bounds = split_columns(&heights, n);

        let mut tallest = 0;
        for (c, w) in bounds.windows(2).enumerate() {
            let Some(column) = self.elements[i].columns.get_mut(c) else {
                break;
            };
            column.start = w[0];
            column.end = w[1];
            let dx = column.left - x;
            for &child in &children[w[0]..w[1]] {
                self.shift_subtree(child, dx);
            }
            tallest = tallest.max(heights[w[0]..w[1]].iter().sum());
        }
        tallest
    }

    pub(super) fn place_columns_v(&mut self, i: usize) {
        let rect = self.elements[i].rect;
        let children = self.child_indices(i);
        let columns = self.elements[i].columns.clone();
        for column in columns {
            let mut y = rect.y;
            for &child in children.get(column.start..column.end).unwrap_or(&[]) {
                let h = self.elements[child].min_height();
                self.elements[child].rect.set_span(Axis::Vertical, y, h);
                y += h;
            }
        }
    }

    fn shift_subtree(&mut self, root: usize, dx: i32) {
        if dx == 0 {
            return;
        }
        let mut stack = vec![root];
        while let Some(e) = stack.pop() {
            self.elements[e].rect.x += dx;
            stack.extend(self.child_indices(e));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{column_count, split_columns};

    fn sums(heights: &[i32], bounds: &[usize]) -> Vec<i32> {
        bounds
            .windows(2)
            .map(|w| heights[w[0]..w[1]].iter().sum())
            .collect()
    }

    #[test]
    fn column_count_is_bounded() {
        assert_eq!(column_count(300, 100, 8), 3);
        assert_eq!(column_count(50, 100, 8), 1);
        assert_eq!(column_count(10_000, 100, 8), 4);
        assert_eq!(column_count(10_000, 100, 2), 2);
        assert_eq!(column_count(100, 0, 0), 0);
    }

    #[test]
    fn equal_rows_split_evenly() {
        let heights = [22; 8];
        let bounds = split_columns(&heights, 3);
        assert_eq!(bounds.len(), 4);
        let s = sums(&heights, &bounds);
        let (min, max) = (s.iter().min().unwrap(), s.iter().max().unwrap());
        assert!(max - min <= 22, "{s:?}");
    }

    #[test]
    fn search_improves_on_greedy_guess() {
        // The greedy guess is [30, 40, 80].
        let heights = [10, 10, 10, 40, 40, 40];
        let bounds = split_columns(&heights, 3);
        assert_eq!(sums(&heights, &bounds), vec![70, 40, 40]);
    }

    #[test]
    fn every_column_is_non_empty() {
        let heights = [100, 1, 1, 1];
        let bounds = split_columns(&heights, 4);
        assert_eq!(bounds, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn single_column_takes_everything() {
        assert_eq!(split_columns(&[5, 5, 5], 1), vec![0, 3]);
    }
}

//! Pixel geometry primitives shared by the layout engine and its queries.

/// A point in pixel coordinates (origin at the top-left of the tree area).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Coordinate along `axis`.
    #[inline]
    pub const fn along(&self, axis: Axis) -> i32 {
        match axis {
            Axis::Horizontal => self.x,
            Axis::Vertical => self.y,
        }
    }
}

/// A rectangle for layout bounds and hit testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    /// Left edge (inclusive).
    pub x: i32,
    /// Top edge (inclusive).
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    #[inline]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Right edge (exclusive).
    #[inline]
    pub const fn right(&self) -> i32 {
        self.x + self.width
    }

    /// Bottom edge (exclusive).
    #[inline]
    pub const fn bottom(&self) -> i32 {
        self.y + self.height
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    #[inline]
    pub const fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x < self.right() && p.y >= self.y && p.y < self.bottom()
    }

    /// Start coordinate along `axis`.
    #[inline]
    pub const fn start(&self, axis: Axis) -> i32 {
        match axis {
            Axis::Horizontal => self.x,
            Axis::Vertical => self.y,
        }
    }

    /// Extent along `axis`.
    #[inline]
    pub const fn length(&self, axis: Axis) -> i32 {
        match axis {
            Axis::Horizontal => self.width,
            Axis::Vertical => self.height,
        }
    }

    /// End coordinate (exclusive) along `axis`.
    #[inline]
    pub const fn end(&self, axis: Axis) -> i32 {
        self.start(axis) + self.length(axis)
    }

    /// Replace the span along `axis`, keeping the other axis untouched.
    #[inline]
    pub fn set_span(&mut self, axis: Axis, start: i32, length: i32) {
        match axis {
            Axis::Horizontal => {
                self.x = start;
                self.width = length;
            }
            Axis::Vertical => {
                self.y = start;
                self.height = length;
            }
        }
    }
}

/// Layout axis. Passes run once per axis, horizontal first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    Horizontal,
    Vertical,
}

impl Axis {
    pub const BOTH: [Axis; 2] = [Axis::Horizontal, Axis::Vertical];

    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Axis::Horizontal => 0,
            Axis::Vertical => 1,
        }
    }

    #[inline]
    pub const fn cross(self) -> Axis {
        match self {
            Axis::Horizontal => Axis::Vertical,
            Axis::Vertical => Axis::Horizontal,
        }
    }
}

/// Keyboard focus travel direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
    /// Next focusable element in emission order (tab).
    Next,
    /// Previous focusable element in emission order (shift-tab).
    Prev,
}

impl Direction {
    /// Axis of travel for spatial directions.
    pub const fn axis(self) -> Option<Axis> {
        match self {
            Direction::Left | Direction::Right => Some(Axis::Horizontal),
            Direction::Up | Direction::Down => Some(Axis::Vertical),
            Direction::Next | Direction::Prev => None,
        }
    }

    pub const fn is_forward(self) -> bool {
        matches!(self, Direction::Right | Direction::Down | Direction::Next)
    }
}

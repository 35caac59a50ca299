use std::ops::{Add, AddAssign, Mul, Sub};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct Point {
    pub(crate) x: f64,
    pub(crate) y: f64,
}

impl Point {
    pub(crate) const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub(crate) fn len(self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub(crate) fn dist(self, other: Point) -> f64 {
        (other - self).len()
    }

    /// Point `t` of the way from `self` towards `other`.
    pub(crate) fn lerp(self, other: Point, t: f64) -> Point {
        self + (other - self) * t
    }

    /// Point on the circle of radius `r` around `self` at angle `a` (y grows downward).
    pub(crate) fn polar(self, r: f64, a: f64) -> Point {
        Point::new(self.x + r * a.cos(), self.y + r * a.sin())
    }

    pub(crate) fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Point {
    type Output = Point;
    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}
impl AddAssign for Point {
    fn add_assign(&mut self, rhs: Point) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}
impl Sub for Point {
    type Output = Point;
    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}
impl Mul<f64> for Point {
    type Output = Point;
    fn mul(self, rhs: f64) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

/// Axis-aligned rectangle in surface pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Rect {
    pub(crate) x: f64,
    pub(crate) y: f64,
    pub(crate) w: f64,
    pub(crate) h: f64,
}

impl Rect {
    pub(crate) fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }
    pub(crate) fn right(&self) -> f64 {
        self.x + self.w
    }
    pub(crate) fn bottom(&self) -> f64 {
        self.y + self.h
    }
    pub(crate) fn mid_y(&self) -> f64 {
        self.y + self.h / 2.0
    }
    /// Shrinks every side by `by`.
    pub(crate) fn inset(&self, by: f64) -> Rect {
        Rect::new(self.x + by, self.y + by, self.w - by * 2.0, self.h - by * 2.0)
    }
    /// True when `p` lies inside the rectangle grown by `margin` on every side.
    pub(crate) fn contains_with_margin(&self, p: Point, margin: f64) -> bool {
        p.x >= self.x - margin
            && p.x <= self.right() + margin
            && p.y >= self.y - margin
            && p.y <= self.bottom() + margin
    }
}

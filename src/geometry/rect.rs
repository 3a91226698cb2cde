//! Planar primitives shared by the geometry engine and the overlay driver.

/// A point in view or image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

impl Point {
    /// Creates a point.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance_to(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// A width/height pair.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    /// Horizontal extent.
    pub width: f64,
    /// Vertical extent.
    pub height: f64,
}

impl Size {
    /// Creates a size.
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// A square size.
    pub const fn square(side: f64) -> Self {
        Self {
            width: side,
            height: side,
        }
    }
}

/// An axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    /// Top-left corner.
    pub origin: Point,
    /// Extent.
    pub size: Size,
}

impl Rect {
    /// Creates a rectangle from origin coordinates and extent.
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            origin: Point::new(x, y),
            size: Size::new(width, height),
        }
    }

    /// A zero-origin, zero-size rectangle.
    pub const fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0)
    }

    /// Builds the rectangle of the given size whose center is `center`.
    pub fn centered_at(center: Point, size: Size) -> Self {
        Self {
            origin: Point::new(center.x - size.width / 2.0, center.y - size.height / 2.0),
            size,
        }
    }

    /// The rectangle's center point.
    pub fn center(&self) -> Point {
        Point::new(
            self.origin.x + self.size.width / 2.0,
            self.origin.y + self.size.height / 2.0,
        )
    }

    /// Largest x coordinate covered by the rectangle.
    pub fn max_x(&self) -> f64 {
        self.origin.x + self.size.width
    }

    /// Largest y coordinate covered by the rectangle.
    pub fn max_y(&self) -> f64 {
        self.origin.y + self.size.height
    }

    /// Scales origin and size uniformly, e.g. by a pixel-density factor.
    pub fn scaled(&self, factor: f64) -> Self {
        Self::new(
            self.origin.x * factor,
            self.origin.y * factor,
            self.size.width * factor,
            self.size.height * factor,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_round_trips_through_centered_at() {
        let rect = Rect::new(10.0, 20.0, 30.0, 40.0);
        let rebuilt = Rect::centered_at(rect.center(), rect.size);
        assert_eq!(rebuilt, rect);
    }

    #[test]
    fn test_scaled_multiplies_origin_and_size() {
        let rect = Rect::new(1.0, 2.0, 3.0, 4.0).scaled(2.0);
        assert_eq!(rect, Rect::new(2.0, 4.0, 6.0, 8.0));
    }

    #[test]
    fn test_distance() {
        let d = Point::new(0.0, 0.0).distance_to(Point::new(3.0, 4.0));
        assert!((d - 5.0).abs() < 1e-12);
    }
}

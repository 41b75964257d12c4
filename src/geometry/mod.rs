//! Geometric primitives for layout analysis.
//!
//! Image coordinates: the origin is the top-left corner of the scan, x grows
//! to the right and y grows downwards.
//!
//! ```text
//! 0------X
//! |
//! |
//! Y
//! ```

/// A 2D point in image space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    /// X coordinate
    pub x: f32,
    /// Y coordinate
    pub y: f32,
}

impl Point {
    /// Create a new point.
    ///
    /// # Examples
    ///
    /// ```
    /// use pagexml_oxide::geometry::Point;
    ///
    /// let point = Point::new(10.0, 20.0);
    /// assert_eq!(point.x, 10.0);
    /// assert_eq!(point.y, 20.0);
    /// ```
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned bounding box stored as `(min_x, max_x, min_y, max_y)`.
///
/// Boxes are only built from at least one point, so `min_x <= max_x` and
/// `min_y <= max_y` always hold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Left edge
    pub min_x: f32,
    /// Right edge
    pub max_x: f32,
    /// Top edge
    pub min_y: f32,
    /// Bottom edge
    pub max_y: f32,
}

impl BoundingBox {
    /// Create a bounding box from its four extents.
    ///
    /// The extents are normalised so that the min/max invariant holds even if
    /// the caller swaps them.
    ///
    /// # Examples
    ///
    /// ```
    /// use pagexml_oxide::geometry::BoundingBox;
    ///
    /// let bbox = BoundingBox::new(10.0, 100.0, 50.0, 70.0);
    /// assert_eq!(bbox.width(), 90.0);
    /// assert_eq!(bbox.height(), 20.0);
    /// ```
    pub fn new(min_x: f32, max_x: f32, min_y: f32, max_y: f32) -> Self {
        Self {
            min_x: min_x.min(max_x),
            max_x: max_x.max(min_x),
            min_y: min_y.min(max_y),
            max_y: max_y.max(min_y),
        }
    }

    /// Smallest box enclosing all points, or `None` for an empty slice.
    pub fn from_points(points: &[Point]) -> Option<Self> {
        let first = points.first()?;
        let mut bbox = Self {
            min_x: first.x,
            max_x: first.x,
            min_y: first.y,
            max_y: first.y,
        };
        for p in &points[1..] {
            bbox.min_x = bbox.min_x.min(p.x);
            bbox.max_x = bbox.max_x.max(p.x);
            bbox.min_y = bbox.min_y.min(p.y);
            bbox.max_y = bbox.max_y.max(p.y);
        }
        Some(bbox)
    }

    /// Width of the box.
    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    /// Height of the box.
    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }

    /// Horizontal midpoint.
    pub fn mid_x(&self) -> f32 {
        (self.min_x + self.max_x) / 2.0
    }
}

/// Anything laid out on the page with an axis-aligned extent.
pub trait Bounded {
    /// Bounding box of the item.
    fn bbox(&self) -> BoundingBox;
}

impl Bounded for BoundingBox {
    fn bbox(&self) -> BoundingBox {
        *self
    }
}

/// A closed outline polygon, as found in `Coords/@points`.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    /// Outline vertices in document order
    pub points: Vec<Point>,
}

impl Polygon {
    /// Parse a space-separated list of `x,y` pairs.
    ///
    /// Returns `None` when the string holds no valid pair. Malformed pairs are
    /// ignored; a polygon is only rejected when nothing usable is left.
    ///
    /// # Examples
    ///
    /// ```
    /// use pagexml_oxide::geometry::Polygon;
    ///
    /// let poly = Polygon::parse("10,50 100,50 100,70 10,70").unwrap();
    /// let bbox = poly.bounding_box();
    /// assert_eq!((bbox.min_x, bbox.max_x, bbox.min_y, bbox.max_y), (10.0, 100.0, 50.0, 70.0));
    ///
    /// assert!(Polygon::parse("").is_none());
    /// ```
    pub fn parse(points: &str) -> Option<Self> {
        let points: Vec<Point> = points
            .split_whitespace()
            .filter_map(|pair| {
                let (x, y) = pair.split_once(',')?;
                let x = x.trim().parse::<f32>().ok()?;
                let y = y.trim().parse::<f32>().ok()?;
                (x.is_finite() && y.is_finite()).then_some(Point::new(x, y))
            })
            .collect();
        if points.is_empty() {
            None
        } else {
            Some(Self { points })
        }
    }

    /// Bounding box of the outline.
    pub fn bounding_box(&self) -> BoundingBox {
        // `parse` never builds an empty polygon
        BoundingBox::from_points(&self.points).unwrap_or(BoundingBox::new(0.0, 0.0, 0.0, 0.0))
    }

    /// All x coordinates of the outline.
    pub fn xs(&self) -> impl Iterator<Item = f32> + '_ {
        self.points.iter().map(|p| p.x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_creation() {
        let p = Point::new(10.0, 20.0);
        assert_eq!(p.x, 10.0);
        assert_eq!(p.y, 20.0);
    }

    #[test]
    fn test_bbox_normalises_extents() {
        let b = BoundingBox::new(100.0, 10.0, 70.0, 50.0);
        assert_eq!(b.min_x, 10.0);
        assert_eq!(b.max_x, 100.0);
        assert_eq!(b.min_y, 50.0);
        assert_eq!(b.max_y, 70.0);
    }

    #[test]
    fn test_bbox_from_points() {
        let pts = [Point::new(5.0, 9.0), Point::new(1.0, 12.0), Point::new(7.0, 3.0)];
        let b = BoundingBox::from_points(&pts).unwrap();
        assert_eq!(b, BoundingBox::new(1.0, 7.0, 3.0, 12.0));
        assert!(BoundingBox::from_points(&[]).is_none());
    }

    #[test]
    fn test_bbox_mid_x() {
        let b = BoundingBox::new(10.0, 30.0, 0.0, 5.0);
        assert_eq!(b.mid_x(), 20.0);
    }

    #[test]
    fn test_polygon_parse_skips_garbage_pairs() {
        let poly = Polygon::parse("10,20 junk 30,x 40,60").unwrap();
        assert_eq!(poly.points.len(), 2);
        let b = poly.bounding_box();
        assert_eq!(b, BoundingBox::new(10.0, 40.0, 20.0, 60.0));
    }

    #[test]
    fn test_polygon_parse_empty() {
        assert!(Polygon::parse("   ").is_none());
        assert!(Polygon::parse("a,b c,d").is_none());
    }

    #[test]
    fn test_polygon_xs() {
        let poly = Polygon::parse("1,0 5,0 3,2").unwrap();
        assert_eq!(poly.xs().collect::<Vec<_>>(), vec![1.0, 5.0, 3.0]);
    }
}

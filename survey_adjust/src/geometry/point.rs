//! Plane survey coordinates.

/// Representation of a 2D point in a projected (plane) coordinate system.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Returns `true` when both coordinates are identical.
    pub fn coincides(&self, other: &Point) -> bool {
        self.x == other.x && self.y == other.y
    }
}

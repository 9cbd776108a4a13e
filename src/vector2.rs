use std::ops::Add;

/// A location (or offset) in continuous grid space. `x` runs along columns, `y` along rows.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vector2 {
    pub x: f32,
    pub y: f32,
}

impl std::fmt::Display for Vector2 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "(x: {}, y: {})", self.x, self.y)
    }
}

impl Vector2 {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// A vector of length `distance` pointing along `heading_in_degrees`.
    pub fn from_heading(heading_in_degrees: f32, distance: f32) -> Self {
        let heading_in_radians = heading_in_degrees.to_radians();

        Self {
            x: distance * heading_in_radians.cos(),
            y: distance * heading_in_radians.sin(),
        }
    }
}

impl Add for Vector2 {
    type Output = Vector2;

    fn add(self, other: Vector2) -> Vector2 {
        Vector2 {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }
}

use crate::Vector2;
use serde::Deserialize;

/// What happens to agents (and the cells their sensors probe) at the edge of the field.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryPolicy {
    /// The field is a torus; leaving one edge re-enters at the opposite edge.
    #[default]
    Wrap,
    /// Locations are pinned to the nearest edge cell.
    Clamp,
    /// Locations are mirrored back inside, and the heading is mirrored with them.
    Reflect,
}

/// Which axes were mirrored by [`BoundaryPolicy::constrain`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Reflection {
    pub x: bool,
    pub y: bool,
}

impl BoundaryPolicy {
    /// Round `location` to the nearest cell and map it into the field. The result is always a
    /// valid `(row, col)` for a `rows` x `cols` field.
    pub fn resolve_cell(&self, location: Vector2, rows: usize, cols: usize) -> (usize, usize) {
        let row = self.resolve_index(location.y.round(), rows);
        let col = self.resolve_index(location.x.round(), cols);

        (row, col)
    }

    fn resolve_index(&self, index: f32, len: usize) -> usize {
        debug_assert!(len > 0, "fields always have at least one row and column");
        // `as` saturates for out of range floats and maps NaN to 0
        let index = index as i64;
        let len = len as i64;

        let resolved = match self {
            BoundaryPolicy::Wrap => index.rem_euclid(len),
            BoundaryPolicy::Clamp => index.clamp(0, len - 1),
            BoundaryPolicy::Reflect => {
                if len == 1 {
                    0
                } else {
                    let period = 2 * (len - 1);
                    let folded = index.rem_euclid(period);
                    if folded >= len {
                        period - folded
                    } else {
                        folded
                    }
                }
            }
        };

        resolved as usize
    }

    /// Bring a continuous location back inside `[0, cols) x [0, rows)`.
    pub fn constrain(&self, location: &mut Vector2, rows: usize, cols: usize) -> Reflection {
        match self {
            BoundaryPolicy::Wrap => {
                location.x = wrap_coordinate(location.x, cols as f32);
                location.y = wrap_coordinate(location.y, rows as f32);
                Reflection::default()
            }
            BoundaryPolicy::Clamp => {
                location.x = location.x.clamp(0.0, (cols - 1) as f32);
                location.y = location.y.clamp(0.0, (rows - 1) as f32);
                Reflection::default()
            }
            BoundaryPolicy::Reflect => {
                let (x, reflected_x) = reflect_coordinate(location.x, (cols - 1) as f32);
                let (y, reflected_y) = reflect_coordinate(location.y, (rows - 1) as f32);
                location.x = x;
                location.y = y;

                Reflection {
                    x: reflected_x,
                    y: reflected_y,
                }
            }
        }
    }
}

fn wrap_coordinate(value: f32, extent: f32) -> f32 {
    let wrapped = value.rem_euclid(extent);
    // rem_euclid can round up to `extent` for tiny negative inputs
    if wrapped >= extent {
        0.0
    } else {
        wrapped
    }
}

fn reflect_coordinate(value: f32, max: f32) -> (f32, bool) {
    if value < 0.0 {
        ((-value).min(max), true)
    } else if value > max {
        ((2.0 * max - value).max(0.0), true)
    } else {
        (value, false)
    }
}

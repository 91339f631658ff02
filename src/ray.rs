use crate::map::GridMap;
use glam::Vec2;

/// Horizontal and vertical candidates closer together than this fraction of a tile count
/// as a tie, which the vertical-line hit wins.
pub(crate) const TIE_TOLERANCE: f32 = 1e-4;

#[derive(Clone, Copy, PartialEq, Debug)]
pub(crate) struct Ray {
    /// offset from the caster's facing, in degrees
    pub angle: f32,
    pub start: Vec2,
    pub end: Vec2,
    pub dir: Vec2,
    /// perpendicular distance to the wall (fish-eye corrected)
    pub dist: f32,
    /// the wall was hit on a line `x = k * tile_size`
    pub is_vertical: bool,
    pub tile: i32,
}

impl Ray {
    pub fn new(angle: f32) -> Self {
        Self {
            angle,
            start: Vec2::ZERO,
            end: Vec2::ZERO,
            dir: Vec2::X,
            dist: 0.,
            is_vertical: false,
            tile: 0,
        }
    }
}

/// A wall crossing found by one of the two passes.
#[derive(Clone, Copy, PartialEq, Debug)]
pub(crate) struct Intercept {
    pub point: Vec2,
    pub tile: i32,
}

/// Result of casting a single ray against the map.
#[derive(Clone, Copy, PartialEq, Debug)]
pub(crate) struct Hit {
    pub point: Vec2,
    pub length: f32,
    pub is_vertical: bool,
    pub tile: i32,
}

/// Unit vector for an angle in degrees. Axis-aligned angles map to exact axes so the
/// parallel pass can be skipped without relying on `sin(PI) != 0`.
pub(crate) fn direction(angle: f32) -> Vec2 {
    let normalized = angle.rem_euclid(360.);
    if normalized == 0. {
        Vec2::X
    } else if normalized == 90. {
        Vec2::Y
    } else if normalized == 180. {
        Vec2::NEG_X
    } else if normalized == 270. {
        Vec2::NEG_Y
    } else {
        Vec2::from_angle(normalized.to_radians())
    }
}

/// Walks the lines `y = k * tile_size` the ray crosses until it meets a blocked tile.
pub(crate) fn horizontal_intercept(pos: Vec2, dir: Vec2, map: &GridMap) -> Option<Intercept> {
    // LOOKING SIDEWAYS (parallel - will never cross)
    if dir.y == 0. {
        return None;
    }

    let ts = map.tile_size();
    let up = dir.dot(Vec2::NEG_Y) >= 0.;
    let (mut line, step) = if up {
        ((pos.y / ts).floor() as i64, -1)
    } else {
        (((pos.y / ts).floor() as i64).saturating_add(1), 1)
    };
    let slope = dir.x / dir.y;

    loop {
        let y = line as f32 * ts;
        let x = pos.x + (y - pos.y) * slope;
        let row = if up { line.saturating_sub(1) } else { line };
        let col = (x / ts).floor() as i64;

        let tile = map.tile_at(row, col);
        if tile != 0 {
            return Some(Intercept {
                point: Vec2::new(x, y),
                tile,
            });
        }
        line = line.saturating_add(step);
    }
}

/// Walks the lines `x = k * tile_size` the ray crosses until it meets a blocked tile.
pub(crate) fn vertical_intercept(pos: Vec2, dir: Vec2, map: &GridMap) -> Option<Intercept> {
    // LOOKING UP/DOWN (parallel - will never cross)
    if dir.x == 0. {
        return None;
    }

    let ts = map.tile_size();
    let left = dir.dot(Vec2::NEG_X) >= 0.;
    let (mut line, step) = if left {
        ((pos.x / ts).floor() as i64, -1)
    } else {
        (((pos.x / ts).floor() as i64).saturating_add(1), 1)
    };
    let inv_slope = dir.y / dir.x;

    loop {
        let x = line as f32 * ts;
        let y = pos.y + (x - pos.x) * inv_slope;
        let col = if left { line.saturating_sub(1) } else { line };
        let row = (y / ts).floor() as i64;

        let tile = map.tile_at(row, col);
        if tile != 0 {
            return Some(Intercept {
                point: Vec2::new(x, y),
                tile,
            });
        }
        line = line.saturating_add(step);
    }
}

/// Casts one ray from `pos` at the absolute `angle` (degrees) and returns the nearest wall.
pub(crate) fn cast(pos: Vec2, angle: f32, map: &GridMap) -> Hit {
    let dir = direction(angle);

    let horizontal = horizontal_intercept(pos, dir, map).map(|hit| (hit, pos.distance(hit.point)));
    let vertical = vertical_intercept(pos, dir, map).map(|hit| (hit, pos.distance(hit.point)));

    // find shortest ray
    let ((hit, length), is_vertical) = match (horizontal, vertical) {
        (Some(h), Some(v)) => {
            if h.1 < v.1 - TIE_TOLERANCE * map.tile_size() {
                (h, false)
            } else {
                (v, true)
            }
        }
        (Some(h), None) => (h, false),
        (None, Some(v)) => (v, true),
        // a unit direction always has a nonzero component
        (None, None) => unreachable!("ray direction {dir} is zero"),
    };

    Hit {
        point: hit.point,
        length,
        is_vertical,
        tile: hit.tile,
    }
}

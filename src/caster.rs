use crate::map::GridMap;
use crate::ray::{self, Ray};
use glam::Vec2;

/// An entity that looks at the map through a fan of rays spread across its field of view.
#[derive(Clone, PartialEq, Debug)]
pub(crate) struct Caster {
    pub pos: Vec2,
    /// facing in degrees, clockwise from +x (y grows downwards)
    pub rotation: f32,
    fov: f32,
    rays: Vec<Ray>,
}

impl Caster {
    /// `ray_count` rays spaced `fov / ray_count` apart, starting at `-fov / 2`. A single ray
    /// always points straight ahead.
    pub fn new(fov: f32, rotation: f32, ray_count: usize) -> anyhow::Result<Self> {
        anyhow::ensure!(ray_count > 0, "a caster needs at least one ray");
        // rays at or past 90 degrees off facing would get a negative corrected distance
        anyhow::ensure!(
            fov > 0. && fov < 180.,
            "field of view must be in (0, 180), got {fov}"
        );

        let rays = if ray_count == 1 {
            vec![Ray::new(0.)]
        } else {
            let ray_delta = fov / ray_count as f32;
            (0..ray_count)
                .map(|i| Ray::new(-fov / 2. + i as f32 * ray_delta))
                .collect()
        };

        Ok(Self {
            pos: Vec2::ZERO,
            rotation: rotation.rem_euclid(360.),
            fov,
            rays,
        })
    }

    pub fn with_position(mut self, pos: Vec2) -> Self {
        self.pos = pos;
        self
    }

    pub fn fov(&self) -> f32 {
        self.fov
    }

    pub fn rays(&self) -> &[Ray] {
        &self.rays
    }

    /// unit vector the caster is facing
    pub fn facing(&self) -> Vec2 {
        ray::direction(self.rotation)
    }

    pub fn turn(&mut self, degrees: f32) {
        self.rotation = (self.rotation + degrees).rem_euclid(360.);
    }

    /// displacement of `distance` along the facing direction, `.perp()` of it strafes right
    pub fn step(&self, distance: f32) -> Vec2 {
        self.facing() * distance
    }

    /// Recomputes every ray against `map`. Call once per frame before reading [`Self::rays`].
    pub fn cast_all(&mut self, map: &GridMap) {
        for ray in self.rays.iter_mut() {
            let angle = self.rotation + ray.angle;
            let hit = ray::cast(self.pos, angle, map);

            ray.start = self.pos;
            ray.end = hit.point;
            ray.dir = ray::direction(angle);
            // project onto the facing direction to remove the fish-eye effect
            ray.dist = ray.angle.to_radians().cos() * hit.length;
            ray.is_vertical = hit.is_vertical;
            ray.tile = hit.tile;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn walled_room(size: usize) -> GridMap {
        let ids = (0..size * size)
            .map(|idx| {
                let (row, col) = (idx / size, idx % size);
                (row == 0 || col == 0 || row == size - 1 || col == size - 1) as i32
            })
            .collect();
        GridMap::new(ids, size, size, 64.).unwrap()
    }

    #[test]
    fn rejects_bad_construction() {
        assert!(Caster::new(60., 0., 0).is_err());
        assert!(Caster::new(0., 0., 3).is_err());
        assert!(Caster::new(-10., 0., 3).is_err());
        assert!(Caster::new(400., 0., 3).is_err());
        assert!(Caster::new(180., 0., 3).is_err());
        assert!(Caster::new(360., 0., 3).is_err());
    }

    #[test]
    fn wide_fans_keep_positive_distances() {
        let map = walled_room(8);
        let mut caster = Caster::new(179., 45., 90)
            .unwrap()
            .with_position(Vec2::new(256., 256.));
        caster.cast_all(&map);
        for ray in caster.rays() {
            assert!(ray.dist > 0., "{ray:?}");
        }
    }

    #[test]
    fn rays_span_the_field_of_view() {
        let caster = Caster::new(60., 0., 3).unwrap();
        let angles = caster.rays().iter().map(|r| r.angle).collect::<Vec<_>>();
        assert_eq!(angles, vec![-30., -10., 10.]);

        let caster = Caster::new(45., 90., 30).unwrap();
        assert_eq!(caster.rays().len(), 30);
        assert_eq!(caster.rays()[0].angle, -22.5);
        assert!(caster.rays().iter().all(|r| r.angle < 22.5));
    }

    #[test]
    fn single_ray_faces_forward() {
        let mut caster = Caster::new(45., 90., 1)
            .unwrap()
            .with_position(Vec2::new(276., 276.));
        assert_eq!(caster.rays().len(), 1);
        assert_eq!(caster.rays()[0].angle, 0.);

        caster.cast_all(&walled_room(8));
        let ray = caster.rays()[0];
        assert_eq!(ray.dir, Vec2::Y);
        assert_eq!(ray.end, Vec2::new(276., 448.));
    }

    #[test]
    fn open_corridor_scenario() {
        let map = walled_room(8);
        let mut caster = Caster::new(60., 0., 1)
            .unwrap()
            .with_position(Vec2::new(276., 276.));
        caster.cast_all(&map);

        let ray = caster.rays()[0];
        assert!(ray.is_vertical);
        assert_eq!(ray.start, Vec2::new(276., 276.));
        assert_eq!(ray.end, Vec2::new(448., 276.));
        assert_eq!(ray.dist, 172.);
        assert_eq!(ray.dist, ray.start.distance(ray.end));
    }

    #[test]
    fn fan_hits_stay_on_grid_lines() {
        let map = walled_room(8);
        let mut caster = Caster::new(60., 37., 120)
            .unwrap()
            .with_position(Vec2::new(276., 276.));
        caster.cast_all(&map);

        for ray in caster.rays() {
            assert!(ray.dist.is_finite() && ray.dist > 0.);
            if ray.is_vertical {
                assert_eq!((ray.end.x / 64.).fract(), 0.);
            } else {
                assert_eq!((ray.end.y / 64.).fract(), 0.);
            }
            // perpendicular distance never exceeds the raw one
            assert!(ray.dist <= ray.start.distance(ray.end) + 1e-3);
        }
    }

    #[test]
    fn fish_eye_correction_flattens_a_wall() {
        let map = walled_room(8);
        let mut caster = Caster::new(60., 0., 7)
            .unwrap()
            .with_position(Vec2::new(96., 256.));
        caster.cast_all(&map);

        // every ray that lands on the east wall is the same perpendicular distance away
        for ray in caster.rays().iter().filter(|r| r.is_vertical && r.end.x == 448.) {
            assert!((ray.dist - 352.).abs() < 1e-2, "{ray:?}");
        }
    }

    #[test]
    fn casting_is_idempotent() {
        let map = GridMap::default_level();
        let mut caster = Caster::new(60., 12.5, 64)
            .unwrap()
            .with_position(Vec2::new(276., 276.));
        caster.cast_all(&map);
        let first = caster.rays().to_vec();
        caster.cast_all(&map);
        assert_eq!(first, caster.rays());
    }

    #[test]
    fn distance_shrinks_towards_a_wall() {
        let map = walled_room(8);
        let mut caster = Caster::new(60., 0., 1).unwrap();
        let mut last = f32::INFINITY;
        for x in (70..448).step_by(7) {
            caster.pos = Vec2::new(x as f32, 200.);
            caster.cast_all(&map);
            let dist = caster.rays()[0].dist;
            assert!(dist < last, "x {x}: {dist} >= {last}");
            last = dist;
        }
    }

    #[test]
    fn turning_wraps_rotation() {
        let mut caster = Caster::new(60., -90., 3).unwrap();
        assert_eq!(caster.rotation, 270.);
        caster.turn(100.);
        assert_eq!(caster.rotation, 10.);
        caster.turn(-20.);
        assert_eq!(caster.rotation, 350.);
    }

    #[test]
    fn steps_follow_facing() {
        let mut caster = Caster::new(60., 0., 3).unwrap();
        assert_eq!(caster.step(10.), Vec2::new(10., 0.));
        // y grows downwards, so the right-hand side of +x is +y
        assert_eq!(caster.step(5.).perp(), Vec2::new(0., 5.));
        caster.turn(90.);
        assert_eq!(caster.facing(), Vec2::Y);
        assert_eq!(caster.step(-5.), Vec2::new(0., -5.));
    }
}

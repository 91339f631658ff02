use crate::caster::Caster;
use crate::map::GridMap;
use crate::ray::Ray;
use crate::world::World;
use crate::{StringToAnyhow, HEIGHT, WIDTH};
use anyhow::Context;
use glam::Vec2;
use sdl2::keyboard::Keycode;
use sdl2::pixels::Color;
use sdl2::rect::{Point, Rect};
use sdl2::render::{BlendMode, Canvas};
use sdl2::video::Window;

#[derive(Clone, Copy, PartialEq, Debug)]
pub(crate) enum GameState {
    Playing,
    Minimap,
    Paused,
    Exit,
}

const FOV: f32 = 60.;
/// world units per second
const MOVE_SPEED: f32 = 96.;
/// degrees per second
const TURN_SPEED: f32 = 90.;

const DEFAULT_SPAWN: Vec2 = Vec2::new(276., 276.);

/// fov, rotation, ray count and position of the stationary observers
const OBSERVERS: [(f32, f32, usize, Vec2); 2] = [
    (45., 0., 3, Vec2::new(80., 80.)),
    (45., 90., 30, Vec2::new(80., 280.)),
];

const CEILING: Color = Color::RGB(0x00, 0x32, 0xaa);
const FLOOR: Color = Color::RGB(0x28, 0x28, 0x28);

/// Everything the demo needs between frames. Owned by `main`, dropped on every exit path.
pub(crate) struct Game {
    world: World,
    pub game_state: GameState,
    pub canvas: Canvas<Window>,
    pub redraw: bool,
}

impl Game {
    /// initialize game
    pub fn new(canvas: Canvas<Window>, map: GridMap) -> anyhow::Result<Self> {
        let spawn = map.spawn().unwrap_or(DEFAULT_SPAWN);
        anyhow::ensure!(
            !map.is_blocked_at(spawn),
            "spawn ({}, {}) is inside a wall",
            spawn.x,
            spawn.y
        );

        let mut world = World::new(map);
        let player = world.add_caster(
            Caster::new(FOV, 0., WIDTH / 2)
                .context("could not create player")?
                .with_position(spawn),
        );
        world.set_player(player)?;

        for (fov, rotation, ray_count, pos) in OBSERVERS {
            if world.map().is_blocked_at(pos) {
                log::warn!("skipping observer at ({}, {}): inside a wall", pos.x, pos.y);
                continue;
            }
            world.add_caster(Caster::new(fov, rotation, ray_count)?.with_position(pos));
        }
        log::debug!(
            "world has {} casters, player at ({}, {}) with a {} degree fov",
            world.casters().len(),
            spawn.x,
            spawn.y,
            world.player().map_or(0., Caster::fov)
        );

        Ok(Self {
            world,
            game_state: GameState::Playing,
            canvas,
            redraw: true,
        })
    }

    /// handle key presses for while in "playing" state
    pub fn playing_key_once(&mut self, key: Keycode) {
        match key {
            // minimap toggle
            Keycode::M => {
                if self.game_state == GameState::Minimap {
                    self.game_state = GameState::Playing
                } else {
                    self.game_state = GameState::Minimap;
                }
                log::debug!("switched to {:?}", self.game_state);
            }
            // pause game
            Keycode::Escape => {
                self.game_state = GameState::Paused;
                log::debug!("paused");
            }
            Keycode::Backspace => self.game_state = GameState::Exit,
            // drop the observers, keep the player
            Keycode::C => {
                self.world.clear_observers();
                log::debug!("cleared observers");
            }
            _ => {}
        }
    }

    /// handle key repeating for while in "playing" state
    pub fn playing_key(&mut self, key: Keycode, dt: f32) {
        let Some(player) = self.world.player_mut() else {
            return;
        };
        let (motion, turn) = key_motion(key);
        if turn != 0. {
            player.turn(turn * TURN_SPEED * dt);
        }
        let step = facing_delta(player.step(MOVE_SPEED * dt), motion);

        if let Some(id) = self.world.player_id().filter(|_| step != Vec2::ZERO) {
            self.world.move_caster(id, step);
        }
    }

    /// recast every caster
    pub fn update(&mut self, dt: f32) {
        self.world.update(dt);
    }

    // draw while in "playing" state
    pub fn playing_draw(&mut self) -> anyhow::Result<()> {
        let view_width = if self.game_state == GameState::Minimap {
            WIDTH / 2
        } else {
            WIDTH
        };

        // DRAW CEILING
        self.canvas.set_draw_color(CEILING);
        self.canvas
            .fill_rect(Rect::new(0, 0, view_width as u32, HEIGHT as u32 / 2))
            .ah()?;

        // DRAW FLOOR
        self.canvas.set_draw_color(FLOOR);
        self.canvas
            .fill_rect(Rect::new(
                0,
                HEIGHT as i32 / 2,
                view_width as u32,
                HEIGHT as u32 / 2,
            ))
            .ah()?;

        // DRAW WALLS
        let player = self
            .world
            .player()
            .context("player missing from world")?;
        let tile_size = self.world.map().tile_size();
        let column_width = view_width as f32 / player.rays().len() as f32;
        for (i, ray) in player.rays().iter().enumerate() {
            self.canvas.set_draw_color(wall_color(ray));
            self.canvas
                .fill_rect(wall_column(i, column_width, ray.dist, tile_size))
                .ah()?;
        }

        // DRAW MINIMAP
        if self.game_state == GameState::Minimap {
            self.minimap_draw(Rect::new(
                view_width as i32,
                0,
                (WIDTH - view_width) as u32,
                HEIGHT as u32,
            ))?;
        }

        Ok(())
    }

    fn minimap_draw(&mut self, area: Rect) -> anyhow::Result<()> {
        let map = self.world.map();
        let scale = minimap_scale(map, area);
        let offset = Vec2::new(area.x() as f32, area.y() as f32);
        let to_screen = |p: Vec2| {
            let p = offset + p * scale;
            Point::new(p.x as i32, p.y as i32)
        };

        self.canvas.set_draw_color(Color::BLACK);
        self.canvas.fill_rect(area).ah()?;

        let tile = (map.tile_size() * scale).max(1.) as u32;
        for (row, col, id) in map.tiles() {
            if id == 0 {
                continue;
            }
            let corner = to_screen(Vec2::new(col as f32, row as f32) * map.tile_size());
            let rect = Rect::new(corner.x(), corner.y(), tile, tile);
            self.canvas.set_draw_color(Color::RGB(0x00, 0xff, 0x00));
            self.canvas.fill_rect(rect).ah()?;
            self.canvas.set_draw_color(Color::BLACK);
            self.canvas.draw_rect(rect).ah()?;
        }

        let marker = (map.tile_size() * 0.1 * scale).max(2.) as u32;
        let player = self.world.player();
        let casters = self
            .world
            .observers()
            .map(|caster| (caster, Color::RGB(0xff, 0xaa, 0x00)))
            .chain(player.map(|caster| (caster, Color::RED)));
        for (caster, color) in casters {
            self.canvas.set_draw_color(color);
            for ray in caster.rays() {
                self.canvas
                    .draw_line(to_screen(ray.start), to_screen(ray.end))
                    .ah()?;
            }

            self.canvas.set_draw_color(Color::BLUE);
            self.canvas
                .fill_rect(Rect::from_center(to_screen(caster.pos), marker, marker))
                .ah()?;
        }

        Ok(())
    }

    // draw pause screen
    pub fn pause_draw(&mut self) -> anyhow::Result<()> {
        self.playing_draw()?;
        self.canvas.set_blend_mode(BlendMode::Blend);
        self.canvas.set_draw_color(Color::RGBA(0, 0, 0, 0xDD));
        self.canvas.fill_rect(None).ah()?;
        self.canvas.set_blend_mode(BlendMode::None);

        Ok(())
    }
}

/// Movement as (forward, strafe right) and turn direction (+1 clockwise) bound to `key`.
pub(crate) fn key_motion(key: Keycode) -> (Vec2, f32) {
    // define controls
    match key {
        Keycode::W | Keycode::Up => (Vec2::X, 0.),
        Keycode::S | Keycode::Down => (Vec2::NEG_X, 0.),
        Keycode::D => (Vec2::Y, 0.),
        Keycode::A => (Vec2::NEG_Y, 0.),
        Keycode::Left => (Vec2::ZERO, -1.),
        Keycode::Right => (Vec2::ZERO, 1.),
        _ => (Vec2::ZERO, 0.),
    }
}

/// world displacement for `motion` given one step along the facing
pub(crate) fn facing_delta(forward: Vec2, motion: Vec2) -> Vec2 {
    forward * motion.x + forward.perp() * motion.y
}

/// Screen rect for the wall slice of ray `i`. Height is inversely proportional to `dist`.
pub(crate) fn wall_column(i: usize, column_width: f32, dist: f32, tile_size: f32) -> Rect {
    let line_height = if dist > 0. {
        ((tile_size * HEIGHT as f32) / dist).min(HEIGHT as f32)
    } else {
        HEIGHT as f32
    };
    let x = (i as f32 * column_width) as i32;
    let next_x = ((i + 1) as f32 * column_width) as i32;

    Rect::new(
        x,
        (HEIGHT as i32 - line_height as i32) / 2,
        (next_x - x).max(1) as u32,
        (line_height as u32).max(1),
    )
}

/// slightly discolor walls that face different directions for contrast
pub(crate) fn wall_color(ray: &Ray) -> Color {
    let (r, g, b) = match ray.tile {
        2 => (0x20, 0xa0, 0xff),
        3 => (0xff, 0xd0, 0x20),
        4..=9 => (0xc0, 0x20, 0xff),
        _ => (0xff, 0x00, 0x00),
    };
    if ray.is_vertical {
        Color::RGB(r, g, b)
    } else {
        Color::RGB(
            (r as u16 * 2 / 3) as u8,
            (g as u16 * 2 / 3) as u8,
            (b as u16 * 2 / 3) as u8,
        )
    }
}

/// world units to minimap pixels, fitting the whole map inside `area`
pub(crate) fn minimap_scale(map: &GridMap, area: Rect) -> f32 {
    (area.width() as f32 / map.width()).min(area.height() as f32 / map.height())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closer_walls_are_taller() {
        let near = wall_column(0, 2., 64., 64.);
        let far = wall_column(0, 2., 256., 64.);
        assert!(near.height() > far.height());
        assert_eq!(far.height(), HEIGHT as u32 / 4);
        // centred on the horizon
        assert_eq!(far.y(), (HEIGHT as i32 - far.height() as i32) / 2);
    }

    #[test]
    fn wall_columns_are_clamped() {
        let touching = wall_column(3, 2., 0., 64.);
        assert_eq!(touching.height(), HEIGHT as u32);
        assert_eq!(touching.y(), 0);
        assert_eq!(touching.x(), 6);
        assert_eq!(touching.width(), 2);

        let thin = wall_column(0, 0.5, 1e9, 64.);
        assert_eq!(thin.width(), 1);
        assert_eq!(thin.height(), 1);
    }

    #[test]
    fn horizontal_hits_are_darker() {
        let mut ray = Ray::new(0.);
        ray.tile = 1;
        ray.is_vertical = true;
        let lit = wall_color(&ray);
        ray.is_vertical = false;
        let shaded = wall_color(&ray);
        assert_eq!(lit, Color::RGB(0xff, 0, 0));
        assert_eq!(shaded, Color::RGB(0xaa, 0, 0));
    }

    #[test]
    fn keys_map_to_motion() {
        assert_eq!(key_motion(Keycode::W), key_motion(Keycode::Up));
        assert_eq!(key_motion(Keycode::S), key_motion(Keycode::Down));
        assert_eq!(key_motion(Keycode::Left), (Vec2::ZERO, -1.));
        assert_eq!(key_motion(Keycode::Right), (Vec2::ZERO, 1.));
        assert_eq!(key_motion(Keycode::Q), (Vec2::ZERO, 0.));

        // facing east, y grows downwards on screen
        let east = Vec2::new(2., 0.);
        let delta = |key| facing_delta(east, key_motion(key).0);
        assert_eq!(delta(Keycode::W), Vec2::new(2., 0.));
        assert_eq!(delta(Keycode::S), Vec2::new(-2., 0.));
        assert_eq!(delta(Keycode::D), Vec2::new(0., 2.));
        assert_eq!(delta(Keycode::A), Vec2::new(0., -2.));
        assert_eq!(delta(Keycode::Left), Vec2::ZERO);
    }

    #[test]
    fn minimap_fits_the_map() {
        let map = GridMap::default_level();
        let scale = minimap_scale(&map, Rect::new(512, 0, 512, 512));
        assert_eq!(scale, 1.);
        let scale = minimap_scale(&map, Rect::new(0, 0, 1024, 256));
        assert_eq!(scale, 0.5);
    }
}

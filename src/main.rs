use game::{Game, GameState};
use map::GridMap;
use sdl2::event::Event;
use std::collections::HashSet;
use std::time::{Duration, Instant};

mod caster;
mod game;
mod map;
mod ray;
mod world;

// helper trait to convert strings into std::error types
trait StringToAnyhow<T> {
    fn ah(self) -> anyhow::Result<T>;
}

impl<T> StringToAnyhow<T> for Result<T, String> {
    fn ah(self) -> anyhow::Result<T> {
        self.map_err(|err| anyhow::anyhow!("{err}"))
    }
}

// dimensions of screen
const WIDTH: usize = 1024;
const HEIGHT: usize = 512;

const TARGET_FPS: u64 = 60;

/// frame deltas are capped at this
const MAX_DT: Duration = Duration::from_millis(100);

fn load_map() -> anyhow::Result<GridMap> {
    let map = match std::env::args()
        .nth(1)
        .or_else(|| std::env::var("RCC_MAP").ok())
    {
        Some(path) => GridMap::load(path)?,
        None => {
            log::info!("no map given, using the built-in level");
            GridMap::default_level()
        }
    };
    log::info!(
        "map is {}x{} tiles of {} units",
        map.columns(),
        map.rows(),
        map.tile_size()
    );

    Ok(map)
}

fn main() -> anyhow::Result<()> {
    pretty_env_logger::init_custom_env("RCC_LOG");

    let map = load_map()?;

    // sdl boilerplate
    log::info!("initializing sdl2");
    let sdl_ctx = sdl2::init().ah()?;
    log::info!("initializing video");
    let video = sdl_ctx.video().ah()?;

    log::info!("initializing window");
    let mut window = video
        .window("RayCasting3D", WIDTH as u32, HEIGHT as u32)
        .position_centered()
        .build()?;
    window.set_resizable(false);
    window.set_maximum_size(WIDTH as u32, HEIGHT as u32)?;
    window.set_minimum_size(WIDTH as u32, HEIGHT as u32)?;

    log::info!("creating canvas");
    let canvas = window.into_canvas().accelerated().build()?;
    log::info!("pumping events");
    let mut events = sdl_ctx.event_pump().ah()?;

    let mut keys = HashSet::new();

    // initialize game
    log::info!("initializing game state");
    let mut game = Game::new(canvas, map)?;

    let delta = Duration::from_millis(1_000 / TARGET_FPS);
    let mut last_tick = Instant::now();

    'main_loop: loop {
        let prev = Instant::now();
        let dt = (prev - last_tick).min(MAX_DT).as_secs_f32();
        last_tick = prev;

        // handle events
        for ev in events.poll_iter() {
            match ev {
                Event::Quit { .. } => break 'main_loop,
                Event::KeyDown {
                    keycode: Some(k),
                    repeat,
                    ..
                } => {
                    keys.insert(k);

                    if !repeat {
                        match game.game_state {
                            GameState::Playing | GameState::Minimap => game.playing_key_once(k),
                            GameState::Paused => game.game_state = GameState::Playing,
                            GameState::Exit => break 'main_loop,
                        }

                        game.redraw = true;
                    }
                }
                Event::KeyUp {
                    keycode: Some(k), ..
                } => {
                    keys.remove(&k);
                }
                _ => {}
            }
        }

        for k in keys.iter() {
            match game.game_state {
                GameState::Playing | GameState::Minimap => {
                    game.playing_key(*k, dt);
                    game.redraw = true;
                }
                GameState::Paused => {}
                GameState::Exit => break 'main_loop,
            }
        }

        // draw game
        if game.redraw {
            game.update(dt);

            if let Err(err) = match game.game_state {
                GameState::Playing | GameState::Minimap => game.playing_draw(),
                GameState::Paused => game.pause_draw(),
                GameState::Exit => break,
            } {
                log::error!("error while in game state {:?}: {err}", game.game_state);
                Err(err)?;
            }
            game.canvas.present();

            game.redraw = false;
        }

        let diff = Instant::now() - prev;
        if diff < delta {
            std::thread::sleep(delta - diff);
        }
    }

    log::info!("exiting");
    Ok(())
}

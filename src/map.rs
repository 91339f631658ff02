use anyhow::Context;
use glam::Vec2;
use std::fs::read_to_string;
use std::path::Path;

/// Tile ID returned for any lookup outside the grid. Nonzero, so it blocks rays.
pub(crate) const OUT_OF_BOUNDS: i32 = -1;

pub(crate) const EMPTY: i32 = 0;

const DEFAULT_TILE_SIZE: f32 = 64.;

#[rustfmt::skip]
const DEFAULT_LEVEL: [i32; 64] = [
    1, 1, 1, 1, 1, 1, 1, 1,
    1, 0, 0, 0, 0, 1, 0, 1,
    1, 0, 0, 1, 0, 0, 0, 1,
    1, 0, 1, 1, 1, 1, 0, 1,
    1, 0, 0, 1, 0, 1, 0, 1,
    1, 0, 0, 0, 1, 0, 0, 1,
    1, 0, 0, 0, 0, 0, 0, 1,
    1, 1, 1, 1, 1, 1, 1, 1,
];

/// Row-major occupancy grid. 0 is open floor, anything else is a wall.
#[derive(Clone, PartialEq, Debug)]
pub(crate) struct GridMap {
    ids: Vec<i32>,
    columns: usize,
    rows: usize,
    tile_size: f32,
    spawn: Option<Vec2>,
}

impl GridMap {
    pub fn new(ids: Vec<i32>, columns: usize, rows: usize, tile_size: f32) -> anyhow::Result<Self> {
        anyhow::ensure!(columns > 0 && rows > 0, "map must have at least one tile");
        anyhow::ensure!(
            ids.len() == columns * rows,
            "map has {} tiles, expected {columns}x{rows}",
            ids.len()
        );
        anyhow::ensure!(
            tile_size.is_finite() && tile_size > 0.,
            "tile size must be positive, got {tile_size}"
        );

        Ok(Self {
            ids,
            columns,
            rows,
            tile_size,
            spawn: None,
        })
    }

    /// the level from the original raycasting demo
    pub fn default_level() -> Self {
        Self {
            ids: DEFAULT_LEVEL.to_vec(),
            columns: 8,
            rows: 8,
            tile_size: DEFAULT_TILE_SIZE,
            spawn: None,
        }
    }

    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        log::info!("loading map at {}", path.display());
        let file = read_to_string(path)
            .with_context(|| format!("could not read map {}", path.display()))?;
        Self::parse(&file).with_context(|| format!("invalid map {}", path.display()))
    }

    pub fn parse(src: &str) -> anyhow::Result<Self> {
        let mut lines = src.lines();
        let mut tile_size = DEFAULT_TILE_SIZE;
        let mut main = None;

        while let Some(line) = lines.by_ref().next() {
            match line.trim_end() {
                "" => continue,
                "!!!!META" => tile_size = parse_meta(&mut lines)?,
                "!!!!MAIN" => {
                    if main.replace(parse_main(&mut lines)?).is_some() {
                        anyhow::bail!("map has more than one !!!!MAIN section");
                    }
                }
                other => anyhow::bail!("unrecognized directive: {other}"),
            }
        }

        let (ids, columns, rows, spawn) = main.context("map has no !!!!MAIN section")?;
        let mut this = Self::new(ids, columns, rows, tile_size)?;
        this.spawn = spawn.map(|(row, col)| this.tile_center(row, col));

        Ok(this)
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn tile_size(&self) -> f32 {
        self.tile_size
    }

    /// width of the map in world units
    pub fn width(&self) -> f32 {
        self.columns as f32 * self.tile_size
    }

    /// height of the map in world units
    pub fn height(&self) -> f32 {
        self.rows as f32 * self.tile_size
    }

    pub fn spawn(&self) -> Option<Vec2> {
        self.spawn
    }

    /// Stored ID for an in-range tile, [`OUT_OF_BOUNDS`] otherwise.
    pub fn tile_at(&self, row: i64, col: i64) -> i32 {
        if row < 0 || col < 0 || row >= self.rows as i64 || col >= self.columns as i64 {
            return OUT_OF_BOUNDS;
        }
        self.ids[row as usize * self.columns + col as usize]
    }

    pub fn is_blocked(&self, row: i64, col: i64) -> bool {
        self.tile_at(row, col) != EMPTY
    }

    pub fn is_blocked_at(&self, point: Vec2) -> bool {
        let (row, col) = self.point_to_tile(point);
        self.is_blocked(row, col)
    }

    /// (row, col) of the tile containing `point`. Saturates for huge coordinates.
    pub fn point_to_tile(&self, point: Vec2) -> (i64, i64) {
        (
            (point.y / self.tile_size).floor() as i64,
            (point.x / self.tile_size).floor() as i64,
        )
    }

    pub fn tile_center(&self, row: usize, col: usize) -> Vec2 {
        Vec2::new(col as f32 + 0.5, row as f32 + 0.5) * self.tile_size
    }

    /// every tile as (row, col, id), row by row
    pub fn tiles(&self) -> impl Iterator<Item = (usize, usize, i32)> + '_ {
        self.ids
            .iter()
            .enumerate()
            .map(|(idx, id)| (idx / self.columns, idx % self.columns, *id))
    }
}

fn parse_meta<'lines>(mut lines: impl Iterator<Item = &'lines str>) -> anyhow::Result<f32> {
    let mut tile_size = DEFAULT_TILE_SIZE;

    for line in lines.by_ref() {
        let line = line.trim();
        if line.is_empty() {
            break;
        }

        let (key, value) = line
            .split_once('=')
            .with_context(|| format!("incorrectly formatted meta: {line}"))?;
        match key.trim() {
            "tile_size" => {
                tile_size = value
                    .trim()
                    .parse()
                    .with_context(|| format!("invalid tile_size: {value}"))?
            }
            other => anyhow::bail!("unrecognized meta directive: {other}"),
        }
    }

    Ok(tile_size)
}

type MainSection = (Vec<i32>, usize, usize, Option<(usize, usize)>);

fn parse_main<'lines>(mut lines: impl Iterator<Item = &'lines str>) -> anyhow::Result<MainSection> {
    let mut ids = vec![];
    let mut columns = None;
    let mut rows = 0;
    let mut spawn = None;

    for line in lines.by_ref() {
        if line.is_empty() {
            break;
        }

        let width = line.chars().count();
        match columns {
            None => columns = Some(width),
            Some(columns) if columns != width => {
                anyhow::bail!("row {rows} has {width} tiles, expected {columns}")
            }
            Some(_) => {}
        }

        for (col, tile) in line.chars().enumerate() {
            ids.push(match tile {
                ' ' | '.' => EMPTY,
                '*' => {
                    if spawn.replace((rows, col)).is_some() {
                        anyhow::bail!("map has more than one spawn");
                    }
                    EMPTY
                }
                digit if digit.is_ascii_digit() => digit as i32 - '0' as i32,
                other => anyhow::bail!("invalid tile in map: {other}"),
            });
        }
        rows += 1;
    }

    let columns = columns.context("map has no rows")?;
    Ok((ids, columns, rows, spawn))
}

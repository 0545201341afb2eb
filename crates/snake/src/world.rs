//! Terrain the snake moves over.
//!
//! The core only talks to terrain through [`Terrain`]. [`TileGrid`] is a
//! self-contained implementation used by the runner and the tests.

use fixedbitset::FixedBitSet;
use glam::Vec2;
use std::collections::HashMap;

/// RGB color used for paint and particles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const ASH: Color = Color::new(40, 36, 32);
    pub const SCORCH: Color = Color::new(28, 24, 20);
    pub const BLOOD: Color = Color::new(150, 12, 12);
    pub const VOMIT: Color = Color::new(120, 170, 40);
    pub const SPARK: Color = Color::new(255, 220, 120);
    pub const FIRE: Color = Color::new(255, 120, 30);
    pub const SMOKE: Color = Color::new(90, 90, 90);
    pub const DEBRIS: Color = Color::new(120, 110, 100);
}

/// What occupies a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TileKind {
    #[default]
    Open,
    Wall,
    Tree,
    Building,
    Water,
}

impl TileKind {
    /// Whether the tile stops ground movement.
    #[inline]
    pub fn is_solid(self) -> bool {
        matches!(self, TileKind::Wall | TileKind::Tree | TileKind::Building)
    }
}

/// Terrain queries and painting consumed by the simulation.
///
/// World coordinates run from the origin to [`Terrain::bounds`]. Anything
/// outside the bounds is reported as blocked.
pub trait Terrain {
    /// World extents in pixels.
    fn bounds(&self) -> Vec2;

    /// Edge length of one tile in pixels.
    fn tile_size(&self) -> f32;

    /// Tile kind under `pos`. Out-of-bounds positions read as walls.
    fn tile_kind(&self, pos: Vec2) -> TileKind;

    /// Whether ground movement through `pos` is blocked.
    fn is_blocked(&self, pos: Vec2) -> bool {
        !self.in_bounds(pos) || self.tile_kind(pos).is_solid()
    }

    fn in_bounds(&self, pos: Vec2) -> bool {
        let b = self.bounds();
        pos.x >= 0.0 && pos.y >= 0.0 && pos.x < b.x && pos.y < b.y
    }

    /// Paint one pixel permanently.
    fn paint(&mut self, pos: Vec2, color: Color);

    /// Paint one pixel that fades back after `decay` seconds.
    fn paint_temp(&mut self, pos: Vec2, color: Color, decay: f32);

    fn burn_tree(&mut self, pos: Vec2);

    fn burn_building(&mut self, pos: Vec2);

    /// Current color at `pos`, paint included.
    fn color_at(&self, pos: Vec2) -> Color;

    /// Unpainted ground color.
    fn background_color(&self) -> Color;
}

#[derive(Debug, Clone, Copy)]
struct PaintEntry {
    color: Color,
    /// Seconds until the paint fades; `None` for permanent paint.
    decay: Option<f32>,
}

/// Tile-based terrain with pixel paint.
#[derive(Debug, Clone)]
pub struct TileGrid {
    width: usize,
    height: usize,
    tile_size: f32,
    kinds: Vec<TileKind>,
    /// Solid tiles, kept in sync with `kinds`.
    solid: FixedBitSet,
    paint: HashMap<(i32, i32), PaintEntry>,
    background: Color,
    pub burning_trees: Vec<(usize, usize)>,
    pub burning_buildings: Vec<(usize, usize)>,
}

impl TileGrid {
    /// Create an all-open grid of `width` x `height` tiles.
    pub fn new(width: usize, height: usize, tile_size: f32) -> Self {
        let count = width * height;
        Self {
            width,
            height,
            tile_size,
            kinds: vec![TileKind::Open; count],
            solid: FixedBitSet::with_capacity(count),
            paint: HashMap::with_capacity(1024),
            background: Color::new(70, 110, 60),
            burning_trees: Vec::new(),
            burning_buildings: Vec::new(),
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Tile coordinates containing `pos`.
    #[inline]
    pub fn tile_of(&self, pos: Vec2) -> (i32, i32) {
        (
            (pos.x / self.tile_size).floor() as i32,
            (pos.y / self.tile_size).floor() as i32,
        )
    }

    #[inline]
    fn index(&self, tx: i32, ty: i32) -> Option<usize> {
        if tx < 0 || ty < 0 || tx as usize >= self.width || ty as usize >= self.height {
            None
        } else {
            Some(ty as usize * self.width + tx as usize)
        }
    }

    pub fn kind_at_tile(&self, tx: i32, ty: i32) -> TileKind {
        self.index(tx, ty).map(|i| self.kinds[i]).unwrap_or(TileKind::Wall)
    }

    pub fn set_tile(&mut self, tx: i32, ty: i32, kind: TileKind) {
        if let Some(i) = self.index(tx, ty) {
            self.kinds[i] = kind;
            self.solid.set(i, kind.is_solid());
        }
    }

    /// Fill an inclusive tile rectangle.
    pub fn fill_rect(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, kind: TileKind) {
        for ty in y0.min(y1)..=y0.max(y1) {
            for tx in x0.min(x1)..=x0.max(x1) {
                self.set_tile(tx, ty, kind);
            }
        }
    }

    /// Number of solid tiles.
    pub fn solid_count(&self) -> usize {
        self.solid.count_ones(..)
    }

    /// Number of painted pixels.
    pub fn painted_count(&self) -> usize {
        self.paint.len()
    }

    /// Fade temporary paint.
    pub fn tick(&mut self, dt: f32) {
        self.paint.retain(|_, entry| match entry.decay.as_mut() {
            Some(decay) => {
                *decay -= dt;
                *decay > 0.0
            }
            None => true,
        });
    }

    #[inline]
    fn pixel(pos: Vec2) -> (i32, i32) {
        (pos.x.floor() as i32, pos.y.floor() as i32)
    }
}

impl Terrain for TileGrid {
    fn bounds(&self) -> Vec2 {
        Vec2::new(
            self.width as f32 * self.tile_size,
            self.height as f32 * self.tile_size,
        )
    }

    fn tile_size(&self) -> f32 {
        self.tile_size
    }

    fn tile_kind(&self, pos: Vec2) -> TileKind {
        let (tx, ty) = self.tile_of(pos);
        self.kind_at_tile(tx, ty)
    }

    fn is_blocked(&self, pos: Vec2) -> bool {
        if !self.in_bounds(pos) {
            return true;
        }
        let (tx, ty) = self.tile_of(pos);
        self.index(tx, ty).map(|i| self.solid.contains(i)).unwrap_or(true)
    }

    fn paint(&mut self, pos: Vec2, color: Color) {
        if self.in_bounds(pos) {
            self.paint.insert(Self::pixel(pos), PaintEntry { color, decay: None });
        }
    }

    fn paint_temp(&mut self, pos: Vec2, color: Color, decay: f32) {
        if self.in_bounds(pos) && decay > 0.0 {
            self.paint.insert(
                Self::pixel(pos),
                PaintEntry {
                    color,
                    decay: Some(decay),
                },
            );
        }
    }

    fn burn_tree(&mut self, pos: Vec2) {
        let (tx, ty) = self.tile_of(pos);
        if self.kind_at_tile(tx, ty) == TileKind::Tree {
            let tile = (tx as usize, ty as usize);
            if !self.burning_trees.contains(&tile) {
                self.burning_trees.push(tile);
            }
        }
    }

    fn burn_building(&mut self, pos: Vec2) {
        let (tx, ty) = self.tile_of(pos);
        if self.kind_at_tile(tx, ty) == TileKind::Building {
            let tile = (tx as usize, ty as usize);
            if !self.burning_buildings.contains(&tile) {
                self.burning_buildings.push(tile);
            }
        }
    }

    fn color_at(&self, pos: Vec2) -> Color {
        if let Some(entry) = self.paint.get(&Self::pixel(pos)) {
            return entry.color;
        }
        match self.tile_kind(pos) {
            TileKind::Open => self.background,
            TileKind::Wall => Color::new(90, 90, 96),
            TileKind::Tree => Color::new(30, 90, 30),
            TileKind::Building => Color::new(150, 130, 110),
            TileKind::Water => Color::new(40, 80, 170),
        }
    }

    fn background_color(&self) -> Color {
        self.background
    }
}

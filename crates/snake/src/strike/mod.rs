//! Targeted strike abilities.
//!
//! A strike pickup puts the snake into targeting: the player confirms one or
//! more points inside a time window and each confirmation (or the completed
//! set, for carpet bombing) dispatches autonomous squads. [`StrikeState`] is
//! the targeting state machine; [`StrikeSquads`] owns everything dispatched.

mod exploders;
mod helis;
mod planes;
mod worms;

pub use exploders::{spawn_exploders, TimedExploder};
pub use helis::{spawn_heli_squad, HeliMissile, HeliPhase, HeliShot, HeliWeapon, StrikeHeli};
pub use planes::{PlaneBomb, StrikePlane};
pub use worms::{spawn_worm_pack, StrikeWorm};

use crate::config::{Config, StrikeConfig};
use crate::context::FrameContext;
use crate::powerups::{Outcome, Owner, PowerUpSystem, Tick, Timer};
use crate::world::Terrain;
use glam::Vec2;
use tracing::info;

/// What an exploder looks like and how it moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExploderFlavor {
    /// Wanders aimlessly.
    Pig,
    /// Drives straight and bounces off walls.
    Vehicle,
    /// Seeks the nearest pedestrian.
    Snake,
}

impl ExploderFlavor {
    pub fn speed(self) -> f32 {
        match self {
            ExploderFlavor::Pig => 40.0,
            ExploderFlavor::Vehicle => 110.0,
            ExploderFlavor::Snake => 70.0,
        }
    }

    pub fn blast_radius(self) -> f32 {
        match self {
            ExploderFlavor::Pig => 36.0,
            ExploderFlavor::Vehicle => 52.0,
            ExploderFlavor::Snake => 30.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrikeKind {
    WormPack,
    HeliGun,
    HeliMissile,
    CarpetBomb,
    AirSupport,
    Exploders(ExploderFlavor),
}

impl StrikeKind {
    /// Inclusive (min, max) number of confirmations.
    pub fn confirm_range(self, config: &StrikeConfig) -> (u32, u32) {
        match self {
            StrikeKind::WormPack | StrikeKind::HeliGun | StrikeKind::HeliMissile => (1, 1),
            StrikeKind::CarpetBomb => (config.carpet_bomb_min, config.carpet_bomb_max),
            StrikeKind::AirSupport => (config.air_support_min, config.air_support_max),
            StrikeKind::Exploders(_) => (config.exploders_min, config.exploders_max),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            StrikeKind::WormPack => "worm pack",
            StrikeKind::HeliGun => "gunship squad",
            StrikeKind::HeliMissile => "missile squad",
            StrikeKind::CarpetBomb => "carpet bomb",
            StrikeKind::AirSupport => "air support",
            StrikeKind::Exploders(ExploderFlavor::Pig) => "exploding pigs",
            StrikeKind::Exploders(ExploderFlavor::Vehicle) => "exploding vehicles",
            StrikeKind::Exploders(ExploderFlavor::Snake) => "exploding snakes",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Targeting {
    pub kind: StrikeKind,
    pub timer: Timer,
    pub confirmations: u32,
    pub markers: Vec<Vec2>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum StrikeState {
    #[default]
    Inactive,
    Targeting(Targeting),
}

/// An accepted confirmation.
#[derive(Debug, Clone, PartialEq)]
pub struct Confirmation {
    pub kind: StrikeKind,
    pub point: Vec2,
    pub count: u32,
    pub max: u32,
    /// Every marker, set when this confirmation completed targeting.
    pub completed: Option<Vec<Vec2>>,
}

impl Confirmation {
    pub fn prompt(&self) -> String {
        format!("TARGET {}/{}", self.count, self.max)
    }
}

/// How a targeting window ended on its own.
#[derive(Debug, Clone, PartialEq)]
pub enum WindowEnd {
    /// Nothing was confirmed.
    LockLost,
    /// Too few confirmations for a multi-point strike; markers discarded.
    WindowClosed,
    /// Enough confirmations; the strike goes ahead with these markers.
    Completed { kind: StrikeKind, markers: Vec<Vec2> },
}

impl WindowEnd {
    pub fn message(&self) -> Option<&'static str> {
        match self {
            WindowEnd::LockLost => Some("LOCK LOST"),
            WindowEnd::WindowClosed => Some("WINDOW CLOSED"),
            WindowEnd::Completed { .. } => None,
        }
    }
}

impl StrikeState {
    /// Enter targeting for `kind`, replacing any window in progress.
    pub fn begin(&mut self, kind: StrikeKind, config: &StrikeConfig) {
        let mut timer = Timer::default();
        timer.start(config.window);
        info!("Targeting {}", kind.name());
        *self = StrikeState::Targeting(Targeting {
            kind,
            timer,
            confirmations: 0,
            markers: Vec::new(),
        });
    }

    pub fn is_targeting(&self) -> bool {
        matches!(self, StrikeState::Targeting(_))
    }

    pub fn kind(&self) -> Option<StrikeKind> {
        match self {
            StrikeState::Targeting(t) => Some(t.kind),
            StrikeState::Inactive => None,
        }
    }

    /// Accept `point`. Ignored outside targeting. Reaching the maximum
    /// completes targeting, so the count never exceeds it.
    pub fn confirm(&mut self, point: Vec2, config: &StrikeConfig) -> Option<Confirmation> {
        let StrikeState::Targeting(t) = self else {
            return None;
        };
        let (_, max) = t.kind.confirm_range(config);
        t.confirmations += 1;
        t.markers.push(point);

        let mut confirmation = Confirmation {
            kind: t.kind,
            point,
            count: t.confirmations,
            max,
            completed: None,
        };
        if t.confirmations >= max {
            confirmation.completed = Some(std::mem::take(&mut t.markers));
            *self = StrikeState::Inactive;
        }
        Some(confirmation)
    }

    /// Advance the window. Returns how it ended, on the frame it ends.
    pub fn tick(&mut self, dt: f32, config: &StrikeConfig) -> Option<WindowEnd> {
        let StrikeState::Targeting(t) = self else {
            return None;
        };
        if t.timer.tick(dt) == Tick::Active {
            return None;
        }
        let (min, _) = t.kind.confirm_range(config);
        let end = if t.confirmations == 0 {
            WindowEnd::LockLost
        } else if t.confirmations < min && min > 1 {
            WindowEnd::WindowClosed
        } else {
            WindowEnd::Completed {
                kind: t.kind,
                markers: std::mem::take(&mut t.markers),
            }
        };
        *self = StrikeState::Inactive;
        Some(end)
    }
}

/// Every dispatched strike entity.
#[derive(Debug, Clone, Default)]
pub struct StrikeSquads {
    pub worms: Vec<StrikeWorm>,
    pub helis: Vec<StrikeHeli>,
    pub heli_shots: Vec<HeliShot>,
    pub heli_missiles: Vec<HeliMissile>,
    pub planes: Vec<StrikePlane>,
    pub plane_bombs: Vec<PlaneBomb>,
    pub exploders: Vec<TimedExploder>,
    /// Dispatches so far, mixed into every squad's seed.
    dispatched: u64,
}

impl StrikeSquads {
    /// Send the squad for an accepted confirmation. Carpet bombing waits
    /// for the completing confirmation and flies over every marker.
    pub fn dispatch(&mut self, confirmation: &Confirmation, ctx: &FrameContext<'_>, config: &StrikeConfig) {
        let point = confirmation.point;
        let bounds = ctx.terrain.bounds();
        let counter = self.dispatched;
        match confirmation.kind {
            StrikeKind::CarpetBomb => {
                if let Some(markers) = &confirmation.completed {
                    self.dispatch_carpet(markers, ctx);
                }
                return;
            }
            StrikeKind::WormPack => {
                self.worms.extend(spawn_worm_pack(point, ctx.time, counter, config));
            }
            StrikeKind::HeliGun => {
                self.helis
                    .extend(spawn_heli_squad(point, HeliWeapon::Gun, bounds, config.heli_attack_window));
            }
            StrikeKind::HeliMissile => {
                self.helis
                    .extend(spawn_heli_squad(point, HeliWeapon::Missile, bounds, config.heli_attack_window));
            }
            StrikeKind::AirSupport => {
                self.planes.push(StrikePlane::air_support(point, bounds, ctx.time, counter));
            }
            StrikeKind::Exploders(flavor) => {
                self.exploders.extend(spawn_exploders(flavor, point, ctx.time, counter));
            }
        }
        self.dispatched += 1;
        info!("Strike dispatched: {} at ({:.0}, {:.0})", confirmation.kind.name(), point.x, point.y);
    }

    /// Send a carpet bombing run through `markers` in order.
    pub fn dispatch_carpet(&mut self, markers: &[Vec2], ctx: &FrameContext<'_>) {
        if markers.is_empty() {
            return;
        }
        self.dispatched += 1;
        self.planes.push(StrikePlane::carpet(markers, ctx.terrain.bounds()));
        info!("Carpet bomb dispatched over {} markers", markers.len());
    }

    pub fn entity_count(&self) -> usize {
        self.worms.len()
            + self.helis.len()
            + self.heli_shots.len()
            + self.heli_missiles.len()
            + self.planes.len()
            + self.plane_bombs.len()
            + self.exploders.len()
    }
}

impl PowerUpSystem for StrikeSquads {
    fn name(&self) -> &'static str {
        "strike squads"
    }

    fn update(
        &mut self,
        _owner: &Owner<'_>,
        ctx: &mut FrameContext<'_>,
        _config: &Config,
        dt: f32,
        out: &mut Outcome,
    ) -> Tick {
        if self.entity_count() == 0 {
            return Tick::Idle;
        }
        worms::update(&mut self.worms, ctx, dt, out);
        helis::update(&mut self.helis, &mut self.heli_shots, &mut self.heli_missiles, ctx, dt, out);
        planes::update(&mut self.planes, &mut self.plane_bombs, ctx, dt);
        planes::update_bombs(&mut self.plane_bombs, ctx, dt, out);
        exploders::update(&mut self.exploders, ctx, dt, out);
        if self.entity_count() == 0 { Tick::Expired } else { Tick::Active }
    }

    fn is_busy(&self) -> bool {
        self.entity_count() > 0
    }
}

/// Point on the world edge nearest to `point`, and the inward heading.
pub(crate) fn nearest_edge(point: Vec2, bounds: Vec2) -> (Vec2, f32) {
    use std::f32::consts::{FRAC_PI_2, PI};
    let candidates = [
        (point.x, Vec2::new(0.0, point.y), 0.0),
        (bounds.x - point.x, Vec2::new(bounds.x, point.y), PI),
        (point.y, Vec2::new(point.x, 0.0), FRAC_PI_2),
        (bounds.y - point.y, Vec2::new(point.x, bounds.y), -FRAC_PI_2),
    ];
    candidates
        .into_iter()
        .min_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, edge, heading)| (edge, heading))
        .unwrap_or((Vec2::ZERO, 0.0))
}

/// Whether `pos` has left the world by more than `margin`.
pub(crate) fn far_outside(terrain: &dyn Terrain, pos: Vec2, margin: f32) -> bool {
    let b = terrain.bounds();
    pos.x < -margin || pos.y < -margin || pos.x > b.x + margin || pos.y > b.y + margin
}

#[cfg(test)]
mod tests {
    use super::*;

    fn carpet(state: &mut StrikeState, config: &StrikeConfig) {
        state.begin(StrikeKind::CarpetBomb, config);
    }

    #[test]
    fn test_carpet_bomb_completes_at_max() {
        let config = StrikeConfig::default();
        let mut state = StrikeState::default();
        carpet(&mut state, &config);

        let mut last = None;
        for i in 0..5 {
            let c = state.confirm(Vec2::splat(i as f32 * 10.0), &config);
            assert!(c.is_some());
            last = c;
        }
        let last = last.unwrap();
        assert_eq!(last.count, 5);
        assert_eq!(last.completed.as_ref().map(Vec::len), Some(5));
        assert_eq!(state, StrikeState::Inactive);
        // Further confirmations are ignored.
        assert!(state.confirm(Vec2::ZERO, &config).is_none());
    }

    #[test]
    fn test_window_closed_below_min() {
        let config = StrikeConfig::default();
        let mut state = StrikeState::default();
        carpet(&mut state, &config);
        state.confirm(Vec2::ZERO, &config);
        state.confirm(Vec2::ONE, &config);
        assert_eq!(state.tick(4.0, &config), None);
        assert_eq!(state.tick(4.1, &config), Some(WindowEnd::WindowClosed));
        assert!(!state.is_targeting());
    }

    #[test]
    fn test_lock_lost_without_confirmation() {
        let config = StrikeConfig::default();
        let mut state = StrikeState::default();
        state.begin(StrikeKind::AirSupport, &config);
        let end = state.tick(9.0, &config);
        assert_eq!(end.as_ref().and_then(WindowEnd::message), Some("LOCK LOST"));
    }

    #[test]
    fn test_carpet_completes_on_expiry_with_min() {
        let config = StrikeConfig::default();
        let mut state = StrikeState::default();
        carpet(&mut state, &config);
        for i in 0..3 {
            state.confirm(Vec2::splat(i as f32), &config);
        }
        match state.tick(9.0, &config) {
            Some(WindowEnd::Completed { kind, markers }) => {
                assert_eq!(kind, StrikeKind::CarpetBomb);
                assert_eq!(markers.len(), 3);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_single_point_strike_completes_immediately() {
        let config = StrikeConfig::default();
        let mut state = StrikeState::default();
        state.begin(StrikeKind::WormPack, &config);
        let c = state.confirm(Vec2::new(50.0, 50.0), &config).unwrap();
        assert_eq!(c.prompt(), "TARGET 1/1");
        assert!(c.completed.is_some());
    }

    #[test]
    fn test_nearest_edge() {
        let bounds = Vec2::new(400.0, 300.0);
        let (edge, _) = nearest_edge(Vec2::new(390.0, 150.0), bounds);
        assert_eq!(edge, Vec2::new(400.0, 150.0));
        let (edge, _) = nearest_edge(Vec2::new(200.0, 5.0), bounds);
        assert_eq!(edge, Vec2::new(200.0, 0.0));
    }

    #[test]
    fn test_dispatch_waits_for_completed_carpet() {
        use crate::bonus::BonusList;
        use crate::particles::ParticleBuffer;
        use crate::population::Population;
        use crate::world::TileGrid;

        let config = StrikeConfig::default();
        let mut grid = TileGrid::new(40, 40, 16.0);
        let mut pop = Population::new();
        let mut particles = ParticleBuffer::new();
        let mut bonuses = BonusList::new();
        let ctx = FrameContext::new(&mut grid, &mut pop, &mut particles, &mut bonuses, 0.0);

        let mut state = StrikeState::default();
        let mut squads = StrikeSquads::default();
        carpet(&mut state, &config);
        for i in 0..4 {
            let c = state.confirm(Vec2::new(100.0 + i as f32 * 40.0, 100.0), &config).unwrap();
            squads.dispatch(&c, &ctx, &config);
            assert_eq!(squads.entity_count(), 0);
        }
        let c = state.confirm(Vec2::new(300.0, 100.0), &config).unwrap();
        squads.dispatch(&c, &ctx, &config);
        assert_eq!(squads.planes.len(), 1);

        state.begin(StrikeKind::WormPack, &config);
        let c = state.confirm(Vec2::new(200.0, 200.0), &config).unwrap();
        squads.dispatch(&c, &ctx, &config);
        assert!((3..=5).contains(&squads.worms.len()));
    }
}


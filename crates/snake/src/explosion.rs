//! Area explosions.
//!
//! Every bomb, missile, rammed vehicle and exploder goes through
//! [`explode`]. The returned kill count feeds scoring and the wanted level.

use crate::context::FrameContext;
use crate::particles::{burst, ParticleKind};
use crate::world::{Color, TileKind};
use glam::Vec2;
use tracing::debug;

/// Damage dealt to a vehicle at the center of a blast.
const VEHICLE_BLAST_DAMAGE: f32 = 120.0;
/// Spacing of the scorch lattice painted under a blast.
const SCORCH_STEP: f32 = 3.0;

/// Detonate at `pos`. Kills pedestrians in `radius`, damages vehicles by
/// distance, scorches the ground and lights flammable tiles. Returns the
/// number of pedestrians killed plus vehicles destroyed.
pub fn explode(ctx: &mut FrameContext<'_>, pos: Vec2, radius: f32) -> u32 {
    if radius <= 0.0 {
        return 0;
    }

    let victims = ctx.population.kill_pedestrians_in(pos, radius);
    for victim in &victims {
        ctx.particles.blood(*victim, 6);
    }
    let mut kills = victims.len() as u32;

    let r_sq = radius * radius;
    for i in 0..ctx.population.vehicles.len() {
        let v = &ctx.population.vehicles[i];
        if !v.alive {
            continue;
        }
        let d_sq = v.pos.distance_squared(pos);
        if d_sq > r_sq {
            continue;
        }
        let falloff = 1.0 - d_sq.sqrt() / radius;
        if ctx.population.damage_vehicle(i, VEHICLE_BLAST_DAMAGE * falloff.max(0.2)) {
            kills += 1;
            let wreck = ctx.population.vehicles[i].pos;
            burst(&mut *ctx.particles, wreck, 10, ParticleKind::Debris, Color::DEBRIS, 90.0);
        }
    }

    scorch(ctx, pos, radius);

    match ctx.terrain.tile_kind(pos) {
        TileKind::Tree => ctx.terrain.burn_tree(pos),
        TileKind::Building => ctx.terrain.burn_building(pos),
        _ => {}
    }

    let flames = (radius / 2.0) as usize;
    burst(&mut *ctx.particles, pos, flames, ParticleKind::Fire, Color::FIRE, radius * 3.0);
    burst(&mut *ctx.particles, pos, flames / 2, ParticleKind::Smoke, Color::SMOKE, radius * 1.5);
    ctx.shake(radius / 10.0, 0.3);

    debug!("Explosion at ({:.0}, {:.0}) r={:.0}: {} kills", pos.x, pos.y, radius, kills);
    kills
}

/// Destroy the vehicle at `index` and blow it up with its class radius.
/// Returns the kill count of the resulting blast, or `None` if the vehicle
/// was already gone.
pub fn destroy_vehicle(ctx: &mut FrameContext<'_>, index: usize) -> Option<u32> {
    let v = ctx.population.vehicles.get_mut(index)?;
    if !v.alive {
        return None;
    }
    v.alive = false;
    v.health = 0.0;
    let (pos, radius) = (v.pos, v.kind.blast_radius());
    Some(explode(ctx, pos, radius))
}

fn scorch(ctx: &mut FrameContext<'_>, pos: Vec2, radius: f32) {
    let inner = radius * 0.6;
    let inner_sq = inner * inner;
    let mut y = -inner;
    while y <= inner {
        let mut x = -inner;
        while x <= inner {
            let offset = Vec2::new(x, y);
            if offset.length_squared() <= inner_sq {
                ctx.terrain.paint(pos + offset, Color::SCORCH);
            }
            x += SCORCH_STEP;
        }
        y += SCORCH_STEP;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bonus::BonusList;
    use crate::context::ShakeRecorder;
    use crate::particles::ParticleBuffer;
    use crate::population::{Pedestrian, Population, Vehicle, VehicleKind};
    use crate::world::{Terrain, TileGrid};

    #[test]
    fn test_explode_counts_kills() {
        let mut grid = TileGrid::new(20, 20, 16.0);
        let mut pop = Population::new();
        pop.pedestrians.push(Pedestrian::new(Vec2::new(100.0, 100.0)));
        pop.pedestrians.push(Pedestrian::new(Vec2::new(110.0, 100.0)));
        pop.pedestrians.push(Pedestrian::new(Vec2::new(200.0, 100.0)));
        pop.vehicles.push(Vehicle::new(VehicleKind::Car, Vec2::new(100.0, 105.0)));
        pop.vehicles.push(Vehicle::new(VehicleKind::Tank, Vec2::new(100.0, 110.0)));
        let mut particles = ParticleBuffer::new();
        let mut bonuses = BonusList::new();
        let mut camera = ShakeRecorder::default();

        let kills = {
            let mut ctx = FrameContext::new(&mut grid, &mut pop, &mut particles, &mut bonuses, 0.0)
                .with_camera(&mut camera);
            explode(&mut ctx, Vec2::new(100.0, 100.0), 30.0)
        };

        // Two pedestrians and the car; the tank survives the blast.
        assert_eq!(kills, 3);
        assert!(pop.vehicles[1].alive);
        assert_eq!(pop.alive_pedestrians(), 1);
        assert_eq!(camera.requests, 1);
        assert_eq!(grid.color_at(Vec2::new(100.0, 100.0)), Color::SCORCH);
    }

    #[test]
    fn test_explode_without_camera() {
        let mut grid = TileGrid::new(4, 4, 16.0);
        let mut pop = Population::new();
        let mut particles = ParticleBuffer::new();
        let mut bonuses = BonusList::new();
        let mut ctx = FrameContext::new(&mut grid, &mut pop, &mut particles, &mut bonuses, 0.0);
        assert_eq!(explode(&mut ctx, Vec2::new(10.0, 10.0), 20.0), 0);
    }

    #[test]
    fn test_destroy_vehicle_once() {
        let mut grid = TileGrid::new(20, 20, 16.0);
        let mut pop = Population::new();
        pop.vehicles.push(Vehicle::new(VehicleKind::Police, Vec2::new(50.0, 50.0)));
        pop.pedestrians.push(Pedestrian::new(Vec2::new(60.0, 50.0)));
        let mut particles = ParticleBuffer::new();
        let mut bonuses = BonusList::new();
        let mut ctx = FrameContext::new(&mut grid, &mut pop, &mut particles, &mut bonuses, 0.0);
        assert_eq!(destroy_vehicle(&mut ctx, 0), Some(1));
        assert_eq!(destroy_vehicle(&mut ctx, 0), None);
        assert_eq!(destroy_vehicle(&mut ctx, 9), None);
    }
}

//! Particle output.

use crate::world::Color;
use glam::Vec2;

/// Golden angle, used to spread bursts without a generator.
const GOLDEN_ANGLE: f32 = 2.399_963;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticleKind {
    Blood,
    Fire,
    Smoke,
    Debris,
    Spark,
    Vomit,
    Dust,
}

/// One particle descriptor handed to the renderer.
#[derive(Debug, Clone, Copy)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub size: f32,
    pub life: f32,
    pub color: Color,
    pub kind: ParticleKind,
}

/// Destination for particles.
pub trait ParticleSink {
    fn emit(&mut self, particle: Particle);

    /// Blood splatter of `amount` droplets.
    fn blood(&mut self, pos: Vec2, amount: usize) {
        burst(self, pos, amount, ParticleKind::Blood, Color::BLOOD, 60.0);
    }
}

/// Radial burst of `count` particles with a deterministic spread.
pub fn burst<S: ParticleSink + ?Sized>(
    sink: &mut S,
    pos: Vec2,
    count: usize,
    kind: ParticleKind,
    color: Color,
    speed: f32,
) {
    for i in 0..count {
        let angle = i as f32 * GOLDEN_ANGLE;
        let scale = 0.5 + 0.5 * ((i * 7 % 11) as f32 / 10.0);
        sink.emit(Particle {
            pos,
            vel: Vec2::new(angle.cos(), angle.sin()) * speed * scale,
            size: 1.5 + (i % 3) as f32,
            life: 0.4 + 0.1 * (i % 5) as f32,
            color,
            kind,
        });
    }
}

/// Vec-backed sink.
#[derive(Debug, Default)]
pub struct ParticleBuffer {
    pub particles: Vec<Particle>,
}

impl ParticleBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, kind: ParticleKind) -> usize {
        self.particles.iter().filter(|p| p.kind == kind).count()
    }

    /// Integrate and drop expired particles.
    pub fn tick(&mut self, dt: f32) {
        self.particles.retain_mut(|p| {
            p.life -= dt;
            p.pos += p.vel * dt;
            p.vel *= 0.9;
            p.life > 0.0
        });
    }
}

impl ParticleSink for ParticleBuffer {
    fn emit(&mut self, particle: Particle) {
        self.particles.push(particle);
    }
}

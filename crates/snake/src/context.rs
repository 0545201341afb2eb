//! Per-frame bundle of collaborators.

use crate::bonus::BonusField;
use crate::particles::ParticleSink;
use crate::population::Population;
use crate::world::Terrain;

/// Camera shake requests. The camera is optional; without one, shakes are
/// dropped.
pub trait CameraShake {
    fn shake(&mut self, intensity: f32, duration: f32);
}

/// Everything the core reads and writes during one `update`.
pub struct FrameContext<'a> {
    pub terrain: &'a mut dyn Terrain,
    pub population: &'a mut Population,
    pub particles: &'a mut dyn ParticleSink,
    pub bonuses: &'a mut dyn BonusField,
    pub camera: Option<&'a mut dyn CameraShake>,
    /// Elapsed game time in seconds, used to seed effects.
    pub time: f32,
}

impl<'a> FrameContext<'a> {
    pub fn new(
        terrain: &'a mut dyn Terrain,
        population: &'a mut Population,
        particles: &'a mut dyn ParticleSink,
        bonuses: &'a mut dyn BonusField,
        time: f32,
    ) -> Self {
        Self {
            terrain,
            population,
            particles,
            bonuses,
            camera: None,
            time,
        }
    }

    pub fn with_camera(mut self, camera: &'a mut dyn CameraShake) -> Self {
        self.camera = Some(camera);
        self
    }

    /// Request a shake if a camera is attached.
    pub fn shake(&mut self, intensity: f32, duration: f32) {
        if let Some(camera) = self.camera.as_mut() {
            camera.shake(intensity, duration);
        }
    }
}

/// Camera stand-in that records the strongest pending shake.
#[derive(Debug, Default, Clone, Copy)]
pub struct ShakeRecorder {
    pub intensity: f32,
    pub duration: f32,
    pub requests: u32,
}

impl CameraShake for ShakeRecorder {
    fn shake(&mut self, intensity: f32, duration: f32) {
        self.intensity = self.intensity.max(intensity);
        self.duration = self.duration.max(duration);
        self.requests += 1;
    }
}

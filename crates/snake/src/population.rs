//! World populations the snake preys on.
//!
//! The population systems own their AI; the core only reads positions and
//! mutates `alive`, `pos` and `health`.

use crate::geometry::nearest_index;
use glam::Vec2;

/// Disposition of a pedestrian.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PedState {
    #[default]
    Healthy,
    Hostile,
    Infected,
}

#[derive(Debug, Clone)]
pub struct Pedestrian {
    pub pos: Vec2,
    pub alive: bool,
    pub health: f32,
    pub state: PedState,
    /// Armed pedestrians hurt the snake when eaten.
    pub armed: bool,
}

impl Pedestrian {
    pub fn new(pos: Vec2) -> Self {
        Self {
            pos,
            alive: true,
            health: 10.0,
            state: PedState::Healthy,
            armed: false,
        }
    }

    pub fn with_state(mut self, state: PedState) -> Self {
        self.state = state;
        self
    }

    pub fn armed(mut self) -> Self {
        self.armed = true;
        self
    }
}

/// Vehicle and aircraft classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VehicleKind {
    Car,
    Police,
    Tank,
    Helicopter,
}

impl VehicleKind {
    /// Contact radius for ramming, before the evolution bonus.
    pub fn ram_radius(self) -> f32 {
        match self {
            VehicleKind::Car => 14.0,
            VehicleKind::Police => 16.0,
            VehicleKind::Tank => 22.0,
            VehicleKind::Helicopter => 28.0,
        }
    }

    /// Evolution level needed to destroy it by ramming.
    pub fn min_level(self) -> u8 {
        match self {
            VehicleKind::Car | VehicleKind::Police => 1,
            VehicleKind::Tank => 3,
            VehicleKind::Helicopter => 4,
        }
    }

    pub fn blast_radius(self) -> f32 {
        match self {
            VehicleKind::Car => 30.0,
            VehicleKind::Police => 34.0,
            VehicleKind::Tank => 48.0,
            VehicleKind::Helicopter => 56.0,
        }
    }

    pub fn score(self) -> u64 {
        match self {
            VehicleKind::Car => 300,
            VehicleKind::Police => 500,
            VehicleKind::Tank => 1000,
            VehicleKind::Helicopter => 1500,
        }
    }

    pub fn max_health(self) -> f32 {
        match self {
            VehicleKind::Car => 40.0,
            VehicleKind::Police => 50.0,
            VehicleKind::Tank => 200.0,
            VehicleKind::Helicopter => 120.0,
        }
    }

    /// Law-enforcement and military targets raise the wanted level more.
    pub fn is_authority(self) -> bool {
        !matches!(self, VehicleKind::Car)
    }
}

#[derive(Debug, Clone)]
pub struct Vehicle {
    pub pos: Vec2,
    pub heading: f32,
    pub alive: bool,
    pub health: f32,
    pub kind: VehicleKind,
}

impl Vehicle {
    pub fn new(kind: VehicleKind, pos: Vec2) -> Self {
        Self {
            pos,
            heading: 0.0,
            alive: true,
            health: kind.max_health(),
            kind,
        }
    }
}

/// Pedestrians, traffic, police and military in one place.
#[derive(Debug, Clone, Default)]
pub struct Population {
    pub pedestrians: Vec<Pedestrian>,
    pub vehicles: Vec<Vehicle>,
}

impl Population {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alive_pedestrians(&self) -> usize {
        self.pedestrians.iter().filter(|p| p.alive).count()
    }

    pub fn alive_vehicles(&self) -> usize {
        self.vehicles.iter().filter(|v| v.alive).count()
    }

    /// Nearest alive pedestrian within `max_dist`.
    pub fn nearest_pedestrian(&self, from: Vec2, max_dist: f32) -> Option<usize> {
        nearest_index(&self.pedestrians, from, max_dist, |p| p.pos, |p| p.alive)
    }

    /// Nearest alive pedestrian that is not infected.
    pub fn nearest_edible(&self, from: Vec2, max_dist: f32) -> Option<usize> {
        nearest_index(&self.pedestrians, from, max_dist, |p| p.pos, |p| {
            p.alive && p.state != PedState::Infected
        })
    }

    /// Nearest alive vehicle within `max_dist`.
    pub fn nearest_vehicle(&self, from: Vec2, max_dist: f32) -> Option<usize> {
        nearest_index(&self.vehicles, from, max_dist, |v| v.pos, |v| v.alive)
    }

    /// Mark every alive pedestrian within `radius` dead and return their
    /// positions.
    pub fn kill_pedestrians_in(&mut self, center: Vec2, radius: f32) -> Vec<Vec2> {
        self.kill_where(center, radius, |_| true)
    }

    /// Kill pedestrians a ghost or clone can swallow: everyone in range but
    /// the infected.
    pub fn eat_pedestrians_in(&mut self, center: Vec2, radius: f32) -> Vec<Vec2> {
        self.kill_where(center, radius, |p| p.state != PedState::Infected)
    }

    fn kill_where(&mut self, center: Vec2, radius: f32, edible: impl Fn(&Pedestrian) -> bool) -> Vec<Vec2> {
        let r_sq = radius * radius;
        let mut killed = Vec::new();
        for ped in self.pedestrians.iter_mut() {
            if ped.alive && ped.pos.distance_squared(center) <= r_sq && edible(ped) {
                ped.alive = false;
                ped.health = 0.0;
                killed.push(ped.pos);
            }
        }
        killed
    }

    /// Apply damage to a vehicle. Returns true when this hit destroyed it.
    pub fn damage_vehicle(&mut self, index: usize, amount: f32) -> bool {
        match self.vehicles.get_mut(index) {
            Some(v) if v.alive => {
                v.health = (v.health - amount).max(0.0);
                if v.health <= 0.0 {
                    v.alive = false;
                    true
                } else {
                    false
                }
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kill_in_radius_skips_dead() {
        let mut pop = Population::new();
        pop.pedestrians.push(Pedestrian::new(Vec2::new(0.0, 0.0)));
        pop.pedestrians.push(Pedestrian::new(Vec2::new(3.0, 0.0)));
        pop.pedestrians.push(Pedestrian::new(Vec2::new(30.0, 0.0)));
        pop.pedestrians[1].alive = false;

        let killed = pop.kill_pedestrians_in(Vec2::ZERO, 5.0);
        assert_eq!(killed.len(), 1);
        assert_eq!(pop.alive_pedestrians(), 1);
    }

    #[test]
    fn test_eat_in_radius_leaves_infected() {
        let mut pop = Population::new();
        pop.pedestrians.push(Pedestrian::new(Vec2::new(2.0, 0.0)));
        pop.pedestrians.push(Pedestrian::new(Vec2::new(0.0, 2.0)).with_state(PedState::Infected));
        pop.pedestrians.push(Pedestrian::new(Vec2::new(-2.0, 0.0)).with_state(PedState::Hostile));

        assert_eq!(pop.nearest_edible(Vec2::new(1.0, 3.0), 10.0), Some(0));

        let eaten = pop.eat_pedestrians_in(Vec2::ZERO, 5.0);
        assert_eq!(eaten.len(), 2);
        assert!(pop.pedestrians[1].alive);
        assert_eq!(pop.nearest_edible(Vec2::ZERO, 10.0), None);
    }

    #[test]
    fn test_damage_vehicle_destroys_once() {
        let mut pop = Population::new();
        pop.vehicles.push(Vehicle::new(VehicleKind::Car, Vec2::ZERO));
        assert!(!pop.damage_vehicle(0, 30.0));
        assert!(pop.damage_vehicle(0, 30.0));
        assert!(!pop.damage_vehicle(0, 30.0));
        assert_eq!(pop.vehicles[0].health, 0.0);
    }
}

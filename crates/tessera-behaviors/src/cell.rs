//! A spherical cell and the capability traits the reference behaviors
//! need.

use std::f64::consts::PI;

use tessera_behavior::{AgentEvent, AttachedBehavior, AttachedBehaviors, HasBehaviors};
use tessera_core::{Agent, Vec3};

/// Smallest volume a cell can shrink to.
pub const MIN_VOLUME: f64 = 5.235_987_7e-7;

/// An agent that takes part in mechanical interactions.
pub trait Mechanical: Agent {
    /// Force threshold below which neighbour forces do not move the agent.
    fn adherence(&self) -> f64;

    /// Mass used to scale forces into displacement. Must be positive.
    fn mass(&self) -> f64;

    /// Active movement force defined by the agent's biology.
    fn tractor_force(&self) -> Vec3 {
        Vec3::ZERO
    }
}

/// An agent that can grow and split in two.
pub trait Divisible: Agent {
    /// Current volume.
    fn volume(&self) -> f64;

    /// Add `delta` to the volume, clamped below at [`MIN_VOLUME`].
    fn change_volume(&mut self, delta: f64);

    /// Split off a daughter. `volume_ratio` is daughter volume over
    /// remaining mother volume; `axis` is a unit vector along which the
    /// two cells are pushed apart. `self` becomes the mother.
    ///
    /// Agents that carry [`AttachedBehaviors`] apply
    /// [`AgentEvent::CELL_DIVISION`] here: the daughter receives the
    /// entries that copy on division and the mother drops the entries
    /// removed on it.
    fn divide(&mut self, volume_ratio: f64, axis: Vec3) -> Self;
}

/// A sphere with volume, density and adherence.
///
/// Diameter and volume are kept consistent: `V = π/6 · d³`. A cell owns
/// an [`AttachedBehaviors`] list, run by
/// [`RunAttached`](tessera_behavior::RunAttached).
#[derive(Clone, Debug, PartialEq)]
pub struct SphericalCell {
    position: Vec3,
    diameter: f64,
    volume: f64,
    density: f64,
    adherence: f64,
    tractor_force: Vec3,
    /// Free-form label carried through division.
    pub kind: u32,
    behaviors: AttachedBehaviors<SphericalCell>,
}

impl SphericalCell {
    /// A unit-density cell of `diameter` at `position`.
    pub fn new(position: Vec3, diameter: f64) -> Self {
        Self {
            position,
            diameter,
            volume: volume_of(diameter),
            density: 1.0,
            adherence: 0.0,
            tractor_force: Vec3::ZERO,
            kind: 0,
            behaviors: AttachedBehaviors::new(),
        }
    }

    /// Set the adherence threshold.
    pub fn with_adherence(mut self, adherence: f64) -> Self {
        self.adherence = adherence;
        self
    }

    /// Set the density.
    pub fn with_density(mut self, density: f64) -> Self {
        self.density = density;
        self
    }

    /// Set the label.
    pub fn with_kind(mut self, kind: u32) -> Self {
        self.kind = kind;
        self
    }

    /// Attach `entry` after the behaviors already attached.
    pub fn with_behavior(mut self, entry: AttachedBehavior<Self>) -> Self {
        self.behaviors.push(entry);
        self
    }

    /// Density.
    pub fn density(&self) -> f64 {
        self.density
    }

    /// Set the diameter and recompute the volume.
    pub fn set_diameter(&mut self, diameter: f64) {
        self.diameter = diameter;
        self.volume = volume_of(diameter);
    }

    /// Set the volume and recompute the diameter.
    pub fn set_volume(&mut self, volume: f64) {
        self.volume = volume;
        self.diameter = diameter_of(volume);
    }

    /// Set the active movement force.
    pub fn set_tractor_force(&mut self, force: Vec3) {
        self.tractor_force = force;
    }
}

fn volume_of(diameter: f64) -> f64 {
    PI / 6.0 * diameter.powi(3)
}

fn diameter_of(volume: f64) -> f64 {
    (volume * 6.0 / PI).cbrt()
}

impl Agent for SphericalCell {
    fn position(&self) -> Vec3 {
        self.position
    }

    fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    fn diameter(&self) -> f64 {
        self.diameter
    }
}

impl HasBehaviors for SphericalCell {
    fn behaviors(&self) -> &AttachedBehaviors<Self> {
        &self.behaviors
    }

    fn behaviors_mut(&mut self) -> &mut AttachedBehaviors<Self> {
        &mut self.behaviors
    }
}

impl Mechanical for SphericalCell {
    fn adherence(&self) -> f64 {
        self.adherence
    }

    fn mass(&self) -> f64 {
        self.density * self.volume
    }

    fn tractor_force(&self) -> Vec3 {
        self.tractor_force
    }
}

impl Divisible for SphericalCell {
    fn volume(&self) -> f64 {
        self.volume
    }

    fn change_volume(&mut self, delta: f64) {
        self.set_volume((self.volume + delta).max(MIN_VOLUME));
    }

    fn divide(&mut self, volume_ratio: f64, axis: Vec3) -> Self {
        // The two centres end up a quarter radius apart, the larger cell
        // moving less.
        let total = self.diameter / 8.0;
        let d2 = total / (volume_ratio + 1.0);
        let d1 = total - d2;

        let mother_volume = self.volume / (volume_ratio + 1.0);
        let mut daughter = self.clone();
        daughter.set_volume(self.volume - mother_volume);
        daughter.position = self.position + axis * d2;
        daughter.tractor_force = Vec3::ZERO;
        daughter.behaviors = self.behaviors.split(AgentEvent::CELL_DIVISION);

        self.set_volume(mother_volume);
        self.position = self.position - axis * d1;
        daughter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn volume_and_diameter_stay_consistent() {
        let mut cell = SphericalCell::new(Vec3::ZERO, 10.0);
        assert!(close(cell.volume(), PI / 6.0 * 1000.0));
        cell.set_volume(PI / 6.0 * 8.0);
        assert!(close(cell.diameter(), 2.0));
    }

    #[test]
    fn change_volume_clamps_at_minimum() {
        let mut cell = SphericalCell::new(Vec3::ZERO, 1.0);
        cell.change_volume(-100.0);
        assert_eq!(cell.volume(), MIN_VOLUME);
        assert!(cell.diameter() > 0.0);
    }

    #[test]
    fn mass_is_density_times_volume() {
        let cell = SphericalCell::new(Vec3::ZERO, 2.0).with_density(3.0);
        assert!(close(cell.mass(), 3.0 * cell.volume()));
    }

    #[test]
    fn division_conserves_volume_and_splits_along_axis() {
        let mut mother = SphericalCell::new(Vec3::new(1.0, 1.0, 1.0), 8.0)
            .with_adherence(0.4)
            .with_kind(7);
        let before = mother.volume();
        let axis = Vec3::new(0.0, 0.0, 1.0);

        let daughter = mother.divide(1.0, axis);

        assert!(close(mother.volume() + daughter.volume(), before));
        assert!(close(mother.volume(), daughter.volume()));
        assert_eq!(daughter.adherence(), 0.4);
        assert_eq!(daughter.kind, 7);
        assert_eq!(daughter.density(), mother.density());
        // Quarter radius of an 8-wide cell is 1.0, split evenly.
        assert!(close(daughter.position().z, 1.5));
        assert!(close(mother.position().z, 0.5));
        assert_eq!(mother.position().x, 1.0);
    }

    #[test]
    fn division_splits_attached_behaviors() {
        use tessera_behavior::EventMask;

        use crate::{BoundSpace, GrowDivide, MechanicalDisplacement};

        let mut mother = SphericalCell::new(Vec3::ZERO, 8.0)
            .with_behavior(AttachedBehavior::new(GrowDivide::default()))
            .with_behavior(
                AttachedBehavior::new(BoundSpace).remove_on(AgentEvent::CELL_DIVISION),
            )
            .with_behavior(AttachedBehavior::new(MechanicalDisplacement).copy_on(EventMask::NONE));

        let daughter = mother.divide(1.0, Vec3::new(1.0, 0.0, 0.0));

        let names = |c: &SphericalCell| c.behaviors().names().map(String::from).collect::<Vec<_>>();
        assert_eq!(names(&mother), vec!["grow-divide", "mechanical-displacement"]);
        assert_eq!(names(&daughter), vec!["grow-divide", "bound-space"]);
    }

    #[test]
    fn larger_daughter_moves_less() {
        let mut mother = SphericalCell::new(Vec3::ZERO, 4.0);
        let daughter = mother.divide(1.1, Vec3::new(1.0, 0.0, 0.0));
        assert!(daughter.volume() > mother.volume());
        assert!(daughter.position().x < -mother.position().x);
    }
}

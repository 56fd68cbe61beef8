//! Test agents and fixture behaviors for Tessera development.
//!
//! Provides [`TestAgent`], a minimal [`Agent`] with a tag and a counter
//! for identity-based assertions, and the fixture behaviors in
//! [`fixtures`].

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

pub use fixtures::{
    Drift, FailingBehavior, NeighborCounter, NoopBehavior, PanicOnStep, RemoveEvenTagged,
    SpawnOnce,
};

use tessera_core::{Agent, Vec3};

/// A bare agent: position, diameter, a caller-chosen tag and a counter
/// fixture behaviors write into.
#[derive(Clone, Debug, PartialEq)]
pub struct TestAgent {
    pub position: Vec3,
    pub diameter: f64,
    pub tag: u64,
    pub counter: u64,
}

impl TestAgent {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn tagged(position: Vec3, tag: u64) -> Self {
        Self {
            position,
            tag,
            ..Self::default()
        }
    }

    pub fn with_diameter(mut self, diameter: f64) -> Self {
        self.diameter = diameter;
        self
    }
}

impl Default for TestAgent {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            diameter: 1.0,
            tag: 0,
            counter: 0,
        }
    }
}

impl Agent for TestAgent {
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

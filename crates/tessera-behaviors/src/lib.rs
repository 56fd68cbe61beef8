//! Reference behaviors and agent kinds for Tessera simulations.
//!
//! Provides a [`SphericalCell`] agent and the behaviors of a basic
//! cell-mechanics model: domain clamping, growth with division, and
//! displacement from sphere-sphere repulsion.
//!
//! # Pipeline order (each step)
//!
//! 1. [`BoundSpace`] clamps positions into the domain (if enabled)
//! 2. caller-supplied biology, e.g. [`GrowDivide`]
//! 3. [`MechanicalDisplacement`] resolves neighbour forces (if enabled)
//!
//! [`standard_pipeline`] builds this sequence. Biology a cell carries
//! itself goes in step 2 as [`RunAttached`](tessera_behavior::RunAttached);
//! [`SphericalCell::divide`](Divisible::divide) hands the daughter its
//! copy of the attached behaviors.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod bound_space;
pub mod cell;
pub mod displacement;
pub mod grow_divide;

pub use bound_space::BoundSpace;
pub use cell::{Divisible, Mechanical, SphericalCell, MIN_VOLUME};
pub use displacement::{sphere_force, MechanicalDisplacement};
pub use grow_divide::{random_axis, GrowDivide};

use tessera_behavior::Behavior;

/// `[BoundSpace, ..biology, MechanicalDisplacement]`.
///
/// Both framing behaviors check their step-parameter flag on every call,
/// so the sequence is valid whether or not they are enabled.
pub fn standard_pipeline<A: Mechanical>(
    biology: Vec<Box<dyn Behavior<A>>>,
) -> Vec<Box<dyn Behavior<A>>> {
    let mut behaviors: Vec<Box<dyn Behavior<A>>> = Vec::with_capacity(biology.len() + 2);
    behaviors.push(Box::new(BoundSpace));
    behaviors.extend(biology);
    behaviors.push(Box::new(MechanicalDisplacement));
    behaviors
}

//! The [`Agent`] capability trait.

use crate::math::Vec3;

/// The small interface the core requires from every agent kind.
///
/// The store and spatial index are generic over this trait. A model with
/// several agent kinds declares a closed enum of them and implements
/// `Agent` for the enum by delegating to each variant.
///
/// `Clone` is required because the step pipeline computes each agent's
/// next state on a private copy while every other agent reads the
/// tick-start state.
///
/// # Examples
///
/// ```
/// use tessera_core::{Agent, Vec3};
///
/// #[derive(Clone)]
/// struct Bead {
///     position: Vec3,
/// }
///
/// impl Agent for Bead {
///     fn position(&self) -> Vec3 { self.position }
///     fn set_position(&mut self, position: Vec3) { self.position = position; }
///     fn diameter(&self) -> f64 { 1.0 }
/// }
///
/// let mut b = Bead { position: Vec3::ZERO };
/// b.set_position(Vec3::new(1.0, 0.0, 0.0));
/// assert_eq!(b.position().x, 1.0);
/// ```
pub trait Agent: Clone + Send + Sync + 'static {
    /// Current position (centre of mass).
    fn position(&self) -> Vec3;

    /// Move the agent.
    fn set_position(&mut self, position: Vec3);

    /// Interaction diameter. The spatial index sizes its cells from the
    /// largest diameter in the population.
    fn diameter(&self) -> f64;
}

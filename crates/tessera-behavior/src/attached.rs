//! Behaviors owned by individual agents.
//!
//! A [`Pipeline`](crate::Pipeline) behavior runs for every agent. An
//! [`AttachedBehaviors`] list instead lives inside one agent and travels
//! with it through checkpoints and divisions. [`RunAttached`] is the
//! pipeline entry that runs each agent's list.
//!
//! Events that derive a new agent from an existing one (division) decide,
//! entry by entry, whether the new agent receives a copy and whether the
//! existing agent keeps its own:
//!
//! ```text
//! mother [grow, mark(remove_on DIVISION), polarity(copy_on NONE)]
//!   │ split(DIVISION)
//!   ├── mother   [grow, polarity]
//!   └── daughter [grow, mark]
//! ```

use std::fmt;
use std::ops::BitOr;
use std::sync::Arc;

use tessera_core::{Agent, BehaviorError};

use crate::behavior::Behavior;
use crate::context::ExecutionContext;

// ── Events ─────────────────────────────────────────────────────────

/// An event that derives a new agent from an existing one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AgentEvent(u8);

impl AgentEvent {
    /// A cell split in two.
    pub const CELL_DIVISION: Self = Self(0);

    /// A model-defined event on bit `bit` of an [`EventMask`].
    ///
    /// Returns `None` for bit 0, which is [`CELL_DIVISION`](Self::CELL_DIVISION),
    /// and for bits outside `1..64`.
    pub const fn custom(bit: u8) -> Option<Self> {
        if bit > 0 && bit < 64 {
            Some(Self(bit))
        } else {
            None
        }
    }

    const fn bit(self) -> u64 {
        1 << self.0
    }
}

/// A set of [`AgentEvent`]s.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct EventMask(u64);

impl EventMask {
    /// No events.
    pub const NONE: Self = Self(0);
    /// Every event, including model-defined ones.
    pub const ALL: Self = Self(u64::MAX);

    /// Whether `event` is in the set.
    pub const fn contains(self, event: AgentEvent) -> bool {
        self.0 & event.bit() != 0
    }
}

impl From<AgentEvent> for EventMask {
    fn from(event: AgentEvent) -> Self {
        Self(event.bit())
    }
}

impl BitOr for EventMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOr for AgentEvent {
    type Output = EventMask;

    fn bitor(self, rhs: Self) -> EventMask {
        EventMask::from(self) | EventMask::from(rhs)
    }
}

// ── AttachedBehavior ───────────────────────────────────────────────

/// One behavior owned by an agent, with its event policy.
///
/// The behavior itself is shared: copying an entry to a new agent clones
/// an `Arc`, not the behavior.
pub struct AttachedBehavior<A> {
    behavior: Arc<dyn Behavior<A>>,
    copy_on: EventMask,
    remove_on: EventMask,
}

impl<A: Agent> AttachedBehavior<A> {
    /// Attach `behavior`. By default it is copied to the new agent on
    /// every event and never removed.
    pub fn new(behavior: impl Behavior<A>) -> Self {
        Self::shared(Arc::new(behavior))
    }

    /// Attach an already shared behavior.
    pub fn shared(behavior: Arc<dyn Behavior<A>>) -> Self {
        Self {
            behavior,
            copy_on: EventMask::ALL,
            remove_on: EventMask::NONE,
        }
    }

    /// Copy to the new agent only on `events`.
    pub fn copy_on(mut self, events: impl Into<EventMask>) -> Self {
        self.copy_on = events.into();
        self
    }

    /// Drop from the existing agent on `events`.
    pub fn remove_on(mut self, events: impl Into<EventMask>) -> Self {
        self.remove_on = events.into();
        self
    }

    /// Name of the wrapped behavior.
    pub fn name(&self) -> &str {
        self.behavior.name()
    }

    /// Whether the new agent of `event` receives a copy.
    pub fn copies_on(&self, event: AgentEvent) -> bool {
        self.copy_on.contains(event)
    }

    /// Whether the existing agent loses this entry on `event`.
    pub fn removed_on(&self, event: AgentEvent) -> bool {
        self.remove_on.contains(event)
    }

    /// Run the wrapped behavior.
    pub fn run(&self, agent: &mut A, ctx: &mut ExecutionContext<'_, A>) -> Result<(), BehaviorError> {
        self.behavior.run(agent, ctx)
    }
}

impl<A: Agent> Clone for AttachedBehavior<A> {
    fn clone(&self) -> Self {
        Self {
            behavior: Arc::clone(&self.behavior),
            copy_on: self.copy_on,
            remove_on: self.remove_on,
        }
    }
}

impl<A: Agent> fmt::Debug for AttachedBehavior<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttachedBehavior")
            .field("name", &self.name())
            .field("copy_on", &self.copy_on)
            .field("remove_on", &self.remove_on)
            .finish()
    }
}

impl<A: Agent> PartialEq for AttachedBehavior<A> {
    fn eq(&self, other: &Self) -> bool {
        self.name() == other.name()
            && self.copy_on == other.copy_on
            && self.remove_on == other.remove_on
    }
}

// ── AttachedBehaviors ──────────────────────────────────────────────

/// The ordered behavior list of one agent.
pub struct AttachedBehaviors<A> {
    entries: Vec<AttachedBehavior<A>>,
}

impl<A: Agent> AttachedBehaviors<A> {
    /// An empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `entry`; it runs after every entry already attached.
    pub fn push(&mut self, entry: AttachedBehavior<A>) {
        self.entries.push(entry);
    }

    /// Builder form of [`push`](Self::push).
    pub fn with(mut self, entry: AttachedBehavior<A>) -> Self {
        self.push(entry);
        self
    }

    /// Remove every entry named `name`. Returns how many were removed.
    pub fn remove(&mut self, name: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| e.name() != name);
        before - self.entries.len()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is attached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in run order.
    pub fn iter(&self) -> impl Iterator<Item = &AttachedBehavior<A>> + '_ {
        self.entries.iter()
    }

    /// Behavior names in run order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|e| e.name())
    }

    /// Apply `event` to this list and return the list for the new agent.
    ///
    /// The returned list holds the entries that copy on `event`; this list
    /// keeps the entries not removed on `event`. Relative order is kept on
    /// both sides.
    pub fn split(&mut self, event: AgentEvent) -> Self {
        let copied = self
            .entries
            .iter()
            .filter(|e| e.copies_on(event))
            .cloned()
            .collect();
        self.entries.retain(|e| !e.removed_on(event));
        Self { entries: copied }
    }

    /// Run every entry on `agent`, stopping at the first error.
    pub fn run(&self, agent: &mut A, ctx: &mut ExecutionContext<'_, A>) -> Result<(), BehaviorError> {
        for entry in &self.entries {
            entry.run(agent, ctx)?;
        }
        Ok(())
    }
}

impl<A: Agent> Default for AttachedBehaviors<A> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<A: Agent> Clone for AttachedBehaviors<A> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
        }
    }
}

impl<A: Agent> fmt::Debug for AttachedBehaviors<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

impl<A: Agent> PartialEq for AttachedBehaviors<A> {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

// ── Running ────────────────────────────────────────────────────────

/// An agent that owns an [`AttachedBehaviors`] list.
pub trait HasBehaviors: Agent {
    /// The agent's behaviors.
    fn behaviors(&self) -> &AttachedBehaviors<Self>;

    /// Mutable access, for attaching and detaching.
    fn behaviors_mut(&mut self) -> &mut AttachedBehaviors<Self>;
}

/// Pipeline behavior running each agent's own [`AttachedBehaviors`].
///
/// The list is snapshotted before it runs, so entries attached or removed
/// by an entry take effect from the next step. A failing entry fails the
/// whole agent, like any other pipeline behavior.
#[derive(Clone, Copy, Debug, Default)]
pub struct RunAttached;

impl<A: HasBehaviors> Behavior<A> for RunAttached {
    fn name(&self) -> &str {
        "attached-behaviors"
    }

    fn run(&self, agent: &mut A, ctx: &mut ExecutionContext<'_, A>) -> Result<(), BehaviorError> {
        if agent.behaviors().is_empty() {
            return Ok(());
        }
        let snapshot = agent.behaviors().clone();
        snapshot.run(agent, ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_chacha::rand_core::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use tessera_core::{PartitionId, StepId, Vec3};
    use tessera_space::{GridConfig, UniformGrid};
    use tessera_store::AgentStore;

    use crate::context::StepView;
    use crate::params::StepParams;

    #[derive(Clone, Debug, Default)]
    struct Blob {
        position: Vec3,
        trace: Vec<&'static str>,
        behaviors: AttachedBehaviors<Blob>,
    }

    impl Agent for Blob {
        fn position(&self) -> Vec3 {
            self.position
        }
        fn set_position(&mut self, position: Vec3) {
            self.position = position;
        }
        fn diameter(&self) -> f64 {
            1.0
        }
    }

    impl HasBehaviors for Blob {
        fn behaviors(&self) -> &AttachedBehaviors<Self> {
            &self.behaviors
        }
        fn behaviors_mut(&mut self) -> &mut AttachedBehaviors<Self> {
            &mut self.behaviors
        }
    }

    /// Appends its name to the trace, optionally detaching itself.
    struct Trace {
        name: &'static str,
        detach: bool,
        fail: bool,
    }

    fn trace(name: &'static str) -> Trace {
        Trace {
            name,
            detach: false,
            fail: false,
        }
    }

    impl Behavior<Blob> for Trace {
        fn name(&self) -> &str {
            self.name
        }
        fn run(
            &self,
            agent: &mut Blob,
            _ctx: &mut ExecutionContext<'_, Blob>,
        ) -> Result<(), BehaviorError> {
            agent.trace.push(self.name);
            if self.detach {
                agent.behaviors.remove(self.name);
            }
            if self.fail {
                return Err(BehaviorError::failed("trace"));
            }
            Ok(())
        }
    }

    fn run_once(agent: &mut Blob) -> Result<(), BehaviorError> {
        let mut store = AgentStore::new(1).unwrap();
        let id = store.push(agent.clone());
        let mut grid = UniformGrid::new(GridConfig::default()).unwrap();
        grid.rebuild(&store).unwrap();
        let params = StepParams::default();
        let view = StepView {
            store: &store,
            grid: &grid,
            params: &params,
            step: StepId(0),
        };
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut ctx = ExecutionContext::new(view, &mut rng, PartitionId(0));
        ctx.begin_agent(id, store.handle_of(id).unwrap());
        RunAttached.run(agent, &mut ctx)
    }

    #[test]
    fn event_masks() {
        let custom = AgentEvent::custom(5).unwrap();
        let mask = AgentEvent::CELL_DIVISION | custom;
        assert!(mask.contains(AgentEvent::CELL_DIVISION));
        assert!(mask.contains(custom));
        assert!(!EventMask::from(custom).contains(AgentEvent::CELL_DIVISION));
        assert!(EventMask::ALL.contains(custom));
        assert!(!EventMask::NONE.contains(AgentEvent::CELL_DIVISION));
        assert_eq!(AgentEvent::custom(0), None);
        assert_eq!(AgentEvent::custom(64), None);
    }

    #[test]
    fn split_follows_copy_and_remove_policy() {
        let mut mother = AttachedBehaviors::<Blob>::new()
            .with(AttachedBehavior::new(trace("grow")))
            .with(AttachedBehavior::new(trace("mark")).remove_on(AgentEvent::CELL_DIVISION))
            .with(AttachedBehavior::new(trace("polarity")).copy_on(EventMask::NONE));

        let daughter = mother.split(AgentEvent::CELL_DIVISION);

        assert_eq!(mother.names().collect::<Vec<_>>(), vec!["grow", "polarity"]);
        assert_eq!(daughter.names().collect::<Vec<_>>(), vec!["grow", "mark"]);
        assert_eq!(format!("{daughter:?}"), r#"["grow", "mark"]"#);
    }

    #[test]
    fn split_on_unrelated_event_keeps_everything() {
        let other = AgentEvent::custom(3).unwrap();
        let mut list = AttachedBehaviors::<Blob>::new()
            .with(AttachedBehavior::new(trace("a")).remove_on(AgentEvent::CELL_DIVISION))
            .with(AttachedBehavior::new(trace("b")).copy_on(AgentEvent::CELL_DIVISION));
        let copied = list.split(other);
        assert_eq!(list.len(), 2);
        assert_eq!(copied.names().collect::<Vec<_>>(), vec!["a"]);
    }

    #[test]
    fn runs_entries_in_order_and_detaches_next_step() {
        let mut agent = Blob::default();
        agent.behaviors.push(AttachedBehavior::new(Trace {
            name: "once",
            detach: true,
            fail: false,
        }));
        agent.behaviors.push(AttachedBehavior::new(trace("always")));

        run_once(&mut agent).unwrap();
        assert_eq!(agent.trace, vec!["once", "always"]);
        assert_eq!(agent.behaviors.names().collect::<Vec<_>>(), vec!["always"]);

        run_once(&mut agent).unwrap();
        assert_eq!(agent.trace, vec!["once", "always", "always"]);
    }

    #[test]
    fn failing_entry_stops_the_list() {
        let mut agent = Blob::default();
        agent.behaviors.push(AttachedBehavior::new(Trace {
            name: "broken",
            detach: false,
            fail: true,
        }));
        agent.behaviors.push(AttachedBehavior::new(trace("after")));
        assert!(run_once(&mut agent).is_err());
        assert_eq!(agent.trace, vec!["broken"]);
    }

    #[test]
    fn agents_without_behaviors_are_untouched() {
        let mut agent = Blob::default();
        run_once(&mut agent).unwrap();
        assert!(agent.trace.is_empty());
    }
}

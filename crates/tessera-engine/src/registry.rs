//! Registry of field collaborators (diffusion grids and similar).

use std::any::Any;

use indexmap::IndexMap;
use tessera_core::{AgentId, RegistryError, StepId, SubstanceId, Vec3};
use tessera_space::GridEntry;

/// Agent positions as of the current step's index rebuild.
#[derive(Clone, Copy, Debug)]
pub struct AgentPositions<'a> {
    entries: &'a [GridEntry],
    step: StepId,
}

impl<'a> AgentPositions<'a> {
    /// Wrap the index entries of `step`.
    pub fn new(entries: &'a [GridEntry], step: StepId) -> Self {
        Self { entries, step }
    }

    /// The step being computed.
    pub fn step(&self) -> StepId {
        self.step
    }

    /// Number of agents.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no agents.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(id, position)` for every agent. Order is unspecified.
    pub fn iter(&self) -> impl Iterator<Item = (AgentId, Vec3)> + 'a {
        self.entries.iter().map(|e| (e.id, e.position))
    }
}

/// An external field (e.g. a substance concentration grid) that samples
/// agent positions once per step, before behaviors run.
///
/// The core does not solve the field itself; it only hands over positions.
pub trait FieldCollaborator: Any + Send + Sync {
    /// Unique, human-readable name.
    fn name(&self) -> &str;

    /// Observe the agent positions of the current step.
    fn sample(&mut self, positions: &AgentPositions<'_>);
}

/// Field collaborators keyed by [`SubstanceId`] and by unique name.
#[derive(Default)]
pub struct FieldRegistry {
    fields: IndexMap<SubstanceId, Box<dyn FieldCollaborator>>,
    names: IndexMap<String, SubstanceId>,
}

impl FieldRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `field` under `id`.
    ///
    /// # Errors
    ///
    /// `DuplicateKey` if `id` or the field's name is already registered.
    pub fn register(
        &mut self,
        id: SubstanceId,
        field: Box<dyn FieldCollaborator>,
    ) -> Result<(), RegistryError> {
        if self.fields.contains_key(&id) {
            return Err(RegistryError::DuplicateKey {
                key: format!("substance {id}"),
            });
        }
        let name = field.name().to_string();
        if self.names.contains_key(&name) {
            return Err(RegistryError::DuplicateKey { key: name });
        }
        self.names.insert(name, id);
        self.fields.insert(id, field);
        Ok(())
    }

    /// Remove and return the field registered under `id`.
    pub fn remove(&mut self, id: SubstanceId) -> Result<Box<dyn FieldCollaborator>, RegistryError> {
        let field = self
            .fields
            .shift_remove(&id)
            .ok_or_else(|| not_found(id))?;
        self.names.shift_remove(field.name());
        Ok(field)
    }

    /// The field registered under `id`.
    pub fn get(&self, id: SubstanceId) -> Result<&dyn FieldCollaborator, RegistryError> {
        self.fields
            .get(&id)
            .map(|f| f.as_ref())
            .ok_or_else(|| not_found(id))
    }

    /// Mutable access to the field registered under `id`.
    pub fn get_mut(&mut self, id: SubstanceId) -> Result<&mut dyn FieldCollaborator, RegistryError> {
        match self.fields.get_mut(&id) {
            Some(f) => Ok(f.as_mut()),
            None => Err(not_found(id)),
        }
    }

    /// The field registered under `name`.
    pub fn get_by_name(&self, name: &str) -> Result<&dyn FieldCollaborator, RegistryError> {
        let id = self.id_of(name)?;
        self.get(id)
    }

    /// The id registered for `name`.
    pub fn id_of(&self, name: &str) -> Result<SubstanceId, RegistryError> {
        self.names
            .get(name)
            .copied()
            .ok_or_else(|| RegistryError::NotFound {
                key: name.to_string(),
            })
    }

    /// The field under `id`, downcast to its concrete type.
    ///
    /// # Errors
    ///
    /// `NotFound` if nothing is registered under `id` or the field is not
    /// a `T`.
    pub fn get_as<T: FieldCollaborator>(&self, id: SubstanceId) -> Result<&T, RegistryError> {
        let field: &dyn Any = self.get(id)?;
        field.downcast_ref::<T>().ok_or_else(|| not_found(id))
    }

    /// Registered ids in registration order.
    pub fn ids(&self) -> impl Iterator<Item = SubstanceId> + '_ {
        self.fields.keys().copied()
    }

    /// Number of registered fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether no fields are registered.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Let every field sample `positions`, in registration order.
    pub fn sample_all(&mut self, positions: &AgentPositions<'_>) {
        for field in self.fields.values_mut() {
            field.sample(positions);
        }
    }
}

impl std::fmt::Debug for FieldRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.names.iter().map(|(n, id)| (id, n))).finish()
    }
}

fn not_found(id: SubstanceId) -> RegistryError {
    RegistryError::NotFound {
        key: format!("substance {id}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::{AgentHandle, PartitionId};

    struct Recorder {
        name: String,
        seen: usize,
    }

    impl Recorder {
        fn boxed(name: &str) -> Box<dyn FieldCollaborator> {
            Box::new(Self {
                name: name.into(),
                seen: 0,
            })
        }
    }

    impl FieldCollaborator for Recorder {
        fn name(&self) -> &str {
            &self.name
        }
        fn sample(&mut self, positions: &AgentPositions<'_>) {
            self.seen += positions.len();
        }
    }

    #[test]
    fn duplicate_id_and_name_rejected() {
        let mut reg = FieldRegistry::new();
        reg.register(SubstanceId(1), Recorder::boxed("oxygen")).unwrap();
        assert!(matches!(
            reg.register(SubstanceId(1), Recorder::boxed("glucose")),
            Err(RegistryError::DuplicateKey { .. })
        ));
        assert_eq!(
            reg.register(SubstanceId(2), Recorder::boxed("oxygen")),
            Err(RegistryError::DuplicateKey {
                key: "oxygen".into()
            })
        );
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn lookup_by_id_and_name() {
        let mut reg = FieldRegistry::new();
        reg.register(SubstanceId(4), Recorder::boxed("oxygen")).unwrap();
        assert_eq!(reg.get(SubstanceId(4)).unwrap().name(), "oxygen");
        assert_eq!(reg.get_by_name("oxygen").unwrap().name(), "oxygen");
        assert_eq!(reg.id_of("oxygen").unwrap(), SubstanceId(4));
        assert!(matches!(
            reg.get(SubstanceId(5)),
            Err(RegistryError::NotFound { .. })
        ));
        assert!(reg.get_by_name("nitrogen").is_err());
    }

    #[test]
    fn remove_frees_id_and_name() {
        let mut reg = FieldRegistry::new();
        reg.register(SubstanceId(1), Recorder::boxed("oxygen")).unwrap();
        reg.remove(SubstanceId(1)).unwrap();
        assert!(reg.remove(SubstanceId(1)).is_err());
        reg.register(SubstanceId(1), Recorder::boxed("oxygen")).unwrap();
    }

    #[test]
    fn sample_all_reaches_every_field() {
        let mut reg = FieldRegistry::new();
        reg.register(SubstanceId(1), Recorder::boxed("a")).unwrap();
        reg.register(SubstanceId(2), Recorder::boxed("b")).unwrap();
        let entries = [GridEntry {
            id: AgentId(0),
            handle: AgentHandle::new(PartitionId::DEFAULT, 0),
            position: Vec3::ZERO,
        }];
        reg.sample_all(&AgentPositions::new(&entries, StepId(0)));
        reg.sample_all(&AgentPositions::new(&entries, StepId(1)));
        assert_eq!(reg.get_as::<Recorder>(SubstanceId(1)).unwrap().seen, 2);
        assert_eq!(reg.get_as::<Recorder>(SubstanceId(2)).unwrap().seen, 2);
    }
}

//! The rebuild-per-step uniform grid.

use indexmap::IndexMap;
use rayon::prelude::*;
use smallvec::SmallVec;
use tessera_core::{Agent, AgentHandle, AgentId, PartitionId, Vec3};
use tessera_store::AgentStore;

use crate::config::GridConfig;
use crate::error::SpaceError;

/// Integer coordinate of a grid cell.
pub type CellKey = [i32; 3];

/// One indexed agent as of the last rebuild.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridEntry {
    /// The agent's identity.
    pub id: AgentId,
    /// Its store location at rebuild time.
    pub handle: AgentHandle,
    /// Its position at rebuild time.
    pub position: Vec3,
}

/// A uniform 3D grid of cubic cells answering radius queries.
///
/// The grid is a snapshot: [`rebuild`](Self::rebuild) clears it and
/// re-inserts every agent of the store, and nothing patches it in
/// between. Entries are kept sorted by cell key so each occupied cell is
/// one contiguous run.
///
/// Cell size is at least the largest agent diameter, so every
/// interaction partner of an agent lies in the 27 cells around it.
/// Queries with a radius larger than the cell size scan a wider block
/// of cells; completeness never depends on the radius.
#[derive(Clone, Debug)]
pub struct UniformGrid {
    config: GridConfig,
    cell_size: f64,
    largest_diameter: f64,
    entries: Vec<GridEntry>,
    cells: IndexMap<CellKey, (usize, usize)>,
    by_id: IndexMap<AgentId, usize>,
    built: bool,
}

impl UniformGrid {
    /// Create an empty, unbuilt grid.
    pub fn new(config: GridConfig) -> Result<Self, SpaceError> {
        config.validate()?;
        Ok(Self {
            config,
            cell_size: config.fixed_cell_size.unwrap_or(config.min_cell_size),
            largest_diameter: 0.0,
            entries: Vec::new(),
            cells: IndexMap::new(),
            by_id: IndexMap::new(),
            built: false,
        })
    }

    /// Clear the grid and index every agent of `store`.
    ///
    /// # Errors
    ///
    /// `InvalidCellSize` if the derived cell size is not finite (an agent
    /// with infinite diameter). The grid is left unbuilt in that case.
    pub fn rebuild<A: Agent>(&mut self, store: &AgentStore<A>) -> Result<(), SpaceError> {
        self.built = false;
        self.entries.clear();
        self.cells.clear();
        self.by_id.clear();

        let parts = store.partition_count();
        let largest = (0..parts)
            .into_par_iter()
            .map(|pi| {
                store
                    .partition_agents(PartitionId(pi as u16))
                    .unwrap_or(&[])
                    .par_iter()
                    .map(|a| a.diameter())
                    .reduce(|| 0.0, f64::max)
            })
            .reduce(|| 0.0, f64::max);
        let cell_size = self.config.cell_size_for(largest)?;

        let mut keyed: Vec<(CellKey, GridEntry)> = (0..parts)
            .into_par_iter()
            .flat_map_iter(|pi| {
                let partition = PartitionId(pi as u16);
                let agents = store.partition_agents(partition).unwrap_or(&[]);
                let ids = store.partition_ids(partition).unwrap_or(&[]);
                ids.iter()
                    .zip(agents)
                    .enumerate()
                    .map(move |(slot, (&id, agent))| {
                        let position = agent.position();
                        (
                            key_of(position, cell_size),
                            GridEntry {
                                id,
                                handle: AgentHandle::new(partition, slot as u32),
                                position,
                            },
                        )
                    })
            })
            .collect();
        keyed.par_sort_unstable_by(|a, b| a.0.cmp(&b.0).then(a.1.id.cmp(&b.1.id)));

        self.entries.reserve(keyed.len());
        self.by_id.reserve(keyed.len());
        let mut run_start = 0;
        for (i, (key, entry)) in keyed.iter().enumerate() {
            if i > 0 && keyed[i - 1].0 != *key {
                self.cells.insert(keyed[i - 1].0, (run_start, i));
                run_start = i;
            }
            self.by_id.insert(entry.id, i);
            self.entries.push(*entry);
        }
        if let Some((key, _)) = keyed.last() {
            self.cells.insert(*key, (run_start, keyed.len()));
        }

        self.cell_size = cell_size;
        self.largest_diameter = largest;
        self.built = true;
        Ok(())
    }

    // ── Queries ─────────────────────────────────────────────────

    /// Visit every agent within `radius` of agent `id`, excluding `id`.
    ///
    /// `f` receives `(neighbour id, neighbour handle, squared distance)`.
    /// Order is unspecified. A non-positive or non-finite radius visits
    /// nothing.
    ///
    /// # Errors
    ///
    /// `NotIndexed` if `id` was not present at the last rebuild.
    pub fn for_each_neighbor<F>(&self, id: AgentId, radius: f64, f: F) -> Result<(), SpaceError>
    where
        F: FnMut(AgentId, AgentHandle, f64),
    {
        let entry = self.entry(id).ok_or(SpaceError::NotIndexed { id })?;
        self.for_each_neighbor_of_point(entry.position, radius, Some(id), f);
        Ok(())
    }

    /// Visit every agent within `radius` of `point`, skipping `exclude`.
    pub fn for_each_neighbor_of_point<F>(
        &self,
        point: Vec3,
        radius: f64,
        exclude: Option<AgentId>,
        mut f: F,
    ) where
        F: FnMut(AgentId, AgentHandle, f64),
    {
        if !(radius > 0.0 && radius.is_finite()) || !point.is_finite() || self.entries.is_empty() {
            return;
        }
        let r_sq = radius * radius;
        for (start, end) in self.candidate_runs(point, radius) {
            for e in &self.entries[start..end] {
                if Some(e.id) == exclude {
                    continue;
                }
                let d_sq = e.position.distance_sq(point);
                if d_sq <= r_sq {
                    f(e.id, e.handle, d_sq);
                }
            }
        }
    }

    /// Ids within `radius` of agent `id`, sorted ascending.
    pub fn neighbors(&self, id: AgentId, radius: f64) -> Result<Vec<AgentId>, SpaceError> {
        let mut out = Vec::new();
        self.for_each_neighbor(id, radius, |n, _, _| out.push(n))?;
        out.sort_unstable();
        Ok(out)
    }

    /// Entry runs of every occupied cell that may hold a point within
    /// `radius` of `point`.
    fn candidate_runs(&self, point: Vec3, radius: f64) -> SmallVec<[(usize, usize); 27]> {
        let centre = key_of(point, self.cell_size);
        let reach = (radius / self.cell_size).ceil().max(1.0);
        let span = 2.0 * reach + 1.0;
        let mut runs = SmallVec::new();

        if span * span * span > self.cells.len() as f64 {
            // Block larger than the occupied set: scan occupied cells instead.
            let reach = reach.min(i32::MAX as f64) as i64;
            for (key, &run) in &self.cells {
                let near = key
                    .iter()
                    .zip(centre.iter())
                    .all(|(&k, &c)| (k as i64 - c as i64).abs() <= reach);
                if near {
                    runs.push(run);
                }
            }
            return runs;
        }

        let reach = reach as i64;
        for dx in -reach..=reach {
            for dy in -reach..=reach {
                for dz in -reach..=reach {
                    let key = match offset(centre, [dx, dy, dz]) {
                        Some(k) => k,
                        None => continue,
                    };
                    if let Some(&run) = self.cells.get(&key) {
                        runs.push(run);
                    }
                }
            }
        }
        runs
    }

    // ── Introspection ───────────────────────────────────────────

    /// Every indexed entry, grouped by cell.
    pub fn entries(&self) -> &[GridEntry] {
        &self.entries
    }

    /// The indexed entry for `id`, if it was present at the last rebuild.
    pub fn entry(&self, id: AgentId) -> Option<&GridEntry> {
        self.by_id.get(&id).map(|&i| &self.entries[i])
    }

    /// Cell key containing `point` under the current cell size.
    pub fn cell_of(&self, point: Vec3) -> CellKey {
        key_of(point, self.cell_size)
    }

    /// Current cell edge length.
    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// Largest agent diameter seen at the last rebuild.
    pub fn largest_diameter(&self) -> f64 {
        self.largest_diameter
    }

    /// Number of indexed agents.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no agents are indexed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of non-empty cells.
    pub fn occupied_cells(&self) -> usize {
        self.cells.len()
    }

    /// Whether [`rebuild`](Self::rebuild) has completed since creation.
    pub fn is_built(&self) -> bool {
        self.built
    }

    /// The sizing rules this grid was created with.
    pub fn config(&self) -> &GridConfig {
        &self.config
    }
}

fn key_of(p: Vec3, cell_size: f64) -> CellKey {
    // Float-to-int `as` saturates; NaN maps to zero.
    [
        (p.x / cell_size).floor() as i32,
        (p.y / cell_size).floor() as i32,
        (p.z / cell_size).floor() as i32,
    ]
}

fn offset(key: CellKey, d: [i64; 3]) -> Option<CellKey> {
    let mut out = [0i32; 3];
    for axis in 0..3 {
        out[axis] = i32::try_from(key[axis] as i64 + d[axis]).ok()?;
    }
    Some(out)
}

//! Locality rebalancing: Z-order sort and even split across partitions.

use tessera_core::{Agent, AgentId, Vec3};

use crate::store::{AgentStore, Partition};

/// Bits per axis in a Morton key (3 × 21 = 63 bits).
const AXIS_BITS: u32 = 21;
const AXIS_OFFSET: i64 = 1 << (AXIS_BITS - 1);
const AXIS_MASK: u64 = (1 << AXIS_BITS) - 1;

/// Summary of a [`AgentStore::rebalance_partitions`] pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RebalanceReport {
    /// Agents that ended up in a different partition or slot.
    pub relocated: usize,
    /// Total agents in the store.
    pub agents: usize,
}

/// Spread the low 21 bits of `v` so that two zero bits follow each bit.
fn spread(v: u64) -> u64 {
    let mut x = v & AXIS_MASK;
    x = (x | (x << 32)) & 0x001f_0000_0000_ffff;
    x = (x | (x << 16)) & 0x001f_0000_ff00_00ff;
    x = (x | (x << 8)) & 0x100f_00f0_0f00_f00f;
    x = (x | (x << 4)) & 0x10c3_0c30_c30c_30c3;
    x = (x | (x << 2)) & 0x1249_2492_4924_9249;
    x
}

fn quantize(coord: f64, cell_size: f64) -> u64 {
    // `as` saturates and maps NaN to zero.
    let cell = (coord / cell_size).floor() as i64;
    cell.saturating_add(AXIS_OFFSET).clamp(0, AXIS_MASK as i64) as u64
}

/// Morton (Z-order) key of the cell containing `p`.
pub fn morton_key(p: Vec3, cell_size: f64) -> u64 {
    spread(quantize(p.x, cell_size))
        | (spread(quantize(p.y, cell_size)) << 1)
        | (spread(quantize(p.z, cell_size)) << 2)
}

impl<A: Agent> AgentStore<A> {
    /// Reorder agents so that spatial neighbours share a partition.
    ///
    /// Agents are sorted by the Morton key of their cell (ties broken by
    /// id, so the result is deterministic) and split into contiguous, even
    /// runs, one per partition. The identity map is rebuilt; every handle
    /// obtained before the call is stale afterwards.
    ///
    /// A non-positive or non-finite `cell_size` falls back to unit cells.
    pub fn rebalance_partitions(&mut self, cell_size: f64) -> RebalanceReport {
        let cell_size = if cell_size > 0.0 && cell_size.is_finite() {
            cell_size
        } else {
            1.0
        };
        let n = self.count(None);
        let parts = self.partitions.len();

        let mut all: Vec<(u64, AgentId, (usize, usize), A)> = Vec::with_capacity(n);
        for (pi, part) in self.partitions.iter_mut().enumerate() {
            let agents = std::mem::take(&mut part.agents);
            let ids = std::mem::take(&mut part.ids);
            for (slot, (id, agent)) in ids.into_iter().zip(agents).enumerate() {
                all.push((morton_key(agent.position(), cell_size), id, (pi, slot), agent));
            }
        }
        all.sort_unstable_by_key(|(key, id, _, _)| (*key, *id));

        let base = n / parts;
        let extra = n % parts;
        let mut relocated = 0;
        let mut items = all.into_iter();
        for (pi, part) in self.partitions.iter_mut().enumerate() {
            let take = base + usize::from(pi < extra);
            *part = Partition::new();
            part.agents.reserve(take);
            part.ids.reserve(take);
            for (slot, (_, id, origin, agent)) in items.by_ref().take(take).enumerate() {
                if origin != (pi, slot) {
                    relocated += 1;
                }
                part.agents.push(agent);
                part.ids.push(id);
            }
        }
        self.rebuild_identity();
        tracing::info!(agents = n, partitions = parts, relocated, "rebalanced partitions");
        RebalanceReport {
            relocated,
            agents: n,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::PartitionId;
    use tessera_test_utils::TestAgent;

    #[test]
    fn morton_interleaves_axes() {
        let origin = morton_key(Vec3::ZERO, 1.0);
        let x = morton_key(Vec3::new(1.0, 0.0, 0.0), 1.0);
        let y = morton_key(Vec3::new(0.0, 1.0, 0.0), 1.0);
        let z = morton_key(Vec3::new(0.0, 0.0, 1.0), 1.0);
        assert_eq!(x - origin, 1);
        assert_eq!(y - origin, 2);
        assert_eq!(z - origin, 4);
    }

    #[test]
    fn morton_tolerates_non_finite() {
        let key = morton_key(Vec3::new(f64::NAN, f64::INFINITY, f64::NEG_INFINITY), 1.0);
        let far = morton_key(Vec3::new(0.0, 1e300, -1e300), 1.0);
        assert_eq!(key, far);
    }

    #[test]
    fn rebalance_keeps_agents_at_infinity() {
        let mut store = AgentStore::new(2).unwrap();
        let lost = store.push(TestAgent::at(Vec3::new(f64::INFINITY, 0.0, 0.0)));
        let home = store.push(TestAgent::at(Vec3::ZERO));
        store.rebalance_partitions(1.0);
        assert_eq!(store.count(None), 2);
        assert!(store.get(lost).is_ok());
        assert!(store.get(home).is_ok());
    }

    #[test]
    fn rebalance_splits_evenly_and_keeps_identity() {
        let mut store = AgentStore::new(3).unwrap();
        let mut ids = Vec::new();
        for i in 0..10 {
            let p = Vec3::new((i * 37 % 10) as f64 * 5.0, 0.0, 0.0);
            ids.push((store.push(TestAgent::at(p)), p));
        }
        let report = store.rebalance_partitions(5.0);
        assert_eq!(report.agents, 10);
        assert_eq!(store.count(Some(PartitionId(0))), 4);
        assert_eq!(store.count(Some(PartitionId(1))), 3);
        assert_eq!(store.count(Some(PartitionId(2))), 3);
        for (id, p) in ids {
            assert_eq!(store.get(id).unwrap().position(), p);
        }
    }

    #[test]
    fn rebalance_groups_neighbours() {
        let mut store = AgentStore::new(2).unwrap();
        // Interleave two distant clusters in insertion order.
        let mut near = Vec::new();
        let mut far = Vec::new();
        for i in 0..4 {
            near.push(store.push(TestAgent::at(Vec3::new(i as f64, 0.0, 0.0))));
            far.push(store.push(TestAgent::at(Vec3::new(1000.0 + i as f64, 0.0, 0.0))));
        }
        store.rebalance_partitions(10.0);
        let near_part = store.handle_of(near[0]).unwrap().partition;
        let far_part = store.handle_of(far[0]).unwrap().partition;
        assert_ne!(near_part, far_part);
        assert!(near.iter().all(|&id| store.handle_of(id).unwrap().partition == near_part));
        assert!(far.iter().all(|&id| store.handle_of(id).unwrap().partition == far_part));
    }
}

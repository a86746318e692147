//! Functional-unit pools (k0, k1, k2) and the state-update (result-bus) array.
//! Both are fixed-capacity bags of optional slots, replacing the source's
//! raw arrays of pointers.

use crate::instruction::Instruction;
use crate::types::FuPool;

pub struct FuSlot {
    pub instr: Instruction,
    pub chosen: bool,
}

/// One fixed-capacity pool of FU slots.
pub struct FuBank {
    slots: Vec<Option<FuSlot>>,
}

impl FuBank {
    pub fn new(capacity: usize) -> Self {
        FuBank {
            slots: (0..capacity).map(|_| None).collect(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn occupied(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Number of slots that will be free for issue next cycle: empty now, or
    /// occupied but already `chosen` (so it vacates at Phase A step 2).
    pub fn available_next_cycle(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| match s {
                None => true,
                Some(slot) => slot.chosen,
            })
            .count()
    }

    /// Places `instr` in the first empty slot. Panics if the pool is full;
    /// the scheduler's admission bookkeeping must never offer more
    /// instructions than `available_next_cycle` reported.
    pub fn admit(&mut self, instr: Instruction) {
        let target = self
            .slots
            .iter_mut()
            .find(|s| s.is_none())
            .expect("FU pool admitted beyond reserved capacity");
        *target = Some(FuSlot {
            instr,
            chosen: false,
        });
    }

    /// Drains all `chosen` slots, freeing them, in arbitrary order (the
    /// caller sorts the drained instructions for the state-update array).
    pub fn drain_chosen(&mut self) -> Vec<Instruction> {
        let mut drained = Vec::new();
        for slot in self.slots.iter_mut() {
            let take = matches!(slot, Some(s) if s.chosen);
            if take {
                if let Some(s) = slot.take() {
                    drained.push(s.instr);
                }
            }
        }
        drained
    }

    pub fn occupied_slots_mut(&mut self) -> impl Iterator<Item = &mut FuSlot> {
        self.slots.iter_mut().filter_map(|s| s.as_mut())
    }

    pub fn occupied_slots(&self) -> impl Iterator<Item = &FuSlot> {
        self.slots.iter().filter_map(|s| s.as_ref())
    }
}

/// The three FU pools together, addressed by `FuPool`.
pub struct FuComplex {
    pub k0: FuBank,
    pub k1: FuBank,
    pub k2: FuBank,
}

impl FuComplex {
    pub fn new(k0_size: usize, k1_size: usize, k2_size: usize) -> Self {
        FuComplex {
            k0: FuBank::new(k0_size),
            k1: FuBank::new(k1_size),
            k2: FuBank::new(k2_size),
        }
    }

    pub fn bank(&self, pool: FuPool) -> &FuBank {
        match pool {
            FuPool::K0 => &self.k0,
            FuPool::K1 => &self.k1,
            FuPool::K2 => &self.k2,
        }
    }

    pub fn bank_mut(&mut self, pool: FuPool) -> &mut FuBank {
        match pool {
            FuPool::K0 => &mut self.k0,
            FuPool::K1 => &mut self.k1,
            FuPool::K2 => &mut self.k2,
        }
    }

    pub fn total_capacity(&self) -> usize {
        self.k0.capacity() + self.k1.capacity() + self.k2.capacity()
    }

    /// Selects up to `r` occupants (across all pools) for the result bus,
    /// ordered by `(execute_cycle, dest_tag)` ascending, and marks them
    /// `chosen = true`.
    pub fn choose_for_result_bus(&mut self, r: usize) {
        let mut candidates: Vec<(u64, u32, FuPool)> = Vec::new();
        for (pool, bank) in [
            (FuPool::K0, &self.k0),
            (FuPool::K1, &self.k1),
            (FuPool::K2, &self.k2),
        ] {
            for slot in bank.occupied_slots() {
                if !slot.chosen {
                    candidates.push((slot.instr.execute_cycle, slot.instr.dest_tag.0, pool));
                }
            }
        }
        candidates.sort_by_key(|&(cycle, tag, _)| (cycle, tag));
        candidates.truncate(r);
        let chosen_tags: Vec<u32> = candidates.iter().map(|&(_, tag, _)| tag).collect();

        for bank in [&mut self.k0, &mut self.k1, &mut self.k2] {
            for slot in bank.occupied_slots_mut() {
                if chosen_tags.contains(&slot.instr.dest_tag.0) {
                    slot.chosen = true;
                }
            }
        }
    }

    /// Drains all chosen slots across all pools, sorted for deterministic
    /// state-update stamping order.
    pub fn drain_all_chosen(&mut self) -> Vec<Instruction> {
        let mut drained = Vec::new();
        drained.extend(self.k0.drain_chosen());
        drained.extend(self.k1.drain_chosen());
        drained.extend(self.k2.drain_chosen());
        drained.sort_by_key(|i| (i.execute_cycle, i.dest_tag.0));
        drained
    }
}

//! The scheduling queue: insertion-ordered, with `fired`/`send_to_execute`/
//! `waiting` control bits, plus the broadcast, firing, and issue arbitration
//! rules.

use crate::functional_unit::FuComplex;
use crate::instruction::Instruction;
use crate::regfile::RegisterFile;
use crate::types::{RegIndex, Tag};

pub struct ScheduleEntry {
    pub instr: Instruction,
    pub fired: bool,
    pub send_to_execute: bool,
    pub waiting: bool,
}

/// Insertion-ordered sequence of in-flight instructions awaiting or ready
/// for issue. Backed by a `Vec` rather than the source's doubly linked list;
/// nothing outside this type holds a handle into its middle across a cycle
/// boundary, so index-based removal is sufficient.
pub struct SchedulingQueue {
    entries: Vec<ScheduleEntry>,
    max_size: usize,
}

impl SchedulingQueue {
    pub fn new(max_size: usize) -> Self {
        SchedulingQueue {
            entries: Vec::new(),
            max_size,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn push_back(&mut self, instr: Instruction) {
        self.entries.push(ScheduleEntry {
            instr,
            fired: false,
            send_to_execute: false,
            waiting: false,
        });
    }

    /// Recomputes `fired` for every entry from its own operand-ready bits.
    /// Idempotent.
    pub fn refresh_fired(&mut self) {
        for e in self.entries.iter_mut() {
            if !e.fired && e.instr.both_ready() {
                e.fired = true;
            }
        }
    }

    /// Broadcasts each completing instruction's result onto the scheduling
    /// queue, clearing matching not-ready sources. A match requires both
    /// register and tag equality, so a stale forward after a WAW overwrite
    /// cannot fire a younger instruction's wrong operand.
    pub fn broadcast(&mut self, completed: &[Instruction]) {
        for done in completed {
            let dest_reg = match done.dest_reg {
                Some(r) => r,
                None => continue,
            };
            for e in self.entries.iter_mut() {
                if !e.instr.src1_ready && e.instr.src1_reg == Some(dest_reg) && e.instr.src1_tag == Some(done.dest_tag) {
                    e.instr.src1_ready = true;
                    e.instr.src1_tag = None;
                }
                if !e.instr.src2_ready && e.instr.src2_reg == Some(dest_reg) && e.instr.src2_tag == Some(done.dest_tag) {
                    e.instr.src2_ready = true;
                    e.instr.src2_tag = None;
                }
                if e.instr.both_ready() {
                    e.fired = true;
                }
            }
        }
    }

    /// Removes every entry whose instruction tag is present in `retired_tags`
    /// (those instructions now live in a state-update slot).
    pub fn remove_completed(&mut self, retired_tags: &[Tag]) {
        self.entries
            .retain(|e| !retired_tags.contains(&e.instr.dest_tag));
    }

    /// Issue arbitration (Phase C step 8): for each FU pool, mark
    /// `send_to_execute = true` on up to `available` fired, non-waiting,
    /// matching-class entries, in insertion order.
    pub fn mark_for_execution(&mut self, fu: &FuComplex) {
        for pool in [
            crate::types::FuPool::K0,
            crate::types::FuPool::K1,
            crate::types::FuPool::K2,
        ] {
            let mut available = fu.bank(pool).available_next_cycle();
            if available == 0 {
                continue;
            }
            for e in self.entries.iter_mut() {
                if available == 0 {
                    break;
                }
                if e.fired && !e.waiting && !e.send_to_execute && e.instr.fu_class.pool() == pool {
                    e.send_to_execute = true;
                    available -= 1;
                }
            }
        }
    }

    /// Moves every `send_to_execute && !waiting` entry into its FU pool,
    /// stamping `execute_cycle`. The scheduling entry is retained with
    /// `waiting = true` until broadcast cleanup removes it.
    pub fn admit_to_execute(&mut self, fu: &mut FuComplex, now: u64) {
        for e in self.entries.iter_mut() {
            if e.send_to_execute && !e.waiting {
                e.instr.execute_cycle = now;
                e.waiting = true;
                let mut instr = e.instr.clone();
                instr.execute_cycle = now;
                fu.bank_mut(e.instr.fu_class.pool()).admit(instr);
            }
        }
    }

    /// Renames sources/claims destination for each newly reserved entry as it
    /// enters the queue (called when admitting from dispatch).
    pub fn rename_on_admit(regfile: &mut RegisterFile, instr: &mut Instruction) {
        regfile.rename(instr);
    }

    pub fn write_back_all(&self, regfile: &mut RegisterFile, completed: &[Instruction]) {
        for done in completed {
            if let Some(reg) = done.dest_reg {
                regfile.write_back(reg, done.dest_tag);
            }
        }
    }

    #[cfg(test)]
    pub fn entries(&self) -> &[ScheduleEntry] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FuClass;

    fn reg(n: i64) -> Option<RegIndex> {
        RegIndex::new(n)
    }

    fn instr(tag: u32, dest: Option<RegIndex>, s1: Option<RegIndex>, s2: Option<RegIndex>) -> Instruction {
        Instruction::new(Tag(tag), 0, FuClass::K0, dest, s1, s2, false, false)
    }

    #[test]
    fn refresh_fired_sets_bit_once_operands_ready() {
        let mut q = SchedulingQueue::new(8);
        let mut i = instr(0, None, None, None);
        i.src1_ready = true;
        i.src2_ready = true;
        q.push_back(i);
        q.refresh_fired();
        assert!(q.entries()[0].fired);
    }

    #[test]
    fn broadcast_clears_matching_tag_and_register() {
        let mut q = SchedulingQueue::new(8);
        let mut waiting = instr(1, None, reg(5), None);
        waiting.src1_tag = Some(Tag(0));
        waiting.src2_ready = true;
        q.push_back(waiting);

        let mut done = instr(0, reg(5), None, None);
        done.execute_cycle = 3;
        q.broadcast(&[done]);
        assert!(q.entries()[0].instr.src1_ready);
        assert!(q.entries()[0].fired);
    }

    #[test]
    fn broadcast_ignores_stale_tag_after_waw() {
        let mut q = SchedulingQueue::new(8);
        let mut waiting = instr(2, None, reg(5), None);
        waiting.src1_tag = Some(Tag(1)); // expects the *younger* producer
        waiting.src2_ready = true;
        q.push_back(waiting);

        let mut stale_done = instr(0, reg(5), None, None); // older producer of same reg
        stale_done.execute_cycle = 1;
        q.broadcast(&[stale_done]);
        assert!(!q.entries()[0].instr.src1_ready);
    }

    #[test]
    fn mark_for_execution_respects_pool_capacity() {
        let mut q = SchedulingQueue::new(8);
        for t in 0..3 {
            let mut i = instr(t, None, None, None);
            i.src1_ready = true;
            i.src2_ready = true;
            q.push_back(i);
        }
        q.refresh_fired();
        let fu = FuComplex::new(1, 1, 1);
        q.mark_for_execution(&fu);
        let marked = q.entries().iter().filter(|e| e.send_to_execute).count();
        assert_eq!(marked, 1);
    }
}

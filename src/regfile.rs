//! 128-entry register file: ready bit + producer tag per entry.

use crate::instruction::Instruction;
use crate::types::{RegIndex, Tag};

#[derive(Clone, Copy, Debug)]
struct Entry {
    ready: bool,
    producer: Option<Tag>,
}

pub struct RegisterFile {
    entries: Vec<Entry>,
}

impl RegisterFile {
    pub fn new(num_regs: usize) -> Self {
        RegisterFile {
            entries: vec![
                Entry {
                    ready: true,
                    producer: None
                };
                num_regs
            ],
        }
    }

    /// Renames `instr`'s sources against the current file contents, then
    /// claims `instr`'s destination (if any) as the new producer. Mirrors
    /// `readUpdateRegFile`'s per-instruction order: read sources first, then
    /// write the destination, so an instruction never renames against its
    /// own destination write.
    pub fn rename(&mut self, instr: &mut Instruction) {
        if let Some(reg) = instr.src1_reg {
            let e = self.entries[reg.index()];
            instr.src1_ready = e.ready;
            instr.src1_tag = if e.ready { None } else { e.producer };
        } else {
            instr.src1_ready = true;
            instr.src1_tag = None;
        }

        if let Some(reg) = instr.src2_reg {
            let e = self.entries[reg.index()];
            instr.src2_ready = e.ready;
            instr.src2_tag = if e.ready { None } else { e.producer };
        } else {
            instr.src2_ready = true;
            instr.src2_tag = None;
        }

        if let Some(reg) = instr.dest_reg {
            self.entries[reg.index()] = Entry {
                ready: false,
                producer: Some(instr.dest_tag),
            };
        }
    }

    /// Write-back at state update: clears the ready bit's owner only if no
    /// younger writer has since claimed the entry.
    pub fn write_back(&mut self, reg: RegIndex, producer: Tag) {
        let e = &mut self.entries[reg.index()];
        if e.producer == Some(producer) {
            e.ready = true;
            e.producer = None;
        }
    }
}

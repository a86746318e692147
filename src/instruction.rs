//! The instruction record threaded through every pipeline stage.

use crate::types::{FuClass, RegIndex, Tag};

/// One instruction from the trace, carrying both its static identity and the
/// per-cycle timestamps/operand state accumulated as it moves through the
/// pipeline.
#[derive(Clone, Debug)]
pub struct Instruction {
    pub dest_tag: Tag,
    pub pc: u64,
    pub fu_class: FuClass,
    pub dest_reg: Option<RegIndex>,
    pub src1_reg: Option<RegIndex>,
    pub src2_reg: Option<RegIndex>,

    pub src1_ready: bool,
    pub src1_tag: Option<Tag>,
    pub src2_ready: bool,
    pub src2_tag: Option<Tag>,

    pub fetch_cycle: u64,
    pub dispatch_cycle: u64,
    pub schedule_cycle: u64,
    pub execute_cycle: u64,
    pub state_cycle: u64,

    pub is_branch: bool,
    pub taken: bool,
    pub predicted_correct: bool,
    pub resolved: bool,
    /// Predictor `(row, col)` used when this instruction was predicted, so
    /// resolution updates the exact same counter. Unused for non-branches.
    pub predictor_row: usize,
    pub predictor_col: usize,
}

impl Instruction {
    pub fn new(
        dest_tag: Tag,
        pc: u64,
        fu_class: FuClass,
        dest_reg: Option<RegIndex>,
        src1_reg: Option<RegIndex>,
        src2_reg: Option<RegIndex>,
        is_branch: bool,
        taken: bool,
    ) -> Self {
        Instruction {
            dest_tag,
            pc,
            fu_class,
            dest_reg,
            src1_reg,
            src2_reg,
            src1_ready: false,
            src1_tag: None,
            src2_ready: false,
            src2_tag: None,
            fetch_cycle: 0,
            dispatch_cycle: 0,
            schedule_cycle: 0,
            execute_cycle: 0,
            state_cycle: 0,
            is_branch,
            taken,
            predicted_correct: false,
            resolved: false,
            predictor_row: 0,
            predictor_col: 0,
        }
    }

    pub fn both_ready(&self) -> bool {
        self.src1_ready && self.src2_ready
    }
}

//! Fragment cycle scheduler
//!
//! Placement is two-phase. The interpolation preamble is reserved in cycle 0
//! before any user code is seen; user cycles are then placed in order, the
//! first one sharing cycle 0 when it leaves the preamble's units alone.

use tracing::trace;

use super::types::*;

/// Register the preamble takes the reciprocal of
pub const PREAMBLE_SFU_REG: u8 = 4;

/// MFU content of the interpolation preamble
pub fn preamble() -> FpMfuInstr {
    let weight = |coef| FpMul {
        dst: FpMulDst::BarycentricWeight,
        src: [FpMulSrc::SfuResult, coef],
    };
    FpMfuInstr {
        var: [FpVar::default(); 4],
        sfu: FpSfu {
            op: FpSfuOp::Rcp,
            reg: PREAMBLE_SFU_REG,
        },
        mul: [
            weight(FpMulSrc::BarycentricCoef0),
            weight(FpMulSrc::BarycentricCoef1),
        ],
    }
}

/// Places fragment cycles
#[derive(Debug, Clone)]
pub struct Scheduler {
    cycles: Vec<FpInstr>,
    /// Cycle 0 still holds nothing but the preamble
    preamble_alone: bool,
}

impl Scheduler {
    pub fn new() -> Self {
        let head = FpInstr {
            mfu: preamble(),
            ..Default::default()
        };
        Self {
            cycles: vec![head],
            preamble_alone: true,
        }
    }

    /// Place a user cycle and return its address.
    pub fn place(&mut self, instr: FpInstr) -> usize {
        if self.preamble_alone {
            self.preamble_alone = false;
            if !instr.mfu.uses_math() {
                let head = &mut self.cycles[0];
                head.alu = instr.alu;
                head.mfu.var = instr.mfu.var;
                head.dw = instr.dw;
                trace!("FP cycle 0 shared with preamble");
                return 0;
            }
        }

        self.cycles.push(instr);
        trace!("FP cycle {} placed", self.cycles.len() - 1);
        self.cycles.len() - 1
    }

    pub fn len(&self) -> usize {
        self.cycles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cycles.is_empty()
    }

    pub fn finish(self) -> Vec<FpInstr> {
        self.cycles
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_cycle(row: u8) -> FpInstr {
        let mut instr = FpInstr::default();
        instr.alu[0] = FpAluInstr::mov(
            FpAluDst {
                index: 2,
                enable: true,
                ..Default::default()
            },
            FpAluSrc::row(0),
        );
        instr.mfu.var[0] = FpVar {
            op: FpVarOp::Fp20,
            tram_row: row,
        };
        instr
    }

    #[test]
    fn test_preamble_only() {
        let cycles = Scheduler::new().finish();
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].mfu, preamble());
        assert_eq!(cycles[0].active_lanes(), 0);
    }

    #[test]
    fn test_first_cycle_shares_preamble() {
        let mut sched = Scheduler::new();
        assert_eq!(sched.place(user_cycle(1)), 0);
        assert_eq!(sched.place(user_cycle(2)), 1);

        let cycles = sched.finish();
        assert_eq!(cycles.len(), 2);
        // The preamble survives the merge.
        assert_eq!(cycles[0].mfu.sfu.op, FpSfuOp::Rcp);
        assert_eq!(cycles[0].mfu.mul, preamble().mul);
        assert_eq!(cycles[0].mfu.var[0].tram_row, 1);
        assert_eq!(cycles[1].mfu.sfu.op, FpSfuOp::Nop);
    }

    #[test]
    fn test_math_user_cycle_gets_own_slot() {
        let mut sched = Scheduler::new();
        let mut instr = user_cycle(1);
        instr.mfu.sfu.op = FpSfuOp::Rsq;
        assert_eq!(sched.place(instr), 1);
        assert_eq!(sched.place(user_cycle(2)), 2);
    }
}

//! VPE instruction builder
//!
//! Lowers one source instruction into exactly one co-issued VPE instruction.
//! There is no scheduling or pairing; the unused half is left as a NOP.

use tgr_core::{Result, Stage, UnsupportedError};
use tracing::trace;

use super::types::{ScalarInstr, ScalarOpcode, VecInstr, VecOpcode, VpeInstr};
use crate::input::{Instruction, Opcode};
use crate::operand::{OperandTranslator, SrcOperand};

/// Source instructions the VPE builder accepts
pub const SUPPORTED_OPCODES: &[Opcode] = &[
    Opcode::Mov,
    Opcode::Add,
    Opcode::Mul,
    Opcode::Mad,
    Opcode::Dp3,
    Opcode::Dp4,
    Opcode::Dph,
    Opcode::Slt,
    Opcode::Sge,
    Opcode::Min,
    Opcode::Max,
    Opcode::Frc,
    Opcode::Flr,
    Opcode::Rsq,
    Opcode::Rcp,
    Opcode::Ex2,
    Opcode::Lg2,
    Opcode::End,
];

/// How a vector opcode routes its sources into the three operand slots
#[derive(Debug, Clone, Copy)]
enum Routing {
    /// One source in slot 0
    Unary,
    /// Two sources in slots 0 and 1
    Binary,
    /// Two sources in slots 0 and 2; slot 1 stays undefined
    Add,
    /// Three sources in slots 0, 1 and 2
    Ternary,
}

fn vec_opcode(op: Opcode) -> Option<(VecOpcode, Routing)> {
    let lowered = match op {
        Opcode::Mov => (VecOpcode::Mov, Routing::Unary),
        Opcode::Frc => (VecOpcode::Frc, Routing::Unary),
        Opcode::Flr => (VecOpcode::Flr, Routing::Unary),
        Opcode::Add => (VecOpcode::Add, Routing::Add),
        Opcode::Mul => (VecOpcode::Mul, Routing::Binary),
        Opcode::Dp3 => (VecOpcode::Dp3, Routing::Binary),
        Opcode::Dp4 => (VecOpcode::Dp4, Routing::Binary),
        Opcode::Dph => (VecOpcode::Dph, Routing::Binary),
        Opcode::Slt => (VecOpcode::Slt, Routing::Binary),
        Opcode::Sge => (VecOpcode::Sge, Routing::Binary),
        Opcode::Min => (VecOpcode::Min, Routing::Binary),
        Opcode::Max => (VecOpcode::Max, Routing::Binary),
        Opcode::Mad => (VecOpcode::Mad, Routing::Ternary),
        _ => return None,
    };
    Some(lowered)
}

fn scalar_opcode(op: Opcode) -> Option<ScalarOpcode> {
    match op {
        Opcode::Rsq => Some(ScalarOpcode::Rsq),
        Opcode::Rcp => Some(ScalarOpcode::Rcp),
        Opcode::Ex2 => Some(ScalarOpcode::Ex2),
        Opcode::Lg2 => Some(ScalarOpcode::Lg2),
        _ => None,
    }
}

/// Builds VPE instruction records from source instructions
#[derive(Debug, Clone, Copy, Default)]
pub struct VpeBuilder {
    operands: OperandTranslator,
}

impl VpeBuilder {
    pub fn new(operands: OperandTranslator) -> Self {
        Self { operands }
    }

    /// Lower one instruction. `END` produces nothing.
    pub fn build(&self, instr: &Instruction) -> Result<Option<VpeInstr>> {
        if instr.opcode == Opcode::End {
            return Ok(None);
        }

        if let Some((op, routing)) = vec_opcode(instr.opcode) {
            let dst = self.operands.dst(instr.dst()?, instr.saturate)?;
            let mut src = [SrcOperand::undef(); 3];
            let slots: &[usize] = match routing {
                Routing::Unary => &[0],
                Routing::Binary => &[0, 1],
                Routing::Add => &[0, 2],
                Routing::Ternary => &[0, 1, 2],
            };
            for (i, &slot) in slots.iter().enumerate() {
                src[slot] = self.operands.src(instr.src(i)?)?;
            }

            let vpe = VpeInstr::new(VecInstr { op, dst, src }, ScalarInstr::nop());
            trace!("VPE {} -> {:?}", instr.opcode.name(), vpe);
            return Ok(Some(vpe));
        }

        if let Some(op) = scalar_opcode(instr.opcode) {
            let scalar = ScalarInstr {
                op,
                dst: self.operands.dst(instr.dst()?, instr.saturate)?,
                src: self.operands.src(instr.src(0)?)?,
            };
            let vpe = VpeInstr::new(VecInstr::nop(), scalar);
            trace!("VPE {} -> {:?}", instr.opcode.name(), vpe);
            return Ok(Some(vpe));
        }

        Err(UnsupportedError::Opcode {
            opcode: instr.opcode.name().to_string(),
            stage: Stage::Vertex,
        }
        .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{DstRegister, RegisterFile, SrcRegister};
    use crate::operand::{DstFile, SrcFile, WriteMask};
    use tgr_core::CompileError;

    fn out0() -> DstRegister {
        DstRegister::new(RegisterFile::Output, 0)
    }

    #[test]
    fn test_add_leaves_slot_one_undefined() {
        let instr = Instruction::new(Opcode::Add)
            .with_dst(out0())
            .with_src(SrcRegister::new(RegisterFile::Input, 0))
            .with_src(SrcRegister::new(RegisterFile::Constant, 0));
        let vpe = VpeBuilder::default().build(&instr).unwrap().unwrap();
        assert_eq!(vpe.vec.op, VecOpcode::Add);
        assert_eq!(vpe.vec.src[0], SrcOperand::attribute(0));
        assert!(vpe.vec.src[1].is_undef());
        assert_eq!(vpe.vec.src[2], SrcOperand::uniform(0));
    }

    #[test]
    fn test_mad_uses_all_slots() {
        let instr = Instruction::new(Opcode::Mad)
            .with_dst(DstRegister::new(RegisterFile::Temporary, 1))
            .with_src(SrcRegister::new(RegisterFile::Temporary, 0))
            .with_src(SrcRegister::new(RegisterFile::Constant, 3))
            .with_src(SrcRegister::new(RegisterFile::Input, 1));
        let vpe = VpeBuilder::default().build(&instr).unwrap().unwrap();
        assert_eq!(vpe.vec.src[1].file, SrcFile::Uniform);
        assert_eq!(vpe.vec.src[2].file, SrcFile::Attribute);
        assert_eq!(vpe.vec.dst.file, DstFile::Temporary);
    }

    #[test]
    fn test_scalar_op_pairs_with_vector_nop() {
        let instr = Instruction::new(Opcode::Rsq)
            .with_dst(DstRegister::new(RegisterFile::Temporary, 2).masked(WriteMask::X))
            .with_src(SrcRegister::new(RegisterFile::Temporary, 1))
            .saturated();
        let vpe = VpeBuilder::default().build(&instr).unwrap().unwrap();
        assert_eq!(vpe.vec.op, VecOpcode::Nop);
        assert_eq!(vpe.scalar.op, ScalarOpcode::Rsq);
        assert_eq!(vpe.scalar.dst.write_mask, WriteMask::X);
        assert!(vpe.scalar.dst.saturate);
    }

    #[test]
    fn test_end_is_skipped() {
        let instr = Instruction::new(Opcode::End);
        assert_eq!(VpeBuilder::default().build(&instr).unwrap(), None);
    }

    #[test]
    fn test_unsupported_opcode() {
        let instr = Instruction::new(Opcode::Lit)
            .with_dst(out0())
            .with_src(SrcRegister::new(RegisterFile::Input, 0));
        assert!(matches!(
            VpeBuilder::default().build(&instr),
            Err(CompileError::Unsupported(UnsupportedError::Opcode { .. }))
        ));
    }

    #[test]
    fn test_missing_source_is_malformed() {
        let instr = Instruction::new(Opcode::Mul)
            .with_dst(out0())
            .with_src(SrcRegister::new(RegisterFile::Input, 0));
        assert!(matches!(
            VpeBuilder::default().build(&instr),
            Err(CompileError::Unsupported(UnsupportedError::Malformed(_)))
        ));
    }
}

//! Fragment processor packers
//!
//! Three independent serializers, one per sub-pipeline. Each writes its
//! record through its own field table and can read the words back.

use std::fmt;

use tgr_core::Result;

use super::layout::{alu, dw, mfu, AluSrcFields};
use super::types::*;
use crate::bits::Packed;

/// ALU / MFU / depth-write packer
pub struct FpPacker;

impl FpPacker {
    pub fn pack_alu(instr: &FpAluInstr) -> Result<[u32; 2]> {
        let mut w = Packed::<2>::new();
        for (src, fields) in instr.src.iter().zip(alu::SRC.iter()) {
            Self::pack_alu_src(&mut w, fields, src)?;
        }
        w.set(alu::OP, instr.op as u32)?;
        w.set(alu::DST_INDEX, u32::from(instr.dst.index))?;
        w.set_bool(alu::DST_WRITE_LOW, instr.dst.write_low_sub_reg)?;
        w.set_bool(alu::DST_WRITE_HIGH, instr.dst.write_high_sub_reg)?;
        w.set_bool(alu::DST_SATURATE, instr.dst.saturate)?;
        w.set_bool(alu::DST_ENABLE, instr.dst.enable)?;
        Ok(w.to_words())
    }

    fn pack_alu_src(w: &mut Packed<2>, fields: &AluSrcFields, src: &FpAluSrc) -> Result<()> {
        w.set(fields.index, u32::from(src.index))?;
        w.set(fields.datatype, src.datatype as u32)?;
        w.set_bool(fields.sub_reg_select_high, src.sub_reg_select_high)?;
        w.set_bool(fields.negate, src.negate)?;
        w.set_bool(fields.absolute, src.absolute)?;
        w.set_bool(fields.minus_one, src.minus_one)?;
        w.set_bool(fields.scale_by_two, src.scale_by_two)
    }

    pub fn unpack_alu(words: [u32; 2]) -> FpAluInstr {
        let w = Packed::from_words(words);
        let src = alu::SRC.map(|f| FpAluSrc {
            index: w.get(f.index) as u8,
            datatype: FpDatatype::from_bits(w.get(f.datatype)),
            sub_reg_select_high: w.get_bool(f.sub_reg_select_high),
            negate: w.get_bool(f.negate),
            absolute: w.get_bool(f.absolute),
            minus_one: w.get_bool(f.minus_one),
            scale_by_two: w.get_bool(f.scale_by_two),
        });
        FpAluInstr {
            op: FpAluOp::from_bits(w.get(alu::OP)),
            dst: FpAluDst {
                index: w.get(alu::DST_INDEX) as u8,
                write_low_sub_reg: w.get_bool(alu::DST_WRITE_LOW),
                write_high_sub_reg: w.get_bool(alu::DST_WRITE_HIGH),
                saturate: w.get_bool(alu::DST_SATURATE),
                enable: w.get_bool(alu::DST_ENABLE),
            },
            src,
        }
    }

    pub fn pack_mfu(instr: &FpMfuInstr) -> Result<[u32; 2]> {
        let mut w = Packed::<2>::new();
        for (var, fields) in instr.var.iter().zip(mfu::VAR.iter()) {
            w.set(fields.op, var.op as u32)?;
            w.set(fields.tram_row, u32::from(var.tram_row))?;
        }
        for (mul, fields) in instr.mul.iter().zip(mfu::MUL.iter()) {
            w.set(fields.dst, mul.dst as u32)?;
            w.set(fields.src[0], mul.src[0] as u32)?;
            w.set(fields.src[1], mul.src[1] as u32)?;
        }
        w.set(mfu::SFU_OP, instr.sfu.op as u32)?;
        w.set(mfu::SFU_REG, u32::from(instr.sfu.reg))?;
        Ok(w.to_words())
    }

    pub fn unpack_mfu(words: [u32; 2]) -> FpMfuInstr {
        let w = Packed::from_words(words);
        FpMfuInstr {
            var: mfu::VAR.map(|f| FpVar {
                op: FpVarOp::from_bits(w.get(f.op)),
                tram_row: w.get(f.tram_row) as u8,
            }),
            sfu: FpSfu {
                op: FpSfuOp::from_bits(w.get(mfu::SFU_OP)),
                reg: w.get(mfu::SFU_REG) as u8,
            },
            mul: mfu::MUL.map(|f| FpMul {
                dst: FpMulDst::from_bits(w.get(f.dst)),
                src: f.src.map(|s| FpMulSrc::from_bits(w.get(s))),
            }),
        }
    }

    pub fn pack_dw(instr: &FpDwInstr) -> Result<u32> {
        let mut w = Packed::<1>::new();
        w.set_bool(dw::ENABLE, instr.enable)?;
        w.set(dw::INDEX, u32::from(instr.index))?;
        w.set_bool(dw::STENCIL_WRITE, instr.stencil_write)?;
        w.set(dw::SRC_REGS, instr.src_regs as u32)?;
        Ok(w.to_words()[0])
    }

    pub fn unpack_dw(word: u32) -> FpDwInstr {
        let w = Packed::from_words([word]);
        FpDwInstr {
            enable: w.get_bool(dw::ENABLE),
            index: w.get(dw::INDEX) as u8,
            stencil_write: w.get_bool(dw::STENCIL_WRITE),
            src_regs: FpDwRegs::from_bits(w.get(dw::SRC_REGS)),
        }
    }
}

fn fmt_alu_src(f: &mut fmt::Formatter<'_>, src: &FpAluSrc) -> fmt::Result {
    let name = match src.index {
        i if i < NUM_ROWS => format!("row{}", i),
        i if (GENERAL_BASE..GENERAL_BASE + NUM_GENERAL).contains(&i) => {
            format!("r{}", i - GENERAL_BASE)
        }
        CONST_INDEX => {
            return write!(f, "#{}", if src.sub_reg_select_high { 1 } else { 0 });
        }
        i => format!("?{}", i),
    };
    let name = if src.absolute {
        format!("|{}|", name)
    } else {
        name
    };
    if src.negate {
        write!(f, "-{}", name)
    } else {
        write!(f, "{}", name)
    }
}

impl fmt::Display for FpAluInstr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_nop() {
            return write!(f, "NOP");
        }
        let half = match (self.dst.write_low_sub_reg, self.dst.write_high_sub_reg) {
            (true, false) => ".l",
            (false, true) => ".h",
            _ => "",
        };
        let sat = if self.dst.saturate { "_SAT" } else { "" };
        write!(f, "{}{} r{}{}", self.op.name(), sat, self.dst.index, half)?;
        for src in &self.src {
            write!(f, ", ")?;
            fmt_alu_src(f, src)?;
        }
        Ok(())
    }
}

//! VPE instruction records
//!
//! One VPE instruction co-issues a vector op and a scalar op. The records here
//! are the builder's output and the packer's input.

use serde::Serialize;

use crate::operand::{DstOperand, SrcOperand};

/// Vertex program vector opcodes
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum VecOpcode {
    Nop = 0x00,
    Mov = 0x01,
    Mul = 0x02,
    Add = 0x03,
    Mad = 0x04,
    Dp3 = 0x05,
    Dph = 0x06,
    Dp4 = 0x07,
    Dst = 0x08,
    Min = 0x09,
    Max = 0x0A,
    Slt = 0x0B,
    Sge = 0x0C,
    Arl = 0x0D,
    Frc = 0x0E,
    Flr = 0x0F,
    Seq = 0x10,
    Sfl = 0x11,
    Sgt = 0x12,
    Sle = 0x13,
    Sne = 0x14,
    Str = 0x15,
    Ssg = 0x16,
    Txl = 0x19,
}

impl From<u8> for VecOpcode {
    fn from(v: u8) -> Self {
        match v {
            0x01 => VecOpcode::Mov,
            0x02 => VecOpcode::Mul,
            0x03 => VecOpcode::Add,
            0x04 => VecOpcode::Mad,
            0x05 => VecOpcode::Dp3,
            0x06 => VecOpcode::Dph,
            0x07 => VecOpcode::Dp4,
            0x08 => VecOpcode::Dst,
            0x09 => VecOpcode::Min,
            0x0A => VecOpcode::Max,
            0x0B => VecOpcode::Slt,
            0x0C => VecOpcode::Sge,
            0x0D => VecOpcode::Arl,
            0x0E => VecOpcode::Frc,
            0x0F => VecOpcode::Flr,
            0x10 => VecOpcode::Seq,
            0x11 => VecOpcode::Sfl,
            0x12 => VecOpcode::Sgt,
            0x13 => VecOpcode::Sle,
            0x14 => VecOpcode::Sne,
            0x15 => VecOpcode::Str,
            0x16 => VecOpcode::Ssg,
            0x19 => VecOpcode::Txl,
            _ => VecOpcode::Nop,
        }
    }
}

impl VecOpcode {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Nop => "NOP",
            Self::Mov => "MOV",
            Self::Mul => "MUL",
            Self::Add => "ADD",
            Self::Mad => "MAD",
            Self::Dp3 => "DP3",
            Self::Dph => "DPH",
            Self::Dp4 => "DP4",
            Self::Dst => "DST",
            Self::Min => "MIN",
            Self::Max => "MAX",
            Self::Slt => "SLT",
            Self::Sge => "SGE",
            Self::Arl => "ARL",
            Self::Frc => "FRC",
            Self::Flr => "FLR",
            Self::Seq => "SEQ",
            Self::Sfl => "SFL",
            Self::Sgt => "SGT",
            Self::Sle => "SLE",
            Self::Sne => "SNE",
            Self::Str => "STR",
            Self::Ssg => "SSG",
            Self::Txl => "TXL",
        }
    }
}

/// Vertex program scalar opcodes
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ScalarOpcode {
    Nop = 0x00,
    Mov = 0x01,
    Rcp = 0x02,
    Rcc = 0x03,
    Rsq = 0x04,
    Exp = 0x05,
    Log = 0x06,
    Lit = 0x07,
    Bra = 0x08,
    Bri = 0x09,
    Cal = 0x0A,
    Cli = 0x0B,
    Ret = 0x0C,
    Lg2 = 0x0D,
    Ex2 = 0x0E,
    Sin = 0x0F,
    Cos = 0x10,
}

impl From<u8> for ScalarOpcode {
    fn from(v: u8) -> Self {
        match v {
            0x01 => ScalarOpcode::Mov,
            0x02 => ScalarOpcode::Rcp,
            0x03 => ScalarOpcode::Rcc,
            0x04 => ScalarOpcode::Rsq,
            0x05 => ScalarOpcode::Exp,
            0x06 => ScalarOpcode::Log,
            0x07 => ScalarOpcode::Lit,
            0x08 => ScalarOpcode::Bra,
            0x09 => ScalarOpcode::Bri,
            0x0A => ScalarOpcode::Cal,
            0x0B => ScalarOpcode::Cli,
            0x0C => ScalarOpcode::Ret,
            0x0D => ScalarOpcode::Lg2,
            0x0E => ScalarOpcode::Ex2,
            0x0F => ScalarOpcode::Sin,
            0x10 => ScalarOpcode::Cos,
            _ => ScalarOpcode::Nop,
        }
    }
}

impl ScalarOpcode {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Nop => "NOP",
            Self::Mov => "MOV",
            Self::Rcp => "RCP",
            Self::Rcc => "RCC",
            Self::Rsq => "RSQ",
            Self::Exp => "EXP",
            Self::Log => "LOG",
            Self::Lit => "LIT",
            Self::Bra => "BRA",
            Self::Bri => "BRI",
            Self::Cal => "CAL",
            Self::Cli => "CLI",
            Self::Ret => "RET",
            Self::Lg2 => "LG2",
            Self::Ex2 => "EX2",
            Self::Sin => "SIN",
            Self::Cos => "COS",
        }
    }
}

/// Vector half of a VPE instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VecInstr {
    pub op: VecOpcode,
    pub dst: DstOperand,
    pub src: [SrcOperand; 3],
}

impl VecInstr {
    pub const fn nop() -> Self {
        Self {
            op: VecOpcode::Nop,
            dst: DstOperand::undef(),
            src: [SrcOperand::undef(); 3],
        }
    }
}

/// Scalar half of a VPE instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScalarInstr {
    pub op: ScalarOpcode,
    pub dst: DstOperand,
    pub src: SrcOperand,
}

impl ScalarInstr {
    pub const fn nop() -> Self {
        Self {
            op: ScalarOpcode::Nop,
            dst: DstOperand::undef(),
            src: SrcOperand::undef(),
        }
    }
}

/// A complete co-issued VPE instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VpeInstr {
    pub vec: VecInstr,
    pub scalar: ScalarInstr,
}

impl VpeInstr {
    pub fn new(vec: VecInstr, scalar: ScalarInstr) -> Self {
        Self { vec, scalar }
    }

    /// Whether either half writes the output file
    pub fn writes_output(&self) -> bool {
        self.vec.dst.is_output() || self.scalar.dst.is_output()
    }
}

impl Default for VpeInstr {
    fn default() -> Self {
        Self::new(VecInstr::nop(), ScalarInstr::nop())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opcode_encoding() {
        assert_eq!(VecOpcode::Mov as u8, 1);
        assert_eq!(VecOpcode::Add as u8, 3);
        assert_eq!(VecOpcode::Mad as u8, 4);
        assert_eq!(ScalarOpcode::Rsq as u8, 4);
    }

    #[test]
    fn test_opcode_from_bits() {
        for op in [VecOpcode::Mov, VecOpcode::Dp4, VecOpcode::Slt, VecOpcode::Txl] {
            assert_eq!(VecOpcode::from(op as u8), op);
        }
        assert_eq!(VecOpcode::from(0x1F), VecOpcode::Nop);
        assert_eq!(ScalarOpcode::from(ScalarOpcode::Ex2 as u8), ScalarOpcode::Ex2);
    }
}

//! Fragment processor instruction records
//!
//! One fragment cycle ([`FpInstr`]) carries an ALU packet of four lanes, one
//! MFU record and one depth-write record.

use serde::Serialize;

/// Interpolated rows addressable by an ALU source
pub const NUM_ROWS: u8 = 16;
/// General registers r0..r7
pub const NUM_GENERAL: u8 = 8;
/// ALU source index of r0
pub const GENERAL_BASE: u8 = 16;
/// ALU source index of the constant unit (0.0 / 1.0)
pub const CONST_INDEX: u8 = 31;
/// ALU lanes per packet
pub const ALU_LANES: usize = 4;

/// ALU operation
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum FpAluOp {
    #[default]
    Mad = 0,
    Min = 1,
    Max = 2,
    Csel = 3,
}

impl FpAluOp {
    pub fn from_bits(v: u32) -> Self {
        match v & 0x3 {
            1 => Self::Min,
            2 => Self::Max,
            3 => Self::Csel,
            _ => Self::Mad,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Mad => "MAD",
            Self::Min => "MIN",
            Self::Max => "MAX",
            Self::Csel => "CSEL",
        }
    }
}

/// Operand data type
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum FpDatatype {
    #[default]
    Fp20 = 0,
    Fixed10 = 1,
}

impl FpDatatype {
    pub fn from_bits(v: u32) -> Self {
        if v & 1 != 0 {
            Self::Fixed10
        } else {
            Self::Fp20
        }
    }
}

/// ALU source operand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct FpAluSrc {
    /// Rows 0..15, general registers 16..23, constant 31
    pub index: u8,
    pub datatype: FpDatatype,
    pub sub_reg_select_high: bool,
    pub negate: bool,
    pub absolute: bool,
    pub minus_one: bool,
    pub scale_by_two: bool,
}

impl FpAluSrc {
    pub fn row(row: u8) -> Self {
        debug_assert!(row < NUM_ROWS);
        Self {
            index: row,
            ..Default::default()
        }
    }

    pub fn reg(reg: u8) -> Self {
        debug_assert!(reg < NUM_GENERAL);
        Self {
            index: GENERAL_BASE + reg,
            ..Default::default()
        }
    }

    /// Constant 0.0
    pub fn zero() -> Self {
        Self {
            index: CONST_INDEX,
            datatype: FpDatatype::Fixed10,
            ..Default::default()
        }
    }

    /// Constant 1.0
    pub fn one() -> Self {
        Self {
            index: CONST_INDEX,
            datatype: FpDatatype::Fixed10,
            sub_reg_select_high: true,
            ..Default::default()
        }
    }
}

/// ALU destination operand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct FpAluDst {
    pub index: u8,
    pub write_low_sub_reg: bool,
    pub write_high_sub_reg: bool,
    pub saturate: bool,
    pub enable: bool,
}

/// One ALU lane
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct FpAluInstr {
    pub op: FpAluOp,
    pub dst: FpAluDst,
    pub src: [FpAluSrc; 4],
}

impl FpAluInstr {
    /// Disabled lane, packs to all zeros
    pub fn nop() -> Self {
        Self::default()
    }

    /// `dst = src * 1 + 0 * 1`
    pub fn mov(dst: FpAluDst, src: FpAluSrc) -> Self {
        Self {
            op: FpAluOp::Mad,
            dst,
            src: [src, FpAluSrc::one(), FpAluSrc::zero(), FpAluSrc::one()],
        }
    }

    pub fn is_nop(&self) -> bool {
        !self.dst.enable
    }
}

/// Variable-load operation
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum FpVarOp {
    #[default]
    Nop = 0,
    Fp20 = 1,
    Fx10 = 2,
}

impl FpVarOp {
    pub fn from_bits(v: u32) -> Self {
        match v & 0x3 {
            1 => Self::Fp20,
            2 => Self::Fx10,
            _ => Self::Nop,
        }
    }
}

/// One variable-load lane: TRAM row into a row register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct FpVar {
    pub op: FpVarOp,
    pub tram_row: u8,
}

/// Special function unit operation
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum FpSfuOp {
    #[default]
    Nop = 0,
    Rcp = 1,
    Rsq = 2,
    Lg2 = 3,
    Ex2 = 4,
    Sqrt = 5,
    Sin = 6,
    Cos = 7,
    Frc = 8,
}

impl FpSfuOp {
    pub fn from_bits(v: u32) -> Self {
        match v {
            1 => Self::Rcp,
            2 => Self::Rsq,
            3 => Self::Lg2,
            4 => Self::Ex2,
            5 => Self::Sqrt,
            6 => Self::Sin,
            7 => Self::Cos,
            8 => Self::Frc,
            _ => Self::Nop,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct FpSfu {
    pub op: FpSfuOp,
    pub reg: u8,
}

/// MFU multiplier destination
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum FpMulDst {
    #[default]
    Nop = 0,
    BarycentricWeight = 1,
}

impl FpMulDst {
    pub fn from_bits(v: u32) -> Self {
        match v {
            1 => Self::BarycentricWeight,
            _ => Self::Nop,
        }
    }
}

/// MFU multiplier source
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum FpMulSrc {
    #[default]
    Zero = 0,
    SfuResult = 1,
    BarycentricCoef0 = 2,
    BarycentricCoef1 = 3,
}

impl FpMulSrc {
    pub fn from_bits(v: u32) -> Self {
        match v {
            1 => Self::SfuResult,
            2 => Self::BarycentricCoef0,
            3 => Self::BarycentricCoef1,
            _ => Self::Zero,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct FpMul {
    pub dst: FpMulDst,
    pub src: [FpMulSrc; 2],
}

impl FpMul {
    pub fn is_nop(&self) -> bool {
        self.dst == FpMulDst::Nop
    }
}

/// MFU record of one cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct FpMfuInstr {
    pub var: [FpVar; 4],
    pub sfu: FpSfu,
    pub mul: [FpMul; 2],
}

impl FpMfuInstr {
    /// Whether the SFU or either multiplier is in use
    pub fn uses_math(&self) -> bool {
        self.sfu.op != FpSfuOp::Nop || self.mul.iter().any(|m| !m.is_nop())
    }
}

/// Register pair committed by the depth-write stage
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum FpDwRegs {
    #[default]
    R0R1 = 0,
    R2R3 = 1,
}

impl FpDwRegs {
    pub fn from_bits(v: u32) -> Self {
        if v & 1 != 0 {
            Self::R2R3
        } else {
            Self::R0R1
        }
    }

    /// Lower register of the pair
    pub fn base(&self) -> u8 {
        match self {
            Self::R0R1 => 0,
            Self::R2R3 => 2,
        }
    }
}

/// Depth-write record of one cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct FpDwInstr {
    pub enable: bool,
    pub index: u8,
    pub stencil_write: bool,
    pub src_regs: FpDwRegs,
}

/// One fragment processor cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct FpInstr {
    pub alu: [FpAluInstr; ALU_LANES],
    pub mfu: FpMfuInstr,
    pub dw: FpDwInstr,
}

impl FpInstr {
    pub fn active_lanes(&self) -> usize {
        self.alu.iter().filter(|l| !l.is_nop()).count()
    }
}

/// Rasterizer linkage for one fragment input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FpInput {
    pub src: u32,
    pub dst: u32,
}

/// Linkage types in the `dst` word, one nibble per component
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkType {
    None = 0,
    Fx10Low = 1,
    Fx10High = 2,
    Fp20 = 3,
}

impl FpInput {
    pub fn link_src(slot: u32) -> u32 {
        slot << 3
    }

    pub fn link_dst(index: u32, comp: u32, ty: LinkType) -> u32 {
        (comp | (ty as u32) << 2) << (index * 4)
    }

    /// Linkage of input `first`, all four components as FP20
    pub fn fp20(first: u32) -> Self {
        let dst = (0..4).fold(0, |acc, i| acc | Self::link_dst(i, i, LinkType::Fp20));
        Self {
            src: Self::link_src(1 + first),
            dst,
        }
    }
}

/// Fragment program interface info
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FpInfo {
    pub inputs: Vec<FpInput>,
    pub color_input: Option<usize>,
    pub max_tram_row: u32,
}

impl Default for FpInfo {
    fn default() -> Self {
        Self {
            inputs: Vec::new(),
            color_input: None,
            max_tram_row: 1,
        }
    }
}

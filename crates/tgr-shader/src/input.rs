//! Source IR consumed by the compiler
//!
//! A flattened, register-allocated instruction list as produced by the
//! surrounding front end. Nothing here is GR3D specific.

use tgr_core::{Result, UnsupportedError};

use crate::operand::{Component, Swizzle, WriteMask, IDENTITY_SWIZZLE};

/// Shader stage of a source program
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Processor {
    Vertex,
    Fragment,
}

/// Source register files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegisterFile {
    Input,
    Output,
    Temporary,
    Constant,
    Immediate,
    Sampler,
    Address,
    SystemValue,
}

impl RegisterFile {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Input => "IN",
            Self::Output => "OUT",
            Self::Temporary => "TEMP",
            Self::Constant => "CONST",
            Self::Immediate => "IMM",
            Self::Sampler => "SAMP",
            Self::Address => "ADDR",
            Self::SystemValue => "SV",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "IN" => Self::Input,
            "OUT" => Self::Output,
            "TEMP" => Self::Temporary,
            "CONST" => Self::Constant,
            "IMM" => Self::Immediate,
            "SAMP" => Self::Sampler,
            "ADDR" => Self::Address,
            "SV" => Self::SystemValue,
            _ => return None,
        })
    }
}

/// Declaration semantics the backend cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Semantic {
    Position,
    Color,
    BackColor,
    Fog,
    PointSize,
    Generic,
    Face,
}

impl Semantic {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "POSITION" => Self::Position,
            "COLOR" => Self::Color,
            "BCOLOR" => Self::BackColor,
            "FOG" => Self::Fog,
            "PSIZE" => Self::PointSize,
            "GENERIC" => Self::Generic,
            "FACE" => Self::Face,
            _ => return None,
        })
    }
}

/// Source IR opcodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    Arl,
    Mov,
    Lit,
    Rcp,
    Rsq,
    Exp,
    Log,
    Mul,
    Add,
    Dp3,
    Dp4,
    Dst,
    Min,
    Max,
    Slt,
    Sge,
    Mad,
    Lrp,
    Frc,
    Flr,
    Ex2,
    Lg2,
    Pow,
    Dph,
    Cos,
    Sin,
    Tex,
    Txp,
    Kill,
    If,
    Else,
    Endif,
    BgnLoop,
    EndLoop,
    Brk,
    Cal,
    Ret,
    Nop,
    End,
}

const OPCODE_NAMES: &[(Opcode, &str)] = &[
    (Opcode::Arl, "ARL"),
    (Opcode::Mov, "MOV"),
    (Opcode::Lit, "LIT"),
    (Opcode::Rcp, "RCP"),
    (Opcode::Rsq, "RSQ"),
    (Opcode::Exp, "EXP"),
    (Opcode::Log, "LOG"),
    (Opcode::Mul, "MUL"),
    (Opcode::Add, "ADD"),
    (Opcode::Dp3, "DP3"),
    (Opcode::Dp4, "DP4"),
    (Opcode::Dst, "DST"),
    (Opcode::Min, "MIN"),
    (Opcode::Max, "MAX"),
    (Opcode::Slt, "SLT"),
    (Opcode::Sge, "SGE"),
    (Opcode::Mad, "MAD"),
    (Opcode::Lrp, "LRP"),
    (Opcode::Frc, "FRC"),
    (Opcode::Flr, "FLR"),
    (Opcode::Ex2, "EX2"),
    (Opcode::Lg2, "LG2"),
    (Opcode::Pow, "POW"),
    (Opcode::Dph, "DPH"),
    (Opcode::Cos, "COS"),
    (Opcode::Sin, "SIN"),
    (Opcode::Tex, "TEX"),
    (Opcode::Txp, "TXP"),
    (Opcode::Kill, "KILL"),
    (Opcode::If, "IF"),
    (Opcode::Else, "ELSE"),
    (Opcode::Endif, "ENDIF"),
    (Opcode::BgnLoop, "BGNLOOP"),
    (Opcode::EndLoop, "ENDLOOP"),
    (Opcode::Brk, "BRK"),
    (Opcode::Cal, "CAL"),
    (Opcode::Ret, "RET"),
    (Opcode::Nop, "NOP"),
    (Opcode::End, "END"),
];

impl Opcode {
    pub const ALL: [Opcode; 39] = [
        Opcode::Arl,
        Opcode::Mov,
        Opcode::Lit,
        Opcode::Rcp,
        Opcode::Rsq,
        Opcode::Exp,
        Opcode::Log,
        Opcode::Mul,
        Opcode::Add,
        Opcode::Dp3,
        Opcode::Dp4,
        Opcode::Dst,
        Opcode::Min,
        Opcode::Max,
        Opcode::Slt,
        Opcode::Sge,
        Opcode::Mad,
        Opcode::Lrp,
        Opcode::Frc,
        Opcode::Flr,
        Opcode::Ex2,
        Opcode::Lg2,
        Opcode::Pow,
        Opcode::Dph,
        Opcode::Cos,
        Opcode::Sin,
        Opcode::Tex,
        Opcode::Txp,
        Opcode::Kill,
        Opcode::If,
        Opcode::Else,
        Opcode::Endif,
        Opcode::BgnLoop,
        Opcode::EndLoop,
        Opcode::Brk,
        Opcode::Cal,
        Opcode::Ret,
        Opcode::Nop,
        Opcode::End,
    ];

    pub fn name(&self) -> &'static str {
        OPCODE_NAMES
            .iter()
            .find(|(op, _)| op == self)
            .map(|(_, name)| *name)
            .unwrap_or("???")
    }

    pub fn from_name(name: &str) -> Option<Self> {
        OPCODE_NAMES
            .iter()
            .find(|(_, n)| *n == name)
            .map(|(op, _)| *op)
    }

    /// Number of source operands the opcode reads
    pub fn num_src(&self) -> usize {
        match self {
            Self::Mad | Self::Lrp => 3,
            Self::Mul
            | Self::Add
            | Self::Dp3
            | Self::Dp4
            | Self::Dph
            | Self::Dst
            | Self::Min
            | Self::Max
            | Self::Slt
            | Self::Sge
            | Self::Pow
            | Self::Tex
            | Self::Txp => 2,
            Self::If
            | Self::Else
            | Self::Endif
            | Self::BgnLoop
            | Self::EndLoop
            | Self::Brk
            | Self::Cal
            | Self::Ret
            | Self::Nop
            | Self::End => 0,
            _ => 1,
        }
    }

    /// Whether the opcode writes a destination register
    pub fn has_dst(&self) -> bool {
        !self.is_control_flow() && !matches!(self, Self::Kill | Self::Nop | Self::End)
    }

    pub fn is_control_flow(&self) -> bool {
        matches!(
            self,
            Self::If
                | Self::Else
                | Self::Endif
                | Self::BgnLoop
                | Self::EndLoop
                | Self::Brk
                | Self::Cal
                | Self::Ret
        )
    }

    pub fn is_texture(&self) -> bool {
        matches!(self, Self::Tex | Self::Txp)
    }
}

/// Source register reference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SrcRegister {
    pub file: RegisterFile,
    pub index: u32,
    pub swizzle: Swizzle,
    pub negate: bool,
    pub absolute: bool,
}

impl SrcRegister {
    pub fn new(file: RegisterFile, index: u32) -> Self {
        Self {
            file,
            index,
            swizzle: IDENTITY_SWIZZLE,
            negate: false,
            absolute: false,
        }
    }

    pub fn swizzled(mut self, swizzle: Swizzle) -> Self {
        self.swizzle = swizzle;
        self
    }

    /// Replicate one component, `.xxxx` style
    pub fn scalar(self, comp: Component) -> Self {
        self.swizzled([comp; 4])
    }

    pub fn negated(mut self) -> Self {
        self.negate = !self.negate;
        self
    }

    pub fn absolute(mut self) -> Self {
        self.absolute = true;
        self
    }
}

/// Destination register reference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DstRegister {
    pub file: RegisterFile,
    pub index: u32,
    pub write_mask: WriteMask,
}

impl DstRegister {
    pub fn new(file: RegisterFile, index: u32) -> Self {
        Self {
            file,
            index,
            write_mask: WriteMask::XYZW,
        }
    }

    pub fn masked(mut self, write_mask: WriteMask) -> Self {
        self.write_mask = write_mask;
        self
    }
}

/// One source instruction
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    pub opcode: Opcode,
    pub saturate: bool,
    pub dst: Option<DstRegister>,
    pub src: Vec<SrcRegister>,
}

impl Instruction {
    pub fn new(opcode: Opcode) -> Self {
        Self {
            opcode,
            saturate: false,
            dst: None,
            src: Vec::new(),
        }
    }

    pub fn with_dst(mut self, dst: DstRegister) -> Self {
        self.dst = Some(dst);
        self
    }

    pub fn with_src(mut self, src: SrcRegister) -> Self {
        self.src.push(src);
        self
    }

    pub fn saturated(mut self) -> Self {
        self.saturate = true;
        self
    }

    /// Destination, or an error when the instruction has none
    pub fn dst(&self) -> Result<&DstRegister> {
        self.dst.as_ref().ok_or_else(|| {
            UnsupportedError::Malformed(format!("{} without destination", self.opcode.name()))
                .into()
        })
    }

    /// Source `i`, or an error when it is missing
    pub fn src(&self, i: usize) -> Result<&SrcRegister> {
        self.src.get(i).ok_or_else(|| {
            UnsupportedError::Malformed(format!(
                "{} is missing source {}",
                self.opcode.name(),
                i
            ))
            .into()
        })
    }
}

/// Register range declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Declaration {
    pub file: RegisterFile,
    pub first: u32,
    pub last: u32,
    pub semantic: Option<Semantic>,
}

impl Declaration {
    pub fn new(file: RegisterFile, first: u32, last: u32) -> Self {
        Self {
            file,
            first,
            last,
            semantic: None,
        }
    }

    pub fn with_semantic(mut self, semantic: Semantic) -> Self {
        self.semantic = Some(semantic);
        self
    }
}

/// Immediate vector declaration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImmediateValue {
    pub index: u32,
    pub values: [f32; 4],
}

/// A complete source program
#[derive(Debug, Clone, PartialEq)]
pub struct ShaderSource {
    pub processor: Processor,
    pub declarations: Vec<Declaration>,
    pub immediates: Vec<ImmediateValue>,
    pub instructions: Vec<Instruction>,
}

impl ShaderSource {
    pub fn new(processor: Processor) -> Self {
        Self {
            processor,
            declarations: Vec::new(),
            immediates: Vec::new(),
            instructions: Vec::new(),
        }
    }

    pub fn with_instructions(processor: Processor, instructions: Vec<Instruction>) -> Self {
        Self {
            instructions,
            ..Self::new(processor)
        }
    }

    /// Semantic of a declared register, if any
    pub fn semantic_of(&self, file: RegisterFile, index: u32) -> Option<Semantic> {
        self.declarations
            .iter()
            .find(|d| d.file == file && (d.first..=d.last).contains(&index))
            .and_then(|d| d.semantic)
    }
}

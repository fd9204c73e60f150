//! Target operand model and the operand translator
//!
//! Source IR registers (see [`crate::input`]) are translated into the register
//! files the VPE can actually address. The translator keeps swizzle and
//! modifiers intact and folds immediates into the top of the uniform space.

use bitflags::bitflags;
use serde::Serialize;
use tgr_core::{CompileError, ConflictError, Resource, Result, UnsupportedError};

use crate::input::{DstRegister, RegisterFile, SrcRegister};

/// Highest uniform slot; immediate `i` lives in `UNIFORM_TOP - i`
pub const UNIFORM_TOP: u32 = 1023;

/// Vector component, also the 2-bit swizzle encoding
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Component {
    X = 0,
    Y = 1,
    Z = 2,
    W = 3,
}

impl Component {
    pub const ALL: [Component; 4] = [Self::X, Self::Y, Self::Z, Self::W];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_bits(v: u32) -> Self {
        match v & 0x3 {
            0 => Self::X,
            1 => Self::Y,
            2 => Self::Z,
            _ => Self::W,
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            'x' | 'r' => Some(Self::X),
            'y' | 'g' => Some(Self::Y),
            'z' | 'b' => Some(Self::Z),
            'w' | 'a' => Some(Self::W),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Self::X => 'x',
            Self::Y => 'y',
            Self::Z => 'z',
            Self::W => 'w',
        }
    }
}

/// Per-component swizzle
pub type Swizzle = [Component; 4];

/// `.xyzw`
pub const IDENTITY_SWIZZLE: Swizzle = Component::ALL;

bitflags! {
    /// Destination write mask, bit 0 = X
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
    pub struct WriteMask: u8 {
        const X = 0x1;
        const Y = 0x2;
        const Z = 0x4;
        const W = 0x8;
        const XYZW = 0xF;
    }
}

impl WriteMask {
    pub fn has(&self, comp: Component) -> bool {
        self.bits() & (1 << comp.index()) != 0
    }

    pub fn components(&self) -> impl Iterator<Item = Component> + '_ {
        Component::ALL.into_iter().filter(|c| self.has(*c))
    }
}

/// Register files a VPE source operand can name
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SrcFile {
    Undefined = 0,
    Temporary = 1,
    Attribute = 2,
    Uniform = 3,
    /// Never encoded; the translator folds it into `Uniform`
    Immediate = 4,
}

impl SrcFile {
    pub fn from_bits(v: u32) -> Self {
        match v & 0x3 {
            1 => Self::Temporary,
            2 => Self::Attribute,
            3 => Self::Uniform,
            _ => Self::Undefined,
        }
    }
}

/// Register files a VPE destination can name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DstFile {
    Undefined,
    Temporary,
    Output,
}

/// Source operand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SrcOperand {
    pub file: SrcFile,
    pub index: u32,
    pub swizzle: Swizzle,
    pub negate: bool,
    pub absolute: bool,
}

impl SrcOperand {
    /// Unused operand slot
    pub const fn undef() -> Self {
        Self {
            file: SrcFile::Undefined,
            index: 0,
            swizzle: IDENTITY_SWIZZLE,
            negate: false,
            absolute: false,
        }
    }

    pub fn new(file: SrcFile, index: u32) -> Self {
        Self {
            file,
            index,
            ..Self::undef()
        }
    }

    pub fn attribute(index: u32) -> Self {
        Self::new(SrcFile::Attribute, index)
    }

    pub fn uniform(index: u32) -> Self {
        Self::new(SrcFile::Uniform, index)
    }

    pub fn temp(index: u32) -> Self {
        Self::new(SrcFile::Temporary, index)
    }

    pub fn with_swizzle(mut self, swizzle: Swizzle) -> Self {
        self.swizzle = swizzle;
        self
    }

    pub fn negated(mut self) -> Self {
        self.negate = !self.negate;
        self
    }

    pub fn absolute(mut self) -> Self {
        self.absolute = true;
        self
    }

    pub fn is_undef(&self) -> bool {
        self.file == SrcFile::Undefined
    }
}

impl Default for SrcOperand {
    fn default() -> Self {
        Self::undef()
    }
}

/// Destination operand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DstOperand {
    pub file: DstFile,
    pub index: u32,
    pub write_mask: WriteMask,
    pub saturate: bool,
}

impl DstOperand {
    pub const fn undef() -> Self {
        Self {
            file: DstFile::Undefined,
            index: 0,
            write_mask: WriteMask::empty(),
            saturate: false,
        }
    }

    pub fn temp(index: u32, write_mask: WriteMask) -> Self {
        Self {
            file: DstFile::Temporary,
            index,
            write_mask,
            saturate: false,
        }
    }

    pub fn output(index: u32, write_mask: WriteMask) -> Self {
        Self {
            file: DstFile::Output,
            index,
            write_mask,
            saturate: false,
        }
    }

    pub fn saturated(mut self, saturate: bool) -> Self {
        self.saturate = saturate;
        self
    }

    pub fn is_output(&self) -> bool {
        self.file == DstFile::Output
    }
}

impl Default for DstOperand {
    fn default() -> Self {
        Self::undef()
    }
}

/// Translates source IR registers into VPE operands
#[derive(Debug, Clone, Copy)]
pub struct OperandTranslator {
    immediate_reserve: u32,
}

impl OperandTranslator {
    /// `immediate_reserve` slots at the top of the uniform space belong to
    /// immediates; constants may not reach into them.
    pub fn new(immediate_reserve: u32) -> Self {
        Self {
            immediate_reserve: immediate_reserve.min(UNIFORM_TOP + 1),
        }
    }

    /// First uniform slot owned by immediates
    pub fn reserved_base(&self) -> u32 {
        UNIFORM_TOP + 1 - self.immediate_reserve
    }

    pub fn src(&self, reg: &SrcRegister) -> Result<SrcOperand> {
        let (file, index) = match reg.file {
            RegisterFile::Input => (SrcFile::Attribute, reg.index),
            RegisterFile::Constant => {
                if reg.index >= self.reserved_base() {
                    return Err(ConflictError::ImmediateRange {
                        index: reg.index,
                        reserved_base: self.reserved_base(),
                    }
                    .into());
                }
                (SrcFile::Uniform, reg.index)
            }
            RegisterFile::Temporary => (SrcFile::Temporary, reg.index),
            RegisterFile::Immediate => {
                if reg.index >= self.immediate_reserve {
                    return Err(CompileError::capacity(
                        Resource::Immediates,
                        reg.index as usize + 1,
                        self.immediate_reserve as usize,
                    ));
                }
                (SrcFile::Uniform, UNIFORM_TOP - reg.index)
            }
            other => {
                return Err(UnsupportedError::SourceFile(other.name().to_string()).into());
            }
        };

        Ok(SrcOperand {
            file,
            index,
            swizzle: reg.swizzle,
            negate: reg.negate,
            absolute: reg.absolute,
        })
    }

    pub fn dst(&self, reg: &DstRegister, saturate: bool) -> Result<DstOperand> {
        let file = match reg.file {
            RegisterFile::Output => DstFile::Output,
            RegisterFile::Temporary => DstFile::Temporary,
            other => {
                return Err(UnsupportedError::DestinationFile(other.name().to_string()).into());
            }
        };

        Ok(DstOperand {
            file,
            index: reg.index,
            write_mask: reg.write_mask,
            saturate,
        })
    }
}

impl Default for OperandTranslator {
    fn default() -> Self {
        Self::new(tgr_core::CompilerConfig::default().immediate_reserve)
    }
}

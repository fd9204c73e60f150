//! Scalarized SSA stream consumed by the fragment node path
//!
//! Every value is a single component. [`scalarize`] produces this form from a
//! register-based [`ShaderSource`], renaming temporaries per component.

use std::collections::HashMap;

use tgr_core::{Result, UnsupportedError};

use crate::input::{Instruction, Opcode, RegisterFile, ShaderSource};
use crate::operand::Component;

/// SSA value name
pub type SsaId = u32;

/// Scalar ALU operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AluOp {
    Fmov,
    Fadd,
    Fmul,
    Ffma,
    Fmin,
    Fmax,
    Frcp,
    Frsq,
    Fexp2,
    Flog2,
    Ffloor,
    Ffract,
    Fsin,
    Fcos,
    Slt,
    Sge,
    Fneg,
    Fabs,
    Fsat,
}

impl AluOp {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Fmov => "fmov",
            Self::Fadd => "fadd",
            Self::Fmul => "fmul",
            Self::Ffma => "ffma",
            Self::Fmin => "fmin",
            Self::Fmax => "fmax",
            Self::Frcp => "frcp",
            Self::Frsq => "frsq",
            Self::Fexp2 => "fexp2",
            Self::Flog2 => "flog2",
            Self::Ffloor => "ffloor",
            Self::Ffract => "ffract",
            Self::Fsin => "fsin",
            Self::Fcos => "fcos",
            Self::Slt => "slt",
            Self::Sge => "sge",
            Self::Fneg => "fneg",
            Self::Fabs => "fabs",
            Self::Fsat => "fsat",
        }
    }

    /// Component-wise equivalent of a source opcode
    pub fn from_opcode(op: Opcode) -> Option<Self> {
        Some(match op {
            Opcode::Mov => Self::Fmov,
            Opcode::Add => Self::Fadd,
            Opcode::Mul => Self::Fmul,
            Opcode::Mad => Self::Ffma,
            Opcode::Min => Self::Fmin,
            Opcode::Max => Self::Fmax,
            Opcode::Rcp => Self::Frcp,
            Opcode::Rsq => Self::Frsq,
            Opcode::Ex2 => Self::Fexp2,
            Opcode::Lg2 => Self::Flog2,
            Opcode::Flr => Self::Ffloor,
            Opcode::Frc => Self::Ffract,
            Opcode::Sin => Self::Fsin,
            Opcode::Cos => Self::Fcos,
            Opcode::Slt => Self::Slt,
            Opcode::Sge => Self::Sge,
            _ => return None,
        })
    }
}

/// One scalar instruction
#[derive(Debug, Clone, PartialEq)]
pub enum SsaInstr {
    LoadInput {
        def: SsaId,
        index: u32,
        component: Component,
    },
    LoadConst {
        def: SsaId,
        value: f32,
    },
    Alu {
        def: SsaId,
        op: AluOp,
        src: Vec<SsaId>,
    },
    StoreOutput {
        index: u32,
        component: Component,
        src: SsaId,
    },
    Tex,
    Jump,
    Phi,
    ParallelCopy,
    Call,
    Undef,
}

/// Control-flow node
#[derive(Debug, Clone, PartialEq)]
pub enum CfNode {
    Block(Vec<SsaInstr>),
    If,
    Loop,
    Function,
}

/// A scalarized shader body
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SsaShader {
    pub body: Vec<CfNode>,
}

/// Scalarizes register code into basic blocks.
struct Scalarizer<'a> {
    source: &'a ShaderSource,
    next: SsaId,
    temps: HashMap<(u32, Component), SsaId>,
    block: Vec<SsaInstr>,
    body: Vec<CfNode>,
}

impl<'a> Scalarizer<'a> {
    fn def(&mut self) -> SsaId {
        let id = self.next;
        self.next += 1;
        id
    }

    fn alu(&mut self, op: AluOp, src: Vec<SsaId>) -> SsaId {
        let def = self.def();
        self.block.push(SsaInstr::Alu { def, op, src });
        def
    }

    /// Close the current block and append a control-flow node.
    fn cf(&mut self, node: CfNode) {
        if !self.block.is_empty() {
            self.body.push(CfNode::Block(std::mem::take(&mut self.block)));
        }
        self.body.push(node);
    }

    fn read(&mut self, instr: &Instruction, i: usize, comp: Component) -> Result<SsaId> {
        let src = instr.src(i)?;
        let c = src.swizzle[comp.index()];

        let mut value = match src.file {
            RegisterFile::Input => {
                let def = self.def();
                self.block.push(SsaInstr::LoadInput {
                    def,
                    index: src.index,
                    component: c,
                });
                def
            }
            RegisterFile::Immediate => {
                let value = self
                    .source
                    .immediates
                    .iter()
                    .find(|imm| imm.index == src.index)
                    .map(|imm| imm.values[c.index()])
                    .ok_or_else(|| {
                        UnsupportedError::Malformed(format!("IMM[{}] is not declared", src.index))
                    })?;
                let def = self.def();
                self.block.push(SsaInstr::LoadConst { def, value });
                def
            }
            RegisterFile::Temporary => {
                *self.temps.get(&(src.index, c)).ok_or_else(|| {
                    UnsupportedError::Malformed(format!(
                        "TEMP[{}].{} read before write",
                        src.index,
                        c.as_char()
                    ))
                })?
            }
            other => {
                return Err(UnsupportedError::SourceFile(other.name().to_string()).into());
            }
        };

        if src.absolute {
            value = self.alu(AluOp::Fabs, vec![value]);
        }
        if src.negate {
            value = self.alu(AluOp::Fneg, vec![value]);
        }
        Ok(value)
    }

    fn instruction(&mut self, instr: &Instruction) -> Result<()> {
        match instr.opcode {
            Opcode::End => return Ok(()),
            Opcode::If => {
                self.cf(CfNode::If);
                return Ok(());
            }
            Opcode::BgnLoop => {
                self.cf(CfNode::Loop);
                return Ok(());
            }
            Opcode::Cal => {
                self.block.push(SsaInstr::Call);
                return Ok(());
            }
            op if op.is_control_flow() => {
                self.block.push(SsaInstr::Jump);
                return Ok(());
            }
            op if op.is_texture() => {
                self.block.push(SsaInstr::Tex);
                return Ok(());
            }
            _ => {}
        }

        let op = AluOp::from_opcode(instr.opcode).ok_or_else(|| UnsupportedError::Opcode {
            opcode: instr.opcode.name().to_string(),
            stage: tgr_core::Stage::Fragment,
        })?;
        let dst = *instr.dst()?;

        for comp in dst.write_mask.components() {
            let src = (0..instr.opcode.num_src())
                .map(|i| self.read(instr, i, comp))
                .collect::<Result<Vec<_>>>()?;

            let mut value = if op == AluOp::Fmov {
                src[0]
            } else {
                self.alu(op, src)
            };
            if instr.saturate {
                value = self.alu(AluOp::Fsat, vec![value]);
            }

            match dst.file {
                RegisterFile::Output => self.block.push(SsaInstr::StoreOutput {
                    index: dst.index,
                    component: comp,
                    src: value,
                }),
                RegisterFile::Temporary => {
                    self.temps.insert((dst.index, comp), value);
                }
                other => {
                    return Err(UnsupportedError::DestinationFile(other.name().to_string()).into());
                }
            }
        }
        Ok(())
    }
}

/// Convert a register-based fragment shader into scalar SSA form.
///
/// Control flow and texture instructions are kept as opaque nodes so the
/// consumer can reject them.
pub fn scalarize(source: &ShaderSource) -> Result<SsaShader> {
    let mut s = Scalarizer {
        source,
        next: 0,
        temps: HashMap::new(),
        block: Vec::new(),
        body: Vec::new(),
    };
    for instr in &source.instructions {
        s.instruction(instr)?;
    }
    if !s.block.is_empty() || s.body.is_empty() {
        s.body.push(CfNode::Block(s.block));
    }
    Ok(SsaShader { body: s.body })
}

//! Fragment direct builder
//!
//! Lowers source instructions straight into ALU/MFU/DW cycles. Only MOV is
//! implemented; each active write-mask component becomes one ALU lane.

use std::collections::HashMap;

use tgr_core::{CompileError, ConflictError, Resource, Result, Stage, UnsupportedError};
use tracing::{debug, trace};

use super::regalloc::{FpRegisters, OutputRegisters, RegClass};
use super::sched::Scheduler;
use super::types::*;
use crate::input::{Declaration, ImmediateValue, Instruction, Opcode, RegisterFile, Semantic};
use crate::operand::Component;

/// Where a lane reads from
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum LaneSrc {
    /// Component `component` of interpolated TRAM row `tram_row`
    Row { tram_row: u32, component: Component },
    /// Previously written temporary component
    Temp { index: u32, component: Component },
    /// Constant unit, 0.0 or 1.0
    Const(bool),
}

/// Where a lane writes to
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum LaneDst {
    Output { index: u32, component: Component },
    Temp { index: u32, component: Component },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Lane {
    pub dst: LaneDst,
    pub src: LaneSrc,
    pub negate: bool,
    pub absolute: bool,
}

/// Builds a fragment program one cycle at a time
#[derive(Debug)]
pub struct FpBuilder {
    regs: FpRegisters,
    colour_buffer_base: u8,
    sched: Scheduler,
    info: FpInfo,
    outputs: HashMap<u32, Option<Semantic>>,
    immediates: HashMap<u32, [f32; 4]>,
}

impl FpBuilder {
    pub fn new(outputs: OutputRegisters, colour_buffer_base: u8) -> Self {
        Self {
            regs: FpRegisters::new(outputs),
            colour_buffer_base,
            sched: Scheduler::new(),
            info: FpInfo::default(),
            outputs: HashMap::new(),
            immediates: HashMap::new(),
        }
    }

    /// Record a declaration. Inputs get rasterizer linkage; outputs remember
    /// their semantic.
    pub fn declare(&mut self, decl: &Declaration) -> Result<()> {
        match decl.file {
            RegisterFile::Input => {
                for index in decl.first..=decl.last {
                    if decl.semantic == Some(Semantic::Color) {
                        if self.info.color_input.is_some() {
                            return Err(ConflictError::SlotTaken {
                                resource: "colour input".to_string(),
                            }
                            .into());
                        }
                        self.info.color_input = Some(self.info.inputs.len());
                    }
                    self.info.inputs.push(FpInput::fp20(index));
                    debug!("FP input {} linked as slot {}", index, self.info.inputs.len() - 1);
                }
            }
            RegisterFile::Output => {
                for index in decl.first..=decl.last {
                    self.outputs.insert(index, decl.semantic);
                }
            }
            _ => {}
        }
        Ok(())
    }

    pub fn declare_immediate(&mut self, imm: &ImmediateValue) {
        self.immediates.insert(imm.index, imm.values);
    }

    /// Lower one source instruction
    pub fn emit(&mut self, instr: &Instruction) -> Result<()> {
        match instr.opcode {
            Opcode::End => return Ok(()),
            Opcode::Mov => {}
            op if op.is_control_flow() => {
                return Err(UnsupportedError::ControlFlow(op.name().to_string()).into());
            }
            op if op.is_texture() => {
                return Err(UnsupportedError::InstructionKind(format!(
                    "texture sampling ({})",
                    op.name()
                ))
                .into());
            }
            op => {
                return Err(UnsupportedError::Opcode {
                    opcode: op.name().to_string(),
                    stage: Stage::Fragment,
                }
                .into());
            }
        }

        let dst = instr.dst()?;
        let src = instr.src(0)?;

        let mut lanes = Vec::with_capacity(ALU_LANES);
        for i in dst.write_mask.components() {
            let c = src.swizzle[i.index()];

            let lane_src = match src.file {
                RegisterFile::Input => LaneSrc::Row {
                    tram_row: src.index,
                    component: c,
                },
                RegisterFile::Temporary => LaneSrc::Temp {
                    index: src.index,
                    component: c,
                },
                RegisterFile::Immediate => LaneSrc::Const(self.immediate(src.index, c)?),
                other => {
                    return Err(UnsupportedError::SourceFile(other.name().to_string()).into());
                }
            };

            let lane_dst = match dst.file {
                RegisterFile::Output => LaneDst::Output {
                    index: dst.index,
                    component: i,
                },
                RegisterFile::Temporary => LaneDst::Temp {
                    index: dst.index,
                    component: i,
                },
                other => {
                    return Err(UnsupportedError::DestinationFile(other.name().to_string()).into());
                }
            };

            lanes.push(Lane {
                dst: lane_dst,
                src: lane_src,
                negate: src.negate,
                absolute: src.absolute,
            });
        }

        let address = self.emit_cycle(&lanes, instr.saturate)?;
        trace!("FP {} -> cycle {} ({} lanes)", instr.opcode.name(), address, lanes.len());
        Ok(())
    }

    fn immediate(&self, index: u32, comp: Component) -> Result<bool> {
        let values = self.immediates.get(&index).ok_or_else(|| {
            CompileError::from(UnsupportedError::Malformed(format!(
                "IMM[{}] is not declared",
                index
            )))
        })?;
        let value = values[comp.index()];
        if value == 0.0 {
            Ok(false)
        } else if value == 1.0 {
            Ok(true)
        } else {
            Err(UnsupportedError::Immediate(value.to_string()).into())
        }
    }

    /// Lower up to four lanes into one cycle and hand it to the scheduler.
    pub(crate) fn emit_cycle(&mut self, lanes: &[Lane], saturate: bool) -> Result<usize> {
        if lanes.len() > ALU_LANES {
            return Err(CompileError::capacity(
                Resource::Field("alu lanes"),
                lanes.len(),
                ALU_LANES,
            ));
        }

        let mut instr = FpInstr::default();
        for (slot, lane) in lanes.iter().enumerate() {
            let mut src = self.lower_src(&mut instr.mfu, &lane.src)?;
            src.negate = lane.negate;
            src.absolute = lane.absolute;

            let dst = self.lower_dst(&mut instr.dw, &lane.dst, saturate)?;
            instr.alu[slot] = FpAluInstr::mov(dst, src);
        }

        Ok(self.sched.place(instr))
    }

    fn lower_src(&mut self, mfu: &mut FpMfuInstr, src: &LaneSrc) -> Result<FpAluSrc> {
        match *src {
            LaneSrc::Row {
                tram_row,
                component,
            } => {
                if tram_row >= RegClass::Row.size() as u32 {
                    return Err(CompileError::capacity(
                        Resource::InterpolationRows,
                        tram_row as usize + 1,
                        RegClass::Row.size(),
                    ));
                }
                let lane = component.index();
                let var = &mut mfu.var[lane];
                if var.op != FpVarOp::Nop && u32::from(var.tram_row) != tram_row {
                    return Err(ConflictError::InterpolationLane {
                        lane,
                        row: u32::from(var.tram_row),
                        requested: tram_row,
                    }
                    .into());
                }
                *var = FpVar {
                    op: FpVarOp::Fp20,
                    tram_row: tram_row as u8,
                };
                self.info.max_tram_row = self.info.max_tram_row.max(tram_row);
                Ok(FpAluSrc::row(lane as u8))
            }
            LaneSrc::Temp { index, component } => {
                Ok(FpAluSrc::reg(self.regs.read_temporary(index, component)?))
            }
            LaneSrc::Const(true) => Ok(FpAluSrc::one()),
            LaneSrc::Const(false) => Ok(FpAluSrc::zero()),
        }
    }

    fn lower_dst(
        &mut self,
        dw: &mut FpDwInstr,
        dst: &LaneDst,
        saturate: bool,
    ) -> Result<FpAluDst> {
        match *dst {
            LaneDst::Output { index, component } => {
                match self.outputs.get(&index) {
                    None | Some(None) | Some(Some(Semantic::Color)) => {}
                    Some(Some(other)) => {
                        return Err(UnsupportedError::DestinationFile(format!(
                            "OUT[{}] with semantic {:?}",
                            index, other
                        ))
                        .into());
                    }
                }

                let buffer = u32::from(self.colour_buffer_base) + index;
                if buffer > 15 {
                    return Err(CompileError::capacity(
                        Resource::RenderTargets,
                        buffer as usize + 1,
                        16,
                    ));
                }
                if dw.enable && u32::from(dw.index) != buffer {
                    return Err(ConflictError::SlotTaken {
                        resource: "depth-write stage".to_string(),
                    }
                    .into());
                }

                let outputs = self.regs.outputs();
                *dw = FpDwInstr {
                    enable: true,
                    index: buffer as u8,
                    stencil_write: false,
                    src_regs: outputs.pair(),
                };

                let (reg, high) = outputs.remap(component.index());
                Ok(FpAluDst {
                    index: reg,
                    write_low_sub_reg: !high,
                    write_high_sub_reg: high,
                    saturate,
                    enable: true,
                })
            }
            LaneDst::Temp { index, component } => {
                let reg = self.regs.write_temporary(index, component)?;
                Ok(FpAluDst {
                    index: reg,
                    saturate,
                    enable: true,
                    ..Default::default()
                })
            }
        }
    }

    pub fn info(&self) -> &FpInfo {
        &self.info
    }

    /// Scheduled cycles and interface info
    pub fn finish(self) -> (Vec<FpInstr>, FpInfo) {
        (self.sched.finish(), self.info)
    }
}

impl Default for FpBuilder {
    fn default() -> Self {
        Self::new(OutputRegisters::default(), 1)
    }
}

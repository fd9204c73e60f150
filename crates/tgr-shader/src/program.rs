//! Compiled programs and their word images

use serde::Serialize;
use tgr_core::{CompileError, Resource, Result};

use crate::fp::{FpInfo, FpInstr, FpPacker, ALU_LANES};
use crate::vpe::{DecodedVpe, VpeInstr, VpePacker};

/// Instruction ceiling for either stage
pub const MAX_INSTRUCTIONS: usize = 256;

fn check_len(len: usize) -> Result<()> {
    if len > MAX_INSTRUCTIONS {
        return Err(CompileError::capacity(
            Resource::Instructions,
            len,
            MAX_INSTRUCTIONS,
        ));
    }
    Ok(())
}

/// Vertex program
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VpeProgram {
    instructions: Vec<VpeInstr>,
}

impl VpeProgram {
    /// Every instruction is pack-checked here, so a program that exists can
    /// always be encoded.
    pub fn new(instructions: Vec<VpeInstr>) -> Result<Self> {
        check_len(instructions.len())?;
        for instr in &instructions {
            VpePacker::pack(instr, false)?;
        }
        Ok(Self { instructions })
    }

    pub fn instructions(&self) -> &[VpeInstr] {
        &self.instructions
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Four words per instruction; the last one carries end-of-program.
    /// An empty program is a single NOP with end-of-program set.
    pub fn words(&self) -> Result<Vec<u32>> {
        if self.instructions.is_empty() {
            return Ok(VpePacker::pack(&VpeInstr::default(), true)?.to_vec());
        }

        let last = self.instructions.len().saturating_sub(1);
        let mut words = Vec::with_capacity(self.instructions.len() * 4);
        for (i, instr) in self.instructions.iter().enumerate() {
            words.extend(VpePacker::pack(instr, i == last)?);
        }
        Ok(words)
    }

    /// Decode a word image back into instructions
    pub fn decode(words: &[u32]) -> std::result::Result<Vec<DecodedVpe>, String> {
        if words.len() % 4 != 0 {
            return Err("Vertex program data must be multiple of 4 words".to_string());
        }
        let count = words.len() / 4;
        if count > MAX_INSTRUCTIONS {
            return Err(format!(
                "Too many VPE instructions: {} (max {})",
                count, MAX_INSTRUCTIONS
            ));
        }

        let mut decoded = Vec::with_capacity(count);
        for chunk in words.chunks_exact(4) {
            let instr = VpePacker::decode([chunk[0], chunk[1], chunk[2], chunk[3]]);
            let end = instr.end;
            decoded.push(instr);
            if end {
                break;
            }
        }
        Ok(decoded)
    }
}

/// Packed fragment program: three parallel word streams
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FpWords {
    /// Two words per lane, four lanes per cycle
    pub alu: Vec<u32>,
    /// Two words per cycle
    pub mfu: Vec<u32>,
    /// One word per cycle
    pub dw: Vec<u32>,
}

/// Fragment program
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FpProgram {
    instructions: Vec<FpInstr>,
    info: FpInfo,
}

impl FpProgram {
    pub fn new(instructions: Vec<FpInstr>, info: FpInfo) -> Result<Self> {
        check_len(instructions.len())?;
        Ok(Self { instructions, info })
    }

    pub fn instructions(&self) -> &[FpInstr] {
        &self.instructions
    }

    pub fn info(&self) -> &FpInfo {
        &self.info
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn words(&self) -> Result<FpWords> {
        let n = self.instructions.len();
        let mut out = FpWords {
            alu: Vec::with_capacity(n * ALU_LANES * 2),
            mfu: Vec::with_capacity(n * 2),
            dw: Vec::with_capacity(n),
        };
        for instr in &self.instructions {
            for lane in &instr.alu {
                out.alu.extend(FpPacker::pack_alu(lane)?);
            }
            out.mfu.extend(FpPacker::pack_mfu(&instr.mfu)?);
            out.dw.push(FpPacker::pack_dw(&instr.dw)?);
        }
        Ok(out)
    }
}

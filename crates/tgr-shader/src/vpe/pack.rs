//! VPE bit-packer and decoder
//!
//! Packs one co-issued [`VpeInstr`] into the 128-bit hardware word and reads
//! packed words back into a [`DecodedVpe`] for disassembly.

use std::fmt;

use serde::Serialize;
use tgr_core::{CompileError, ConflictError, Resource, Result, UnsupportedError};

use super::layout::{self, SrcFields};
use super::types::{ScalarOpcode, VecOpcode, VpeInstr};
use crate::bits::Packed;
use crate::operand::{Component, DstFile, DstOperand, SrcFile, SrcOperand, WriteMask};

/// Number of addressable temporaries (63 is the "no write" sentinel)
pub const MAX_TEMPORARIES: u32 = layout::RD_DISABLED;
/// Number of addressable exports (31 is the "no export" sentinel)
pub const MAX_OUTPUTS: u32 = layout::EXPORT_DISABLED;

/// Shared fetch slot for one register file
#[derive(Debug, Default)]
struct FetchSlot {
    index: Option<u32>,
}

impl FetchSlot {
    fn claim(&mut self, index: u32) -> std::result::Result<(), (u32, u32)> {
        match self.index {
            Some(first) if first != index => Err((first, index)),
            _ => {
                self.index = Some(index);
                Ok(())
            }
        }
    }
}

/// VPE instruction packer
pub struct VpePacker;

impl VpePacker {
    /// Pack one instruction, most significant word first.
    pub fn pack(instr: &VpeInstr, end_of_program: bool) -> Result<[u32; 4]> {
        let vec = &instr.vec;
        let scalar = &instr.scalar;

        if vec.dst.is_output() && scalar.dst.is_output() {
            return Err(ConflictError::DualOutput.into());
        }

        let mut w = Packed::<4>::new();

        // Predicate always true.
        w.set_bool(layout::PREDICATE_LT, true)?;
        w.set_bool(layout::PREDICATE_EQ, true)?;
        w.set_bool(layout::PREDICATE_GT, true)?;
        for comp in Component::ALL {
            w.set(layout::PREDICATE_SWIZZLE[comp.index()], comp as u32)?;
        }

        // rA/rB carry vector sources 0/1, rC carries vector source 2 or the
        // scalar source.
        let rc = match (vec.src[2].is_undef(), scalar.src.is_undef()) {
            (false, false) => return Err(ConflictError::SharedSourceSlot.into()),
            (false, true) => vec.src[2],
            (true, _) => scalar.src,
        };
        let slots = [vec.src[0], vec.src[1], rc];

        let mut attribute = FetchSlot::default();
        let mut uniform = FetchSlot::default();
        for (src, fields) in slots.iter().zip(layout::SOURCES.iter()) {
            match src.file {
                SrcFile::Attribute => attribute.claim(src.index).map_err(|(first, second)| {
                    ConflictError::AttributeFetch { first, second }
                })?,
                SrcFile::Uniform => uniform.claim(src.index).map_err(|(first, second)| {
                    ConflictError::UniformFetch { first, second }
                })?,
                _ => {}
            }
            Self::pack_src(&mut w, fields, src)?;
        }

        if let Some(index) = attribute.index {
            w.set(layout::ATTRIBUTE_FETCH_INDEX, index)?;
        }
        if let Some(index) = uniform.index {
            w.set(layout::UNIFORM_FETCH_INDEX, index)?;
        }

        w.set(layout::VECTOR_OPCODE, vec.op as u32)?;
        w.set(layout::SCALAR_OPCODE, scalar.op as u32)?;

        let mut export = layout::EXPORT_DISABLED;
        if let Some(index) = Self::pack_dst(&mut w, &vec.dst, layout::VECTOR_RD_INDEX)? {
            export = index;
            w.set_bool(layout::EXPORT_VECTOR_WRITE_ENABLE, true)?;
        }
        if let Some(index) = Self::pack_dst(&mut w, &scalar.dst, layout::SCALAR_RD_INDEX)? {
            export = index;
        }
        w.set(layout::EXPORT_WRITE_INDEX, export)?;

        for comp in Component::ALL {
            w.set_bool(
                layout::VECTOR_WRITE_ENABLE[comp.index()],
                vec.dst.write_mask.has(comp),
            )?;
            w.set_bool(
                layout::SCALAR_WRITE_ENABLE[comp.index()],
                scalar.dst.write_mask.has(comp),
            )?;
        }

        w.set_bool(
            layout::SATURATE_RESULT,
            vec.dst.saturate || scalar.dst.saturate,
        )?;
        w.set_bool(layout::END_OF_PROGRAM, end_of_program)?;

        Ok(w.to_words())
    }

    /// Encode one input-register descriptor. Attribute and uniform reads go
    /// through the shared fetch index, so their own index field stays zero.
    fn pack_src(w: &mut Packed<4>, fields: &SrcFields, src: &SrcOperand) -> Result<()> {
        let index = match src.file {
            SrcFile::Immediate => {
                return Err(UnsupportedError::SourceFile("IMM".to_string()).into());
            }
            SrcFile::Temporary => {
                if src.index >= MAX_TEMPORARIES {
                    return Err(CompileError::capacity(
                        Resource::Temporaries,
                        src.index as usize + 1,
                        MAX_TEMPORARIES as usize,
                    ));
                }
                src.index
            }
            SrcFile::Undefined | SrcFile::Attribute | SrcFile::Uniform => 0,
        };

        w.set(fields.ty, src.file as u32)?;
        w.set(fields.index, index)?;
        for comp in Component::ALL {
            w.set(fields.swizzle[comp.index()], src.swizzle[comp.index()] as u32)?;
        }
        w.set_bool(fields.negate, src.negate)?;
        w.set_bool(fields.absolute, src.absolute)
    }

    /// Encode a destination register index. Returns the export index when the
    /// destination is an output.
    fn pack_dst(
        w: &mut Packed<4>,
        dst: &DstOperand,
        rd: crate::bits::Field,
    ) -> Result<Option<u32>> {
        match dst.file {
            DstFile::Undefined => Ok(None),
            DstFile::Temporary => {
                if dst.index >= MAX_TEMPORARIES {
                    return Err(CompileError::capacity(
                        Resource::Temporaries,
                        dst.index as usize + 1,
                        MAX_TEMPORARIES as usize,
                    ));
                }
                w.set(rd, dst.index)?;
                Ok(None)
            }
            DstFile::Output => {
                if dst.index >= MAX_OUTPUTS {
                    return Err(CompileError::capacity(
                        Resource::Outputs,
                        dst.index as usize + 1,
                        MAX_OUTPUTS as usize,
                    ));
                }
                w.set(rd, layout::RD_DISABLED)?;
                Ok(Some(dst.index))
            }
        }
    }

    /// Decode one packed instruction
    pub fn decode(words: [u32; 4]) -> DecodedVpe {
        let w = Packed::from_words(words);

        let sources = layout::SOURCES.map(|fields| DecodedSrc {
            file: SrcFile::from_bits(w.get(fields.ty)),
            index: w.get(fields.index),
            swizzle: fields.swizzle.map(|f| Component::from_bits(w.get(f))),
            negate: w.get_bool(fields.negate),
            absolute: w.get_bool(fields.absolute),
        });

        let mask = |fields: &[crate::bits::Field; 4]| {
            Component::ALL
                .into_iter()
                .filter(|c| w.get_bool(fields[c.index()]))
                .fold(WriteMask::empty(), |m, c| {
                    m | WriteMask::from_bits_truncate(1 << c.index())
                })
        };

        DecodedVpe {
            vec_opcode: VecOpcode::from(w.get(layout::VECTOR_OPCODE) as u8),
            scalar_opcode: ScalarOpcode::from(w.get(layout::SCALAR_OPCODE) as u8),
            sources,
            attribute_fetch_index: w.get(layout::ATTRIBUTE_FETCH_INDEX),
            uniform_fetch_index: w.get(layout::UNIFORM_FETCH_INDEX),
            vector_rd_index: w.get(layout::VECTOR_RD_INDEX),
            scalar_rd_index: w.get(layout::SCALAR_RD_INDEX),
            export_write_index: w.get(layout::EXPORT_WRITE_INDEX),
            export_vector_write: w.get_bool(layout::EXPORT_VECTOR_WRITE_ENABLE),
            vec_write_mask: mask(&layout::VECTOR_WRITE_ENABLE),
            scalar_write_mask: mask(&layout::SCALAR_WRITE_ENABLE),
            saturate: w.get_bool(layout::SATURATE_RESULT),
            end: w.get_bool(layout::END_OF_PROGRAM),
        }
    }
}

/// Decoded input-register descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DecodedSrc {
    pub file: SrcFile,
    pub index: u32,
    pub swizzle: [Component; 4],
    pub negate: bool,
    pub absolute: bool,
}

/// Decoded VPE instruction
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecodedVpe {
    pub vec_opcode: VecOpcode,
    pub scalar_opcode: ScalarOpcode,
    /// rA, rB, rC
    pub sources: [DecodedSrc; 3],
    pub attribute_fetch_index: u32,
    pub uniform_fetch_index: u32,
    pub vector_rd_index: u32,
    pub scalar_rd_index: u32,
    pub export_write_index: u32,
    pub export_vector_write: bool,
    pub vec_write_mask: WriteMask,
    pub scalar_write_mask: WriteMask,
    pub saturate: bool,
    pub end: bool,
}

impl DecodedVpe {
    fn fmt_src(&self, f: &mut fmt::Formatter<'_>, src: &DecodedSrc) -> fmt::Result {
        let name = match src.file {
            SrcFile::Undefined => return write!(f, "_"),
            SrcFile::Temporary => format!("r{}", src.index),
            SrcFile::Attribute => format!("a[{}]", self.attribute_fetch_index),
            SrcFile::Uniform | SrcFile::Immediate => format!("c[{}]", self.uniform_fetch_index),
        };
        let swizzle: String = src.swizzle.iter().map(|c| c.as_char()).collect();
        let body = if swizzle == "xyzw" {
            name
        } else {
            format!("{}.{}", name, swizzle)
        };
        let body = if src.absolute {
            format!("|{}|", body)
        } else {
            body
        };
        if src.negate {
            write!(f, "-{}", body)
        } else {
            write!(f, "{}", body)
        }
    }

    fn fmt_dst(
        &self,
        f: &mut fmt::Formatter<'_>,
        rd: u32,
        mask: WriteMask,
        export: bool,
    ) -> fmt::Result {
        let mask: String = mask.components().map(|c| c.as_char()).collect();
        if export {
            write!(f, "o[{}].{}", self.export_write_index, mask)
        } else {
            write!(f, "r{}.{}", rd, mask)
        }
    }
}

impl fmt::Display for DecodedVpe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sat = if self.saturate { "_SAT" } else { "" };

        write!(f, "{}{} ", self.vec_opcode.name(), sat)?;
        if self.vec_opcode != VecOpcode::Nop {
            let export = self.vector_rd_index == layout::RD_DISABLED && self.export_vector_write;
            self.fmt_dst(f, self.vector_rd_index, self.vec_write_mask, export)?;
            for src in &self.sources {
                write!(f, ", ")?;
                self.fmt_src(f, src)?;
            }
        }

        write!(f, " ; {} ", self.scalar_opcode.name())?;
        if self.scalar_opcode != ScalarOpcode::Nop {
            let export = self.scalar_rd_index == layout::RD_DISABLED
                && self.export_write_index != layout::EXPORT_DISABLED;
            self.fmt_dst(f, self.scalar_rd_index, self.scalar_write_mask, export)?;
            write!(f, ", ")?;
            self.fmt_src(f, &self.sources[2])?;
        }

        if self.end {
            write!(f, " END")?;
        }
        Ok(())
    }
}

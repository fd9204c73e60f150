//! Fragment register classes and output-register policy
//!
//! The general registers r0..r7 alias two depth-write pairs: R0R1 covers r0
//! and r1, R2R3 covers r2 and r3. The pair holding the colour result is
//! reserved for outputs; temporaries are allocated from what is left.

use std::collections::HashMap;

use bitflags::bitflags;
use tgr_core::{CompileError, Resource, Result, UnsupportedError};
use tracing::trace;

use super::types::{FpDwRegs, NUM_GENERAL, NUM_ROWS};
use crate::operand::Component;

/// Register class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegClass {
    /// Interpolated rows, read-only from the ALU
    Row,
    /// r0..r7
    General,
    /// A depth-write register pair
    Pair,
}

impl RegClass {
    pub fn size(&self) -> usize {
        match self {
            Self::Row => NUM_ROWS as usize,
            Self::General => NUM_GENERAL as usize,
            Self::Pair => 2,
        }
    }
}

bitflags! {
    /// Set of general registers
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct GeneralRegs: u8 {
        const R0 = 1 << 0;
        const R1 = 1 << 1;
        const R2 = 1 << 2;
        const R3 = 1 << 3;
        const R4 = 1 << 4;
        const R5 = 1 << 5;
        const R6 = 1 << 6;
        const R7 = 1 << 7;

        const R0_R1 = Self::R0.bits() | Self::R1.bits();
        const R2_R3 = Self::R2.bits() | Self::R3.bits();
    }
}

impl GeneralRegs {
    pub fn reg(index: u8) -> Self {
        Self::from_bits_truncate(1 << index)
    }

    /// General registers a pair aliases
    pub fn of_pair(pair: FpDwRegs) -> Self {
        match pair {
            FpDwRegs::R0R1 => Self::R0_R1,
            FpDwRegs::R2R3 => Self::R2_R3,
        }
    }

    /// Register numbers in the set, lowest first
    pub fn indices(self) -> impl Iterator<Item = u8> {
        (0..NUM_GENERAL).filter(move |i| self.contains(Self::reg(*i)))
    }
}

/// Registers that receive the colour result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputRegisters {
    pair: FpDwRegs,
}

impl OutputRegisters {
    /// `base` must name the lower register of a depth-write pair.
    pub fn new(base: u8) -> Result<Self> {
        let pair = match base {
            0 => FpDwRegs::R0R1,
            2 => FpDwRegs::R2R3,
            other => {
                return Err(UnsupportedError::DestinationFile(format!(
                    "r{}/r{} as output pair",
                    other,
                    other.saturating_add(1)
                ))
                .into());
            }
        };
        Ok(Self { pair })
    }

    pub fn pair(&self) -> FpDwRegs {
        self.pair
    }

    pub fn base(&self) -> u8 {
        self.pair.base()
    }

    /// Register and sub-register half holding colour component `comp`.
    ///
    /// Components are stored BGRA as fixed10: B and G share the low register,
    /// R and A the high one. Returns `(register, high_half)`.
    pub fn remap(&self, comp: usize) -> (u8, bool) {
        let o = if comp < 3 { 2 - comp } else { 3 };
        (self.base() + (o / 2) as u8, o % 2 != 0)
    }
}

impl Default for OutputRegisters {
    fn default() -> Self {
        Self {
            pair: FpDwRegs::R2R3,
        }
    }
}

/// General register bookkeeping for one fragment program
///
/// Temporary components get a register the first time they are written and
/// keep it for the rest of the program.
#[derive(Debug, Clone)]
pub struct FpRegisters {
    outputs: OutputRegisters,
    reserved: GeneralRegs,
    temporaries: HashMap<(u32, Component), u8>,
    used: GeneralRegs,
}

impl FpRegisters {
    pub fn new(outputs: OutputRegisters) -> Self {
        Self {
            outputs,
            reserved: GeneralRegs::of_pair(outputs.pair()),
            temporaries: HashMap::new(),
            used: GeneralRegs::empty(),
        }
    }

    pub fn outputs(&self) -> OutputRegisters {
        self.outputs
    }

    /// Registers available to temporaries
    pub fn free(&self) -> GeneralRegs {
        GeneralRegs::all().difference(self.reserved)
    }

    /// Register holding `TEMP[index].comp`, allocating one on first write.
    pub fn write_temporary(&mut self, index: u32, comp: Component) -> Result<u8> {
        if let Some(reg) = self.temporaries.get(&(index, comp)) {
            return Ok(*reg);
        }

        let available = self.free().difference(self.used);
        let reg = available.indices().next().ok_or_else(|| {
            CompileError::capacity(
                Resource::GeneralRegisters,
                self.temporaries.len() + 1,
                self.free().bits().count_ones() as usize,
            )
        })?;

        self.used |= GeneralRegs::reg(reg);
        self.temporaries.insert((index, comp), reg);
        trace!("TEMP[{}].{} -> r{}", index, comp.as_char(), reg);
        Ok(reg)
    }

    /// Register holding `TEMP[index].comp`, which must have been written.
    pub fn read_temporary(&self, index: u32, comp: Component) -> Result<u8> {
        self.temporaries.get(&(index, comp)).copied().ok_or_else(|| {
            UnsupportedError::Malformed(format!(
                "TEMP[{}].{} read before write",
                index,
                comp.as_char()
            ))
            .into()
        })
    }
}

impl Default for FpRegisters {
    fn default() -> Self {
        Self::new(OutputRegisters::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bgra_remap() {
        let out = OutputRegisters::default();
        // R -> r3 low, G -> r2 high, B -> r2 low, A -> r3 high
        assert_eq!(out.remap(0), (3, false));
        assert_eq!(out.remap(1), (2, true));
        assert_eq!(out.remap(2), (2, false));
        assert_eq!(out.remap(3), (3, true));
    }

    #[test]
    fn test_pair_aliases() {
        assert_eq!(
            GeneralRegs::of_pair(FpDwRegs::R2R3).indices().collect::<Vec<_>>(),
            vec![2, 3]
        );
        assert!(GeneralRegs::R0_R1.contains(GeneralRegs::R1));
    }

    #[test]
    fn test_temporaries_skip_output_pair() {
        let mut regs = FpRegisters::default();
        let assigned: Vec<u8> = (0..6)
            .map(|i| regs.write_temporary(i, Component::X).unwrap())
            .collect();
        assert_eq!(assigned, vec![0, 1, 4, 5, 6, 7]);
        assert!(matches!(
            regs.write_temporary(6, Component::X),
            Err(CompileError::CapacityExceeded {
                resource: Resource::GeneralRegisters,
                requested: 7,
                limit: 6,
            })
        ));
    }

    #[test]
    fn test_temporaries_never_alias() {
        let mut regs = FpRegisters::default();
        let y0 = regs.write_temporary(0, Component::Y).unwrap();
        let x1 = regs.write_temporary(1, Component::X).unwrap();
        assert_ne!(y0, x1);
        assert_eq!(regs.write_temporary(0, Component::Y).unwrap(), y0);
        assert_eq!(regs.read_temporary(0, Component::Y).unwrap(), y0);
        assert_eq!(regs.read_temporary(1, Component::X).unwrap(), x1);
    }

    #[test]
    fn test_read_before_write() {
        let regs = FpRegisters::default();
        assert!(matches!(
            regs.read_temporary(0, Component::X),
            Err(CompileError::Unsupported(UnsupportedError::Malformed(_)))
        ));
    }

    #[test]
    fn test_output_pair_base_zero() {
        let mut regs = FpRegisters::new(OutputRegisters::new(0).unwrap());
        assert_eq!(regs.write_temporary(0, Component::X).unwrap(), 2);
        assert_eq!(regs.free().indices().collect::<Vec<_>>(), vec![2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn test_invalid_output_base() {
        assert!(OutputRegisters::new(1).is_err());
        assert_eq!(RegClass::Pair.size(), 2);
    }
}

//! Field tables and the generic bit packer
//!
//! Every hardware layout in this crate is a table of [`Field`]s. Packing and
//! unpacking go through [`Packed`], so the VPE packer, the three fragment
//! packers and the decoders all share one mask/shift routine.
//!
//! Bits are numbered the way the hardware headers number them: bit 0 is the
//! least significant bit of the lowest 32-bit part. On the wire the parts are
//! emitted most-significant first, so `words[0]` holds the top 32 bits.

use tgr_core::{CompileError, Resource, Result};

/// One bit field: `width` bits starting at bit `offset`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub offset: u16,
    pub width: u8,
}

impl Field {
    pub const fn new(name: &'static str, offset: u16, width: u8) -> Self {
        Self {
            name,
            offset,
            width,
        }
    }

    /// Largest value the field can hold
    pub const fn max(&self) -> u32 {
        if self.width >= 32 {
            u32::MAX
        } else {
            (1u32 << self.width) - 1
        }
    }

    /// One past the last bit
    pub const fn end(&self) -> u16 {
        self.offset + self.width as u16
    }
}

/// An `N`-part little-endian bit store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Packed<const N: usize> {
    parts: [u32; N],
}

impl<const N: usize> Default for Packed<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> Packed<N> {
    pub const BITS: usize = N * 32;

    pub fn new() -> Self {
        Self { parts: [0; N] }
    }

    /// Rebuild from wire order (most significant word first)
    pub fn from_words(words: [u32; N]) -> Self {
        let mut parts = words;
        parts.reverse();
        Self { parts }
    }

    /// Emit in wire order (most significant word first)
    pub fn to_words(&self) -> [u32; N] {
        let mut words = self.parts;
        words.reverse();
        words
    }

    /// Raw parts, part 0 holding bits 0..31
    pub fn parts(&self) -> &[u32; N] {
        &self.parts
    }

    /// Store `value` in `field`, failing if it does not fit.
    pub fn set(&mut self, field: Field, value: u32) -> Result<()> {
        debug_assert!(field.width > 0 && field.width <= 32);
        debug_assert!(field.end() as usize <= Self::BITS);

        if value > field.max() {
            return Err(CompileError::capacity(
                Resource::Field(field.name),
                value as usize,
                field.max() as usize,
            ));
        }

        let mask = u64::from(field.max());
        let word = field.offset as usize / 32;
        let shift = field.offset as usize % 32;

        // A field spans at most two parts.
        let wide_mask = mask << shift;
        let wide_val = u64::from(value) << shift;

        self.parts[word] &= !(wide_mask as u32);
        self.parts[word] |= wide_val as u32;

        if shift + field.width as usize > 32 {
            self.parts[word + 1] &= !((wide_mask >> 32) as u32);
            self.parts[word + 1] |= (wide_val >> 32) as u32;
        }

        Ok(())
    }

    pub fn set_bool(&mut self, field: Field, value: bool) -> Result<()> {
        self.set(field, value as u32)
    }

    pub fn get(&self, field: Field) -> u32 {
        let word = field.offset as usize / 32;
        let shift = field.offset as usize % 32;

        let mut wide = u64::from(self.parts[word]);
        if shift + field.width as usize > 32 {
            wide |= u64::from(self.parts[word + 1]) << 32;
        }

        ((wide >> shift) & u64::from(field.max())) as u32
    }

    pub fn get_bool(&self, field: Field) -> bool {
        self.get(field) != 0
    }
}

/// Check that a layout table tiles without overlap and fits `bits`.
pub fn check_layout(fields: &[Field], bits: usize) -> std::result::Result<(), String> {
    let mut sorted: Vec<&Field> = fields.iter().collect();
    sorted.sort_by_key(|f| f.offset);

    for pair in sorted.windows(2) {
        if pair[0].end() > pair[1].offset {
            return Err(format!("{} overlaps {}", pair[0].name, pair[1].name));
        }
    }

    match sorted.last() {
        Some(last) if last.end() as usize > bits => {
            Err(format!("{} ends past bit {}", last.name, bits))
        }
        _ => Ok(()),
    }
}

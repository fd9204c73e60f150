//! VPE 128-bit instruction layout
//!
//! Bit positions follow the hardware header: bit 0 is the end-of-program flag,
//! bit 127 the top bit of the most significant word.

use crate::bits::Field;

pub const END_OF_PROGRAM: Field = Field::new("end_of_program", 0, 1);
pub const CONSTANT_RELATIVE_ADDRESSING_ENABLE: Field =
    Field::new("constant_relative_addressing_enable", 1, 1);
pub const EXPORT_WRITE_INDEX: Field = Field::new("export_write_index", 2, 5);
pub const SCALAR_RD_INDEX: Field = Field::new("scalar_rD_index", 7, 6);

/// Vector write enables, indexed x, y, z, w
pub const VECTOR_WRITE_ENABLE: [Field; 4] = [
    Field::new("vector_op_write_x_enable", 16, 1),
    Field::new("vector_op_write_y_enable", 15, 1),
    Field::new("vector_op_write_z_enable", 14, 1),
    Field::new("vector_op_write_w_enable", 13, 1),
];

/// Scalar write enables, indexed x, y, z, w
pub const SCALAR_WRITE_ENABLE: [Field; 4] = [
    Field::new("scalar_op_write_x_enable", 20, 1),
    Field::new("scalar_op_write_y_enable", 19, 1),
    Field::new("scalar_op_write_z_enable", 18, 1),
    Field::new("scalar_op_write_w_enable", 17, 1),
];

/// Fields of one input-register descriptor
#[derive(Debug, Clone, Copy)]
pub struct SrcFields {
    pub ty: Field,
    pub index: Field,
    /// Indexed x, y, z, w
    pub swizzle: [Field; 4],
    pub negate: Field,
    pub absolute: Field,
}

impl SrcFields {
    pub const fn fields(&self) -> [Field; 8] {
        [
            self.ty,
            self.index,
            self.swizzle[0],
            self.swizzle[1],
            self.swizzle[2],
            self.swizzle[3],
            self.negate,
            self.absolute,
        ]
    }
}

pub const RC: SrcFields = SrcFields {
    ty: Field::new("rC_type", 21, 2),
    index: Field::new("rC_index", 23, 6),
    swizzle: [
        Field::new("rC_swizzle_x", 35, 2),
        Field::new("rC_swizzle_y", 33, 2),
        Field::new("rC_swizzle_z", 31, 2),
        Field::new("rC_swizzle_w", 29, 2),
    ],
    negate: Field::new("rC_negate", 37, 1),
    absolute: Field::new("rC_absolute", 119, 1),
};

pub const RB: SrcFields = SrcFields {
    ty: Field::new("rB_type", 38, 2),
    index: Field::new("rB_index", 40, 6),
    swizzle: [
        Field::new("rB_swizzle_x", 52, 2),
        Field::new("rB_swizzle_y", 50, 2),
        Field::new("rB_swizzle_z", 48, 2),
        Field::new("rB_swizzle_w", 46, 2),
    ],
    negate: Field::new("rB_negate", 54, 1),
    absolute: Field::new("rB_absolute", 118, 1),
};

pub const RA: SrcFields = SrcFields {
    ty: Field::new("rA_type", 55, 2),
    index: Field::new("rA_index", 57, 6),
    swizzle: [
        Field::new("rA_swizzle_x", 69, 2),
        Field::new("rA_swizzle_y", 67, 2),
        Field::new("rA_swizzle_z", 65, 2),
        Field::new("rA_swizzle_w", 63, 2),
    ],
    negate: Field::new("rA_negate", 71, 1),
    absolute: Field::new("rA_absolute", 117, 1),
};

/// rA, rB, rC in operand-slot order
pub const SOURCES: [SrcFields; 3] = [RA, RB, RC];

pub const ATTRIBUTE_FETCH_INDEX: Field = Field::new("attribute_fetch_index", 72, 4);
pub const UNIFORM_FETCH_INDEX: Field = Field::new("uniform_fetch_index", 76, 10);
pub const VECTOR_OPCODE: Field = Field::new("vector_opcode", 86, 5);
pub const SCALAR_OPCODE: Field = Field::new("scalar_opcode", 91, 5);
pub const ADDRESS_REGISTER_SELECT: Field = Field::new("address_register_select", 96, 2);

/// Predicate swizzle, indexed x, y, z, w
pub const PREDICATE_SWIZZLE: [Field; 4] = [
    Field::new("predicate_swizzle_x", 104, 2),
    Field::new("predicate_swizzle_y", 102, 2),
    Field::new("predicate_swizzle_z", 100, 2),
    Field::new("predicate_swizzle_w", 98, 2),
];

pub const PREDICATE_LT: Field = Field::new("predicate_lt", 106, 1);
pub const PREDICATE_EQ: Field = Field::new("predicate_eq", 107, 1);
pub const PREDICATE_GT: Field = Field::new("predicate_gt", 108, 1);
pub const CONDITION_CHECK: Field = Field::new("condition_check", 109, 1);
pub const CONDITION_SET: Field = Field::new("condition_set", 110, 1);
pub const VECTOR_RD_INDEX: Field = Field::new("vector_rD_index", 111, 6);
pub const BIT120: Field = Field::new("bit120", 120, 1);
pub const CONDITION_REGISTER_INDEX: Field = Field::new("condition_register_index", 121, 1);
pub const SATURATE_RESULT: Field = Field::new("saturate_result", 122, 1);
pub const ATTRIBUTE_RELATIVE_ADDRESSING_ENABLE: Field =
    Field::new("attribute_relative_addressing_enable", 123, 1);
pub const EXPORT_RELATIVE_ADDRESSING_ENABLE: Field =
    Field::new("export_relative_addressing_enable", 124, 1);
pub const CONDITION_FLAGS_WRITE_ENABLE: Field =
    Field::new("condition_flags_write_enable", 125, 1);
pub const EXPORT_VECTOR_WRITE_ENABLE: Field = Field::new("export_vector_write_enable", 126, 1);
pub const BIT127: Field = Field::new("bit127", 127, 1);

/// Export write index meaning "no export"
pub const EXPORT_DISABLED: u32 = 31;
/// Register index meaning "no register-file write"
pub const RD_DISABLED: u32 = 63;

/// Every field of the layout
pub const ALL: &[Field] = &[
    END_OF_PROGRAM,
    CONSTANT_RELATIVE_ADDRESSING_ENABLE,
    EXPORT_WRITE_INDEX,
    SCALAR_RD_INDEX,
    VECTOR_WRITE_ENABLE[0],
    VECTOR_WRITE_ENABLE[1],
    VECTOR_WRITE_ENABLE[2],
    VECTOR_WRITE_ENABLE[3],
    SCALAR_WRITE_ENABLE[0],
    SCALAR_WRITE_ENABLE[1],
    SCALAR_WRITE_ENABLE[2],
    SCALAR_WRITE_ENABLE[3],
    RC.ty,
    RC.index,
    RC.swizzle[0],
    RC.swizzle[1],
    RC.swizzle[2],
    RC.swizzle[3],
    RC.negate,
    RB.ty,
    RB.index,
    RB.swizzle[0],
    RB.swizzle[1],
    RB.swizzle[2],
    RB.swizzle[3],
    RB.negate,
    RA.ty,
    RA.index,
    RA.swizzle[0],
    RA.swizzle[1],
    RA.swizzle[2],
    RA.swizzle[3],
    RA.negate,
    ATTRIBUTE_FETCH_INDEX,
    UNIFORM_FETCH_INDEX,
    VECTOR_OPCODE,
    SCALAR_OPCODE,
    ADDRESS_REGISTER_SELECT,
    PREDICATE_SWIZZLE[0],
    PREDICATE_SWIZZLE[1],
    PREDICATE_SWIZZLE[2],
    PREDICATE_SWIZZLE[3],
    PREDICATE_LT,
    PREDICATE_EQ,
    PREDICATE_GT,
    CONDITION_CHECK,
    CONDITION_SET,
    VECTOR_RD_INDEX,
    RA.absolute,
    RB.absolute,
    RC.absolute,
    BIT120,
    CONDITION_REGISTER_INDEX,
    SATURATE_RESULT,
    ATTRIBUTE_RELATIVE_ADDRESSING_ENABLE,
    EXPORT_RELATIVE_ADDRESSING_ENABLE,
    CONDITION_FLAGS_WRITE_ENABLE,
    EXPORT_VECTOR_WRITE_ENABLE,
    BIT127,
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bits::check_layout;

    #[test]
    fn test_layout_fits_128_bits() {
        assert_eq!(check_layout(ALL, 128), Ok(()));
    }

    #[test]
    fn test_layout_covers_every_bit() {
        let used: u32 = ALL.iter().map(|f| f.width as u32).sum();
        assert_eq!(used, 128);
    }

    #[test]
    fn test_source_descriptors_are_listed() {
        for src in SOURCES {
            for field in src.fields() {
                assert!(ALL.contains(&field), "{} missing", field.name);
            }
        }
    }
}

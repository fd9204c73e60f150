//! Fragment processor word layouts
//!
//! ALU lane: 64 bits, MFU: 64 bits, depth-write: 32 bits. Bit 0 is the least
//! significant bit of the last word on the wire.

use crate::bits::Field;

/// Fields of one ALU source operand
#[derive(Debug, Clone, Copy)]
pub struct AluSrcFields {
    pub index: Field,
    pub datatype: Field,
    pub sub_reg_select_high: Field,
    pub negate: Field,
    pub absolute: Field,
    pub minus_one: Field,
    pub scale_by_two: Field,
}

impl AluSrcFields {
    pub const fn fields(&self) -> [Field; 7] {
        [
            self.index,
            self.datatype,
            self.sub_reg_select_high,
            self.negate,
            self.absolute,
            self.minus_one,
            self.scale_by_two,
        ]
    }
}

macro_rules! alu_src {
    ($n:literal, $base:expr) => {
        AluSrcFields {
            index: Field::new(concat!("src", $n, "_index"), $base, 6),
            datatype: Field::new(concat!("src", $n, "_datatype"), $base + 6, 1),
            sub_reg_select_high: Field::new(concat!("src", $n, "_sub_reg_select_high"), $base + 7, 1),
            negate: Field::new(concat!("src", $n, "_negate"), $base + 8, 1),
            absolute: Field::new(concat!("src", $n, "_absolute"), $base + 9, 1),
            minus_one: Field::new(concat!("src", $n, "_minus_one"), $base + 10, 1),
            scale_by_two: Field::new(concat!("src", $n, "_scale_by_two"), $base + 11, 1),
        }
    };
}

pub mod alu {
    use super::*;

    /// Indexed by operand position
    pub const SRC: [AluSrcFields; 4] = [
        alu_src!(0, 36),
        alu_src!(1, 24),
        alu_src!(2, 12),
        alu_src!(3, 0),
    ];

    pub const OP: Field = Field::new("op", 48, 2);
    pub const DST_INDEX: Field = Field::new("dst_index", 50, 6);
    pub const DST_WRITE_LOW: Field = Field::new("dst_write_low_sub_reg", 56, 1);
    pub const DST_WRITE_HIGH: Field = Field::new("dst_write_high_sub_reg", 57, 1);
    pub const DST_SATURATE: Field = Field::new("dst_saturate", 58, 1);
    pub const DST_ENABLE: Field = Field::new("dst_enable", 59, 1);

    pub fn all() -> Vec<Field> {
        let mut fields: Vec<Field> = SRC.iter().flat_map(|s| s.fields()).collect();
        fields.extend([
            OP,
            DST_INDEX,
            DST_WRITE_LOW,
            DST_WRITE_HIGH,
            DST_SATURATE,
            DST_ENABLE,
        ]);
        fields
    }
}

pub mod mfu {
    use super::*;

    #[derive(Debug, Clone, Copy)]
    pub struct VarFields {
        pub op: Field,
        pub tram_row: Field,
    }

    #[derive(Debug, Clone, Copy)]
    pub struct MulFields {
        pub dst: Field,
        pub src: [Field; 2],
    }

    pub const VAR: [VarFields; 4] = [
        VarFields {
            op: Field::new("var0_op", 0, 2),
            tram_row: Field::new("var0_tram_row", 2, 4),
        },
        VarFields {
            op: Field::new("var1_op", 6, 2),
            tram_row: Field::new("var1_tram_row", 8, 4),
        },
        VarFields {
            op: Field::new("var2_op", 12, 2),
            tram_row: Field::new("var2_tram_row", 14, 4),
        },
        VarFields {
            op: Field::new("var3_op", 18, 2),
            tram_row: Field::new("var3_tram_row", 20, 4),
        },
    ];

    pub const MUL: [MulFields; 2] = [
        MulFields {
            dst: Field::new("mul0_dst", 24, 3),
            src: [
                Field::new("mul0_src0", 27, 4),
                Field::new("mul0_src1", 31, 4),
            ],
        },
        MulFields {
            dst: Field::new("mul1_dst", 35, 3),
            src: [
                Field::new("mul1_src0", 38, 4),
                Field::new("mul1_src1", 42, 4),
            ],
        },
    ];

    pub const SFU_OP: Field = Field::new("sfu_op", 46, 4);
    pub const SFU_REG: Field = Field::new("sfu_reg", 50, 6);

    pub fn all() -> Vec<Field> {
        let mut fields = Vec::new();
        for var in VAR {
            fields.extend([var.op, var.tram_row]);
        }
        for mul in MUL {
            fields.extend([mul.dst, mul.src[0], mul.src[1]]);
        }
        fields.extend([SFU_OP, SFU_REG]);
        fields
    }
}

pub mod dw {
    use super::*;

    pub const ENABLE: Field = Field::new("enable", 0, 1);
    pub const INDEX: Field = Field::new("index", 1, 4);
    pub const STENCIL_WRITE: Field = Field::new("stencil_write", 5, 1);
    pub const SRC_REGS: Field = Field::new("src_regs", 6, 1);

    pub const ALL: &[Field] = &[ENABLE, INDEX, STENCIL_WRITE, SRC_REGS];
}

//! End-to-end tests for the vertex path

use tgr_core::{CompileError, ConflictError, UnsupportedError};
use tgr_shader::bits::{Field, Packed};
use tgr_shader::vpe::{layout, VecOpcode, VpeBuilder, VpePacker, SUPPORTED_OPCODES};
use tgr_shader::{
    compile_vertex, CompileOptions, DstOperand, DstRegister, Instruction, Opcode,
    OperandTranslator, Processor, RegisterFile, ShaderSource, SrcOperand, SrcRegister, WriteMask,
};

/// Read a field straight out of wire-order words
fn extract<const N: usize>(words: &[u32; N], field: Field) -> u32 {
    let mut value = 0u32;
    for bit in 0..field.width as usize {
        let b = field.offset as usize + bit;
        let word = words[N - 1 - b / 32];
        value |= ((word >> (b % 32)) & 1) << bit;
    }
    value
}

fn vertex(instrs: Vec<Instruction>) -> ShaderSource {
    ShaderSource::with_instructions(Processor::Vertex, instrs)
}

fn mov(dst: DstRegister, src: SrcRegister) -> Instruction {
    Instruction::new(Opcode::Mov).with_dst(dst).with_src(src)
}

#[test]
fn test_every_field_round_trips() {
    for field in layout::ALL {
        for value in [1, field.max(), field.max() / 2 + 1] {
            let mut p = Packed::<4>::new();
            p.set(*field, value).unwrap();
            let words = p.to_words();
            assert_eq!(extract(&words, *field), value, "{}", field.name);

            // Nothing outside the field is touched.
            let mut clear = p;
            clear.set(*field, 0).unwrap();
            assert_eq!(clear.to_words(), [0; 4], "{}", field.name);
        }
    }
}

#[test]
fn test_record_fields_land_at_documented_offsets() {
    let instr = VpeBuilder::default()
        .build(
            &Instruction::new(Opcode::Mad)
                .with_dst(DstRegister::new(RegisterFile::Temporary, 5).masked(WriteMask::X | WriteMask::W))
                .with_src(SrcRegister::new(RegisterFile::Input, 9).negated())
                .with_src(SrcRegister::new(RegisterFile::Constant, 683))
                .with_src(SrcRegister::new(RegisterFile::Temporary, 17).absolute())
                .saturated(),
        )
        .unwrap()
        .unwrap();
    let words = VpePacker::pack(&instr, false).unwrap();

    assert_eq!(extract(&words, layout::VECTOR_OPCODE), VecOpcode::Mad as u32);
    assert_eq!(extract(&words, layout::ATTRIBUTE_FETCH_INDEX), 9);
    assert_eq!(extract(&words, layout::UNIFORM_FETCH_INDEX), 683);
    assert_eq!(extract(&words, layout::VECTOR_RD_INDEX), 5);
    assert_eq!(extract(&words, layout::EXPORT_WRITE_INDEX), 31);
    assert_eq!(extract(&words, layout::RA.ty), 2);
    assert_eq!(extract(&words, layout::RA.index), 0);
    assert_eq!(extract(&words, layout::RA.negate), 1);
    assert_eq!(extract(&words, layout::RB.ty), 3);
    assert_eq!(extract(&words, layout::RB.index), 0);
    assert_eq!(extract(&words, layout::RC.ty), 1);
    assert_eq!(extract(&words, layout::RC.index), 17);
    assert_eq!(extract(&words, layout::RC.absolute), 1);
    assert_eq!(extract(&words, layout::VECTOR_WRITE_ENABLE[0]), 1);
    assert_eq!(extract(&words, layout::VECTOR_WRITE_ENABLE[1]), 0);
    assert_eq!(extract(&words, layout::VECTOR_WRITE_ENABLE[3]), 1);
    assert_eq!(extract(&words, layout::SATURATE_RESULT), 1);
    assert_eq!(extract(&words, layout::PREDICATE_LT), 1);
    assert_eq!(extract(&words, layout::PREDICATE_EQ), 1);
    assert_eq!(extract(&words, layout::PREDICATE_GT), 1);
    for (i, f) in layout::PREDICATE_SWIZZLE.iter().enumerate() {
        assert_eq!(extract(&words, *f), i as u32);
    }
}

#[test]
fn test_shared_attribute_fetch() {
    let mul = |a: u32, b: u32| {
        Instruction::new(Opcode::Mul)
            .with_dst(DstRegister::new(RegisterFile::Temporary, 0))
            .with_src(SrcRegister::new(RegisterFile::Input, a))
            .with_src(SrcRegister::new(RegisterFile::Input, b))
    };

    let program = compile_vertex(&vertex(vec![mul(4, 4)]), &CompileOptions::default()).unwrap();
    let words = program.words().unwrap();
    let words: [u32; 4] = [words[0], words[1], words[2], words[3]];
    assert_eq!(extract(&words, layout::ATTRIBUTE_FETCH_INDEX), 4);

    let err = compile_vertex(&vertex(vec![mul(4, 5)]), &CompileOptions::default()).unwrap_err();
    assert_eq!(
        err,
        CompileError::EncodingConflict(ConflictError::AttributeFetch {
            first: 4,
            second: 5
        })
    );
}

#[test]
fn test_shared_uniform_fetch() {
    let mad = |a: u32, b: u32| {
        Instruction::new(Opcode::Mad)
            .with_dst(DstRegister::new(RegisterFile::Temporary, 0))
            .with_src(SrcRegister::new(RegisterFile::Constant, a))
            .with_src(SrcRegister::new(RegisterFile::Temporary, 1))
            .with_src(SrcRegister::new(RegisterFile::Constant, b))
    };
    let ok = compile_vertex(&vertex(vec![mad(7, 7)]), &CompileOptions::default()).unwrap();
    assert!(ok.words().is_ok());

    // The conflict is reported by the compile itself, not deferred to packing.
    assert!(matches!(
        compile_vertex(&vertex(vec![mad(7, 8)]), &CompileOptions::default()),
        Err(CompileError::EncodingConflict(ConflictError::UniformFetch {
            first: 7,
            second: 8
        }))
    ));

    // An immediate lands in the uniform slot too.
    let mixed = Instruction::new(Opcode::Add)
        .with_dst(DstRegister::new(RegisterFile::Temporary, 0))
        .with_src(SrcRegister::new(RegisterFile::Constant, 7))
        .with_src(SrcRegister::new(RegisterFile::Immediate, 0));
    assert!(matches!(
        compile_vertex(&vertex(vec![mixed]), &CompileOptions::default()),
        Err(CompileError::EncodingConflict(ConflictError::UniformFetch { .. }))
    ));
}

#[test]
fn test_dual_output_always_fails() {
    let translator = OperandTranslator::default();
    for (vi, si) in [(0, 0), (0, 1), (3, 7)] {
        for src in [SrcOperand::temp(0), SrcOperand::attribute(2)] {
            let mut instr = VpeBuilder::new(translator)
                .build(&mov(
                    DstRegister::new(RegisterFile::Output, vi),
                    SrcRegister::new(RegisterFile::Temporary, 0),
                ))
                .unwrap()
                .unwrap();
            instr.scalar.op = tgr_shader::vpe::ScalarOpcode::Rsq;
            instr.scalar.dst = DstOperand::output(si, WriteMask::X);
            instr.scalar.src = src;
            assert_eq!(
                VpePacker::pack(&instr, false),
                Err(CompileError::EncodingConflict(ConflictError::DualOutput))
            );
        }
    }
}

#[test]
fn test_end_of_program_on_last_instruction() {
    for n in 1..=8 {
        let instrs = (0..n)
            .map(|i| {
                mov(
                    DstRegister::new(RegisterFile::Temporary, i),
                    SrcRegister::new(RegisterFile::Input, 0),
                )
            })
            .collect();
        let program = compile_vertex(&vertex(instrs), &CompileOptions::default()).unwrap();
        let words = program.words().unwrap();
        for (i, chunk) in words.chunks(4).enumerate() {
            let chunk: [u32; 4] = [chunk[0], chunk[1], chunk[2], chunk[3]];
            assert_eq!(
                extract(&chunk, layout::END_OF_PROGRAM) == 1,
                i as u32 == n - 1
            );
        }
    }
}

/// Operand files for a sweep: one file per source slot, plus the destination.
/// Every source of one file uses the same index, so fetch slots stay shared.
fn operand_patterns() -> Vec<([RegisterFile; 3], DstRegister)> {
    use RegisterFile::*;
    let srcs = [
        [Temporary; 3],
        [Input; 3],
        [Constant; 3],
        [Immediate; 3],
        [Input, Constant, Temporary],
        [Immediate, Input, Temporary],
        [Temporary, Input, Constant],
    ];
    let dsts = [
        DstRegister::new(Temporary, 1),
        DstRegister::new(Temporary, 62),
        DstRegister::new(Output, 0).masked(WriteMask::X | WriteMask::Z),
        DstRegister::new(Output, 30),
    ];
    srcs.iter()
        .flat_map(|s| dsts.iter().map(move |d| (*s, *d)))
        .collect()
}

fn sweep_index(file: RegisterFile, high: bool) -> u32 {
    match (file, high) {
        (RegisterFile::Input, false) => 0,
        (RegisterFile::Input, true) => 15,
        (RegisterFile::Constant, false) => 0,
        (RegisterFile::Constant, true) => 959,
        (RegisterFile::Immediate, false) => 0,
        (RegisterFile::Immediate, true) => 63,
        (_, false) => 2,
        (_, true) => 61,
    }
}

#[test]
fn test_opcode_coverage_boundary() {
    let options = CompileOptions::default();
    for op in Opcode::ALL {
        for (files, dst) in operand_patterns() {
            for high in [false, true] {
                let mut instr = Instruction::new(op);
                if op.has_dst() {
                    instr = instr.with_dst(dst);
                }
                for file in files.iter().take(op.num_src()) {
                    let src = SrcRegister::new(*file, sweep_index(*file, high));
                    instr = instr.with_src(src);
                }

                let result = compile_vertex(&vertex(vec![instr.clone()]), &options)
                    .and_then(|p| p.words());
                if SUPPORTED_OPCODES.contains(&op) {
                    assert!(result.is_ok(), "{:?} should compile: {:?}", instr, result);
                } else {
                    assert!(
                        matches!(
                            result,
                            Err(CompileError::Unsupported(UnsupportedError::Opcode { .. }))
                        ),
                        "{} should be rejected",
                        op.name()
                    );
                }
            }
        }
    }
}

#[test]
fn test_end_only_program() {
    let source = vertex(vec![Instruction::new(Opcode::End)]);
    let program = compile_vertex(&source, &CompileOptions::default()).unwrap();
    assert!(program.is_empty());

    let words = program.words().unwrap();
    let words: [u32; 4] = [words[0], words[1], words[2], words[3]];
    assert_eq!(extract(&words, layout::VECTOR_OPCODE), VecOpcode::Nop as u32);
    assert_eq!(extract(&words, layout::END_OF_PROGRAM), 1);
}

#[test]
fn test_single_mov_scenario() {
    let source = vertex(vec![mov(
        DstRegister::new(RegisterFile::Output, 0),
        SrcRegister::new(RegisterFile::Input, 0),
    )]);
    let words = compile_vertex(&source, &CompileOptions::default())
        .unwrap()
        .words()
        .unwrap();
    assert_eq!(words.len(), 4);
    let words: [u32; 4] = [words[0], words[1], words[2], words[3]];

    assert_eq!(extract(&words, layout::VECTOR_OPCODE), VecOpcode::Mov as u32);
    assert_eq!(extract(&words, layout::EXPORT_WRITE_INDEX), 0);
    assert_eq!(extract(&words, layout::EXPORT_VECTOR_WRITE_ENABLE), 1);
    assert_eq!(extract(&words, layout::END_OF_PROGRAM), 1);
    assert_eq!(extract(&words, layout::ATTRIBUTE_FETCH_INDEX), 0);
}

#[test]
fn test_add_scenario() {
    let source = vertex(vec![Instruction::new(Opcode::Add)
        .with_dst(DstRegister::new(RegisterFile::Output, 0))
        .with_src(SrcRegister::new(RegisterFile::Input, 0))
        .with_src(SrcRegister::new(RegisterFile::Constant, 0))]);
    let program = compile_vertex(&source, &CompileOptions::default()).unwrap();

    let vec = &program.instructions()[0].vec;
    assert_eq!(vec.op, VecOpcode::Add);
    assert_eq!(vec.src[0], SrcOperand::attribute(0));
    assert!(vec.src[1].is_undef());
    assert_eq!(vec.src[2], SrcOperand::uniform(0));

    let words = program.words().unwrap();
    let words: [u32; 4] = [words[0], words[1], words[2], words[3]];
    assert_eq!(extract(&words, layout::RA.ty), 2);
    assert_eq!(extract(&words, layout::RB.ty), 0);
    assert_eq!(extract(&words, layout::RC.ty), 3);
}

#[test]
fn test_immediate_scenario() {
    let source = vertex(vec![mov(
        DstRegister::new(RegisterFile::Output, 0),
        SrcRegister::new(RegisterFile::Immediate, 2),
    )]);
    let program = compile_vertex(&source, &CompileOptions::default()).unwrap();
    let src = program.instructions()[0].vec.src[0];
    assert_eq!(src, SrcOperand::uniform(1021));

    let words = program.words().unwrap();
    let words: [u32; 4] = [words[0], words[1], words[2], words[3]];
    assert_eq!(extract(&words, layout::UNIFORM_FETCH_INDEX), 1021);
}

#[test]
fn test_disassembly_of_compiled_program() {
    let source = vertex(vec![
        Instruction::new(Opcode::Dp4)
            .with_dst(DstRegister::new(RegisterFile::Output, 0).masked(WriteMask::X))
            .with_src(SrcRegister::new(RegisterFile::Input, 0))
            .with_src(SrcRegister::new(RegisterFile::Constant, 0)),
        Instruction::new(Opcode::End),
    ]);
    let words = compile_vertex(&source, &CompileOptions::default())
        .unwrap()
        .words()
        .unwrap();
    let decoded = tgr_shader::VpeProgram::decode(&words).unwrap();
    assert_eq!(decoded.len(), 1);
    assert_eq!(decoded[0].to_string(), "DP4 o[0].x, a[0], c[0], _ ; NOP  END");
}

//! End-to-end tests for the fragment path

use tgr_core::{CompileError, UnsupportedError};
use tgr_shader::bits::{Field, Packed};
use tgr_shader::fp::layout::{alu, dw, mfu};
use tgr_shader::fp::{FpDwRegs, FpMulDst, FpMulSrc, FpPacker, FpSfuOp, FpVarOp};
use tgr_shader::{
    compile_fragment, compile_fragment_nodes, scalarize, CompileOptions, Declaration,
    DstRegister, Instruction, Opcode, Processor, RegisterFile, Semantic, ShaderSource,
    SrcRegister, WriteMask,
};

fn extract<const N: usize>(words: &[u32; N], field: Field) -> u32 {
    let mut value = 0u32;
    for bit in 0..field.width as usize {
        let b = field.offset as usize + bit;
        value |= ((words[N - 1 - b / 32] >> (b % 32)) & 1) << bit;
    }
    value
}

fn round_trip<const N: usize>(fields: &[Field]) {
    for field in fields {
        for value in [1, field.max()] {
            let mut p = Packed::<N>::new();
            p.set(*field, value).unwrap();
            assert_eq!(extract(&p.to_words(), *field), value, "{}", field.name);
        }
    }
}

#[test]
fn test_every_fp_field_round_trips() {
    round_trip::<2>(&alu::all());
    round_trip::<2>(&mfu::all());
    round_trip::<1>(dw::ALL);
}

fn colour_source(mask: WriteMask) -> ShaderSource {
    let mut source = ShaderSource::with_instructions(
        Processor::Fragment,
        vec![
            Instruction::new(Opcode::Mov)
                .with_dst(DstRegister::new(RegisterFile::Output, 0).masked(mask))
                .with_src(SrcRegister::new(RegisterFile::Input, 0)),
            Instruction::new(Opcode::End),
        ],
    );
    source.declarations = vec![
        Declaration::new(RegisterFile::Input, 0, 0).with_semantic(Semantic::Color),
        Declaration::new(RegisterFile::Output, 0, 0).with_semantic(Semantic::Color),
    ];
    source
}

#[test]
fn test_colour_output_scenario() {
    let program = compile_fragment(&colour_source(WriteMask::XYZW), &CompileOptions::default())
        .unwrap();
    assert_eq!(program.len(), 1);

    let words = program.words().unwrap();
    assert_eq!(words.alu.len(), 8);
    assert_eq!(words.mfu.len(), 2);
    assert_eq!(words.dw.len(), 1);

    // Lanes in write-mask order R, G, B, A land BGRA in r2/r3.
    let expected = [(3, 1, 0), (2, 0, 1), (2, 1, 0), (3, 0, 1)];
    for (lane, (reg, low, high)) in expected.iter().enumerate() {
        let w = [words.alu[lane * 2], words.alu[lane * 2 + 1]];
        assert_eq!(extract(&w, alu::DST_INDEX), *reg, "lane {}", lane);
        assert_eq!(extract(&w, alu::DST_WRITE_LOW), *low, "lane {}", lane);
        assert_eq!(extract(&w, alu::DST_WRITE_HIGH), *high, "lane {}", lane);
        assert_eq!(extract(&w, alu::DST_ENABLE), 1);
    }

    let d = [words.dw[0]];
    assert_eq!(extract(&d, dw::ENABLE), 1);
    assert_eq!(extract(&d, dw::INDEX), 1);
    assert_eq!(extract(&d, dw::SRC_REGS), FpDwRegs::R2R3 as u32);
    assert_eq!(extract(&d, dw::STENCIL_WRITE), 0);

    let info = program.info();
    assert_eq!(info.inputs.len(), 1);
    assert_eq!(info.color_input, Some(0));
}

#[test]
fn test_preamble_in_first_cycle() {
    let program = compile_fragment(&colour_source(WriteMask::XYZW), &CompileOptions::default())
        .unwrap();
    let words = program.words().unwrap();
    let m = [words.mfu[0], words.mfu[1]];

    assert_eq!(extract(&m, mfu::SFU_OP), FpSfuOp::Rcp as u32);
    assert_eq!(extract(&m, mfu::SFU_REG), 4);
    for (i, coef) in [FpMulSrc::BarycentricCoef0, FpMulSrc::BarycentricCoef1]
        .iter()
        .enumerate()
    {
        assert_eq!(
            extract(&m, mfu::MUL[i].dst),
            FpMulDst::BarycentricWeight as u32
        );
        assert_eq!(extract(&m, mfu::MUL[i].src[0]), FpMulSrc::SfuResult as u32);
        assert_eq!(extract(&m, mfu::MUL[i].src[1]), *coef as u32);
    }
    // User interpolation loads survive alongside the preamble.
    for var in mfu::VAR {
        assert_eq!(extract(&m, var.op), FpVarOp::Fp20 as u32);
        assert_eq!(extract(&m, var.tram_row), 0);
    }
}

#[test]
fn test_second_instruction_gets_its_own_cycle() {
    let mut source = colour_source(WriteMask::XYZW);
    source.instructions.insert(
        1,
        Instruction::new(Opcode::Mov)
            .with_dst(DstRegister::new(RegisterFile::Temporary, 0).masked(WriteMask::X))
            .with_src(SrcRegister::new(RegisterFile::Input, 0)),
    );
    let program = compile_fragment(&source, &CompileOptions::default()).unwrap();
    assert_eq!(program.len(), 2);
    let second = FpPacker::unpack_mfu([
        program.words().unwrap().mfu[2],
        program.words().unwrap().mfu[3],
    ]);
    assert_eq!(second.sfu.op, FpSfuOp::Nop);
}

#[test]
fn test_output_pair_follows_options() {
    let options = CompileOptions {
        output_register_base: 0,
        colour_buffer_base: 3,
        ..Default::default()
    };
    let program = compile_fragment(&colour_source(WriteMask::X), &options).unwrap();
    let instr = &program.instructions()[0];
    assert_eq!(instr.alu[0].dst.index, 1);
    assert_eq!(instr.dw.index, 3);
    assert_eq!(instr.dw.src_regs, FpDwRegs::R0R1);
}

#[test]
fn test_node_path_matches_direct_path() {
    let source = colour_source(WriteMask::XYZW);
    let options = CompileOptions::default();

    let direct = compile_fragment(&source, &options).unwrap();
    let ssa = scalarize(&source).unwrap();
    let nodes = compile_fragment_nodes(&ssa, &source.declarations, &options).unwrap();

    assert_eq!(direct.words().unwrap(), nodes.words().unwrap());
    assert_eq!(direct.info(), nodes.info());
}

#[test]
fn test_node_path_rejects_arithmetic() {
    let mut source = colour_source(WriteMask::XYZW);
    source.instructions[0] = Instruction::new(Opcode::Add)
        .with_dst(DstRegister::new(RegisterFile::Output, 0))
        .with_src(SrcRegister::new(RegisterFile::Input, 0))
        .with_src(SrcRegister::new(RegisterFile::Input, 0));
    let ssa = scalarize(&source).unwrap();
    assert!(matches!(
        compile_fragment_nodes(&ssa, &source.declarations, &CompileOptions::default()),
        Err(CompileError::Unsupported(UnsupportedError::InstructionKind(_)))
    ));
}

#[test]
fn test_non_colour_output_rejected() {
    let mut source = colour_source(WriteMask::XYZW);
    source.declarations[1] =
        Declaration::new(RegisterFile::Output, 0, 0).with_semantic(Semantic::Position);
    assert!(matches!(
        compile_fragment(&source, &CompileOptions::default()),
        Err(CompileError::Unsupported(UnsupportedError::DestinationFile(_)))
    ));
}

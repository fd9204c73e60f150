//! Benchmarks for instruction packing and whole-program compiles

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tgr_shader::fp::{FpAluDst, FpAluInstr, FpAluSrc, FpMfuInstr, FpPacker};
use tgr_shader::vpe::{ScalarInstr, VecInstr, VecOpcode, VpeInstr, VpePacker};
use tgr_shader::{
    compile_fragment, compile_vertex, CompileOptions, DstOperand, DstRegister, Instruction,
    Opcode, Processor, RegisterFile, ShaderSource, SrcOperand, SrcRegister, WriteMask,
};

fn mad_instr() -> VpeInstr {
    VpeInstr::new(
        VecInstr {
            op: VecOpcode::Mad,
            dst: DstOperand::output(1, WriteMask::XYZW),
            src: [
                SrcOperand::attribute(3),
                SrcOperand::uniform(12),
                SrcOperand::temp(4).negated(),
            ],
        },
        ScalarInstr::nop(),
    )
}

fn bench_vpe_pack(c: &mut Criterion) {
    let instr = mad_instr();
    c.bench_function("vpe_pack_mad", |b| {
        b.iter(|| VpePacker::pack(black_box(&instr), false).unwrap());
    });

    let words = VpePacker::pack(&instr, true).unwrap();
    c.bench_function("vpe_decode_mad", |b| {
        b.iter(|| VpePacker::decode(black_box(words)));
    });
}

fn bench_fp_pack(c: &mut Criterion) {
    let lane = FpAluInstr::mov(
        FpAluDst {
            index: 2,
            write_low_sub_reg: true,
            enable: true,
            ..Default::default()
        },
        FpAluSrc::row(1),
    );
    let mfu = FpMfuInstr::default();

    c.bench_function("fp_pack_alu_lane", |b| {
        b.iter(|| FpPacker::pack_alu(black_box(&lane)).unwrap());
    });
    c.bench_function("fp_pack_mfu", |b| {
        b.iter(|| FpPacker::pack_mfu(black_box(&mfu)).unwrap());
    });
}

fn vertex_source(len: usize) -> ShaderSource {
    let instr = Instruction::new(Opcode::Mad)
        .with_dst(DstRegister::new(RegisterFile::Temporary, 0))
        .with_src(SrcRegister::new(RegisterFile::Input, 0))
        .with_src(SrcRegister::new(RegisterFile::Constant, 4))
        .with_src(SrcRegister::new(RegisterFile::Temporary, 0));
    ShaderSource::with_instructions(Processor::Vertex, vec![instr; len])
}

fn bench_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile_vertex");
    let options = CompileOptions::default();

    for len in [16usize, 64, 256].iter() {
        let source = vertex_source(*len);
        group.throughput(Throughput::Elements(*len as u64));
        group.bench_with_input(BenchmarkId::from_parameter(len), &source, |b, source| {
            b.iter(|| {
                let program = compile_vertex(black_box(source), &options).unwrap();
                black_box(program.words().unwrap());
            });
        });
    }
    group.finish();

    let fragment = ShaderSource::with_instructions(
        Processor::Fragment,
        vec![Instruction::new(Opcode::Mov)
            .with_dst(DstRegister::new(RegisterFile::Output, 0))
            .with_src(SrcRegister::new(RegisterFile::Input, 1))],
    );
    c.bench_function("compile_fragment_mov", |b| {
        b.iter(|| {
            let program = compile_fragment(black_box(&fragment), &options).unwrap();
            black_box(program.words().unwrap());
        });
    });
}

criterion_group!(benches, bench_vpe_pack, bench_fp_pack, bench_compile);
criterion_main!(benches);

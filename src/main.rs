//! tgr3d-compiler
//!
//! Command-line front end: compiles TGSI-style text shaders for the GR3D
//! vertex and fragment processors.

mod tgsi;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{anyhow, bail, Context};
use clap::Parser;
use serde::Serialize;
use tracing::{debug, info};

use tgr_core::{logging, Config};
use tgr_shader::fp::{FpMfuInstr, FpSfuOp, FpVarOp};
use tgr_shader::{
    compile, compile_fragment_nodes, scalarize, CompileOptions, FpProgram, FpWords, Processor,
    Program, VpeProgram,
};

/// Shader compiler for the Tegra GR3D vertex and fragment processors
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Shader source files
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Configuration file (default: tgr3d/config.toml in the user config dir)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print a disassembly instead of the packed words
    #[arg(long)]
    disasm: bool,

    /// Print the compiled program and its words as JSON
    #[arg(long, conflicts_with = "disasm")]
    json: bool,

    /// Lower fragment shaders through the scalar node IR
    #[arg(long)]
    nodes: bool,

    /// Write the packed words as little-endian binary (single input only)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Words {
    Vertex(Vec<u32>),
    Fragment(FpWords),
}

impl Words {
    fn of(program: &Program) -> tgr_core::Result<Self> {
        Ok(match program {
            Program::Vertex(p) => Self::Vertex(p.words()?),
            Program::Fragment(p) => Self::Fragment(p.words()?),
        })
    }

    /// Flat word image; fragment streams are laid out ALU, MFU, DW
    fn flatten(&self) -> Vec<u32> {
        match self {
            Self::Vertex(words) => words.clone(),
            Self::Fragment(fp) => fp
                .alu
                .iter()
                .chain(&fp.mfu)
                .chain(&fp.dw)
                .copied()
                .collect(),
        }
    }
}

#[derive(Serialize)]
struct Report<'a> {
    file: String,
    program: &'a Program,
    words: &'a Words,
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)
            .map_err(|e| anyhow!("{e}"))
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => Config::load()
            .map_err(|e| anyhow!("{e}"))
            .context("failed to load config")?,
    };
    logging::init(config.debug.log_level);
    info!("tgr3d-compiler {}", env!("CARGO_PKG_VERSION"));

    if cli.output.is_some() && cli.inputs.len() > 1 {
        bail!("--output takes a single input file");
    }

    let options = CompileOptions::from(&config.compiler);
    let mut reports = Vec::new();

    for path in &cli.inputs {
        let program = compile_file(path, &options, cli.nodes)?;
        let words = Words::of(&program)
            .with_context(|| format!("failed to encode {}", path.display()))?;

        if config.debug.dump_shaders {
            for (i, word) in words.flatten().iter().enumerate() {
                debug!("{}[{:03}] = 0x{:08x}", path.display(), i, word);
            }
        }

        if let Some(out) = &cli.output {
            let flat = words.flatten();
            std::fs::write(out, bytemuck::cast_slice::<u32, u8>(&flat))
                .with_context(|| format!("failed to write {}", out.display()))?;
            info!("Wrote {} words to {}", flat.len(), out.display());
        } else if cli.json {
            reports.push((path.display().to_string(), program, words));
        } else if cli.disasm {
            println!("; {}", path.display());
            print_disasm(&program, &words)?;
        } else {
            println!("; {}", path.display());
            print_words(&words);
        }
    }

    if cli.json {
        let reports: Vec<Report> = reports
            .iter()
            .map(|(file, program, words)| Report {
                file: file.clone(),
                program,
                words,
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&reports)?);
    }

    Ok(())
}

fn compile_file(path: &Path, options: &CompileOptions, nodes: bool) -> anyhow::Result<Program> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let source =
        tgsi::parse(&text).with_context(|| format!("failed to parse {}", path.display()))?;

    let program = if nodes && source.processor == Processor::Fragment {
        scalarize(&source)
            .and_then(|ssa| compile_fragment_nodes(&ssa, &source.declarations, options))
            .map(Program::Fragment)
    } else {
        compile(&source, options)
    };
    program.with_context(|| format!("failed to compile {}", path.display()))
}

fn print_words(words: &Words) {
    match words {
        Words::Vertex(words) => {
            for (i, chunk) in words.chunks(4).enumerate() {
                println!(
                    "{:3}: {:08x} {:08x} {:08x} {:08x}",
                    i, chunk[0], chunk[1], chunk[2], chunk[3]
                );
            }
        }
        Words::Fragment(fp) => {
            let cycles = fp.dw.len();
            for i in 0..cycles {
                let alu: Vec<String> = fp.alu[i * 8..(i + 1) * 8]
                    .iter()
                    .map(|w| format!("{:08x}", w))
                    .collect();
                println!(
                    "{:3}: alu {} mfu {:08x} {:08x} dw {:08x}",
                    i,
                    alu.join(" "),
                    fp.mfu[i * 2],
                    fp.mfu[i * 2 + 1],
                    fp.dw[i]
                );
            }
        }
    }
}

fn print_disasm(program: &Program, words: &Words) -> anyhow::Result<()> {
    match (program, words) {
        (Program::Vertex(_), Words::Vertex(words)) => {
            let decoded = VpeProgram::decode(words).map_err(|e| anyhow!(e))?;
            for (i, instr) in decoded.iter().enumerate() {
                println!("{:3}: {}", i, instr);
            }
        }
        (Program::Fragment(p), _) => print_fragment(p),
        _ => bail!("program and word image disagree on the stage"),
    }
    Ok(())
}

fn describe_mfu(mfu: &FpMfuInstr) -> String {
    let mut parts = Vec::new();
    for (lane, var) in mfu.var.iter().enumerate() {
        if var.op != FpVarOp::Nop {
            parts.push(format!("var{} {:?} row{}", lane, var.op, var.tram_row));
        }
    }
    if mfu.sfu.op != FpSfuOp::Nop {
        parts.push(format!("sfu {:?} r{}", mfu.sfu.op, mfu.sfu.reg));
    }
    if mfu.uses_math() {
        for (i, mul) in mfu.mul.iter().enumerate() {
            parts.push(format!(
                "mul{} {:?} = {:?} * {:?}",
                i, mul.dst, mul.src[0], mul.src[1]
            ));
        }
    }
    parts.join(", ")
}

fn print_fragment(program: &FpProgram) {
    for (i, cycle) in program.instructions().iter().enumerate() {
        println!("{:3}: mfu  {}", i, describe_mfu(&cycle.mfu));
        for (lane, alu) in cycle.alu.iter().enumerate() {
            if !alu.is_nop() {
                println!("     alu{} {}", lane, alu);
            }
        }
        if cycle.dw.enable {
            println!(
                "     dw   buffer {} from {:?}",
                cycle.dw.index, cycle.dw.src_regs
            );
        }
    }

    let info = program.info();
    println!(
        "; {} inputs, colour input {:?}, max tram row {}",
        info.inputs.len(),
        info.color_input,
        info.max_tram_row
    );
}

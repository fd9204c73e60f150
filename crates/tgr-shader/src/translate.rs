//! Front end: source programs in, compiled programs out

use serde::Serialize;
use tgr_core::{CompilerConfig, Result, UnsupportedError};
use tracing::{debug, info};

use crate::fp::{FpBuilder, NodeGraph, OutputRegisters};
use crate::input::{Declaration, Processor, ShaderSource};
use crate::operand::OperandTranslator;
use crate::program::{FpProgram, VpeProgram};
use crate::ssa::SsaShader;
use crate::vpe::VpeBuilder;

/// Code generation knobs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompileOptions {
    pub immediate_reserve: u32,
    pub output_register_base: u8,
    pub colour_buffer_base: u8,
}

impl From<&CompilerConfig> for CompileOptions {
    fn from(config: &CompilerConfig) -> Self {
        Self {
            immediate_reserve: config.immediate_reserve,
            output_register_base: config.output_register_base,
            colour_buffer_base: config.colour_buffer_base,
        }
    }
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self::from(&CompilerConfig::default())
    }
}

/// Either kind of compiled program
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "stage", rename_all = "lowercase")]
pub enum Program {
    Vertex(VpeProgram),
    Fragment(FpProgram),
}

fn expect_stage(source: &ShaderSource, processor: Processor) -> Result<()> {
    if source.processor != processor {
        return Err(UnsupportedError::Stage(format!(
            "expected {:?} program, got {:?}",
            processor, source.processor
        ))
        .into());
    }
    Ok(())
}

/// Compile a vertex program, one VPE instruction per source instruction.
pub fn compile_vertex(source: &ShaderSource, options: &CompileOptions) -> Result<VpeProgram> {
    expect_stage(source, Processor::Vertex)?;

    let builder = VpeBuilder::new(OperandTranslator::new(options.immediate_reserve));
    let mut instructions = Vec::with_capacity(source.instructions.len());
    for instr in &source.instructions {
        if let Some(vpe) = builder.build(instr)? {
            instructions.push(vpe);
        }
    }

    let program = VpeProgram::new(instructions)?;
    info!("Compiled vertex program: {} instructions", program.len());
    Ok(program)
}

fn fragment_builder(declarations: &[Declaration], options: &CompileOptions) -> Result<FpBuilder> {
    let outputs = OutputRegisters::new(options.output_register_base)?;
    let mut builder = FpBuilder::new(outputs, options.colour_buffer_base);
    for decl in declarations {
        builder.declare(decl)?;
    }
    Ok(builder)
}

/// Compile a fragment program through the direct builder.
pub fn compile_fragment(source: &ShaderSource, options: &CompileOptions) -> Result<FpProgram> {
    expect_stage(source, Processor::Fragment)?;

    let mut builder = fragment_builder(&source.declarations, options)?;
    for imm in &source.immediates {
        builder.declare_immediate(imm);
    }
    for instr in &source.instructions {
        builder.emit(instr)?;
    }

    let (instructions, info) = builder.finish();
    let program = FpProgram::new(instructions, info)?;
    info!(
        "Compiled fragment program: {} cycles, {} inputs",
        program.len(),
        program.info().inputs.len()
    );
    Ok(program)
}

/// Compile a scalarized fragment shader through the node IR.
pub fn compile_fragment_nodes(
    shader: &SsaShader,
    declarations: &[Declaration],
    options: &CompileOptions,
) -> Result<FpProgram> {
    let graph = NodeGraph::build(shader)?;
    let mut builder = fragment_builder(declarations, options)?;
    graph.lower(&mut builder)?;

    let (instructions, info) = builder.finish();
    let program = FpProgram::new(instructions, info)?;
    debug!("Node path produced {} cycles", program.len());
    Ok(program)
}

/// Compile whichever stage `source` declares.
pub fn compile(source: &ShaderSource, options: &CompileOptions) -> Result<Program> {
    match source.processor {
        Processor::Vertex => compile_vertex(source, options).map(Program::Vertex),
        Processor::Fragment => compile_fragment(source, options).map(Program::Fragment),
    }
}

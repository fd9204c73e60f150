//! Shader code generation for the Tegra GR3D engine
//!
//! Lowers a register-allocated instruction list into the two native
//! instruction sets: the vertex processing engine (VPE) VLIW words and the
//! fragment processor ALU/MFU/depth-write streams.
//!
//! ```text
//! ShaderSource ─┬─ VpeBuilder ── VpePacker ──────────────── VPE words
//!               ├─ FpBuilder ─┬─ Scheduler ── FpPacker ──── ALU/MFU/DW words
//!               └─ scalarize ─ NodeGraph ┘
//! ```

pub mod bits;
pub mod fp;
pub mod input;
pub mod operand;
pub mod program;
pub mod ssa;
pub mod translate;
pub mod vpe;

pub use input::{
    Declaration, DstRegister, ImmediateValue, Instruction, Opcode, Processor, RegisterFile,
    Semantic, ShaderSource, SrcRegister,
};
pub use operand::{Component, DstOperand, OperandTranslator, SrcOperand, WriteMask};
pub use program::{FpProgram, FpWords, VpeProgram, MAX_INSTRUCTIONS};
pub use ssa::{scalarize, SsaShader};
pub use translate::{
    compile, compile_fragment, compile_fragment_nodes, compile_vertex, CompileOptions, Program,
};

//! Vertex processing engine code generation

pub mod builder;
pub mod layout;
pub mod pack;
pub mod types;

pub use builder::{VpeBuilder, SUPPORTED_OPCODES};
pub use pack::{DecodedSrc, DecodedVpe, VpePacker};
pub use types::{ScalarInstr, ScalarOpcode, VecInstr, VecOpcode, VpeInstr};

//! Fragment processor code generation
//!
//! Two front doors feed the same register policy and scheduler: the direct
//! builder working on source instructions, and the node IR working on the
//! scalar SSA stream.

pub mod builder;
pub mod layout;
pub mod nodes;
pub mod pack;
pub mod regalloc;
pub mod sched;
pub mod types;

pub use builder::FpBuilder;
pub use nodes::{Node, NodeGraph, NodeId, NodeOp, Store};
pub use pack::FpPacker;
pub use regalloc::{FpRegisters, GeneralRegs, OutputRegisters, RegClass};
pub use sched::Scheduler;
pub use types::*;

//! Fragment node IR
//!
//! A flat arena of nodes built from the scalar SSA stream. Only moves,
//! interpolated loads, constants and output stores are understood; anything
//! else is rejected while the graph is built. Stores are lowered through the
//! same [`FpBuilder`] as the direct path, four components per cycle at most.

use std::collections::HashMap;

use tgr_core::{CompileError, Result, UnsupportedError};
use tracing::debug;

use super::builder::{FpBuilder, Lane, LaneDst, LaneSrc};
use super::types::ALU_LANES;
use crate::operand::Component;
use crate::ssa::{AluOp, CfNode, SsaId, SsaInstr, SsaShader};

/// Dense node index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeOp {
    Mov,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Interpolated input component
    Var { tram_row: u32, component: Component },
    Alu { op: NodeOp, src: [Option<NodeId>; 4] },
    Imm { value: f32 },
}

/// Write of one node to one output component
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Store {
    pub output: u32,
    pub component: Component,
    pub value: NodeId,
}

#[derive(Debug, Clone, Default)]
pub struct NodeGraph {
    nodes: Vec<Node>,
    stores: Vec<Store>,
    defs: HashMap<SsaId, NodeId>,
}

impl NodeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn stores(&self) -> &[Store] {
        &self.stores
    }

    /// Build the graph from a scalarized shader
    pub fn build(shader: &SsaShader) -> Result<Self> {
        let mut graph = Self::new();
        for cf in &shader.body {
            match cf {
                CfNode::Block(instrs) => {
                    for instr in instrs {
                        graph.instruction(instr)?;
                    }
                }
                CfNode::If => return Err(unsupported_cf("if")),
                CfNode::Loop => return Err(unsupported_cf("loop")),
                CfNode::Function => return Err(unsupported_cf("function")),
            }
        }
        debug!(
            "FP node graph: {} nodes, {} stores",
            graph.nodes.len(),
            graph.stores.len()
        );
        Ok(graph)
    }

    fn resolve(&self, ssa: SsaId) -> Result<NodeId> {
        self.defs.get(&ssa).copied().ok_or_else(|| {
            UnsupportedError::Malformed(format!("ssa_{} used before definition", ssa)).into()
        })
    }

    fn instruction(&mut self, instr: &SsaInstr) -> Result<()> {
        match instr {
            SsaInstr::LoadInput {
                def,
                index,
                component,
            } => {
                let id = self.add(Node::Var {
                    tram_row: *index,
                    component: *component,
                });
                self.defs.insert(*def, id);
            }
            SsaInstr::LoadConst { def, value } => {
                let id = self.add(Node::Imm { value: *value });
                self.defs.insert(*def, id);
            }
            SsaInstr::Alu {
                def,
                op: AluOp::Fmov,
                src,
            } => {
                let first = src.first().ok_or_else(|| {
                    CompileError::from(UnsupportedError::Malformed(
                        "fmov without source".to_string(),
                    ))
                })?;
                let src0 = self.resolve(*first)?;
                let id = self.add(Node::Alu {
                    op: NodeOp::Mov,
                    src: [Some(src0), None, None, None],
                });
                self.defs.insert(*def, id);
            }
            SsaInstr::Alu { op, .. } => {
                return Err(UnsupportedError::InstructionKind(format!("alu {}", op.name())).into());
            }
            SsaInstr::StoreOutput {
                index,
                component,
                src,
            } => {
                let value = self.resolve(*src)?;
                self.stores.push(Store {
                    output: *index,
                    component: *component,
                    value,
                });
            }
            SsaInstr::Tex => return Err(unsupported_kind("texture")),
            SsaInstr::Jump => return Err(unsupported_cf("jump")),
            SsaInstr::Phi => return Err(unsupported_kind("phi")),
            SsaInstr::ParallelCopy => return Err(unsupported_kind("parallel copy")),
            SsaInstr::Call => return Err(unsupported_cf("call")),
            SsaInstr::Undef => return Err(unsupported_kind("undef")),
        }
        Ok(())
    }

    /// Where a node's value can be read from
    fn lane_source(&self, id: NodeId) -> Result<LaneSrc> {
        match self.node(id) {
            Node::Var {
                tram_row,
                component,
            } => Ok(LaneSrc::Row {
                tram_row: *tram_row,
                component: *component,
            }),
            Node::Imm { value } if *value == 0.0 => Ok(LaneSrc::Const(false)),
            Node::Imm { value } if *value == 1.0 => Ok(LaneSrc::Const(true)),
            Node::Imm { value } => Err(UnsupportedError::Immediate(value.to_string()).into()),
            Node::Alu {
                op: NodeOp::Mov,
                src,
            } => match src[0] {
                Some(inner) => self.lane_source(inner),
                None => Err(UnsupportedError::Malformed("mov without source".to_string()).into()),
            },
        }
    }

    /// Lower every store into fragment cycles.
    ///
    /// Consecutive stores to the same output share a cycle while they fit:
    /// at most four lanes, one write per component, one TRAM row per
    /// interpolation lane.
    pub fn lower(&self, builder: &mut FpBuilder) -> Result<()> {
        let mut group = Group::default();

        for store in &self.stores {
            let src = self.lane_source(store.value)?;
            let lane = Lane {
                dst: LaneDst::Output {
                    index: store.output,
                    component: store.component,
                },
                src,
                negate: false,
                absolute: false,
            };

            if !group.accepts(store, &src) {
                group.flush(builder)?;
            }
            group.push(store, lane);
        }

        group.flush(builder)
    }
}

#[derive(Debug, Default)]
struct Group {
    output: Option<u32>,
    written: [bool; 4],
    rows: [Option<u32>; 4],
    lanes: Vec<Lane>,
}

impl Group {
    fn accepts(&self, store: &Store, src: &LaneSrc) -> bool {
        if self.lanes.is_empty() {
            return true;
        }
        if self.output != Some(store.output)
            || self.lanes.len() == ALU_LANES
            || self.written[store.component.index()]
        {
            return false;
        }
        match src {
            LaneSrc::Row {
                tram_row,
                component,
            } => self.rows[component.index()].map_or(true, |row| row == *tram_row),
            _ => true,
        }
    }

    fn push(&mut self, store: &Store, lane: Lane) {
        self.output = Some(store.output);
        self.written[store.component.index()] = true;
        if let LaneSrc::Row {
            tram_row,
            component,
        } = lane.src
        {
            self.rows[component.index()] = Some(tram_row);
        }
        self.lanes.push(lane);
    }

    fn flush(&mut self, builder: &mut FpBuilder) -> Result<()> {
        if !self.lanes.is_empty() {
            builder.emit_cycle(&self.lanes, false)?;
        }
        *self = Self::default();
        Ok(())
    }
}

fn unsupported_cf(what: &str) -> CompileError {
    UnsupportedError::ControlFlow(what.to_string()).into()
}

fn unsupported_kind(what: &str) -> CompileError {
    UnsupportedError::InstructionKind(what.to_string()).into()
}

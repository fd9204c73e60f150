//! Error types for the tgr3d shader compiler
//!
//! Every failure is fatal for the shader being compiled: a compile either
//! produces a complete program or one of these errors, never a partial result.

use thiserror::Error;

/// Main error type for a shader compile
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("Unsupported: {0}")]
    Unsupported(#[from] UnsupportedError),

    #[error("Encoding conflict: {0}")]
    EncodingConflict(#[from] ConflictError),

    #[error("Capacity exceeded: {resource} needs {requested}, limit is {limit}")]
    CapacityExceeded {
        resource: Resource,
        requested: usize,
        limit: usize,
    },
}

impl CompileError {
    pub fn capacity(resource: Resource, requested: usize, limit: usize) -> Self {
        Self::CapacityExceeded {
            resource,
            requested,
            limit,
        }
    }

    /// Short category name, used in diagnostics.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Unsupported(_) => "unsupported",
            Self::EncodingConflict(_) => "encoding-conflict",
            Self::CapacityExceeded { .. } => "capacity-exceeded",
        }
    }
}

/// Constructs outside the implemented subset
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UnsupportedError {
    #[error("opcode {opcode} in {stage} shader")]
    Opcode { opcode: String, stage: Stage },

    #[error("source register file {0}")]
    SourceFile(String),

    #[error("destination register file {0}")]
    DestinationFile(String),

    #[error("control flow: {0}")]
    ControlFlow(String),

    #[error("instruction kind: {0}")]
    InstructionKind(String),

    #[error("immediate value {0} (only 0.0 and 1.0 are encodable)")]
    Immediate(String),

    #[error("shader stage {0}")]
    Stage(String),

    #[error("malformed instruction: {0}")]
    Malformed(String),
}

/// Requirements the hardware cannot satisfy within one instruction
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConflictError {
    #[error("vector and scalar halves both write the output file")]
    DualOutput,

    #[error("attribute fetch index {first} conflicts with {second}")]
    AttributeFetch { first: u32, second: u32 },

    #[error("uniform fetch index {first} conflicts with {second}")]
    UniformFetch { first: u32, second: u32 },

    #[error("third source slot is needed by both the vector and scalar op")]
    SharedSourceSlot,

    #[error("uniform {index} collides with the immediate range starting at {reserved_base}")]
    ImmediateRange { index: u32, reserved_base: u32 },

    #[error("{resource} already claimed in this instruction")]
    SlotTaken { resource: String },

    #[error("interpolation lane {lane} already loads row {row}, cannot load row {requested}")]
    InterpolationLane { lane: usize, row: u32, requested: u32 },
}

/// Fixed hardware resources with an upper bound
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resource {
    Instructions,
    Attributes,
    Uniforms,
    Immediates,
    Temporaries,
    Outputs,
    InterpolationRows,
    GeneralRegisters,
    RenderTargets,
    Field(&'static str),
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Instructions => write!(f, "instructions"),
            Self::Attributes => write!(f, "attribute slots"),
            Self::Uniforms => write!(f, "uniform slots"),
            Self::Immediates => write!(f, "immediate slots"),
            Self::Temporaries => write!(f, "temporary registers"),
            Self::Outputs => write!(f, "output slots"),
            Self::InterpolationRows => write!(f, "interpolation rows"),
            Self::GeneralRegisters => write!(f, "general registers"),
            Self::RenderTargets => write!(f, "render targets"),
            Self::Field(name) => write!(f, "field `{}`", name),
        }
    }
}

/// Shader stage a diagnostic refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Vertex,
    Fragment,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Vertex => write!(f, "vertex"),
            Self::Fragment => write!(f, "fragment"),
        }
    }
}

/// Result type alias for compiler operations
pub type Result<T> = std::result::Result<T, CompileError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ConflictError::AttributeFetch { first: 1, second: 3 };
        assert_eq!(
            format!("{}", err),
            "attribute fetch index 1 conflicts with 3"
        );

        let err = CompileError::capacity(Resource::Instructions, 300, 256);
        assert_eq!(
            format!("{}", err),
            "Capacity exceeded: instructions needs 300, limit is 256"
        );
    }

    #[test]
    fn test_error_conversion() {
        let err: CompileError = ConflictError::DualOutput.into();
        assert!(matches!(err, CompileError::EncodingConflict(_)));
        assert_eq!(err.category(), "encoding-conflict");

        let err: CompileError = UnsupportedError::SourceFile("SAMPLER".into()).into();
        assert!(matches!(err, CompileError::Unsupported(_)));
    }
}

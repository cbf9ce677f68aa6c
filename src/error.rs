use std::fmt;

use thiserror::Error;

/// Which half of the program failed to compile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

/// Fatal construction failures. Any of these leaves the surface inert for the
/// rest of its life.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SurfaceError {
    #[error("drawing surface could not provide a WebGL2 context")]
    ContextUnavailable,
    #[error("{stage} shader failed to compile: {log}")]
    ShaderCompile { stage: ShaderStage, log: String },
    #[error("shader program failed to link: {log}")]
    ProgramLink { log: String },
}

impl SurfaceError {
    /// True for compile and link failures, false for a missing context.
    pub fn is_shader_failure(&self) -> bool {
        matches!(
            self,
            SurfaceError::ShaderCompile { .. } | SurfaceError::ProgramLink { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compile_failure_names_the_stage() {
        let err = SurfaceError::ShaderCompile {
            stage: ShaderStage::Fragment,
            log: "ERROR: 0:12: 'foo' : undeclared identifier".into(),
        };
        assert!(err.to_string().starts_with("fragment shader failed to compile"));
        assert!(err.is_shader_failure());
        assert!(!SurfaceError::ContextUnavailable.is_shader_failure());
    }
}

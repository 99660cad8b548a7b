/// Core error types for the Shadelink pass.
use std::path::PathBuf;

/// A specialized Result type for Shadelink operations.
pub type ShadelinkResult<T> = Result<T, ShadelinkError>;

/// Top-level error type encompassing all Shadelink subsystems.
///
/// Every variant except the I/O and config ones is fatal for the shader
/// program being transformed: the trees may be partially patched and must
/// not be handed to the downstream compiler.
#[derive(Debug, thiserror::Error)]
pub enum ShadelinkError {
    #[error("syntax error: {message} (in {context})")]
    Syntax { message: String, context: String },

    #[error("illegal redefinition of const parameter '{name}' in function '{function}'")]
    IllegalRedefinition { name: String, function: String },

    #[error("the targeted out declaration member '{name}' is missing")]
    MissingOutMember { name: String },

    #[error("out declaration '{name}' is not part of a variable declaration")]
    DetachedDeclaration { name: String },

    #[error("entry point '{0}' is not defined")]
    MissingEntryPoint(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("config error: {message} ({path:?})")]
    Config { message: String, path: PathBuf },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ShadelinkError {
    /// Create a syntax error for a malformed interchange tree.
    pub fn syntax(message: impl Into<String>, context: impl Into<String>) -> Self {
        ShadelinkError::Syntax {
            message: message.into(),
            context: context.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ShadelinkError::Internal(message.into())
    }

    /// Create a config error.
    pub fn config(message: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        ShadelinkError::Config {
            message: message.into(),
            path: path.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redefinition_display() {
        let err = ShadelinkError::IllegalRedefinition {
            name: "a".into(),
            function: "shade".into(),
        };
        assert_eq!(
            err.to_string(),
            "illegal redefinition of const parameter 'a' in function 'shade'"
        );
    }

    #[test]
    fn test_syntax_error_display() {
        let err = ShadelinkError::syntax("member without a name", "declaration");
        assert!(err.to_string().contains("member without a name"));
        assert!(err.to_string().contains("declaration"));
    }
}

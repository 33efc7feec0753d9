use thiserror::Error;

/// Raised when caller supplied tool arguments are unsafe or incomplete.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SanitizationError {
    #[error("No allowed keys defined for the tool")]
    NoAllowedKeys,

    #[error("Unsafe mapping key detected")]
    UnsafeKey,

    #[error("Unsupported argument type provided")]
    UnsupportedType,

    #[error("Missing required argument '{argument}' for {tool}")]
    MissingArgument { argument: String, tool: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Tool arguments must be a JSON object")]
    ArgumentsNotObject,

    #[error(transparent)]
    Sanitization(#[from] SanitizationError),
}

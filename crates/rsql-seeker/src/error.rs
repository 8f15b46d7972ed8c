//! Error types for the seeker crate.

use thiserror::Error;

/// Errors that can occur when compiling filters, sorts and cursors to SQL.
///
/// The first group are client errors: the filter, sort or cursor supplied by
/// the caller is not acceptable for the configured selectors. The second group
/// is configuration errors raised while building a plugin registry. The last
/// group are invariant violations between components (see [`is_fatal`]).
///
/// [`is_fatal`]: SeekerError::is_fatal
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SeekerError {
    /// Selector not present in the configuration (strict mode only).
    #[error("unknown selector: \"{0}\"")]
    UnknownSelector(String),

    /// Operator is neither built-in nor provided by a plugin.
    #[error("unknown operator: \"{0}\"")]
    UnknownOperator(String),

    /// Comparison has no (or an empty) first operand.
    #[error("missing value for selector: \"{0}\"")]
    MissingValue(String),

    /// Operand is not a member of the selector's enum.
    #[error("bad selector value for \"{selector}\": \"{value}\" must be one of {allowed}")]
    NotInEnum {
        selector: String,
        value: String,
        /// The allowed values rendered as a JSON array.
        allowed: String,
    },

    /// Operand does not parse as the selector's declared type.
    #[error("bad selector value for \"{selector}\": \"{value}\" is not a {expected}")]
    InvalidValue {
        selector: String,
        value: String,
        expected: &'static str,
    },

    /// Sort field is unknown or not sortable.
    #[error("invalid sort: {0}")]
    InvalidSort(String),

    /// Boolean connective without operands.
    #[error("missing operands: {0}")]
    MissingOperands(&'static str),

    /// Boolean connective operand that is not itself a node.
    #[error("invalid operand type: {0}")]
    InvalidOperandType(String),

    /// Pagination cursor could not be decoded.
    #[error("invalid keyset: {0}")]
    InvalidKeyset(String),

    /// Plugin token for a new operator does not start and end with `=`.
    #[error("invalid custom RSQL operator, must start and end with '=', but was: '{0}'")]
    InvalidPluginOperator(String),

    /// Two plugins registered for the same operator token.
    #[error("duplicate plugin for operator '{0}'")]
    DuplicatePlugin(String),

    /// A plugin pre-check rejected the comparison node.
    #[error("plugin invariant failed for '{operator}': {message}")]
    PluginInvariant { operator: String, message: String },

    /// The row used to build a cursor lacks a sort column.
    #[error("row is missing property '{0}'")]
    MissingRowProperty(String),

    /// A node shape the compiler cannot translate.
    #[error("unsupported AST node: {0}")]
    UnsupportedNode(String),
}

impl SeekerError {
    /// Returns `true` for invariant violations between components.
    ///
    /// These indicate programming or configuration mistakes rather than bad
    /// user input, and callers should surface them as server errors.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SeekerError::PluginInvariant { .. }
                | SeekerError::MissingRowProperty(_)
                | SeekerError::UnsupportedNode(_)
        )
    }

    /// Returns `true` if this error was caused by the client's filter, sort or cursor.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            SeekerError::UnknownSelector(_)
                | SeekerError::UnknownOperator(_)
                | SeekerError::MissingValue(_)
                | SeekerError::NotInEnum { .. }
                | SeekerError::InvalidValue { .. }
                | SeekerError::InvalidSort(_)
                | SeekerError::MissingOperands(_)
                | SeekerError::InvalidOperandType(_)
                | SeekerError::InvalidKeyset(_)
        )
    }
}

/// Result type for seeker operations.
pub type Result<T> = std::result::Result<T, SeekerError>;

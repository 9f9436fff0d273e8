//! Lowering failures.
//!
//! Every error here is an internal invariant violation: the attribution pass
//! has already reported anything a user could have caused. Errors propagate
//! to the caller of [`crate::lower_program`] unchanged; nothing in this crate
//! recovers from one or turns it into a diagnostic.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LowerError {
    /// A state the translator assumes cannot happen.
    #[error("internal lowering error: {what}")]
    Internal { what: String },

    /// A construct that validation should have rejected inside a bind.
    #[error("{construct} reached the translator inside a bind expression")]
    IllegalInBind { construct: &'static str },

    /// A legal construct this translator does not lower.
    #[error("unsupported construct: {construct}")]
    Unsupported { construct: String },

    #[error("translation nested deeper than {limit} levels")]
    DepthExceeded { limit: u32 },

    /// A caller found a different result variant than it requires.
    #[error("expected a {expected} result, found {found}")]
    VariantMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("symbol #{0} is not in the symbol table")]
    UnknownSymbol(u32),

    #[error("node #{0} is not in the arena")]
    UnknownNode(u32),
}

impl LowerError {
    pub fn internal(what: impl Into<String>) -> Self {
        Self::Internal { what: what.into() }
    }

    pub fn unsupported(construct: impl Into<String>) -> Self {
        Self::Unsupported {
            construct: construct.into(),
        }
    }
}

pub type LowerResult<T> = Result<T, LowerError>;

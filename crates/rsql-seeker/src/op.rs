//! Built-in RSQL comparison operators.
//!
//! The [`Operator`] enum covers the operators understood without plugins.
//! Symbolic and named spellings map to the same variant:
//!
//! | RSQL | SQL |
//! |------|-----|
//! | `==` | `LIKE` (rendered as `=` or `ILIKE`, see [`to_sql`](crate::to_sql)) |
//! | `!=` | `<>` |
//! | `<`, `=lt=` | `<` |
//! | `<=`, `=le=` | `<=` |
//! | `>`, `=gt=` | `>` |
//! | `>=`, `=ge=` | `>=` |
//! | `=in=` | `IN` |
//! | `=out=` | `NOT IN` |

use serde::{Deserialize, Serialize};

use crate::error::{Result, SeekerError};

/// Formatting options shared by every emitted fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SqlFormat {
    /// Emit SQL keywords in lower case (`like`, `and`, `desc`).
    #[serde(default)]
    pub keywords_lower_case: bool,
    /// Pad symbolic operators with spaces (`a = $1` instead of `a=$1`).
    #[serde(default)]
    pub detached_operators: bool,
}

impl SqlFormat {
    /// Formats a keyword according to the configured case.
    pub fn keyword(&self, keyword: &str) -> String {
        format_keyword(keyword, self.keywords_lower_case)
    }

    /// Pads a symbolic operator when operators are detached.
    pub fn symbol(&self, symbol: &str) -> String {
        if self.detached_operators {
            format!(" {symbol} ")
        } else {
            symbol.to_string()
        }
    }
}

/// Formats a keyword fully upper- or lower-case.
pub fn format_keyword(keyword: &str, lower_case: bool) -> String {
    if lower_case {
        keyword.to_lowercase()
    } else {
        keyword.to_uppercase()
    }
}

/// Built-in comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`, `=lt=`
    Lt,
    /// `<=`, `=le=`
    Le,
    /// `>`, `=gt=`
    Gt,
    /// `>=`, `=ge=`
    Ge,
    /// `=in=`
    In,
    /// `=out=`
    Out,
}

impl Operator {
    /// Parses an RSQL operator token. Tokens are matched exactly, so `=GT=`
    /// is only an operator if a plugin provides it.
    pub fn parse(token: &str) -> Option<Operator> {
        let op = match token {
            "==" => Operator::Eq,
            "!=" => Operator::Ne,
            "<" | "=lt=" => Operator::Lt,
            "<=" | "=le=" => Operator::Le,
            ">" | "=gt=" => Operator::Gt,
            ">=" | "=ge=" => Operator::Ge,
            "=in=" => Operator::In,
            "=out=" => Operator::Out,
            _ => return None,
        };
        Some(op)
    }

    /// Returns `true` for `=in=` and `=out=`, whose operand is a list.
    pub fn is_list_op(self) -> bool {
        matches!(self, Operator::In | Operator::Out)
    }

    /// Returns `true` for the ordering operators.
    pub fn is_ordering_op(self) -> bool {
        matches!(
            self,
            Operator::Lt | Operator::Le | Operator::Gt | Operator::Ge
        )
    }

    /// Renders the operator as SQL.
    ///
    /// Keyword case applies to `LIKE`, `IN` and `NOT IN`; padding applies to
    /// the symbolic operators only.
    pub fn sql(self, format: SqlFormat) -> String {
        match self {
            Operator::Eq => format.keyword("LIKE"),
            Operator::Ne => format.symbol("<>"),
            Operator::Lt => format.symbol("<"),
            Operator::Le => format.symbol("<="),
            Operator::Gt => format.symbol(">"),
            Operator::Ge => format.symbol(">="),
            Operator::In => format.keyword("IN"),
            Operator::Out => format.keyword("NOT IN"),
        }
    }

    /// Returns the canonical RSQL token.
    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Eq => "==",
            Operator::Ne => "!=",
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
            Operator::In => "=in=",
            Operator::Out => "=out=",
        }
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Maps a known operator token to SQL text.
///
/// Fails with [`SeekerError::UnknownOperator`] for any other token.
pub fn operator_to_sql(token: &str, format: SqlFormat) -> Result<String> {
    Operator::parse(token)
        .map(|op| op.sql(format))
        .ok_or_else(|| SeekerError::UnknownOperator(token.to_string()))
}

/// Returns `true` if the token is a built-in operator.
pub fn is_known_operator(token: &str) -> bool {
    operator_to_sql(token, SqlFormat::default()).is_ok()
}

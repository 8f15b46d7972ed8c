//! rsql-seeker - Compile RSQL filter trees into parameterized SQL.
//!
//! rsql-seeker turns the parsed form of an RSQL filter, a sort list and an
//! optional pagination cursor into a SQL fragment with positional placeholders
//! (`$1`, `$2`, …) and the list of values to bind. It supports:
//!
//! - A selector map from logical field names to SQL expressions, with
//!   optional type or enum validation per field
//! - The built-in RSQL comparison operators plus `*` wildcards
//! - Operator plugins that override built-ins or add new `=op=` operators
//! - `ORDER BY` generation and keyset ("seek method") pagination
//! - Appending the result to a caller-supplied base query
//!
//! No RSQL text is parsed and no database is contacted: the filter arrives as
//! a [`Node`] tree and the output is a string plus a [`ParamList`].
//!
//! # Quick Start
//!
//! ```rust
//! use rsql_seeker::{
//!     assemble_full_query, encode_keyset, Node, ParamList, QueryConfig, QueryInput,
//!     SelectorConfig, SelectorType, Value,
//! };
//!
//! // Describe the listing once
//! let config = QueryConfig::new("select * from users u")
//!     .selector("id", "u.id")
//!     .selector("firstName", "u.firstName")
//!     .selector("lastName", "u.lastName")
//!     .selector("points", SelectorConfig::typed("u.pointBalance", SelectorType::Integer));
//!
//! // Compile one request: firstName==Alice, sorted by -points,lastName,firstName,id,
//! // continuing after the row (2, "Apple", "Alice", "1234-abc")
//! let input = QueryInput::new()
//!     .filter(Node::comparison("firstName", "==", ["Alice"]))
//!     .sort_expr("-points,lastName,firstName,id")
//!     .keyset(encode_keyset(&["2", "Apple", "Alice", "1234-abc"]));
//!
//! let mut values = ParamList::new();
//! let sql = assemble_full_query(&input, &config, &mut values)?;
//!
//! assert_eq!(
//!     sql,
//!     "select * from users u WHERE (u.firstName=$1) AND \
//!      (u.pointBalance,u.lastName,u.firstName,u.id)<($2,$3,$4,$5) \
//!      ORDER BY u.pointBalance DESC,u.lastName,u.firstName,u.id"
//! );
//! assert_eq!(values.len(), 5);
//! assert_eq!(values.as_slice()[0], Value::from("Alice"));
//! # Ok::<(), rsql_seeker::SeekerError>(())
//! ```
//!
//! # Pipeline
//!
//! ```text
//! Node ──validate──► to_sql ──► predicate ─┐
//!                                          ├─► build_predicate_and_order_by ─► assemble_full_query
//! [SortNode] + cursor ──► to_order_by ─────┘
//! ```
//!
//! Every stage appends to the same [`ParamList`]; filter values always come
//! before cursor values. A stage that fails leaves the list as it found it.
//!
//! # Errors
//!
//! All failures are [`SeekerError`]s. Most are caused by the request (unknown
//! selector, bad value, invalid sort, malformed cursor) and should be reported
//! to the client; [`SeekerError::is_fatal`] picks out the ones that indicate a
//! bug in the configuration or a plugin.

mod ast;
mod coerce;
mod compile;
mod error;
mod keyset;
mod op;
mod ordering;
mod plugin;
mod query;
mod selector;
mod validate;
mod value;

// Re-export public API
pub use ast::{Comparison, Connective, Group, Node, Operand};
pub use coerce::{coerce_value, is_value_valid, parse_number, parses_as_iso8601};
pub use compile::to_sql;
pub use error::{Result, SeekerError};
pub use keyset::{decode_keyset, encode_keyset, last_row_to_keyset, next_keyset, KeysetRow};
pub use op::{format_keyword, is_known_operator, operator_to_sql, Operator, SqlFormat};
pub use ordering::{to_order_by, Dir, OrderByFragment, SortNode};
pub use plugin::{
    boolean_value_check, CustomPlugin, IsEmpty, IsNull, IsNullOrEmpty, MapInToEqualsAny,
    MapOutToNotEqualsAll, OperatorPlugin, PluginArgs, PluginRegistry, BOOLEAN_PLUGIN_VALUES,
};
pub use query::{
    assemble_full_query, build_predicate_and_order_by, ConcatStrategy, QueryConfig, QueryInput,
};
pub use selector::{SelectorConfig, SelectorType, Selectors};
pub use validate::validate;
pub use value::{Number, ParamList, Placeholder, Value};

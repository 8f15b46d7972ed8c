//! Filter tree types.
//!
//! A [`Node`] is the parsed form of an RSQL filter expression: either a
//! [`Comparison`] (selector, operator, operands) or a [`Group`] joining other
//! nodes with a boolean [`Connective`]. Trees are produced by an external RSQL
//! parser and are only read by this crate.
//!
//! The serde shape matches the JSON emitted by common RSQL parsers, so a tree
//! can be handed over as JSON:
//!
//! ```
//! use rsql_seeker::Node;
//!
//! let json = r#"{
//!     "operator": "and",
//!     "operands": [
//!         { "selector": "firstName", "operator": "==", "operands": ["Alice"] },
//!         { "selector": "points", "operator": "=gt=", "operands": ["10"] }
//!     ]
//! }"#;
//! let node: Node = serde_json::from_str(json).unwrap();
//! assert_eq!(
//!     node,
//!     Node::and([
//!         Node::comparison("firstName", "==", ["Alice"]),
//!         Node::comparison("points", "=gt=", ["10"]),
//!     ])
//! );
//! ```

use serde::{Deserialize, Serialize};

/// A node of the filter tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    /// A single predicate, e.g. `name==Alice`.
    Comparison(Comparison),
    /// Nodes joined by `and`, `or`, or negated by `not`.
    Group(Group),
}

impl Node {
    /// Creates a comparison node.
    pub fn comparison<I, S>(selector: impl Into<String>, operator: impl Into<String>, operands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Node::Comparison(Comparison::new(selector, operator, operands))
    }

    /// Creates an `and` group.
    pub fn and<I>(nodes: I) -> Self
    where
        I: IntoIterator<Item = Node>,
    {
        Node::group(Connective::And, nodes)
    }

    /// Creates an `or` group.
    pub fn or<I>(nodes: I) -> Self
    where
        I: IntoIterator<Item = Node>,
    {
        Node::group(Connective::Or, nodes)
    }

    /// Creates a `not` group around a single node.
    pub fn not(node: Node) -> Self {
        Node::group(Connective::Not, [node])
    }

    fn group<I>(operator: Connective, nodes: I) -> Self
    where
        I: IntoIterator<Item = Node>,
    {
        Node::Group(Group {
            operator,
            operands: nodes.into_iter().map(Operand::Node).collect(),
        })
    }

    /// Returns the comparison, if this node is one.
    pub fn as_comparison(&self) -> Option<&Comparison> {
        match self {
            Node::Comparison(c) => Some(c),
            Node::Group(_) => None,
        }
    }
}

/// A single predicate: `selector operator operands`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comparison {
    /// Logical field name as written by the client.
    pub selector: String,
    /// RSQL operator token, e.g. `==`, `=in=`, `=null=`.
    pub operator: String,
    /// Raw operand strings. Only `=in=`/`=out=` use more than one.
    #[serde(default)]
    pub operands: Vec<String>,
}

impl Comparison {
    /// Creates a new comparison.
    pub fn new<I, S>(selector: impl Into<String>, operator: impl Into<String>, operands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Comparison {
            selector: selector.into(),
            operator: operator.into(),
            operands: operands.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns the first operand, or `""` when there is none.
    pub fn first_operand(&self) -> &str {
        self.operands.first().map(String::as_str).unwrap_or("")
    }
}

/// Boolean connective of a [`Group`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Connective {
    And,
    Or,
    Not,
}

impl Connective {
    /// Returns the SQL keyword in upper case.
    pub fn as_str(self) -> &'static str {
        match self {
            Connective::And => "AND",
            Connective::Or => "OR",
            Connective::Not => "NOT",
        }
    }

    /// Returns the RSQL spelling of the connective.
    pub fn rsql_name(self) -> &'static str {
        match self {
            Connective::And => "and",
            Connective::Or => "or",
            Connective::Not => "not",
        }
    }
}

impl std::fmt::Display for Connective {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.rsql_name())
    }
}

/// Nodes joined by a connective.
///
/// `and`/`or` take two or more operands, `not` exactly one. Parsers may hand
/// over malformed groups (no operands, or bare strings as operands); those are
/// rejected by [`validate`](crate::validate).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub operator: Connective,
    #[serde(default)]
    pub operands: Vec<Operand>,
}

/// Operand of a [`Group`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Operand {
    Node(Node),
    /// A bare value. Never valid inside a group.
    Value(String),
}

impl Operand {
    /// Returns the node, if this operand is one.
    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Operand::Node(node) => Some(node),
            Operand::Value(_) => None,
        }
    }
}

impl From<Node> for Operand {
    fn from(node: Node) -> Self {
        Operand::Node(node)
    }
}

impl From<&str> for Operand {
    fn from(s: &str) -> Self {
        Operand::Value(s.to_string())
    }
}

impl From<String> for Operand {
    fn from(s: String) -> Self {
        Operand::Value(s)
    }
}

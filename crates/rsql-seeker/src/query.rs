//! Static query configuration and full query assembly.
//!
//! The [`QueryConfig`] struct bundles everything that stays fixed for a
//! listing endpoint: base query, selectors, plugins and formatting. It can be
//! deserialized from JSON (plugins excepted) or built fluently in code.
//!
//! [`assemble_full_query`] compiles a [`QueryInput`] (filter, sort, cursor)
//! against a configuration and appends the result to the base query.

use serde::{Deserialize, Serialize};

use crate::ast::Node;
use crate::compile::to_sql;
use crate::error::Result;
use crate::op::SqlFormat;
use crate::ordering::{to_order_by, SortNode};
use crate::plugin::{OperatorPlugin, PluginRegistry};
use crate::selector::{SelectorConfig, Selectors};
use crate::value::ParamList;

/// How the compiled fragment is joined to the base query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConcatStrategy {
    /// The base query has no `WHERE` clause yet: `base WHERE fragment`.
    #[default]
    Where,
    /// The base query already filters: `base AND fragment`.
    And,
}

impl ConcatStrategy {
    /// Returns the SQL keyword in upper case.
    pub fn as_str(self) -> &'static str {
        match self {
            ConcatStrategy::Where => "WHERE",
            ConcatStrategy::And => "AND",
        }
    }
}

/// Static configuration of a listing query.
///
/// # Example
///
/// ```
/// use rsql_seeker::{QueryConfig, SelectorConfig, SelectorType};
///
/// let config = QueryConfig::new("select * from users u")
///     .selector("id", "u.id")
///     .selector("points", SelectorConfig::typed("u.pointBalance", SelectorType::Integer))
///     .keywords_lower_case(true);
///
/// let from_json: QueryConfig = serde_json::from_str(r#"{
///     "mainQuery": "select * from users u",
///     "selectors": {
///         "id": "u.id",
///         "points": { "sql": "u.pointBalance", "type": "integer" }
///     },
///     "keywordsLowerCase": true
/// }"#)?;
/// assert_eq!(from_json.selectors(), config.selectors());
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryConfig {
    main_query: String,
    #[serde(default)]
    concat_strategy: ConcatStrategy,
    #[serde(default)]
    selectors: Selectors,
    #[serde(default)]
    lax: bool,
    #[serde(flatten)]
    format: SqlFormat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    where_prefix: Option<String>,
    #[serde(skip)]
    plugins: PluginRegistry,
}

impl QueryConfig {
    /// Creates a configuration for the given base query.
    pub fn new(main_query: impl Into<String>) -> Self {
        QueryConfig {
            main_query: main_query.into(),
            ..QueryConfig::default()
        }
    }

    // ========================================================================
    // Builders
    // ========================================================================

    /// Adds or replaces a selector.
    pub fn selector(mut self, field: impl Into<String>, config: impl Into<SelectorConfig>) -> Self {
        self.selectors.insert(field, config);
        self
    }

    /// Replaces all selectors.
    pub fn selectors_from(mut self, selectors: Selectors) -> Self {
        self.selectors = selectors;
        self
    }

    /// Sets lax mode: unconfigured selectors are accepted as raw SQL and
    /// filter operands skip type and enum checks.
    pub fn lax(mut self, lax: bool) -> Self {
        self.lax = lax;
        self
    }

    /// Sets the concatenation strategy.
    pub fn concat(mut self, strategy: ConcatStrategy) -> Self {
        self.concat_strategy = strategy;
        self
    }

    /// Emits SQL keywords in lower case.
    pub fn keywords_lower_case(mut self, lower: bool) -> Self {
        self.format.keywords_lower_case = lower;
        self
    }

    /// Pads symbolic operators with spaces.
    pub fn detached_operators(mut self, detached: bool) -> Self {
        self.format.detached_operators = detached;
        self
    }

    /// Sets the text placed between the base query and `WHERE` (default `" "`).
    pub fn where_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.where_prefix = Some(prefix.into());
        self
    }

    /// Registers an operator plugin.
    ///
    /// Fails if the token is malformed or already handled by another plugin.
    pub fn plugin<P>(mut self, plugin: P) -> Result<Self>
    where
        P: OperatorPlugin + 'static,
    {
        self.plugins.register(plugin)?;
        Ok(self)
    }

    /// Replaces the plugin registry.
    pub fn plugins_from(mut self, plugins: PluginRegistry) -> Self {
        self.plugins = plugins;
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Returns the base query.
    pub fn main_query(&self) -> &str {
        &self.main_query
    }

    /// Returns the concatenation strategy.
    pub fn concat_strategy(&self) -> ConcatStrategy {
        self.concat_strategy
    }

    /// Returns the selectors.
    pub fn selectors(&self) -> &Selectors {
        &self.selectors
    }

    /// Returns the registered plugins.
    pub fn plugins(&self) -> &PluginRegistry {
        &self.plugins
    }

    /// Returns `true` in lax mode.
    pub fn is_lax(&self) -> bool {
        self.lax
    }

    /// Returns the formatting options.
    pub fn format(&self) -> SqlFormat {
        self.format
    }

    /// Returns the configured `WHERE` prefix, if any.
    pub fn where_prefix_str(&self) -> Option<&str> {
        self.where_prefix.as_deref()
    }
}

/// The per-request part of a listing query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryInput {
    /// The filter tree, if any.
    #[serde(default)]
    pub filter: Option<Node>,
    /// The sort list.
    #[serde(default)]
    pub sort: Vec<SortNode>,
    /// The cursor of the page to fetch.
    #[serde(default)]
    pub keyset: Option<String>,
}

impl QueryInput {
    /// Creates an empty input.
    pub fn new() -> Self {
        QueryInput::default()
    }

    /// Sets the filter.
    pub fn filter(mut self, filter: Node) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Sets the sort list.
    pub fn sort(mut self, sort: impl IntoIterator<Item = SortNode>) -> Self {
        self.sort = sort.into_iter().collect();
        self
    }

    /// Sets the sort list from an expression such as `-points,id`.
    pub fn sort_expr(self, expr: &str) -> Self {
        self.sort(SortNode::parse_list(expr))
    }

    /// Sets the cursor.
    pub fn keyset(mut self, keyset: impl Into<String>) -> Self {
        self.keyset = Some(keyset.into());
        self
    }
}

/// Compiles filter, sort and cursor into the fragment appended to a base query.
///
/// The shape is `(predicate) AND seek ORDER BY list`, with each part present
/// only when it is non-empty (the predicate is not parenthesized without a
/// seek). Filter values are pushed before cursor values. On error, `values`
/// is restored to its length on entry.
pub fn build_predicate_and_order_by(
    filter: Option<&Node>,
    sort: &[SortNode],
    keyset: Option<&str>,
    config: &QueryConfig,
    values: &mut ParamList,
) -> Result<String> {
    let mark = values.len();
    let result = build_fragment(filter, sort, keyset, config, values);
    if result.is_err() {
        values.truncate(mark);
    }
    result
}

fn build_fragment(
    filter: Option<&Node>,
    sort: &[SortNode],
    keyset: Option<&str>,
    config: &QueryConfig,
    values: &mut ParamList,
) -> Result<String> {
    let predicate = to_sql(filter, config, values)?;
    let order = to_order_by(sort, keyset, config, values)?;
    if order.is_empty() {
        return Ok(predicate);
    }

    let format = config.format();
    let mut sql = predicate;
    if !sql.is_empty() && !order.seek.is_empty() {
        sql = format!("({sql}) {} ", format.keyword("AND"));
    }
    sql.push_str(&order.seek);
    if !order.order_by.is_empty() {
        sql.push_str(&format!(" {} {}", format.keyword("ORDER BY"), order.order_by));
    }
    Ok(sql.trim().to_string())
}

/// Builds the complete SQL statement for a listing request.
///
/// An empty fragment returns the base query unchanged. A fragment that is
/// only an `ORDER BY` clause is appended with a space. Anything else is
/// joined with the configured strategy keyword. The base query is never
/// inspected, so the strategy must match it.
///
/// ```
/// use rsql_seeker::{assemble_full_query, Node, ParamList, QueryConfig, QueryInput};
///
/// let config = QueryConfig::new("select * from users u")
///     .selector("firstName", "u.firstName")
///     .selector("id", "u.id");
/// let input = QueryInput::new()
///     .filter(Node::comparison("firstName", "==", ["Alice"]))
///     .sort_expr("id");
///
/// let mut values = ParamList::new();
/// let sql = assemble_full_query(&input, &config, &mut values)?;
/// assert_eq!(sql, "select * from users u WHERE u.firstName=$1 ORDER BY u.id");
/// # Ok::<(), rsql_seeker::SeekerError>(())
/// ```
pub fn assemble_full_query(input: &QueryInput, config: &QueryConfig, values: &mut ParamList) -> Result<String> {
    let fragment = build_predicate_and_order_by(
        input.filter.as_ref(),
        &input.sort,
        input.keyset.as_deref(),
        config,
        values,
    )?;
    let sql = join_fragment(config, &fragment);
    tracing::debug!(
        fragment_len = fragment.len(),
        params = values.len(),
        "assembled listing query"
    );
    Ok(sql)
}

fn join_fragment(config: &QueryConfig, fragment: &str) -> String {
    let base = config.main_query();
    if fragment.is_empty() {
        return base.to_string();
    }
    if starts_with_order_by(fragment) {
        return format!("{base} {fragment}");
    }
    let keyword = config.format().keyword(config.concat_strategy().as_str());
    match config.concat_strategy() {
        ConcatStrategy::Where => {
            let prefix = config.where_prefix_str().unwrap_or(" ");
            format!("{base}{prefix}{keyword} {fragment}")
        }
        ConcatStrategy::And => format!("{base} {keyword} {fragment}"),
    }
}

fn starts_with_order_by(fragment: &str) -> bool {
    fragment
        .get(..8)
        .is_some_and(|head| head.eq_ignore_ascii_case("ORDER BY"))
}

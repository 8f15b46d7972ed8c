//! Operator plugins.
//!
//! A plugin binds an RSQL operator token to custom SQL generation. It either
//! overrides a built-in operator (for example `=in=` as `= ANY($1)`) or adds a
//! new one (`=null=`). When a comparison's operator has a plugin, the plugin
//! alone produces the fragment; the built-in translation is never consulted.
//!
//! Plugins are collected in a [`PluginRegistry`], which rejects malformed and
//! duplicate tokens when a plugin is registered, so lookups never have to
//! choose between candidates.
//!
//! # Example
//!
//! ```
//! use rsql_seeker::{to_sql, IsNull, MapInToEqualsAny, Node, ParamList, QueryConfig};
//!
//! let config = QueryConfig::new("select * from users u")
//!     .selector("id", "u.id")
//!     .selector("email", "u.email")
//!     .plugin(MapInToEqualsAny)?
//!     .plugin(IsNull)?;
//!
//! let filter = Node::and([
//!     Node::comparison("id", "=in=", ["1", "2"]),
//!     Node::comparison("email", "=null=", ["false"]),
//! ]);
//! let mut params = ParamList::new();
//! let sql = to_sql(Some(&filter), &config, &mut params)?;
//! assert_eq!(sql, "(u.id = ANY($1) AND u.email IS NOT null)");
//! # Ok::<(), rsql_seeker::SeekerError>(())
//! ```

use std::fmt;
use std::sync::Arc;

use crate::ast::Comparison;
use crate::coerce::coerce_value;
use crate::error::{Result, SeekerError};
use crate::op::{format_keyword, is_known_operator};
use crate::query::QueryConfig;
use crate::value::ParamList;

/// Operand values accepted by the boolean-flag plugins.
pub const BOOLEAN_PLUGIN_VALUES: [&str; 2] = ["true", "false"];

/// Everything a plugin may use to render one comparison.
pub struct PluginArgs<'a> {
    /// The selector, already resolved to its SQL expression.
    pub selector: &'a str,
    /// The comparison being translated.
    pub node: &'a Comparison,
    /// The shared parameter list. Plugins push their own values.
    pub values: &'a mut ParamList,
    /// The static configuration of the query being built.
    pub config: &'a QueryConfig,
    /// Whether keywords should be rendered in lower case.
    pub keywords_lower_case: bool,
}

impl PluginArgs<'_> {
    /// Formats a keyword according to the configured case.
    pub fn keyword(&self, keyword: &str) -> String {
        format_keyword(keyword, self.keywords_lower_case)
    }
}

/// A custom or overriding RSQL operator.
pub trait OperatorPlugin: Send + Sync {
    /// The RSQL token handled by this plugin, e.g. `=null=`.
    fn operator(&self) -> &str;

    /// Returns `true` to bypass selector type and enum checks for this operator.
    fn skip_validation(&self) -> bool {
        false
    }

    /// Checks the comparison before translation.
    ///
    /// An `Err` aborts compilation with [`SeekerError::PluginInvariant`].
    fn check(&self, _node: &Comparison) -> std::result::Result<(), String> {
        Ok(())
    }

    /// Renders the comparison as SQL.
    fn to_sql(&self, args: PluginArgs<'_>) -> String;
}

type CheckFn = dyn Fn(&Comparison) -> std::result::Result<(), String> + Send + Sync;
type ToSqlFn = dyn Fn(PluginArgs<'_>) -> String + Send + Sync;

/// A plugin assembled from closures.
///
/// ```
/// use rsql_seeker::CustomPlugin;
///
/// let plugin = CustomPlugin::new("=ci=", |args| {
///     let placeholder = args.values.push(args.node.first_operand().to_lowercase());
///     format!("lower({}) = {placeholder}", args.selector)
/// })
/// .skip_validation(true);
/// ```
pub struct CustomPlugin {
    operator: String,
    skip_validation: bool,
    check: Option<Box<CheckFn>>,
    to_sql: Box<ToSqlFn>,
}

impl CustomPlugin {
    /// Creates a plugin for `operator` rendered by `to_sql`.
    pub fn new<F>(operator: impl Into<String>, to_sql: F) -> Self
    where
        F: Fn(PluginArgs<'_>) -> String + Send + Sync + 'static,
    {
        CustomPlugin {
            operator: operator.into(),
            skip_validation: false,
            check: None,
            to_sql: Box::new(to_sql),
        }
    }

    /// Adds a pre-check run before translation.
    pub fn check<F>(mut self, check: F) -> Self
    where
        F: Fn(&Comparison) -> std::result::Result<(), String> + Send + Sync + 'static,
    {
        self.check = Some(Box::new(check));
        self
    }

    /// Sets whether selector value validation is skipped.
    pub fn skip_validation(mut self, skip: bool) -> Self {
        self.skip_validation = skip;
        self
    }
}

impl OperatorPlugin for CustomPlugin {
    fn operator(&self) -> &str {
        &self.operator
    }

    fn skip_validation(&self) -> bool {
        self.skip_validation
    }

    fn check(&self, node: &Comparison) -> std::result::Result<(), String> {
        match &self.check {
            Some(check) => check(node),
            None => Ok(()),
        }
    }

    fn to_sql(&self, args: PluginArgs<'_>) -> String {
        (self.to_sql)(args)
    }
}

/// The set of plugins configured for a query.
#[derive(Clone, Default)]
pub struct PluginRegistry {
    plugins: Vec<Arc<dyn OperatorPlugin>>,
}

impl PluginRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        PluginRegistry::default()
    }

    /// Adds a plugin.
    ///
    /// The token must be a built-in operator or start and end with `=`, and no
    /// other plugin may already handle it (tokens compare ignoring case).
    pub fn register<P>(&mut self, plugin: P) -> Result<()>
    where
        P: OperatorPlugin + 'static,
    {
        self.register_arc(Arc::new(plugin))
    }

    /// Adds a shared plugin. See [`register`](Self::register).
    pub fn register_arc(&mut self, plugin: Arc<dyn OperatorPlugin>) -> Result<()> {
        let token = plugin.operator();
        let is_custom_token = token.len() >= 3 && token.starts_with('=') && token.ends_with('=');
        if !is_known_operator(token) && !is_custom_token {
            return Err(SeekerError::InvalidPluginOperator(token.to_string()));
        }
        if self.find(token).is_some() {
            return Err(SeekerError::DuplicatePlugin(token.to_string()));
        }
        self.plugins.push(plugin);
        Ok(())
    }

    /// Returns the plugin handling `operator`, if any.
    pub fn find(&self, operator: &str) -> Option<&dyn OperatorPlugin> {
        self.plugins
            .iter()
            .find(|plugin| plugin.operator().eq_ignore_ascii_case(operator))
            .map(|plugin| plugin.as_ref())
    }

    /// Returns `true` if a plugin handles `operator`.
    pub fn is_plugin_operator(&self, operator: &str) -> bool {
        self.find(operator).is_some()
    }

    /// Returns the registered tokens in registration order.
    pub fn operators(&self) -> impl Iterator<Item = &str> {
        self.plugins.iter().map(|plugin| plugin.operator())
    }

    /// Returns the number of plugins.
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    /// Returns `true` if no plugin is registered.
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

impl fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.operators()).finish()
    }
}

/// Runs the plugin registered for the comparison's operator, if there is one.
///
/// Returns `Ok(None)` when no plugin matches, so the caller falls back to the
/// built-in translation.
pub(crate) fn maybe_execute_plugin(
    config: &QueryConfig,
    node: &Comparison,
    selector: &str,
    values: &mut ParamList,
) -> Result<Option<String>> {
    let Some(plugin) = config.plugins().find(&node.operator) else {
        return Ok(None);
    };
    tracing::trace!(operator = %node.operator, selector, "dispatching to operator plugin");

    plugin
        .check(node)
        .map_err(|message| SeekerError::PluginInvariant {
            operator: node.operator.clone(),
            message,
        })?;

    Ok(Some(plugin.to_sql(PluginArgs {
        selector,
        node,
        values,
        config,
        keywords_lower_case: config.format().keywords_lower_case,
    })))
}

/// Pre-check requiring exactly one operand equal to `true` or `false`.
pub fn boolean_value_check(node: &Comparison) -> std::result::Result<(), String> {
    const MESSAGE: &str = "operator value must be 'true' or 'false'";
    match node.operands.first() {
        None => Err(format!("operator must have one value, {MESSAGE}")),
        Some(value) if BOOLEAN_PLUGIN_VALUES.contains(&value.as_str()) => Ok(()),
        Some(value) if value.is_empty() => Err(format!("operator must have one value, {MESSAGE}")),
        Some(value) => Err(format!("{MESSAGE}, but was: '{value}'")),
    }
}

/// Overrides `=in=` as `selector = ANY($n)`.
///
/// Binds the whole list as one array parameter, which keeps the number of
/// placeholders independent of the list length.
#[derive(Debug, Clone, Copy, Default)]
pub struct MapInToEqualsAny;

impl OperatorPlugin for MapInToEqualsAny {
    fn operator(&self) -> &str {
        "=in="
    }

    fn to_sql(&self, args: PluginArgs<'_>) -> String {
        let value = coerce_value(args.node, args.config.selectors(), true);
        let placeholder = args.values.push(value);
        format!("{} = {}({placeholder})", args.selector, args.keyword("ANY"))
    }
}

/// Overrides `=out=` as `selector <> ALL($n)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MapOutToNotEqualsAll;

impl OperatorPlugin for MapOutToNotEqualsAll {
    fn operator(&self) -> &str {
        "=out="
    }

    fn to_sql(&self, args: PluginArgs<'_>) -> String {
        let value = coerce_value(args.node, args.config.selectors(), true);
        let placeholder = args.values.push(value);
        format!("{} <> {}({placeholder})", args.selector, args.keyword("ALL"))
    }
}

/// `=null=true` → `selector IS null`, `=null=false` → `selector IS NOT null`.
///
/// Skips selector type and enum checks, since the operand is a `true`/`false`
/// flag rather than a column value; `birthday=null=true` passes on a date
/// selector. The flag itself is enforced by [`boolean_value_check`].
#[derive(Debug, Clone, Copy, Default)]
pub struct IsNull;

impl OperatorPlugin for IsNull {
    fn operator(&self) -> &str {
        "=null="
    }

    fn skip_validation(&self) -> bool {
        true
    }

    fn check(&self, node: &Comparison) -> std::result::Result<(), String> {
        boolean_value_check(node)
    }

    fn to_sql(&self, args: PluginArgs<'_>) -> String {
        let negate = args.node.first_operand() == "false";
        is_null_sql(args.selector, negate, args.keywords_lower_case)
    }
}

/// `=empty=true` → `selector = ''`, `=empty=false` → `selector <> ''`.
///
/// Meant for text columns. Skips selector type and enum checks like [`IsNull`].
#[derive(Debug, Clone, Copy, Default)]
pub struct IsEmpty;

impl OperatorPlugin for IsEmpty {
    fn operator(&self) -> &str {
        "=empty="
    }

    fn skip_validation(&self) -> bool {
        true
    }

    fn check(&self, node: &Comparison) -> std::result::Result<(), String> {
        boolean_value_check(node)
    }

    fn to_sql(&self, args: PluginArgs<'_>) -> String {
        is_empty_sql(args.selector, args.node.first_operand() == "true")
    }
}

/// `=nullorempty=true` → `(selector IS null OR selector = '')`,
/// `=nullorempty=false` → `NOT (selector IS null OR selector = '')`.
///
/// Skips selector type and enum checks like [`IsNull`].
#[derive(Debug, Clone, Copy, Default)]
pub struct IsNullOrEmpty;

impl OperatorPlugin for IsNullOrEmpty {
    fn operator(&self) -> &str {
        "=nullorempty="
    }

    fn skip_validation(&self) -> bool {
        true
    }

    fn check(&self, node: &Comparison) -> std::result::Result<(), String> {
        boolean_value_check(node)
    }

    fn to_sql(&self, args: PluginArgs<'_>) -> String {
        let reverse = args.node.first_operand() == "false";
        let lower = args.keywords_lower_case;
        let inner = format!(
            "({} {} {})",
            is_null_sql(args.selector, false, lower),
            format_keyword("OR", lower),
            is_empty_sql(args.selector, true),
        );
        if reverse {
            format!("{} {inner}", format_keyword("NOT", lower))
        } else {
            inner
        }
    }
}

fn is_null_sql(selector: &str, negate: bool, lower: bool) -> String {
    let is = format_keyword("IS", lower);
    if negate {
        format!("{selector} {is} {} null", format_keyword("NOT", lower))
    } else {
        format!("{selector} {is} null")
    }
}

fn is_empty_sql(selector: &str, empty: bool) -> String {
    format!("{selector} {} ''", if empty { "=" } else { "<>" })
}

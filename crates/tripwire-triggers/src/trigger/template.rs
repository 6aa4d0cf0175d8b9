//! Name template interpolation

use std::collections::BTreeMap;
use std::fmt;

use minijinja::{Environment, UndefinedBehavior};

/// Variables interpolated into trigger name templates
///
/// Names are MiniJinja templates, so `{{ table_prefix }}audit` becomes
/// `app_audit` when `table_prefix = "app_"`. Undefined variables are errors
/// rather than empty strings: a silently shortened name would break identity.
///
/// # Examples
///
/// ```
/// use tripwire_triggers::TemplateVars;
///
/// let vars = TemplateVars::new([("table_prefix".to_string(), "app_".to_string())].into());
/// assert_eq!(vars.interpolate("{{ table_prefix }}audit").unwrap(), "app_audit");
/// assert_eq!(vars.interpolate("plain_name").unwrap(), "plain_name");
/// assert!(vars.interpolate("{{ missing }}").is_err());
/// ```
#[derive(Clone)]
pub struct TemplateVars {
    env: Environment<'static>,
    context: BTreeMap<String, String>,
}

impl TemplateVars {
    /// Creates an interpolation context from a variable table
    pub fn new(context: BTreeMap<String, String>) -> Self {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        Self { env, context }
    }

    /// Creates a context with no variables
    pub fn empty() -> Self {
        Self::new(BTreeMap::new())
    }

    /// Returns the variables
    pub fn variables(&self) -> &BTreeMap<String, String> {
        &self.context
    }

    /// Renders a name template
    pub fn interpolate(&self, template: &str) -> Result<String, minijinja::Error> {
        if !template.contains("{{") && !template.contains("{%") {
            return Ok(template.to_string());
        }
        self.env.render_str(template, &self.context)
    }
}

impl Default for TemplateVars {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for TemplateVars {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateVars")
            .field("variables", &self.context)
            .finish()
    }
}

//! Explicit table of global bindings installed into a sandbox.

use boa_engine::{property::Attribute, Context, JsString, JsValue};
use core_types::{EasyTestsError, EasyTestsResult};
use tracing::debug;

/// What a global name is bound to
#[derive(Debug, Clone)]
pub enum BindingValue {
    /// Plain data, converted to a script value on install
    Json(serde_json::Value),
    /// The global object itself (`window`, `self`)
    Global,
}

/// Ordered `name -> value` table.
///
/// Later entries with the same name replace earlier ones on install.
///
/// # Examples
///
/// ```
/// use sandbox::{BindingValue, Bindings};
///
/// let mut bindings = Bindings::new();
/// bindings.insert("window", BindingValue::Global);
/// bindings.insert("answer", BindingValue::Json(serde_json::json!(42)));
/// assert_eq!(bindings.names().collect::<Vec<_>>(), vec!["window", "answer"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Bindings {
    entries: Vec<(String, BindingValue)>,
}

impl Bindings {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a binding
    pub fn insert(&mut self, name: impl Into<String>, value: BindingValue) -> &mut Self {
        self.entries.push((name.into(), value));
        self
    }

    /// Bound names in install order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Number of bindings
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Define every binding on the global object of `context`
    pub fn install(&self, context: &mut Context) -> EasyTestsResult<()> {
        for (name, value) in &self.entries {
            let value = match value {
                BindingValue::Json(json) => {
                    JsValue::from_json(json, context).map_err(|e| binding_error(name, &e))?
                }
                BindingValue::Global => context.global_object().into(),
            };
            context
                .global_object()
                .set(JsString::from(name.as_str()), value, false, context)
                .map_err(|e| binding_error(name, &e))?;
            debug!(name, "installed global binding");
        }
        Ok(())
    }
}

fn binding_error(name: &str, error: &impl std::fmt::Display) -> EasyTestsError {
    EasyTestsError::evaluation(format!("cannot bind `{name}`: {error}"))
}

/// Define a read-only global that scripts cannot reassign
pub fn define_constant(context: &mut Context, name: &str, value: JsValue) -> EasyTestsResult<()> {
    context
        .register_global_property(JsString::from(name), value, Attribute::empty())
        .map_err(|e| binding_error(name, &e))
}

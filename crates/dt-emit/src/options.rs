use serde::{Deserialize, Serialize};

/// Naming of emitted bindings and modules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitOptions {
    /// Tracked item `n` is exported as `{binding_prefix}{n}`.
    pub binding_prefix: String,
    /// Namespace the primary module imports the companion module under.
    pub items_alias: String,
    /// Module specifier of the companion module, relative to the primary module.
    pub support_module: String,
    /// File name of the primary module.
    pub primary_module: String,
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self {
            binding_prefix: "item".to_string(),
            items_alias: "__items".to_string(),
            support_module: "./items.js".to_string(),
            primary_module: "main.js".to_string(),
        }
    }
}

impl EmitOptions {
    pub fn binding_name(&self, id: usize) -> String {
        format!("{}{}", self.binding_prefix, id)
    }

    /// File name of the companion module.
    pub fn support_file(&self) -> &str {
        self.support_module
            .strip_prefix("./")
            .unwrap_or(&self.support_module)
    }
}

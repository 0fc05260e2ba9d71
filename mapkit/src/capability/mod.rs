//! Capability loader.
//!
//! Capabilities are named sets of declaration methods a class opts into at
//! setup time. The loader maps each identifier to an installer function that
//! prepares the class for those declarations.
//!
//! | capability | installs |
//! |---|---|
//! | `csv_transformer` | the mapping registry (`declare_*_mapping`, `import_via`, `export_via`) |
//! | `model_helpers` | `multi_fields`, `boolean_methods`, `predicate` |

use once_cell::sync::Lazy;
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

use crate::document::DocumentClass;
use crate::error::CapabilityError;

pub const CSV_TRANSFORMER: &str = "csv_transformer";
pub const MODEL_HELPERS: &str = "model_helpers";

/// Prepares a class for one capability.
pub type Installer = fn(&mut DocumentClass);

/// Loader with the built-in capabilities.
pub static STANDARD_LOADER: Lazy<CapabilityLoader> = Lazy::new(CapabilityLoader::standard);

/// Registry of capability installers keyed by identifier.
#[derive(Clone, Default)]
pub struct CapabilityLoader {
    installers: BTreeMap<String, Installer>,
}

impl fmt::Debug for CapabilityLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.installers.keys()).finish()
    }
}

impl CapabilityLoader {
    /// A loader that knows no capability.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A loader with `csv_transformer` and `model_helpers`.
    pub fn standard() -> Self {
        let mut loader = Self::empty();
        loader
            .register(CSV_TRANSFORMER, DocumentClass::install_mapping_registry)
            .register(MODEL_HELPERS, DocumentClass::install_model_helpers);
        loader
    }

    /// Register or replace an installer.
    pub fn register(&mut self, name: &str, installer: Installer) -> &mut Self {
        self.installers.insert(name.to_string(), installer);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.installers.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.installers.keys().map(String::as_str).collect()
    }

    /// Attach capabilities to a class.
    ///
    /// Repeated names are attached once. If any name is unknown nothing is
    /// installed. Attaching a capability the class already has is a no-op.
    pub fn attach<S: AsRef<str>>(
        &self,
        class: &mut DocumentClass,
        names: &[S],
    ) -> Result<(), CapabilityError> {
        let mut selected: Vec<(&str, Installer)> = Vec::new();

        for name in names {
            let name = name.as_ref();
            if selected.iter().any(|(n, _)| *n == name) {
                continue;
            }
            let installer = self
                .installers
                .get(name)
                .ok_or_else(|| CapabilityError::Unknown(name.to_string()))?;
            selected.push((name, *installer));
        }

        for (name, installer) in selected {
            if class.mark_attached(name) {
                installer(class);
                debug!(class = %class.name(), capability = name, "attached capability");
            }
        }

        Ok(())
    }
}

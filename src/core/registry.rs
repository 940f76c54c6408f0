//! Availability of optional detector dependencies.

use super::method::{Dependency, Method};
use std::collections::BTreeSet;
use std::sync::OnceLock;

/// Environment variable listing unavailable dependencies, comma separated.
pub const DISABLE_ENV: &str = "REGRESS_OUTLIERS_DISABLE";

/// Which optional dependencies are available to the detectors.
///
/// Detectors whose dependency is unavailable are skipped with a warning rather
/// than failing the whole check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetectorRegistry {
    unavailable: BTreeSet<Dependency>,
}

impl DetectorRegistry {
    /// A registry with every dependency available.
    pub fn all_available() -> Self {
        Self::default()
    }

    /// The process-wide registry, read once from the environment.
    pub fn global() -> &'static DetectorRegistry {
        static GLOBAL: OnceLock<DetectorRegistry> = OnceLock::new();
        GLOBAL.get_or_init(|| {
            let list = std::env::var(DISABLE_ENV).unwrap_or_default();
            let registry = Self::from_disable_list(&list);
            if !registry.unavailable.is_empty() {
                tracing::debug!(
                    disabled = ?registry.unavailable,
                    "optional detector dependencies disabled"
                );
            }
            registry
        })
    }

    /// Parse a comma-separated list of unavailable dependencies.
    ///
    /// Unrecognised names are ignored.
    pub fn from_disable_list(list: &str) -> Self {
        let mut unavailable = BTreeSet::new();
        for name in list.split(',').filter(|s| !s.trim().is_empty()) {
            match name.parse::<Dependency>() {
                Ok(dep) => {
                    unavailable.insert(dep);
                }
                Err(other) => {
                    tracing::debug!(name = %other, "ignoring unknown dependency name");
                }
            }
        }
        Self { unavailable }
    }

    /// Mark a dependency as unavailable.
    pub fn without(mut self, dependency: Dependency) -> Self {
        self.unavailable.insert(dependency);
        self
    }

    pub fn is_available(&self, dependency: Dependency) -> bool {
        !self.unavailable.contains(&dependency)
    }

    /// The missing dependency of `method`, if any.
    pub fn missing_for(&self, method: Method) -> Option<Dependency> {
        method.dependency().filter(|d| !self.is_available(*d))
    }
}

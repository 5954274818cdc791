//! Unit Registry and Filtering
//!
//! Units are registered explicitly before a run starts. Query order is
//! registration order (stable, so reruns are diff-friendly). Once a run
//! begins the registry is sealed and further registration fails.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};

use globset::{Glob, GlobSet, GlobSetBuilder};
use thiserror::Error;

use crate::unit::BenchmarkUnit;

/// Registration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A unit with the same identity is already registered.
    #[error("benchmark unit '{0}' is already registered")]
    Duplicate(String),

    /// Registration was attempted after a run began.
    #[error("registration is closed: a run has already started")]
    Closed,
}

/// Include/exclude predicate over unit name and category set.
///
/// Name glob patterns are ORed together, as are entries within each category
/// list; the three groups AND together. An empty filter matches everything.
#[derive(Debug, Clone)]
pub struct UnitFilter {
    names: Option<GlobSet>,
    include_categories: Vec<String>,
    exclude_categories: Vec<String>,
}

impl UnitFilter {
    /// Filter matching every unit.
    pub fn all() -> Self {
        Self {
            names: None,
            include_categories: Vec::new(),
            exclude_categories: Vec::new(),
        }
    }

    /// Start building a filter.
    pub fn builder() -> UnitFilterBuilder {
        UnitFilterBuilder::default()
    }

    /// Whether `unit` passes this filter.
    pub fn matches(&self, unit: &BenchmarkUnit) -> bool {
        if let Some(names) = &self.names {
            if !names.is_match(unit.name()) {
                return false;
            }
        }
        if !self.include_categories.is_empty()
            && !self
                .include_categories
                .iter()
                .any(|c| unit.has_category(c))
        {
            return false;
        }
        if self
            .exclude_categories
            .iter()
            .any(|c| unit.has_category(c))
        {
            return false;
        }
        true
    }
}

impl Default for UnitFilter {
    fn default() -> Self {
        Self::all()
    }
}

/// Builder for `UnitFilter`.
#[derive(Debug, Clone, Default)]
pub struct UnitFilterBuilder {
    patterns: Vec<String>,
    include_categories: Vec<String>,
    exclude_categories: Vec<String>,
}

impl UnitFilterBuilder {
    /// Add a name glob pattern (e.g. `"div*"`). Patterns are ORed.
    pub fn name_glob(mut self, pattern: impl Into<String>) -> Self {
        self.patterns.push(pattern.into());
        self
    }

    /// Require one of the included categories (ORed).
    pub fn include_category(mut self, category: impl Into<String>) -> Self {
        self.include_categories.push(category.into());
        self
    }

    /// Reject units carrying this category.
    pub fn exclude_category(mut self, category: impl Into<String>) -> Self {
        self.exclude_categories.push(category.into());
        self
    }

    /// Compile the glob set and finish the filter.
    pub fn build(self) -> Result<UnitFilter, globset::Error> {
        let names = if self.patterns.is_empty() {
            None
        } else {
            let mut builder = GlobSetBuilder::new();
            for pattern in &self.patterns {
                builder.add(Glob::new(pattern)?);
            }
            Some(builder.build()?)
        };
        Ok(UnitFilter {
            names,
            include_categories: self.include_categories,
            exclude_categories: self.exclude_categories,
        })
    }
}

/// Holds the set of discoverable benchmark units.
///
/// Read-only during a run; the orchestrator seals it before executing.
#[derive(Debug, Default)]
pub struct UnitRegistry {
    units: Vec<BenchmarkUnit>,
    names: HashSet<String>,
    sealed: AtomicBool,
}

impl UnitRegistry {
    /// Empty registry, open for registration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a unit. Fails on duplicate identity or after sealing.
    pub fn register(&mut self, unit: BenchmarkUnit) -> Result<(), RegistryError> {
        if self.is_sealed() {
            return Err(RegistryError::Closed);
        }
        if !self.names.insert(unit.name().to_string()) {
            return Err(RegistryError::Duplicate(unit.name().to_string()));
        }
        self.units.push(unit);
        Ok(())
    }

    /// Close the registry for registration. Called by the orchestrator when a
    /// run begins; idempotent.
    pub fn seal(&self) {
        self.sealed.store(true, Ordering::Release);
    }

    /// Whether a run has begun and registration is closed.
    pub fn is_sealed(&self) -> bool {
        self.sealed.load(Ordering::Acquire)
    }

    /// Lazily produced, restartable sequence of units matching `filter`, in
    /// registration order.
    pub fn query<'a>(
        &'a self,
        filter: &'a UnitFilter,
    ) -> impl Iterator<Item = &'a BenchmarkUnit> + 'a {
        self.units.iter().filter(move |u| filter.matches(u))
    }

    /// All registered units in registration order.
    pub fn units(&self) -> &[BenchmarkUnit] {
        &self.units
    }

    /// Number of registered units.
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(name: &str, categories: &[&str]) -> BenchmarkUnit {
        let mut u = BenchmarkUnit::new(name, || ());
        for c in categories {
            u = u.category(*c);
        }
        u
    }

    #[test]
    fn duplicate_registration_fails() {
        let mut registry = UnitRegistry::new();
        registry.register(unit("div", &[])).unwrap();
        let err = registry.register(unit("div", &[])).unwrap_err();
        assert_eq!(err, RegistryError::Duplicate("div".to_string()));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn registration_after_seal_fails() {
        let mut registry = UnitRegistry::new();
        registry.register(unit("a", &[])).unwrap();
        registry.seal();
        let err = registry.register(unit("b", &[])).unwrap_err();
        assert_eq!(err, RegistryError::Closed);
    }

    #[test]
    fn query_preserves_registration_order() {
        let mut registry = UnitRegistry::new();
        registry.register(unit("zeta", &[])).unwrap();
        registry.register(unit("alpha", &[])).unwrap();
        registry.register(unit("mid", &[])).unwrap();

        let filter = UnitFilter::all();
        let names: Vec<&str> = registry
            .query(&filter)
            .map(|u| u.name())
            .collect();
        assert_eq!(names, ["zeta", "alpha", "mid"]);
    }

    #[test]
    fn query_is_restartable() {
        let mut registry = UnitRegistry::new();
        registry.register(unit("a", &[])).unwrap();
        registry.register(unit("b", &[])).unwrap();

        let filter = UnitFilter::all();
        assert_eq!(registry.query(&filter).count(), 2);
        // Second traversal yields the same sequence.
        assert_eq!(registry.query(&filter).count(), 2);
    }

    #[test]
    fn category_include_and_exclude() {
        let mut registry = UnitRegistry::new();
        registry.register(unit("div", &["math"])).unwrap();
        registry.register(unit("alloc", &["interop"])).unwrap();
        registry.register(unit("slow_div", &["math", "slow"])).unwrap();

        let filter = UnitFilter::builder()
            .include_category("math")
            .exclude_category("slow")
            .build()
            .unwrap();

        let names: Vec<&str> = registry.query(&filter).map(|u| u.name()).collect();
        assert_eq!(names, ["div"]);
    }

    #[test]
    fn name_globs_are_ored() {
        let mut registry = UnitRegistry::new();
        registry.register(unit("div_fast", &[])).unwrap();
        registry.register(unit("mul_fast", &[])).unwrap();
        registry.register(unit("alloc", &[])).unwrap();

        let filter = UnitFilter::builder()
            .name_glob("div*")
            .name_glob("mul*")
            .build()
            .unwrap();

        let names: Vec<&str> = registry.query(&filter).map(|u| u.name()).collect();
        assert_eq!(names, ["div_fast", "mul_fast"]);
    }

    #[test]
    fn empty_filter_matches_all() {
        let filter = UnitFilter::builder().build().unwrap();
        assert!(filter.matches(&unit("anything", &["whatever"])));
    }
}

//! Pattern id to generator mapping.

use super::rectilinear::Layout;
use super::{Concentric, Fill, InfillPattern, Rectilinear};
use crate::{Error, Result};
use std::collections::BTreeMap;
use std::fmt;

/// Builds a fresh generator for every surface.
pub type FillFactory = Box<dyn Fn() -> Box<dyn Fill> + Send + Sync>;

/// Maps each [`InfillPattern`] to the factory of its generator.
///
/// [`FillRegistry::default`] knows every built-in pattern. Registering a
/// pattern again replaces its factory.
pub struct FillRegistry {
    factories: BTreeMap<InfillPattern, FillFactory>,
}

impl FillRegistry {
    /// A registry without any pattern.
    pub fn empty() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// A registry with the built-in patterns.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register(InfillPattern::Rectilinear, || {
            Box::new(Rectilinear::with_layout(Layout::Rectilinear))
        });
        registry.register(InfillPattern::AlignedRectilinear, || {
            Box::new(Rectilinear::with_layout(Layout::Aligned))
        });
        registry.register(InfillPattern::Grid, || {
            Box::new(Rectilinear::with_layout(Layout::Grid))
        });
        registry.register(InfillPattern::Triangles, || {
            Box::new(Rectilinear::with_layout(Layout::Triangles))
        });
        registry.register(InfillPattern::Stars, || {
            Box::new(Rectilinear::with_layout(Layout::Stars))
        });
        registry.register(InfillPattern::Concentric, || Box::new(Concentric::new()));
        registry
    }

    /// Install `factory` for `pattern`, returning the factory it replaces.
    pub fn register<F>(&mut self, pattern: InfillPattern, factory: F) -> Option<FillFactory>
    where
        F: Fn() -> Box<dyn Fill> + Send + Sync + 'static,
    {
        self.factories.insert(pattern, Box::new(factory))
    }

    pub fn contains(&self, pattern: InfillPattern) -> bool {
        self.factories.contains_key(&pattern)
    }

    /// Registered patterns in identifier order.
    pub fn patterns(&self) -> Vec<InfillPattern> {
        self.factories.keys().copied().collect()
    }

    pub fn create(&self, pattern: InfillPattern) -> Result<Box<dyn Fill>> {
        self.factories
            .get(&pattern)
            .map(|factory| factory())
            .ok_or_else(|| Error::Pattern(format!("no generator registered for '{}'", pattern)))
    }
}

impl Default for FillRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FillRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FillRegistry")
            .field("patterns", &self.patterns())
            .finish()
    }
}

use std::collections::BTreeMap;

use crate::error::CoreError;
use crate::function::{IterationFunction, Space};
use crate::{newton, quadratic};

type Factory = Box<dyn Fn(Space) -> Box<dyn IterationFunction> + Send + Sync>;

/// Name → constructor table for iteration functions.
///
/// Every entry builds a function for either space, so a parameter-space
/// view can always find its dynamical-space companion by name.
#[derive(Default)]
pub struct FunctionRegistry {
    factories: BTreeMap<String, Factory>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in functions.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(quadratic::NAME, quadratic::Quadratic::boxed);
        registry.register(newton::NAME, newton::Newton::boxed);
        registry
    }

    /// Add or replace a constructor.
    pub fn register<F>(&mut self, name: &str, factory: F)
    where
        F: Fn(Space) -> Box<dyn IterationFunction> + Send + Sync + 'static,
    {
        if self
            .factories
            .insert(name.to_string(), Box::new(factory))
            .is_some()
        {
            tracing::debug!(name, "replaced registered function");
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    /// Build a function for `space`, with that space's default arguments.
    pub fn create(&self, name: &str, space: Space) -> crate::Result<Box<dyn IterationFunction>> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| CoreError::UnknownFunction(name.to_string()))?;
        let mut function = factory(space);
        function.defaults();
        Ok(function)
    }
}

impl std::fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.factories.keys()).finish()
    }
}

//! Step execution context and fixture access.
//! `StepContext` stores named fixture references for step definitions and an
//! optional [`ExceptionInspector`] consulted by the exception probe. Fixtures
//! must be `'static` types so they can be recovered through `Any`.

use std::any::Any;

use hashbrown::HashMap;

use crate::probe::ExceptionInspector;

/// Context passed to step definitions containing references to fixtures.
///
/// # Examples
///
/// ```
/// use stepchain::StepContext;
///
/// let value = 42;
/// let mut ctx = StepContext::default();
/// ctx.insert("answer", &value);
///
/// let retrieved: Option<&i32> = ctx.get("answer");
/// assert_eq!(retrieved, Some(&42));
/// ```
#[derive(Default)]
pub struct StepContext<'a> {
    fixtures: HashMap<&'static str, &'a dyn Any>,
    inspector: Option<&'a dyn ExceptionInspector>,
}

impl<'a> StepContext<'a> {
    /// Insert a fixture reference by name, replacing any previous entry.
    pub fn insert<T: Any>(&mut self, name: &'static str, value: &'a T) {
        self.fixtures.insert(name, value);
    }

    /// Retrieve a fixture reference by name and type.
    ///
    /// Returns `None` when the name is unknown or the stored value has a
    /// different type.
    #[must_use]
    pub fn get<T: Any>(&self, name: &str) -> Option<&'a T> {
        let value: &'a dyn Any = *self.fixtures.get(name)?;
        value.downcast_ref::<T>()
    }

    /// Return `true` when a fixture is registered under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.fixtures.contains_key(name)
    }

    /// Names of all registered fixtures, sorted for stable diagnostics.
    #[must_use]
    pub fn available_fixtures(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.fixtures.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Attach the inspector consulted by the exception probe.
    #[must_use]
    pub fn with_inspector(mut self, inspector: &'a dyn ExceptionInspector) -> Self {
        self.inspector = Some(inspector);
        self
    }

    /// Inspector consulted by the exception probe, if one is attached.
    #[must_use]
    pub fn inspector(&self) -> Option<&'a dyn ExceptionInspector> {
        self.inspector
    }
}

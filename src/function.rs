//! Function trait and the per-kind registration table.

use std::collections::HashMap;
use std::fmt;

use crate::environment::Environment;
use crate::Key;

/// Outcome of one function invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Computed<V> {
    /// The value is complete. The node becomes done.
    Done(V),
    /// Some dependency is missing. The node stays pending until signaled.
    NotFinished,
}

impl<V> Computed<V> {
    /// Returns true if this is `Done`.
    pub fn is_done(&self) -> bool {
        matches!(self, Computed::Done(_))
    }
}

/// A stateless computation registered for one key kind.
///
/// A function may be invoked many times for the same key: each time one of
/// its dependencies was missing, it returns [`Computed::NotFinished`] and is
/// restarted from scratch once every recorded dependency is done. It must
/// therefore:
///
/// - keep no state between invocations and re-request whatever it needs,
/// - be deterministic for the same key and the same done dependency values,
/// - return `NotFinished` whenever [`Environment::nodes_missing`] is true.
///
/// Any `Err` is a fault that aborts the whole evaluation.
///
/// # Example
///
/// ```ignore
/// struct Artifact;
///
/// impl Function<BuildKey, String> for Artifact {
///     fn compute(&self, key: &BuildKey, env: &mut Environment<'_, BuildKey, String>) -> anyhow::Result<Computed<String>> {
///         let Some(file) = env.get_value(&BuildKey::File(key.path().into())) else {
///             return Ok(Computed::NotFinished);
///         };
///         Ok(Computed::Done(format!("Artifact({})", file)))
///     }
/// }
/// ```
pub trait Function<K: Key, V>: Send + Sync + 'static {
    /// Compute the value for `key`, requesting dependencies through `env`.
    fn compute(&self, key: &K, env: &mut Environment<'_, K, V>) -> anyhow::Result<Computed<V>>;
}

/// Adapter that lets a plain closure act as a [`Function`].
struct FnFunction<F>(F);

impl<K, V, F> Function<K, V> for FnFunction<F>
where
    K: Key,
    V: 'static,
    F: Fn(&K, &mut Environment<'_, K, V>) -> anyhow::Result<Computed<V>> + Send + Sync + 'static,
{
    fn compute(&self, key: &K, env: &mut Environment<'_, K, V>) -> anyhow::Result<Computed<V>> {
        (self.0)(key, env)
    }
}

/// Mapping from key kind to the singleton function for that kind.
///
/// Only one function can be registered per kind. Later registrations
/// replace earlier ones.
pub struct FunctionRegistry<K: Key, V> {
    functions: HashMap<K::Kind, Box<dyn Function<K, V>>, ahash::RandomState>,
}

impl<K: Key, V> Default for FunctionRegistry<K, V> {
    fn default() -> Self {
        Self {
            functions: HashMap::default(),
        }
    }
}

impl<K: Key, V> fmt::Debug for FunctionRegistry<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.functions.keys()).finish()
    }
}

impl<K: Key, V: 'static> FunctionRegistry<K, V> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a function for a kind, replacing any previous one.
    pub fn insert(&mut self, kind: K::Kind, function: impl Function<K, V>) {
        self.functions.insert(kind, Box::new(function));
    }

    /// Register a closure for a kind, replacing any previous one.
    pub fn insert_fn<F>(&mut self, kind: K::Kind, function: F)
    where
        F: Fn(&K, &mut Environment<'_, K, V>) -> anyhow::Result<Computed<V>> + Send + Sync + 'static,
    {
        self.insert(kind, FnFunction(function));
    }

    /// Look up the function for a key's kind.
    pub fn get(&self, kind: &K::Kind) -> Option<&dyn Function<K, V>> {
        self.functions.get(kind).map(|function| function.as_ref())
    }

    /// Returns true if a function is registered for the kind.
    pub fn contains(&self, kind: &K::Kind) -> bool {
        self.functions.contains_key(kind)
    }

    /// Number of registered kinds.
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    /// Returns true if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

//! Executor: the scheduling loop that drives restarts and signals.

use std::fmt;
use std::sync::Arc;

use crate::environment::Environment;
use crate::error::EvalError;
use crate::function::{Computed, Function, FunctionRegistry};
use crate::graph::Graph;
use crate::key::debug_repr;
use crate::node::NodeIndex;
use crate::queue::WorkQueue;
use crate::tracer::{NoopTracer, Tracer};
use crate::Key;

/// Counters describing one evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvalStats {
    /// Keys dequeued, cache hits included.
    pub steps: usize,
    /// Function invocations.
    pub invocations: usize,
    /// Invocations of a key that had already been invoked before.
    pub restarts: usize,
    /// Dequeued keys that were already done.
    pub cache_hits: usize,
    /// Keys that became done.
    pub completions: usize,
}

/// Result of [`Executor::evaluate_graph`]: the root value plus the final graph.
#[derive(Debug)]
pub struct Evaluation<K, V> {
    /// The root's value.
    pub value: Arc<V>,
    /// Every node touched by the evaluation.
    pub graph: Graph<K, V>,
    /// Scheduling counters.
    pub stats: EvalStats,
}

/// Executor owns the function table and runs evaluations.
///
/// Each call to [`evaluate`](Executor::evaluate) builds a fresh graph and
/// drives it with a single-threaded FIFO loop:
///
/// 1. Dequeue a key. Skip it if it is already done.
/// 2. Invoke its function with a fresh [`Environment`].
/// 3. On [`Computed::Done`], mark the node done and signal every parent; a
///    parent whose recorded dependencies are now all done is queued again.
/// 4. On [`Computed::NotFinished`], leave the node pending until signaled.
///
/// The executor is the only mutator of node state and value. Any error
/// aborts the evaluation immediately.
///
/// # Example
///
/// ```
/// use restart_flow::{Computed, Executor, Key};
///
/// #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// enum Kind { Leaf, Sum }
///
/// #[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// enum K { Leaf(u32), Sum(u32) }
///
/// impl Key for K {
///     type Kind = Kind;
///     fn kind(&self) -> Kind {
///         match self { K::Leaf(_) => Kind::Leaf, K::Sum(_) => Kind::Sum }
///     }
/// }
///
/// let executor = Executor::builder()
///     .register_fn(Kind::Leaf, |key: &K, _env| match key {
///         K::Leaf(n) => Ok(Computed::Done(*n as u64)),
///         _ => unreachable!(),
///     })
///     .register_fn(Kind::Sum, |key: &K, env| {
///         let K::Sum(n) = key else { unreachable!() };
///         let values: Vec<_> = (0..*n).map(|i| env.get_value(&K::Leaf(i))).collect();
///         if env.nodes_missing() {
///             return Ok(Computed::NotFinished);
///         }
///         Ok(Computed::Done(values.into_iter().flatten().map(|v| *v).sum()))
///     })
///     .build();
///
/// assert_eq!(*executor.evaluate(&K::Sum(4)).unwrap(), 6);
/// ```
pub struct Executor<K: Key, V, T = NoopTracer> {
    functions: FunctionRegistry<K, V>,
    tracer: T,
    max_steps: Option<usize>,
}

impl<K: Key, V, T> fmt::Debug for Executor<K, V, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Executor")
            .field("functions", &self.functions)
            .field("max_steps", &self.max_steps)
            .finish_non_exhaustive()
    }
}

impl<K: Key, V: 'static> Executor<K, V> {
    /// Create an executor over an existing registration table.
    pub fn new(functions: FunctionRegistry<K, V>) -> Self {
        Self {
            functions,
            tracer: NoopTracer,
            max_steps: None,
        }
    }

    /// Create a builder for registering functions and customizing the executor.
    pub fn builder() -> ExecutorBuilder<K, V> {
        ExecutorBuilder::new()
    }
}

impl<K: Key, V: 'static, T: Tracer> Executor<K, V, T> {
    /// The registration table.
    pub fn functions(&self) -> &FunctionRegistry<K, V> {
        &self.functions
    }

    /// The tracer.
    pub fn tracer(&self) -> &T {
        &self.tracer
    }

    /// Evaluate `root` on a fresh graph and return its value.
    ///
    /// # Errors
    ///
    /// - `EvalError::UnknownKeyKind` - no function for a requested kind
    /// - `EvalError::FunctionFault` - a function returned an error
    /// - `EvalError::Stalled` - the root could not finish (cyclic dependencies)
    pub fn evaluate(&self, root: &K) -> Result<Arc<V>, EvalError> {
        self.evaluate_graph(root).map(|evaluation| evaluation.value)
    }

    /// Evaluate `root` on a fresh graph and return the value with the final graph.
    pub fn evaluate_graph(&self, root: &K) -> Result<Evaluation<K, V>, EvalError> {
        let span = tracing::debug_span!("evaluate", root = ?root);
        let _enter = span.enter();

        let mut graph = Graph::new();
        let mut queue = WorkQueue::new();
        let mut stats = EvalStats::default();

        self.tracer.on_evaluate_start(root);
        let root_index = graph.get_or_create(root);
        graph.node_mut(root_index).mark_scheduled();
        queue.push(root_index);

        while let Some(index) = queue.pop() {
            stats.steps += 1;
            if let Some(limit) = self.max_steps {
                if stats.steps > limit {
                    tracing::warn!(limit, "step limit exceeded");
                    return Err(EvalError::StepLimitExceeded { limit });
                }
            }

            if graph.node(index).is_done() {
                stats.cache_hits += 1;
                tracing::trace!(step = stats.steps, key = ?graph.key_at(index), "cache hit");
                self.tracer.on_cache_hit(stats.steps, graph.key_at(index));
                continue;
            }

            self.invoke(&mut graph, &mut queue, index, &mut stats)?;
        }

        let Some(value) = graph.node(root_index).value().cloned() else {
            let pending: Vec<String> = graph.pending_keys().iter().map(debug_repr).collect();
            tracing::warn!(pending = pending.len(), "queue drained before root finished");
            return Err(EvalError::Stalled {
                root: debug_repr(root),
                pending,
            });
        };

        tracing::debug!(
            steps = stats.steps,
            invocations = stats.invocations,
            nodes = graph.len(),
            "evaluation finished"
        );
        Ok(Evaluation {
            value,
            graph,
            stats,
        })
    }

    /// Run the function for one pending node and apply its result.
    fn invoke(
        &self,
        graph: &mut Graph<K, V>,
        queue: &mut WorkQueue,
        index: NodeIndex,
        stats: &mut EvalStats,
    ) -> Result<(), EvalError> {
        let key = graph.key_at(index).clone();
        let function = self
            .functions
            .get(&key.kind())
            .ok_or_else(|| EvalError::UnknownKeyKind {
                kind: debug_repr(&key.kind()),
                key: debug_repr(&key),
            })?;

        tracing::trace!(step = stats.steps, key = ?key, queued = queue.len(), "invoke");
        self.tracer.on_step(stats.steps, &key);
        let node = graph.node_mut(index);
        node.record_invocation();
        stats.invocations += 1;
        if node.invocations() > 1 {
            stats.restarts += 1;
        }

        let mut env = Environment::new(graph, queue, &self.tracer, index);
        let result = function
            .compute(&key, &mut env)
            .map_err(|source| EvalError::FunctionFault {
                key: debug_repr(&key),
                source,
            })?;
        let missing = env.missing_count();
        drop(env);

        match result {
            Computed::Done(value) => {
                if missing > 0 {
                    tracing::warn!(key = ?key, missing, "function finished with missing dependencies");
                    return Err(EvalError::FinishedWithMissingDependencies {
                        key: debug_repr(&key),
                    });
                }
                self.complete(graph, queue, index, value, stats);
            }
            Computed::NotFinished => {
                if missing == 0 {
                    tracing::warn!(key = ?key, "function not finished without missing dependencies");
                    return Err(EvalError::NotFinishedWithoutMissingDependencies {
                        key: debug_repr(&key),
                    });
                }
                let node = graph.node(index);
                self.tracer.on_waiting(
                    &key,
                    missing,
                    node.signaled_count(),
                    node.direct_deps().len(),
                );
            }
        }
        Ok(())
    }

    /// Mark a node done and signal its parents.
    fn complete(
        &self,
        graph: &mut Graph<K, V>,
        queue: &mut WorkQueue,
        index: NodeIndex,
        value: V,
        stats: &mut EvalStats,
    ) {
        let node = graph.node_mut(index);
        node.complete(Arc::new(value));
        stats.completions += 1;
        tracing::debug!(key = ?node.key(), invocations = node.invocations(), "done");
        self.tracer.on_done(node.key(), node.invocations());

        // Walk parents by position so appends never invalidate the traversal.
        let mut position = 0;
        while let Some(parent) = graph.node(index).reverse_deps().get(position) {
            position += 1;
            graph.node_mut(parent).signal();
            let parent_node = graph.node(parent);
            self.tracer.on_signal(
                parent_node.key(),
                graph.key_at(index),
                parent_node.signaled_count(),
                parent_node.direct_deps().len(),
            );
            if parent_node.is_ready() && !parent_node.is_done() && queue.push(parent) {
                self.tracer.on_reenqueue(parent_node.key());
            }
        }
    }
}

/// Builder for [`Executor`] with function registration and settings.
///
/// # Example
///
/// ```ignore
/// let executor = Executor::builder()
///     .register(Kind::FileState, FileStateFunction)
///     .register(Kind::File, FileFunction)
///     .tracer(LogTracer)
///     .max_steps(10_000)
///     .build();
/// ```
pub struct ExecutorBuilder<K: Key, V, T = NoopTracer> {
    functions: FunctionRegistry<K, V>,
    tracer: T,
    max_steps: Option<usize>,
}

impl<K: Key, V: 'static> Default for ExecutorBuilder<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Key, V: 'static> ExecutorBuilder<K, V> {
    /// Create a builder with no functions, no tracer and no step limit.
    pub fn new() -> Self {
        Self {
            functions: FunctionRegistry::new(),
            tracer: NoopTracer,
            max_steps: None,
        }
    }
}

impl<K: Key, V: 'static, T: Tracer> ExecutorBuilder<K, V, T> {
    /// Register the function for a kind. Later registrations replace earlier ones.
    pub fn register(mut self, kind: K::Kind, function: impl Function<K, V>) -> Self {
        self.functions.insert(kind, function);
        self
    }

    /// Register a closure for a kind. Later registrations replace earlier ones.
    pub fn register_fn<F>(mut self, kind: K::Kind, function: F) -> Self
    where
        F: Fn(&K, &mut Environment<'_, K, V>) -> anyhow::Result<Computed<V>> + Send + Sync + 'static,
    {
        self.functions.insert_fn(kind, function);
        self
    }

    /// Set the tracer that observes scheduling.
    pub fn tracer<U: Tracer>(self, tracer: U) -> ExecutorBuilder<K, V, U> {
        ExecutorBuilder {
            functions: self.functions,
            tracer,
            max_steps: self.max_steps,
        }
    }

    /// Abort with `EvalError::StepLimitExceeded` after this many dequeues.
    pub fn max_steps(mut self, limit: usize) -> Self {
        self.max_steps = Some(limit);
        self
    }

    /// Build the executor.
    pub fn build(self) -> Executor<K, V, T> {
        Executor {
            functions: self.functions,
            tracer: self.tracer,
            max_steps: self.max_steps,
        }
    }
}

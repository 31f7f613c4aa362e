//! Tracer trait for observing evaluation.
//!
//! The executor reports every scheduling decision to a [`Tracer`]. The default
//! [`NoopTracer`] discards everything. [`LogTracer`] renders a step-by-step
//! trace through the `tracing` crate, and [`TraceCollector`] records
//! [`TraceEvent`]s for assertions in tests.
//!
//! Keys are passed as `&dyn Debug`, so a tracer that ignores an event pays
//! nothing for formatting.
//!
//! # Example
//!
//! ```
//! use std::fmt::Debug;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use restart_flow::Tracer;
//!
//! #[derive(Default)]
//! struct CountSteps(AtomicUsize);
//!
//! impl Tracer for CountSteps {
//!     fn on_step(&self, _step: usize, _key: &dyn Debug) {
//!         self.0.fetch_add(1, Ordering::Relaxed);
//!     }
//! }
//! ```

use std::fmt::Debug;

use parking_lot::Mutex;

/// Tracer trait for observing the scheduling loop.
///
/// All methods have default empty implementations, so you only need to
/// override the events you're interested in.
pub trait Tracer: Send + Sync + 'static {
    /// Called once when an evaluation begins.
    #[inline]
    fn on_evaluate_start(&self, _root: &dyn Debug) {}

    /// Called when a dequeued key is pending and its function is about to run.
    #[inline]
    fn on_step(&self, _step: usize, _key: &dyn Debug) {}

    /// Called when a dequeued key is already done.
    #[inline]
    fn on_cache_hit(&self, _step: usize, _key: &dyn Debug) {}

    /// Called the first time an invocation records an edge to a dependency.
    #[inline]
    fn on_dependency_registered(&self, _parent: &dyn Debug, _dependency: &dyn Debug, _done: bool) {}

    /// Called when a function finished with a value.
    #[inline]
    fn on_done(&self, _key: &dyn Debug, _invocations: usize) {}

    /// Called when a function returned not-finished.
    ///
    /// `missing` counts the dependencies this invocation found unresolved;
    /// `signaled` and `total` describe the node's accumulated edges.
    #[inline]
    fn on_waiting(&self, _key: &dyn Debug, _missing: usize, _signaled: usize, _total: usize) {}

    /// Called when a completed dependency signals a parent.
    #[inline]
    fn on_signal(&self, _parent: &dyn Debug, _dependency: &dyn Debug, _signaled: usize, _total: usize) {}

    /// Called when a signaled parent becomes ready and is queued again.
    #[inline]
    fn on_reenqueue(&self, _parent: &dyn Debug) {}
}

/// Zero-cost tracer that discards all events.
///
/// This is the default tracer for [`Executor`](crate::Executor).
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTracer;

impl Tracer for NoopTracer {}

impl<T: Tracer> Tracer for std::sync::Arc<T> {
    fn on_evaluate_start(&self, root: &dyn Debug) {
        (**self).on_evaluate_start(root)
    }

    fn on_step(&self, step: usize, key: &dyn Debug) {
        (**self).on_step(step, key)
    }

    fn on_cache_hit(&self, step: usize, key: &dyn Debug) {
        (**self).on_cache_hit(step, key)
    }

    fn on_dependency_registered(&self, parent: &dyn Debug, dependency: &dyn Debug, done: bool) {
        (**self).on_dependency_registered(parent, dependency, done)
    }

    fn on_done(&self, key: &dyn Debug, invocations: usize) {
        (**self).on_done(key, invocations)
    }

    fn on_waiting(&self, key: &dyn Debug, missing: usize, signaled: usize, total: usize) {
        (**self).on_waiting(key, missing, signaled, total)
    }

    fn on_signal(&self, parent: &dyn Debug, dependency: &dyn Debug, signaled: usize, total: usize) {
        (**self).on_signal(parent, dependency, signaled, total)
    }

    fn on_reenqueue(&self, parent: &dyn Debug) {
        (**self).on_reenqueue(parent)
    }
}

/// Tracer that writes a human-readable step trace through `tracing` at info level.
///
/// ```text
/// evaluating ARTIFACT_NESTED_SET:[hello.py, lib.py]
/// [1] ARTIFACT_NESTED_SET:[hello.py, lib.py]
///       waiting on 2 deps (0/2 signaled)
/// [2] ARTIFACT:hello.py
///       waiting on 1 deps (0/1 signaled)
/// ...
/// [9] FILE_STATE:/workspace/
///       done: FILE_STATE:/workspace/ after 1 invocation(s)
///       signal FILE:/workspace/ (0 remaining)
///       -> re-enqueue FILE:/workspace/
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct LogTracer;

impl Tracer for LogTracer {
    fn on_evaluate_start(&self, root: &dyn Debug) {
        tracing::info!("evaluating {:?}", root);
    }

    fn on_step(&self, step: usize, key: &dyn Debug) {
        tracing::info!("[{}] {:?}", step, key);
    }

    fn on_cache_hit(&self, step: usize, key: &dyn Debug) {
        tracing::info!("[{}] {:?} -> cached", step, key);
    }

    fn on_done(&self, key: &dyn Debug, invocations: usize) {
        tracing::info!("      done: {:?} after {} invocation(s)", key, invocations);
    }

    fn on_waiting(&self, _key: &dyn Debug, missing: usize, signaled: usize, total: usize) {
        tracing::info!(
            "      waiting on {} deps ({}/{} signaled)",
            missing,
            signaled,
            total
        );
    }

    fn on_signal(&self, parent: &dyn Debug, _dependency: &dyn Debug, signaled: usize, total: usize) {
        tracing::info!(
            "      signal {:?} ({} remaining)",
            parent,
            total.saturating_sub(signaled)
        );
    }

    fn on_reenqueue(&self, parent: &dyn Debug) {
        tracing::info!("      -> re-enqueue {:?}", parent);
    }
}

/// A recorded tracer event. Keys are stored in their `Debug` rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceEvent {
    /// Evaluation of a root began.
    EvaluateStart {
        /// The root key.
        root: String,
    },
    /// A function invocation at a step.
    Step {
        /// One-based step index.
        step: usize,
        /// The key being computed.
        key: String,
    },
    /// A dequeued key was already done.
    CacheHit {
        /// One-based step index.
        step: usize,
        /// The done key.
        key: String,
    },
    /// An invocation recorded a new edge.
    DependencyRegistered {
        /// The requesting key.
        parent: String,
        /// The requested key.
        dependency: String,
        /// Whether the dependency was already done.
        done: bool,
    },
    /// A key finished.
    Done {
        /// The finished key.
        key: String,
        /// Invocations it took, restarts included.
        invocations: usize,
    },
    /// A key returned not-finished.
    Waiting {
        /// The waiting key.
        key: String,
        /// Dependencies this invocation found unresolved.
        missing: usize,
        /// Done dependencies among the recorded ones.
        signaled: usize,
        /// Recorded dependencies.
        total: usize,
    },
    /// A dependency signaled a parent.
    Signal {
        /// The signaled key.
        parent: String,
        /// The finished dependency.
        dependency: String,
        /// Done dependencies of the parent after the signal.
        signaled: usize,
        /// Recorded dependencies of the parent.
        total: usize,
    },
    /// A parent became ready and was queued again.
    Reenqueue {
        /// The queued key.
        parent: String,
    },
}

/// Tracer that accumulates events for later inspection.
///
/// # Example
///
/// ```ignore
/// let collector = Arc::new(TraceCollector::new());
/// let executor = Executor::builder().tracer(collector.clone()).build();
/// executor.evaluate(root)?;
/// assert!(collector.events().iter().any(|e| matches!(e, TraceEvent::Reenqueue { .. })));
/// ```
#[derive(Debug, Default)]
pub struct TraceCollector {
    events: Mutex<Vec<TraceEvent>>,
}

impl TraceCollector {
    /// Create a new empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get collected events.
    pub fn events(&self) -> Vec<TraceEvent> {
        self.events.lock().clone()
    }

    /// Take collected events, clearing the collector.
    pub fn take(&self) -> Vec<TraceEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    /// Get the number of collected events.
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// Check if no events have been collected.
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    /// Keys whose function was invoked, in step order (restarts included).
    pub fn invoked_keys(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                TraceEvent::Step { key, .. } => Some(key.clone()),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: TraceEvent) {
        self.events.lock().push(event);
    }
}

impl Tracer for TraceCollector {
    fn on_evaluate_start(&self, root: &dyn Debug) {
        self.push(TraceEvent::EvaluateStart {
            root: format!("{:?}", root),
        });
    }

    fn on_step(&self, step: usize, key: &dyn Debug) {
        self.push(TraceEvent::Step {
            step,
            key: format!("{:?}", key),
        });
    }

    fn on_cache_hit(&self, step: usize, key: &dyn Debug) {
        self.push(TraceEvent::CacheHit {
            step,
            key: format!("{:?}", key),
        });
    }

    fn on_dependency_registered(&self, parent: &dyn Debug, dependency: &dyn Debug, done: bool) {
        self.push(TraceEvent::DependencyRegistered {
            parent: format!("{:?}", parent),
            dependency: format!("{:?}", dependency),
            done,
        });
    }

    fn on_done(&self, key: &dyn Debug, invocations: usize) {
        self.push(TraceEvent::Done {
            key: format!("{:?}", key),
            invocations,
        });
    }

    fn on_waiting(&self, key: &dyn Debug, missing: usize, signaled: usize, total: usize) {
        self.push(TraceEvent::Waiting {
            key: format!("{:?}", key),
            missing,
            signaled,
            total,
        });
    }

    fn on_signal(&self, parent: &dyn Debug, dependency: &dyn Debug, signaled: usize, total: usize) {
        self.push(TraceEvent::Signal {
            parent: format!("{:?}", parent),
            dependency: format!("{:?}", dependency),
            signaled,
            total,
        });
    }

    fn on_reenqueue(&self, parent: &dyn Debug) {
        self.push(TraceEvent::Reenqueue {
            parent: format!("{:?}", parent),
        });
    }
}

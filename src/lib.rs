#![deny(missing_docs)]
#![doc = include_str!("../README.md")]

mod environment;
mod error;
mod executor;
mod function;
mod graph;
mod key;
mod node;
mod queue;
pub mod tracer;

pub use environment::Environment;
pub use error::EvalError;
pub use executor::{EvalStats, Evaluation, Executor, ExecutorBuilder};
pub use function::{Computed, Function, FunctionRegistry};
pub use graph::Graph;
pub use key::Key;
pub use node::{Edges, Node, NodeIndex, NodeState};
pub use tracer::{LogTracer, NoopTracer, TraceCollector, TraceEvent, Tracer};

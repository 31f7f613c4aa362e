//! Shared key family and table-driven functions for the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use restart_flow::{Computed, Environment, Executor, ExecutorBuilder, Key, NoopTracer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Leaf,
    Node,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TestKey {
    /// Finishes immediately with its name.
    Leaf(&'static str),
    /// Requests the keys listed for it in the table, then joins their values.
    Node(&'static str),
}

impl Key for TestKey {
    type Kind = Kind;

    fn kind(&self) -> Kind {
        match self {
            TestKey::Leaf(_) => Kind::Leaf,
            TestKey::Node(_) => Kind::Node,
        }
    }
}

pub fn leaf(name: &'static str) -> TestKey {
    TestKey::Leaf(name)
}

pub fn node(name: &'static str) -> TestKey {
    TestKey::Node(name)
}

/// Per-key counters shared with the registered functions.
#[derive(Debug, Default)]
pub struct Counters {
    invocations: Mutex<HashMap<TestKey, usize>>,
    completions: Mutex<HashMap<TestKey, usize>>,
    requests: Mutex<HashMap<TestKey, Vec<Vec<TestKey>>>>,
}

impl Counters {
    pub fn invocations(&self, key: &TestKey) -> usize {
        self.invocations.lock().unwrap().get(key).copied().unwrap_or(0)
    }

    pub fn completions(&self, key: &TestKey) -> usize {
        self.completions.lock().unwrap().get(key).copied().unwrap_or(0)
    }

    /// Dependency keys requested by each invocation of `key`, in order.
    pub fn requests(&self, key: &TestKey) -> Vec<Vec<TestKey>> {
        self.requests.lock().unwrap().get(key).cloned().unwrap_or_default()
    }

    fn invoked(&self, key: &TestKey) {
        *self.invocations.lock().unwrap().entry(key.clone()).or_default() += 1;
    }

    fn completed(&self, key: &TestKey) {
        *self.completions.lock().unwrap().entry(key.clone()).or_default() += 1;
    }

    fn requested(&self, key: &TestKey, deps: Vec<TestKey>) {
        self.requests
            .lock()
            .unwrap()
            .entry(key.clone())
            .or_default()
            .push(deps);
    }
}

/// Builder with `Leaf` and table-driven `Node` functions registered.
///
/// `Node(name)` requests every key listed under `name` and finishes with
/// `name(v1, v2, ...)`.
pub fn table_builder(
    table: &[(&'static str, Vec<TestKey>)],
    counters: Arc<Counters>,
) -> ExecutorBuilder<TestKey, String, NoopTracer> {
    let table: Arc<HashMap<&'static str, Vec<TestKey>>> = Arc::new(table.iter().cloned().collect());
    let leaf_counters = counters.clone();

    Executor::builder()
        .register_fn(Kind::Leaf, move |key: &TestKey, _env| {
            leaf_counters.invoked(key);
            let TestKey::Leaf(name) = key else {
                anyhow::bail!("not a leaf: {:?}", key);
            };
            leaf_counters.completed(key);
            Ok(Computed::Done(name.to_string()))
        })
        .register_fn(Kind::Node, move |key: &TestKey, env| {
            counters.invoked(key);
            let TestKey::Node(name) = key else {
                anyhow::bail!("not a node: {:?}", key);
            };
            let deps = table.get(name).cloned().unwrap_or_default();
            let values = request_all(env, &deps);
            counters.requested(key, env.requested());
            if env.nodes_missing() {
                return Ok(Computed::NotFinished);
            }
            counters.completed(key);
            Ok(Computed::Done(format!("{}({})", name, values.join(", "))))
        })
}

fn request_all(env: &mut Environment<'_, TestKey, String>, deps: &[TestKey]) -> Vec<String> {
    deps.iter()
        .filter_map(|dep| env.get_value(dep))
        .map(|value| value.to_string())
        .collect()
}

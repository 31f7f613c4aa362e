//! Tracer events emitted by the scheduling loop.

mod common;

use std::sync::Arc;

use common::{leaf, node, table_builder, Counters};
use restart_flow::{TraceCollector, TraceEvent};

fn s(value: &str) -> String {
    value.to_string()
}

#[test]
fn test_chain_events() {
    use TraceEvent::*;

    let collector = Arc::new(TraceCollector::new());
    let counters = Arc::new(Counters::default());
    let executor = table_builder(&[("root", vec![leaf("a")])], counters)
        .tracer(collector.clone())
        .build();

    assert_eq!(*executor.evaluate(&node("root")).unwrap(), "root(a)");
    assert_eq!(
        collector.events(),
        vec![
            EvaluateStart {
                root: s("Node(\"root\")")
            },
            Step {
                step: 1,
                key: s("Node(\"root\")")
            },
            DependencyRegistered {
                parent: s("Node(\"root\")"),
                dependency: s("Leaf(\"a\")"),
                done: false
            },
            Waiting {
                key: s("Node(\"root\")"),
                missing: 1,
                signaled: 0,
                total: 1
            },
            Step {
                step: 2,
                key: s("Leaf(\"a\")")
            },
            Done {
                key: s("Leaf(\"a\")"),
                invocations: 1
            },
            Signal {
                parent: s("Node(\"root\")"),
                dependency: s("Leaf(\"a\")"),
                signaled: 1,
                total: 1
            },
            Reenqueue {
                parent: s("Node(\"root\")")
            },
            Step {
                step: 3,
                key: s("Node(\"root\")")
            },
            Done {
                key: s("Node(\"root\")"),
                invocations: 2
            },
        ]
    );
}

#[test]
fn test_diamond_parent_requeued_after_both_children() {
    let collector = Arc::new(TraceCollector::new());
    let counters = Arc::new(Counters::default());
    let table = vec![
        ("A", vec![node("B"), node("C")]),
        ("B", vec![leaf("D")]),
        ("C", vec![leaf("D")]),
    ];
    let executor = table_builder(&table, counters)
        .tracer(collector.clone())
        .build();
    executor.evaluate(&node("A")).unwrap();

    let events = collector.events();
    let position = |wanted: &TraceEvent| events.iter().position(|e| e == wanted).unwrap();

    let b_done = position(&TraceEvent::Done {
        key: s("Node(\"B\")"),
        invocations: 2,
    });
    let c_done = position(&TraceEvent::Done {
        key: s("Node(\"C\")"),
        invocations: 2,
    });
    let a_requeued = position(&TraceEvent::Reenqueue {
        parent: s("Node(\"A\")"),
    });
    assert!(a_requeued > b_done);
    assert!(a_requeued > c_done);

    // D finished exactly once and signaled both parents.
    let d_done = events
        .iter()
        .filter(|e| matches!(e, TraceEvent::Done { key, .. } if key == "Leaf(\"D\")"))
        .count();
    assert_eq!(d_done, 1);
    assert_eq!(
        collector.invoked_keys(),
        vec![
            s("Node(\"A\")"),
            s("Node(\"B\")"),
            s("Node(\"C\")"),
            s("Leaf(\"D\")"),
            s("Node(\"B\")"),
            s("Node(\"C\")"),
            s("Node(\"A\")"),
        ]
    );
}

#[test]
fn test_done_dependency_registration_is_marked() {
    let collector = Arc::new(TraceCollector::new());
    let counters = Arc::new(Counters::default());
    // `late` requests `x` after `x` is already done.
    let table = vec![
        ("root", vec![leaf("x"), node("late")]),
        ("late", vec![node("mid")]),
        ("mid", vec![leaf("x")]),
    ];
    let executor = table_builder(&table, counters)
        .tracer(collector.clone())
        .build();
    executor.evaluate(&node("root")).unwrap();

    assert!(collector.events().contains(&TraceEvent::DependencyRegistered {
        parent: s("Node(\"mid\")"),
        dependency: s("Leaf(\"x\")"),
        done: true,
    }));
}

//! build-graph: evaluate an artifact set and print the step trace and final graph.

use anyhow::Context;
use build_graph::{builder, BuildKey, DEFAULT_WORKSPACE};
use clap::Parser;
use restart_flow::{Evaluation, LogTracer};

#[derive(Parser)]
#[command(name = "build-graph", about = "Evaluate a toy build graph with restart-based scheduling")]
struct Cli {
    /// Workspace root that artifact paths are resolved against
    #[arg(long, default_value = DEFAULT_WORKSPACE)]
    workspace: String,

    /// Workspace-relative sources to collect
    #[arg(default_values = ["hello.py", "lib.py"])]
    paths: Vec<String>,

    /// Do not print the step trace
    #[arg(long, short)]
    quiet: bool,

    /// Abort after this many scheduling steps
    #[arg(long)]
    max_steps: Option<usize>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .without_time()
        .with_target(false)
        .init();

    let root = BuildKey::ArtifactNestedSet(cli.paths.clone());
    println!("{}", "=".repeat(60));
    println!("Evaluating {:?}", root);
    println!("{}", "=".repeat(60));

    let mut executor = builder(cli.workspace.as_str());
    if let Some(limit) = cli.max_steps {
        executor = executor.max_steps(limit);
    }
    let evaluation = if cli.quiet {
        executor.build().evaluate_graph(&root)
    } else {
        executor.tracer(LogTracer).build().evaluate_graph(&root)
    }
    .with_context(|| format!("evaluating {:?}", root))?;

    print_graph(&evaluation);
    Ok(())
}

fn print_graph(evaluation: &Evaluation<BuildKey, String>) {
    println!();
    println!("Result: {}", evaluation.value);
    println!();
    println!("Graph contents:");
    for node in evaluation.graph.iter() {
        match node.value() {
            Some(value) => println!("  {:?}: {}", node.key(), value),
            None => println!("  {:?}: <pending>", node.key()),
        }
    }
    let stats = &evaluation.stats;
    println!();
    println!(
        "{} steps, {} invocations ({} restarts), {} nodes",
        stats.steps,
        stats.invocations,
        stats.restarts,
        evaluation.graph.len()
    );
}

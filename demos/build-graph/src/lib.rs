//! Build graph demo: a toy build system evaluated with restart-flow.
//!
//! Four key kinds stack on top of each other:
//! - `FileState(path)`: raw content of a path (leaf)
//! - `File(path)`: a file resolved against its parent directory
//! - `Artifact(path)`: a workspace file wrapped as a build artifact
//! - `ArtifactNestedSet(paths)`: every artifact collected into one set
//!
//! None of the functions touch the disk. Content is synthesized from the
//! path so the resulting values show exactly which dependencies were read.

use std::fmt;

use restart_flow::{Computed, Environment, ExecutorBuilder, Function, Key};

/// Workspace root used when none is given.
pub const DEFAULT_WORKSPACE: &str = "/workspace";

// ============================================================================
// Keys
// ============================================================================

/// Kind of a [`BuildKey`]. One function is registered per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    FileState,
    File,
    Artifact,
    ArtifactNestedSet,
}

/// Identity of a node in the build graph.
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum BuildKey {
    /// Raw content of an absolute path.
    FileState(String),
    /// A resolved file. Directories end with `/`.
    File(String),
    /// A workspace-relative source wrapped as an artifact.
    Artifact(String),
    /// All artifacts for the given workspace-relative paths.
    ArtifactNestedSet(Vec<String>),
}

impl Key for BuildKey {
    type Kind = Kind;

    fn kind(&self) -> Kind {
        match self {
            BuildKey::FileState(_) => Kind::FileState,
            BuildKey::File(_) => Kind::File,
            BuildKey::Artifact(_) => Kind::Artifact,
            BuildKey::ArtifactNestedSet(_) => Kind::ArtifactNestedSet,
        }
    }
}

// Short form keeps the step trace readable.
impl fmt::Debug for BuildKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildKey::FileState(path) => write!(f, "FILE_STATE:{}", path),
            BuildKey::File(path) => write!(f, "FILE:{}", path),
            BuildKey::Artifact(path) => write!(f, "ARTIFACT:{}", path),
            BuildKey::ArtifactNestedSet(paths) => {
                write!(f, "ARTIFACT_NESTED_SET:[{}]", paths.join(", "))
            }
        }
    }
}

/// Directory containing `path`, with a trailing `/`.
///
/// Returns `None` for directories, which already end with `/`. A bare file
/// name resolves to the root directory.
pub fn parent_dir(path: &str) -> Option<String> {
    if path.ends_with('/') {
        return None;
    }
    match path.rfind('/') {
        Some(end) => Some(path[..=end].to_string()),
        None => Some("/".to_string()),
    }
}

// ============================================================================
// Functions
// ============================================================================

/// Synthesizes file content from the path.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileStateFunction;

impl Function<BuildKey, String> for FileStateFunction {
    fn compute(
        &self,
        key: &BuildKey,
        _env: &mut Environment<'_, BuildKey, String>,
    ) -> anyhow::Result<Computed<String>> {
        let BuildKey::FileState(path) = key else {
            anyhow::bail!("FileStateFunction cannot compute {:?}", key);
        };
        Ok(Computed::Done(format!("content({})", path)))
    }
}

/// Resolves a file after its parent directory.
///
/// The parent directory's value is not part of the result, but the file
/// cannot be resolved until the directory is.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileFunction;

impl Function<BuildKey, String> for FileFunction {
    fn compute(
        &self,
        key: &BuildKey,
        env: &mut Environment<'_, BuildKey, String>,
    ) -> anyhow::Result<Computed<String>> {
        let BuildKey::File(path) = key else {
            anyhow::bail!("FileFunction cannot compute {:?}", key);
        };

        if let Some(parent) = parent_dir(path) {
            env.get_value(&BuildKey::File(parent));
        }
        let Some(state) = env.get_value(&BuildKey::FileState(path.clone())) else {
            return Ok(Computed::NotFinished);
        };

        Ok(env.finish(format!("File[{}]", state)))
    }
}

/// Wraps a workspace file as an artifact.
#[derive(Debug, Clone)]
pub struct ArtifactFunction {
    workspace: String,
}

impl ArtifactFunction {
    /// Resolve artifact paths under `workspace`.
    pub fn new(workspace: impl Into<String>) -> Self {
        Self {
            workspace: workspace.into(),
        }
    }

    /// Absolute path of a workspace-relative source.
    pub fn resolve(&self, path: &str) -> String {
        format!("{}/{}", self.workspace.trim_end_matches('/'), path)
    }
}

impl Default for ArtifactFunction {
    fn default() -> Self {
        Self::new(DEFAULT_WORKSPACE)
    }
}

impl Function<BuildKey, String> for ArtifactFunction {
    fn compute(
        &self,
        key: &BuildKey,
        env: &mut Environment<'_, BuildKey, String>,
    ) -> anyhow::Result<Computed<String>> {
        let BuildKey::Artifact(path) = key else {
            anyhow::bail!("ArtifactFunction cannot compute {:?}", key);
        };

        match env.get_value(&BuildKey::File(self.resolve(path))) {
            Some(file) => Ok(Computed::Done(format!("Artifact({})", file))),
            None => Ok(Computed::NotFinished),
        }
    }
}

/// Collects the artifacts for every path, in order.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArtifactNestedSetFunction;

impl Function<BuildKey, String> for ArtifactNestedSetFunction {
    fn compute(
        &self,
        key: &BuildKey,
        env: &mut Environment<'_, BuildKey, String>,
    ) -> anyhow::Result<Computed<String>> {
        let BuildKey::ArtifactNestedSet(paths) = key else {
            anyhow::bail!("ArtifactNestedSetFunction cannot compute {:?}", key);
        };

        // Request all artifacts before bailing so they are scheduled together.
        let artifacts: Vec<_> = paths
            .iter()
            .map(|path| env.get_value(&BuildKey::Artifact(path.clone())))
            .collect();
        if env.nodes_missing() {
            return Ok(Computed::NotFinished);
        }

        let rendered: Vec<String> = artifacts
            .into_iter()
            .flatten()
            .map(|artifact| artifact.to_string())
            .collect();
        Ok(Computed::Done(format!("NestedSet{{{}}}", rendered.join(", "))))
    }
}

/// Executor builder with every build function registered.
pub fn builder(workspace: impl Into<String>) -> ExecutorBuilder<BuildKey, String> {
    ExecutorBuilder::new()
        .register(Kind::FileState, FileStateFunction)
        .register(Kind::File, FileFunction)
        .register(Kind::Artifact, ArtifactFunction::new(workspace))
        .register(Kind::ArtifactNestedSet, ArtifactNestedSetFunction)
}

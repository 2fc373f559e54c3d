//! Manifest resolution into an existence-checked model descriptor.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::manifest::{self, Manifest};
use crate::error::ModelError;

/// Motion group target that marks idle motions
const IDLE_TARGET: &str = "Parameter";
/// Motion group name that marks idle motions
const IDLE_GROUP: &str = "Idle";

/// How missing optional assets are handled during resolution.
///
/// The primary model binary is always required, whatever the policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolvePolicy {
    /// Drop missing textures, motions and expressions
    #[default]
    Lenient,
    /// Fail on a missing texture or motion
    Strict,
}

/// A resolved character model.
///
/// Every path was verified to exist when the model was resolved. The value is
/// never edited afterwards; resolving again produces a new `LoadedModel`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadedModel {
    id: String,
    name: String,
    model_path: PathBuf,
    textures: Vec<PathBuf>,
    motions: Vec<PathBuf>,
    expressions: Vec<PathBuf>,
    physics_path: Option<PathBuf>,
    pose_path: Option<PathBuf>,
}

impl LoadedModel {
    /// Stable identifier (canonical model directory)
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Display name (model directory name)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Path to the primary model binary
    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    /// Texture paths in manifest order
    pub fn textures(&self) -> &[PathBuf] {
        &self.textures
    }

    /// Motion paths
    pub fn motions(&self) -> &[PathBuf] {
        &self.motions
    }

    /// Expression paths
    pub fn expressions(&self) -> &[PathBuf] {
        &self.expressions
    }

    pub fn physics_path(&self) -> Option<&Path> {
        self.physics_path.as_deref()
    }

    pub fn pose_path(&self) -> Option<&Path> {
        self.pose_path.as_deref()
    }

    /// Find a motion by its logical name (the motion file name)
    pub fn find_motion(&self, logical: &str) -> Option<&Path> {
        find_by_file_name(&self.motions, logical)
    }

    /// Find an expression asset by its file name
    pub fn find_expression(&self, logical: &str) -> Option<&Path> {
        find_by_file_name(&self.expressions, logical)
    }
}

fn find_by_file_name<'a>(paths: &'a [PathBuf], file_name: &str) -> Option<&'a Path> {
    paths
        .iter()
        .find(|p| p.file_name().and_then(|n| n.to_str()) == Some(file_name))
        .map(PathBuf::as_path)
}

/// Resolve a model directory with the lenient policy.
pub fn resolve(dir: impl AsRef<Path>) -> Result<LoadedModel, ModelError> {
    resolve_with(dir, ResolvePolicy::Lenient)
}

/// Resolve a model directory into a [`LoadedModel`].
///
/// Reads the filesystem only; nothing is cached between calls.
pub fn resolve_with(
    dir: impl AsRef<Path>,
    policy: ResolvePolicy,
) -> Result<LoadedModel, ModelError> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(ModelError::ModelNotFound(dir.display().to_string()));
    }
    let dir = std::fs::canonicalize(dir)
        .map_err(|e| ModelError::ModelNotFound(format!("{}: {}", dir.display(), e)))?;

    let manifest_path = manifest::locate(&dir).ok_or_else(|| {
        ModelError::InvalidFormat(format!("no manifest in {}", dir.display()))
    })?;
    let manifest = Manifest::read(&manifest_path)?;

    let model_path = dir.join(manifest.moc()?);
    if !model_path.exists() {
        return Err(ModelError::ModelNotFound(model_path.display().to_string()));
    }

    let textures = existing(&dir, manifest.textures(), "Texture");
    if policy == ResolvePolicy::Strict {
        if let Some(missing) = textures.missing.first() {
            return Err(ModelError::TextureLoadFailed(missing.display().to_string()));
        }
    }

    let motions = resolve_motions(&dir, &manifest);
    if policy == ResolvePolicy::Strict {
        if let Some(missing) = motions.missing.first() {
            return Err(ModelError::MotionLoadFailed(missing.display().to_string()));
        }
    }

    let expressions = existing(&dir, manifest.expressions(), "Expression");
    let physics_path = optional(&dir, manifest.physics(), "Physics");
    let pose_path = optional(&dir, manifest.pose(), "Pose");

    let name = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let model = LoadedModel {
        id: dir.display().to_string(),
        name,
        model_path,
        textures: textures.found,
        motions: motions.found,
        expressions: expressions.found,
        physics_path,
        pose_path,
    };

    tracing::info!(
        "Resolved model '{}': {} textures, {} motions, {} expressions",
        model.name,
        model.textures.len(),
        model.motions.len(),
        model.expressions.len()
    );

    Ok(model)
}

/// Every motion in the motion table, in table order.
///
/// An idle parameter group does not narrow the set: the states need their
/// non-idle motions too.
fn resolve_motions(dir: &Path, manifest: &Manifest) -> Partition {
    let has_idle_group = manifest
        .groups()
        .iter()
        .any(|&(target, name)| target == IDLE_TARGET && name == IDLE_GROUP);
    if !has_idle_group {
        tracing::debug!("No idle parameter group declared");
    }

    existing(dir, manifest.all_motions(), "Motion")
}

/// Resolved paths split by existence
#[derive(Debug, Default)]
struct Partition {
    found: Vec<PathBuf>,
    missing: Vec<PathBuf>,
}

fn existing(dir: &Path, names: Vec<&str>, kind: &str) -> Partition {
    let mut partition = Partition::default();

    for name in names {
        let path = dir.join(name);
        if path.exists() {
            if !partition.found.contains(&path) {
                tracing::debug!("{} asset: {}", kind, path.display());
                partition.found.push(path);
            }
        } else {
            tracing::warn!("{} asset not found: {}", kind, path.display());
            partition.missing.push(path);
        }
    }

    partition
}

fn optional(dir: &Path, name: Option<&str>, kind: &str) -> Option<PathBuf> {
    let path = dir.join(name?);
    if path.exists() {
        Some(path)
    } else {
        tracing::warn!("{} asset not found: {}", kind, path.display());
        None
    }
}

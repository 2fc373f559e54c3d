//! Model manifest discovery and field extraction.
//!
//! The manifest is a JSON document. Only the keys read here matter; anything
//! else in the document is ignored. Optional keys with an unexpected shape are
//! treated as absent.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::error::ModelError;

/// Preferred manifest file name inside a model directory
pub const MANIFEST_FILE: &str = "model.json";

/// Suffix of Cubism-style manifests, used when [`MANIFEST_FILE`] is absent
pub const MODEL3_SUFFIX: &str = ".model3.json";

/// Locate the manifest inside a model directory.
///
/// `model.json` wins; otherwise the lexically first `*.model3.json` is used.
pub fn locate(dir: &Path) -> Option<PathBuf> {
    let preferred = dir.join(MANIFEST_FILE);
    if preferred.is_file() {
        return Some(preferred);
    }

    let mut candidates: Vec<PathBuf> = std::fs::read_dir(dir)
        .ok()?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.ends_with(MODEL3_SUFFIX))
        })
        .collect();
    candidates.sort();
    candidates.into_iter().next()
}

/// A parsed manifest document
#[derive(Debug, Clone)]
pub struct Manifest {
    root: Map<String, Value>,
}

impl Manifest {
    /// Read and parse a manifest file
    pub fn read(path: &Path) -> Result<Self, ModelError> {
        let data = std::fs::read(path).map_err(|e| {
            ModelError::InvalidFormat(format!("{}: {}", path.display(), e))
        })?;
        Self::parse(&data).map_err(|e| match e {
            ModelError::InvalidFormat(msg) => {
                ModelError::InvalidFormat(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })
    }

    /// Parse manifest bytes. The document root must be a JSON object.
    pub fn parse(data: &[u8]) -> Result<Self, ModelError> {
        let root: Value = serde_json::from_slice(data)
            .map_err(|e| ModelError::InvalidFormat(format!("JSON parse error: {}", e)))?;

        match root {
            Value::Object(root) => Ok(Self { root }),
            _ => Err(ModelError::InvalidFormat(
                "manifest root is not an object".to_string(),
            )),
        }
    }

    fn file_references(&self) -> Option<&Map<String, Value>> {
        self.root.get("FileReferences").and_then(Value::as_object)
    }

    fn reference(&self, key: &str) -> Option<&str> {
        self.file_references()?.get(key).and_then(Value::as_str)
    }

    /// Primary model binary reference (`FileReferences.Moc`)
    pub fn moc(&self) -> Result<&str, ModelError> {
        if self.file_references().is_none() {
            return Err(ModelError::InvalidFormat(
                "missing FileReferences section".to_string(),
            ));
        }
        self.reference("Moc")
            .ok_or_else(|| ModelError::InvalidFormat("missing FileReferences.Moc".to_string()))
    }

    /// Texture file names in declaration order
    pub fn textures(&self) -> Vec<&str> {
        self.file_references()
            .and_then(|refs| refs.get("Textures"))
            .and_then(Value::as_array)
            .map(|list| list.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    /// Optional physics reference
    pub fn physics(&self) -> Option<&str> {
        self.reference("Physics")
    }

    /// Optional pose reference
    pub fn pose(&self) -> Option<&str> {
        self.reference("Pose")
    }

    /// Expression file references, skipping entries without a `File` key
    pub fn expressions(&self) -> Vec<&str> {
        self.file_references()
            .and_then(|refs| refs.get("Expressions"))
            .and_then(Value::as_array)
            .map(|list| {
                list.iter()
                    .filter_map(|entry| entry.get("File").and_then(Value::as_str))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Motion file names of one motion group
    pub fn motion_group(&self, group: &str) -> Vec<&str> {
        self.motion_table()
            .and_then(|table| table.get(group))
            .map(motion_files)
            .unwrap_or_default()
    }

    /// Every motion file in the motion table, group by group
    pub fn all_motions(&self) -> Vec<&str> {
        self.motion_table()
            .map(|table| table.values().flat_map(motion_files).collect())
            .unwrap_or_default()
    }

    fn motion_table(&self) -> Option<&Map<String, Value>> {
        self.file_references()?.get("Motions").and_then(Value::as_object)
    }

    /// Declared motion groups as `(target, name)` pairs.
    ///
    /// Groups may sit inside `FileReferences` or at the document root; both are read.
    pub fn groups(&self) -> Vec<(&str, &str)> {
        let nested = self.file_references().and_then(|refs| refs.get("Groups"));
        let top = self.root.get("Groups");

        nested
            .into_iter()
            .chain(top)
            .filter_map(Value::as_array)
            .flatten()
            .filter_map(|group| {
                let target = group.get("Target")?.as_str()?;
                let name = group.get("Name")?.as_str()?;
                Some((target, name))
            })
            .collect()
    }
}

/// A motion entry is either a bare file name or an object with a `File` key.
fn motion_files(group: &Value) -> Vec<&str> {
    group
        .as_array()
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| match entry {
                    Value::String(file) => Some(file.as_str()),
                    Value::Object(obj) => obj.get("File").and_then(Value::as_str),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default()
}

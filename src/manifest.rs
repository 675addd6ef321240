//! Manifest persistence: the file-backed list of tracked documents.
//!
//! The manifest is the single source of truth for what the knowledge base
//! tracks and which content revision was last ingested. It is loaded fresh
//! per invocation, mutated in memory, and written back in full at most once
//! per run. The file stays hand-editable: keys keep their declaration order
//! and unknown top-level keys survive a rewrite untouched.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::classify::{self, Classification, DEFAULT_OWNER, DEFAULT_VERSION};

/// Document classification. Hand-edited manifests may carry categories this
/// tool does not know about; those load as [`DocType::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocType {
    Uncategorized,
    Requirement,
    Reference,
    Policy,
    #[serde(untagged)]
    Other(String),
}

impl fmt::Display for DocType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocType::Uncategorized => f.write_str("uncategorized"),
            DocType::Requirement => f.write_str("requirement"),
            DocType::Reference => f.write_str("reference"),
            DocType::Policy => f.write_str("policy"),
            DocType::Other(s) => f.write_str(s),
        }
    }
}

/// One tracked document. Field order here is the on-disk key order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub doc_id: String,
    pub path: String,
    #[serde(rename = "type")]
    pub doc_type: DocType,
    pub priority: i64,
    pub owner: String,
    pub version: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Fingerprint as of the last successful ingestion. Absent until the
    /// first ingest; never set speculatively.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_hash: Option<String>,
}

impl ManifestEntry {
    /// Build a fresh entry for a newly discovered file, with classifier
    /// defaults. Used by both the structural sync and the ingestion path so
    /// the two can never disagree about what a new entry looks like.
    pub fn from_scan(rel_path: &str) -> Self {
        let Classification { doc_type, priority } = classify::classify(rel_path);
        Self {
            doc_id: classify::doc_id(rel_path),
            path: rel_path.to_string(),
            doc_type,
            priority,
            owner: DEFAULT_OWNER.to_string(),
            version: DEFAULT_VERSION.to_string(),
            tags: Vec::new(),
            last_hash: None,
        }
    }
}

/// Top-level manifest container.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub documents: Vec<ManifestEntry>,
    /// Top-level keys this tool does not interpret, preserved on rewrite.
    #[serde(flatten)]
    pub extra: serde_yaml::Mapping,
}

/// Load the manifest, or an empty one when the file does not exist yet
/// (first-run bootstrap). A present-but-unparseable manifest is an error:
/// the run aborts instead of silently discarding hand-edited metadata.
pub fn load(path: &Path) -> Result<Manifest> {
    if !path.exists() {
        return Ok(Manifest::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read manifest: {}", path.display()))?;
    if content.trim().is_empty() {
        return Ok(Manifest::default());
    }

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse manifest: {}", path.display()))
}

/// Persist the manifest. Serialization keeps declaration order, so the file
/// stays diff-friendly. The write goes to a sibling temp file first and is
/// renamed over the target, so a crash never leaves a half-written manifest.
pub fn save(path: &Path, manifest: &Manifest) -> Result<()> {
    let yaml = serde_yaml::to_string(manifest)
        .with_context(|| format!("Failed to serialize manifest: {}", path.display()))?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    std::fs::write(&tmp, yaml)
        .with_context(|| format!("Failed to write manifest: {}", tmp.display()))?;
    std::fs::rename(&tmp, path)
        .with_context(|| format!("Failed to replace manifest: {}", path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_file_returns_empty_manifest() {
        let tmp = tempfile::TempDir::new().unwrap();
        let manifest = load(&tmp.path().join("manifest.yaml")).unwrap();
        assert!(manifest.documents.is_empty());
        assert!(manifest.extra.is_empty());
    }

    #[test]
    fn load_empty_file_returns_empty_manifest() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("manifest.yaml");
        std::fs::write(&path, "\n").unwrap();
        assert!(load(&path).unwrap().documents.is_empty());
    }

    #[test]
    fn load_corrupt_file_is_an_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("manifest.yaml");
        std::fs::write(&path, "documents: {not: [a, list").unwrap();
        assert!(load(&path).is_err());
    }

    #[test]
    fn save_then_load_round_trips() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("kb").join("manifest.yaml");

        let mut manifest = Manifest::default();
        let mut entry = ManifestEntry::from_scan("requirements/login.md");
        entry.last_hash = Some("abc123".to_string());
        manifest.documents.push(entry);

        save(&path, &manifest).unwrap();
        let reloaded = load(&path).unwrap();
        assert_eq!(reloaded, manifest);
    }

    #[test]
    fn unknown_top_level_keys_survive_rewrite() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("manifest.yaml");
        std::fs::write(
            &path,
            "schema: 2\ndocuments:\n- doc_id: a\n  path: a.md\n  type: uncategorized\n  priority: 1\n  owner: unknown\n  version: v1.0\n  tags: []\n",
        )
        .unwrap();

        let manifest = load(&path).unwrap();
        save(&path, &manifest).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("schema: 2"), "rewrite lost a foreign key: {written}");
    }

    #[test]
    fn serialized_key_order_is_declaration_order() {
        let manifest = Manifest {
            documents: vec![ManifestEntry::from_scan("notes.txt")],
            extra: serde_yaml::Mapping::new(),
        };
        let yaml = serde_yaml::to_string(&manifest).unwrap();

        let doc_id = yaml.find("doc_id:").unwrap();
        let path = yaml.find("path:").unwrap();
        let doc_type = yaml.find("type:").unwrap();
        let owner = yaml.find("owner:").unwrap();
        assert!(doc_id < path && path < doc_type && doc_type < owner);
    }

    #[test]
    fn unknown_doc_type_loads_as_other() {
        let yaml = "documents:\n- doc_id: m\n  path: m.md\n  type: memo\n  priority: 1\n  owner: unknown\n  version: v1.0\n";
        let manifest: Manifest = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            manifest.documents[0].doc_type,
            DocType::Other("memo".to_string())
        );
    }

    #[test]
    fn absent_last_hash_is_omitted_from_yaml() {
        let manifest = Manifest {
            documents: vec![ManifestEntry::from_scan("notes.txt")],
            extra: serde_yaml::Mapping::new(),
        };
        let yaml = serde_yaml::to_string(&manifest).unwrap();
        assert!(!yaml.contains("last_hash"));
    }
}

//! Default metadata classification for untracked files.
//!
//! Classification is a pure function of the path's directory components
//! against one fixed rule table. Both reconcilers use this table, so a file
//! gets the same defaults whether it is first seen by `sync` or by `ingest`.
//! Classifier output never overrides metadata already present for a tracked
//! file.

use std::path::Path;

use crate::manifest::DocType;

pub const DEFAULT_OWNER: &str = "unknown";
pub const DEFAULT_VERSION: &str = "v1.0";

/// Classifier verdict: document type plus importance weight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub doc_type: DocType,
    pub priority: i64,
}

// Checked in table order; the first rule whose component appears anywhere
// in the path wins. Matching is exact component equality, case-sensitive.
const RULES: &[(&str, DocType, i64)] = &[
    ("requirements", DocType::Requirement, 5),
    ("references", DocType::Reference, 2),
    ("policies", DocType::Policy, 5),
];

/// Derive default metadata for a path relative to the knowledge-base root.
pub fn classify(rel_path: &str) -> Classification {
    let components: Vec<&str> = Path::new(rel_path)
        .components()
        .filter_map(|c| c.as_os_str().to_str())
        .collect();

    for (component, doc_type, priority) in RULES {
        if components.iter().any(|c| c == component) {
            return Classification {
                doc_type: doc_type.clone(),
                priority: *priority,
            };
        }
    }

    Classification {
        doc_type: DocType::Uncategorized,
        priority: 1,
    }
}

/// Stable document identifier: the file name without its extension.
pub fn doc_id(rel_path: &str) -> String {
    Path::new(rel_path)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| rel_path.to_string())
}

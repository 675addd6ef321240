//! Knowledge-base directory scanning.

use anyhow::{bail, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use walkdir::WalkDir;

use crate::config::KnowledgeBaseConfig;

/// File extensions the pipeline understands, compared case-insensitively.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["md", "txt", "pdf", "docx", "pptx"];

/// Recursively enumerate supported document files under the knowledge-base
/// root, as paths relative to it.
///
/// Walk order is filesystem-dependent; results are sorted so reports and
/// manifest diffs stay stable, but no caller depends on the order for
/// correctness.
pub fn scan_knowledge_base(config: &KnowledgeBaseConfig) -> Result<Vec<String>> {
    let root = &config.root;
    if !root.exists() {
        bail!("Knowledge base root does not exist: {}", root.display());
    }

    let mut excludes = vec!["**/.git/**".to_string()];
    excludes.extend(config.exclude_globs.clone());
    let exclude_set = build_globset(&excludes)?;

    let mut files = Vec::new();

    let walker = WalkDir::new(root).follow_links(config.follow_symlinks);
    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            continue;
        };
        if !SUPPORTED_EXTENSIONS
            .iter()
            .any(|s| s.eq_ignore_ascii_case(ext))
        {
            continue;
        }

        let relative = path.strip_prefix(root).unwrap_or(path);
        let rel_str = relative.to_string_lossy().to_string();

        if exclude_set.is_match(&rel_str) {
            continue;
        }

        files.push(rel_str);
    }

    files.sort();
    Ok(files)
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

//! Structural manifest synchronization.
//!
//! Brings the manifest's document list into 1:1 correspondence with the
//! files currently on disk: entries for files that still exist are kept
//! verbatim, newly discovered files get classifier defaults, and entries
//! for deleted files are dropped. Content hashes are not consulted here;
//! that is the ingestion reconciler's concern.

use anyhow::Result;
use std::collections::HashMap;

use crate::config::Config;
use crate::manifest::{self, ManifestEntry};
use crate::scanner;

#[derive(Debug, Default, Clone, Copy)]
pub struct SyncReport {
    pub added: usize,
    pub removed: usize,
}

impl SyncReport {
    pub fn changed(&self) -> bool {
        self.added > 0 || self.removed > 0
    }
}

/// Reconcile tracked entries against a disk listing.
///
/// The result list follows scan order. Entries whose path did not appear in
/// the scan are implicitly dropped; kept entries are untouched, including
/// their `last_hash`.
pub fn reconcile(
    documents: Vec<ManifestEntry>,
    scanned: &[String],
) -> (Vec<ManifestEntry>, SyncReport) {
    let before = documents.len();
    let mut by_path: HashMap<String, ManifestEntry> = documents
        .into_iter()
        .map(|doc| (doc.path.clone(), doc))
        .collect();

    let mut reconciled = Vec::with_capacity(scanned.len());
    let mut added = 0;

    for rel_path in scanned {
        match by_path.remove(rel_path) {
            Some(entry) => reconciled.push(entry),
            None => {
                let entry = ManifestEntry::from_scan(rel_path);
                tracing::info!(
                    "new entry: {} (id: {}, type: {})",
                    rel_path,
                    entry.doc_id,
                    entry.doc_type
                );
                reconciled.push(entry);
                added += 1;
            }
        }
    }

    let kept = reconciled.len() - added;
    let removed = before - kept;
    if removed > 0 {
        tracing::info!("removed {} entries for files no longer on disk", removed);
    }

    (reconciled, SyncReport { added, removed })
}

/// Run the sync command: load, scan, reconcile, and write the manifest back
/// only when something actually changed (no spurious file churn).
pub fn run_sync(config: &Config, dry_run: bool) -> Result<SyncReport> {
    let manifest_path = &config.manifest.path;
    let mut manifest = manifest::load(manifest_path)?;

    let scanned = scanner::scan_knowledge_base(&config.knowledge_base)?;
    tracing::info!(
        "scanned {}: {} files",
        config.knowledge_base.root.display(),
        scanned.len()
    );

    let (documents, report) = reconcile(std::mem::take(&mut manifest.documents), &scanned);
    manifest.documents = documents;

    if !dry_run && report.changed() {
        manifest::save(manifest_path, &manifest)?;
    }

    if dry_run {
        println!("sync {} (dry-run)", config.knowledge_base.root.display());
    } else {
        println!("sync {}", config.knowledge_base.root.display());
    }
    println!("  files on disk: {}", scanned.len());
    println!("  added: {}", report.added);
    println!("  removed: {}", report.removed);
    if dry_run {
        println!("  manifest: not written");
    } else if report.changed() {
        println!("  manifest: {}", manifest_path.display());
    } else {
        println!("  manifest: up to date");
    }
    println!("ok");

    Ok(report)
}

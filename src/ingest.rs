//! Content-driven incremental ingestion.
//!
//! Walks the knowledge base, compares each file's fingerprint against the
//! manifest, and feeds new or changed documents to the retrieval engine.
//! One file is processed fully (hash → parse → ingest → record) before the
//! next, and `last_hash` only advances after a successful ingestion call,
//! so a failed file is always retried on the next run.
//!
//! Untracked files are appended to the document list with the same
//! classifier defaults the structural sync would assign, so a new file is
//! ingested once and then tracked instead of being re-ingested forever.

use anyhow::Result;
use std::collections::HashMap;

use crate::config::Config;
use crate::hash;
use crate::manifest::{self, ManifestEntry};
use crate::parse;
use crate::retrieval::RetrievalGateway;
use crate::scanner;

#[derive(Debug, Clone)]
pub struct IngestFailure {
    pub path: String,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct IngestReport {
    pub scanned: usize,
    pub processed: usize,
    pub skipped: usize,
    pub failures: Vec<IngestFailure>,
}

/// Run the ingest command for one project.
///
/// Per-file failures never abort the loop; they are collected and reported
/// in the summary. Only manifest load/parse failure or a missing knowledge
/// base aborts the run.
pub fn run_ingest(
    config: &Config,
    project: &str,
    gateway: &mut RetrievalGateway,
) -> Result<IngestReport> {
    let manifest_path = &config.manifest.path;
    let mut manifest = manifest::load(manifest_path)?;

    let scanned = scanner::scan_knowledge_base(&config.knowledge_base)?;
    tracing::info!(
        "scanned {}: {} files",
        config.knowledge_base.root.display(),
        scanned.len()
    );

    // The manifest itself may live inside the KB root; it is never a document.
    let manifest_rel = manifest_path
        .strip_prefix(&config.knowledge_base.root)
        .ok()
        .map(|p| p.to_string_lossy().to_string());

    let mut index: HashMap<String, usize> = manifest
        .documents
        .iter()
        .enumerate()
        .map(|(i, doc)| (doc.path.clone(), i))
        .collect();

    let mut report = IngestReport {
        scanned: scanned.len(),
        ..IngestReport::default()
    };
    let mut manifest_dirty = false;

    for rel_path in &scanned {
        if manifest_rel.as_deref() == Some(rel_path.as_str()) {
            continue;
        }

        let abs_path = config.knowledge_base.root.join(rel_path);
        let current_hash = hash::hash_file(&abs_path);

        let slot = match index.get(rel_path) {
            Some(&i) => {
                // The empty sentinel never counts as unchanged: an
                // unreadable file must surface as a failure, not a skip.
                let unchanged = !current_hash.is_empty()
                    && manifest.documents[i].last_hash.as_deref() == Some(current_hash.as_str());
                if unchanged {
                    report.skipped += 1;
                    tracing::debug!("skip [unchanged]: {}", rel_path);
                    continue;
                }
                tracing::info!("processing [update]: {}", rel_path);
                i
            }
            None => {
                let entry = ManifestEntry::from_scan(rel_path);
                tracing::info!(
                    "processing [new]: {} (id: {}, type: {})",
                    rel_path,
                    entry.doc_id,
                    entry.doc_type
                );
                manifest.documents.push(entry);
                let i = manifest.documents.len() - 1;
                index.insert(rel_path.clone(), i);
                // The structural addition is kept even if ingestion fails
                // below; last_hash stays absent so the file is retried.
                manifest_dirty = true;
                i
            }
        };

        let content = match parse::parse_document(&abs_path) {
            Ok(content) => {
                if content.is_empty() {
                    tracing::warn!("empty extracted content: {}", rel_path);
                    report.failures.push(IngestFailure {
                        path: rel_path.clone(),
                        reason: "empty extracted content".to_string(),
                    });
                    continue;
                }
                content
            }
            Err(e) => {
                tracing::warn!("parse failed: {}: {}", rel_path, e);
                report.failures.push(IngestFailure {
                    path: rel_path.clone(),
                    reason: e.to_string(),
                });
                continue;
            }
        };

        match gateway.ingest_text(project, &content, &manifest.documents[slot]) {
            Ok(()) => {
                manifest.documents[slot].last_hash = Some(current_hash);
                manifest_dirty = true;
                report.processed += 1;
            }
            Err(e) => {
                tracing::error!("ingestion failed for {}: {:#}", rel_path, e);
                report.failures.push(IngestFailure {
                    path: rel_path.clone(),
                    reason: format!("{:#}", e),
                });
                // Hash stays as it was; the file is retried next run.
            }
        }
    }

    if manifest_dirty {
        manifest::save(manifest_path, &manifest)?;
        tracing::info!("manifest updated: {}", manifest_path.display());
    }

    println!("ingest {}", project);
    println!("  scanned: {} files", report.scanned);
    println!("  processed: {}", report.processed);
    println!("  skipped: {}", report.skipped);
    println!("  failed: {}", report.failures.len());
    for failure in &report.failures {
        println!("    {}: {}", failure.path, failure.reason);
    }
    if report.failures.is_empty() {
        println!("ok");
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, KnowledgeBaseConfig, ManifestConfig, RetrievalConfig};
    use crate::manifest::Manifest;
    use crate::retrieval::{QueryMode, RetrievalEngine};
    use anyhow::bail;
    use std::fs;
    use std::sync::{Arc, Mutex};

    /// Records ingest calls; fails them while `fail` is set.
    struct ScriptedEngine {
        calls: Arc<Mutex<Vec<String>>>,
        fail: Arc<Mutex<bool>>,
    }

    impl RetrievalEngine for ScriptedEngine {
        fn ingest_text(&mut self, _text: &str, metadata: &ManifestEntry) -> Result<()> {
            self.calls.lock().unwrap().push(metadata.path.clone());
            if *self.fail.lock().unwrap() {
                bail!("engine unavailable")
            }
            Ok(())
        }

        fn query(&mut self, _text: &str, _mode: QueryMode) -> Result<String> {
            Ok(String::new())
        }
    }

    struct Harness {
        _tmp: tempfile::TempDir,
        config: Config,
        gateway: RetrievalGateway,
        calls: Arc<Mutex<Vec<String>>>,
        fail: Arc<Mutex<bool>>,
    }

    fn harness() -> Harness {
        let tmp = tempfile::TempDir::new().unwrap();
        let kb = tmp.path().join("kb");
        fs::create_dir_all(&kb).unwrap();

        let config = Config {
            manifest: ManifestConfig {
                path: tmp.path().join("manifest.yaml"),
            },
            knowledge_base: KnowledgeBaseConfig {
                root: kb,
                exclude_globs: Vec::new(),
                follow_symlinks: false,
            },
            retrieval: RetrievalConfig {
                working_dir: tmp.path().join("index"),
                ..RetrievalConfig::default()
            },
        };

        let calls = Arc::new(Mutex::new(Vec::new()));
        let fail = Arc::new(Mutex::new(false));
        let mut gateway = RetrievalGateway::new(config.retrieval.clone());
        gateway.seed_engine(
            "default",
            Box::new(ScriptedEngine {
                calls: calls.clone(),
                fail: fail.clone(),
            }),
        );

        Harness {
            _tmp: tmp,
            config,
            gateway,
            calls,
            fail,
        }
    }

    fn write_kb_file(harness: &Harness, rel: &str, content: &str) {
        let path = harness.config.knowledge_base.root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn load_manifest(harness: &Harness) -> Manifest {
        manifest::load(&harness.config.manifest.path).unwrap()
    }

    fn entry_for<'m>(manifest: &'m Manifest, path: &str) -> &'m ManifestEntry {
        manifest
            .documents
            .iter()
            .find(|d| d.path == path)
            .unwrap_or_else(|| panic!("no entry for {path}"))
    }

    #[test]
    fn untracked_file_is_ingested_and_tracked() {
        let mut h = harness();
        write_kb_file(&h, "requirements/login.md", "login spec");

        let report = run_ingest(&h.config, "default", &mut h.gateway).unwrap();

        assert_eq!(report.processed, 1);
        assert_eq!(report.skipped, 0);
        assert!(report.failures.is_empty());
        assert_eq!(
            h.calls.lock().unwrap().as_slice(),
            ["requirements/login.md"]
        );

        let manifest = load_manifest(&h);
        let entry = entry_for(&manifest, "requirements/login.md");
        assert_eq!(entry.priority, 5);
        assert_eq!(
            entry.last_hash.as_deref().unwrap(),
            hash::hash_file(&h.config.knowledge_base.root.join("requirements/login.md"))
        );
    }

    #[test]
    fn second_run_with_no_changes_skips_everything() {
        let mut h = harness();
        write_kb_file(&h, "a.md", "alpha");
        write_kb_file(&h, "b.md", "beta");

        let first = run_ingest(&h.config, "default", &mut h.gateway).unwrap();
        assert_eq!(first.processed, 2);

        let second = run_ingest(&h.config, "default", &mut h.gateway).unwrap();
        assert_eq!(second.processed, 0);
        assert_eq!(second.skipped, 2);
        // Engine saw each file exactly once.
        assert_eq!(h.calls.lock().unwrap().len(), 2);
    }

    #[test]
    fn unchanged_tracked_file_does_not_reach_the_engine() {
        let mut h = harness();
        write_kb_file(&h, "a.md", "alpha");

        let abs = h.config.knowledge_base.root.join("a.md");
        let mut entry = ManifestEntry::from_scan("a.md");
        entry.last_hash = Some(hash::hash_file(&abs));
        let manifest = Manifest {
            documents: vec![entry],
            ..Manifest::default()
        };
        manifest::save(&h.config.manifest.path, &manifest).unwrap();

        let report = run_ingest(&h.config, "default", &mut h.gateway).unwrap();

        assert_eq!(report.skipped, 1);
        assert_eq!(report.processed, 0);
        assert!(h.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn changed_file_is_reingested_and_hash_updated() {
        let mut h = harness();
        write_kb_file(&h, "a.md", "v1");
        run_ingest(&h.config, "default", &mut h.gateway).unwrap();
        let old_hash = entry_for(&load_manifest(&h), "a.md").last_hash.clone();

        write_kb_file(&h, "a.md", "v2");
        let report = run_ingest(&h.config, "default", &mut h.gateway).unwrap();

        assert_eq!(report.processed, 1);
        let new_hash = entry_for(&load_manifest(&h), "a.md").last_hash.clone();
        assert_ne!(old_hash, new_hash);
    }

    #[test]
    fn engine_failure_leaves_hash_untouched_and_is_retried() {
        let mut h = harness();
        write_kb_file(&h, "a.md", "alpha");
        *h.fail.lock().unwrap() = true;

        let report = run_ingest(&h.config, "default", &mut h.gateway).unwrap();
        assert_eq!(report.processed, 0);
        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].reason.contains("engine unavailable"));

        // Entry was still added structurally, but without a hash.
        let manifest = load_manifest(&h);
        assert!(entry_for(&manifest, "a.md").last_hash.is_none());

        // Next run retries and succeeds.
        *h.fail.lock().unwrap() = false;
        let retry = run_ingest(&h.config, "default", &mut h.gateway).unwrap();
        assert_eq!(retry.processed, 1);
        assert!(retry.failures.is_empty());
        assert!(entry_for(&load_manifest(&h), "a.md").last_hash.is_some());
    }

    #[test]
    fn empty_content_is_recorded_as_failed_without_hash() {
        let mut h = harness();
        write_kb_file(&h, "empty.md", "");

        let report = run_ingest(&h.config, "default", &mut h.gateway).unwrap();

        assert_eq!(report.processed, 0);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].reason, "empty extracted content");
        assert!(h.calls.lock().unwrap().is_empty());
        assert!(entry_for(&load_manifest(&h), "empty.md").last_hash.is_none());
    }

    #[test]
    fn end_to_end_new_unchanged_changed() {
        let mut h = harness();
        write_kb_file(&h, "b.md", "beta");
        write_kb_file(&h, "c.md", "v1");
        run_ingest(&h.config, "default", &mut h.gateway).unwrap();

        // a is new, b unchanged, c changed.
        write_kb_file(&h, "a.md", "alpha");
        write_kb_file(&h, "c.md", "v2");
        let report = run_ingest(&h.config, "default", &mut h.gateway).unwrap();

        assert_eq!(report.processed, 2);
        assert_eq!(report.skipped, 1);
        assert!(report.failures.is_empty());

        let manifest = load_manifest(&h);
        let hash_of = |rel: &str| hash::hash_file(&h.config.knowledge_base.root.join(rel));
        assert_eq!(
            entry_for(&manifest, "a.md").last_hash.as_deref().unwrap(),
            hash_of("a.md")
        );
        assert_eq!(
            entry_for(&manifest, "c.md").last_hash.as_deref().unwrap(),
            hash_of("c.md")
        );
    }

    #[test]
    fn untouched_entries_keep_their_metadata_and_position() {
        let mut h = harness();
        write_kb_file(&h, "a.md", "alpha");
        write_kb_file(&h, "b.md", "beta");

        let mut first = ManifestEntry::from_scan("a.md");
        first.owner = "alice".to_string();
        first.last_hash = Some(hash::hash_file(
            &h.config.knowledge_base.root.join("a.md"),
        ));
        let manifest = Manifest {
            documents: vec![first.clone()],
            ..Manifest::default()
        };
        manifest::save(&h.config.manifest.path, &manifest).unwrap();

        run_ingest(&h.config, "default", &mut h.gateway).unwrap();

        let after = load_manifest(&h);
        assert_eq!(after.documents[0], first);
        assert_eq!(after.documents[1].path, "b.md");
    }
}

//! Manifest and knowledge-base health overview.
//!
//! A quick read-only summary of what is tracked, what is on disk, and how
//! far ingestion has gotten. Gives confidence that syncs and ingests are
//! doing what you expect before pointing a retrieval engine at the result.

use anyhow::Result;
use std::collections::{BTreeMap, HashSet};

use crate::config::Config;
use crate::manifest;
use crate::scanner;

/// Run the status command: compare manifest against disk and print a summary.
pub fn run_status(config: &Config) -> Result<()> {
    let manifest = manifest::load(&config.manifest.path)?;
    let scanned = scanner::scan_knowledge_base(&config.knowledge_base)?;

    let tracked: HashSet<&str> = manifest.documents.iter().map(|d| d.path.as_str()).collect();
    let on_disk: HashSet<&str> = scanned.iter().map(String::as_str).collect();

    let untracked = scanned
        .iter()
        .filter(|p| !tracked.contains(p.as_str()))
        .count();
    let missing = manifest
        .documents
        .iter()
        .filter(|d| !on_disk.contains(d.path.as_str()))
        .count();
    let ingested = manifest
        .documents
        .iter()
        .filter(|d| d.last_hash.is_some())
        .count();

    let mut by_type: BTreeMap<String, usize> = BTreeMap::new();
    for doc in &manifest.documents {
        *by_type.entry(doc.doc_type.to_string()).or_insert(0) += 1;
    }

    println!("KB Harness — Status");
    println!("===================");
    println!();
    println!("  Manifest:   {}", config.manifest.path.display());
    println!("  KB root:    {}", config.knowledge_base.root.display());
    println!();
    println!("  Tracked:    {}", manifest.documents.len());
    println!("  On disk:    {}", scanned.len());
    println!("  Untracked:  {}", untracked);
    println!("  Missing:    {}", missing);
    println!(
        "  Ingested:   {} / {}",
        ingested,
        manifest.documents.len()
    );

    if !by_type.is_empty() {
        println!();
        println!("  By type:");
        println!("  {:<16} {:>6}", "TYPE", "DOCS");
        println!("  {}", "-".repeat(24));
        for (doc_type, count) in &by_type {
            println!("  {:<16} {:>6}", doc_type, count);
        }
    }

    println!();
    Ok(())
}

//! # KB Harness
//!
//! A manifest-driven knowledge base ingestion and retrieval CLI.
//!
//! KB Harness keeps a human-editable YAML manifest in lockstep with a
//! directory tree of documents, and feeds new or changed files to an
//! external retrieval engine — one isolated engine per project. Change
//! detection is content-hash based, so re-runs are cheap and idempotent.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌─────────────────┐   ┌─────────────────┐
//! │ Scanner  │──▶│   Reconcilers    │──▶│ Manifest (YAML)  │
//! │ walkdir  │   │  sync / ingest  │   │  tracked docs    │
//! └──────────┘   └────────┬────────┘   └─────────────────┘
//!                         │ new/changed text
//!                         ▼
//!                ┌─────────────────┐
//!                │ RetrievalGateway │  one engine per project
//!                └─────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! kbh sync                      # align the manifest with the files on disk
//! kbh ingest --project default  # push new/changed documents to the engine
//! kbh query "what changed last release?" --mode mix
//! kbh status                    # manifest vs. disk overview
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`manifest`] | Manifest load/save and entry types |
//! | [`classify`] | Default metadata from path components |
//! | [`scanner`] | Knowledge-base directory scanning |
//! | [`hash`] | Content fingerprints for change detection |
//! | [`parse`] | Plain-text extraction (md, txt, pdf, docx, pptx) |
//! | [`sync`] | Structural manifest reconciliation |
//! | [`ingest`] | Hash-driven incremental ingestion |
//! | [`retrieval`] | Engine boundary and per-project gateway |
//! | [`query`] | Query entry point |
//! | [`status`] | Manifest and knowledge-base overview |

pub mod classify;
pub mod config;
pub mod hash;
pub mod ingest;
pub mod manifest;
pub mod parse;
pub mod query;
pub mod retrieval;
pub mod scanner;
pub mod status;
pub mod sync;

//! Retrieval engine boundary.
//!
//! The engine is an external collaborator: it consumes raw text with
//! metadata and answers questions. This module defines the
//! [`RetrievalEngine`] trait, the provider implementations, and the
//! [`RetrievalGateway`] that owns one engine per project.
//!
//! # Provider Selection
//!
//! The `[retrieval].provider` config key picks the backend:
//! - **`disabled`** — every call errors; ingestion records per-file failures.
//! - **`mock`** — accepts all text and answers with a canned response.
//! - **`http`** — a LightRAG-style HTTP service behind `retrieval.endpoint`.
//!
//! Engines are created lazily on first use of a project and cached for the
//! process lifetime; each project gets its own storage directory under
//! `retrieval.working_dir`, created on demand.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use crate::config::RetrievalConfig;
use crate::manifest::ManifestEntry;

/// Retrieval strategy passed through to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum QueryMode {
    Local,
    Global,
    Hybrid,
    Naive,
    Mix,
}

impl fmt::Display for QueryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            QueryMode::Local => "local",
            QueryMode::Global => "global",
            QueryMode::Hybrid => "hybrid",
            QueryMode::Naive => "naive",
            QueryMode::Mix => "mix",
        };
        f.write_str(name)
    }
}

/// One project-scoped retrieval engine.
pub trait RetrievalEngine: Send {
    /// Hand a document's text to the engine. Fire-and-forget: no return
    /// value, failures surface as errors to the caller.
    fn ingest_text(&mut self, text: &str, metadata: &ManifestEntry) -> Result<()>;

    /// Ask the engine a question and return its answer text.
    fn query(&mut self, text: &str, mode: QueryMode) -> Result<String>;
}

/// Owns the project → engine map. Passed into the command functions rather
/// than living in global state, so lifecycle is explicit and testable.
pub struct RetrievalGateway {
    config: RetrievalConfig,
    engines: HashMap<String, Box<dyn RetrievalEngine>>,
}

impl RetrievalGateway {
    pub fn new(config: RetrievalConfig) -> Self {
        Self {
            config,
            engines: HashMap::new(),
        }
    }

    pub fn ingest_text(
        &mut self,
        project: &str,
        text: &str,
        metadata: &ManifestEntry,
    ) -> Result<()> {
        self.engine_for(project)?.ingest_text(text, metadata)
    }

    pub fn query(&mut self, project: &str, text: &str, mode: QueryMode) -> Result<String> {
        self.engine_for(project)?.query(text, mode)
    }

    /// Drop all cached engines. A run calls this once at the end so
    /// teardown order is deterministic.
    pub fn shutdown(&mut self) {
        self.engines.clear();
    }

    fn engine_for(&mut self, project: &str) -> Result<&mut Box<dyn RetrievalEngine>> {
        match self.engines.entry(project.to_string()) {
            Entry::Occupied(slot) => Ok(slot.into_mut()),
            Entry::Vacant(slot) => {
                let project_dir = self.config.working_dir.join(project);
                if !project_dir.exists() {
                    std::fs::create_dir_all(&project_dir).with_context(|| {
                        format!("Failed to create index directory: {}", project_dir.display())
                    })?;
                    tracing::info!(
                        "created index directory for project '{}': {}",
                        project,
                        project_dir.display()
                    );
                }
                let engine = create_engine(&self.config, project)?;
                Ok(slot.insert(engine))
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn seed_engine(&mut self, project: &str, engine: Box<dyn RetrievalEngine>) {
        self.engines.insert(project.to_string(), engine);
    }
}

fn create_engine(config: &RetrievalConfig, project: &str) -> Result<Box<dyn RetrievalEngine>> {
    match config.provider.as_str() {
        "disabled" => Ok(Box::new(DisabledEngine)),
        "mock" => Ok(Box::new(MockEngine {
            project: project.to_string(),
        })),
        "http" => Ok(Box::new(HttpEngine::new(config, project)?)),
        other => bail!(
            "Unknown retrieval provider: '{}'. Must be disabled, mock, or http.",
            other
        ),
    }
}

// ============ Disabled Engine ============

/// Used when no backend is configured. Every call errors, which the ingest
/// loop records as a per-file failure.
pub struct DisabledEngine;

impl RetrievalEngine for DisabledEngine {
    fn ingest_text(&mut self, _text: &str, _metadata: &ManifestEntry) -> Result<()> {
        bail!("Retrieval provider is disabled")
    }

    fn query(&mut self, _text: &str, _mode: QueryMode) -> Result<String> {
        bail!("Retrieval provider is disabled")
    }
}

// ============ Mock Engine ============

/// Stand-in engine for running the pipeline without a real backend.
/// Accepts everything and answers queries with a canned response.
pub struct MockEngine {
    project: String,
}

impl RetrievalEngine for MockEngine {
    fn ingest_text(&mut self, text: &str, metadata: &ManifestEntry) -> Result<()> {
        tracing::debug!(
            "mock engine for '{}' accepted {} ({} bytes)",
            self.project,
            metadata.path,
            text.len()
        );
        Ok(())
    }

    fn query(&mut self, text: &str, mode: QueryMode) -> Result<String> {
        Ok(format!(
            "Mock answer for '{}' from project '{}' context. (mode: {})",
            text, self.project, mode
        ))
    }
}

// ============ HTTP Engine ============

/// Engine backed by a LightRAG-style HTTP retrieval service.
///
/// `POST <endpoint>/documents/text` with `{text, metadata, project}` to
/// ingest; `POST <endpoint>/query` with `{query, mode, project}` to ask.
/// Any non-2xx response is an error.
pub struct HttpEngine {
    client: reqwest::blocking::Client,
    endpoint: String,
    project: String,
}

impl HttpEngine {
    fn new(config: &RetrievalConfig, project: &str) -> Result<Self> {
        let endpoint = config
            .endpoint
            .clone()
            .ok_or_else(|| anyhow::anyhow!("retrieval.endpoint required for the http provider"))?;

        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            project: project.to_string(),
        })
    }
}

impl RetrievalEngine for HttpEngine {
    fn ingest_text(&mut self, text: &str, metadata: &ManifestEntry) -> Result<()> {
        let url = format!("{}/documents/text", self.endpoint);
        let resp = self
            .client
            .post(&url)
            .json(&serde_json::json!({
                "text": text,
                "metadata": metadata,
                "project": self.project,
            }))
            .send()
            .with_context(|| format!("Ingestion request to {} failed", url))?;

        if !resp.status().is_success() {
            bail!("retrieval service returned {} for {}", resp.status(), url);
        }
        Ok(())
    }

    fn query(&mut self, text: &str, mode: QueryMode) -> Result<String> {
        #[derive(Deserialize)]
        struct QueryResponse {
            answer: String,
        }

        let url = format!("{}/query", self.endpoint);
        let resp = self
            .client
            .post(&url)
            .json(&serde_json::json!({
                "query": text,
                "mode": mode.to_string(),
                "project": self.project,
            }))
            .send()
            .with_context(|| format!("Query request to {} failed", url))?;

        if !resp.status().is_success() {
            bail!("retrieval service returned {} for {}", resp.status(), url);
        }

        let body: QueryResponse = resp
            .json()
            .context("Failed to decode query response")?;
        Ok(body.answer)
    }
}

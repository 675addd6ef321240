//! Query entry point.
//!
//! Queries go straight to the retrieval gateway; the manifest is not
//! consulted.

use anyhow::Result;

use crate::retrieval::{QueryMode, RetrievalGateway};

/// Ask the project's engine a question and print the answer to stdout.
pub fn run_query(
    gateway: &mut RetrievalGateway,
    project: &str,
    text: &str,
    mode: QueryMode,
) -> Result<()> {
    tracing::info!("querying project '{}' (mode: {})", project, mode);
    let answer = gateway.query(project, text, mode)?;
    println!("{}", answer);
    Ok(())
}

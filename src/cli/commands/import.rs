//! Import workflow case results from a JSON file

use anyhow::Context;
use std::path::Path;

use crate::domain::QueryId;
use crate::models::case::NewCase;
use crate::state::SharedState;

pub async fn cmd_import_cases(
    state: &SharedState,
    query_id: &str,
    file: &Path,
) -> anyhow::Result<()> {
    let content = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let cases: Vec<NewCase> = serde_json::from_str(&content)
        .with_context(|| format!("{} is not a JSON array of cases", file.display()))?;

    let query_id = QueryId::from(query_id.trim());
    let summary = state.case_service.import_cases(&query_id, cases).await?;

    println!(
        "✓ Imported cases for query {}: {} new, {} updated",
        query_id.short(),
        summary.created,
        summary.updated
    );
    Ok(())
}

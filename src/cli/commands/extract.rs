use anyhow::Context;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::path::Path;

use crate::extract::ExtractRequest;
use crate::state::SharedState;

pub async fn cmd_extract(
    state: &SharedState,
    url: Option<String>,
    file: Option<&Path>,
) -> anyhow::Result<()> {
    let pdf_content = match file {
        Some(path) => {
            let bytes = tokio::fs::read(path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            Some(STANDARD.encode(bytes))
        }
        None => None,
    };

    let request = ExtractRequest {
        pdf_url: url,
        pdf_content,
    };
    let max_bytes = state.config.read().await.extraction.max_pdf_bytes;
    let document = state.extractor.extract(request.source(max_bytes)?).await?;

    println!("{}", serde_json::to_string_pretty(&document)?);
    Ok(())
}

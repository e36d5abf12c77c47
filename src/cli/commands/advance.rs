use crate::domain::{QueryId, QueryStatus};
use crate::state::SharedState;

pub async fn cmd_advance(state: &SharedState, query_id: &str, status: &str) -> anyhow::Result<()> {
    let next: QueryStatus = status.to_ascii_lowercase().parse()?;
    let query = state
        .query_service
        .advance_status(&QueryId::from(query_id.trim()), next)
        .await?;

    println!("✓ Query {} is now {}", query.id.short(), query.status);
    Ok(())
}

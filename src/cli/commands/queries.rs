//! List queries command handler

use crate::state::SharedState;

pub async fn cmd_list_queries(state: &SharedState, active_only: bool) -> anyhow::Result<()> {
    let queries = if active_only {
        state.query_service.list_active_queries().await?
    } else {
        state.query_service.list_queries().await?
    };

    if queries.is_empty() {
        println!("No queries found.");
        return Ok(());
    }

    println!("Queries ({} total)", queries.len());
    println!("{:-<70}", "");

    for query in queries {
        println!(
            "{}  {:<12} {:<11} {}",
            query.id.short(),
            query.county,
            query.status.as_str(),
            query.timestamp.format("%Y-%m-%d %H:%M")
        );
        for search in &query.searches {
            println!(
                "    {} ({} to {})",
                search.business, search.start_date, search.end_date
            );
        }
        if let Some(token) = &query.tracking_token {
            println!("    token: {token}");
        }
    }

    Ok(())
}

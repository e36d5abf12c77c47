use crate::domain::{CaseId, UserStatus};
use crate::state::SharedState;

pub async fn cmd_mark(
    state: &SharedState,
    status: &str,
    case_ids: &[String],
) -> anyhow::Result<()> {
    let status: UserStatus = status.to_ascii_lowercase().parse()?;
    let ids: Vec<CaseId> = case_ids.iter().map(|id| CaseId::from(id.trim())).collect();

    let updated = state
        .case_service
        .set_user_status_many(&ids, status)
        .await?;

    println!("✓ Marked {updated} cases as {status}");
    Ok(())
}

//! List cases command handler

use crate::models::case::{CaseFilter, UserStatusFilter};
use crate::state::SharedState;

pub async fn cmd_list_cases(
    state: &SharedState,
    business: Option<String>,
    county: Option<String>,
    case_status: Option<String>,
    user_status: Option<String>,
) -> anyhow::Result<()> {
    let user_status = user_status
        .map(|s| s.to_ascii_lowercase().parse::<UserStatusFilter>())
        .transpose()?;

    let filter = CaseFilter {
        business,
        county,
        case_status,
        user_status,
    };

    let rows = state.case_service.list_cases(&filter).await?;
    if rows.is_empty() {
        println!("No cases match the current filters.");
        return Ok(());
    }

    println!(
        "{:<14} {:<20} {:<10} {:<11} {:<10} {:<9} Defendant",
        "Case ID", "Business", "County", "Filed", "Status", "User"
    );
    println!("{:-<100}", "");

    for row in &rows {
        let case = &row.case;
        println!(
            "{:<14} {:<20} {:<10} {:<11} {:<10} {:<9} {}",
            case.case_id.as_str(),
            case.business,
            row.county.as_deref().unwrap_or("?"),
            case.filing_date.to_string(),
            case.case_status,
            case.user_status.map_or("None", |s| s.as_str()),
            case.defendant
        );
    }

    println!();
    println!("{} cases", rows.len());
    Ok(())
}

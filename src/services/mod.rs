pub mod case_service;
pub mod case_service_impl;
pub use case_service::{CaseError, CaseRow, CaseService, ImportSummary};
pub use case_service_impl::SeaOrmCaseService;

pub mod query_service;
pub mod query_service_impl;
pub use query_service::{QueryError, QueryService};
pub use query_service_impl::SeaOrmQueryService;

pub mod submission_service;
pub mod submission_service_impl;
pub use submission_service::{SubmissionService, SubmitError};
pub use submission_service_impl::DefaultSubmissionService;

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::clients::workflow::{HttpWorkflowTrigger, LocalWorkflowTrigger, WorkflowTrigger};
use crate::config::{Config, ExtractionBackend, WorkflowProvider};
use crate::db::Store;
use crate::extract::{DocumentExtractor, PdfDocumentExtractor, StaticDocumentExtractor};
use crate::services::{
    CaseService, DefaultSubmissionService, QueryService, SeaOrmCaseService, SeaOrmQueryService,
    SubmissionService,
};

fn build_workflow_trigger(config: &Config) -> anyhow::Result<Arc<dyn WorkflowTrigger>> {
    Ok(match config.workflow.provider {
        WorkflowProvider::Http => Arc::new(HttpWorkflowTrigger::new(
            config.workflow.endpoint.trim(),
            config.workflow.api_key.clone(),
            Duration::from_secs(config.workflow.request_timeout_seconds),
        )?),
        WorkflowProvider::Local => Arc::new(LocalWorkflowTrigger),
    })
}

fn build_extractor(config: &Config) -> anyhow::Result<Arc<dyn DocumentExtractor>> {
    Ok(match config.extraction.backend {
        ExtractionBackend::Pdf => Arc::new(PdfDocumentExtractor::new(
            config.extraction.max_pdf_bytes,
            Duration::from_secs(config.extraction.fetch_timeout_seconds),
            config.extraction.allow_private_hosts,
        )?),
        ExtractionBackend::Static => Arc::new(StaticDocumentExtractor),
    })
}

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<RwLock<Config>>,

    pub store: Store,

    pub workflow: Arc<dyn WorkflowTrigger>,

    pub extractor: Arc<dyn DocumentExtractor>,

    pub case_service: Arc<dyn CaseService>,

    pub query_service: Arc<dyn QueryService>,

    pub submission_service: Arc<dyn SubmissionService>,
}

impl SharedState {
    /// Opens the store and wires services, picking the workflow trigger and
    /// extraction backend from `config`.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let workflow = build_workflow_trigger(&config)?;
        Self::with_trigger(config, workflow).await
    }

    pub async fn with_trigger(
        config: Config,
        workflow: Arc<dyn WorkflowTrigger>,
    ) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let extractor = build_extractor(&config)?;

        let case_service =
            Arc::new(SeaOrmCaseService::new(store.clone())) as Arc<dyn CaseService>;
        let query_service =
            Arc::new(SeaOrmQueryService::new(store.clone())) as Arc<dyn QueryService>;
        let submission_service = Arc::new(DefaultSubmissionService::new(
            store.clone(),
            workflow.clone(),
        )) as Arc<dyn SubmissionService>;

        tracing::info!(
            workflow = workflow.name(),
            extraction = ?config.extraction.backend,
            "Services initialized"
        );

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            store,
            workflow,
            extractor,
            case_service,
            query_service,
            submission_service,
        })
    }

    pub async fn config(&self) -> Config {
        self.config.read().await.clone()
    }
}

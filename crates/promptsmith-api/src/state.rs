//! Application state wiring services to their concrete infra
//! implementations.
//!
//! Services are generic over repository/provider traits; AppState pins
//! them to SQLite and the OpenAI provider.

use std::path::PathBuf;
use std::sync::Arc;

use promptsmith_core::conversation::ConversationService;
use promptsmith_core::optimizer::OptimizerService;
use promptsmith_infra::config::load_service_config;
use promptsmith_infra::llm::OpenAiProvider;
use promptsmith_infra::sqlite::conversation::SqliteConversationRepository;
use promptsmith_infra::sqlite::pool::{resolve_data_dir, DatabasePool};
use promptsmith_types::config::ServiceConfig;

/// Concrete type aliases for the service generics pinned to infra
/// implementations.
pub type ConcreteConversationService = ConversationService<SqliteConversationRepository>;
pub type ConcreteOptimizerService =
    OptimizerService<SqliteConversationRepository, OpenAiProvider>;

/// Shared application state used by both CLI commands and REST handlers.
#[derive(Clone)]
pub struct AppState {
    pub conversations: Arc<ConcreteConversationService>,
    /// Present only when `OPENAI_API_KEY` is configured; the optimize
    /// endpoint reports the missing key per request, mirroring the
    /// health endpoint's feature flags.
    pub optimizer: Option<Arc<ConcreteOptimizerService>>,
    pub config: ServiceConfig,
    pub data_dir: PathBuf,
    pub db_pool: DatabasePool,
}

impl AppState {
    /// Initialize the application state: connect to the database, load
    /// config, wire services.
    ///
    /// The provider API key is read once here and passed into the
    /// provider explicitly; it is never written back into process-global
    /// state.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();
        tokio::fs::create_dir_all(&data_dir).await?;

        let db_url = format!(
            "sqlite://{}?mode=rwc",
            data_dir.join("promptsmith.db").display()
        );
        let db_pool = DatabasePool::new(&db_url).await?;

        let config = load_service_config(&data_dir).await;

        let repo = SqliteConversationRepository::new(db_pool.clone());
        let conversations = Arc::new(ConversationService::new(
            repo,
            config.retention_days,
            config.sweep_probability,
        ));

        let optimizer = match std::env::var("OPENAI_API_KEY") {
            Ok(api_key) if !api_key.is_empty() => {
                let provider = OpenAiProvider::new(&api_key, &config.model);
                // The optimizer owns its own conversation service so the
                // request flow and the history/sweep surfaces stay
                // independent (the repository is a cheap pool clone).
                let optimizer_conversations = ConversationService::new(
                    SqliteConversationRepository::new(db_pool.clone()),
                    config.retention_days,
                    config.sweep_probability,
                );
                Some(Arc::new(OptimizerService::new(
                    optimizer_conversations,
                    provider,
                    config.clone(),
                )))
            }
            _ => {
                tracing::warn!("OPENAI_API_KEY not set; optimize endpoint will report it per request");
                None
            }
        };

        Ok(Self {
            conversations,
            optimizer,
            config,
            data_dir,
            db_pool,
        })
    }
}

//! Application state wiring the reply pipeline to its adapters.
//!
//! AppState holds the concrete service instances used by both CLI and REST API.
//! The reply service is generic over repositories and generator; AppState pins
//! it to the runtime-selected [`Store`] and a boxed generator.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use secrecy::ExposeSecret;
use tokio::sync::mpsc;

use agentverse_core::event::ReplyEventBus;
use agentverse_core::generation::BoxTextGenerator;
use agentverse_core::reply::AutoReplyService;
use agentverse_core::repository::SessionProvider;
use agentverse_infra::config::{data_dir, load_global_config};
use agentverse_infra::llm::GeminiGenerator;
use agentverse_infra::rest::RestAuthClient;
use agentverse_infra::secret::{EnvCredentials, read_env_secret};
use agentverse_infra::sqlite::pool::database_url;
use agentverse_infra::sqlite::{DatabasePool, SqliteApiKeyStore};
use agentverse_infra::store::Store;
use agentverse_types::config::{GlobalConfig, StorageBackend};
use agentverse_types::session::{Session, SessionSignal};

/// Concrete reply service pinned to infra implementations.
pub type ReplyService = AutoReplyService<Store, Store, BoxTextGenerator>;

/// Refresh token used to bootstrap a hosted-backend session.
pub const REFRESH_TOKEN_ENV: &str = "AGENTVERSE_REFRESH_TOKEN";

/// Shared application state.
///
/// Used by both CLI commands and REST API handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GlobalConfig>,
    pub data_dir: PathBuf,
    pub store: Arc<Store>,
    pub reply_service: Arc<ReplyService>,
    pub api_keys: Arc<SqliteApiKeyStore>,
    pub bus: ReplyEventBus,
    /// Present only for the hosted REST backend.
    pub auth: Option<Arc<RestAuthClient>>,
    /// Feeds the session keeper while serving.
    pub session_signals: Option<mpsc::Sender<SessionSignal>>,
}

impl AppState {
    /// Initialize the application state: load config, connect storage, wire services.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = data_dir();
        tokio::fs::create_dir_all(&data_dir).await?;

        let config = load_global_config(&data_dir).await;
        let credentials = EnvCredentials::from_config(&config);

        // API keys always live in the local database, whatever the storage backend.
        let db_url = format!("{}?mode=rwc", database_url(&data_dir));
        let db_pool = DatabasePool::new(&db_url).await?;

        if credentials.generation_api_key.is_none() {
            tracing::warn!(
                var = %config.generation.api_key_env,
                "no text-generation API key set; replies will use placeholders"
            );
        }
        let generator =
            GeminiGenerator::from_config(credentials.generation_api_key, &config.generation)?;

        let (store, auth) = match config.storage.backend {
            StorageBackend::Sqlite => (Store::sqlite(db_pool.clone()), None),
            StorageBackend::Rest => {
                let url = config
                    .storage
                    .rest_url
                    .as_deref()
                    .context("storage.rest_url is required for the rest backend")?;
                let key = credentials.backend_key.with_context(|| {
                    format!(
                        "{} must be set for the rest backend",
                        config.storage.rest_key_env
                    )
                })?;
                let auth = Arc::new(RestAuthClient::new(url, key)?);
                bootstrap_session(&auth).await;
                (Store::rest(Arc::clone(&auth)), Some(auth))
            }
        };

        tracing::debug!(backend = store.backend_name(), data_dir = %data_dir.display(), "app state ready");
        Ok(Self::from_parts(
            config,
            data_dir,
            db_pool,
            store,
            BoxTextGenerator::new(generator),
            auth,
        ))
    }

    /// Wire the reply service around already-constructed adapters.
    pub fn from_parts(
        config: GlobalConfig,
        data_dir: PathBuf,
        db_pool: DatabasePool,
        store: Store,
        generator: BoxTextGenerator,
        auth: Option<Arc<RestAuthClient>>,
    ) -> Self {
        let bus = ReplyEventBus::default();
        let store = Arc::new(store);
        let reply_service = Arc::new(AutoReplyService::new(
            Arc::clone(&store),
            Arc::clone(&store),
            Arc::new(generator),
            &config,
            bus.clone(),
        ));

        Self {
            config: Arc::new(config),
            data_dir,
            api_keys: Arc::new(SqliteApiKeyStore::new(db_pool)),
            store,
            reply_service,
            bus,
            auth,
            session_signals: None,
        }
    }

    pub fn with_session_signals(mut self, signals: mpsc::Sender<SessionSignal>) -> Self {
        self.session_signals = Some(signals);
        self
    }
}

/// Seed the auth client from `AGENTVERSE_REFRESH_TOKEN` and exchange it once.
///
/// Failure is not fatal: row requests fall back to the anon key until a
/// later refresh succeeds.
async fn bootstrap_session(auth: &RestAuthClient) {
    let Some(refresh_token) = read_env_secret(REFRESH_TOKEN_ENV) else {
        tracing::info!("no {REFRESH_TOKEN_ENV} set; using anon access for the hosted backend");
        return;
    };

    auth.set_session(Some(Session {
        access_token: String::new(),
        refresh_token: refresh_token.expose_secret().to_string(),
        expires_at: Utc::now(),
        user_id: None,
    }))
    .await;

    match auth.refresh_session().await {
        Ok(session) => tracing::info!(expires_at = %session.expires_at, "hosted backend session established"),
        Err(e) if e.is_transient() => {
            tracing::warn!(error = %e, "initial session refresh failed, will retry while serving");
        }
        Err(e) => {
            tracing::warn!(error = %e, "refresh token rejected, continuing with anon access");
            auth.set_session(None).await;
        }
    }
}

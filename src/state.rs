use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::info;

use crate::ai::{AiGateway, GeminiClient};
use crate::clock::Clock;
use crate::config::AppConfig;
use crate::session::Session;
use crate::store::{self, SessionStore};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn SessionStore>,
    pub ai: AiGateway,
    pub clock: Clock,
    pub session: Arc<Mutex<Session>>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let store = store::connect(&config.store).await?;

        let snapshot = store::load_snapshot(store.as_ref()).await?;
        info!(
            logged_in = snapshot.profile.is_logged_in(),
            body_entries = snapshot.body_history.len(),
            meals = snapshot.meal_history.len(),
            "session restored"
        );

        let ai = AiGateway::new(Arc::new(GeminiClient::new(&config.ai)?));

        Ok(Self::from_parts(config, store, ai, Session::restore(snapshot)))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        store: Arc<dyn SessionStore>,
        ai: AiGateway,
        session: Session,
    ) -> Self {
        let clock = Clock::new(config.utc_offset());
        Self {
            config,
            store,
            ai,
            clock,
            session: Arc::new(Mutex::new(session)),
        }
    }
}

#[cfg(test)]
impl AppState {
    pub fn fake() -> Self {
        Self::fake_with(|_| {})
    }

    /// In-memory store, failing AI client, test config adjusted by `tweak`.
    pub fn fake_with(tweak: impl FnOnce(&mut AppConfig)) -> Self {
        use crate::ai::fake::FakeAiClient;
        use crate::config::{AiConfig, SortOrder, StoreBackend, StoreConfig};
        use crate::store::MemoryStore;

        let mut config = AppConfig {
            store: StoreConfig {
                backend: StoreBackend::Memory,
                dir: "./data".into(),
                database_url: None,
            },
            ai: AiConfig {
                api_key: "test".into(),
                model: "test-model".into(),
                base_url: "http://localhost:0".into(),
                timeout_secs: 1,
            },
            staff_code: "STAFF999".into(),
            utc_offset_hours: 9,
            inbody_sort: SortOrder::Asc,
            logout_clears_all: false,
        };
        tweak(&mut config);

        Self::from_parts(
            Arc::new(config),
            Arc::new(MemoryStore::default()),
            AiGateway::new(Arc::new(FakeAiClient::failing())),
            Session::restore(store::Snapshot::default()),
        )
    }

    pub fn with_store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.store = store;
        self
    }

    pub fn with_ai(mut self, client: Arc<crate::ai::fake::FakeAiClient>) -> Self {
        self.ai = AiGateway::new(client);
        self
    }
}

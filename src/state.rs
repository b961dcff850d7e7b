use std::sync::Arc;

use anyhow::Context;
use axum::extract::FromRef;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};

use crate::advisor::{gemini::GeminiAdvisor, Advisor, DisabledAdvisor};
use crate::auth::{
    identity::IdentityVerifier,
    jwt::JwtKeys,
    repo::{InMemoryUserStore, PgUserStore, UserStore},
};
use crate::clock::{Clock, SystemClock};
use crate::config::AppConfig;
use crate::posts::{
    memory::InMemoryPostStore,
    repo::{PgPostStore, PostStore},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub posts: Arc<dyn PostStore>,
    pub users: Arc<dyn UserStore>,
    pub identity: Arc<dyn IdentityVerifier>,
    pub clock: Arc<dyn Clock>,
    pub advisor: Arc<dyn Advisor>,
}

impl FromRef<AppState> for Arc<dyn IdentityVerifier> {
    fn from_ref(state: &AppState) -> Self {
        state.identity.clone()
    }
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let (posts, users): (Arc<dyn PostStore>, Arc<dyn UserStore>) = match &config.database_url {
            Some(url) => {
                let db = PgPoolOptions::new()
                    .max_connections(10)
                    .connect(url)
                    .await
                    .context("connect to database")?;
                sqlx::migrate!("./migrations")
                    .run(&db)
                    .await
                    .context("run migrations")?;
                info!("using postgres store");
                (
                    Arc::new(PgPostStore::new(db.clone())),
                    Arc::new(PgUserStore::new(db)),
                )
            }
            None => {
                warn!("DATABASE_URL not set; posts and users live in memory and vanish on restart");
                (
                    Arc::new(InMemoryPostStore::new()),
                    Arc::new(InMemoryUserStore::new()),
                )
            }
        };

        let advisor: Arc<dyn Advisor> = match config.advisor.api_key.clone() {
            Some(key) => {
                info!(model = %config.advisor.model, "gemini advisor enabled");
                Arc::new(GeminiAdvisor::new(&config.advisor, key)?)
            }
            None => {
                info!("GEMINI_API_KEY not set; insights use fallback text");
                Arc::new(DisabledAdvisor)
            }
        };

        Ok(Self::from_parts(
            config.clone(),
            posts,
            users,
            Arc::new(JwtKeys::from_config(&config.jwt)),
            Arc::new(SystemClock),
            advisor,
        ))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        posts: Arc<dyn PostStore>,
        users: Arc<dyn UserStore>,
        identity: Arc<dyn IdentityVerifier>,
        clock: Arc<dyn Clock>,
        advisor: Arc<dyn Advisor>,
    ) -> Self {
        Self {
            config,
            posts,
            users,
            identity,
            clock,
            advisor,
        }
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        Self::fake_with_clock(Arc::new(SystemClock))
    }

    /// In-memory state with test districts `Alpha`, `Beta`, `Gamma`.
    #[cfg(test)]
    pub fn fake_with_clock(clock: Arc<dyn Clock>) -> Self {
        let config = Arc::new(AppConfig {
            database_url: None,
            jwt: crate::config::JwtConfig {
                secret: "test".into(),
                issuer: "test".into(),
                audience: "test".into(),
                ttl_minutes: 5,
                refresh_ttl_minutes: 60,
            },
            districts: vec!["Alpha".into(), "Beta".into(), "Gamma".into()],
            advisor: crate::config::AdvisorConfig {
                api_key: None,
                model: "fake".into(),
                endpoint: "http://fake.local".into(),
                timeout_secs: 1,
            },
        });
        let identity = Arc::new(JwtKeys::from_config(&config.jwt));
        Self::from_parts(
            config,
            Arc::new(InMemoryPostStore::new()),
            Arc::new(InMemoryUserStore::new()),
            identity,
            clock,
            Arc::new(DisabledAdvisor),
        )
    }
}

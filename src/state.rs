use std::sync::Arc;

use axum::extract::FromRef;

use crate::{
    auth::jwt::TokenService,
    config::AppConfig,
    store::{postgres::PgStore, TaskStore, UserStore},
};

/// Everything a handler may touch. Built once in `main` and cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: Arc<dyn UserStore>,
    pub tasks: Arc<dyn TaskStore>,
    pub tokens: TokenService,
}

impl FromRef<AppState> for TokenService {
    fn from_ref(state: &AppState) -> Self {
        state.tokens.clone()
    }
}

impl AppState {
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let store = Arc::new(PgStore::connect(config.database.clone()).await?);
        store.migrate().await?;
        Ok(Self::from_parts(
            Arc::new(config),
            store.clone() as Arc<dyn UserStore>,
            store as Arc<dyn TaskStore>,
        ))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        users: Arc<dyn UserStore>,
        tasks: Arc<dyn TaskStore>,
    ) -> Self {
        let tokens = TokenService::new(&config.jwt);
        Self {
            config,
            users,
            tasks,
            tokens,
        }
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        Self::fake_with_secret(Some("test-secret"))
    }

    #[cfg(test)]
    pub fn fake_with_secret(secret: Option<&str>) -> Self {
        use sqlx::postgres::PgConnectOptions;

        use crate::{
            config::{JwtConfig, RunMode},
            store::memory::MemoryStore,
        };

        let config = Arc::new(AppConfig {
            database: PgConnectOptions::new_without_pgpass(),
            jwt: JwtConfig {
                secret: secret.map(Into::into),
                issuer: "test".into(),
                audience: "test".into(),
            },
            host: "127.0.0.1".into(),
            port: 0,
            mode: RunMode::Debug,
        });
        let store = Arc::new(MemoryStore::new());
        Self::from_parts(
            config,
            store.clone() as Arc<dyn UserStore>,
            store as Arc<dyn TaskStore>,
        )
    }
}

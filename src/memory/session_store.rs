//! 会话存储
//!
//! SessionStore 统一 load / save：load 对未知 id 返回默认初始状态（不产生写入），
//! save 以 session_id 为主键单语句 upsert（整行覆盖，不做合并）。
//! Postgres 实现的连接池在首次使用时惰性创建，并发首调用共享同一次初始化。

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use sqlx::Row;
use tokio::sync::{OnceCell, RwLock};

use crate::config::PostgresSection;
use crate::core::{AgentError, SessionState};

/// 会话存储接口
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// 读取会话状态；未知 id 返回该 id 的默认初始状态
    async fn load(&self, session_id: &str) -> Result<SessionState, AgentError>;

    /// 以 session_id 为主键整行 upsert；调用方必须传完整的期望状态
    async fn save(&self, state: &SessionState) -> Result<(), AgentError>;
}

/// 内存会话存储（测试与无数据库部署）
#[derive(Default)]
pub struct MemorySessionStore {
    states: RwLock<HashMap<String, SessionState>>,
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, session_id: &str) -> Result<SessionState, AgentError> {
        let states = self.states.read().await;
        Ok(states
            .get(session_id)
            .cloned()
            .unwrap_or_else(|| SessionState::new(session_id)))
    }

    async fn save(&self, state: &SessionState) -> Result<(), AgentError> {
        self.states
            .write()
            .await
            .insert(state.session_id.clone(), state.clone());
        Ok(())
    }
}

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS session_state (
    session_id TEXT PRIMARY KEY,
    user_input TEXT,
    conversation_history TEXT NOT NULL DEFAULT '[]',
    retrieved_context TEXT NOT NULL DEFAULT '[]',
    response TEXT NOT NULL DEFAULT '',
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
)";

const SELECT_STATE: &str = "SELECT user_input, conversation_history, retrieved_context, response
 FROM session_state WHERE session_id = $1";

const UPSERT_STATE: &str = "INSERT INTO session_state (
    session_id, user_input, conversation_history, retrieved_context, response, updated_at
) VALUES ($1, $2, $3, $4, $5, NOW())
ON CONFLICT (session_id) DO UPDATE SET
    user_input = EXCLUDED.user_input,
    conversation_history = EXCLUDED.conversation_history,
    retrieved_context = EXCLUDED.retrieved_context,
    response = EXCLUDED.response,
    updated_at = NOW()";

/// Postgres 会话存储：单表 session_state，select / upsert 均按主键单语句完成
pub struct PostgresSessionStore {
    connect: PgConnectOptions,
    min_connections: u32,
    max_connections: u32,
    pool: OnceCell<PgPool>,
}

impl PostgresSessionStore {
    pub fn new(cfg: &PostgresSection) -> Self {
        let mut connect = PgConnectOptions::new()
            .host(&cfg.host)
            .port(cfg.port)
            .username(&cfg.user)
            .database(&cfg.db)
            .application_name(&cfg.application_name);
        if let Some(password) = &cfg.password {
            connect = connect.password(password);
        }
        Self {
            connect,
            min_connections: cfg.min_connections,
            max_connections: cfg.max_connections,
            pool: OnceCell::new(),
        }
    }

    /// 首次调用时建池并建表；OnceCell 保证并发下只初始化一次
    async fn pool(&self) -> Result<&PgPool, sqlx::Error> {
        self.pool
            .get_or_try_init(|| async {
                let pool = PgPoolOptions::new()
                    .min_connections(self.min_connections)
                    .max_connections(self.max_connections)
                    .connect_with(self.connect.clone())
                    .await?;
                sqlx::query(CREATE_TABLE).execute(&pool).await?;
                tracing::info!(
                    min = self.min_connections,
                    max = self.max_connections,
                    "postgres pool initialized"
                );
                Ok(pool)
            })
            .await
    }
}

#[async_trait]
impl SessionStore for PostgresSessionStore {
    async fn load(&self, session_id: &str) -> Result<SessionState, AgentError> {
        let pool = self.pool().await.map_err(store_error)?;
        let row = sqlx::query(SELECT_STATE)
            .bind(session_id)
            .fetch_optional(pool)
            .await
            .map_err(store_error)?;

        let Some(row) = row else {
            return Ok(SessionState::new(session_id));
        };

        let user_input: Option<String> = row.try_get("user_input").map_err(store_error)?;
        let history_json: String = row.try_get("conversation_history").map_err(store_error)?;
        let context_json: String = row.try_get("retrieved_context").map_err(store_error)?;
        let response: String = row.try_get("response").map_err(store_error)?;

        Ok(SessionState {
            session_id: session_id.to_string(),
            user_input,
            conversation_history: serde_json::from_str(&history_json).map_err(corrupt_row)?,
            retrieved_context: serde_json::from_str(&context_json).map_err(corrupt_row)?,
            response,
        })
    }

    async fn save(&self, state: &SessionState) -> Result<(), AgentError> {
        let pool = self.pool().await.map_err(store_error)?;
        let history_json =
            serde_json::to_string(&state.conversation_history).map_err(corrupt_row)?;
        let context_json = serde_json::to_string(&state.retrieved_context).map_err(corrupt_row)?;
        sqlx::query(UPSERT_STATE)
            .bind(&state.session_id)
            .bind(&state.user_input)
            .bind(&history_json)
            .bind(&context_json)
            .bind(&state.response)
            .execute(pool)
            .await
            .map_err(store_error)?;
        Ok(())
    }
}

fn store_error(e: sqlx::Error) -> AgentError {
    AgentError::PersistenceUnavailable(e.to_string())
}

fn corrupt_row(e: serde_json::Error) -> AgentError {
    AgentError::PersistenceUnavailable(format!("corrupt session row: {}", e))
}

/// 创建会话存储：配置了 Postgres 密码则用持久化存储，否则退回内存存储
pub fn create_session_store(cfg: &PostgresSection) -> Arc<dyn SessionStore> {
    if cfg.password.is_some() {
        tracing::info!(host = %cfg.host, db = %cfg.db, "Using Postgres session store");
        Arc::new(PostgresSessionStore::new(cfg))
    } else {
        tracing::warn!("Postgres password not configured, using in-memory session store");
        Arc::new(MemorySessionStore::default())
    }
}

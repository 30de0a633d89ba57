//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `WREN__*` 覆盖（双下划线表示嵌套，如 `WREN__POSTGRES__HOST=db`）。
//! 每个段都带完整默认值，缺省配置即可在本地启动（Mock LLM + 内存会话存储）。

use std::path::PathBuf;

use serde::Deserialize;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub app: AppSection,
    pub llm: LlmSection,
    pub embedding: EmbeddingSection,
    pub milvus: MilvusSection,
    pub postgres: PostgresSection,
    pub retrieval: RetrievalSection,
    pub ingest: IngestSection,
    pub server: ServerSection,
}

/// [app] 段：应用名与单轮工具循环上限
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppSection {
    pub name: Option<String>,
    /// 单轮内 Decide ↔ ExecuteTools 的轮数上限；0 表示不设上限
    pub max_tool_hops: usize,
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            name: None,
            max_tool_hops: 20,
        }
    }
}

/// [llm] 段：OpenAI 兼容端点与模型
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    pub model: String,
    pub base_url: Option<String>,
    pub temperature: f32,
    /// 单次推理请求超时（秒）
    pub request_timeout_secs: u64,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            base_url: None,
            temperature: 0.2,
            request_timeout_secs: 60,
        }
    }
}

/// [embedding] 段：嵌入模型与向量维度
///
/// 维度在建索引时定死，检索端只要求与索引一致。
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmbeddingSection {
    pub model: String,
    pub base_url: Option<String>,
    pub dimension: usize,
}

impl Default for EmbeddingSection {
    fn default() -> Self {
        Self {
            model: "text-embedding-3-small".to_string(),
            base_url: None,
            dimension: 1536,
        }
    }
}

/// [milvus] 段：向量索引连接
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MilvusSection {
    pub uri: String,
    pub token: String,
    pub collection_name: String,
    pub timeout_secs: u64,
}

impl Default for MilvusSection {
    fn default() -> Self {
        Self {
            uri: "http://localhost:19530".to_string(),
            token: String::new(),
            collection_name: "rag_agent".to_string(),
            timeout_secs: 15,
        }
    }
}

/// [postgres] 段：会话存储连接与连接池边界
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PostgresSection {
    pub host: String,
    pub port: u16,
    pub user: String,
    /// 未配置密码时服务退回内存会话存储
    pub password: Option<String>,
    pub db: String,
    pub application_name: String,
    pub min_connections: u32,
    pub max_connections: u32,
}

impl Default for PostgresSection {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            user: "postgres".to_string(),
            password: None,
            db: "postgres".to_string(),
            application_name: "wren".to_string(),
            min_connections: 1,
            max_connections: 10,
        }
    }
}

/// [retrieval] 段：检索条数与建库写入批大小
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetrievalSection {
    pub top_k: usize,
    /// 建索引时的写入批大小（建库脚本使用，非服务路径）
    pub batch_size: usize,
}

impl Default for RetrievalSection {
    fn default() -> Self {
        Self {
            top_k: 5,
            batch_size: 100,
        }
    }
}

/// [ingest] 段：文档切块参数（仅建库时使用）
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IngestSection {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for IngestSection {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

/// [server] 段：HTTP 监听地址
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub bind: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8000".to_string(),
        }
    }
}

/// 从 config 目录加载配置，环境变量 WREN__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 WREN__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("WREN")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_every_section() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.app.max_tool_hops, 20);
        assert_eq!(cfg.llm.model, "gpt-4o-mini");
        assert_eq!(cfg.embedding.dimension, 1536);
        assert_eq!(cfg.milvus.collection_name, "rag_agent");
        assert_eq!(cfg.postgres.min_connections, 1);
        assert_eq!(cfg.postgres.max_connections, 10);
        assert!(cfg.postgres.password.is_none());
        assert_eq!(cfg.retrieval.top_k, 5);
        assert_eq!(cfg.ingest.chunk_size, 1000);
        assert_eq!(cfg.server.bind, "0.0.0.0:8000");
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let cfg: AppConfig = config::Config::builder()
            .add_source(config::File::from_str(
                "[retrieval]\ntop_k = 3\n",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(cfg.retrieval.top_k, 3);
        assert_eq!(cfg.retrieval.batch_size, 100);
        assert_eq!(cfg.app.max_tool_hops, 20);
    }
}

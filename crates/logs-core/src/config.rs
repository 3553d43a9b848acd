use log::warn;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub aws: AwsConfig,
    pub logging: LoggingConfig,
    pub agent: AgentConfig,
    pub knowledge_base: KnowledgeBaseConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AwsConfig {
    #[serde(default = "default_region")]
    pub region: String,
}

impl Default for AwsConfig {
    fn default() -> Self {
        Self {
            region: default_region(),
        }
    }
}

impl AwsConfig {
    pub fn with_env_overrides(&self) -> Self {
        let region = env::var("AWS_REGION").unwrap_or_else(|_| self.region.clone());
        Self { region }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    Local,
    Firehose,
    Memory,
}

impl std::str::FromStr for SinkKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "local" => Ok(SinkKind::Local),
            "firehose" => Ok(SinkKind::Firehose),
            "memory" => Ok(SinkKind::Memory),
            other => anyhow::bail!("Unknown sink kind '{}'", other),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub sink: SinkKind,
    #[serde(default = "default_local_dir")]
    pub local_dir: String,
    pub delivery_stream_name: Option<String>,
    pub experiment_id: Option<String>,
    #[serde(default = "default_true")]
    pub capture_input: bool,
    #[serde(default = "default_true")]
    pub capture_output: bool,
    #[serde(default = "default_session_ttl")]
    pub session_ttl_seconds: u64,
}

impl LoggingConfig {
    pub fn with_env_overrides(&self) -> Self {
        let mut cfg = self.clone();
        if let Ok(sink) = env::var("BEDROCK_LOGS_SINK") {
            match sink.parse() {
                Ok(kind) => cfg.sink = kind,
                Err(e) => warn!(
                    "Ignoring BEDROCK_LOGS_SINK: {}; keeping '{:?}' sink",
                    e, cfg.sink
                ),
            }
        }
        if let Ok(dir) = env::var("BEDROCK_LOGS_DIR") {
            cfg.local_dir = dir;
        }
        if let Ok(stream) = env::var("FIREHOSE_STREAM_NAME") {
            cfg.delivery_stream_name = Some(stream);
        }
        cfg
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    pub agent_id: String,
    pub agent_alias_id: String,
    #[serde(default = "default_true")]
    pub enable_trace: bool,
}

impl AgentConfig {
    pub fn with_env_overrides(&self) -> Self {
        let agent_id = env::var("BEDROCK_AGENT_ID").unwrap_or_else(|_| self.agent_id.clone());
        let agent_alias_id =
            env::var("BEDROCK_AGENT_ALIAS_ID").unwrap_or_else(|_| self.agent_alias_id.clone());
        Self {
            agent_id,
            agent_alias_id,
            enable_trace: self.enable_trace,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeBaseConfig {
    pub knowledge_base_id: String,
    pub model_arn: String,
    #[serde(default = "default_number_of_results")]
    pub number_of_results: i32,
    pub prompt_template: Option<String>,
}

impl KnowledgeBaseConfig {
    pub fn with_env_overrides(&self) -> Self {
        let knowledge_base_id =
            env::var("KNOWLEDGE_BASE_ID").unwrap_or_else(|_| self.knowledge_base_id.clone());
        let model_arn = env::var("KB_MODEL_ARN").unwrap_or_else(|_| self.model_arn.clone());
        Self {
            knowledge_base_id,
            model_arn,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

impl ServerConfig {
    pub fn with_env_overrides(&self) -> Self {
        let bind_addr = env::var("SERVER_BIND_ADDR").unwrap_or_else(|_| self.bind_addr.clone());
        Self { bind_addr }
    }
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_local_dir() -> String {
    "./bedrock_logs".to_string()
}

fn default_true() -> bool {
    true
}

fn default_session_ttl() -> u64 {
    3600
}

fn default_number_of_results() -> i32 {
    5
}

fn default_bind_addr() -> String {
    "0.0.0.0:3000".to_string()
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn load_from_env() -> anyhow::Result<Self> {
        let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| Self::default_config_path());
        Self::load(Path::new(&config_path))
    }

    pub fn default_config_path() -> String {
        "./config.toml".to_string()
    }

    /// Applies every section's environment overrides
    pub fn with_env_overrides(&self) -> Self {
        Self {
            aws: self.aws.with_env_overrides(),
            logging: self.logging.with_env_overrides(),
            agent: self.agent.with_env_overrides(),
            knowledge_base: self.knowledge_base.with_env_overrides(),
            server: self.server.with_env_overrides(),
        }
    }
}

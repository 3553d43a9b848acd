use agent_runtime::{BedrockAgentClient, BedrockKnowledgeBaseClient};
use anyhow::Context;
use bedrock_logs::BedrockLogs;
use log::{info, warn};
use logs_core::config::{
    AgentConfig, AwsConfig, Config, KnowledgeBaseConfig, LoggingConfig, ServerConfig, SinkKind,
};
use server::{create_app, AppState};
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Set default log level if not already set
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    info!("Starting Bedrock observability server");

    let config = Config::load_from_env()
        .unwrap_or_else(|e| {
            warn!("Could not load config ({}), using development defaults", e);
            create_development_config()
        })
        .with_env_overrides();

    let logs = Arc::new(
        BedrockLogs::from_config(&config)
            .await
            .context("Failed to initialize BedrockLogs")?,
    );
    spawn_session_gc(Arc::clone(&logs));

    let region = config.aws.region.clone();
    let state = Arc::new(AppState {
        agent: Arc::new(BedrockAgentClient::new_with_region(&region).await),
        knowledge_base: Arc::new(BedrockKnowledgeBaseClient::new_with_region(&region).await),
        logs,
        config,
    });

    let bind_addr = state.config.server.bind_addr.clone();
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;

    info!("Server running on http://{}", bind_addr);

    axum::serve(listener, app)
        .await
        .context("Server terminated unexpectedly")?;

    Ok(())
}

/// Drops idle sessions so their next call starts a new run
fn spawn_session_gc(logs: Arc<BedrockLogs>) {
    let period = (logs.options().session_ttl / 4).max(Duration::from_secs(1));
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            logs.gc_sessions();
        }
    });
}

fn create_development_config() -> Config {
    Config {
        aws: AwsConfig::default(),
        logging: LoggingConfig {
            sink: SinkKind::Local,
            local_dir: "./bedrock_logs".to_string(),
            delivery_stream_name: None,
            experiment_id: Some("development".to_string()),
            capture_input: true,
            capture_output: true,
            session_ttl_seconds: 3600,
        },
        agent: AgentConfig {
            agent_id: "DEVAGENTID".to_string(),
            agent_alias_id: "TSTALIASID".to_string(),
            enable_trace: true,
        },
        knowledge_base: KnowledgeBaseConfig {
            knowledge_base_id: "DEVKBID".to_string(),
            model_arn:
                "arn:aws:bedrock:us-east-1::foundation-model/anthropic.claude-3-haiku-20240307-v1:0"
                    .to_string(),
            number_of_results: 5,
            prompt_template: None,
        },
        server: ServerConfig::default(),
    }
}

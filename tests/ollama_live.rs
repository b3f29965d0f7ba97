//! Live Ollama tests
//!
//! Need a running Ollama server with the configured model pulled.
//! Run with: cargo test --test ollama_live -- --ignored

use std::time::Duration;

use baton::{Config, Runtime};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

async fn create_runtime() -> Result<Runtime, Box<dyn std::error::Error>> {
    let mut config = Config::default();
    config.agent.max_steps = 5;
    config.agent.debug = false;

    let runtime = Runtime::new(config)?;
    runtime.initialize().await?;
    Ok(runtime)
}

#[tokio::test]
#[ignore] // Requires Ollama
async fn test_simple_question() {
    let runtime = match create_runtime().await {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Skipping test: {}", e);
            return;
        }
    };

    let outcome = timeout(
        Duration::from_secs(120),
        runtime.process("What is the capital of France?", &CancellationToken::new()),
    )
    .await
    .expect("request timed out");

    assert!(outcome.success, "run failed: {:?}", outcome.error);
    assert!(!outcome.hops.is_empty());
}

#[tokio::test]
#[ignore]
async fn test_list_models() {
    let runtime = match create_runtime().await {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Skipping test: {}", e);
            return;
        }
    };

    let models = runtime.list_models().await.unwrap();
    assert!(models
        .iter()
        .any(|m| m.starts_with(runtime.config().model.name.split(':').next().unwrap_or_default())));
}

//! Console adapter for the switchboard routing core.
//!
//! Reads stdin lines as one session, routes each through a fully assembled
//! pipeline, and prints the response. The core is transport-agnostic; this
//! binary is one reference consumer of the interface-adapter contract.
//!
//! # Environment Variables
//!
//! - `SWITCHBOARD_CONFIG` — optional path to a YAML `RouterConfig` file
//! - `SWITCHBOARD_SESSION` — session identifier (default: "console")
//! - `RUST_LOG` — tracing filter (default: "info")
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin repl
//! ```

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};

use switchboard::capabilities::{
    CapabilityRegistry, CapabilitySelector, FallbackChatCapability, PatternCapability,
};
use switchboard::interfaces::{InMemoryStore, StaticArbiter};
use switchboard::layers::{
    ContextEnrichmentLayer, MemoryLayer, ResponseFilterLayer, SelectorLayer, SessionGateLayer,
};
use switchboard::{Pipeline, RequestMessage, RouterConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,switchboard=debug".into()),
        )
        .init();

    let config = match std::env::var("SWITCHBOARD_CONFIG") {
        Ok(path) => {
            tracing::info!("loading configuration from {path}");
            RouterConfig::from_yaml_file(&path)?
        }
        Err(_) => RouterConfig::default(),
    };
    let session = std::env::var("SWITCHBOARD_SESSION").unwrap_or_else(|_| "console".to_string());

    // Reference capabilities: two pattern matchers plus an arbiter-backed
    // fallback for everything else.
    let registry = Arc::new(CapabilityRegistry::new());
    registry.register(
        PatternCapability::builder("greeting")
            .description("Greets the user and handles salutations")
            .pattern(r"(?i)^(hi|hello|hey|good (morning|afternoon|evening))\b")?
            .reply("Hello! How can I help?")
            .build(),
    )?;
    registry.register(
        PatternCapability::builder("help")
            .description("Explains what this assistant can do")
            .pattern(r"(?i)\b(help|what can you do)\b")?
            .reply("I route your messages to whichever capability fits best.")
            .build(),
    )?;
    registry.register(Arc::new(FallbackChatCapability::new(
        "smalltalk",
        "General conversation when nothing else fits",
    )))?;

    let selector = CapabilitySelector::new(registry, config.selector.clone())
        .with_arbiter(Arc::new(StaticArbiter::new("smalltalk")));

    let gate = SessionGateLayer::new();
    gate.allow(&session, "local-user");

    let store = InMemoryStore::new();
    let pipeline = Pipeline::builder()
        .layer(Arc::new(gate))
        .layer(Arc::new(ContextEnrichmentLayer::new(
            config.static_context.clone(),
        )))
        .layer(Arc::new(MemoryLayer::new(store.clone())))
        .layer(Arc::new(ResponseFilterLayer::from_config(&config.filter)?))
        .layer(Arc::new(SelectorLayer::new(selector)))
        .build();

    tracing::info!(
        "switchboard {} ready, session '{}', {} layers; /quit to exit",
        switchboard::VERSION,
        session,
        pipeline.layer_count()
    );

    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim().to_string();
        if line.is_empty() {
            continue;
        }
        if line == "/quit" {
            break;
        }
        let request = RequestMessage::new(session.clone(), line);
        let response = pipeline.handle(request).await;
        println!("[{:?}] {}", response.status, response.content);
    }

    tracing::info!("session closed after {} exchanges", store.len());
    Ok(())
}

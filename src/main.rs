use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use webcall_token::provider::retell::RetellClient;
use webcall_token::provider::{CreateWebCallRequest, WebCallProvider};
use webcall_token::{cli, config, server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // CLI first so --help and --version work with a broken configuration;
    // .env is read up front because clap resolves RETELL_AGENT_ID from it.
    dotenvy::dotenv().ok();
    let args = cli::Cli::parse();

    init_tracing()?;
    let cfg = config::load()?;

    let result = match args.command {
        Some(cli::Commands::Serve { port }) => {
            let port = port.unwrap_or(cfg.port);
            server::run(cfg, port).await
        }
        Some(cli::Commands::CreateWebCall { agent_id }) => create_web_call(&cfg, agent_id).await,
        None => {
            let port = cfg.port;
            server::run(cfg, port).await
        }
    };

    if let Err(ref e) = result {
        eprintln!("Error: {:?}", e);
    }
    result
}

/// Console logging filtered by RUST_LOG, JSON when LOG_FORMAT=json, and OTLP
/// export when OTEL_EXPORTER_OTLP_ENDPOINT is set.
fn init_tracing() -> anyhow::Result<()> {
    use opentelemetry::KeyValue;
    use opentelemetry_sdk::{trace as sdktrace, Resource};

    let telemetry_layer = if std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT").is_ok() {
        let tracer = opentelemetry_otlp::new_pipeline()
            .tracing()
            .with_exporter(opentelemetry_otlp::new_exporter().tonic())
            .with_trace_config(sdktrace::config().with_resource(Resource::new(vec![
                KeyValue::new("service.name", "webcall-token"),
            ])))
            .install_batch(opentelemetry_sdk::runtime::Tokio)
            .context("failed to install OpenTelemetry tracer")?;
        Some(tracing_opentelemetry::layer().with_tracer(tracer))
    } else {
        None
    };

    let json_logs = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    let (plain_layer, json_layer) = if json_logs {
        (None, Some(tracing_subscriber::fmt::layer().json()))
    } else {
        (Some(tracing_subscriber::fmt::layer()), None)
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "webcall_token=debug,tower_http=debug".into()),
        ))
        .with(plain_layer)
        .with(json_layer)
        .with(telemetry_layer)
        .init();

    Ok(())
}

async fn create_web_call(cfg: &config::Config, agent_id: String) -> anyhow::Result<()> {
    let key = cfg
        .retell_api_key
        .clone()
        .context("RETELL_API_KEY is not set")?;
    let client = RetellClient::new(key, &cfg.retell_base_url)?;

    let call = client
        .create_web_call(&CreateWebCallRequest::new(agent_id))
        .await
        .context("Retell API error")?;

    tracing::info!(call_id = call.call_id.as_deref().unwrap_or("-"), "Web call created");
    println!("{}", serde_json::json!({ "access_token": call.access_token }));
    Ok(())
}

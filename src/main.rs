use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tradein_lead_api::app::{routes, with_cross_origin, with_rate_limit};
use tradein_lead_api::backup_client::WebhookBackupClient;
use tradein_lead_api::config::Config;
use tradein_lead_api::dispatcher::{BackupTransport, EmailTransport};
use tradein_lead_api::email_client::EmailApiClient;
use tradein_lead_api::handlers::AppState;
use tradein_lead_api::pipeline::LeadPipeline;

/// Main entry point for the application.
///
/// Initializes logging, loads configuration, builds the email and backup
/// transports, wires the lead pipeline and starts the Axum server with
/// per-IP rate limiting.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tradein_lead_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    let timeout = Duration::from_secs(config.http_timeout_secs);

    let email: Arc<dyn EmailTransport> = Arc::new(EmailApiClient::new(
        config.email_api_base_url.clone(),
        config.email_api_key.clone(),
        timeout,
    )?);
    tracing::info!("✓ Email client initialized: {}", config.email_api_base_url);

    let backup: Option<Arc<dyn BackupTransport>> = match &config.backup_webhook_url {
        Some(url) => {
            let client = WebhookBackupClient::new(
                url.clone(),
                config.backup_webhook_secret.clone(),
                timeout,
            )?;
            tracing::info!("✓ Backup webhook client initialized");
            Some(Arc::new(client) as Arc<dyn BackupTransport>)
        }
        None => None,
    };

    let pipeline = LeadPipeline::from_config(&config, email, backup);
    let port = config.port;

    // Rate limiting sits inside the CORS layers so 429s stay readable cross-origin
    let app_state = Arc::new(AppState { config, pipeline });
    let app = with_cross_origin(with_rate_limit(
        routes(app_state.clone()),
        &app_state.config,
    )?);

    // Start server
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

//! API gateway for the payment ledger

use std::sync::Arc;

use clap::Parser;
use dotenv::dotenv;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::{debug, info, warn, Level};
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter, FmtSubscriber};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use api_gateway::{app, AppState};
use ledger_service::{BalanceService, LedgerConfig, PostgresLedgerStore};

/// API documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        api_gateway::api::account::health,
        api_gateway::api::account::get_balance,
        api_gateway::api::account::topup,
        api_gateway::api::account::withdraw,
        api_gateway::api::account::label_entry,
    ),
    components(
        schemas(
            api_gateway::api::account::TopupRequest,
            api_gateway::api::account::WithdrawRequest,
            api_gateway::api::account::LabelEntryRequest,
            api_gateway::api::account::BalanceData,
            api_gateway::api::response::ResponseStatus,
            api_gateway::api::response::ApiResponse<api_gateway::api::account::BalanceData>,
            common::model::ledger::AccountBalance,
            common::model::ledger::TransactionEntry,
        )
    ),
    tags(
        (name = "account", description = "Account balance and transaction log endpoints")
    ),
    info(
        title = "Payment Ledger API",
        version = "1.0.0",
        description = "API for managing account balances with an append-only transaction log"
    )
)]
struct ApiDoc;

/// Payment ledger API server
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Listening address
    #[clap(short, long, default_value = "127.0.0.1:8080")]
    addr: String,

    /// Use an in-memory store instead of PostgreSQL
    #[clap(long)]
    in_memory: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenv().ok();

    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging with debug level when DEBUG=1 env var is set
    let env = std::env::var("DEBUG").unwrap_or_else(|_| "0".to_string());
    let log_level = if env == "1" { Level::DEBUG } else { Level::INFO };

    let env_filter = EnvFilter::builder()
        .with_default_directive(log_level.into())
        .parse("tower_http=debug,api_gateway=debug,ledger_service=debug")?;

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    debug!("Debug logging enabled");

    // Initialize the balance service over the chosen store
    let balance_service = if args.in_memory {
        warn!("Using in-memory ledger store; state will not survive a restart");
        Arc::new(BalanceService::new())
    } else {
        let config = LedgerConfig::from_env();
        let store = PostgresLedgerStore::with_config(&config).await?;
        common::db::run_migrations(store.pool()).await?;
        Arc::new(BalanceService::with_store(Arc::new(store)))
    };

    // Create app state
    let state = Arc::new(AppState { balance_service });

    // Set up CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Set up Swagger UI
    let swagger_ui = SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi());

    // Combine all routes
    let router = app(state)
        .merge(swagger_ui)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(log_level))
                .on_request(DefaultOnRequest::new().level(log_level))
                .on_response(DefaultOnResponse::new().level(log_level)),
        );

    // Start the server
    let addr: std::net::SocketAddr = args.addr.parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!("Listening on {}", addr);

    // Run until interrupt signal
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown");
}

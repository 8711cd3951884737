use std::net::SocketAddr;
use std::path::PathBuf;

use axum::{
    http::{HeaderValue, Method},
    routing::get,
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod ai;
mod auth;
mod config;
mod db;
mod domain;
mod error;
mod routes;
mod storage;

use ai::{AssistantService, GenerativeClient};
use auth::AuthService;
use config::Config;
use db::DbConnection;
use domain::{
    BudgetService, ExportService, GoalService, MemberService, ReportService, TransactionService,
};
use storage::PreferenceRepository;

/// Application state shared across handlers. Services are cheap to clone;
/// they all share the one connection pool underneath.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub auth: AuthService,
    pub members: MemberService,
    pub transactions: TransactionService,
    pub goals: GoalService,
    pub budgets: BudgetService,
    pub reports: ReportService,
    pub export: ExportService,
    pub preferences: PreferenceRepository,
    /// None when no generative API key is configured; the assistant routes
    /// then answer 503 while everything else keeps working.
    pub assistant: Option<AssistantService>,
}

impl AppState {
    pub fn new(db: DbConnection, config: Config) -> Self {
        let members = MemberService::new(db.clone());
        let assistant = config.assistant.api_key.clone().map(|key| {
            AssistantService::new(
                GenerativeClient::new(key, config.assistant.model.clone()),
                db.clone(),
            )
        });

        Self {
            auth: AuthService::new(db.clone(), members.clone(), config.auth.clone()),
            members,
            transactions: TransactionService::new(db.clone()),
            goals: GoalService::new(db.clone()),
            budgets: BudgetService::new(db.clone()),
            reports: ReportService::new(db.clone()),
            export: ExportService::new(db.clone()),
            preferences: PreferenceRepository::new(db),
            assistant,
            config,
        }
    }

    /// State over a fresh in-memory database, without an assistant key.
    #[cfg(test)]
    pub async fn for_tests() -> Self {
        let db = DbConnection::init_test()
            .await
            .expect("Failed to create test database");
        let config = Config {
            server: config::ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                frontend_url: "http://localhost:8080".to_string(),
                static_dir: "static".to_string(),
            },
            database: config::DatabaseConfig {
                url: "sqlite::memory:".to_string(),
            },
            auth: config::AuthConfig {
                jwt_secret: "test-secret".to_string(),
                token_expiry_hours: 24,
            },
            assistant: config::AssistantConfig {
                api_key: None,
                model: "test-model".to_string(),
            },
        };
        Self::new(db, config)
    }
}

fn api_router() -> Router<AppState> {
    Router::new()
        .nest("/auth", routes::auth::router())
        .nest("/members", routes::members::router())
        .nest("/transactions", routes::transactions::router())
        .nest("/goals", routes::goals::router())
        .nest("/budgets", routes::budgets::router())
        .nest("/reports", routes::reports::router())
        .nest("/assistant", routes::assistant::router())
        .nest("/preferences", routes::preferences::router())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "family_finance_backend=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    info!("Setting up database");
    let db = DbConnection::new(&config.database.url).await?;

    if config.assistant.api_key.is_none() {
        warn!("GEMINI_API_KEY is not set; assistant features are disabled");
    }

    let state = AppState::new(db, config);

    // CORS setup so the browser frontend can make requests
    let cors = CorsLayer::new()
        .allow_origin(state.config.server.frontend_url.parse::<HeaderValue>()?)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    let addr: SocketAddr =
        format!("{}:{}", state.config.server.host, state.config.server.port).parse()?;
    let static_dir = PathBuf::from(&state.config.server.static_dir);

    // Data routes under /api, the built SPA bundle as the fallback
    let app = Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/api", api_router())
        .fallback_service(ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state);

    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

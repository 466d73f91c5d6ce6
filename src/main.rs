use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use correction_backend::{
    config::{get_config, init_config, LogFormat},
    routes, AppState,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_config()?;
    let config = get_config();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt().json().with_env_filter(filter).init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }

    let app_state = AppState::new(config);

    let base_routes = Router::new()
        .route("/health", get(routes::health::health))
        .route(
            "/api/question-types",
            get(routes::templates::list_question_types),
        );

    let template_api = Router::new()
        .route(
            "/api/templates",
            get(routes::templates::list_templates).post(routes::templates::create_template),
        )
        .route(
            "/api/templates/validate",
            post(routes::templates::validate_template),
        )
        .route(
            "/api/templates/import",
            post(routes::templates::import_template),
        )
        .route(
            "/api/templates/examples/:kind",
            post(routes::templates::create_example_template),
        )
        .route(
            "/api/templates/:id",
            get(routes::templates::get_template).delete(routes::templates::delete_template),
        )
        .route(
            "/api/templates/:id/duplicate",
            post(routes::templates::duplicate_template),
        )
        .route(
            "/api/templates/:id/questions/:question_id",
            delete(routes::templates::delete_question),
        );

    let correction_api = Router::new()
        .route(
            "/api/correct/single",
            post(routes::correction::correct_single),
        )
        .route("/api/correct/batch", post(routes::correction::correct_batch))
        .route("/api/results", get(routes::correction::list_results))
        .route(
            "/api/results/:id/report",
            get(routes::correction::get_report),
        )
        .route(
            "/api/analytics/:template_id",
            get(routes::reports::class_analytics),
        )
        .route("/api/reports/summary", get(routes::reports::summary))
        .route("/api/export/:format", get(routes::export::export_results));

    let app = base_routes
        .merge(template_api)
        .merge(correction_api)
        .with_state(app_state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(config.body_limit_bytes));

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

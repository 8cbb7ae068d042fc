use actix_cors::Cors;
use actix_web::middleware::{Compress, Logger};
use actix_web::{http::header, web, App, HttpServer};
use actix_web_prometheus::PrometheusMetricsBuilder;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

pub mod api;
pub mod auth;
pub mod config;
pub mod document;
pub mod export;
pub mod panel;
pub mod report;
pub mod state;
pub mod store;

pub use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error_type: &str, message: &str) -> Self {
        Self {
            error: error_type.to_string(),
            message: message.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn not_found(message: &str) -> Self {
        Self::new("NotFound", message)
    }

    pub fn bad_request(message: &str) -> Self {
        Self::new("BadRequest", message)
    }

    pub fn conflict(message: &str) -> Self {
        Self::new("Conflict", message)
    }

    pub fn bad_gateway(message: &str) -> Self {
        Self::new("BadGateway", message)
    }

    pub fn internal_error(message: &str) -> Self {
        Self::new("InternalServerError", message)
    }
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::auth::handlers::api_login,
        crate::api::handlers::list_reports,
        crate::api::handlers::get_report,
        crate::api::handlers::update_status,
        crate::api::handlers::delete_report,
        crate::api::handlers::report_pdf,
        crate::export::handlers::export_status,
    ),
    components(
        schemas(
            report::Report,
            report::Floor,
            report::ReportStatus,
            api::handlers::StatusUpdateRequest,
            auth::LoginRequest,
            auth::TokenResponse,
            export::ExportSnapshot,
            ErrorResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Reports", description = "Technical visit report endpoints."),
        (name = "PDF Export", description = "Progress of PDF exports started from the panel."),
        (name = "Authentication", description = "Administrator sign-in.")
    ),
    servers(
        (url = "http://127.0.0.1:8080", description = "Local server")
    )
)]
pub struct ApiDoc;

/// Every panel, viewer and API route. Shared by the server and the test suites.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.configure(auth::handlers::config)
        .configure(panel::config)
        .configure(export::handlers::config)
        .service(web::scope("/api").configure(api::config));
}

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok(); // Load .env file
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = config::AppConfig::from_env().context("Invalid configuration")?;
    let app_state = web::Data::new(
        AppState::from_config(&config).context("Failed to initialise application state")?,
    );

    let prometheus = PrometheusMetricsBuilder::new("kony_admin_server")
        .endpoint("/metrics")
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to create Prometheus metrics middleware: {}", e))?;

    let bind = (config.bind_addr.clone(), config.port);
    log::info!("Starting server at http://{}:{}", bind.0, bind.1);

    HttpServer::new(move || {
        let app_state = app_state.clone();
        let prometheus = prometheus.clone();
        let cors = Cors::default()
            .allowed_origin("http://localhost:5173")
            .allowed_origin("http://localhost:3000")
            .allowed_origin("http://localhost:8080")
            .allowed_origin("http://127.0.0.1:8080")
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                header::AUTHORIZATION,
                header::ACCEPT,
                header::CONTENT_TYPE,
            ])
            .supports_credentials()
            .max_age(3600);

        App::new()
            .wrap(Compress::default())
            .wrap(Logger::new("%r %s %Dms"))
            .wrap(prometheus)
            .wrap(cors)
            .app_data(app_state)
            .configure(configure)
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
    })
    .keep_alive(actix_web::http::KeepAlive::Os)
    .bind(bind)
    .context("Failed to bind the HTTP listener")?
    .run()
    .await
    .context("HTTP server terminated with an error")
}

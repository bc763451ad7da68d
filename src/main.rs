use actix_web::{get, web, App, HttpResponse, HttpServer, Responder};
use diesel::connection::SimpleConnection;
use diesel::pg::PgConnection;
use diesel::r2d2::{self, ConnectionManager};
use diesel::Connection;
use log::{error, info};
use serde_json::json;
use std::env;

use zanzitours::config::{AppConfig, DB_INIT_SQL};
use zanzitours::handlers;
use zanzitours::logger::setup_logger;
use zanzitours::middleware::{AuthGate, RequestLogger};

#[get("/health")]
async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables and initialize logger
    dotenvy::dotenv().ok();
    setup_logger();

    // Get host and port from environment or use defaults
    let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = env::var("PORT")
        .unwrap_or_else(|_| "8080".to_string())
        .parse::<u16>()
        .expect("PORT must be a number");

    // Connecting to database
    let db_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    info!("Connecting to database");

    // Initialize database schema
    let mut conn = PgConnection::establish(&db_url)
        .expect("Failed to establish connection for schema setup");
    conn.batch_execute(DB_INIT_SQL)
        .expect("Failed to execute database initialization script");
    info!("Database initialization complete.");

    // Set up database connection pool
    let manager = ConnectionManager::<PgConnection>::new(db_url);
    let pool = r2d2::Pool::builder()
        .build(manager)
        .expect("Failed to create database connection pool");

    // Load and validate configuration
    let config = AppConfig::from_env();
    if let Err(e) = config.validate() {
        error!("Configuration validation error: {}", e);
        panic!("Invalid configuration: {}", e);
    }

    info!("Starting HTTP server at http://{}:{}", host, port);

    // Start HTTP server
    HttpServer::new(move || {
        App::new()
            // Register app data
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(config.clone()))
            // Session-refreshing auth gate, then the request logger outermost
            .wrap(AuthGate)
            .wrap(RequestLogger)
            .service(health_check)
            // Public views
            .service(handlers::tours::list_tours)
            .service(handlers::tours::tour_detail)
            .service(handlers::news::list_news)
            // Auth flows
            .service(handlers::auth::signup)
            .service(handlers::auth::login)
            .service(handlers::auth::logout)
            .service(handlers::auth::refresh_token)
            .service(handlers::auth::reset_password)
            // Session-gated pages
            .service(handlers::profile::get_profile)
            .service(handlers::profile::update_profile)
            .service(handlers::bookings::submit_booking)
            .service(handlers::bookings::my_bookings)
            // Admin back-office
            .service(handlers::admin::dashboard_stats)
            .service(handlers::admin::list_bookings)
            .service(handlers::admin::update_booking_status)
            .service(handlers::admin::list_tours)
            .service(handlers::admin::create_tour)
            .service(handlers::admin::update_tour)
            .service(handlers::admin::delete_tour)
            .service(handlers::admin::list_news)
            .service(handlers::admin::create_news)
            .service(handlers::admin::update_news)
            .service(handlers::admin::delete_news)
            .service(handlers::admin::list_users)
            .service(handlers::admin::list_reviews)
            .service(handlers::admin::activity_log)
    })
    .workers(2)
    .keep_alive(std::time::Duration::from_secs(75))
    .shutdown_timeout(30)
    .bind((host, port))?
    .run()
    .await
}

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, get, post, put},
};
use moto_community_backend::{
    AppState,
    config::Config,
    middleware::{RateLimiter, auth_middleware, log_errors, rate_limit},
    routes,
    services::storage::MediaStorage,
};
use sqlx::Executor;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().expect("Failed to load configuration");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                conn.execute("SET application_name = 'moto_community_backend';")
                    .await?;
                Ok(())
            })
        })
        .connect(&config.database_url)
        .await
        .expect("Failed to connect to Postgres");

    let redis_client =
        redis::Client::open(config.redis_url.clone()).expect("Failed to create Redis client");
    let redis_arc = Arc::new(redis_client.clone());

    let http = reqwest::Client::new();
    let storage = MediaStorage::from_config(&config).await;

    let state = AppState {
        pool,
        config: config.clone(),
        redis: redis_arc,
        http,
        storage,
    };

    let rate_limiter = Arc::new(RateLimiter::new(redis_client, config.clone()));

    let public_routes = Router::new()
        .route("/auth/telegram", post(routes::auth::telegram_auth))
        .route("/auth/logout", post(routes::auth::logout))
        .route("/content", get(routes::content::list_content))
        .route("/orgs", get(routes::orgs::list_organizations))
        .route("/weather", get(routes::weather::get_weather))
        .route("/telegram/stats", get(routes::telegram::telegram_stats))
        .route("/media/upload", post(routes::media::upload_media))
        // Legacy admin panel: its own password + JWT, no user session involved.
        .route("/admin/password", get(routes::admin::admin_password_status))
        .route(
            "/admin/password",
            post(routes::admin::setup_or_verify_admin_password),
        )
        .route("/admin/password", put(routes::admin::change_admin_password))
        .route("/admin/legacy-stats", get(routes::admin::legacy_stats));

    let protected_routes = Router::new()
        .route("/auth/me", get(routes::auth::get_me))
        .route("/profile", get(routes::profile::get_profile))
        .route("/profile", put(routes::profile::update_profile))
        .route("/profile/favorites", post(routes::profile::add_favorite))
        .route("/profile/favorites", delete(routes::profile::remove_favorite))
        .route("/garage", get(routes::garage::list_vehicles))
        .route("/garage", post(routes::garage::create_vehicle))
        .route("/garage/{id}", put(routes::garage::update_vehicle))
        .route("/garage/{id}", delete(routes::garage::delete_vehicle))
        .route("/friends", get(routes::friends::list_friends))
        .route("/friends/requests", post(routes::friends::send_request))
        .route(
            "/friends/requests/{id}/respond",
            post(routes::friends::respond_to_request),
        )
        .route("/friends/{id}", delete(routes::friends::delete_friendship))
        .route("/content", post(routes::content::create_content))
        .route("/content", put(routes::content::update_content))
        .route("/content", delete(routes::content::delete_content))
        .route("/admin/users", get(routes::admin::list_users))
        .route("/admin/users/role", put(routes::admin::update_role))
        .route("/admin/users/{id}/status", put(routes::admin::set_user_status))
        .route("/admin/users/{id}", delete(routes::admin::delete_user))
        .route("/admin/stats", get(routes::admin::get_stats))
        .route("/admin/activity", post(routes::admin::log_activity))
        .route("/admin/activity", get(routes::admin::user_activity))
        .route("/sellers/me", get(routes::sellers::seller_info))
        .route("/sellers/products", post(routes::sellers::create_product))
        .route("/sellers/products/{id}", put(routes::sellers::update_product))
        .route(
            "/sellers/products/{id}",
            delete(routes::sellers::delete_product),
        )
        .route("/sellers/assign", post(routes::sellers::assign_seller))
        .route("/sellers/revoke", post(routes::sellers::revoke_seller))
        .route("/sellers", get(routes::sellers::list_sellers))
        .route("/orgs/requests", post(routes::orgs::submit_request))
        .route("/orgs/requests", get(routes::orgs::list_requests))
        .route(
            "/orgs/requests/{id}/approve",
            post(routes::orgs::approve_request),
        )
        .route(
            "/orgs/requests/{id}/reject",
            post(routes::orgs::reject_request),
        )
        .route("/telegram/notify-ceos", post(routes::telegram::notify_ceos))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let router = Router::new().merge(public_routes).merge(protected_routes);

    let router = router.layer(axum::middleware::from_fn(log_errors)).layer(
        axum::middleware::from_fn_with_state(rate_limiter, rate_limit),
    );

    let router = router.layer(CorsLayer::permissive());

    let app = router.with_state(state.clone());

    let addr = SocketAddr::new(
        state.config.server_host.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid server_host, falling back to dual-stack default");
            IpAddr::V6(std::net::Ipv6Addr::UNSPECIFIED)
        }),
        state.config.server_port,
    );
    tracing::info!("Server listening on {}", addr);
    axum::serve(
        tokio::net::TcpListener::bind(&addr)
            .await
            .expect("Failed to bind"),
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("Failed to start server");
}

use axum::{
    http::{HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

use crate::config::SecurityConfig;
use crate::handlers::{elevated, protected, public};
use crate::middleware::{jwt_auth_middleware, root_access_middleware, validate_user_middleware};
use crate::state::AppState;

/// The full HTTP application
pub fn app(state: AppState) -> Router {
    let config = state.config;

    let mut router = Router::new()
        // Public
        .route("/", get(public::root))
        .route("/health", get(public::health))
        // Protected API
        .merge(protected_routes(&state))
        // Master admin API
        .merge(root_routes(&state))
        .layer(RequestBodyLimitLayer::new(config.api.max_request_size_bytes))
        .layer(cors_layer(&config.security));

    if config.api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }

    router.with_state(state)
}

fn protected_routes(state: &AppState) -> Router<AppState> {
    use protected::{activity, documents, folders, me, notifications, users};

    Router::new()
        .route("/api/me", get(me::me_get).patch(me::me_update))
        // Folders
        .route("/api/folders", get(folders::folder_list).post(folders::folder_create))
        .route(
            "/api/folders/:id",
            get(folders::folder_show)
                .patch(folders::folder_update)
                .delete(folders::folder_delete),
        )
        .route("/api/folders/:id/contents", get(folders::folder_contents))
        .route("/api/folders/:id/restore", post(folders::folder_restore))
        // Documents
        .route("/api/documents", get(documents::document_list).post(documents::document_create))
        .route(
            "/api/documents/:id",
            get(documents::document_show)
                .patch(documents::document_update)
                .delete(documents::document_delete),
        )
        .route("/api/documents/:id/restore", post(documents::document_restore))
        .route("/api/documents/:id/purge", axum::routing::delete(documents::document_purge))
        // Notifications
        .route("/api/notifications", get(notifications::notification_list))
        .route("/api/notifications/unread-count", get(notifications::notification_unread_count))
        .route("/api/notifications/read-all", post(notifications::notification_read_all))
        .route("/api/notifications/:id/read", post(notifications::notification_read))
        // Tenant administration
        .route("/api/users", get(users::user_list).post(users::user_create))
        .route("/api/users/:id", get(users::user_show).patch(users::user_update))
        .route("/api/activity", get(activity::activity_list))
        // Outermost layer runs first: token, then user
        .route_layer(from_fn_with_state(state.clone(), validate_user_middleware))
        .route_layer(from_fn(jwt_auth_middleware))
}

fn root_routes(state: &AppState) -> Router<AppState> {
    use elevated::root::tenant;

    Router::new()
        .route("/api/root/tenants", get(tenant::tenant_list).post(tenant::tenant_create))
        .route(
            "/api/root/tenants/:id",
            get(tenant::tenant_show)
                .patch(tenant::tenant_update)
                .delete(tenant::tenant_delete),
        )
        .route("/api/root/tenants/:id/restore", post(tenant::tenant_restore))
        .route_layer(from_fn(root_access_middleware))
        .route_layer(from_fn_with_state(state.clone(), validate_user_middleware))
        .route_layer(from_fn(jwt_auth_middleware))
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if !security.enable_cors {
        return CorsLayer::new();
    }

    if security.cors_origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers(Any)
}

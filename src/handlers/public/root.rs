// handlers/public/root.rs - GET / service information

use axum::response::Json;
use serde_json::{json, Value};

pub async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "DocVault API",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Multi-tenant document management backend",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "me": "/api/me (protected)",
                "folders": "/api/folders[/:id[/contents|/restore]] (protected)",
                "documents": "/api/documents[/:id[/restore|/purge]] (protected)",
                "notifications": "/api/notifications (protected)",
                "users": "/api/users[/:id] (protected, tenant admin)",
                "activity": "/api/activity (protected, tenant admin)",
                "root": "/api/root/tenants[/:id] (restricted, master admin)",
            }
        }
    }))
}

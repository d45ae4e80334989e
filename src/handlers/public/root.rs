// handlers/public/root.rs - GET / handler

use axum::{extract::State, response::Json};
use serde_json::{json, Value};

use crate::app::AppState;

/// GET / - service info, branding and the checkout link for independent clinics
pub async fn root(State(state): State<AppState>) -> Json<Value> {
    let config = &state.config;

    Json(json!({
        "name": "Receptionist API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": env!("CARGO_PKG_DESCRIPTION"),
        "branding": {
            "appTitle": config.branding.app_title,
            "appLogo": config.branding.app_logo,
        },
        "billing": {
            "checkoutLink": config.billing.checkout_link,
        },
        "endpoints": {
            "health": "/health (public)",
            "login": "/auth/login (public)",
            "signup": "/api/signup/independent-clinic (public)",
            "webhooks": "/api/webhooks/paddle (signed)",
            "me": "/api/me (protected)",
            "guard": "/api/guard?path= (optional token)",
            "provision": "/api/provision/managed-clinic (agency admin)",
            "agencies": "/api/agencies/:agencyId[/clinics[/:clinicId]] (agency admin)",
            "clinics": "/api/clinics/:clinicId[/calls] (clinic or owning agency)",
            "subscriptions": "/api/subscriptions/cancel, /api/subscriptions/:ownerType/:ownerId (billing owner)",
        }
    }))
}

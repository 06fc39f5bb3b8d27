//! # Identity Resolution
//!
//! Token verification lives at the gateway; by the time a request reaches
//! this service the caller's account id arrives in the `X-Account-Id`
//! header. The extractor resolves it to a persisted account and exposes
//! role checks for the admin and business surfaces.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use sea_orm::DatabaseConnection;
use utoipa::IntoParams;

use crate::error::{ApiError, forbidden, validation_error};
use crate::models::account;
use crate::models::status::AccountType;
use crate::repositories::AccountRepository;
use crate::server::AppState;

/// Header parameter description for the OpenAPI docs.
#[derive(Debug, serde::Deserialize, IntoParams)]
#[into_params(parameter_in = Header)]
pub struct AccountHeader {
    /// Authenticated account id, injected by the gateway
    #[serde(rename = "X-Account-Id")]
    #[param(rename = "X-Account-Id", value_type = i64)]
    pub account_id: String,
}

/// The resolved caller identity.
#[derive(Debug, Clone)]
pub struct CurrentAccount(pub account::Model);

impl CurrentAccount {
    pub fn id(&self) -> i64 {
        self.0.id
    }

    pub fn is_admin(&self) -> bool {
        self.0.role == "admin"
    }

    pub fn is_business(&self) -> bool {
        self.0
            .type_account
            .parse::<AccountType>()
            .is_ok_and(|t| t == AccountType::Business)
    }

    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(forbidden(None))
        }
    }

    pub fn require_business(&self) -> Result<(), ApiError> {
        if self.is_business() {
            Ok(())
        } else {
            Err(forbidden(None))
        }
    }
}

impl<S> FromRequestParts<S> for CurrentAccount
where
    DatabaseConnection: FromRef<S>,
    S: Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get("X-Account-Id")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                validation_error(
                    "Account context missing",
                    serde_json::json!({ "X-Account-Id": "header required" }),
                )
            })?;

        let account_id: i64 = raw.parse().map_err(|_| {
            validation_error(
                "Account context missing",
                serde_json::json!({ "X-Account-Id": "must be an integer" }),
            )
        })?;

        let db = DatabaseConnection::from_ref(state);
        let account = AccountRepository::new(db)
            .find_by_id(account_id)
            .await?
            .ok_or_else(|| forbidden(Some("Unknown account")))?;

        Ok(CurrentAccount(account))
    }
}

impl FromRef<AppState> for DatabaseConnection {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.db.clone()
    }
}

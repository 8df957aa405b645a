// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Token exchange gateway.
//!
//! The only component holding the Fitbit client secret. Each invocation
//! makes at most one upstream call and relays the upstream JSON; nothing is
//! retried or cached here.

use crate::error::AppError;
use crate::services::fitbit::{ClientCredentials, FitbitClient, FitbitResource, UpstreamResponse};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;

/// Raw gateway request body. Which fields are required depends on `action`.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct GatewayRequest {
    pub action: Option<String>,
    pub code: Option<String>,
    pub redirect_uri: Option<String>,
    pub refresh_token: Option<String>,
    #[serde(rename = "accessToken")]
    pub access_token: Option<String>,
    pub resource: Option<String>,
    pub date: Option<String>,
    /// Legacy full URL; must match a URL the server would build itself
    pub endpoint: Option<String>,
}

/// What a `fetch_data` call reads.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchTarget {
    Resource {
        resource: FitbitResource,
        date: NaiveDate,
    },
    Endpoint(String),
}

/// A validated gateway action.
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayAction {
    ExchangeToken { code: String, redirect_uri: String },
    RefreshToken { refresh_token: String },
    FetchData { access_token: String, target: FetchTarget },
}

impl GatewayAction {
    fn needs_client_secret(&self) -> bool {
        !matches!(self, GatewayAction::FetchData { .. })
    }
}

/// Empty strings count as missing.
fn present(field: Option<String>) -> Option<String> {
    field.filter(|v| !v.is_empty())
}

impl GatewayRequest {
    /// Validate the body into an action. Fails with 400 on an unknown
    /// action or a missing field.
    pub fn into_action(self) -> Result<GatewayAction, AppError> {
        match self.action.as_deref() {
            Some("exchange_token") => {
                match (present(self.code), present(self.redirect_uri)) {
                    (Some(code), Some(redirect_uri)) => {
                        Ok(GatewayAction::ExchangeToken { code, redirect_uri })
                    }
                    _ => Err(AppError::BadRequest(
                        "Missing code or redirect_uri".to_string(),
                    )),
                }
            }
            Some("refresh_token") => present(self.refresh_token)
                .map(|refresh_token| GatewayAction::RefreshToken { refresh_token })
                .ok_or_else(|| AppError::BadRequest("Missing refresh_token".to_string())),
            Some("fetch_data") => {
                let access_token = present(self.access_token);
                let target = match (
                    present(self.resource),
                    present(self.date),
                    present(self.endpoint),
                ) {
                    (Some(resource), Some(date), _) => {
                        Some(parse_resource_target(&resource, &date)?)
                    }
                    (None, None, Some(endpoint)) => Some(FetchTarget::Endpoint(endpoint)),
                    _ => None,
                };
                match (access_token, target) {
                    (Some(access_token), Some(target)) => Ok(GatewayAction::FetchData {
                        access_token,
                        target,
                    }),
                    _ => Err(AppError::BadRequest(
                        "Missing accessToken or endpoint".to_string(),
                    )),
                }
            }
            _ => Err(AppError::BadRequest("Invalid action".to_string())),
        }
    }
}

fn parse_resource_target(resource: &str, date: &str) -> Result<FetchTarget, AppError> {
    let resource: FitbitResource = serde_json::from_value(Value::String(resource.to_string()))
        .map_err(|_| AppError::BadRequest(format!("Unknown resource: {}", resource)))?;
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| AppError::BadRequest("Invalid date, expected YYYY-MM-DD".to_string()))?;
    Ok(FetchTarget::Resource { resource, date })
}

/// Gateway service: forwards the three actions to Fitbit.
#[derive(Clone)]
pub struct GatewayService {
    client: FitbitClient,
    credentials: Option<ClientCredentials>,
}

impl GatewayService {
    pub fn new(
        http: reqwest::Client,
        api_base: &str,
        credentials: Option<ClientCredentials>,
    ) -> Self {
        Self {
            client: FitbitClient::new(http, api_base),
            credentials,
        }
    }

    fn credentials(&self) -> Result<&ClientCredentials, AppError> {
        self.credentials.as_ref().ok_or(AppError::Misconfigured)
    }

    /// Handle one gateway request end to end.
    pub async fn dispatch(&self, request: GatewayRequest) -> Result<Value, AppError> {
        let action = request.into_action()?;
        if action.needs_client_secret() {
            self.credentials()?;
        }

        match action {
            GatewayAction::ExchangeToken { code, redirect_uri } => {
                self.exchange_token(&code, &redirect_uri).await
            }
            GatewayAction::RefreshToken { refresh_token } => {
                self.refresh_token(&refresh_token).await
            }
            GatewayAction::FetchData {
                access_token,
                target,
            } => self.fetch_data(&access_token, &target).await,
        }
    }

    /// Authorization-code grant. Any failure is reported as 500 with the
    /// upstream body as details.
    pub async fn exchange_token(&self, code: &str, redirect_uri: &str) -> Result<Value, AppError> {
        let credentials = self.credentials()?;

        let form = [
            ("client_id", credentials.client_id.as_str()),
            ("grant_type", "authorization_code"),
            ("redirect_uri", redirect_uri),
            ("code", code),
        ];

        let response = self
            .client
            .post_token_grant(credentials, &form)
            .await
            .map_err(|e| AppError::Upstream {
                status: 500,
                error: e.to_string(),
                details: None,
            })?;

        if !response.is_success() {
            tracing::warn!(status = response.status, "Fitbit code exchange failed");
            return Err(AppError::Upstream {
                status: 500,
                error: format!("Request failed with status code {}", response.status),
                details: details(response.body),
            });
        }

        tracing::info!("Fitbit code exchange succeeded");
        Ok(response.body)
    }

    /// Refresh-token grant. Failures keep the upstream status.
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<Value, AppError> {
        let credentials = self.credentials()?;

        let form = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ];

        let response = self
            .client
            .post_token_grant(credentials, &form)
            .await
            .map_err(|e| network_error("Failed to refresh token", e))?;

        relay(response, "Failed to refresh token")
    }

    /// One bearer GET for a permitted resource.
    pub async fn fetch_data(
        &self,
        access_token: &str,
        target: &FetchTarget,
    ) -> Result<Value, AppError> {
        let url = match target {
            FetchTarget::Resource { resource, date } => self.client.resource_url(*resource, *date),
            FetchTarget::Endpoint(endpoint) => {
                if self.client.resolve_endpoint(endpoint).is_none() {
                    tracing::warn!(endpoint = %endpoint, "Rejected fetch_data endpoint");
                    return Err(AppError::BadRequest("Endpoint not allowed".to_string()));
                }
                endpoint.clone()
            }
        };

        let response = self
            .client
            .get(&url, access_token)
            .await
            .map_err(|e| network_error("Failed to fetch data", e))?;

        if !response.is_success() {
            tracing::warn!(status = response.status, url = %url, "Fitbit data fetch failed");
        }
        relay(response, "Failed to fetch data")
    }

    pub async fn fetch_resource(
        &self,
        access_token: &str,
        resource: FitbitResource,
        date: NaiveDate,
    ) -> Result<Value, AppError> {
        self.fetch_data(access_token, &FetchTarget::Resource { resource, date })
            .await
    }
}

fn details(body: Value) -> Option<Value> {
    (!body.is_null()).then_some(body)
}

fn relay(response: UpstreamResponse, error: &str) -> Result<Value, AppError> {
    if response.is_success() {
        Ok(response.body)
    } else {
        Err(AppError::Upstream {
            status: response.status,
            error: error.to_string(),
            details: details(response.body),
        })
    }
}

fn network_error(error: &str, e: reqwest::Error) -> AppError {
    tracing::error!(error = %e, "Fitbit request failed");
    AppError::Upstream {
        status: 500,
        error: error.to_string(),
        details: Some(Value::String(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(body: Value) -> GatewayRequest {
        serde_json::from_value(body).unwrap()
    }

    fn bad_request_message(result: Result<GatewayAction, AppError>) -> String {
        match result {
            Err(AppError::BadRequest(msg)) => msg,
            other => panic!("expected bad request, got {:?}", other),
        }
    }

    #[test]
    fn test_exchange_requires_code_and_redirect() {
        let action = request(json!({
            "action": "exchange_token",
            "code": "abc",
            "redirect_uri": "http://localhost:5173/callback"
        }))
        .into_action()
        .unwrap();
        assert!(matches!(action, GatewayAction::ExchangeToken { .. }));

        let msg = bad_request_message(
            request(json!({"action": "exchange_token", "code": ""})).into_action(),
        );
        assert_eq!(msg, "Missing code or redirect_uri");
    }

    #[test]
    fn test_unknown_or_missing_action() {
        assert_eq!(
            bad_request_message(request(json!({"action": "delete_user"})).into_action()),
            "Invalid action"
        );
        assert_eq!(
            bad_request_message(request(json!({})).into_action()),
            "Invalid action"
        );
    }

    #[test]
    fn test_fetch_data_targets() {
        let action = request(json!({
            "action": "fetch_data",
            "accessToken": "T",
            "resource": "sleep",
            "date": "2024-05-01"
        }))
        .into_action()
        .unwrap();
        assert_eq!(
            action,
            GatewayAction::FetchData {
                access_token: "T".to_string(),
                target: FetchTarget::Resource {
                    resource: FitbitResource::Sleep,
                    date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
                },
            }
        );

        let msg = bad_request_message(
            request(json!({
                "action": "fetch_data",
                "accessToken": "T",
                "resource": "profile",
                "date": "2024-05-01"
            }))
            .into_action(),
        );
        assert_eq!(msg, "Unknown resource: profile");

        let msg = bad_request_message(
            request(json!({"action": "fetch_data", "endpoint": "https://api.fitbit.com/x"}))
                .into_action(),
        );
        assert_eq!(msg, "Missing accessToken or endpoint");
    }

    #[tokio::test]
    async fn test_missing_secret_short_circuits() {
        let gateway = GatewayService::new(reqwest::Client::new(), "http://127.0.0.1:9", None);
        let result = gateway
            .dispatch(request(json!({"action": "refresh_token", "refresh_token": "r"})))
            .await;
        assert!(matches!(result, Err(AppError::Misconfigured)));
    }

    #[tokio::test]
    async fn test_disallowed_endpoint_is_rejected_before_any_call() {
        // Port 9 (discard) is never contacted; rejection happens first
        let gateway = GatewayService::new(reqwest::Client::new(), "http://127.0.0.1:9", None);
        let result = gateway
            .dispatch(request(json!({
                "action": "fetch_data",
                "accessToken": "T",
                "endpoint": "http://169.254.169.254/computeMetadata/v1/"
            })))
            .await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }
}

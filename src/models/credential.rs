// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Fitbit OAuth credentials for one user.

use serde::{Deserialize, Serialize};

/// Stored Fitbit token pair.
///
/// Stored at: `users/{uid}/private/fitbit_tokens`
///
/// Written on a successful code exchange and overwritten wholesale on every
/// refresh. Nothing deletes it automatically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialRecord {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds, as reported by Fitbit
    pub expires_in: i64,
    /// Fitbit's encoded user ID
    #[serde(default)]
    pub user_id: Option<String>,
    /// Space-separated granted scopes
    #[serde(default)]
    pub scope: Option<String>,
    /// When this record was written (RFC3339)
    pub updated_at: String,
}

impl CredentialRecord {
    pub fn from_token_response(token: TokenResponse, updated_at: &str) -> Self {
        Self {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            expires_in: token.expires_in,
            user_id: token.user_id,
            scope: token.scope,
            updated_at: updated_at.to_string(),
        }
    }
}

/// Token endpoint response, for both the authorization-code and
/// refresh-token grants.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub expires_in: i64,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_from_token_response() {
        let token: TokenResponse = serde_json::from_value(serde_json::json!({
            "access_token": "at",
            "refresh_token": "rt",
            "expires_in": 28800,
            "user_id": "ABC123",
            "scope": "activity sleep heartrate",
            "token_type": "Bearer"
        }))
        .unwrap();

        let record = CredentialRecord::from_token_response(token, "2024-05-01T00:00:00Z");
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["accessToken"], "at");
        assert_eq!(json["refreshToken"], "rt");
        assert_eq!(json["expiresIn"], 28800);
        assert_eq!(json["userId"], "ABC123");
        assert_eq!(json["updatedAt"], "2024-05-01T00:00:00Z");
    }
}

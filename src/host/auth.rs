//! Claim extraction from the host-issued JWT. The token is decoded only to
//! drive local display logic (broadcaster gating); the signature is not
//! checked here, that belongs to a backend.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::Deserialize;
use std::str::FromStr;
use strum::EnumString;

/// Viewer roles carried in the token's `role` claim.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, EnumString)]
#[strum(serialize_all = "snake_case")]
pub(crate) enum Role {
    Broadcaster,
    Moderator,
    #[default]
    Viewer,
    External,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub(crate) struct Claims {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub opaque_user_id: Option<String>,
    #[serde(default)]
    pub channel_id: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum TokenError {
    /// Not three dot-separated segments.
    Malformed,
    /// Payload segment is not base64url.
    Encoding,
    /// Payload decoded but the claims are not a JSON object.
    Claims,
}

impl std::fmt::Display for TokenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenError::Malformed => write!(f, "token is not a JWT"),
            TokenError::Encoding => write!(f, "token payload is not base64url"),
            TokenError::Claims => write!(f, "token claims are not valid JSON"),
        }
    }
}

pub(crate) fn decode_claims(token: &str) -> Result<Claims, TokenError> {
    let mut parts = token.split('.');
    let (Some(_header), Some(payload), Some(_signature), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(TokenError::Malformed);
    };
    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|_| TokenError::Encoding)?;
    serde_json::from_slice(&bytes).map_err(|_| TokenError::Claims)
}

/// Auth state for the current viewer session.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct AuthState {
    token: Option<String>,
    opaque_id: Option<String>,
    user_id: Option<String>,
    role: Role,
}

impl AuthState {
    /// Decode and record a token delivered by the host. A token that fails
    /// to decode invalidates the whole state.
    pub fn set_token(&mut self, token: &str, opaque_id: &str) {
        match decode_claims(token) {
            Ok(claims) => {
                self.token = Some(token.to_string());
                self.opaque_id = Some(opaque_id.to_string());
                self.user_id = claims.user_id.or(claims.opaque_user_id);
                self.role = Role::from_str(&claims.role).unwrap_or_default();
            }
            Err(_) => {
                *self = Self::default();
            }
        }
    }

    pub fn is_broadcaster(&self) -> bool {
        self.role == Role::Broadcaster
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some() && self.opaque_id.is_some()
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }
}

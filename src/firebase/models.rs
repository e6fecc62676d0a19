use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Sign-in: POST /v1/accounts:signInWithPassword?key=API_KEY
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    /// Must be `true` for the response to carry an id token.
    pub return_secure_token: bool,
}

/// Payload of a successful sign-in.
///
/// Reference: <https://firebase.google.com/docs/reference/rest/auth#section-sign-in-email-password>
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInResponse {
    /// Firebase uid of the signed-in user.
    pub local_id: String,
    pub email: String,
    /// Short-lived bearer token for the Realtime Database `auth` parameter.
    pub id_token: String,
    pub refresh_token: String,
    /// Validity of `id_token` in **seconds**, sent as a string (e.g. `"3600"`).
    pub expires_in: String,
}

// ---------------------------------------------------------------------------
// Token refresh: POST /v1/token?key=API_KEY
// ---------------------------------------------------------------------------

/// Payload of a successful refresh. Unlike sign-in, the fields are snake_case.
#[derive(Debug, Deserialize)]
pub struct RefreshResponse {
    pub id_token: String,
    pub refresh_token: String,
    /// Seconds, sent as a string.
    pub expires_in: String,
}

/// Parse an `expiresIn` string into seconds.
pub fn parse_expires_in(raw: &str) -> Result<i64> {
    raw.trim()
        .parse()
        .with_context(|| format!("expiresIn is not a number of seconds: {raw:?}"))
}

// ---------------------------------------------------------------------------
// Realtime Database streaming events
//
// The REST streaming endpoint sends server-sent events:
//
//   event: put
//   data: {"path":"/","data":{"Temperature":22.5,...}}
//
//   event: patch
//   data: {"path":"/","data":{"Relay1_Status":1}}
//
//   event: keep-alive
//   data: null
//
// `cancel` carries a reason string when security rules deny the read;
// `auth_revoked` means the `auth` token is no longer valid.
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PathData {
    /// Path relative to the subscribed node; `/` is the node itself.
    pub path: String,
    pub data: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Put(PathData),
    Patch(PathData),
    KeepAlive,
    Cancel(String),
    AuthRevoked,
    /// An event type this client does not know; ignored.
    Unknown(String),
}

impl StreamEvent {
    pub fn parse(event: &str, data: &str) -> Result<Self> {
        Ok(match event {
            "put" => Self::Put(
                serde_json::from_str(data).context("Failed to deserialize put event")?,
            ),
            "patch" => Self::Patch(
                serde_json::from_str(data).context("Failed to deserialize patch event")?,
            ),
            "keep-alive" => Self::KeepAlive,
            "cancel" => Self::Cancel(reason_text(data)),
            "auth_revoked" => Self::AuthRevoked,
            other => Self::Unknown(other.to_owned()),
        })
    }
}

/// `cancel` data is usually a JSON string; fall back to the raw text.
fn reason_text(data: &str) -> String {
    match serde_json::from_str::<Value>(data) {
        Ok(Value::String(s)) => s,
        Ok(Value::Null) => "no reason given".to_owned(),
        _ if data.trim().is_empty() => "no reason given".to_owned(),
        _ => data.trim().to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn sign_in_request_uses_camel_case() {
        let body = serde_json::to_value(SignInRequest {
            email: "a@b.c",
            password: "pw",
            return_secure_token: true,
        })
        .unwrap();
        assert_eq!(
            body,
            json!({ "email": "a@b.c", "password": "pw", "returnSecureToken": true })
        );
    }

    #[test]
    fn sign_in_response_deserializes() {
        let r: SignInResponse = serde_json::from_value(json!({
            "kind": "identitytoolkit#VerifyPasswordResponse",
            "localId": "uid-1",
            "email": "a@b.c",
            "displayName": "",
            "idToken": "id",
            "registered": true,
            "refreshToken": "rt",
            "expiresIn": "3600"
        }))
        .unwrap();
        assert_eq!(r.local_id, "uid-1");
        assert_eq!(parse_expires_in(&r.expires_in).unwrap(), 3600);
    }

    #[test]
    fn refresh_response_deserializes() {
        let r: RefreshResponse = serde_json::from_value(json!({
            "access_token": "at",
            "expires_in": "3600",
            "token_type": "Bearer",
            "refresh_token": "rt2",
            "id_token": "id2",
            "user_id": "uid-1",
            "project_id": "123"
        }))
        .unwrap();
        assert_eq!(r.id_token, "id2");
        assert_eq!(r.refresh_token, "rt2");
    }

    #[test]
    fn parse_put_event() {
        let e = StreamEvent::parse("put", r#"{"path":"/","data":{"Temperature":22.5}}"#).unwrap();
        assert_eq!(
            e,
            StreamEvent::Put(PathData {
                path: "/".into(),
                data: json!({ "Temperature": 22.5 })
            })
        );
    }

    #[test]
    fn parse_patch_event() {
        let e = StreamEvent::parse("patch", r#"{"path":"/","data":{"Relay1_Status":1}}"#).unwrap();
        assert!(matches!(e, StreamEvent::Patch(p) if p.data == json!({ "Relay1_Status": 1 })));
    }

    #[test]
    fn parse_control_events() {
        assert_eq!(StreamEvent::parse("keep-alive", "null").unwrap(), StreamEvent::KeepAlive);
        assert_eq!(
            StreamEvent::parse("cancel", r#""Permission denied""#).unwrap(),
            StreamEvent::Cancel("Permission denied".into())
        );
        assert_eq!(
            StreamEvent::parse("cancel", "").unwrap(),
            StreamEvent::Cancel("no reason given".into())
        );
        assert_eq!(
            StreamEvent::parse("auth_revoked", r#""credential is no longer valid""#).unwrap(),
            StreamEvent::AuthRevoked
        );
        assert_eq!(
            StreamEvent::parse("rules_debug", "{}").unwrap(),
            StreamEvent::Unknown("rules_debug".into())
        );
    }

    #[test]
    fn malformed_put_is_an_error() {
        assert!(StreamEvent::parse("put", "{not json").is_err());
    }
}

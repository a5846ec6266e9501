//! Claims extraction from bearer tokens.
//!
//! Tokens are `header.payload.signature`. Only the payload is read; the
//! signature is the remote API's business and is never verified here.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::session::User;
use super::AuthError;

/// Claims carried in a token payload, exactly as decoded.
///
/// Nothing is typed at decode time; the accessors below coerce the claims
/// this crate consumes and leave everything else to the caller.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Claims(Map<String, Value>);

impl Claims {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    pub fn permissions(&self) -> Option<&Value> {
        self.get("permissions")
    }

    /// Expiry in seconds since epoch, if the token carries one
    pub fn expiry(&self) -> Result<Option<i64>, AuthError> {
        self.integer("exp")
    }

    /// Project the identity claims into the current-user shape
    pub fn to_user(&self) -> Result<User, AuthError> {
        Ok(User {
            id: self.integer("id")?.ok_or(AuthError::MissingClaim("id"))?,
            email: self.text("email")?.ok_or(AuthError::MissingClaim("email"))?,
            name: self.text("name")?.ok_or(AuthError::MissingClaim("name"))?,
            access_type: self
                .integer("accessType")?
                .ok_or(AuthError::MissingClaim("accessType"))?,
        })
    }

    /// Integer claim; numeric strings are accepted and fractions truncated.
    fn integer(&self, name: &'static str) -> Result<Option<i64>, AuthError> {
        let invalid = || AuthError::InvalidClaim(name);
        match self.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => match n.as_i64() {
                Some(i) => Ok(Some(i)),
                None => n.as_f64().and_then(float_to_i64).map(Some).ok_or_else(invalid),
            },
            Some(Value::String(raw)) => {
                let raw = raw.trim();
                match raw.parse::<i64>() {
                    Ok(i) => Ok(Some(i)),
                    Err(_) => raw
                        .parse::<f64>()
                        .ok()
                        .and_then(float_to_i64)
                        .map(Some)
                        .ok_or_else(invalid),
                }
            }
            Some(_) => Err(invalid()),
        }
    }

    fn text(&self, name: &'static str) -> Result<Option<String>, AuthError> {
        match self.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(Value::Number(n)) => Ok(Some(n.to_string())),
            Some(_) => Err(AuthError::InvalidClaim(name)),
        }
    }
}

fn float_to_i64(f: f64) -> Option<i64> {
    // i64::MAX as f64 rounds up to 2^63, hence the strict bound
    (f.is_finite() && f >= i64::MIN as f64 && f < i64::MAX as f64).then(|| f.trunc() as i64)
}

/// Decode the payload segment of a three-segment bearer token.
pub fn decode_token(token: &str) -> Result<Claims, AuthError> {
    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 {
        return Err(AuthError::InvalidToken);
    }

    let payload = base64url_decode(segments[1])?;
    let mut object = match serde_json::from_str::<Value>(&payload) {
        Ok(Value::Object(object)) => object,
        Ok(_) => {
            return Err(AuthError::TokenDecode(
                "payload is not a JSON object".to_string(),
            ))
        }
        Err(e) => return Err(AuthError::TokenDecode(e.to_string())),
    };

    // Some issuers double-encode the permissions claim
    let unwrapped = match object.get("permissions") {
        Some(Value::String(raw)) => Some(
            serde_json::from_str::<Value>(raw)
                .map_err(|e| AuthError::TokenDecode(format!("permissions claim: {}", e)))?,
        ),
        _ => None,
    };
    if let Some(permissions) = unwrapped {
        object.insert("permissions".to_string(), permissions);
    }

    Ok(Claims(object))
}

/// Base64url text to a UTF-8 string, tolerating missing padding.
fn base64url_decode(segment: &str) -> Result<String, AuthError> {
    let mut standard: String = segment
        .chars()
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();
    let padding = (4 - standard.len() % 4) % 4;
    standard.extend(std::iter::repeat('=').take(padding));

    let bytes = STANDARD
        .decode(standard.as_bytes())
        .map_err(|e| AuthError::TokenDecode(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| AuthError::TokenDecode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use serde_json::json;

    fn token_with_payload(payload: &Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let body = URL_SAFE_NO_PAD.encode(payload.to_string());
        format!("{}.{}.signature", header, body)
    }

    #[test]
    fn test_decode_recovers_claims() {
        let payload = json!({
            "id": 7,
            "email": "ana@example.com",
            "name": "Ana Souza",
            "accessType": 1,
            "exp": 1_900_000_000,
            "iat": 1_899_990_000
        });
        let claims = decode_token(&token_with_payload(&payload)).unwrap();
        assert_eq!(Value::Object(claims.as_map().clone()), payload);

        let user = claims.to_user().unwrap();
        assert_eq!(user.id, 7);
        assert_eq!(user.email, "ana@example.com");
        assert_eq!(user.name, "Ana Souza");
        assert_eq!(user.access_type, 1);
        assert_eq!(claims.expiry().unwrap(), Some(1_900_000_000));
    }

    #[test]
    fn test_decode_keeps_claims_of_any_type() {
        for payload in [
            json!({"id": "u-42", "exp": 1_900_000_000}),
            json!({"accessType": "2"}),
            json!({"exp": 1_900_000_000.5}),
            json!({"id": null, "roles": ["admin"], "active": true}),
        ] {
            let claims = decode_token(&token_with_payload(&payload)).unwrap();
            assert_eq!(Value::Object(claims.into_map()), payload);
        }
    }

    #[test]
    fn test_claims_coerce_numeric_strings_and_floats() {
        let claims = decode_token(&token_with_payload(&json!({
            "id": "12", "email": "a@b.c", "name": "A", "accessType": "2", "exp": 1_900_000_000.5
        })))
        .unwrap();
        assert_eq!(claims.expiry().unwrap(), Some(1_900_000_000));
        let user = claims.to_user().unwrap();
        assert_eq!(user.id, 12);
        assert_eq!(user.access_type, 2);
    }

    #[test]
    fn test_non_numeric_identity_is_invalid_claim() {
        let claims = decode_token(&token_with_payload(&json!({
            "id": "u-42", "email": "a@b.c", "name": "A", "accessType": 1, "exp": "soon"
        })))
        .unwrap();
        assert!(matches!(claims.to_user(), Err(AuthError::InvalidClaim("id"))));
        assert!(matches!(claims.expiry(), Err(AuthError::InvalidClaim("exp"))));
    }

    #[test]
    fn test_decode_non_ascii_payload() {
        let token = token_with_payload(&json!({"id": 1, "name": "João Araújo"}));
        let claims = decode_token(&token).unwrap();
        assert_eq!(claims.get("name"), Some(&json!("João Araújo")));
    }

    #[test]
    fn test_decode_accepts_padded_and_url_alphabet() {
        let payload = json!({"name": "~~~?>>>?"}).to_string();
        let segment = URL_SAFE_NO_PAD.encode(payload.as_bytes());
        assert!(segment.contains('-'));
        assert_ne!(segment.len() % 4, 0);

        let claims = decode_token(&format!("h.{}.s", segment)).unwrap();
        assert_eq!(claims.get("name"), Some(&json!("~~~?>>>?")));
    }

    #[test]
    fn test_wrong_segment_count_is_invalid_token() {
        for token in ["", "abc", "a.b", "a.b.c.d", "...."] {
            assert!(
                matches!(decode_token(token), Err(AuthError::InvalidToken)),
                "token {:?}",
                token
            );
        }
    }

    #[test]
    fn test_bad_payload_is_decode_error() {
        // Not base64
        assert!(matches!(decode_token("a.!!!.c"), Err(AuthError::TokenDecode(_))));
        // Base64 of invalid UTF-8
        let bad_utf8 = URL_SAFE_NO_PAD.encode([0xff, 0xfe, 0xfd]);
        assert!(matches!(
            decode_token(&format!("a.{}.c", bad_utf8)),
            Err(AuthError::TokenDecode(_))
        ));
        // Valid JSON, but not an object
        let array = URL_SAFE_NO_PAD.encode("[1,2,3]");
        assert!(matches!(
            decode_token(&format!("a.{}.c", array)),
            Err(AuthError::TokenDecode(_))
        ));
    }

    #[test]
    fn test_string_permissions_are_unwrapped() {
        let token = token_with_payload(&json!({
            "id": 1,
            "permissions": "{\"products\":[\"read\",\"write\"]}"
        }));
        let claims = decode_token(&token).unwrap();
        assert_eq!(
            claims.permissions(),
            Some(&json!({"products": ["read", "write"]}))
        );
    }

    #[test]
    fn test_object_permissions_are_left_alone() {
        let permissions = json!({"users": ["read"]});
        let token = token_with_payload(&json!({"id": 1, "permissions": permissions}));
        let claims = decode_token(&token).unwrap();
        assert_eq!(claims.permissions(), Some(&permissions));
    }

    #[test]
    fn test_to_user_requires_identity_claims() {
        let token = token_with_payload(&json!({"id": 1, "email": "a@b.c", "name": "A"}));
        let claims = decode_token(&token).unwrap();
        assert!(matches!(
            claims.to_user(),
            Err(AuthError::MissingClaim("accessType"))
        ));
    }
}

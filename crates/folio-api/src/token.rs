use axum_extra::extract::cookie::{Cookie, SameSite};
use chrono::{DateTime, Utc};
use folio_types::api::Claims;
use folio_types::models::Identity;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "token";

/// Session lifetime, shared by the token expiry and the cookie max-age.
pub const SESSION_TTL_SECS: i64 = 60 * 60;

/// Issues and verifies signed, time-limited session tokens.
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenService {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is exact: a token is dead the second its hour is up.
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    pub fn issue(&self, identity: &Identity) -> jsonwebtoken::errors::Result<String> {
        self.issue_at(identity, Utc::now())
    }

    pub fn issue_at(
        &self,
        identity: &Identity,
        issued_at: DateTime<Utc>,
    ) -> jsonwebtoken::errors::Result<String> {
        let claims = Claims {
            user_id: identity.user_id.clone(),
            id: identity.id,
            iat: issued_at.timestamp(),
            exp: issued_at.timestamp() + SESSION_TTL_SECS,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
    }

    /// None for a bad signature, an expired token, or garbage.
    pub fn verify(&self, token: &str) -> Option<Identity> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).ok()?;
        Some(Identity {
            user_id: data.claims.user_id,
            id: data.claims.id,
        })
    }
}

/// Cookie carrying a freshly issued session token.
///
/// Cross-site front ends need `SameSite=None`, which browsers only accept
/// together with `Secure`; with `secure` off (plain-HTTP development) the
/// cookie falls back to `SameSite=Lax`.
pub fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(if secure { SameSite::None } else { SameSite::Lax })
        .max_age(time::Duration::seconds(SESSION_TTL_SECS))
        .build()
}

/// Cookie that makes the browser drop the session.
pub fn cleared_session_cookie(secure: bool) -> Cookie<'static> {
    let mut cookie = session_cookie(String::new(), secure);
    cookie.set_max_age(time::Duration::ZERO);
    cookie
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn alice() -> Identity {
        Identity {
            user_id: "alice".into(),
            id: 7,
        }
    }

    #[test]
    fn round_trips_identity() {
        let tokens = TokenService::new("test-secret");
        let token = tokens.issue(&alice()).unwrap();
        assert_eq!(tokens.verify(&token), Some(alice()));
    }

    #[test]
    fn accepted_at_59_minutes_rejected_at_61() {
        let tokens = TokenService::new("test-secret");

        let issued_59_min_ago = Utc::now() - Duration::minutes(59);
        let token = tokens.issue_at(&alice(), issued_59_min_ago).unwrap();
        assert_eq!(tokens.verify(&token), Some(alice()));

        let issued_61_min_ago = Utc::now() - Duration::minutes(61);
        let token = tokens.issue_at(&alice(), issued_61_min_ago).unwrap();
        assert_eq!(tokens.verify(&token), None);
    }

    #[test]
    fn foreign_signature_is_rejected() {
        let ours = TokenService::new("test-secret");
        let theirs = TokenService::new("other-secret");
        let token = theirs.issue(&alice()).unwrap();

        assert_eq!(ours.verify(&token), None);
        assert_eq!(ours.verify("not.a.jwt"), None);
        assert_eq!(ours.verify(""), None);
    }

    #[test]
    fn session_cookie_is_http_only_secure_cross_site() {
        let rendered = session_cookie("abc".into(), true).to_string();
        assert!(rendered.starts_with("token=abc"), "{rendered}");
        assert!(rendered.contains("HttpOnly"), "{rendered}");
        assert!(rendered.contains("Secure"), "{rendered}");
        assert!(rendered.contains("SameSite=None"), "{rendered}");
        assert!(rendered.contains("Max-Age=3600"), "{rendered}");
        assert!(rendered.contains("Path=/"), "{rendered}");
    }

    #[test]
    fn cleared_cookie_expires_immediately() {
        let rendered = cleared_session_cookie(true).to_string();
        assert!(rendered.starts_with("token=;"), "{rendered}");
        assert!(rendered.contains("Max-Age=0"), "{rendered}");
        assert!(rendered.contains("Path=/"), "{rendered}");
    }

    #[test]
    fn insecure_cookie_drops_to_lax() {
        let rendered = session_cookie("abc".into(), false).to_string();
        assert!(!rendered.contains("Secure"), "{rendered}");
        assert!(rendered.contains("SameSite=Lax"), "{rendered}");
    }
}

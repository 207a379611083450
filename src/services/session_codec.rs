// src/services/session_codec.rs

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde_json::json;
use thiserror::Error;

use crate::models::session::{
    Session, UserProfile, SESSION_COOKIE, SESSION_DURATION_MILLIS, USER_COOKIE,
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("session cookies missing")]
    Missing,

    #[error("malformed session cookie: {0}")]
    Malformed(String),

    #[error("session expired")]
    Expired,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecodedSession {
    pub session: Session,
    pub user: UserProfile,
}

pub fn encode_session(session: &Session) -> String {
    json!({ "timestamp": session.issued_at_millis }).to_string()
}

pub fn encode_user(user: &UserProfile) -> Result<String, serde_json::Error> {
    serde_json::to_string(user)
}

/// Função pura sobre os valores crus dos dois cookies. Os dois são
/// obrigatórios; qualquer um ausente ou ilegível é `Missing`/`Malformed`.
pub fn decode(
    raw_session: Option<&str>,
    raw_user: Option<&str>,
    now_millis: i64,
) -> Result<DecodedSession, SessionError> {
    let (Some(raw_session), Some(raw_user)) = (raw_session, raw_user) else {
        return Err(SessionError::Missing);
    };

    let session: Session = serde_json::from_str(raw_session)
        .map_err(|e| SessionError::Malformed(format!("{}: {}", SESSION_COOKIE, e)))?;
    let user: UserProfile = serde_json::from_str(raw_user)
        .map_err(|e| SessionError::Malformed(format!("{}: {}", USER_COOKIE, e)))?;

    if session.is_expired(now_millis) {
        return Err(SessionError::Expired);
    }

    Ok(DecodedSession { session, user })
}

pub fn decode_jar(jar: &CookieJar, now_millis: i64) -> Result<DecodedSession, SessionError> {
    decode(
        jar.get(SESSION_COOKIE).map(|c| c.value()),
        jar.get(USER_COOKIE).map(|c| c.value()),
        now_millis,
    )
}

// ---
// Cookies de resposta
// ---

pub fn session_cookies(
    jar: CookieJar,
    session: &Session,
    user: &UserProfile,
    secure: bool,
) -> Result<CookieJar, serde_json::Error> {
    let max_age = time::Duration::milliseconds(SESSION_DURATION_MILLIS);

    let session_cookie = Cookie::build((SESSION_COOKIE, encode_session(session)))
        .path("/")
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(max_age);

    let user_cookie = Cookie::build((USER_COOKIE, encode_user(user)?))
        .path("/")
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(max_age);

    Ok(jar.add(session_cookie).add(user_cookie))
}

pub fn clear_session_cookies(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(SESSION_COOKIE).path("/"))
        .remove(Cookie::build(USER_COOKIE).path("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::session::Role;
    use uuid::Uuid;

    const NOW: i64 = 1_760_000_000_000;

    fn profile() -> UserProfile {
        UserProfile {
            id: Uuid::new_v4(),
            role: Some(Role::Receptionist),
            is_active: true,
            full_name: Some("Meera Nair".into()),
            email: None,
        }
    }

    #[test]
    fn round_trip_preserves_issued_at() {
        let session = Session::issued_at(NOW);
        let user = profile();
        let raw_session = encode_session(&session);
        let raw_user = encode_user(&user).unwrap();

        let decoded = decode(Some(&raw_session), Some(&raw_user), NOW + 1).unwrap();
        assert_eq!(decoded.session.issued_at_millis, NOW);
        assert_eq!(decoded.user, user);
    }

    #[test]
    fn both_cookies_are_required() {
        let raw_user = encode_user(&profile()).unwrap();
        assert_eq!(decode(None, Some(&raw_user), NOW), Err(SessionError::Missing));
        assert_eq!(decode(Some(r#"{"timestamp":1}"#), None, NOW), Err(SessionError::Missing));
    }

    #[test]
    fn absurd_timestamps_count_as_expired() {
        let raw_user = encode_user(&profile()).unwrap();
        let raw_session = format!(r#"{{"timestamp":{}}}"#, i64::MIN);

        assert_eq!(decode(Some(&raw_session), Some(&raw_user), NOW), Err(SessionError::Expired));
    }

    #[test]
    fn non_json_is_malformed() {
        let raw_user = encode_user(&profile()).unwrap();
        let err = decode(Some("not-json"), Some(&raw_user), NOW).unwrap_err();
        assert!(matches!(err, SessionError::Malformed(_)));

        let err = decode(Some(r#"{"timestamp":1}"#), Some("{"), NOW).unwrap_err();
        assert!(matches!(err, SessionError::Malformed(_)));
    }

    #[test]
    fn expires_at_exactly_twenty_four_hours() {
        let raw_user = encode_user(&profile()).unwrap();
        let raw_session = encode_session(&Session::issued_at(NOW - SESSION_DURATION_MILLIS));
        assert_eq!(decode(Some(&raw_session), Some(&raw_user), NOW), Err(SessionError::Expired));

        let fresh = encode_session(&Session::issued_at(NOW - SESSION_DURATION_MILLIS + 1));
        assert!(decode(Some(&fresh), Some(&raw_user), NOW).is_ok());
    }

    #[test]
    fn set_and_clear_cookies() {
        let jar = session_cookies(CookieJar::new(), &Session::issued_at(NOW), &profile(), false).unwrap();
        let decoded = decode_jar(&jar, NOW).unwrap();
        assert_eq!(decoded.session.issued_at_millis, NOW);

        let cleared = clear_session_cookies(jar);
        assert!(cleared.get(SESSION_COOKIE).is_none());
        assert!(cleared.get(USER_COOKIE).is_none());
    }
}

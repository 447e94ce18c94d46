//! Cookie transport: carries the session token in an HTTP cookie.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::config::CookieConfig;

#[derive(Debug, Clone)]
pub struct CookieTransport {
    name: String,
    max_age: time::Duration,
    path: String,
    secure: bool,
    http_only: bool,
}

impl CookieTransport {
    pub fn new(config: &CookieConfig) -> Self {
        Self {
            name: config.name.clone(),
            max_age: time::Duration::seconds(config.max_age_seconds),
            path: config.path.clone(),
            secure: config.secure,
            http_only: config.http_only,
        }
    }

    /// Read the token from the request cookies.
    pub fn read(&self, jar: &CookieJar) -> Option<String> {
        jar.get(&self.name)
            .map(|c| c.value().to_string())
            .filter(|v| !v.is_empty())
    }

    /// Add the session cookie carrying `token`.
    pub fn login(&self, jar: CookieJar, token: String) -> CookieJar {
        let cookie = Cookie::build((self.name.clone(), token))
            .path(self.path.clone())
            .http_only(self.http_only)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .max_age(self.max_age)
            .build();
        jar.add(cookie)
    }

    /// Expire the session cookie.
    pub fn logout(&self, jar: CookieJar) -> CookieJar {
        let cookie = Cookie::build((self.name.clone(), ""))
            .path(self.path.clone())
            .http_only(self.http_only)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .max_age(time::Duration::seconds(0))
            .build();
        jar.add(cookie)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport() -> CookieTransport {
        CookieTransport::new(&CookieConfig::default())
    }

    #[test]
    fn test_login_cookie_attributes() {
        let jar = transport().login(CookieJar::new(), "tok".into());
        let cookie = jar.get("auth_session").unwrap();
        assert_eq!(cookie.value(), "tok");
        assert_eq!(cookie.max_age(), Some(time::Duration::seconds(3600)));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
    }

    #[test]
    fn test_logout_expires_cookie() {
        let jar = transport().logout(CookieJar::new());
        let cookie = jar.get("auth_session").unwrap();
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age(), Some(time::Duration::seconds(0)));
    }

    #[test]
    fn test_read() {
        let transport = transport();
        assert_eq!(transport.read(&CookieJar::new()), None);

        let jar = CookieJar::new().add(Cookie::new("auth_session", "abc"));
        assert_eq!(transport.read(&jar).as_deref(), Some("abc"));

        let jar = CookieJar::new().add(Cookie::new("auth_session", ""));
        assert_eq!(transport.read(&jar), None);

        let jar = CookieJar::new().add(Cookie::new("other", "abc"));
        assert_eq!(transport.read(&jar), None);
    }
}

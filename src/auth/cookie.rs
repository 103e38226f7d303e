use axum::http::{header, HeaderMap, HeaderValue};

use crate::config::CookieConfig;

fn attributes(cfg: &CookieConfig, max_age: u64) -> String {
    let mut out = format!("; Path={}; Max-Age={}; SameSite=Lax", cfg.path, max_age);
    if let Some(domain) = &cfg.domain {
        out.push_str("; Domain=");
        out.push_str(domain);
    }
    if cfg.http_only {
        out.push_str("; HttpOnly");
    }
    if cfg.secure {
        out.push_str("; Secure");
    }
    out
}

/// `Set-Cookie` value carrying the session token.
pub fn session_cookie(cfg: &CookieConfig, token: &str, max_age_secs: u64) -> String {
    format!("{}={}{}", cfg.name, token, attributes(cfg, max_age_secs))
}

/// `Set-Cookie` value that empties the session cookie and expires it immediately.
pub fn cleared_session_cookie(cfg: &CookieConfig) -> String {
    format!("{}={}", cfg.name, attributes(cfg, 0))
}

pub fn set_cookie_header(value: &str) -> anyhow::Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(header::SET_COOKIE, HeaderValue::from_str(value)?);
    Ok(headers)
}

/// Value of the named cookie from the request `Cookie` headers.
pub fn read_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|raw| raw.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
}

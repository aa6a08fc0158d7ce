use axum::http::header::SET_COOKIE;
use axum::http::HeaderMap;
use chrono::{ DateTime, Utc };
use log::debug;
use std::collections::BTreeMap;

use super::cookie::{ parse_cookie_header, validate_name, SetCookie };
use super::{ CookieSlot, HistoryError };

#[derive(Clone, Debug)]
struct JarEntry {
    value: String,
    expires: Option<DateTime<Utc>>,
}

impl JarEntry {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires.map_or(true, |expires| expires > now)
    }
}

/// Browser-side slot: the model of `document.cookie` a client keeps between
/// requests. Expired entries are invisible and writing an expired cookie
/// removes the entry.
#[derive(Clone, Debug, Default)]
pub struct CookieJar {
    entries: BTreeMap<String, JarEntry>,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a `document.cookie` style string. Entries are session cookies.
    pub fn from_document_cookie(cookies: &str) -> Self {
        let entries = parse_cookie_header(cookies)
            .into_iter()
            .map(|(name, value)| (name, JarEntry { value, expires: None }))
            .collect();
        Self { entries }
    }

    /// Live entries as `name=value; name=value`.
    pub fn document_cookie(&self) -> String {
        let now = Utc::now();
        self.entries
            .iter()
            .filter(|(_, entry)| entry.is_live(now))
            .map(|(name, entry)| format!("{}={}", name, entry.value))
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// The `Cookie` header a browser would send, if any cookie is live.
    pub fn cookie_header(&self) -> Option<String> {
        let cookies = self.document_cookie();
        (!cookies.is_empty()).then_some(cookies)
    }

    pub fn ingest_set_cookie(&mut self, header: &str) -> Result<(), HistoryError> {
        let cookie = SetCookie::parse(header)?;
        self.set(cookie)
    }

    /// Applies every `Set-Cookie` header of a response; malformed ones are
    /// ignored the way a browser would.
    pub fn ingest_response_headers(&mut self, headers: &HeaderMap) {
        for value in headers.get_all(SET_COOKIE) {
            let Ok(header) = value.to_str() else {
                continue;
            };
            if let Err(e) = self.ingest_set_cookie(header) {
                debug!("Ignoring Set-Cookie '{}': {}", header, e);
            }
        }
    }
}

impl CookieSlot for CookieJar {
    fn get(&self, name: &str) -> Option<String> {
        let now = Utc::now();
        self.entries
            .get(name)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.value.clone())
    }

    fn set(&mut self, cookie: SetCookie) -> Result<(), HistoryError> {
        validate_name(&cookie.name)?;
        if cookie.is_expired() {
            self.entries.remove(&cookie.name);
        } else {
            self.entries.insert(cookie.name, JarEntry {
                value: cookie.value,
                expires: cookie.expires,
            });
        }
        Ok(())
    }

    fn names(&self) -> Vec<String> {
        let now = Utc::now();
        self.entries
            .iter()
            .filter(|(_, entry)| entry.is_live(now))
            .map(|(name, _)| name.clone())
            .collect()
    }
}

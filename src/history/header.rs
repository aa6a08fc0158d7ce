use axum::http::header::{ COOKIE, SET_COOKIE };
use axum::http::{ HeaderMap, HeaderValue };

use super::cookie::{ parse_cookie_header, validate_name, SetCookie };
use super::{ CookieSlot, HistoryError };

/// Server-side slot for one request/response exchange.
///
/// Reads come from the inbound `Cookie` header; writes are queued as
/// `Set-Cookie` values for the outbound response. A queued write shadows the
/// inbound value of the same name, so later reads in the same exchange see it.
#[derive(Debug, Default)]
pub struct HeaderCookies {
    inbound: Vec<(String, String)>,
    pending: Vec<(SetCookie, HeaderValue)>,
}

impl HeaderCookies {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_cookie_header(header: &str) -> Self {
        Self {
            inbound: parse_cookie_header(header),
            pending: Vec::new(),
        }
    }

    pub fn from_headers(headers: &HeaderMap) -> Self {
        let inbound = headers
            .get_all(COOKIE)
            .iter()
            .flat_map(|value| parse_cookie_header(&String::from_utf8_lossy(value.as_bytes())))
            .collect();
        Self {
            inbound,
            pending: Vec::new(),
        }
    }

    pub fn pending(&self) -> Vec<&SetCookie> {
        self.pending.iter().map(|(cookie, _)| cookie).collect()
    }

    /// Appends one `Set-Cookie` header per queued write.
    pub fn apply_to(&self, headers: &mut HeaderMap) {
        for (_, value) in &self.pending {
            headers.append(SET_COOKIE, value.clone());
        }
    }

    fn pending_for(&self, name: &str) -> Option<&SetCookie> {
        self.pending
            .iter()
            .map(|(cookie, _)| cookie)
            .find(|cookie| cookie.name == name)
    }
}

impl CookieSlot for HeaderCookies {
    fn get(&self, name: &str) -> Option<String> {
        if let Some(cookie) = self.pending_for(name) {
            return (!cookie.is_expired()).then(|| cookie.value.clone());
        }
        self.inbound
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, value)| value.clone())
    }

    fn set(&mut self, cookie: SetCookie) -> Result<(), HistoryError> {
        validate_name(&cookie.name)?;
        let value = HeaderValue::from_str(&cookie.to_header_value()).map_err(|e|
            HistoryError::InvalidCookie(format!("Cookie '{}' is not a valid header: {}", cookie.name, e))
        )?;
        self.pending.retain(|(queued, _)| queued.name != cookie.name);
        self.pending.push((cookie, value));
        Ok(())
    }

    fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for (name, _) in &self.inbound {
            if self.pending_for(name).is_none() && !names.contains(name) {
                names.push(name.clone());
            }
        }
        for (cookie, _) in &self.pending {
            if !cookie.is_expired() {
                names.push(cookie.name.clone());
            }
        }
        names
    }
}

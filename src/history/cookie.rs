use chrono::{ DateTime, Duration, NaiveDateTime, Utc };
use log::debug;
use std::fmt;
use std::str::FromStr;

use super::HistoryError;

const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";
const LEGACY_HTTP_DATE_FORMAT: &str = "%a, %d-%b-%Y %H:%M:%S GMT";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl fmt::Display for SameSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SameSite::Strict => f.write_str("Strict"),
            SameSite::Lax => f.write_str("Lax"),
            SameSite::None => f.write_str("None"),
        }
    }
}

impl FromStr for SameSite {
    type Err = HistoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "strict" => Ok(SameSite::Strict),
            "lax" => Ok(SameSite::Lax),
            "none" => Ok(SameSite::None),
            other => Err(HistoryError::InvalidCookie(format!("Unknown SameSite value '{}'", other))),
        }
    }
}

/// A single cookie write: either a value with an expiry or a removal marker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SetCookie {
    pub name: String,
    pub value: String,
    /// `None` is a session cookie.
    pub expires: Option<DateTime<Utc>>,
    pub path: Option<String>,
    pub same_site: Option<SameSite>,
    pub http_only: bool,
}

impl SetCookie {
    /// Site-wide, lax, script-readable cookie that lives for `ttl`.
    pub fn persistent(name: impl Into<String>, value: impl Into<String>, ttl: Duration) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            expires: Some(Utc::now() + ttl),
            path: Some("/".to_string()),
            same_site: Some(SameSite::Lax),
            http_only: false,
        }
    }

    /// Empty value that expired at the Unix epoch.
    pub fn removal(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: String::new(),
            expires: Some(DateTime::<Utc>::UNIX_EPOCH),
            path: Some("/".to_string()),
            same_site: None,
            http_only: false,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expires, Some(expires) if expires <= now)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Renders the value of a `Set-Cookie` header.
    pub fn to_header_value(&self) -> String {
        let mut out = format!("{}={}", self.name, self.value);
        if let Some(expires) = self.expires {
            out.push_str("; Expires=");
            out.push_str(&format_http_date(expires));
        }
        if let Some(path) = &self.path {
            out.push_str("; Path=");
            out.push_str(path);
        }
        if let Some(same_site) = self.same_site {
            out.push_str(&format!("; SameSite={}", same_site));
        }
        if self.http_only {
            out.push_str("; HttpOnly");
        }
        out
    }

    /// Parses a `Set-Cookie` header value. Unknown attributes are ignored.
    pub fn parse(header: &str) -> Result<Self, HistoryError> {
        let mut parts = header.split(';');
        let pair = parts.next().unwrap_or_default();
        let (name, value) = pair
            .split_once('=')
            .ok_or_else(|| HistoryError::InvalidCookie(format!("Missing '=' in '{}'", pair)))?;

        let mut cookie = SetCookie {
            name: name.trim().to_string(),
            value: value.trim().to_string(),
            expires: None,
            path: None,
            same_site: None,
            http_only: false,
        };
        validate_name(&cookie.name)?;

        let mut max_age = None;
        for attr in parts {
            let attr = attr.trim();
            let (key, val) = match attr.split_once('=') {
                Some((k, v)) => (k.trim(), v.trim()),
                None => (attr, ""),
            };
            match key.to_ascii_lowercase().as_str() {
                "expires" => {
                    match parse_http_date(val) {
                        Ok(at) => {
                            cookie.expires = Some(at);
                        }
                        Err(e) => debug!("Ignoring attribute of '{}': {}", cookie.name, e),
                    }
                }
                "max-age" => {
                    match val.parse::<i64>() {
                        Ok(secs) => {
                            max_age = Some(secs);
                        }
                        Err(_) => debug!("Ignoring Max-Age '{}' of '{}'", val, cookie.name),
                    }
                }
                "path" => {
                    cookie.path = Some(val.to_string());
                }
                "samesite" => {
                    match val.parse() {
                        Ok(same_site) => {
                            cookie.same_site = Some(same_site);
                        }
                        Err(e) => debug!("Ignoring attribute of '{}': {}", cookie.name, e),
                    }
                }
                "httponly" => {
                    cookie.http_only = true;
                }
                _ => {}
            }
        }

        // Max-Age wins over Expires.
        if let Some(secs) = max_age {
            cookie.expires = Some(if secs <= 0 {
                DateTime::<Utc>::UNIX_EPOCH
            } else {
                Utc::now() + Duration::seconds(secs)
            });
        }

        Ok(cookie)
    }
}

pub fn format_http_date(at: DateTime<Utc>) -> String {
    at.format(HTTP_DATE_FORMAT).to_string()
}

/// Accepts the IMF-fixdate form and the dashed legacy form
/// (`Thu, 01-Jan-1970 00:00:00 GMT`).
pub fn parse_http_date(value: &str) -> Result<DateTime<Utc>, HistoryError> {
    NaiveDateTime::parse_from_str(value, HTTP_DATE_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(value, LEGACY_HTTP_DATE_FORMAT))
        .map(|naive| naive.and_utc())
        .map_err(|e| HistoryError::InvalidCookie(format!("Bad Expires '{}': {}", value, e)))
}

/// Splits a `Cookie` request header (or `document.cookie`) into pairs.
/// Fragments without `=` are skipped.
pub fn parse_cookie_header(header: &str) -> Vec<(String, String)> {
    header
        .split(';')
        .map(str::trim)
        .filter_map(|pair| {
            let (name, value) = pair.split_once('=')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some((name.to_string(), value.trim().to_string()))
        })
        .collect()
}

/// Cookie names are RFC 6265 tokens.
pub fn validate_name(name: &str) -> Result<(), HistoryError> {
    const SEPARATORS: &[char] = &[
        '(', ')', '<', '>', '@', ',', ';', ':', '\\', '"', '/', '[', ']', '?', '=', '{', '}',
    ];
    if name.is_empty() {
        return Err(HistoryError::InvalidCookie("Empty cookie name".to_string()));
    }
    if let Some(bad) = name.chars().find(|c| !c.is_ascii_graphic() || SEPARATORS.contains(c)) {
        return Err(HistoryError::InvalidCookie(format!("Cookie name '{}' contains {:?}", name, bad)));
    }
    Ok(())
}

pub fn encode_value(plain: &str) -> String {
    urlencoding::encode(plain).into_owned()
}

/// Strict percent-decoding: every `%` must start a two-digit hex escape.
pub fn decode_value(encoded: &str) -> Result<String, HistoryError> {
    let bytes = encoded.as_bytes();
    let mut pos = 0;
    while let Some(offset) = bytes[pos..].iter().position(|b| *b == b'%') {
        let at = pos + offset;
        let escape = bytes.get(at + 1..at + 3);
        if !escape.is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit)) {
            return Err(HistoryError::InvalidEscape(at));
        }
        pos = at + 3;
    }
    Ok(urlencoding::decode(encoded)?.into_owned())
}

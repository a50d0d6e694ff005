//! Browser-exported cookie files
//!
//! Reads the Netscape cookie file format (7 TAB-separated fields per line) that browser
//! extensions export, and loads the cookies into a `reqwest::cookie::Jar` so
//! session-authenticated sources can be fetched.

use reqwest::cookie::Jar;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Source parameter naming the cookie file to send with every request
pub const COOKIE_FILE_KEY: &str = "cookie_filename";

/// A single parsed cookie
#[derive(Clone)]
pub struct CookieLine {
    pub domain: String,
    pub include_subdomains: bool,
    pub path: String,
    pub secure: bool,
    /// Unix timestamp, 0 for session cookies. Informational only: the jar gets every
    /// cookie as a session cookie, so a stale export is still sent.
    pub expires: i64,
    pub name: String,
    value: String,
}

impl CookieLine {
    pub fn value(&self) -> &str {
        &self.value
    }

    /// `Set-Cookie` style string for the jar
    fn set_cookie_string(&self) -> String {
        let mut parts = vec![
            format!("{}={}", self.name, self.value),
            format!("Path={}", self.path),
        ];

        if self.include_subdomains {
            parts.push(format!("Domain={}", self.domain.trim_start_matches('.')));
        }
        if self.secure {
            parts.push("Secure".to_string());
        }

        parts.join("; ")
    }

    /// Origin URL the jar matches the cookie against
    fn origin_url(&self) -> String {
        let scheme = if self.secure { "https" } else { "http" };
        format!(
            "{}://{}{}",
            scheme,
            self.domain.trim_start_matches('.'),
            self.path
        )
    }
}

// Cookie values are credentials
impl fmt::Debug for CookieLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CookieLine")
            .field("domain", &self.domain)
            .field("include_subdomains", &self.include_subdomains)
            .field("path", &self.path)
            .field("secure", &self.secure)
            .field("expires", &self.expires)
            .field("name", &self.name)
            .field("value", &"[REDACTED]")
            .finish()
    }
}

/// Errors that can occur while reading a cookie file
#[derive(Debug, Error)]
pub enum CookieError {
    #[error("Failed to read cookie file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Cookie file {path} has no valid cookies ({malformed} malformed lines)")]
    NoCookies { path: PathBuf, malformed: usize },
}

/// Parses Netscape-format cookie lines
///
/// Comment and blank lines are skipped. The `#HttpOnly_` prefix some browsers write in
/// front of the domain is stripped. Malformed lines are logged and skipped; the count of
/// skipped lines is returned alongside the cookies.
pub fn parse_netscape_cookies(reader: impl BufRead) -> std::io::Result<(Vec<CookieLine>, usize)> {
    let mut cookies = Vec::new();
    let mut malformed = 0;

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim_end_matches(['\r', '\n']);

        let line = match line.strip_prefix("#HttpOnly_") {
            Some(rest) => rest,
            None if line.trim().is_empty() || line.starts_with('#') => continue,
            None => line,
        };

        match parse_cookie_line(line) {
            Some(cookie) => cookies.push(cookie),
            None => {
                tracing::warn!("Skipping malformed cookie line {}", idx + 1);
                malformed += 1;
            }
        }
    }

    Ok((cookies, malformed))
}

fn parse_cookie_line(line: &str) -> Option<CookieLine> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() != 7 || fields[0].is_empty() || fields[5].is_empty() {
        return None;
    }

    Some(CookieLine {
        domain: fields[0].to_string(),
        include_subdomains: parse_flag(fields[1])?,
        path: fields[2].to_string(),
        secure: parse_flag(fields[3])?,
        expires: fields[4].parse().ok()?,
        name: fields[5].to_string(),
        value: fields[6].to_string(),
    })
}

fn parse_flag(value: &str) -> Option<bool> {
    match value {
        "TRUE" => Some(true),
        "FALSE" => Some(false),
        _ => None,
    }
}

/// Loads parsed cookies into a jar for the HTTP client
pub fn cookies_into_jar(cookies: &[CookieLine]) -> Arc<Jar> {
    let jar = Arc::new(Jar::default());

    for cookie in cookies {
        match cookie.origin_url().parse::<url::Url>() {
            Ok(origin) => jar.add_cookie_str(&cookie.set_cookie_string(), &origin),
            Err(_) => tracing::warn!(
                "Skipping cookie '{}' with unusable domain '{}'",
                cookie.name,
                cookie.domain
            ),
        }
    }

    jar
}

/// Reads a cookie file into a jar
///
/// # Returns
///
/// * `Ok(Arc<Jar>)` - The cookies, ready for `reqwest::ClientBuilder::cookie_provider`
/// * `Err(CookieError)` - The file is unreadable or holds no valid cookie
pub fn load_cookie_jar(path: &Path) -> Result<Arc<Jar>, CookieError> {
    let io_err = |source| CookieError::Io {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(io_err)?;
    let (cookies, malformed) = parse_netscape_cookies(BufReader::new(file)).map_err(io_err)?;

    if cookies.is_empty() {
        return Err(CookieError::NoCookies {
            path: path.to_path_buf(),
            malformed,
        });
    }

    tracing::debug!("Loaded {} cookies from {}", cookies.len(), path.display());
    Ok(cookies_into_jar(&cookies))
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::cookie::CookieStore;
    use std::io::Cursor;
    use tempfile::NamedTempFile;

    const COOKIES: &str = "\
# Netscape HTTP Cookie File
# https://curl.se/docs/http-cookies.html

.example.com\tTRUE\t/\tFALSE\t0\tsession\tabc123
#HttpOnly_members.example.org\tFALSE\t/\tTRUE\t4102444800\ttoken\txyz789
not a cookie line
";

    #[test]
    fn test_parse_cookie_file() {
        let (cookies, malformed) = parse_netscape_cookies(Cursor::new(COOKIES)).unwrap();

        assert_eq!(cookies.len(), 2);
        assert_eq!(malformed, 1);

        assert_eq!(cookies[0].domain, ".example.com");
        assert!(cookies[0].include_subdomains);
        assert_eq!(cookies[0].value(), "abc123");

        assert_eq!(cookies[1].domain, "members.example.org");
        assert!(cookies[1].secure);
        assert_eq!(cookies[1].expires, 4_102_444_800);
    }

    #[test]
    fn test_debug_redacts_value() {
        let (cookies, _) = parse_netscape_cookies(Cursor::new(COOKIES)).unwrap();
        let debug = format!("{:?}", cookies[0]);
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("abc123"));
    }

    #[test]
    fn test_jar_sends_cookies_to_matching_hosts() {
        let (cookies, _) = parse_netscape_cookies(Cursor::new(COOKIES)).unwrap();
        let jar = cookies_into_jar(&cookies);

        let sub = url::Url::parse("http://www.example.com/comic").unwrap();
        let header = jar.cookies(&sub).unwrap();
        assert_eq!(header.to_str().unwrap(), "session=abc123");

        let secure = url::Url::parse("https://members.example.org/gallery").unwrap();
        let header = jar.cookies(&secure).unwrap();
        assert_eq!(header.to_str().unwrap(), "token=xyz789");

        let other = url::Url::parse("https://unrelated.net/").unwrap();
        assert!(jar.cookies(&other).is_none());
    }

    #[test]
    fn test_expired_cookie_is_still_sent() {
        let line = "members.example.org\tFALSE\t/\tFALSE\t1600000000\tsession\tabc\n";
        let (cookies, malformed) = parse_netscape_cookies(Cursor::new(line)).unwrap();
        assert_eq!(malformed, 0);
        assert_eq!(cookies[0].expires, 1_600_000_000);

        let jar = cookies_into_jar(&cookies);
        let url = url::Url::parse("http://members.example.org/g").unwrap();
        let header = jar.cookies(&url).unwrap();
        assert_eq!(header.to_str().unwrap(), "session=abc");
    }

    #[test]
    fn test_load_cookie_jar_without_cookies() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "# only comments\n").unwrap();

        assert!(matches!(
            load_cookie_jar(file.path()),
            Err(CookieError::NoCookies { .. })
        ));
    }

    #[test]
    fn test_load_missing_cookie_file() {
        assert!(matches!(
            load_cookie_jar(Path::new("/nonexistent/cookies.txt")),
            Err(CookieError::Io { .. })
        ));
    }
}

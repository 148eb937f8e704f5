use crate::UrlError;
use url::Url;

/// A URL split into its policy scope and request path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitUrl {
    /// `scheme://host[:port]`, with the scheme's default port omitted
    pub cache_key: String,

    /// Path plus query string, always starting with `/`
    pub path: String,
}

/// Splits a URL into a cache key and a request path
///
/// The cache key is canonical: `http://example.com/x` and
/// `http://example.com:80/x` produce the same key, while a non-default port
/// is kept (`http://example.com:8080`).
///
/// # Arguments
///
/// * `url_str` - The absolute URL to split
///
/// # Returns
///
/// * `Ok(SplitUrl)` - The cache key and path
/// * `Err(UrlError)` - The URL is malformed, has no host, or is not HTTP(S)
///
/// # Examples
///
/// ```
/// use robots_gate::url::split_url;
///
/// let split = split_url("https://Example.com:443/a/b?q=1#frag").unwrap();
/// assert_eq!(split.cache_key, "https://example.com");
/// assert_eq!(split.path, "/a/b?q=1");
/// ```
pub fn split_url(url_str: &str) -> Result<SplitUrl, UrlError> {
    let url = Url::parse(url_str).map_err(|e| UrlError::Parse(format!("{}: {}", url_str, e)))?;

    let scheme = url.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            scheme
        )));
    }

    let host = url.host_str().ok_or(UrlError::MissingDomain)?;
    if host.is_empty() {
        return Err(UrlError::MissingDomain);
    }

    // The url crate already drops default ports, but the key must not depend
    // on that normalisation.
    let port = url.port().filter(|&port| !is_standard_port(scheme, port));

    let cache_key = match port {
        Some(port) => format!("{}://{}:{}", scheme, host, port),
        None => format!("{}://{}", scheme, host),
    };

    let mut path = url.path().to_string();
    if path.is_empty() {
        path.push('/');
    }
    if let Some(query) = url.query() {
        path.push('?');
        path.push_str(query);
    }

    Ok(SplitUrl { cache_key, path })
}

fn is_standard_port(scheme: &str, port: u16) -> bool {
    (scheme == "https" && port == 443) || (scheme == "http" && port == 80)
}

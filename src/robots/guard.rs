//! Allow/disallow evaluation against a parsed policy

use crate::robots::PolicyDocument;
use robotstxt::DefaultMatcher;

/// Origin put in front of paths before matching
///
/// The matcher extracts the path from a URL itself, and reads a leading `//`
/// as the start of an authority. Only the path part of this URL is matched.
const MATCH_ORIGIN: &str = "http://robots.invalid";

/// Answers allow/disallow queries for one policy document
///
/// Rule precedence, wildcards and agent-group selection follow the robotstxt
/// crate (Google's reference matcher). Nothing is cached here; every call
/// re-evaluates the document.
#[derive(Debug, Clone, Copy)]
pub struct RobotsGuard<'a> {
    policy: &'a PolicyDocument,
}

impl<'a> RobotsGuard<'a> {
    pub fn new(policy: &'a PolicyDocument) -> Self {
        Self { policy }
    }

    /// Checks if a path is allowed for the given user agent
    ///
    /// # Arguments
    ///
    /// * `user_agent` - Full user agent string; only its product token is
    ///   matched against `User-agent:` lines
    /// * `path` - Path and query to check (e.g. `/page.html?x=1`)
    pub fn is_allowed(&self, user_agent: &str, path: &str) -> bool {
        if self.policy.is_allow_all() {
            return true;
        }

        let url = match_url(path);
        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(self.policy.content(), product_token(user_agent), &url)
    }
}

/// Checks if a path is allowed by a policy document
///
/// Shorthand for `RobotsGuard::new(policy).is_allowed(user_agent, path)`.
pub fn is_allowed(policy: &PolicyDocument, user_agent: &str, path: &str) -> bool {
    RobotsGuard::new(policy).is_allowed(user_agent, path)
}

/// Turns a request path into the absolute URL the matcher expects
fn match_url(path: &str) -> String {
    if path.starts_with('/') {
        format!("{}{}", MATCH_ORIGIN, path)
    } else {
        format!("{}/{}", MATCH_ORIGIN, path)
    }
}

/// Reduces a user agent string to the token robots.txt groups are keyed by
///
/// `woobot/1.0 (+https://woo.example)` becomes `woobot`. Strings that do not
/// start with a token character are returned trimmed but otherwise intact.
pub(crate) fn product_token(user_agent: &str) -> &str {
    let trimmed = user_agent.trim();
    let end = trimmed
        .find(|c: char| !(c.is_ascii_alphabetic() || c == '-' || c == '_'))
        .unwrap_or(trimmed.len());

    if end == 0 {
        trimmed
    } else {
        &trimmed[..end]
    }
}

//! Robots.txt parser implementation
//!
//! Turns fetched policy text into a [`PolicyDocument`]. Rule matching itself
//! is done by the robotstxt crate (see the guard module); this module only
//! decides whether the text is usable and extracts the non-rule directives.

use crate::robots::guard::product_token;
use serde::{Deserialize, Serialize};

/// Directive names that mark text as a robots.txt file
const KNOWN_DIRECTIVES: &[&str] = &[
    "user-agent",
    "useragent",
    "user agent",
    "allow",
    "disallow",
    "crawl-delay",
    "sitemap",
    "host",
];

/// Parsed robots.txt data
///
/// Holds the policy text as fetched. A document built by [`PolicyDocument::allow_all`]
/// (or parsed from text without a single recognisable directive) permits
/// every path for every agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyDocument {
    /// Raw robots.txt content
    content: String,
    /// Allow everything regardless of content
    allow_all: bool,
}

impl PolicyDocument {
    /// Parses robots.txt text
    ///
    /// Never fails. Text that contains no recognisable directive (an HTML
    /// error page served with status 200, binary junk, an empty file) falls
    /// back to [`PolicyDocument::allow_all`], so a broken policy never blocks
    /// crawling.
    ///
    /// # Arguments
    ///
    /// * `text` - The raw robots.txt file content
    pub fn parse(text: &str) -> Self {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);

        let has_directives =
            directives(text).any(|(key, _)| KNOWN_DIRECTIVES.contains(&key.as_str()));
        if !has_directives {
            tracing::debug!("Policy text has no directives, allowing all");
            return Self::allow_all();
        }

        Self {
            content: text.to_string(),
            allow_all: false,
        }
    }

    /// Creates a permissive document that allows everything
    ///
    /// This is used when a site has no robots.txt or it cannot be parsed.
    pub fn allow_all() -> Self {
        Self {
            content: String::new(),
            allow_all: true,
        }
    }

    /// Returns the raw robots.txt content
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Returns true for a permissive document
    pub fn is_allow_all(&self) -> bool {
        self.allow_all
    }

    /// Gets the crawl delay for a specific user agent
    ///
    /// A group naming the agent's product token replaces the `*` group.
    ///
    /// # Arguments
    ///
    /// * `user_agent` - The user agent string (e.g. `woobot/1.0`)
    ///
    /// # Returns
    ///
    /// * `Some(f64)` - The crawl delay in seconds
    /// * `None` - If no crawl delay applies
    pub fn crawl_delay(&self, user_agent: &str) -> Option<f64> {
        if self.allow_all {
            return None;
        }

        let token = product_token(user_agent);
        let mut group: Vec<String> = Vec::new();
        let mut reading_agents = false;
        let mut agent_has_group = false;
        let mut delay_for_agent: Option<f64> = None;
        let mut delay_for_wildcard: Option<f64> = None;

        for (key, value) in directives(&self.content) {
            if matches!(key.as_str(), "user-agent" | "useragent" | "user agent") {
                // Consecutive User-agent lines share one group
                if !reading_agents {
                    group.clear();
                }
                reading_agents = true;
                agent_has_group |= value.eq_ignore_ascii_case(token);
                group.push(value.to_string());
                continue;
            }
            reading_agents = false;

            if key != "crawl-delay" {
                continue;
            }
            let Some(delay) = value
                .parse::<f64>()
                .ok()
                .filter(|d| d.is_finite() && *d >= 0.0)
            else {
                continue;
            };

            if group.iter().any(|ua| ua.eq_ignore_ascii_case(token)) {
                delay_for_agent.get_or_insert(delay);
            } else if group.iter().any(|ua| ua == "*") {
                delay_for_wildcard.get_or_insert(delay);
            }
        }

        // A group for the agent replaces the `*` group entirely
        if agent_has_group {
            delay_for_agent
        } else {
            delay_for_wildcard
        }
    }

    /// Lists the sitemap URLs declared in the document
    pub fn sitemaps(&self) -> Vec<String> {
        directives(&self.content)
            .filter(|(key, value)| key == "sitemap" && !value.is_empty())
            .map(|(_, value)| value.to_string())
            .collect()
    }
}

/// Yields `(lowercased key, trimmed value)` for every `key: value` line
fn directives(content: &str) -> impl Iterator<Item = (String, &str)> + '_ {
    content.lines().filter_map(|line| {
        let line = match line.find('#') {
            Some(idx) => &line[..idx],
            None => line,
        };
        let (key, value) = line.split_once(':')?;
        Some((key.trim().to_lowercase(), value.trim()))
    })
}

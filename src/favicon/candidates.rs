//! Ordered icon source candidates for a page URL
//!
//! The order is a preference policy: the site's own icon first, then the
//! generic icon services, then the browser's internal favicon cache. The
//! resolver stops at the first candidate that loads, so this order decides
//! which icon users actually see.

use std::fmt;

use crate::utils::url::UrlUtils;

/// Where a candidate icon URL comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CandidateSource {
    /// `https://<domain>/favicon.ico`
    SiteRoot,
    /// DuckDuckGo icon directory
    DuckDuckGo,
    /// Google s2 favicon service, asked for twice the requested size
    Google,
    /// Chromium internal favicon cache, only loadable inside the browser
    BrowserInternal,
}

impl CandidateSource {
    /// Probe order, most preferred first
    pub const ORDER: [CandidateSource; 4] = [
        CandidateSource::SiteRoot,
        CandidateSource::DuckDuckGo,
        CandidateSource::Google,
        CandidateSource::BrowserInternal,
    ];

    pub fn url_for(&self, domain: &str, page_url: &str, size: u32) -> String {
        match self {
            Self::SiteRoot => format!("https://{domain}/favicon.ico"),
            Self::DuckDuckGo => format!("https://icons.duckduckgo.com/ip3/{domain}.ico"),
            Self::Google => format!(
                "https://www.google.com/s2/favicons?domain={domain}&sz={}",
                size.saturating_mul(2)
            ),
            Self::BrowserInternal => format!("chrome://favicon/size/{size}/{}", page_url.trim()),
        }
    }
}

impl fmt::Display for CandidateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::SiteRoot => "site-root",
            Self::DuckDuckGo => "duckduckgo",
            Self::Google => "google",
            Self::BrowserInternal => "browser-internal",
        };
        f.write_str(name)
    }
}

/// A single icon URL to probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub source: CandidateSource,
    pub url: String,
}

/// Build the ordered candidate list for `page_url`, empty when it has no domain
pub fn generate_candidates(page_url: &str, size: u32) -> Vec<Candidate> {
    let Some(domain) = UrlUtils::extract_domain(page_url) else {
        return Vec::new();
    };

    CandidateSource::ORDER
        .iter()
        .map(|source| Candidate {
            source: *source,
            url: source.url_for(&domain, page_url, size),
        })
        .collect()
}

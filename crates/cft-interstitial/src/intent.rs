//! Navigation intents and the warning page location that carries them.
//!
//! The interceptor embeds the blocked destination into the warning page URL
//! (`?to=<url>&type=<mode>`); the warning page recovers it here. The
//! isolated view receives the same destination under `?src=<url>`.

use std::fmt;

use cft_types::config::DisplayMode;
use cft_types::error::{CftError, Result};
use percent_encoding::percent_decode_str;
use url::{Host, Url};

/// Query key carrying the blocked destination on the warning page.
pub const TARGET_KEY: &str = "to";

/// Query key carrying the display-mode selector on the warning page.
pub const MODE_KEY: &str = "type";

/// Query key carrying the destination on the isolated view.
pub const ISOLATED_SOURCE_KEY: &str = "src";

// ---------------------------------------------------------------------------
// NavigationIntent
// ---------------------------------------------------------------------------

/// The destination a blocked navigation was heading to.
///
/// Immutable once captured: the intent owns its parsed URL and only hands
/// out borrowed views of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationIntent {
    url: Url,
}

impl NavigationIntent {
    /// Parse an absolute URL with a host.
    pub fn parse(raw: &str) -> Result<Self> {
        let url = Url::parse(raw.trim())
            .map_err(|e| CftError::MalformedIntent(format!("{raw:?}: {e}")))?;
        if url.host().is_none() {
            return Err(CftError::MalformedIntent(format!("{raw:?}: no host")));
        }
        Ok(Self { url })
    }

    /// The serialized (fully encoded) URL.
    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn scheme(&self) -> &str {
        self.url.scheme()
    }

    /// `user[:password]`, if any.
    pub fn userinfo(&self) -> Option<String> {
        let user = self.url.username();
        match (user.is_empty(), self.url.password()) {
            (true, None) => None,
            (_, Some(pass)) => Some(format!("{user}:{pass}")),
            (false, None) => Some(user.to_string()),
        }
    }

    /// Host in its ASCII-compatible (punycode) form.
    pub fn host(&self) -> &str {
        self.url.host_str().unwrap_or_default()
    }

    /// Explicit, non-default port.
    pub fn port(&self) -> Option<u16> {
        self.url.port()
    }

    pub fn path(&self) -> &str {
        self.url.path()
    }

    pub fn query(&self) -> Option<&str> {
        self.url.query()
    }

    pub fn fragment(&self) -> Option<&str> {
        self.url.fragment()
    }

    /// Hostname with every `xn--` label decoded to its native script.
    ///
    /// A label that does not decode cleanly is kept in ASCII so the
    /// warning never shows a mangled host.
    pub fn display_host(&self) -> String {
        match self.url.host() {
            Some(Host::Domain(domain)) => decode_domain(domain),
            Some(_) => self.host().to_string(),
            None => String::new(),
        }
    }

    /// Percent-decoded path, followed by `?query` and `#fragment` when
    /// present.
    pub fn display_detail(&self) -> String {
        let mut detail = decode_component(self.url.path());
        if let Some(query) = self.url.query() {
            detail.push('?');
            detail.push_str(&decode_component(query));
        }
        if let Some(fragment) = self.url.fragment() {
            detail.push('#');
            detail.push_str(&decode_component(fragment));
        }
        detail
    }
}

impl fmt::Display for NavigationIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn decode_domain(domain: &str) -> String {
    domain
        .split('.')
        .map(|label| {
            if !label.starts_with("xn--") {
                return label.to_string();
            }
            match idna::domain_to_unicode(label) {
                (decoded, Ok(())) => decoded,
                (_, Err(e)) => {
                    log::debug!("keeping undecodable label {label}: {e:?}");
                    label.to_string()
                },
            }
        })
        .collect::<Vec<_>>()
        .join(".")
}

fn decode_component(s: &str) -> String {
    percent_decode_str(s).decode_utf8_lossy().into_owned()
}

// ---------------------------------------------------------------------------
// WarningLocation
// ---------------------------------------------------------------------------

/// What the warning page recovers from its own location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarningLocation {
    pub intent: NavigationIntent,
    pub mode: DisplayMode,
}

impl WarningLocation {
    /// Parse the warning page's location.
    ///
    /// Fails with [`CftError::MalformedIntent`] if the location itself is
    /// not a URL, or the embedded target is absent or malformed.
    pub fn parse(raw_location: &str) -> Result<Self> {
        let location = Url::parse(raw_location)
            .map_err(|e| CftError::MalformedIntent(format!("warning location: {e}")))?;

        let mut target = None;
        let mut mode = None;
        for (key, value) in location.query_pairs() {
            match key.as_ref() {
                TARGET_KEY if target.is_none() => target = Some(value.into_owned()),
                MODE_KEY if mode.is_none() => mode = Some(value.into_owned()),
                _ => {},
            }
        }

        let target = target
            .filter(|t| !t.is_empty())
            .ok_or_else(|| CftError::MalformedIntent(format!("missing `{TARGET_KEY}` parameter")))?;

        Ok(Self {
            intent: NavigationIntent::parse(&target)?,
            mode: DisplayMode::from_selector(mode.as_deref()),
        })
    }

    /// Build the warning page URL embedding `intent`.
    ///
    /// The mode selector is omitted for [`DisplayMode::HostOnly`].
    pub fn build(base: &str, intent: &NavigationIntent, mode: DisplayMode) -> Result<String> {
        let mut url = Url::parse(base)?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.clear().append_pair(TARGET_KEY, intent.as_str());
            if mode == DisplayMode::Full {
                pairs.append_pair(MODE_KEY, &mode.selector().to_string());
            }
        }
        Ok(url.into())
    }
}

/// Build the isolated view URL for `intent`.
pub fn isolated_view_url(base: &str, intent: &NavigationIntent) -> Result<String> {
    let mut url = Url::parse(base)?;
    url.query_pairs_mut()
        .clear()
        .append_pair(ISOLATED_SOURCE_KEY, intent.as_str());
    Ok(url.into())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

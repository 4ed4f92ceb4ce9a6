//! Filter oracle: the live blocked/not-blocked decision.

use std::collections::BTreeSet;

use cft_types::error::{CftError, Result};
use url::{Host, Url};

/// Answers whether a URL is blocked under the current rule state.
///
/// Pure query: no side effects, safe to call repeatedly.
pub trait FilterOracle {
    fn is_blocked(&self, url: &Url) -> bool;
}

/// Outcome of loading a rule list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadStats {
    pub loaded: usize,
    pub skipped: usize,
}

/// In-memory set of host rules.
///
/// A rule blocks its host and every subdomain of it. Rules are stored in
/// their ASCII (punycode) form so `例え.テスト` and `xn--r8jz45g.xn--zckzah`
/// are the same rule.
#[derive(Debug, Clone, Default)]
pub struct HostRuleSet {
    rules: BTreeSet<String>,
}

impl HostRuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a rule list.
    ///
    /// One rule per line: the first whitespace-delimited token is the rule
    /// and anything after it is a comment. Lines starting with whitespace
    /// or `#` carry no rule. Tokens that are not plain hosts are skipped.
    pub fn parse(text: &str) -> (Self, LoadStats) {
        let mut set = Self::new();
        let mut stats = LoadStats::default();
        for (line_no, line) in text.lines().enumerate() {
            let Some(token) = line.split_whitespace().next() else {
                continue;
            };
            if line.starts_with(char::is_whitespace) || token.starts_with('#') {
                continue;
            }
            match set.add_rule(token) {
                Ok(_) => stats.loaded += 1,
                Err(e) => {
                    log::debug!("rules:{}: skipping {token:?}: {e}", line_no + 1);
                    stats.skipped += 1;
                },
            }
        }
        (set, stats)
    }

    /// Add a rule. Returns whether the set changed.
    pub fn add_rule(&mut self, rule: &str) -> Result<bool> {
        Ok(self.rules.insert(normalize_rule(rule)?))
    }

    /// Remove a rule. Returns whether the set changed.
    pub fn remove_rule(&mut self, rule: &str) -> bool {
        match normalize_rule(rule) {
            Ok(rule) => self.rules.remove(&rule),
            Err(_) => false,
        }
    }

    pub fn contains(&self, rule: &str) -> bool {
        normalize_rule(rule).is_ok_and(|r| self.rules.contains(&r))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl FilterOracle for HostRuleSet {
    fn is_blocked(&self, url: &Url) -> bool {
        match url.host() {
            Some(Host::Domain(domain)) => {
                let domain = domain.trim_end_matches('.');
                let mut rest = domain;
                loop {
                    if self.rules.contains(rest) {
                        return true;
                    }
                    match rest.split_once('.') {
                        Some((_, parent)) => rest = parent,
                        None => return false,
                    }
                }
            },
            Some(host) => self.rules.contains(&host.to_string()),
            None => false,
        }
    }
}

fn normalize_rule(rule: &str) -> Result<String> {
    let rule = rule.trim().trim_end_matches('.');
    if rule.is_empty() {
        return Err(CftError::Config("empty rule".to_string()));
    }
    if rule.contains(['/', ':', '*', '[', ']']) {
        return Err(CftError::Config(format!("unsupported rule syntax: {rule}")));
    }
    let ascii = idna::domain_to_ascii(rule)
        .map_err(|e| CftError::Config(format!("invalid host rule {rule}: {e:?}")))?;
    if ascii.is_empty()
        || !ascii
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'.')
    {
        return Err(CftError::Config(format!("invalid host rule {rule}")));
    }
    Ok(ascii)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn blocks_host_and_subdomains() {
        let mut set = HostRuleSet::new();
        set.add_rule("farm.test").unwrap();
        assert!(set.is_blocked(&url("https://farm.test/")));
        assert!(set.is_blocked(&url("https://www.farm.test/a?b")));
        assert!(set.is_blocked(&url("https://a.b.farm.test/")));
        assert!(!set.is_blocked(&url("https://notfarm.test/")));
        assert!(!set.is_blocked(&url("https://test/")));
    }

    #[test]
    fn idn_rules_match_punycode_hosts() {
        let mut set = HostRuleSet::new();
        set.add_rule("例え.テスト").unwrap();
        assert!(set.contains("xn--r8jz45g.xn--zckzah"));
        assert!(set.is_blocked(&url("https://例え.テスト/page")));
        assert!(set.is_blocked(&url("https://xn--r8jz45g.xn--zckzah/")));
    }

    #[test]
    fn rules_are_case_insensitive() {
        let mut set = HostRuleSet::new();
        set.add_rule("Farm.TEST").unwrap();
        assert!(set.is_blocked(&url("https://FARM.test/")));
    }

    #[test]
    fn ip_rules_match_exactly() {
        let mut set = HostRuleSet::new();
        set.add_rule("3.4").unwrap();
        set.add_rule("10.0.0.1").unwrap();
        assert!(set.is_blocked(&url("http://10.0.0.1/")));
        assert!(!set.is_blocked(&url("http://1.2.3.4/")));
    }

    #[test]
    fn add_and_remove_report_changes() {
        let mut set = HostRuleSet::new();
        assert!(set.add_rule("farm.test").unwrap());
        assert!(!set.add_rule("FARM.test").unwrap());
        assert!(set.remove_rule("farm.test"));
        assert!(!set.remove_rule("farm.test"));
        assert!(set.is_empty());
    }

    #[test]
    fn unsupported_rules_are_rejected() {
        let mut set = HostRuleSet::new();
        assert!(set.add_rule("/farm\\.test/").is_err());
        assert!(set.add_rule("*.farm.test").is_err());
        assert!(set.add_rule("site:farm.test").is_err());
        assert!(set.add_rule("").is_err());
    }

    #[test]
    fn parse_rule_list() {
        let text = "\
# Content farms
farm.test        some comment
  indented.test  not a rule
spam.example
/regex\\.rule/   unsupported

例え.テスト
";
        let (set, stats) = HostRuleSet::parse(text);
        assert_eq!(stats, LoadStats { loaded: 3, skipped: 1 });
        assert_eq!(set.len(), 3);
        assert!(set.contains("farm.test"));
        assert!(set.contains("spam.example"));
        assert!(!set.contains("indented.test"));
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn any_subdomain_of_rule_is_blocked(
                rule in "[a-z]{2,8}\\.[a-z]{2,4}",
                subs in proptest::collection::vec("[a-z0-9]{1,6}", 0..4),
            ) {
                let mut set = HostRuleSet::new();
                set.add_rule(&rule).unwrap();
                let mut host = rule.clone();
                for sub in subs.iter().rev() {
                    host = format!("{sub}.{host}");
                }
                let target = Url::parse(&format!("https://{host}/")).unwrap();
                prop_assert!(set.is_blocked(&target));
            }

            #[test]
            fn sibling_hosts_are_not_blocked(
                rule in "[a-z]{2,8}\\.test",
                prefix in "[a-z]{1,4}",
            ) {
                let mut set = HostRuleSet::new();
                set.add_rule(&rule).unwrap();
                let target = Url::parse(&format!("https://{prefix}{rule}/")).unwrap();
                prop_assert!(!set.is_blocked(&target));
            }
        }
    }
}

//! Channel selection by name and regular expression.

use chainwatch_core::error::MatcherError;
use regex::Regex;
use serde::Serialize;

use crate::config::ChannelRule;

const ANY: &str = "*";

/// A channel accepted by a rule, with the rule's patterns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchedChannel {
    pub name: String,
    pub match_pattern: String,
    pub not_match_pattern: String,
}

#[derive(Debug)]
struct CompiledRule {
    rule: ChannelRule,
    matcher: Option<Regex>,
    not_matcher: Option<Regex>,
}

impl CompiledRule {
    fn compile(rule: &ChannelRule) -> Result<Self, MatcherError> {
        let matcher = match rule.match_pattern.as_str() {
            "" | ANY => None,
            p => Some(compile(p)?),
        };
        let not_matcher = match rule.not_match_pattern.as_str() {
            "" => None,
            p => Some(compile(p)?),
        };
        Ok(Self {
            rule: rule.clone(),
            matcher,
            not_matcher,
        })
    }

    fn accepts(&self, channel: &str) -> bool {
        if self.rule.match_pattern == ANY {
            return true;
        }
        if !self.rule.name.is_empty() && self.rule.name == channel {
            return true;
        }
        // A rule with only a name never matches other channels.
        let Some(matcher) = &self.matcher else {
            return false;
        };
        matcher.is_match(channel)
            && !self
                .not_matcher
                .as_ref()
                .is_some_and(|not| not.is_match(channel))
    }
}

fn compile(pattern: &str) -> Result<Regex, MatcherError> {
    Regex::new(pattern).map_err(|e| MatcherError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })
}

/// Ordered list of channel rules. The first accepting rule wins.
#[derive(Debug)]
pub struct ChannelMatcher {
    rules: Vec<CompiledRule>,
}

impl ChannelMatcher {
    /// Compile `rules`. An empty list accepts every channel.
    pub fn new(rules: &[ChannelRule]) -> Result<Self, MatcherError> {
        let rules = if rules.is_empty() {
            vec![CompiledRule::compile(&ChannelRule::any())?]
        } else {
            rules.iter().map(CompiledRule::compile).collect::<Result<_, _>>()?
        };
        Ok(Self { rules })
    }

    pub fn any() -> Self {
        Self {
            rules: vec![CompiledRule {
                rule: ChannelRule::any(),
                matcher: None,
                not_matcher: None,
            }],
        }
    }

    pub fn matches(&self, channel: &str) -> Option<MatchedChannel> {
        self.rules
            .iter()
            .find(|r| r.accepts(channel))
            .map(|r| MatchedChannel {
                name: channel.to_string(),
                match_pattern: r.rule.match_pattern.clone(),
                not_match_pattern: r.rule.not_match_pattern.clone(),
            })
    }

    /// Channels from `channels` accepted by some rule, in input order.
    pub fn filter<'a, I>(&self, channels: I) -> Vec<MatchedChannel>
    where
        I: IntoIterator<Item = &'a str>,
    {
        channels.into_iter().filter_map(|c| self.matches(c)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_rules_match_everything() {
        let m = ChannelMatcher::new(&[]).unwrap();
        let hit = m.matches("anything").unwrap();
        assert_eq!(hit.match_pattern, "*");
    }

    #[test]
    fn exact_name_wins_over_exclusion() {
        let rule = ChannelRule {
            name: "sample-test".into(),
            match_pattern: "^sample".into(),
            not_match_pattern: "test".into(),
        };
        let m = ChannelMatcher::new(&[rule]).unwrap();
        assert!(m.matches("sample-test").is_some());
        assert!(m.matches("sample-other-test").is_none());
        assert!(m.matches("sample-prod").is_some());
    }

    #[test]
    fn search_is_unanchored() {
        let m = ChannelMatcher::new(&[ChannelRule::pattern("channel")]).unwrap();
        assert!(m.matches("sample-channel").is_some());
        assert!(m.matches("sample").is_none());
    }

    #[test]
    fn name_only_rule_matches_only_that_name() {
        let m = ChannelMatcher::new(&[ChannelRule::named("fabcar")]).unwrap();
        assert!(m.matches("fabcar").is_some());
        assert!(m.matches("other").is_none());
    }

    #[test]
    fn first_matching_rule_is_reported() {
        let m = ChannelMatcher::new(&[
            ChannelRule::pattern("^a"),
            ChannelRule::any(),
        ])
        .unwrap();
        assert_eq!(m.matches("abc").unwrap().match_pattern, "^a");
        assert_eq!(m.matches("xyz").unwrap().match_pattern, "*");
        assert_eq!(m.filter(["abc", "xyz"]).len(), 2);
    }

    #[test]
    fn invalid_regex_is_rejected() {
        let err = ChannelMatcher::new(&[ChannelRule::pattern("(")]).unwrap_err();
        assert!(matches!(err, MatcherError::InvalidPattern { ref pattern, .. } if pattern == "("));
        let err = ChannelMatcher::new(&[ChannelRule::any().excluding("[")]).unwrap_err();
        assert!(matches!(err, MatcherError::InvalidPattern { .. }));
    }
}

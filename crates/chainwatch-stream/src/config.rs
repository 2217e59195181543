//! Observer configuration.

use chainwatch_core::error::ObserverError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// One channel selection rule. See [`crate::ChannelMatcher`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChannelRule {
    /// Exact channel name; wins over the patterns when equal.
    #[serde(default)]
    pub name: String,
    /// Regular expression the channel name must contain a match for, or `*`.
    #[serde(default)]
    pub match_pattern: String,
    /// Regular expression the channel name must not match (empty = none).
    #[serde(default)]
    pub not_match_pattern: String,
}

impl ChannelRule {
    /// Rule accepting every channel.
    pub fn any() -> Self {
        Self::pattern("*")
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn pattern(match_pattern: impl Into<String>) -> Self {
        Self {
            match_pattern: match_pattern.into(),
            ..Default::default()
        }
    }

    pub fn excluding(mut self, not_match_pattern: impl Into<String>) -> Self {
        self.not_match_pattern = not_match_pattern.into();
        self
    }
}

/// Where a channel stream starts when no override applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeekFrom {
    /// Genesis block.
    #[default]
    Oldest,
    /// Newest block at connect time (`height - 1`).
    Newest,
    /// A fixed block number.
    Fixed(u64),
}

/// Top-level observer configuration.
///
/// ```yaml
/// channels_to_match:
///   - match_pattern: "^sample-"
///     not_match_pattern: "-test$"
/// seek_from: newest
/// seek_from_overrides:
///   sample-channel: 5
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObserverConfig {
    /// Channel selection rules; the first matching rule wins.
    #[serde(default = "default_channels_to_match")]
    pub channels_to_match: Vec<ChannelRule>,
    /// How often the channel watcher polls the peer.
    #[serde(default = "default_peer_channel_observe_period_ms")]
    pub peer_channel_observe_period_ms: u64,
    /// How often the peer stream spawns streams for newly discovered channels.
    #[serde(default = "default_peer_stream_observe_period_ms")]
    pub peer_stream_observe_period_ms: u64,
    /// Terminate a channel stream on orderly upstream end instead of reconnecting.
    #[serde(default)]
    pub stop_recreate_stream: bool,
    /// Delay between reconnect attempts.
    #[serde(default = "default_connect_retry_delay_ms")]
    pub connect_retry_delay_ms: u64,
    /// channel → block number to resume after; the stream starts at `value - 1`.
    #[serde(default)]
    pub seek_from_overrides: BTreeMap<String, u64>,
    /// Fallback start position.
    #[serde(default)]
    pub seek_from: SeekFrom,
    /// Capacity of every per-channel and merged output channel.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

fn default_channels_to_match() -> Vec<ChannelRule> { vec![ChannelRule::any()] }
fn default_peer_channel_observe_period_ms() -> u64 { 30_000 }
fn default_peer_stream_observe_period_ms() -> u64 { 10_000 }
fn default_connect_retry_delay_ms() -> u64 { 5_000 }
fn default_channel_capacity() -> usize { 1 }

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            channels_to_match: default_channels_to_match(),
            peer_channel_observe_period_ms: default_peer_channel_observe_period_ms(),
            peer_stream_observe_period_ms: default_peer_stream_observe_period_ms(),
            stop_recreate_stream: false,
            connect_retry_delay_ms: default_connect_retry_delay_ms(),
            seek_from_overrides: BTreeMap::new(),
            seek_from: SeekFrom::default(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

impl ObserverConfig {
    pub fn from_yaml_str(s: &str) -> Result<Self, ObserverError> {
        let cfg: Self = serde_yaml::from_str(s).map_err(|e| ObserverError::Config(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_json_str(s: &str) -> Result<Self, ObserverError> {
        let cfg: Self = serde_json::from_str(s).map_err(|e| ObserverError::Config(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject values the streaming engine cannot run with.
    pub fn validate(&self) -> Result<(), ObserverError> {
        if self.peer_channel_observe_period_ms == 0 {
            return Err(ObserverError::Config(
                "peer_channel_observe_period_ms must be positive".into(),
            ));
        }
        if self.peer_stream_observe_period_ms == 0 {
            return Err(ObserverError::Config(
                "peer_stream_observe_period_ms must be positive".into(),
            ));
        }
        if self.channel_capacity == 0 {
            return Err(ObserverError::Config("channel_capacity must be positive".into()));
        }
        Ok(())
    }

    pub fn peer_channel_observe_period(&self) -> Duration {
        Duration::from_millis(self.peer_channel_observe_period_ms.max(1))
    }

    pub fn peer_stream_observe_period(&self) -> Duration {
        Duration::from_millis(self.peer_stream_observe_period_ms.max(1))
    }

    pub fn connect_retry_delay(&self) -> Duration {
        Duration::from_millis(self.connect_retry_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_gives_defaults() {
        let cfg = ObserverConfig::from_yaml_str("{}").unwrap();
        assert_eq!(cfg, ObserverConfig::default());
        assert_eq!(cfg.channels_to_match, vec![ChannelRule::any()]);
        assert_eq!(cfg.peer_channel_observe_period(), Duration::from_secs(30));
        assert_eq!(cfg.peer_stream_observe_period(), Duration::from_secs(10));
        assert_eq!(cfg.connect_retry_delay(), Duration::from_secs(5));
        assert_eq!(cfg.seek_from, SeekFrom::Oldest);
        assert!(!cfg.stop_recreate_stream);
    }

    #[test]
    fn yaml_overrides() {
        let cfg = ObserverConfig::from_yaml_str(
            r#"
channels_to_match:
  - name: fabcar-channel
  - match_pattern: "^sample-"
    not_match_pattern: "-test$"
seek_from:
  fixed: 12
seek_from_overrides:
  sample-channel: 5
stop_recreate_stream: true
"#,
        )
        .unwrap();
        assert_eq!(cfg.channels_to_match.len(), 2);
        assert_eq!(cfg.channels_to_match[0], ChannelRule::named("fabcar-channel"));
        assert_eq!(cfg.channels_to_match[1].not_match_pattern, "-test$");
        assert_eq!(cfg.seek_from, SeekFrom::Fixed(12));
        assert_eq!(cfg.seek_from_overrides["sample-channel"], 5);
        assert!(cfg.stop_recreate_stream);
    }

    #[test]
    fn json_seek_from_newest() {
        let cfg = ObserverConfig::from_json_str(r#"{"seek_from":"newest"}"#).unwrap();
        assert_eq!(cfg.seek_from, SeekFrom::Newest);
    }

    #[test]
    fn zero_period_rejected() {
        let err = ObserverConfig::from_yaml_str("peer_stream_observe_period_ms: 0").unwrap_err();
        assert!(matches!(err, ObserverError::Config(_)));
    }
}

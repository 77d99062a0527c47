//! Peer configuration.
//!
//! Options arrive by name from the console (`setoption name X value Y`) and
//! are validated into `PeerConfig` before any peer sees them.

use std::str::FromStr;
use std::time::Duration;

use crate::game::Position;

/// Errors produced while applying an option.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("unknown option '{0}'")]
    UnknownOption(String),

    #[error("option '{0}' needs a value")]
    MissingValue(String),

    #[error("invalid value '{value}' for option '{name}'")]
    InvalidValue { name: String, value: String },
}

/// How the gap between source requests grows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backoff {
    /// Every attempt waits one base delay after the previous one.
    #[default]
    Linear,
    /// The gap doubles after every attempt.
    Doubling,
}

impl FromStr for Backoff {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "linear" => Ok(Backoff::Linear),
            "doubling" => Ok(Backoff::Doubling),
            _ => Err(()),
        }
    }
}

/// Who the trusted source lets act on the pieces during play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MovePolicy {
    /// Only the player seated on the team whose turn it is.
    #[default]
    Strict,
    /// Any player seated on the board.
    Lenient,
}

impl FromStr for MovePolicy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "strict" => Ok(MovePolicy::Strict),
            "lenient" => Ok(MovePolicy::Lenient),
            _ => Err(()),
        }
    }
}

/// Bootstrap schedule of the trusted-source election.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElectionConfig {
    /// `GetSource` broadcasts before self-electing.
    pub retry_attempts: u32,
    pub base_delay: Duration,
    /// Upper bound (exclusive) of the random delay added to every step.
    pub jitter: Duration,
    pub backoff: Backoff,
}

impl Default for ElectionConfig {
    fn default() -> Self {
        ElectionConfig {
            retry_attempts: 3,
            base_delay: Duration::from_millis(5000),
            jitter: Duration::from_millis(1000),
            backoff: Backoff::Linear,
        }
    }
}

impl ElectionConfig {
    /// Offsets from join time at which each step fires, jitter excluded.
    ///
    /// The first `retry_attempts` entries are source requests; the last one
    /// is self-election.
    pub fn schedule(&self) -> Vec<Duration> {
        let mut offsets = Vec::with_capacity(self.retry_attempts as usize + 1);
        let mut at = Duration::ZERO;
        let mut gap = self.base_delay;
        for _ in 0..=self.retry_attempts {
            at += gap;
            offsets.push(at);
            if self.backoff == Backoff::Doubling {
                gap = gap.saturating_mul(2);
            }
        }
        offsets
    }
}

/// Settings applied to every peer created by the console.
#[derive(Debug, Clone, PartialEq)]
pub struct PeerConfig {
    pub election: ElectionConfig,
    pub move_policy: MovePolicy,
    /// Where a self-elected source places the first board.
    pub default_board: Position,
    /// Seeds election jitter; `None` draws from entropy.
    pub seed: Option<u64>,
}

impl Default for PeerConfig {
    fn default() -> Self {
        PeerConfig {
            election: ElectionConfig::default(),
            move_policy: MovePolicy::Strict,
            default_board: Position::new(4.0, 1.0, 8.0),
            seed: None,
        }
    }
}

fn invalid(name: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        name: name.to_string(),
        value: value.to_string(),
    }
}

fn parse_value<T: FromStr>(name: &str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| invalid(name, value))
}

impl PeerConfig {
    /// Applies one named option. Names match case-insensitively.
    pub fn set_option(&mut self, name: &str, value: Option<&str>) -> Result<(), ConfigError> {
        let key = name.to_ascii_lowercase();
        let known = matches!(
            key.as_str(),
            "retryattempts"
                | "retrybasems"
                | "retryjitterms"
                | "backoff"
                | "movepolicy"
                | "seed"
                | "defaultboard"
        );
        if !known {
            return Err(ConfigError::UnknownOption(name.to_string()));
        }
        let value = value
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ConfigError::MissingValue(name.to_string()))?;

        match key.as_str() {
            "retryattempts" => self.election.retry_attempts = parse_value(name, value)?,
            "retrybasems" => {
                let ms: u64 = parse_value(name, value)?;
                if ms == 0 {
                    return Err(invalid(name, value));
                }
                self.election.base_delay = Duration::from_millis(ms);
            }
            "retryjitterms" => {
                self.election.jitter = Duration::from_millis(parse_value(name, value)?)
            }
            "backoff" => self.election.backoff = parse_value(name, value)?,
            "movepolicy" => self.move_policy = parse_value(name, value)?,
            "seed" => self.seed = Some(parse_value(name, value)?),
            _ => {
                let coords = value
                    .split(',')
                    .map(|c| c.trim().parse::<f32>())
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|_| invalid(name, value))?;
                match coords.as_slice() {
                    [x, y, z] => self.default_board = Position::new(*x, *y, *z),
                    _ => return Err(invalid(name, value)),
                }
            }
        }
        Ok(())
    }
}

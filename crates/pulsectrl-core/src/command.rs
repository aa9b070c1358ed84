//! Command grammar for the input stream.
//!
//! One command per line: `<kind> <verb> [<arg>]`, where kind is `sink` or
//! `source` and verb is one of `mute_toggle`, `mute_set`, `mute_clear`,
//! `change <delta>` or `set <level>`. Tokens are whitespace-delimited and
//! matched case-sensitively.

use std::str::FromStr;

use crate::device::DeviceKind;
use crate::error::{Error, Result};

/// What to do to the target device.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VolumeOp {
    /// Flip the current mute state
    ToggleMute,
    /// Force mute on or off
    SetMute(bool),
    /// Add a signed delta to the current average volume
    ChangeVolume(f32),
    /// Set an absolute volume level
    SetVolume(f32),
}

/// A parsed command bound to a device kind, consumed once by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeAction {
    /// Which default device the action applies to
    pub target: DeviceKind,
    /// The operation
    pub op: VolumeOp,
}

impl VolumeAction {
    #[must_use]
    pub fn new(target: DeviceKind, op: VolumeOp) -> Self {
        Self { target, op }
    }
}

impl FromStr for VolumeAction {
    type Err = Error;

    fn from_str(line: &str) -> Result<Self> {
        let mut tokens = line.split_whitespace();

        let kind = tokens.next().ok_or(Error::EmptyLine)?;
        let target =
            DeviceKind::from_token(kind).ok_or_else(|| Error::UnknownKind(kind.to_string()))?;

        let verb = tokens.next().ok_or_else(|| Error::UnknownVerb(String::new()))?;
        let op = match verb {
            "mute_toggle" => VolumeOp::ToggleMute,
            "mute_set" => VolumeOp::SetMute(true),
            "mute_clear" => VolumeOp::SetMute(false),
            "change" => VolumeOp::ChangeVolume(parse_level(verb, tokens.next())?),
            "set" => VolumeOp::SetVolume(parse_level(verb, tokens.next())?),
            other => return Err(Error::UnknownVerb(other.to_string())),
        };

        if let Some(extra) = tokens.next() {
            return Err(Error::UnexpectedToken(extra.to_string()));
        }

        Ok(Self { target, op })
    }
}

fn parse_level(verb: &str, token: Option<&str>) -> Result<f32> {
    let token = token.ok_or_else(|| Error::MissingArgument(verb.to_string()))?;
    match token.parse::<f32>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(Error::InvalidVolume(token.to_string())),
    }
}

/// Parse a command line, reporting why it was rejected.
pub fn try_parse(line: &str) -> Result<VolumeAction> {
    line.parse()
}

/// Parse a command line. Malformed lines yield `None` and are meant to be
/// dropped without comment.
#[must_use]
pub fn parse(line: &str) -> Option<VolumeAction> {
    try_parse(line).ok()
}

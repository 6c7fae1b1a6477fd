//! Video output parameters: aspect ratios and resolutions.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Target aspect ratio for generated video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
pub enum AspectRatio {
    /// 16:9 landscape
    #[default]
    #[serde(rename = "16:9")]
    Landscape,
    /// 9:16 portrait (shorts/reels)
    #[serde(rename = "9:16")]
    Portrait,
    /// 1:1 square
    #[serde(rename = "1:1")]
    Square,
}

impl AspectRatio {
    /// String form accepted by the remote API.
    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Landscape => "16:9",
            AspectRatio::Portrait => "9:16",
            AspectRatio::Square => "1:1",
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AspectRatio {
    type Err = AspectRatioParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "16:9" => Ok(AspectRatio::Landscape),
            "9:16" => Ok(AspectRatio::Portrait),
            "1:1" => Ok(AspectRatio::Square),
            _ => Err(AspectRatioParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown aspect ratio: {0} (expected 16:9, 9:16, or 1:1)")]
pub struct AspectRatioParseError(String);

/// Target output resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
pub enum Resolution {
    #[serde(rename = "480p")]
    Sd,
    /// Default tier for most models
    #[default]
    #[serde(rename = "720p")]
    Hd,
    #[serde(rename = "1080p")]
    FullHd,
}

impl Resolution {
    /// String form accepted by the remote API.
    pub fn as_str(&self) -> &'static str {
        match self {
            Resolution::Sd => "480p",
            Resolution::Hd => "720p",
            Resolution::FullHd => "1080p",
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Resolution {
    type Err = ResolutionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "480p" | "480" => Ok(Resolution::Sd),
            "720p" | "720" => Ok(Resolution::Hd),
            "1080p" | "1080" => Ok(Resolution::FullHd),
            _ => Err(ResolutionParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown resolution: {0} (expected 480p, 720p, or 1080p)")]
pub struct ResolutionParseError(String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aspect_ratio_roundtrip() {
        for (s, ar) in [
            ("16:9", AspectRatio::Landscape),
            ("9:16", AspectRatio::Portrait),
            ("1:1", AspectRatio::Square),
        ] {
            assert_eq!(s.parse::<AspectRatio>().unwrap(), ar);
            assert_eq!(ar.to_string(), s);
        }
        assert!("4:3".parse::<AspectRatio>().is_err());
    }

    #[test]
    fn test_resolution_parse_accepts_bare_numbers() {
        assert_eq!("720".parse::<Resolution>().unwrap(), Resolution::Hd);
        assert_eq!("1080p".parse::<Resolution>().unwrap(), Resolution::FullHd);
        assert!("4k".parse::<Resolution>().is_err());
    }

    #[test]
    fn test_serde_uses_api_strings() {
        let json = serde_json::to_string(&AspectRatio::Portrait).unwrap();
        assert_eq!(json, "\"9:16\"");
        let r: Resolution = serde_json::from_str("\"1080p\"").unwrap();
        assert_eq!(r, Resolution::FullHd);
    }
}

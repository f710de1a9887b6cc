use serde::{Deserialize, Serialize};
use std::fmt;

/// Failure decoding a single telemetry notification. Never fatal to the render loop.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("missing `--` delimiter in {0:?}")]
    MissingDelimiter(String),
    #[error("angle field {0:?} does not end with a degree sign")]
    MissingDegreeSign(String),
    #[error("angle field {0:?} is not an integer")]
    InvalidAngle(String),
    #[error("angle {0} outside [0, 360)")]
    AngleOutOfRange(i64),
    #[error("distance field {0:?} does not end with the `m` unit")]
    MissingUnit(String),
    #[error("distance field {0:?} is not a non-negative integer")]
    InvalidDistance(String),
}

/// Common error type for the radar core.
#[derive(thiserror::Error, Debug)]
pub enum RadarError {
    #[error("no device attached to the telemetry link")]
    MissingDevice,
    #[error("telemetry link closed")]
    LinkClosed,
    #[error("decode failure: {0}")]
    Decode(#[from] DecodeError),
    #[error("invalid color: {0}")]
    InvalidColor(String),
    #[error("serialization failure: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type RadarResult<T> = Result<T, RadarError>;

/// The two mutation entry points the decoder drives on the render engine.
pub trait RadarSink {
    fn push_angle(&mut self, angle: u16);
    fn push_raindrop(&mut self, x: i32, y: i32);
}

/// Opaque RGB color, serialized as `#RRGGBB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const RED: Rgb = Rgb::new(0xFF, 0x00, 0x00);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn with_alpha(self, alpha: u8) -> Rgba {
        Rgba {
            r: self.r,
            g: self.g,
            b: self.b,
            a: alpha,
        }
    }

    pub fn parse(text: &str) -> RadarResult<Self> {
        let hex = text
            .trim()
            .strip_prefix('#')
            .ok_or_else(|| RadarError::InvalidColor(text.to_string()))?;
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(RadarError::InvalidColor(text.to_string()));
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|_| RadarError::InvalidColor(text.to_string()))
        };
        Ok(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl TryFrom<String> for Rgb {
    type Error = RadarError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Rgb::parse(&value)
    }
}

impl From<Rgb> for String {
    fn from(value: Rgb) -> Self {
        value.to_string()
    }
}

/// RGB color with an 8-bit alpha channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba {
        r: 0,
        g: 0,
        b: 0,
        a: 0,
    };
}

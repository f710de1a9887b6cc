use crate::prelude::DecodeError;
use serde::{Deserialize, Serialize};

pub const FIELD_DELIMITER: &str = "--";
pub const DEGREE_SIGN: char = '°';
pub const DISTANCE_UNIT: char = 'm';
pub const RECORD_TERMINATOR: char = ')';

/// One decoded bearing/distance notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    pub angle: u16,
    pub distance: u32,
}

impl Sample {
    pub fn new(angle: u16, distance: u32) -> Self {
        Self { angle, distance }
    }

    /// Canonical wire form, e.g. `30°--45m)`.
    pub fn to_wire(&self) -> String {
        format!(
            "{}{}{}{}{}{}",
            self.angle, DEGREE_SIGN, FIELD_DELIMITER, self.distance, DISTANCE_UNIT, RECORD_TERMINATOR
        )
    }
}

/// Parses `<angle>°--<distance>m)`. The closing parenthesis is optional; the
/// degree sign and the distance unit are required.
pub fn decode(raw: &str) -> Result<Sample, DecodeError> {
    let (angle_field, distance_field) = raw
        .split_once(FIELD_DELIMITER)
        .ok_or_else(|| DecodeError::MissingDelimiter(raw.to_string()))?;

    Ok(Sample {
        angle: parse_angle(angle_field.trim())?,
        distance: parse_distance(distance_field.trim())?,
    })
}

fn parse_angle(field: &str) -> Result<u16, DecodeError> {
    let digits = field
        .strip_suffix(DEGREE_SIGN)
        .ok_or_else(|| DecodeError::MissingDegreeSign(field.to_string()))?
        .trim();
    let angle: i64 = digits
        .parse()
        .map_err(|_| DecodeError::InvalidAngle(field.to_string()))?;
    if !(0..360).contains(&angle) {
        return Err(DecodeError::AngleOutOfRange(angle));
    }
    Ok(angle as u16)
}

fn parse_distance(field: &str) -> Result<u32, DecodeError> {
    let without_terminator = field
        .strip_suffix(RECORD_TERMINATOR)
        .unwrap_or(field)
        .trim_end();
    let digits = without_terminator
        .strip_suffix(DISTANCE_UNIT)
        .ok_or_else(|| DecodeError::MissingUnit(field.to_string()))?
        .trim();
    digits
        .parse()
        .map_err(|_| DecodeError::InvalidDistance(field.to_string()))
}

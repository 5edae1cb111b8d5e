#![allow(clippy::missing_errors_doc)]

use std::{error::Error, fmt};

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use squarelife_level::{Level, LevelError};

const TRANSFER_DOMAIN: &str = "squarelife";
const TRANSFER_VERSION: &str = "v1";

/// Identifier prefix emitted before the encoded level payload.
pub(crate) const TRANSFER_HEADER: &str = "squarelife:v1";
/// Delimiter used to separate the prefix, map dimensions and payload.
const FIELD_DELIMITER: char = ':';

/// Encodes a level into a single-line string suitable for clipboard transfer.
#[must_use]
pub(crate) fn encode(level: &Level) -> String {
    let encoded = STANDARD_NO_PAD.encode(level.to_json());
    format!(
        "{TRANSFER_HEADER}:{}x{}:{encoded}",
        level.map.size.w, level.map.size.h
    )
}

/// Decodes a level from the provided transfer string.
pub(crate) fn decode(value: &str) -> Result<Level, LevelTransferError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(LevelTransferError::EmptyPayload);
    }

    let mut parts = trimmed.split(FIELD_DELIMITER);
    let domain = parts.next().ok_or(LevelTransferError::MissingPrefix)?;
    let version = parts.next().ok_or(LevelTransferError::MissingVersion)?;
    let dimensions = parts.next().ok_or(LevelTransferError::MissingDimensions)?;
    let payload = parts.next().ok_or(LevelTransferError::MissingPayload)?;

    if domain != TRANSFER_DOMAIN {
        return Err(LevelTransferError::InvalidPrefix(domain.to_owned()));
    }
    if version != TRANSFER_VERSION {
        return Err(LevelTransferError::UnsupportedVersion(version.to_owned()));
    }

    let (width, height) = parse_dimensions(dimensions)?;
    let bytes = STANDARD_NO_PAD
        .decode(payload.as_bytes())
        .map_err(LevelTransferError::InvalidEncoding)?;
    let text = String::from_utf8(bytes).map_err(|_| LevelTransferError::NotUtf8)?;
    let level = Level::from_json(&text).map_err(LevelTransferError::InvalidLevel)?;

    if level.map.size.w != width || level.map.size.h != height {
        return Err(LevelTransferError::MismatchedDimensions {
            declared: (width, height),
            actual: (level.map.size.w, level.map.size.h),
        });
    }
    Ok(level)
}

/// Errors that can occur while decoding level transfer strings.
#[derive(Debug)]
pub(crate) enum LevelTransferError {
    /// The provided string was empty or contained only whitespace.
    EmptyPayload,
    /// The prefix segment was missing from the encoded level.
    MissingPrefix,
    /// The encoded level did not contain a version segment.
    MissingVersion,
    /// The encoded level did not include map dimensions.
    MissingDimensions,
    /// The encoded level did not include the payload segment.
    MissingPayload,
    /// The encoded level used an unexpected prefix segment.
    InvalidPrefix(String),
    /// The encoded level used an unsupported version identifier.
    UnsupportedVersion(String),
    /// The map dimensions could not be parsed from the encoded level.
    InvalidDimensions(String),
    /// The declared dimensions disagree with the decoded level's map.
    MismatchedDimensions {
        /// Dimensions from the transfer string header.
        declared: (u32, u32),
        /// Dimensions the decoded level actually declares.
        actual: (u32, u32),
    },
    /// The base64 payload could not be decoded.
    InvalidEncoding(base64::DecodeError),
    /// The decoded payload was not valid UTF-8 text.
    NotUtf8,
    /// The decoded payload was not a valid level document.
    InvalidLevel(LevelError),
}

impl fmt::Display for LevelTransferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyPayload => write!(f, "transfer payload was empty"),
            Self::MissingPrefix => write!(f, "level string is missing the prefix"),
            Self::MissingVersion => write!(f, "level string is missing the version"),
            Self::MissingDimensions => write!(f, "level string is missing the map dimensions"),
            Self::MissingPayload => write!(f, "level string is missing the payload"),
            Self::InvalidPrefix(prefix) => write!(f, "level prefix '{prefix}' is not supported"),
            Self::UnsupportedVersion(version) => {
                write!(f, "level version '{version}' is not supported")
            }
            Self::InvalidDimensions(dimensions) => {
                write!(f, "could not parse map dimensions '{dimensions}'")
            }
            Self::MismatchedDimensions { declared, actual } => write!(
                f,
                "declared dimensions {}x{} disagree with the level's {}x{}",
                declared.0, declared.1, actual.0, actual.1
            ),
            Self::InvalidEncoding(error) => {
                write!(f, "could not decode level payload: {error}")
            }
            Self::NotUtf8 => write!(f, "level payload is not valid UTF-8"),
            Self::InvalidLevel(error) => write!(f, "could not parse level payload: {error}"),
        }
    }
}

impl Error for LevelTransferError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidEncoding(error) => Some(error),
            Self::InvalidLevel(error) => Some(error),
            _ => None,
        }
    }
}

fn parse_dimensions(dimensions: &str) -> Result<(u32, u32), LevelTransferError> {
    let (width, height) = dimensions
        .split_once(['x', 'X'])
        .ok_or_else(|| LevelTransferError::InvalidDimensions(dimensions.to_owned()))?;

    let width = width
        .trim()
        .parse::<u32>()
        .map_err(|_| LevelTransferError::InvalidDimensions(dimensions.to_owned()))?;
    let height = height
        .trim()
        .parse::<u32>()
        .map_err(|_| LevelTransferError::InvalidDimensions(dimensions.to_owned()))?;

    if width == 0 || height == 0 {
        return Err(LevelTransferError::InvalidDimensions(
            dimensions.to_owned(),
        ));
    }

    Ok((width, height))
}

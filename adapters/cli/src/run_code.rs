//! Share codes that pin a run seed, starting theme and depth on one line.

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use deepfield_core::BiomeId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const CODE_DOMAIN: &str = "deepfield";
const CODE_VERSION: &str = "v1";
const FIELD_DELIMITER: char = ':';

/// Prefix emitted before the depth and the encoded payload.
pub(crate) const CODE_HEADER: &str = "deepfield:v1";

/// Everything needed to regenerate a zone exactly.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct RunCode {
    /// Run seed.
    pub(crate) run_seed: u32,
    /// Theme pinned for the first block, if any.
    pub(crate) theme: Option<BiomeId>,
    /// Zone depth, starting at one.
    pub(crate) depth: u32,
}

#[derive(Serialize, Deserialize)]
struct Payload {
    run_seed: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    theme: Option<BiomeId>,
}

/// Reasons a share code could not be read or written.
#[derive(Debug, Error)]
pub(crate) enum RunCodeError {
    #[error("share code was empty")]
    Empty,
    #[error("share code is missing its {0}")]
    Missing(&'static str),
    #[error("share code prefix `{0}` is not supported")]
    InvalidPrefix(String),
    #[error("share code version `{0}` is not supported")]
    UnsupportedVersion(String),
    #[error("could not parse depth `{0}`")]
    InvalidDepth(String),
    #[error("could not decode share code payload: {0}")]
    InvalidEncoding(#[from] base64::DecodeError),
    #[error("could not read share code payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),
}

impl RunCode {
    /// Encodes the code as `deepfield:v1:<depth>:<payload>`.
    pub(crate) fn encode(&self) -> Result<String, RunCodeError> {
        let json = serde_json::to_vec(&Payload {
            run_seed: self.run_seed,
            theme: self.theme.clone(),
        })?;
        let encoded = STANDARD_NO_PAD.encode(json);
        Ok(format!("{CODE_HEADER}:{}:{encoded}", self.depth))
    }

    /// Parses a code produced by [`RunCode::encode`].
    pub(crate) fn decode(value: &str) -> Result<Self, RunCodeError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(RunCodeError::Empty);
        }

        let mut parts = trimmed.split(FIELD_DELIMITER);
        let domain = parts.next().ok_or(RunCodeError::Missing("prefix"))?;
        let version = parts.next().ok_or(RunCodeError::Missing("version"))?;
        let depth = parts.next().ok_or(RunCodeError::Missing("depth"))?;
        let payload = parts.next().ok_or(RunCodeError::Missing("payload"))?;

        if domain != CODE_DOMAIN {
            return Err(RunCodeError::InvalidPrefix(domain.to_owned()));
        }
        if version != CODE_VERSION {
            return Err(RunCodeError::UnsupportedVersion(version.to_owned()));
        }
        let depth = match depth.trim().parse::<u32>() {
            Ok(depth) if depth > 0 => depth,
            _ => return Err(RunCodeError::InvalidDepth(depth.to_owned())),
        };
        let bytes = STANDARD_NO_PAD.decode(payload.as_bytes())?;
        let decoded: Payload = serde_json::from_slice(&bytes)?;

        Ok(Self {
            run_seed: decoded.run_seed,
            theme: decoded.theme,
            depth,
        })
    }
}

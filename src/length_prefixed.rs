//! Decoder for streams of length-prefixed JSON values.
//!
//! The dashboard's session endpoint answers with several JSON documents glued together, each
//! preceded by its length and a `;`:
//!
//! ```text
//! 1234;{"first":"document"}5678;{"second":"document"}
//! ```
//!
//! The declared length counts characters in the producer's encoding, so it is read and kept
//! but the frame boundary is taken from the JSON parser.

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

pub const SEPARATOR: char = ';';

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("expected a decimal length at byte {offset}")]
    MissingLength { offset: usize },
    #[error("length {digits:?} at byte {offset} is out of range")]
    InvalidLength { offset: usize, digits: String },
    #[error("expected ';' after length at byte {offset}")]
    MissingSeparator { offset: usize },
    #[error("invalid JSON value at byte {offset}: {source}")]
    Json {
        offset: usize,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub declared_len: usize,
    pub value: Value,
}

pub struct LengthPrefixedJson<'a> {
    input: &'a str,
    pos: usize,
    failed: bool,
}

impl<'a> LengthPrefixedJson<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            failed: false,
        }
    }

    fn skip_whitespace(&mut self) {
        let rest = &self.input[self.pos..];
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn read_frame(&mut self) -> Result<Frame, FrameError> {
        let start = self.pos;
        let rest = &self.input[start..];
        let digits_len = rest.bytes().take_while(u8::is_ascii_digit).count();
        if digits_len == 0 {
            return Err(FrameError::MissingLength { offset: start });
        }
        let digits = &rest[..digits_len];
        let declared_len = digits
            .parse::<usize>()
            .map_err(|_| FrameError::InvalidLength {
                offset: start,
                digits: digits.to_string(),
            })?;

        let sep_at = start + digits_len;
        if !self.input[sep_at..].starts_with(SEPARATOR) {
            return Err(FrameError::MissingSeparator { offset: sep_at });
        }

        let value_at = sep_at + SEPARATOR.len_utf8();
        let mut values =
            serde_json::Deserializer::from_str(&self.input[value_at..]).into_iter::<Value>();
        let value = match values.next() {
            Some(Ok(value)) => value,
            Some(Err(source)) => {
                return Err(FrameError::Json {
                    offset: value_at,
                    source,
                });
            }
            None => {
                return Err(FrameError::Json {
                    offset: value_at,
                    source: serde::de::Error::custom("missing value after separator"),
                });
            }
        };
        let consumed = values.byte_offset();
        self.pos = value_at + consumed;

        let chars = self.input[value_at..self.pos].chars().count();
        if chars != declared_len {
            debug!(declared_len, chars, "frame length differs from parsed value");
        }

        Ok(Frame {
            declared_len,
            value,
        })
    }
}

impl Iterator for LengthPrefixedJson<'_> {
    type Item = Result<Frame, FrameError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        self.skip_whitespace();
        if self.pos >= self.input.len() {
            return None;
        }
        let frame = self.read_frame();
        if frame.is_err() {
            self.failed = true;
        }
        Some(frame)
    }
}

/// Decodes at most `count` frames from the front of `input`. Whatever follows them is never
/// looked at, so trailing bytes after the last wanted frame are not an error.
pub fn decode_frames(input: &str, count: usize) -> Result<Vec<Frame>, FrameError> {
    LengthPrefixedJson::new(input).take(count).collect()
}

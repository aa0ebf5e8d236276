//! Input codecs.
//!
//! Client input arrives in whatever encoding the client negotiated with a
//! set-encoding message. A [`Decoder`] turns that payload back into the raw
//! bytes written to the backend. Only one decoder is active per session.

use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::{constants, ProtocolError, Result};

/// Decode-only transform applied to inbound input payloads.
pub trait Decoder: Send + Sync + fmt::Debug {
    /// Decode `src` into `dst`, returning the number of bytes written.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` when `src` is not valid for this codec
    /// or `dst` cannot hold the result.
    fn decode(&self, dst: &mut [u8], src: &[u8]) -> Result<usize>;

    /// Name the client uses to select this codec.
    fn name(&self) -> &'static str;
}

/// Identity codec: input is already raw terminal bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullCodec;

impl Decoder for NullCodec {
    fn decode(&self, dst: &mut [u8], src: &[u8]) -> Result<usize> {
        let out = dst
            .get_mut(..src.len())
            .ok_or_else(|| ProtocolError::Decode(constants::ERR_OUTPUT_TOO_SMALL.into()))?;
        out.copy_from_slice(src);
        Ok(src.len())
    }

    fn name(&self) -> &'static str {
        Encoding::Null.as_str()
    }
}

/// Standard padded base64.
#[derive(Debug, Clone, Copy, Default)]
pub struct Base64Codec;

impl Decoder for Base64Codec {
    fn decode(&self, dst: &mut [u8], src: &[u8]) -> Result<usize> {
        STANDARD
            .decode_slice(src, dst)
            .map_err(|e| ProtocolError::Decode(e.to_string()))
    }

    fn name(&self) -> &'static str {
        Encoding::Base64.as_str()
    }
}

/// Encode raw terminal output for an output message.
#[inline]
pub fn encode_output(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Names of the built-in codecs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    /// Raw bytes
    #[default]
    Null,
    /// Standard base64
    Base64,
}

impl Encoding {
    /// Wire name of the encoding
    pub fn as_str(self) -> &'static str {
        match self {
            Encoding::Null => "null",
            Encoding::Base64 => "base64",
        }
    }

    /// Look an encoding up by the name a set-encoding message carries.
    pub fn from_name(name: &[u8]) -> Option<Self> {
        match name {
            b"null" => Some(Encoding::Null),
            b"base64" => Some(Encoding::Base64),
            _ => None,
        }
    }

    /// Build the decoder for this encoding.
    pub fn decoder(self) -> Box<dyn Decoder> {
        match self {
            Encoding::Null => Box::new(NullCodec),
            Encoding::Base64 => Box::new(Base64Codec),
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Encoding {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s.as_bytes())
            .ok_or_else(|| ProtocolError::ConfigError(format!("Unknown encoding: {s}")))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn null_codec_copies_verbatim() {
        let mut dst = [0u8; 8];
        let n = NullCodec.decode(&mut dst, b"\x1b[Aq").unwrap();
        assert_eq!(&dst[..n], b"\x1b[Aq");
    }

    #[test]
    fn null_codec_refuses_to_truncate() {
        let mut dst = [0u8; 2];
        assert!(matches!(
            NullCodec.decode(&mut dst, b"abc"),
            Err(ProtocolError::Decode(_))
        ));
    }

    #[test]
    fn base64_codec_decodes_into_input_sized_buffer() {
        let src = b"aGVsbG8=";
        let mut dst = vec![0u8; src.len()];
        let n = Base64Codec.decode(&mut dst, src).unwrap();
        assert_eq!(&dst[..n], b"hello");
    }

    #[test]
    fn base64_codec_rejects_bad_alphabet_and_padding() {
        let mut dst = [0u8; 16];
        assert!(Base64Codec.decode(&mut dst, b"a*bc").is_err());
        assert!(Base64Codec.decode(&mut dst, b"aGVsbG8").is_err());
        assert!(Base64Codec.decode(&mut dst, b"aG=sbG8=").is_err());
    }

    #[test]
    fn encoding_names_round_trip() {
        for encoding in [Encoding::Null, Encoding::Base64] {
            assert_eq!(Encoding::from_name(encoding.as_str().as_bytes()), Some(encoding));
            assert_eq!(encoding.decoder().name(), encoding.as_str());
            assert_eq!(encoding.as_str().parse::<Encoding>().unwrap(), encoding);
        }
        assert_eq!(Encoding::from_name(b"utf-16"), None);
    }
}

//! Text encodings accepted for INTERLIS catalog files.

use std::fmt;

use thiserror::Error;

/// Character encoding used to decode a catalog file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextEncoding {
    /// UTF-8, the encoding catalog files are expected to use.
    Utf8,
    /// ISO-8859-1, tolerated for older catalogs.
    Latin1,
}

/// Fallback chain tried by [`process_catalog_file`](crate::process_catalog_file).
pub const DEFAULT_ENCODINGS: [TextEncoding; 2] = [TextEncoding::Utf8, TextEncoding::Latin1];

/// Bytes that are not valid in the requested encoding.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("byte at offset {offset} is not valid {encoding}")]
pub struct DecodeError {
    /// Encoding that rejected the input.
    pub encoding: TextEncoding,
    /// Offset of the first invalid byte.
    pub offset: usize,
}

impl TextEncoding {
    /// Human readable name used in messages.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Utf8 => "UTF-8",
            Self::Latin1 => "Latin-1",
        }
    }

    /// Decode `bytes` into a string.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] when `bytes` are not valid UTF-8. Latin-1
    /// maps every byte to a code point and never fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use ilicache_data::TextEncoding;
    ///
    /// let bytes = b"MODEL Stra\xdfen";
    /// assert!(TextEncoding::Utf8.decode(bytes).is_err());
    /// assert_eq!(TextEncoding::Latin1.decode(bytes).as_deref(), Ok("MODEL Straßen"));
    /// ```
    pub fn decode(self, bytes: &[u8]) -> Result<String, DecodeError> {
        match self {
            Self::Utf8 => std::str::from_utf8(bytes)
                .map(str::to_owned)
                .map_err(|err| DecodeError {
                    encoding: self,
                    offset: err.valid_up_to(),
                }),
            Self::Latin1 => Ok(bytes.iter().copied().map(char::from).collect()),
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

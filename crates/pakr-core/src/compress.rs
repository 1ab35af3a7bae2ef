//! Streaming compression codecs.

use std::io::{self, Write};

use flate2::Compression;
use flate2::write::GzEncoder;

use crate::error::PackageError;

/// zstd level used for every zstd stream.
pub const ZSTD_LEVEL: i32 = 3;

/// A codec selectable by name in the descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    /// gzip (RFC 1952).
    Gzip,
    /// Zstandard.
    Zstd,
    /// No compression.
    None,
}

impl Codec {
    /// Parse a codec name; an empty name selects gzip.
    ///
    /// # Errors
    ///
    /// Returns `PackageError::UnsupportedCompression` for unknown names.
    pub fn parse(name: &str, format: &'static str) -> Result<Self, PackageError> {
        match name {
            "" | "gzip" => Ok(Self::Gzip),
            "zstd" => Ok(Self::Zstd),
            "none" => Ok(Self::None),
            other => Err(PackageError::UnsupportedCompression {
                format,
                codec: other.to_string(),
            }),
        }
    }

    /// File-name suffix appended after `.tar`.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Gzip => ".gz",
            Self::Zstd => ".zst",
            Self::None => "",
        }
    }

    /// Wrap `inner` in an encoder for this codec.
    ///
    /// # Errors
    ///
    /// Returns an error if the encoder cannot be initialised.
    pub fn encoder<W: Write>(self, inner: W) -> io::Result<Encoder<W>> {
        Ok(match self {
            Self::Gzip => Encoder::Gzip(GzEncoder::new(inner, Compression::default())),
            Self::Zstd => Encoder::Zstd(zstd::stream::Encoder::new(inner, ZSTD_LEVEL)?),
            Self::None => Encoder::None(inner),
        })
    }
}

/// A compressing writer; call [`Encoder::finish`] to flush the codec frame.
pub enum Encoder<W: Write> {
    /// gzip stream.
    Gzip(GzEncoder<W>),
    /// zstd frame.
    Zstd(zstd::stream::Encoder<'static, W>),
    /// Pass-through.
    None(W),
}

impl<W: Write> std::fmt::Debug for Encoder<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Gzip(_) => "Gzip",
            Self::Zstd(_) => "Zstd",
            Self::None(_) => "None",
        };
        f.debug_tuple("Encoder").field(&name).finish()
    }
}

impl<W: Write> Encoder<W> {
    /// Finish the compressed stream and return the inner writer.
    ///
    /// # Errors
    ///
    /// Returns an error if the trailing frame cannot be written.
    pub fn finish(self) -> io::Result<W> {
        match self {
            Self::Gzip(e) => e.finish(),
            Self::Zstd(e) => e.finish(),
            Self::None(w) => Ok(w),
        }
    }
}

impl<W: Write> Write for Encoder<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Gzip(e) => e.write(buf),
            Self::Zstd(e) => e.write(buf),
            Self::None(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Gzip(e) => e.flush(),
            Self::Zstd(e) => e.flush(),
            Self::None(w) => w.flush(),
        }
    }
}

/// gzip an in-memory buffer.
///
/// # Errors
///
/// Returns an error if compression fails.
pub fn gzip(bytes: &[u8]) -> io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes)?;
    encoder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn parses_codec_names() {
        assert_eq!(Codec::parse("", "deb").unwrap(), Codec::Gzip);
        assert_eq!(Codec::parse("zstd", "deb").unwrap(), Codec::Zstd);
        assert_eq!(Codec::parse("none", "deb").unwrap().extension(), "");
        assert!(matches!(
            Codec::parse("lzma", "deb"),
            Err(PackageError::UnsupportedCompression { .. })
        ));
    }

    #[test]
    fn gzip_roundtrip() {
        let packed = gzip(b"#mtree\n").unwrap();
        let mut out = String::new();
        flate2::read::GzDecoder::new(packed.as_slice())
            .read_to_string(&mut out)
            .unwrap();
        assert_eq!(out, "#mtree\n");
    }

    #[test]
    fn zstd_encoder_produces_frame() {
        let mut encoder = Codec::Zstd.encoder(Vec::new()).unwrap();
        encoder.write_all(b"payload").unwrap();
        let packed = encoder.finish().unwrap();
        assert_eq!(zstd::decode_all(packed.as_slice()).unwrap(), b"payload");
    }
}

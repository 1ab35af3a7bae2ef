//! Write-through hashing.
//!
//! Every content file is read from disk exactly once. The bytes flow through
//! a [`HashingReader`] on their way into an archive, so MD5, SHA-1 and
//! SHA-256 are available the moment the entry has been written.
//! [`HashingWriter`] does the same for whole output streams.

use std::io::{self, Read, Write};

use md5::Md5;
use pakr_schema::{FileDigests, HexDigest};
use sha1::Sha1;
use sha2::{Digest, Sha256};

/// Running MD5, SHA-1 and SHA-256 accumulators plus a byte count.
#[derive(Debug, Clone, Default)]
pub struct Digester {
    md5: Md5,
    sha1: Sha1,
    sha256: Sha256,
    size: u64,
}

impl Digester {
    /// Fresh accumulators.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed bytes to every accumulator.
    pub fn update(&mut self, bytes: &[u8]) {
        self.md5.update(bytes);
        self.sha1.update(bytes);
        self.sha256.update(bytes);
        self.size += bytes.len() as u64;
    }

    /// Finalize all digests.
    pub fn finish(self) -> FileDigests {
        FileDigests {
            size: self.size,
            md5: HexDigest::new(self.md5.finalize().to_vec()),
            sha1: HexDigest::new(self.sha1.finalize().to_vec()),
            sha256: HexDigest::new(self.sha256.finalize().to_vec()),
        }
    }

    /// Digest an in-memory buffer in one call.
    pub fn digest(bytes: &[u8]) -> FileDigests {
        let mut digester = Self::new();
        digester.update(bytes);
        digester.finish()
    }
}

/// A reader that hashes every byte it hands out.
#[derive(Debug)]
pub struct HashingReader<R> {
    inner: R,
    digester: Digester,
}

impl<R: Read> HashingReader<R> {
    /// Wrap `inner`.
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            digester: Digester::new(),
        }
    }

    /// Digests of everything read so far.
    pub fn finish(self) -> FileDigests {
        self.digester.finish()
    }
}

impl<R: Read> Read for HashingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.digester.update(&buf[..n]);
        Ok(n)
    }
}

/// A writer that forwards to `inner` and hashes every accepted byte.
#[derive(Debug)]
pub struct HashingWriter<W> {
    inner: W,
    digester: Digester,
}

impl<W: Write> HashingWriter<W> {
    /// Wrap `inner`.
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            digester: Digester::new(),
        }
    }

    /// Return the wrapped writer and the digests of everything written.
    pub fn finish(self) -> (W, FileDigests) {
        (self.inner, self.digester.finish())
    }
}

impl<W: Write> Write for HashingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.digester.update(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digests_known_vector() {
        let digests = Digester::digest(b"abc");
        assert_eq!(digests.size, 3);
        assert_eq!(digests.md5.to_hex(), "900150983cd24fb0d6963f7d28e17f72");
        assert_eq!(
            digests.sha1.to_hex(),
            "a9993e364706816aba3e25717850c26c9cd0d89d"
        );
        assert_eq!(
            digests.sha256.to_hex(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn reader_hashes_while_copying() {
        let mut reader = HashingReader::new(&b"hello world"[..]);
        let mut sink = Vec::new();
        io::copy(&mut reader, &mut sink).unwrap();
        assert_eq!(sink, b"hello world");
        assert_eq!(reader.finish(), Digester::digest(b"hello world"));
    }

    #[test]
    fn writer_forwards_and_hashes() {
        let mut writer = HashingWriter::new(Vec::new());
        writer.write_all(b"part one, ").unwrap();
        writer.write_all(b"part two").unwrap();
        let (inner, digests) = writer.finish();
        assert_eq!(inner, b"part one, part two");
        assert_eq!(digests, Digester::digest(b"part one, part two"));
    }
}

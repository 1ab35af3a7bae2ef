//! Tar assembly with exact path control.
//!
//! `tar::Builder::append_data` canonicalizes paths, which drops the `./`
//! prefix Deb archives need. [`TarWriter`] writes header names verbatim
//! instead, falling back to GNU long-name records for paths over 100 bytes.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};

use pakr_schema::{Content, FileDigests};
use tar::{Builder, EntryType, Header};

use crate::digest::HashingReader;

/// Size of the two zero blocks that end a tar stream.
pub const TRAILER_LEN: u64 = 1024;

const NAME_FIELD_LEN: usize = 100;
const LONG_LINK: &[u8] = b"././@LongLink";

/// Ownership, mode and timestamp of one archive entry.
#[derive(Debug, Clone, Copy)]
pub struct EntryMeta<'a> {
    /// Permission bits.
    pub mode: u32,
    /// Modification time, Unix seconds.
    pub mtime: u64,
    /// Owning user name.
    pub owner: &'a str,
    /// Owning group name.
    pub group: &'a str,
}

impl<'a> EntryMeta<'a> {
    /// `root:root` metadata for generated files.
    pub fn root(mode: u32, mtime: u64) -> Self {
        Self {
            mode,
            mtime,
            owner: "root",
            group: "root",
        }
    }

    /// Metadata taken from a content entry.
    pub fn of(content: &'a Content) -> Self {
        Self {
            mode: content.mode(),
            mtime: content.mtime(),
            owner: content.owner(),
            group: content.group(),
        }
    }
}

/// A tar stream whose entry names are written byte-for-byte.
pub struct TarWriter<W: Write> {
    builder: Builder<W>,
}

impl<W: Write> std::fmt::Debug for TarWriter<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TarWriter").finish_non_exhaustive()
    }
}

impl<W: Write> TarWriter<W> {
    /// Start a tar stream on `inner`.
    pub fn new(inner: W) -> Self {
        Self {
            builder: Builder::new(inner),
        }
    }

    /// Append a directory entry.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to the underlying stream fails.
    pub fn dir(&mut self, path: &str, meta: EntryMeta<'_>) -> io::Result<()> {
        let header = self.header(path, EntryType::Directory, 0, meta)?;
        self.builder.append(&header, io::empty())
    }

    /// Append a symbolic link pointing at `target`.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to the underlying stream fails.
    pub fn symlink(&mut self, path: &str, target: &str, meta: EntryMeta<'_>) -> io::Result<()> {
        let target = target.as_bytes();
        if target.len() > NAME_FIELD_LEN {
            self.long_record(EntryType::GNULongLink, target)?;
        }
        let mut header = self.header(path, EntryType::Symlink, 0, meta)?;
        write_field(&mut header.as_old_mut().linkname, target);
        header.set_cksum();
        self.builder.append(&header, io::empty())
    }

    /// Append an in-memory file.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to the underlying stream fails.
    pub fn bytes(&mut self, path: &str, data: &[u8], meta: EntryMeta<'_>) -> io::Result<()> {
        let header = self.header(path, EntryType::Regular, data.len() as u64, meta)?;
        self.builder.append(&header, data)
    }

    /// Stream `size` bytes from `reader` into a file entry, hashing them on
    /// the way through.
    ///
    /// # Errors
    ///
    /// Returns an error if reading the source or writing the archive fails,
    /// or if the source ends before `size` bytes.
    pub fn stream<R: Read>(
        &mut self,
        path: &str,
        reader: R,
        size: u64,
        meta: EntryMeta<'_>,
    ) -> io::Result<FileDigests> {
        let header = self.header(path, EntryType::Regular, size, meta)?;
        let mut hashing = HashingReader::new(reader.take(size));
        self.builder.append(&header, &mut hashing)?;
        let digests = hashing.finish();
        if digests.size != size {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("{path}: expected {size} bytes, read {}", digests.size),
            ));
        }
        Ok(digests)
    }

    /// Append a PAX extended header applying `records` to the next entry.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to the underlying stream fails.
    pub fn pax(&mut self, path: &str, records: &[(&str, &[u8])]) -> io::Result<()> {
        let body = pax_body(records);
        let name = format!("PaxHeaders/{}", path.trim_start_matches("./"));
        let header = self.header(
            &name,
            EntryType::XHeader,
            body.len() as u64,
            EntryMeta::root(0o644, 0),
        )?;
        self.builder.append(&header, body.as_slice())
    }

    /// Write the end-of-archive marker and return the underlying stream.
    ///
    /// # Errors
    ///
    /// Returns an error if writing the trailer fails.
    pub fn finish(self) -> io::Result<W> {
        self.builder.into_inner()
    }

    fn header(
        &mut self,
        path: &str,
        kind: EntryType,
        size: u64,
        meta: EntryMeta<'_>,
    ) -> io::Result<Header> {
        let name = path.as_bytes();
        if name.len() > NAME_FIELD_LEN {
            self.long_record(EntryType::GNULongName, name)?;
        }

        let mut header = Header::new_gnu();
        write_field(&mut header.as_old_mut().name, name);
        header.set_entry_type(kind);
        header.set_size(size);
        header.set_mode(meta.mode);
        header.set_mtime(meta.mtime);
        header.set_uid(0);
        header.set_gid(0);
        header.set_username(meta.owner)?;
        header.set_groupname(meta.group)?;
        header.set_cksum();
        Ok(header)
    }

    fn long_record(&mut self, kind: EntryType, value: &[u8]) -> io::Result<()> {
        let mut data = value.to_vec();
        data.push(0);

        let mut header = Header::new_gnu();
        write_field(&mut header.as_old_mut().name, LONG_LINK);
        header.set_entry_type(kind);
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_mtime(0);
        header.set_uid(0);
        header.set_gid(0);
        header.set_cksum();
        self.builder.append(&header, data.as_slice())
    }
}

/// A tar stream parked in an anonymous temporary file.
///
/// Formats whose metadata must precede the content (but is computed from
/// it) write the content here first, then splice the entries into the final
/// archive with [`Spool::drain_into`].
#[derive(Debug)]
pub struct Spool {
    tar: TarWriter<File>,
}

impl Spool {
    /// Create an empty spool.
    ///
    /// # Errors
    ///
    /// Returns an error if no temporary file can be created.
    pub fn new() -> io::Result<Self> {
        Ok(Self {
            tar: TarWriter::new(tempfile::tempfile()?),
        })
    }

    /// The spooled archive, for appending entries.
    pub fn tar(&mut self) -> &mut TarWriter<File> {
        &mut self.tar
    }

    /// Copy every spooled entry (without the trailer) onto `out`.
    ///
    /// # Errors
    ///
    /// Returns an error if the spool cannot be read back or `out` fails.
    pub fn drain_into<W: Write>(self, out: &mut TarWriter<W>) -> io::Result<u64> {
        let mut file = self.tar.finish()?;
        let len = file.stream_position()?;
        file.seek(SeekFrom::Start(0))?;
        let body = len.saturating_sub(TRAILER_LEN);
        io::copy(&mut file.take(body), out.builder.get_mut())
    }
}

/// Finish an in-memory tar without its end-of-archive blocks.
///
/// APK concatenates gzip members of several tar streams; only the last may
/// carry a trailer.
///
/// # Errors
///
/// Returns an error if the trailer cannot be written.
pub fn finish_cut(tar: TarWriter<Vec<u8>>) -> io::Result<Vec<u8>> {
    let mut buf = tar.finish()?;
    let keep = buf.len().saturating_sub(TRAILER_LEN as usize);
    buf.truncate(keep);
    Ok(buf)
}

fn write_field(field: &mut [u8], value: &[u8]) {
    let n = value.len().min(field.len());
    field[..n].copy_from_slice(&value[..n]);
    field[n..].fill(0);
}

fn pax_body(records: &[(&str, &[u8])]) -> Vec<u8> {
    let mut out = Vec::new();
    for (key, value) in records {
        // "<len> <key>=<value>\n", where <len> counts its own digits.
        let rest = key.len() + value.len() + 3;
        let mut len = rest + 1;
        while len.to_string().len() + rest != len {
            len = len.to_string().len() + rest;
        }
        out.extend_from_slice(format!("{len} {key}=").as_bytes());
        out.extend_from_slice(value);
        out.push(b'\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(bytes: &[u8]) -> Vec<(String, EntryType, Vec<u8>)> {
        let mut archive = tar::Archive::new(bytes);
        archive
            .entries()
            .unwrap()
            .map(|e| {
                let mut e = e.unwrap();
                let path = String::from_utf8(e.path_bytes().into_owned()).unwrap();
                let kind = e.header().entry_type();
                let mut data = Vec::new();
                e.read_to_end(&mut data).unwrap();
                (path, kind, data)
            })
            .collect()
    }

    #[test]
    fn keeps_dot_slash_prefix() {
        let mut tar = TarWriter::new(Vec::new());
        tar.dir("./usr", EntryMeta::root(0o755, 0)).unwrap();
        tar.bytes("./usr/hello", b"hi", EntryMeta::root(0o644, 0))
            .unwrap();
        let out = entries(&tar.finish().unwrap());
        assert_eq!(out[0].0, "./usr");
        assert_eq!(out[0].1, EntryType::Directory);
        assert_eq!(out[1].0, "./usr/hello");
        assert_eq!(out[1].2, b"hi");
    }

    #[test]
    fn long_names_use_gnu_records() {
        let long = format!("./{}", "a/".repeat(80));
        let long = long.trim_end_matches('/');
        let mut tar = TarWriter::new(Vec::new());
        tar.bytes(long, b"x", EntryMeta::root(0o644, 0)).unwrap();
        let out = entries(&tar.finish().unwrap());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].0, long);
    }

    #[test]
    fn stream_hashes_and_checks_size() {
        let mut tar = TarWriter::new(Vec::new());
        let digests = tar
            .stream("f", &b"abc"[..], 3, EntryMeta::root(0o600, 5))
            .unwrap();
        assert_eq!(digests.md5.to_hex(), "900150983cd24fb0d6963f7d28e17f72");

        let short = tar.stream("g", &b"ab"[..], 3, EntryMeta::root(0o600, 5));
        assert!(short.is_err());
    }

    #[test]
    fn symlinks_store_target() {
        let mut tar = TarWriter::new(Vec::new());
        tar.symlink("usr/bin/sh", "/bin/bash", EntryMeta::root(0o777, 0))
            .unwrap();
        let bytes = tar.finish().unwrap();
        let mut archive = tar::Archive::new(bytes.as_slice());
        let entry = archive.entries().unwrap().next().unwrap().unwrap();
        assert_eq!(entry.header().entry_type(), EntryType::Symlink);
        assert_eq!(
            entry.link_name().unwrap().unwrap().to_str(),
            Some("/bin/bash")
        );
    }

    #[test]
    fn pax_records_reach_next_entry() {
        let mut tar = TarWriter::new(Vec::new());
        tar.pax("usr/x", &[("APK-TOOLS.checksum.SHA1", b"abcd")])
            .unwrap();
        tar.bytes("usr/x", b"x", EntryMeta::root(0o644, 0)).unwrap();
        let bytes = tar.finish().unwrap();

        let mut archive = tar::Archive::new(bytes.as_slice());
        let mut entry = archive.entries().unwrap().next().unwrap().unwrap();
        let ext: Vec<(String, Vec<u8>)> = entry
            .pax_extensions()
            .unwrap()
            .unwrap()
            .map(|r| {
                let r = r.unwrap();
                (r.key().unwrap().to_string(), r.value_bytes().to_vec())
            })
            .collect();
        assert_eq!(ext, vec![("APK-TOOLS.checksum.SHA1".to_string(), b"abcd".to_vec())]);
        let mut data = Vec::new();
        entry.read_to_end(&mut data).unwrap();
        assert_eq!(data, b"x");
    }

    #[test]
    fn pax_length_counts_itself() {
        assert_eq!(pax_body(&[("k", b"v")]), b"6 k=v\n");
        let body = pax_body(&[("key", &[b'v'; 92])]);
        assert!(body.starts_with(b"101 key="));
        assert_eq!(body.len(), 101);
    }

    #[test]
    fn spool_splices_entries() {
        let mut spool = Spool::new().unwrap();
        spool
            .tar()
            .bytes("content", b"data", EntryMeta::root(0o644, 0))
            .unwrap();

        let mut outer = TarWriter::new(Vec::new());
        outer
            .bytes(".PKGINFO", b"meta", EntryMeta::root(0o644, 0))
            .unwrap();
        spool.drain_into(&mut outer).unwrap();
        let out = entries(&outer.finish().unwrap());
        let names: Vec<&str> = out.iter().map(|e| e.0.as_str()).collect();
        assert_eq!(names, vec![".PKGINFO", "content"]);
    }

    #[test]
    fn cut_tar_has_no_trailer() {
        let mut tar = TarWriter::new(Vec::new());
        tar.bytes(".PKGINFO", b"x", EntryMeta::root(0o644, 0))
            .unwrap();
        let cut = finish_cut(tar).unwrap();
        assert_eq!(cut.len(), 1024);
    }
}

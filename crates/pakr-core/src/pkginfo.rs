//! `key = value` control files (`.PKGINFO` for Arch Linux and APK).

use std::fmt::Display;

/// Comment line opening every generated control file.
pub const GENERATOR_COMMENT: &str = "# Generated by pakr";

/// Builder for `key = value` control text.
///
/// Empty values are skipped so optional fields simply disappear; list fields
/// repeat the key once per item.
#[derive(Debug, Clone)]
pub struct KeyValueWriter {
    buf: String,
}

impl Default for KeyValueWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueWriter {
    /// Start a document with the generator comment.
    pub fn new() -> Self {
        Self {
            buf: format!("{GENERATOR_COMMENT}\n"),
        }
    }

    /// Write `key = value` unless the value renders empty.
    pub fn field(&mut self, key: &str, value: impl Display) -> &mut Self {
        let value = value.to_string();
        if !value.is_empty() {
            self.buf.push_str(key);
            self.buf.push_str(" = ");
            self.buf.push_str(&value);
            self.buf.push('\n');
        }
        self
    }

    /// Write one `key = item` line per item.
    pub fn list<I, T>(&mut self, key: &str, items: I) -> &mut Self
    where
        I: IntoIterator<Item = T>,
        T: Display,
    {
        for item in items {
            self.field(key, item);
        }
        self
    }

    /// The rendered text.
    pub fn as_str(&self) -> &str {
        &self.buf
    }

    /// The rendered bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf.into_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_empty_and_repeats_lists() {
        let mut w = KeyValueWriter::new();
        w.field("pkgname", "foo")
            .field("url", "")
            .field("size", 1234)
            .list("depend", ["bash", "zsh"]);
        assert_eq!(
            w.as_str(),
            "# Generated by pakr\npkgname = foo\nsize = 1234\ndepend = bash\ndepend = zsh\n"
        );
    }
}

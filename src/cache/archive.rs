//! A single opened archive: fuzzy entry lookup and an optional
//! password-aware decrypt fallback (spec §4.1).

use crate::errors::Result;
use percent_encoding::percent_decode_str;
use std::io::{Cursor, Read};
use zip::ZipArchive;

/// An opened model or texture archive, held in memory for the lifetime
/// of the read. `fetch_model`/`fetch_texture` persist the compressed
/// bytes to disk first; this handle just wraps whatever bytes it's
/// given, local file or freshly downloaded.
pub struct ArchiveHandle {
    archive: ZipArchive<Cursor<Vec<u8>>>,
}

impl ArchiveHandle {
    pub fn open(bytes: Vec<u8>) -> Result<Self> {
        let archive = ZipArchive::new(Cursor::new(bytes))?;
        Ok(Self { archive })
    }

    #[must_use]
    pub fn list_entries(&self) -> Vec<String> {
        self.archive.file_names().map(str::to_string).collect()
    }

    /// Fuzzy name resolution, in priority order: exact match;
    /// URL-percent-decoded match; case-insensitive basename match;
    /// case-insensitive basename-without-extension match. The first hit
    /// wins, ties broken by archive enumeration order (spec §4.1).
    fn resolve_name(&self, name: &str) -> Option<String> {
        let names: Vec<&str> = self.archive.file_names().collect();

        if names.iter().any(|&n| n == name) {
            return Some(name.to_string());
        }

        let decoded = percent_decode_str(name).decode_utf8_lossy().into_owned();
        if let Some(hit) = names.iter().find(|&&n| n == decoded) {
            return Some((*hit).to_string());
        }

        let target_base = basename(&decoded).to_ascii_lowercase();
        if let Some(hit) = names
            .iter()
            .find(|&&n| basename(n).eq_ignore_ascii_case(&target_base))
        {
            return Some((*hit).to_string());
        }

        let target_stem = strip_extension(&target_base).to_string();
        names
            .iter()
            .find(|&&n| strip_extension(basename(n)).eq_ignore_ascii_case(&target_stem))
            .map(|&n| n.to_string())
    }

    /// Reads an entry by fuzzy name. Returns `Ok(None)` when no entry
    /// resolves — a missing entry is not an error (spec §4.1, §7). A
    /// resolved entry that fails to open (e.g. AES-encrypted) is retried
    /// with `password` when the `password-archives` feature is enabled.
    pub fn read_entry(&mut self, name: &str, password: Option<&str>) -> Result<Option<Vec<u8>>> {
        let Some(resolved) = self.resolve_name(name) else {
            return Ok(None);
        };

        match self.archive.by_name(&resolved) {
            Ok(mut file) => {
                let mut buf = Vec::new();
                file.read_to_end(&mut buf)?;
                Ok(Some(buf))
            }
            Err(err) => {
                #[cfg(feature = "password-archives")]
                {
                    if let Some(pw) = password {
                        let mut file = self.archive.by_name_decrypt(&resolved, pw.as_bytes())?;
                        let mut buf = Vec::new();
                        file.read_to_end(&mut buf)?;
                        return Ok(Some(buf));
                    }
                }
                #[cfg(not(feature = "password-archives"))]
                {
                    let _ = password;
                }
                Err(err.into())
            }
        }
    }
}

fn basename(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

fn strip_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(i) if i > 0 => &name[..i],
        _ => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basename_strips_directory() {
        assert_eq!(basename("textures/brick.jpg"), "brick.jpg");
        assert_eq!(basename("brick.jpg"), "brick.jpg");
    }

    #[test]
    fn strip_extension_keeps_leading_dot_files() {
        assert_eq!(strip_extension("brick.jpg"), "brick");
        assert_eq!(strip_extension(".hidden"), ".hidden");
    }
}

//! Byte-for-byte zoneinfo scan naming the localtime reference.
//!
//! Modern distributions often install `/etc/localtime` as a plain copy of a
//! zoneinfo file instead of a symlink, so the only way to recover the zone
//! name is to compare the reference against every candidate under the
//! zoneinfo root.

use crate::error::{Error, Result};
use crate::zone::is_zoneinfo_name;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[cfg(test)]
use mockall::automock;

/// Entry kind according to a link-aware stat. Symlinked aliases inside the
/// zoneinfo tree (for example `posix/Australia/Sydney`) must not be treated
/// as candidate files, so the distinction matters.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EntryKind {
    File,
    Directory,
    Other,
}

/// Filesystem access used by the scan, as a seam for tests.
#[cfg_attr(test, automock)]
pub trait ScanFs {
    fn list_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>>;

    /// Kind of the entry itself, without following symlinks.
    fn symlink_kind(&self, path: &Path) -> io::Result<EntryKind>;

    fn file_len(&self, path: &Path) -> io::Result<u64>;

    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>>;
}

#[derive(Debug, Default)]
pub struct HostFs;

impl ScanFs for HostFs {
    fn list_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(path)? {
            entries.push(entry?.path());
        }
        Ok(entries)
    }

    fn symlink_kind(&self, path: &Path) -> io::Result<EntryKind> {
        let file_type = fs::symlink_metadata(path)?.file_type();
        Ok(if file_type.is_dir() {
            EntryKind::Directory
        } else if file_type.is_file() {
            EntryKind::File
        } else {
            EntryKind::Other
        })
    }

    fn file_len(&self, path: &Path) -> io::Result<u64> {
        Ok(fs::metadata(path)?.len())
    }

    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path)
    }
}

/// Walk the zoneinfo root for the first regular file whose relative path is
/// a valid zone name and whose contents equal the reference file, and
/// return that relative path.
///
/// The walk recurses at most two levels deep and skips dotfiles. Sizes are
/// compared before any contents are read. When several files are byte
/// identical the first one in traversal order wins; that order is
/// filesystem dependent, which is accepted nondeterminism.
pub fn find_zone_by_content<F: ScanFs>(scan_fs: &F, root: &Path, reference: &Path) -> Result<String> {
    let reference_len = match scan_fs.file_len(reference) {
        Ok(len) => len,
        Err(e) => {
            warn!("can't access {}: {e}", reference.display());
            return Err(Error::NoMatchFound);
        }
    };

    let mut scan = Scan {
        scan_fs,
        root,
        reference,
        reference_len,
        reference_bytes: None,
    };
    match scan.dir(root, 0)? {
        Some(name) => Ok(name),
        None => Err(Error::NoMatchFound),
    }
}

struct Scan<'a, F> {
    scan_fs: &'a F,
    root: &'a Path,
    reference: &'a Path,
    reference_len: u64,
    /// Loaded on the first size match only.
    reference_bytes: Option<Vec<u8>>,
}

impl<F: ScanFs> Scan<'_, F> {
    fn dir(&mut self, dir: &Path, depth: usize) -> Result<Option<String>> {
        let entries = match self.scan_fs.list_dir(dir) {
            Ok(entries) => entries,
            Err(e) if depth == 0 => {
                warn!("can't list zoneinfo root {}: {e}", dir.display());
                return Err(Error::ZoneInfoRootUnavailable(dir.to_path_buf()));
            }
            Err(e) => {
                debug!("skipping unreadable directory {}: {e}", dir.display());
                return Ok(None);
            }
        };

        for entry in entries {
            if entry
                .file_name()
                .and_then(|name| name.to_str())
                .is_none_or(|name| name.starts_with('.'))
            {
                continue;
            }

            let Ok(kind) = self.scan_fs.symlink_kind(&entry) else {
                continue;
            };
            match kind {
                EntryKind::Directory if depth < 2 => {
                    if let Some(name) = self.dir(&entry, depth + 1)? {
                        return Ok(Some(name));
                    }
                }
                EntryKind::File if (1..=2).contains(&depth) => {
                    let Some(name) = entry
                        .strip_prefix(self.root)
                        .ok()
                        .and_then(|relative| relative.to_str())
                    else {
                        continue;
                    };
                    if is_zoneinfo_name(name) && self.matches_reference(&entry)? {
                        debug!("found zone {name} for {}", self.reference.display());
                        return Ok(Some(name.to_string()));
                    }
                }
                _ => {}
            }
        }
        Ok(None)
    }

    fn matches_reference(&mut self, candidate: &Path) -> Result<bool> {
        let Ok(len) = self.scan_fs.file_len(candidate) else {
            return Ok(false);
        };
        if len != self.reference_len {
            return Ok(false);
        }

        if self.reference_bytes.is_none() {
            match self.scan_fs.read_file(self.reference) {
                Ok(bytes) => self.reference_bytes = Some(bytes),
                Err(e) => {
                    warn!("can't read {}: {e}", self.reference.display());
                    return Err(Error::NoMatchFound);
                }
            }
        }

        let Ok(bytes) = self.scan_fs.read_file(candidate) else {
            return Ok(false);
        };
        Ok(Some(&bytes) == self.reference_bytes.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROOT: &str = "/usr/share/zoneinfo";
    const REFERENCE: &str = "/etc/localtime";

    fn path_is(expected: &str) -> impl Fn(&Path) -> bool + use<> {
        let expected = PathBuf::from(expected);
        move |path: &Path| path == expected
    }

    #[test]
    fn finds_first_matching_file() -> anyhow::Result<()> {
        let mut fs = MockScanFs::new();
        fs.expect_file_len()
            .withf(path_is(REFERENCE))
            .returning(|_| Ok(4));
        fs.expect_list_dir()
            .withf(path_is(ROOT))
            .returning(|_| Ok(vec![PathBuf::from("/usr/share/zoneinfo/America")]));
        fs.expect_list_dir()
            .withf(path_is("/usr/share/zoneinfo/America"))
            .returning(|_| {
                Ok(vec![
                    PathBuf::from("/usr/share/zoneinfo/America/Chicago"),
                    PathBuf::from("/usr/share/zoneinfo/America/New_York"),
                ])
            });
        fs.expect_symlink_kind()
            .withf(path_is("/usr/share/zoneinfo/America"))
            .returning(|_| Ok(EntryKind::Directory));
        fs.expect_symlink_kind()
            .withf(path_is("/usr/share/zoneinfo/America/Chicago"))
            .returning(|_| Ok(EntryKind::File));
        fs.expect_symlink_kind()
            .withf(path_is("/usr/share/zoneinfo/America/New_York"))
            .returning(|_| Ok(EntryKind::File));
        fs.expect_file_len()
            .withf(path_is("/usr/share/zoneinfo/America/Chicago"))
            .returning(|_| Ok(4));
        fs.expect_file_len()
            .withf(path_is("/usr/share/zoneinfo/America/New_York"))
            .returning(|_| Ok(4));
        fs.expect_read_file()
            .withf(path_is(REFERENCE))
            .returning(|_| Ok(b"TZif".to_vec()));
        fs.expect_read_file()
            .withf(path_is("/usr/share/zoneinfo/America/Chicago"))
            .returning(|_| Ok(b"TZIF".to_vec()));
        fs.expect_read_file()
            .withf(path_is("/usr/share/zoneinfo/America/New_York"))
            .returning(|_| Ok(b"TZif".to_vec()));

        let name = find_zone_by_content(&fs, Path::new(ROOT), Path::new(REFERENCE))?;
        assert_eq!(name, "America/New_York");
        Ok(())
    }

    #[test]
    fn size_mismatch_never_reads_contents() {
        let mut fs = MockScanFs::new();
        fs.expect_file_len()
            .withf(path_is(REFERENCE))
            .returning(|_| Ok(100));
        fs.expect_list_dir()
            .withf(path_is(ROOT))
            .returning(|_| Ok(vec![PathBuf::from("/usr/share/zoneinfo/America")]));
        fs.expect_list_dir()
            .withf(path_is("/usr/share/zoneinfo/America"))
            .returning(|_| Ok(vec![PathBuf::from("/usr/share/zoneinfo/America/New_York")]));
        fs.expect_symlink_kind()
            .withf(path_is("/usr/share/zoneinfo/America"))
            .returning(|_| Ok(EntryKind::Directory));
        fs.expect_symlink_kind()
            .withf(path_is("/usr/share/zoneinfo/America/New_York"))
            .returning(|_| Ok(EntryKind::File));
        fs.expect_file_len()
            .withf(path_is("/usr/share/zoneinfo/America/New_York"))
            .returning(|_| Ok(99));
        // No read_file expectation: reading any contents would panic.

        let result = find_zone_by_content(&fs, Path::new(ROOT), Path::new(REFERENCE));
        assert!(matches!(result, Err(Error::NoMatchFound)));
    }

    #[test]
    fn identical_size_with_one_differing_byte_does_not_match() {
        let mut fs = MockScanFs::new();
        fs.expect_file_len().returning(|_| Ok(4));
        fs.expect_list_dir()
            .withf(path_is(ROOT))
            .returning(|_| Ok(vec![PathBuf::from("/usr/share/zoneinfo/America")]));
        fs.expect_list_dir()
            .withf(path_is("/usr/share/zoneinfo/America"))
            .returning(|_| Ok(vec![PathBuf::from("/usr/share/zoneinfo/America/New_York")]));
        fs.expect_symlink_kind()
            .withf(path_is("/usr/share/zoneinfo/America"))
            .returning(|_| Ok(EntryKind::Directory));
        fs.expect_symlink_kind()
            .withf(path_is("/usr/share/zoneinfo/America/New_York"))
            .returning(|_| Ok(EntryKind::File));
        fs.expect_read_file()
            .withf(path_is(REFERENCE))
            .returning(|_| Ok(b"TZif".to_vec()));
        fs.expect_read_file()
            .withf(path_is("/usr/share/zoneinfo/America/New_York"))
            .returning(|_| Ok(b"TZiF".to_vec()));

        let result = find_zone_by_content(&fs, Path::new(ROOT), Path::new(REFERENCE));
        assert!(matches!(result, Err(Error::NoMatchFound)));
    }

    #[test]
    fn symlinked_aliases_and_dotfiles_are_skipped() {
        let mut fs = MockScanFs::new();
        fs.expect_file_len()
            .withf(path_is(REFERENCE))
            .returning(|_| Ok(4));
        fs.expect_list_dir()
            .withf(path_is(ROOT))
            .returning(|_| Ok(vec![PathBuf::from("/usr/share/zoneinfo/posix")]));
        fs.expect_list_dir()
            .withf(path_is("/usr/share/zoneinfo/posix"))
            .returning(|_| {
                Ok(vec![
                    PathBuf::from("/usr/share/zoneinfo/posix/.hidden"),
                    PathBuf::from("/usr/share/zoneinfo/posix/Sydney"),
                ])
            });
        fs.expect_symlink_kind()
            .withf(path_is("/usr/share/zoneinfo/posix"))
            .returning(|_| Ok(EntryKind::Directory));
        // The alias is a symlink, not a regular file under lstat.
        fs.expect_symlink_kind()
            .withf(path_is("/usr/share/zoneinfo/posix/Sydney"))
            .returning(|_| Ok(EntryKind::Other));

        let result = find_zone_by_content(&fs, Path::new(ROOT), Path::new(REFERENCE));
        assert!(matches!(result, Err(Error::NoMatchFound)));
    }

    #[test]
    fn unavailable_root_is_reported() {
        let mut fs = MockScanFs::new();
        fs.expect_file_len()
            .withf(path_is(REFERENCE))
            .returning(|_| Ok(4));
        fs.expect_list_dir()
            .withf(path_is(ROOT))
            .returning(|_| Err(io::Error::from(io::ErrorKind::PermissionDenied)));

        let result = find_zone_by_content(&fs, Path::new(ROOT), Path::new(REFERENCE));
        assert!(matches!(result, Err(Error::ZoneInfoRootUnavailable(_))));
    }
}

use sha2::{Digest, Sha256};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Number of numbered quick-save slots per title.
pub const SLOT_COUNT: u8 = 10;

const APP_DIR: &str = "nesplay";

/// Stable identity of a program image, used to key every persisted artifact.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentHash(String);

impl ContentHash {
    /// Lowercase hex SHA-256 of the image bytes.
    pub fn of(image: &[u8]) -> Self {
        Self(hex::encode(Sha256::digest(image)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveSlot(u8);

impl SaveSlot {
    pub fn new(index: u8) -> Option<Self> {
        (index < SLOT_COUNT).then_some(Self(index))
    }

    pub fn index(self) -> u8 {
        self.0
    }
}

/// Directory holding snapshots and SRAM images.
///
/// Layout, for content hash `H`:
/// - `<base>/<H>.state` (default snapshot)
/// - `<base>/<H>.state.<n>` (quick-save slot `n`)
/// - `<base>/<H>.sram`
#[derive(Debug, Clone)]
pub struct SaveStore {
    base: PathBuf,
}

impl SaveStore {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn ensure_dir(&self) -> io::Result<()> {
        fs::create_dir_all(&self.base)
    }

    pub fn snapshot_path(&self, hash: &ContentHash) -> PathBuf {
        self.base.join(format!("{hash}.state"))
    }

    pub fn slot_path(&self, hash: &ContentHash, slot: SaveSlot) -> PathBuf {
        self.base.join(format!("{hash}.state.{}", slot.index()))
    }

    pub fn sram_path(&self, hash: &ContentHash) -> PathBuf {
        self.base.join(format!("{hash}.sram"))
    }

    pub fn read_sram(&self, hash: &ContentHash) -> io::Result<Vec<u8>> {
        fs::read(self.sram_path(hash))
    }

    pub fn write_sram(&self, hash: &ContentHash, sram: &[u8]) -> io::Result<()> {
        write_atomic(&self.sram_path(hash), sram)
    }
}

/// Write through a sibling temp file and rename it over `path`, creating
/// the parent directory first.
pub fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut tmp_name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);

    fs::write(&tmp, contents)?;
    fs::rename(&tmp, path)
}

fn config_root() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join(APP_DIR);
        }
    }

    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join(APP_DIR);
    }

    if let Some(home) = std::env::var_os("HOME") {
        return PathBuf::from(home).join(".config").join(APP_DIR);
    }

    PathBuf::from(".")
}

fn data_root() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join(APP_DIR);
        }
    }

    if let Some(xdg) = std::env::var_os("XDG_DATA_HOME") {
        return PathBuf::from(xdg).join(APP_DIR);
    }

    if let Some(home) = std::env::var_os("HOME") {
        return PathBuf::from(home)
            .join(".local")
            .join("share")
            .join(APP_DIR);
    }

    PathBuf::from(".")
}

/// Process-wide settings file.
pub fn default_settings_path() -> PathBuf {
    config_root().join("settings.toml")
}

/// Default base directory for snapshots and SRAM.
pub fn default_save_dir() -> PathBuf {
    data_root().join("saves")
}

/// Default directory for screenshots and recorded animations.
pub fn default_capture_dir() -> PathBuf {
    data_root().join("captures")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_lowercase_hex_sha256() {
        let hash = ContentHash::of(b"abc");
        assert_eq!(
            hash.as_str(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn slot_range() {
        assert_eq!(SaveSlot::new(9).map(SaveSlot::index), Some(9));
        assert!(SaveSlot::new(10).is_none());
    }

    #[test]
    fn paths_follow_hash_layout() {
        let store = SaveStore::new("/saves");
        let hash = ContentHash("abcd".to_string());
        assert_eq!(store.snapshot_path(&hash), Path::new("/saves/abcd.state"));
        assert_eq!(
            store.slot_path(&hash, SaveSlot::new(3).unwrap()),
            Path::new("/saves/abcd.state.3")
        );
        assert_eq!(store.sram_path(&hash), Path::new("/saves/abcd.sram"));
    }
}

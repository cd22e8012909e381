//! Named track lists stored as text files in a folder.
//!
//! One item (URL or search query) per line. Blank lines and `#` comments are
//! ignored; a line reading `#shuffle` marks the playlist for shuffled loading.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::utils::fs;
use crate::{Error, Result};

const PLAYLIST_EXTENSION: &str = "txt";
const SHUFFLE_DIRECTIVE: &str = "#shuffle";

/// A loaded playlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Playlist {
    pub name: String,
    pub items: Vec<String>,
    pub shuffle: bool,
}

impl Playlist {
    /// Parse playlist file contents.
    pub fn parse(name: impl Into<String>, contents: &str) -> Self {
        let mut items = Vec::new();
        let mut shuffle = false;

        for line in contents.lines().map(str::trim) {
            if line.is_empty() {
                continue;
            }
            if line.starts_with('#') || line.starts_with("//") {
                if line.eq_ignore_ascii_case(SHUFFLE_DIRECTIVE) {
                    shuffle = true;
                }
                continue;
            }
            items.push(line.to_string());
        }

        Self {
            name: name.into(),
            items,
            shuffle,
        }
    }
}

/// Folder-backed playlist store.
pub struct PlaylistLoader {
    folder: PathBuf,
}

impl PlaylistLoader {
    pub fn new(folder: impl Into<PathBuf>) -> Self {
        Self {
            folder: folder.into(),
        }
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    fn path_for(&self, name: &str) -> Result<PathBuf> {
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_alphanumeric() || c == '_' || c == '-' || c == ' ');
        if !valid {
            return Err(Error::playlist(format!("Invalid playlist name: {:?}", name)));
        }
        Ok(self
            .folder
            .join(format!("{}.{}", name, PLAYLIST_EXTENSION)))
    }

    /// Names of every stored playlist, sorted. Empty if the folder doesn't exist.
    pub async fn playlist_names(&self) -> Result<Vec<String>> {
        let mut entries = match tokio::fs::read_dir(&self.folder).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(fs::io_error("listing playlists", &self.folder, e)),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| fs::io_error("listing playlists", &self.folder, e))?
        {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(PLAYLIST_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }

        names.sort();
        Ok(names)
    }

    /// Create an empty playlist. Fails if it already exists.
    pub async fn create_playlist(&self, name: &str) -> Result<()> {
        let path = self.path_for(name)?;
        fs::ensure_dir_all_with_op("creating playlists folder", &self.folder).await?;

        tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| fs::io_error("creating playlist", &path, e))?;

        info!(playlist = name, "Created playlist");
        Ok(())
    }

    pub async fn delete_playlist(&self, name: &str) -> Result<()> {
        let path = self.path_for(name)?;
        tokio::fs::remove_file(&path)
            .await
            .map_err(|e| fs::io_error("deleting playlist", &path, e))?;

        info!(playlist = name, "Deleted playlist");
        Ok(())
    }

    /// Replace a playlist's items.
    pub async fn write_playlist(&self, name: &str, items: &[String]) -> Result<()> {
        let path = self.path_for(name)?;
        fs::ensure_dir_all_with_op("creating playlists folder", &self.folder).await?;

        let mut contents = items.join("\n");
        contents.push('\n');
        tokio::fs::write(&path, contents)
            .await
            .map_err(|e| fs::io_error("writing playlist", &path, e))?;

        debug!(playlist = name, items = items.len(), "Wrote playlist");
        Ok(())
    }

    /// Load a playlist, or `None` if it doesn't exist.
    pub async fn get_playlist(&self, name: &str) -> Result<Option<Playlist>> {
        let path = self.path_for(name)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => Ok(Some(Playlist::parse(name, &contents))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(fs::io_error("reading playlist", &path, e)),
        }
    }
}

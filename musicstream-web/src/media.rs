//! Uploaded media storage
//!
//! Files live under the media root in one sub-folder per upload kind and
//! are referenced from the database by their path relative to that root.
//! They are served back at `/media/<relative path>`.

use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

/// URL prefix media files are served under
pub const MEDIA_URL: &str = "/media/";

/// Cover shown when a song or podcast has none
pub const DEFAULT_COVER_URL: &str = "/static/images/default-album-art.jpg";

/// Extensions accepted for songs and episodes
pub const AUDIO_EXTENSIONS: [&str; 5] = ["mp3", "wav", "ogg", "m4a", "flac"];

/// Where an upload is stored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Song,
    SongCover,
    PodcastCover,
    Episode,
    ProfileImage,
}

impl MediaKind {
    pub fn folder(self) -> &'static str {
        match self {
            MediaKind::Song => "songs",
            MediaKind::SongCover => "covers",
            MediaKind::PodcastCover => "podcast_covers",
            MediaKind::Episode => "episodes",
            MediaKind::ProfileImage => "profile_images",
        }
    }
}

/// A file received in a multipart form
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// File name as sent by the browser
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    /// Lower-cased extension of the submitted file name, without the dot
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
    }

    pub fn is_audio(&self) -> bool {
        self.extension()
            .map(|ext| AUDIO_EXTENSIONS.contains(&ext.as_str()))
            .unwrap_or(false)
    }

    /// Content sniffing; the browser-supplied content type is not trusted
    pub fn is_image(&self) -> bool {
        infer::is_image(&self.bytes)
    }
}

/// Media root on disk
#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write an upload and return its path relative to the media root
    pub async fn save(&self, kind: MediaKind, file: &UploadedFile) -> std::io::Result<String> {
        let folder = self.root.join(kind.folder());
        tokio::fs::create_dir_all(&folder).await?;

        let unique = Uuid::new_v4().simple().to_string();
        let file_name = format!("{}_{}", &unique[..8], sanitize_file_name(&file.file_name));
        tokio::fs::write(folder.join(&file_name), &file.bytes).await?;

        let relative = format!("{}/{}", kind.folder(), file_name);
        debug!("Stored upload {} ({} bytes)", relative, file.bytes.len());
        Ok(relative)
    }

    /// Best-effort removal; failures are logged, never propagated
    pub async fn remove(&self, relative: &str) {
        let Some(path) = self.resolve(relative) else {
            warn!("Refusing to remove media outside root: {}", relative);
            return;
        };
        match tokio::fs::remove_file(&path).await {
            Ok(()) => debug!("Removed media file {}", relative),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove media file {}: {}", relative, e),
        }
    }

    /// Absolute path for a stored relative path, rejecting traversal
    pub fn resolve(&self, relative: &str) -> Option<PathBuf> {
        let rel = Path::new(relative);
        if rel
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
        {
            Some(self.root.join(rel))
        } else {
            None
        }
    }

    pub fn url(relative: &str) -> String {
        format!("{}{}", MEDIA_URL, relative)
    }

    /// Start a group of saves that are rolled back together
    pub fn stage(&self) -> StagedUploads<'_> {
        StagedUploads {
            store: self,
            saved: Vec::new(),
        }
    }
}

/// Files written for one request that is not yet committed to the database.
///
/// A failed save removes the files already written by the same group; once
/// the row referencing them is stored, call `commit`. On any later error,
/// call `rollback`.
#[derive(Debug)]
pub struct StagedUploads<'a> {
    store: &'a MediaStore,
    saved: Vec<String>,
}

impl StagedUploads<'_> {
    pub async fn save(&mut self, kind: MediaKind, file: &UploadedFile) -> std::io::Result<String> {
        match self.store.save(kind, file).await {
            Ok(relative) => {
                self.saved.push(relative.clone());
                Ok(relative)
            }
            Err(e) => {
                self.remove_saved().await;
                Err(e)
            }
        }
    }

    /// Keep everything saved so far
    pub fn commit(self) {}

    pub async fn rollback(mut self) {
        self.remove_saved().await;
    }

    async fn remove_saved(&mut self) {
        for relative in self.saved.drain(..) {
            self.store.remove(&relative).await;
        }
    }
}

/// Keep ASCII alphanumerics, dot, dash and underscore; strip any directory part
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    let cleaned: String = cleaned.chars().rev().take(100).collect::<Vec<_>>().into_iter().rev().collect();

    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(name: &str, bytes: &[u8]) -> UploadedFile {
        UploadedFile {
            file_name: name.to_string(),
            bytes: bytes.to_vec(),
        }
    }

    // Minimal PNG signature + IHDR start
    const PNG_BYTES: &[u8] = &[
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
        0x52,
    ];

    #[test]
    fn test_audio_extensions_case_insensitive() {
        assert!(upload("track.MP3", b"").is_audio());
        assert!(upload("track.flac", b"").is_audio());
        assert!(upload("a.b.m4a", b"").is_audio());
        assert!(!upload("track.exe", b"").is_audio());
        assert!(!upload("mp3", b"").is_audio());
        assert!(!upload("notes.txt", b"").is_audio());
    }

    #[test]
    fn test_image_sniffing_ignores_name() {
        assert!(upload("cover.txt", PNG_BYTES).is_image());
        assert!(!upload("cover.png", b"plain text, not an image").is_image());
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("My Song (live).mp3"), "My_Song__live_.mp3");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\music\\a.wav"), "a.wav");
        assert_eq!(sanitize_file_name(".hidden"), "hidden");
        assert_eq!(sanitize_file_name(""), "upload");
    }

    #[test]
    fn test_resolve_rejects_traversal() {
        let store = MediaStore::new("/srv/media");
        assert_eq!(
            store.resolve("songs/a.mp3"),
            Some(PathBuf::from("/srv/media/songs/a.mp3"))
        );
        assert!(store.resolve("../secret").is_none());
        assert!(store.resolve("/etc/passwd").is_none());
    }

    #[tokio::test]
    async fn test_save_and_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = MediaStore::new(dir.path());

        let relative = store
            .save(MediaKind::Song, &upload("Hello World.mp3", b"ID3data"))
            .await
            .unwrap();

        assert!(relative.starts_with("songs/"));
        assert!(relative.ends_with("_Hello_World.mp3"));
        let on_disk = dir.path().join(&relative);
        assert_eq!(std::fs::read(&on_disk).unwrap(), b"ID3data");
        assert_eq!(MediaStore::url(&relative), format!("/media/{}", relative));

        store.remove(&relative).await;
        assert!(!on_disk.exists());

        // Removing twice is silent
        store.remove(&relative).await;
    }

    #[tokio::test]
    async fn test_staged_rollback_removes_saved_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = MediaStore::new(dir.path());

        let mut staged = store.stage();
        let audio = staged.save(MediaKind::Song, &upload("a.mp3", b"ID3")).await.unwrap();
        let cover = staged.save(MediaKind::SongCover, &upload("c.png", PNG_BYTES)).await.unwrap();
        staged.rollback().await;

        assert!(!dir.path().join(&audio).exists());
        assert!(!dir.path().join(&cover).exists());
    }

    #[tokio::test]
    async fn test_staged_failed_save_removes_earlier_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = MediaStore::new(dir.path());
        // A plain file where the covers folder belongs makes the second save fail
        std::fs::write(dir.path().join("covers"), b"").unwrap();

        let mut staged = store.stage();
        let audio = staged.save(MediaKind::Song, &upload("a.mp3", b"ID3")).await.unwrap();
        assert!(dir.path().join(&audio).exists());

        let result = staged.save(MediaKind::SongCover, &upload("c.png", PNG_BYTES)).await;
        assert!(result.is_err());
        assert!(!dir.path().join(&audio).exists());
    }

    #[tokio::test]
    async fn test_staged_commit_keeps_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = MediaStore::new(dir.path());

        let mut staged = store.stage();
        let audio = staged.save(MediaKind::Episode, &upload("e.mp3", b"ID3")).await.unwrap();
        staged.commit();

        assert!(dir.path().join(&audio).exists());
    }
}


//! Song, podcast and episode upload forms

use serde::Deserialize;

use super::{FormErrors, MultipartForm, REQUIRED};
use crate::media::UploadedFile;

pub const AUDIO_ONLY: &str = "Please upload audio files only (mp3, wav, ogg, m4a, flac).";

const TITLE_MAX: usize = 200;
const ARTIST_MAX: usize = 200;
const ALBUM_MAX: usize = 200;
const GENRE_MAX: usize = 100;

fn check_audio(errors: &mut FormErrors, field: &str, file: Option<&UploadedFile>) {
    match file {
        None => errors.add(field, REQUIRED),
        Some(file) if !file.is_audio() => errors.add(field, AUDIO_ONLY),
        Some(_) => {}
    }
}

fn check_song_text(errors: &mut FormErrors, title: &str, artist: &str, album: &str, genre: &str) {
    errors.check_text("title", title, true, Some(TITLE_MAX));
    errors.check_text("artist", artist, true, Some(ARTIST_MAX));
    errors.check_text("album", album, false, Some(ALBUM_MAX));
    errors.check_text("genre", genre, false, Some(GENRE_MAX));
}

fn check_podcast_text(errors: &mut FormErrors, title: &str, description: &str) {
    errors.check_text("title", title, true, Some(TITLE_MAX));
    errors.check_text("description", description, true, None);
}

#[derive(Debug, Default)]
pub struct SongForm {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub genre: String,
    pub audio_file: Option<UploadedFile>,
    pub cover_image: Option<UploadedFile>,
}

impl SongForm {
    pub fn from_multipart(mut form: MultipartForm) -> Self {
        Self {
            title: form.text("title"),
            artist: form.text("artist"),
            album: form.text("album"),
            genre: form.text("genre"),
            audio_file: form.take_file("audio_file"),
            cover_image: form.take_file("cover_image"),
        }
    }

    pub fn validate(&self) -> FormErrors {
        let mut errors = FormErrors::new();
        check_song_text(&mut errors, &self.title, &self.artist, &self.album, &self.genre);
        check_audio(&mut errors, "audio_file", self.audio_file.as_ref());
        errors.check_image("cover_image", self.cover_image.as_ref());
        errors
    }
}

#[derive(Debug, Default)]
pub struct PodcastForm {
    pub title: String,
    pub description: String,
    pub cover_image: Option<UploadedFile>,
}

impl PodcastForm {
    pub fn from_multipart(mut form: MultipartForm) -> Self {
        Self {
            title: form.text("title"),
            description: form.text("description"),
            cover_image: form.take_file("cover_image"),
        }
    }

    pub fn validate(&self) -> FormErrors {
        let mut errors = FormErrors::new();
        check_podcast_text(&mut errors, &self.title, &self.description);
        errors.check_image("cover_image", self.cover_image.as_ref());
        errors
    }
}

#[derive(Debug, Default)]
pub struct EpisodeForm {
    pub title: String,
    pub description: String,
    pub audio_file: Option<UploadedFile>,
}

impl EpisodeForm {
    pub fn from_multipart(mut form: MultipartForm) -> Self {
        Self {
            title: form.text("title"),
            description: form.text("description"),
            audio_file: form.take_file("audio_file"),
        }
    }

    pub fn validate(&self) -> FormErrors {
        let mut errors = FormErrors::new();
        errors.check_text("title", &self.title, true, Some(TITLE_MAX));
        errors.check_text("description", &self.description, true, None);
        check_audio(&mut errors, "audio_file", self.audio_file.as_ref());
        errors
    }
}

/// Admin change form for a song; the uploader is given by username
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SongChangeForm {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub genre: String,
    pub uploaded_by: String,
}

impl SongChangeForm {
    pub fn trimmed(self) -> Self {
        Self {
            title: self.title.trim().to_string(),
            artist: self.artist.trim().to_string(),
            album: self.album.trim().to_string(),
            genre: self.genre.trim().to_string(),
            uploaded_by: self.uploaded_by.trim().to_string(),
        }
    }

    /// Everything except the uploader lookup
    pub fn validate(&self) -> FormErrors {
        let mut errors = FormErrors::new();
        check_song_text(&mut errors, &self.title, &self.artist, &self.album, &self.genre);
        errors.check_text("uploaded_by", &self.uploaded_by, true, None);
        errors
    }
}

/// Admin change form for a podcast; the host is given by username
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PodcastChangeForm {
    pub title: String,
    pub description: String,
    pub host: String,
}

impl PodcastChangeForm {
    pub fn trimmed(self) -> Self {
        Self {
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            host: self.host.trim().to_string(),
        }
    }

    pub fn validate(&self) -> FormErrors {
        let mut errors = FormErrors::new();
        check_podcast_text(&mut errors, &self.title, &self.description);
        errors.check_text("host", &self.host, true, None);
        errors
    }
}

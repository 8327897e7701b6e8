//! Episode directory layout and resume detection.
//!
//! Everything a run produces lives directly in
//! `<output_dir>/<Show>/SxxEyy/`, named after the source video stem:
//!
//! ```text
//! Show.S01E02.1080p.mkv            source video
//! Show.S01E02.1080p.heb.srt        subtitle
//! Show.S01E02.1080p.hebsub.mp4     video with burned subtitles
//! Show.S01E02.1080p.whatsapp.mp4   compressed for chat
//! .incomplete/                     torrent payload while downloading
//! ```
//!
//! Outputs are written under a `.tmp.` name and renamed on success, so any
//! file matching one of these patterns is complete.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::debug;

use super::types::EpisodeRequest;
use crate::converter::temp_path_for;

const MEDIA_EXTENSIONS: &[&str] = &[
    "mkv", "mp4", "avi", "m4v", "mov", "wmv", "ts", "webm", "mpg", "mpeg",
];

const INCOMPLETE_DIR: &str = ".incomplete";
const COMPRESSED_MARKER: &str = "whatsapp";
const TEMP_MARKER: &str = ".tmp.";

/// Whether the path has a video container extension.
pub fn is_media_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| MEDIA_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Make a show name usable as a single path component.
pub fn sanitize_component(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let trimmed = cleaned.trim_matches(|c: char| c.is_whitespace() || c == '.');
    if trimmed.is_empty() {
        "_".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Naming rules for one episode directory.
#[derive(Debug, Clone)]
pub struct EpisodeLayout {
    dir: PathBuf,
    tag: String,
}

impl EpisodeLayout {
    pub fn new(output_dir: &Path, request: &EpisodeRequest, tag: &str) -> Self {
        Self {
            dir: output_dir
                .join(sanitize_component(&request.show))
                .join(request.code()),
            tag: tag.to_ascii_lowercase(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Download folder handed to the torrent client.
    pub fn incomplete_dir(&self) -> PathBuf {
        self.dir.join(INCOMPLETE_DIR)
    }

    fn muxed_marker(&self) -> String {
        format!(".{}sub.", self.tag)
    }

    fn subtitle_suffix(&self) -> String {
        format!(".{}.srt", self.tag)
    }

    /// Source video: media extension, and not one of our own outputs.
    pub fn is_source_video(&self, path: &Path) -> bool {
        if !is_media_file(path) {
            return false;
        }
        let name = file_name_lower(path);
        !name.contains(&self.muxed_marker())
            && !name.contains(&format!(".{}.", COMPRESSED_MARKER))
            && !name.contains(TEMP_MARKER)
    }

    pub fn is_subtitle(&self, path: &Path) -> bool {
        let name = file_name_lower(path);
        name.ends_with(&self.subtitle_suffix()) && !name.contains(TEMP_MARKER)
    }

    pub fn is_muxed(&self, path: &Path) -> bool {
        let name = file_name_lower(path);
        name.contains(&self.muxed_marker()) && !name.contains(TEMP_MARKER)
    }

    pub fn is_compressed(&self, path: &Path) -> bool {
        let name = file_name_lower(path);
        name.contains(&format!(".{}.", COMPRESSED_MARKER)) && !name.contains(TEMP_MARKER)
    }

    /// Regular files directly inside the episode directory, sorted by name.
    /// A missing directory has no files.
    pub async fn files(&self) -> std::io::Result<Vec<PathBuf>> {
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() {
                files.push(entry.path());
            }
        }
        files.sort();
        Ok(files)
    }

    /// Largest source video in the episode directory.
    pub async fn find_source_video(&self) -> std::io::Result<Option<PathBuf>> {
        let mut best: Option<(u64, PathBuf)> = None;
        for path in self.files().await? {
            if !self.is_source_video(&path) {
                continue;
            }
            let size = fs::metadata(&path).await?.len();
            if best.as_ref().map_or(true, |(s, _)| size > *s) {
                best = Some((size, path));
            }
        }
        Ok(best.map(|(_, p)| p))
    }

    pub async fn find_subtitle(&self) -> std::io::Result<Option<PathBuf>> {
        Ok(self.files().await?.into_iter().find(|p| self.is_subtitle(p)))
    }

    pub async fn find_muxed(&self) -> std::io::Result<Option<PathBuf>> {
        Ok(self.files().await?.into_iter().find(|p| self.is_muxed(p)))
    }

    pub async fn find_compressed(&self) -> std::io::Result<Option<PathBuf>> {
        Ok(self.files().await?.into_iter().find(|p| self.is_compressed(p)))
    }

    /// File stem with any of our own suffixes removed:
    /// `Show.S01E02.hebsub.mp4` becomes `Show.S01E02`.
    pub fn base_stem(&self, path: &Path) -> String {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let lower = stem.to_ascii_lowercase();
        for suffix in [
            format!(".{}sub", self.tag),
            format!(".{}", COMPRESSED_MARKER),
            format!(".{}", self.tag),
        ] {
            if lower.ends_with(&suffix) {
                return stem[..stem.len() - suffix.len()].to_string();
            }
        }
        stem
    }

    pub fn subtitle_path(&self, video: &Path) -> PathBuf {
        self.dir
            .join(format!("{}.{}.srt", self.base_stem(video), self.tag))
    }

    pub fn muxed_path(&self, video: &Path) -> PathBuf {
        self.dir
            .join(format!("{}.{}sub.mp4", self.base_stem(video), self.tag))
    }

    pub fn compressed_path(&self, video: &Path) -> PathBuf {
        self.dir.join(format!(
            "{}.{}.mp4",
            self.base_stem(video),
            COMPRESSED_MARKER
        ))
    }
}

fn file_name_lower(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default()
}

/// Largest media file anywhere below `root`.
pub async fn find_largest_media(root: &Path) -> std::io::Result<Option<PathBuf>> {
    let mut best: Option<(u64, PathBuf)> = None;
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
            Err(e) => return Err(e),
        };
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let file_type = entry.file_type().await?;
            if file_type.is_dir() {
                pending.push(path);
            } else if file_type.is_file() && is_media_file(&path) {
                let size = entry.metadata().await?.len();
                let better = match &best {
                    None => true,
                    Some((s, p)) => size > *s || (size == *s && path < *p),
                };
                if better {
                    best = Some((size, path));
                }
            }
        }
    }

    Ok(best.map(|(_, p)| p))
}

/// Write `contents` under a temporary name, then rename it into place.
pub async fn write_atomic(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let tmp = temp_path_for(path);
    fs::write(&tmp, contents).await?;
    if let Err(e) = fs::rename(&tmp, path).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(e);
    }
    Ok(())
}

/// Move a file, copying through a temporary name when a rename would cross
/// filesystems.
pub async fn move_file(source: &Path, destination: &Path) -> std::io::Result<()> {
    match fs::rename(source, destination).await {
        Ok(()) => Ok(()),
        Err(e)
            if e.kind() == std::io::ErrorKind::CrossesDevices || e.raw_os_error() == Some(18) =>
        {
            debug!(
                source = %source.display(),
                destination = %destination.display(),
                "Rename crosses filesystems, copying"
            );
            let tmp = temp_path_for(destination);
            fs::copy(source, &tmp).await?;
            fs::rename(&tmp, destination).await?;
            fs::remove_file(source).await
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn layout(root: &Path) -> EpisodeLayout {
        EpisodeLayout::new(root, &EpisodeRequest::new("Rick and Morty", 8, 5), "heb")
    }

    #[test]
    fn test_episode_dir() {
        let l = layout(Path::new("/out"));
        assert_eq!(l.dir(), Path::new("/out/Rick and Morty/S08E05"));
        assert_eq!(
            l.incomplete_dir(),
            PathBuf::from("/out/Rick and Morty/S08E05/.incomplete")
        );
    }

    #[test]
    fn test_sanitize_component() {
        assert_eq!(sanitize_component("AC/DC: Live"), "AC_DC_ Live");
        assert_eq!(sanitize_component("  ..  "), "_");
        assert_eq!(sanitize_component("Mr. Robot."), "Mr. Robot");
    }

    #[test]
    fn test_classification() {
        let l = layout(Path::new("/out"));
        assert!(l.is_source_video(Path::new("Show.S08E05.1080p.MKV")));
        assert!(!l.is_source_video(Path::new("Show.S08E05.hebsub.mp4")));
        assert!(!l.is_source_video(Path::new("Show.S08E05.whatsapp.mp4")));
        assert!(!l.is_source_video(Path::new("Show.S08E05.hebsub.tmp.mp4")));
        assert!(!l.is_source_video(Path::new("Show.S08E05.nfo")));

        assert!(l.is_subtitle(Path::new("Show.S08E05.heb.srt")));
        assert!(!l.is_subtitle(Path::new("Show.S08E05.heb.tmp.srt")));
        assert!(!l.is_subtitle(Path::new("Show.S08E05.en.srt")));

        assert!(l.is_muxed(Path::new("Show.S08E05.hebsub.mp4")));
        assert!(!l.is_muxed(Path::new("Show.S08E05.hebsub.tmp.mp4")));
        assert!(l.is_compressed(Path::new("Show.S08E05.whatsapp.mp4")));
    }

    #[test]
    fn test_derived_names() {
        let l = layout(Path::new("/out"));
        let video = Path::new("/out/Rick and Morty/S08E05/Rick.and.Morty.S08E05.1080p.mkv");
        assert_eq!(
            l.subtitle_path(video).file_name().unwrap(),
            "Rick.and.Morty.S08E05.1080p.heb.srt"
        );
        let muxed = l.muxed_path(video);
        assert_eq!(
            muxed.file_name().unwrap(),
            "Rick.and.Morty.S08E05.1080p.hebsub.mp4"
        );
        assert_eq!(
            l.compressed_path(&muxed).file_name().unwrap(),
            "Rick.and.Morty.S08E05.1080p.whatsapp.mp4"
        );
        assert_eq!(l.base_stem(Path::new("a.heb.srt")), "a");
    }

    #[tokio::test]
    async fn test_find_outputs_in_directory() {
        let tmp = TempDir::new().unwrap();
        let l = layout(tmp.path());
        assert!(l.find_source_video().await.unwrap().is_none());

        fs::create_dir_all(l.dir()).await.unwrap();
        fs::write(l.dir().join("small.mkv"), vec![0u8; 10]).await.unwrap();
        fs::write(l.dir().join("big.mp4"), vec![0u8; 100]).await.unwrap();
        fs::write(l.dir().join("big.hebsub.tmp.mp4"), vec![0u8; 1000])
            .await
            .unwrap();
        fs::write(l.dir().join("big.heb.srt"), b"1").await.unwrap();

        assert_eq!(
            l.find_source_video().await.unwrap(),
            Some(l.dir().join("big.mp4"))
        );
        assert_eq!(
            l.find_subtitle().await.unwrap(),
            Some(l.dir().join("big.heb.srt"))
        );
        assert!(l.find_muxed().await.unwrap().is_none());
        assert!(l.find_compressed().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_largest_media_recurses() {
        let tmp = TempDir::new().unwrap();
        let release = tmp.path().join("Release");
        fs::create_dir_all(release.join("Sample")).await.unwrap();
        fs::write(release.join("Sample").join("sample.mkv"), vec![0u8; 50])
            .await
            .unwrap();
        fs::write(release.join("episode.mkv"), vec![0u8; 500])
            .await
            .unwrap();
        fs::write(release.join("huge.nfo"), vec![0u8; 5000])
            .await
            .unwrap();

        assert_eq!(
            find_largest_media(tmp.path()).await.unwrap(),
            Some(release.join("episode.mkv"))
        );
        assert!(find_largest_media(&tmp.path().join("missing"))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_write_atomic_leaves_no_temp() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("a.heb.srt");
        write_atomic(&path, b"hello").await.unwrap();

        assert_eq!(fs::read_to_string(&path).await.unwrap(), "hello");
        assert!(!tmp.path().join("a.heb.tmp.srt").exists());
    }

    #[tokio::test]
    async fn test_move_file() {
        let tmp = TempDir::new().unwrap();
        let from = tmp.path().join("in").join("x.mkv");
        fs::create_dir_all(from.parent().unwrap()).await.unwrap();
        fs::write(&from, b"video").await.unwrap();
        let to = tmp.path().join("x.mkv");

        move_file(&from, &to).await.unwrap();
        assert!(to.exists());
        assert!(!from.exists());
    }
}

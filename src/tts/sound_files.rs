//! Bounded store for synthesized audio.
//!
//! Files are named after the text they contain and kept oldest-first by
//! creation time. Before each write the store evicts enough of the oldest
//! files that the directory never holds more than `max_files` entries once
//! the new file lands.

use std::fs;
use std::io::{self, Cursor, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::{Context, Result};
use bytes::Bytes;
use glob::{MatchOptions, Pattern};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::interface::Waveform;

pub const SOUND_FILE_EXTENSION: &str = "wav";

const MAX_STEM_BYTES: usize = 200;
const FALLBACK_STEM: &str = "untitled";

/// Sound files in `dir`, oldest first. A missing directory lists as empty.
pub fn list_sound_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let pattern = format!(
        "{}/*.{}",
        Pattern::escape(&dir.to_string_lossy()),
        SOUND_FILE_EXTENSION
    );
    let options = MatchOptions {
        require_literal_leading_dot: true,
        ..MatchOptions::new()
    };

    let mut files: Vec<(SystemTime, PathBuf)> = Vec::new();
    for entry in glob::glob_with(&pattern, options).context("Invalid sound file pattern")? {
        let path = match entry {
            Ok(path) => path,
            Err(e) => {
                warn!("Skipping unreadable sound file entry: {}", e);
                continue;
            }
        };

        let metadata = match fs::metadata(&path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to stat sound file {:?}", path))
            }
        };

        if metadata.is_file() {
            files.push((creation_time(&metadata), path));
        }
    }

    files.sort();
    Ok(files.into_iter().map(|(_, path)| path).collect())
}

/// Birth time where the filesystem records one, otherwise mtime.
fn creation_time(metadata: &fs::Metadata) -> SystemTime {
    metadata
        .created()
        .or_else(|_| metadata.modified())
        .unwrap_or(SystemTime::UNIX_EPOCH)
}

/// Make room for one more file in `dir`.
///
/// When `dir` already holds `max_files` or more sound files, the oldest
/// `count - max_files + 1` are deleted. Files that vanish before they can
/// be deleted are not an error; any other I/O failure is returned.
///
/// Returns the number of files removed.
pub fn ensure_capacity(dir: &Path, max_files: usize) -> Result<usize> {
    let existing = list_sound_files(dir)?;
    if existing.len() < max_files {
        return Ok(0);
    }

    let to_delete = (existing.len() + 1 - max_files).min(existing.len());
    let mut evicted = 0;

    for path in existing.iter().take(to_delete) {
        match fs::remove_file(path) {
            Ok(()) => {
                debug!("Evicted sound file {:?}", path);
                evicted += 1;
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("Sound file {:?} already removed", path);
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to evict sound file {:?}", path))
            }
        }
    }

    Ok(evicted)
}

/// Turn synthesized text into a safe file stem.
pub fn sanitize_file_stem(text: &str) -> String {
    let replaced: String = text
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let trimmed = replaced.trim_matches(|c: char| c == '.' || c.is_whitespace());

    let mut end = trimmed.len().min(MAX_STEM_BYTES);
    while !trimmed.is_char_boundary(end) {
        end -= 1;
    }
    let stem = trimmed[..end].trim_end_matches(|c: char| c == '.' || c.is_whitespace());

    if stem.is_empty() {
        FALLBACK_STEM.to_string()
    } else {
        stem.to_string()
    }
}

/// Encode `waveform` as mono 32-bit float WAV.
pub fn encode_wav(waveform: &Waveform) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: waveform.sampling_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer =
            hound::WavWriter::new(&mut cursor, spec).context("Failed to start WAV encoding")?;
        for &sample in &waveform.samples {
            writer.write_sample(sample)?;
        }
        writer.finalize()?;
    }
    Ok(cursor.into_inner())
}

/// The artifact directory plus its capacity bound.
pub struct SoundFileStore {
    dir: PathBuf,
    max_files: usize,
    lock: Mutex<()>,
}

impl SoundFileStore {
    pub fn new(dir: impl Into<PathBuf>, max_files: usize) -> Self {
        Self {
            dir: dir.into(),
            max_files,
            lock: Mutex::new(()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn max_files(&self) -> usize {
        self.max_files
    }

    pub fn path_for(&self, text: &str) -> PathBuf {
        self.dir
            .join(format!("{}.{}", sanitize_file_stem(text), SOUND_FILE_EXTENSION))
    }

    pub fn list(&self) -> Result<Vec<PathBuf>> {
        list_sound_files(&self.dir)
    }

    /// Evict as needed, then persist `audio` under a name derived from `text`.
    pub async fn store(&self, text: &str, audio: Bytes) -> Result<PathBuf> {
        let _guard = self.lock.lock().await;

        let dir = self.dir.clone();
        let max_files = self.max_files;
        let path = self.path_for(text);

        tokio::task::spawn_blocking(move || -> Result<PathBuf> {
            let evicted = ensure_capacity(&dir, max_files)?;
            if evicted > 0 {
                info!("Evicted {} old sound file(s) from {:?}", evicted, dir);
            }

            fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create sound file directory {:?}", dir))?;

            // A fresh inode gives re-synthesized text a new creation time.
            let mut staged = tempfile::Builder::new()
                .prefix(".")
                .suffix(".part")
                .tempfile_in(&dir)
                .with_context(|| format!("Failed to stage sound file in {:?}", dir))?;
            staged
                .write_all(&audio)
                .with_context(|| format!("Failed to write sound file {:?}", path))?;
            staged
                .persist(&path)
                .with_context(|| format!("Failed to move sound file into {:?}", path))?;
            debug!("Wrote sound file {:?} ({} bytes)", path, audio.len());
            Ok(path)
        })
        .await
        .context("Sound file writer task failed")?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;
    use std::time::Duration;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, b"RIFF").unwrap();
        // Keep creation timestamps strictly ordered.
        sleep(Duration::from_millis(15));
        path
    }

    fn names(paths: &[PathBuf]) -> Vec<String> {
        paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    fn tone() -> Bytes {
        let waveform = Waveform {
            samples: vec![0.0, 0.25, -0.25, 0.5],
            sampling_rate: 16_000,
        };
        Bytes::from(encode_wav(&waveform).unwrap())
    }

    #[test]
    fn missing_directory_is_empty() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nope");
        assert!(list_sound_files(&missing).unwrap().is_empty());
        assert_eq!(ensure_capacity(&missing, 10).unwrap(), 0);
    }

    #[test]
    fn below_capacity_is_untouched() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "a.wav");
        touch(temp.path(), "b.wav");

        assert_eq!(ensure_capacity(temp.path(), 3).unwrap(), 0);
        assert_eq!(list_sound_files(temp.path()).unwrap().len(), 2);
    }

    #[test]
    fn evicts_oldest_by_creation_time_not_name() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "zeta.wav");
        touch(temp.path(), "alpha.wav");
        touch(temp.path(), "mid.wav");

        assert_eq!(ensure_capacity(temp.path(), 3).unwrap(), 1);
        assert_eq!(
            names(&list_sound_files(temp.path()).unwrap()),
            vec!["alpha.wav", "mid.wav"]
        );
    }

    #[test]
    fn evicts_down_to_one_below_capacity() {
        let temp = TempDir::new().unwrap();
        for name in ["e.wav", "d.wav", "c.wav", "b.wav", "a.wav"] {
            touch(temp.path(), name);
        }

        assert_eq!(ensure_capacity(temp.path(), 2).unwrap(), 4);
        assert_eq!(names(&list_sound_files(temp.path()).unwrap()), vec!["a.wav"]);
    }

    #[test]
    fn ignores_other_files() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "notes.txt");
        touch(temp.path(), ".hidden.wav");
        touch(temp.path(), "one.wav");
        fs::create_dir(temp.path().join("dir.wav")).unwrap();

        assert_eq!(names(&list_sound_files(temp.path()).unwrap()), vec!["one.wav"]);
        assert_eq!(ensure_capacity(temp.path(), 1).unwrap(), 1);
        assert!(temp.path().join("notes.txt").exists());
        assert!(temp.path().join(".hidden.wav").exists());
    }

    #[test]
    fn glob_metacharacters_in_directory_are_literal() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("out[1]");
        fs::create_dir(&dir).unwrap();
        touch(&dir, "x.wav");

        assert_eq!(list_sound_files(&dir).unwrap().len(), 1);
    }

    #[test]
    fn sanitizes_file_stems() {
        assert_eq!(sanitize_file_stem("ياخشىمۇسىز"), "ياخشىمۇسىز");
        assert_eq!(sanitize_file_stem("a/b\\c"), "a_b_c");
        assert_eq!(sanitize_file_stem("  hello.  "), "hello");
        assert_eq!(sanitize_file_stem(".."), "untitled");
        assert_eq!(sanitize_file_stem(""), "untitled");

        let long = "ئ".repeat(300);
        let stem = sanitize_file_stem(&long);
        assert!(stem.len() <= MAX_STEM_BYTES);
        assert!(stem.chars().all(|c| c == 'ئ'));
    }

    #[test]
    fn encodes_float_wav() {
        let wav = tone();
        let reader = hound::WavReader::new(Cursor::new(wav.to_vec())).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 16_000);
        assert_eq!(spec.sample_format, hound::SampleFormat::Float);
        assert_eq!(reader.len(), 4);
    }

    #[tokio::test]
    async fn twelve_calls_keep_the_last_ten() {
        let temp = TempDir::new().unwrap();
        let store = SoundFileStore::new(temp.path().join("sound_files"), 10);

        for i in 1..=12 {
            store.store(&format!("T{}", i), tone()).await.unwrap();
            assert!(store.list().unwrap().len() <= 10);
            tokio::time::sleep(Duration::from_millis(15)).await;
        }

        let remaining = names(&store.list().unwrap());
        let expected: Vec<String> = (3..=12).map(|i| format!("T{}.wav", i)).collect();
        assert_eq!(remaining, expected);
    }

    #[tokio::test]
    async fn resynthesized_text_counts_as_newest() {
        let temp = TempDir::new().unwrap();
        let store = SoundFileStore::new(temp.path().join("sound_files"), 3);

        for text in ["A", "B", "A", "C", "D"] {
            store.store(text, tone()).await.unwrap();
            tokio::time::sleep(Duration::from_millis(30)).await;
        }

        assert_eq!(names(&store.list().unwrap()), vec!["A.wav", "C.wav", "D.wav"]);
        let leftovers = fs::read_dir(store.dir())
            .unwrap()
            .filter(|e| e.as_ref().unwrap().file_name().to_string_lossy().ends_with(".part"))
            .count();
        assert_eq!(leftovers, 0);
    }

    #[tokio::test]
    async fn store_creates_directory() {
        let temp = TempDir::new().unwrap();
        let store = SoundFileStore::new(temp.path().join("a").join("b"), 2);

        let path = store.store("سالام", tone()).await.unwrap();
        assert!(path.exists());
        assert_eq!(path, store.path_for("سالام"));
    }
}

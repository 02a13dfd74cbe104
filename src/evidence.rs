use crate::error::Result;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

/// URL prefix under which the evidence directory is served
pub const WEB_PREFIX: &str = "/screenshots";

static LAST_STAMP: AtomicI64 = AtomicI64::new(0);

/// Millisecond timestamp that is strictly greater than every one handed out before
/// in this process.
fn next_stamp() -> i64 {
    let now = chrono::Utc::now().timestamp_millis();
    let mut last = LAST_STAMP.load(Ordering::Relaxed);
    loop {
        let candidate = now.max(last + 1);
        match LAST_STAMP.compare_exchange_weak(last, candidate, Ordering::SeqCst, Ordering::Relaxed)
        {
            Ok(_) => return candidate,
            Err(actual) => last = actual,
        }
    }
}

/// Convert a suggested name into a safe file stem
pub fn sanitize_filename(name: &str) -> String {
    let name = name.replace("http://", "").replace("https://", "");
    let file = Path::new(&name)
        .file_name()
        .map(|f| f.to_string_lossy().to_string())
        .unwrap_or_default();
    let stem = file.split('.').next().unwrap_or_default();
    let mut stem = stem.replace(['/', '\\', ':', '?', '&', '=', '#', '%', ' '], "_");

    if stem.is_empty() {
        stem = "screenshot".to_string();
    }

    // Limit filename length
    if stem.len() > 100 {
        let mut cut = 100;
        while !stem.is_char_boundary(cut) {
            cut -= 1;
        }
        stem.truncate(cut);
    }
    stem
}

/// Writes screenshots into one directory and returns their web paths.
///
/// Clones share one log of everything saved, so evidence survives a routine
/// that never returned its paths.
#[derive(Debug, Clone)]
pub struct EvidenceSink {
    dir: PathBuf,
    saved: Arc<Mutex<Vec<String>>>,
}

impl EvidenceSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            saved: Arc::default(),
        }
    }

    /// Web paths of every screenshot saved through this sink or its clones, in order
    pub fn saved(&self) -> Vec<String> {
        self.saved
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persist `png` as `<stem>-<timestamp>.png` and return `/screenshots/<file>`
    pub async fn save(&self, png: &[u8], suggested_name: &str) -> Result<String> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let filename = format!("{}-{}.png", sanitize_filename(suggested_name), next_stamp());
        tokio::fs::write(self.dir.join(&filename), png).await?;

        ::log::debug!("Saved screenshot {}", filename);
        let path = format!("{}/{}", WEB_PREFIX, filename);
        self.saved
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(path.clone());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("screenshot.png"), "screenshot");
        assert_eq!(sanitize_filename("out/result-page.png"), "result-page");
        assert_eq!(sanitize_filename("my shot?.png"), "my_shot_");
        assert_eq!(sanitize_filename(""), "screenshot");
        assert_eq!(sanitize_filename(&"a".repeat(300)).len(), 100);
    }

    #[test]
    fn test_stamps_are_strictly_increasing() {
        let stamps: Vec<i64> = (0..1000).map(|_| next_stamp()).collect();
        assert!(stamps.windows(2).all(|w| w[0] < w[1]));
    }

    #[tokio::test]
    async fn test_same_name_twice_never_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let sink = EvidenceSink::new(dir.path().join("nested/screens"));

        let first = sink.save(b"one", "page.png").await.unwrap();
        let second = sink.save(b"two", "page.png").await.unwrap();

        assert_ne!(first, second);
        assert!(first.starts_with("/screenshots/page-"));
        assert!(first.ends_with(".png"));

        let files = std::fs::read_dir(sink.dir()).unwrap().count();
        assert_eq!(files, 2);
        assert_eq!(sink.saved(), vec![first, second]);
    }

    #[tokio::test]
    async fn test_clones_share_the_saved_log() {
        let dir = tempfile::tempdir().unwrap();
        let sink = EvidenceSink::new(dir.path());
        let clone = sink.clone();

        let path = clone.save(b"png", "after-click").await.unwrap();

        assert_eq!(sink.saved(), vec![path]);
    }
}

use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

use super::{TextureLoadError, TextureLoader, TextureResult, TextureSource};
use crate::scene::TextureId;

/// Upper bound on a downloaded image body (the 8k night map is ~12 MB).
#[cfg(feature = "http")]
const MAX_DOWNLOAD_BYTES: u64 = 64 * 1024 * 1024;

/// Fetch and decode one texture on the calling thread.
pub fn fetch(
    source: &TextureSource,
) -> Result<image::RgbaImage, TextureLoadError> {
    let bytes = match source {
        TextureSource::Path(path) => std::fs::read(path)?,
        TextureSource::Url(url) => download(url)?,
    };
    Ok(image::load_from_memory(&bytes)?.to_rgba8())
}

#[cfg(feature = "http")]
fn download(url: &str) -> Result<Vec<u8>, TextureLoadError> {
    log::info!("Downloading texture {url}");
    let response = ureq::get(url)
        .call()
        .map_err(|e| TextureLoadError::Http(e.to_string()))?;
    let mut body = response.into_body();
    body.with_config()
        .limit(MAX_DOWNLOAD_BYTES)
        .read_to_vec()
        .map_err(|e| TextureLoadError::Http(e.to_string()))
}

#[cfg(not(feature = "http"))]
fn download(url: &str) -> Result<Vec<u8>, TextureLoadError> {
    Err(TextureLoadError::Unsupported(format!(
        "{url} (built without the `http` feature)"
    )))
}

/// Loads each texture on its own worker thread and hands results back
/// through a channel.
pub struct ThreadedTextureLoader {
    sender: Sender<TextureResult>,
    receiver: Receiver<TextureResult>,
    in_flight: usize,
}

impl Default for ThreadedTextureLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ThreadedTextureLoader {
    /// Loader with nothing in flight.
    #[must_use]
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            sender,
            receiver,
            in_flight: 0,
        }
    }

    /// Requests that have not delivered a result yet.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }
}

impl TextureLoader for ThreadedTextureLoader {
    fn request(&mut self, id: TextureId, source: &TextureSource) {
        let sender = self.sender.clone();
        let job = source.clone();
        let spawned = std::thread::Builder::new()
            .name(format!("texture-{}", id.0))
            .spawn(move || {
                let result = fetch(&job);
                // The loader may have been dropped; nothing to report to.
                let _ = sender.send((id, result));
            });
        match spawned {
            Ok(_) => self.in_flight += 1,
            Err(e) => {
                log::error!("failed to spawn texture worker: {e}");
                let _ = self.sender.send((id, Err(TextureLoadError::Io(e))));
                self.in_flight += 1;
            }
        }
    }

    fn poll(&mut self) -> Vec<TextureResult> {
        let mut done = Vec::new();
        loop {
            match self.receiver.try_recv() {
                Ok(result) => {
                    self.in_flight = self.in_flight.saturating_sub(1);
                    done.push(result);
                }
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => {
                    break;
                }
            }
        }
        done
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::*;

    fn write_png(name: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(name);
        let img = image::RgbaImage::from_pixel(4, 2, image::Rgba([9, 8, 7, 255]));
        img.save(&path).unwrap();
        path
    }

    fn poll_until_done(loader: &mut ThreadedTextureLoader) -> Vec<TextureResult> {
        let deadline = Instant::now() + Duration::from_secs(10);
        let mut results = Vec::new();
        while loader.in_flight() > 0 && Instant::now() < deadline {
            results.extend(loader.poll());
            std::thread::sleep(Duration::from_millis(5));
        }
        results
    }

    #[test]
    fn fetch_decodes_local_png() {
        let path = write_png("earthglass-fetch.png");
        let img = fetch(&TextureSource::Path(path.clone())).unwrap();
        assert_eq!(img.dimensions(), (4, 2));
        assert_eq!(img.get_pixel(0, 0).0, [9, 8, 7, 255]);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn threaded_loader_delivers_success_and_failure() {
        let path = write_png("earthglass-threaded.png");
        let mut loader = ThreadedTextureLoader::new();
        loader.request(TextureId(0), &TextureSource::Path(path.clone()));
        loader.request(
            TextureId(1),
            &TextureSource::Path("/definitely/not/here.png".into()),
        );

        let mut results = poll_until_done(&mut loader);
        results.sort_by_key(|(id, _)| *id);
        assert_eq!(results.len(), 2);
        assert!(results[0].1.is_ok());
        assert!(matches!(results[1].1, Err(TextureLoadError::Io(_))));
        let _ = std::fs::remove_file(path);
    }
}

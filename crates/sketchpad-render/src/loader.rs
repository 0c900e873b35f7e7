//! Asynchronous background decoding, cancelable by replacement.
//!
//! Each request bumps a generation counter. A decode that finishes after a
//! newer request was made is discarded, so the visible background always
//! follows the most recent reference.

use crate::background::BackgroundImage;
use crate::error::BackgroundError;
use sketchpad_core::{BackgroundRef, DrawingDocument};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

#[derive(Debug, Default)]
struct LoaderState {
    generation: u64,
    source: Option<BackgroundRef>,
    current: Option<Arc<BackgroundImage>>,
}

type DecodeFn = dyn Fn(&BackgroundRef) -> Result<BackgroundImage, BackgroundError> + Send + Sync;

/// Decodes background images off the event thread.
#[derive(Clone)]
pub struct BackgroundLoader {
    state: Arc<Mutex<LoaderState>>,
    runtime: Handle,
    decode: Arc<DecodeFn>,
}

impl fmt::Debug for BackgroundLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackgroundLoader")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl BackgroundLoader {
    /// Create a loader that runs decodes on the given runtime.
    pub fn new(runtime: Handle) -> Self {
        Self::with_decoder(runtime, BackgroundImage::decode)
    }

    fn with_decoder(
        runtime: Handle,
        decode: impl Fn(&BackgroundRef) -> Result<BackgroundImage, BackgroundError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            state: Arc::new(Mutex::new(LoaderState::default())),
            runtime,
            decode: Arc::new(decode),
        }
    }

    /// Create a loader on the runtime of the calling task, if any.
    pub fn from_current() -> Option<Self> {
        Handle::try_current().ok().map(Self::new)
    }

    fn lock(&self) -> MutexGuard<'_, LoaderState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// The most recently decoded background, if any.
    pub fn current(&self) -> Option<Arc<BackgroundImage>> {
        self.lock().current.clone()
    }

    /// The reference of the most recent request.
    pub fn source(&self) -> Option<BackgroundRef> {
        self.lock().source.clone()
    }

    /// Start decoding `source`, superseding any in-flight decode.
    ///
    /// The returned task resolves to true if its result was applied, false
    /// if a newer request replaced it first. A decode failure is applied
    /// too: the background is reset to none and a warning is logged.
    pub fn request(&self, source: Option<BackgroundRef>) -> JoinHandle<bool> {
        let generation = {
            let mut state = self.lock();
            state.generation += 1;
            state.source = source.clone();
            state.generation
        };

        let state = Arc::clone(&self.state);
        let decode = Arc::clone(&self.decode);
        self.runtime.spawn_blocking(move || {
            let decoded = match &source {
                Some(source) => {
                    log::info!("Decoding background image (request {})", generation);
                    match decode(source) {
                        Ok(image) => Some(Arc::new(image)),
                        Err(e) => {
                            log::warn!("Background image unavailable: {}", e);
                            None
                        }
                    }
                }
                None => None,
            };

            let mut state = state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            if state.generation != generation {
                log::info!(
                    "Discarding background request {} superseded by {}",
                    generation,
                    state.generation
                );
                return false;
            }
            state.current = decoded;
            true
        })
    }

    /// Request a decode if the document's background differs from the last request.
    pub fn sync(&self, document: &DrawingDocument) -> Option<JoinHandle<bool>> {
        if self.lock().source.as_ref() == document.background() {
            return None;
        }
        Some(self.request(document.background().cloned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::background::tests::solid_png;
    use sketchpad_core::DrawingSession;
    use std::sync::mpsc;

    #[tokio::test]
    async fn test_request_decodes() {
        let loader = BackgroundLoader::new(Handle::current());
        let source = BackgroundRef::from_bytes(solid_png(8, 4, [0, 255, 0, 255]));

        assert!(loader.request(Some(source.clone())).await.unwrap());
        let current = loader.current().unwrap();
        assert_eq!((current.width(), current.height()), (8, 4));
        assert_eq!(loader.source(), Some(source));
    }

    #[tokio::test]
    async fn test_latest_request_wins() {
        let slow = BackgroundRef::from_bytes(solid_png(64, 64, [255, 0, 0, 255]));
        let (release, gate) = mpsc::channel::<()>();
        let gate = Mutex::new(gate);
        let gated = slow.clone();
        let loader = BackgroundLoader::with_decoder(Handle::current(), move |source| {
            if *source == gated {
                let _ = gate.lock().unwrap().recv();
            }
            BackgroundImage::decode(source)
        });

        let first = loader.request(Some(slow));
        let second = loader.request(Some(BackgroundRef::from_bytes(solid_png(3, 5, [0, 0, 255, 255]))));

        assert!(second.await.unwrap());
        release.send(()).unwrap();
        assert!(!first.await.unwrap());

        let current = loader.current().unwrap();
        assert_eq!((current.width(), current.height()), (3, 5));
    }

    #[tokio::test]
    async fn test_none_supersedes_in_flight_decode() {
        let loader = BackgroundLoader::new(Handle::current());
        let decode = loader.request(Some(BackgroundRef::from_bytes(solid_png(64, 64, [1, 2, 3, 255]))));
        let clear = loader.request(None);

        let _ = decode.await.unwrap();
        assert!(clear.await.unwrap());
        assert!(loader.current().is_none());
    }

    #[tokio::test]
    async fn test_decode_failure_resets_background() {
        let loader = BackgroundLoader::new(Handle::current());
        assert!(loader.request(Some(BackgroundRef::from_bytes(solid_png(2, 2, [9, 9, 9, 255])))).await.unwrap());
        assert!(loader.current().is_some());

        assert!(loader.request(Some(BackgroundRef::from_bytes(vec![0u8; 16]))).await.unwrap());
        assert!(loader.current().is_none());
    }

    #[tokio::test]
    async fn test_sync_follows_document() {
        let loader = BackgroundLoader::from_current().unwrap();
        let mut session = DrawingSession::new();

        assert!(loader.sync(session.document()).is_none());

        session.set_background_image(Some(BackgroundRef::from_bytes(solid_png(2, 2, [0, 0, 0, 255]))));
        assert!(loader.sync(session.document()).unwrap().await.unwrap());
        assert!(loader.sync(session.document()).is_none());
        assert!(loader.current().is_some());

        session.clear();
        assert!(loader.sync(session.document()).unwrap().await.unwrap());
        assert!(loader.current().is_none());
    }
}

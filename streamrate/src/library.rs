//! Backend loading and engine construction.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::debug;

use crate::backend::{Backend, RubatoBackend};
use crate::config::ResamplerConfig;
use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::sample::Sample;
use crate::stream::Stream;

/// Handle to a resampling backend that is loaded once.
///
/// Cloning is cheap and every clone sees the same backend. Engines can be
/// built before the backend is loaded; processing on them fails with
/// [`Error::NotReady`] until [`ready`](Self::ready) or [`load`](Self::load)
/// has completed.
#[derive(Clone, Default)]
pub struct Library {
    backend: Arc<OnceCell<Arc<dyn Backend>>>,
}

impl Library {
    /// Creates a library with no backend loaded.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a library that is ready immediately.
    pub fn with_backend(backend: impl Backend + 'static) -> Self {
        let backend: Arc<dyn Backend> = Arc::new(backend);
        Self {
            backend: Arc::new(OnceCell::new_with(Some(backend))),
        }
    }

    /// Loads the default rubato backend. Concurrent and repeated calls share
    /// one initialization.
    pub async fn ready(&self) -> Result<()> {
        self.load(|| async { Ok(RubatoBackend::new()) }).await
    }

    /// Loads the backend produced by `init`, unless one is already loaded.
    ///
    /// If `init` fails the library stays unloaded and a later call may retry.
    pub async fn load<B, F, Fut>(&self, init: F) -> Result<()>
    where
        B: Backend + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<B>>,
    {
        self.backend
            .get_or_try_init(|| async move {
                let backend = init().await?;
                debug!(backend = backend.name(), "resampler backend loaded");
                Ok::<_, Error>(Arc::new(backend) as Arc<dyn Backend>)
            })
            .await?;
        Ok(())
    }

    /// Returns true once a backend is loaded.
    pub fn is_ready(&self) -> bool {
        self.backend.initialized()
    }

    /// Name of the loaded backend.
    pub fn backend_name(&self) -> Option<&str> {
        self.backend.get().map(|b| b.name())
    }

    pub(crate) fn backend(&self) -> Option<Arc<dyn Backend>> {
        self.backend.get().cloned()
    }

    /// Builds an engine for `config`.
    ///
    /// The config is validated here; the resampler itself is created on the
    /// first chunk.
    pub fn engine<S: Sample>(&self, config: ResamplerConfig) -> Result<Engine<S>> {
        config.validate()?;
        Ok(Engine::new(self.clone(), config))
    }

    /// Builds a streaming adapter for `config`.
    pub fn stream<S: Sample>(&self, config: ResamplerConfig) -> Result<Stream<S>> {
        Ok(Stream::new(self.engine(config)?))
    }
}

impl fmt::Debug for Library {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Library")
            .field("backend", &self.backend_name())
            .finish()
    }
}

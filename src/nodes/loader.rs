//! Class loading capability.
//!
//! The registry never links node code directly: it asks a [`NodeLoader`] to
//! produce an implementation from a source path and a class name. How the
//! code is found and sandboxed is up to the backend.

use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use tracing::warn;

use super::error::LoadError;
use super::node_type::AnyNodeType;

/// Produces node implementations by class name.
pub trait NodeLoader: Send + Sync {
    /// Load the class `class_name` defined at `source_path`.
    ///
    /// Every call yields a fresh instance; caching is the caller's concern.
    fn load(&self, source_path: &Path, class_name: &str) -> Result<AnyNodeType, LoadError>;
}

impl<L: NodeLoader + ?Sized> NodeLoader for Arc<L> {
    fn load(&self, source_path: &Path, class_name: &str) -> Result<AnyNodeType, LoadError> {
        (**self).load(source_path, class_name)
    }
}

impl<L: NodeLoader + ?Sized> NodeLoader for Box<L> {
    fn load(&self, source_path: &Path, class_name: &str) -> Result<AnyNodeType, LoadError> {
        (**self).load(source_path, class_name)
    }
}

/// Tries loaders in order. Moves on to the next loader only when the
/// current one does not know the class; any other failure is final.
#[derive(Default)]
pub struct LoaderChain {
    loaders: Vec<Arc<dyn NodeLoader>>,
}

impl LoaderChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, loader: impl NodeLoader + 'static) -> Self {
        self.loaders.push(Arc::new(loader));
        self
    }

    pub fn len(&self) -> usize {
        self.loaders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loaders.is_empty()
    }
}

impl NodeLoader for LoaderChain {
    fn load(&self, source_path: &Path, class_name: &str) -> Result<AnyNodeType, LoadError> {
        for loader in &self.loaders {
            match loader.load(source_path, class_name) {
                Err(err) if err.is_class_not_found() => continue,
                result => return result,
            }
        }
        Err(LoadError::ClassNotFound {
            class_name: class_name.to_string(),
            source_path: source_path.to_path_buf(),
        })
    }
}

/// Runs each load of the wrapped loader on its own thread.
///
/// A panic inside the loader becomes [`LoadError::Panicked`] and a load that
/// does not finish within the timeout becomes [`LoadError::Timeout`]. A
/// timed-out thread is detached; its result is discarded when it finishes.
pub struct IsolatedLoader<L> {
    inner: Arc<L>,
    timeout: Duration,
}

impl<L: NodeLoader + 'static> IsolatedLoader<L> {
    pub fn new(inner: L, timeout: Duration) -> Self {
        Self {
            inner: Arc::new(inner),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl<L: NodeLoader + 'static> NodeLoader for IsolatedLoader<L> {
    fn load(&self, source_path: &Path, class_name: &str) -> Result<AnyNodeType, LoadError> {
        let (tx, rx) = mpsc::sync_channel(1);
        let inner = Arc::clone(&self.inner);
        let path: PathBuf = source_path.to_path_buf();
        let class = class_name.to_string();

        let spawned = thread::Builder::new()
            .name(format!("node-loader-{}", class_name))
            .spawn(move || {
                let result = panic::catch_unwind(AssertUnwindSafe(|| inner.load(&path, &class)))
                    .unwrap_or_else(|_| Err(LoadError::Panicked(class.clone())));
                // The receiver is gone when the load timed out.
                let _ = tx.send(result);
            });

        if let Err(e) = spawned {
            return Err(LoadError::Io {
                source_path: source_path.to_path_buf(),
                message: format!("failed to spawn loader thread: {}", e),
            });
        }

        match rx.recv_timeout(self.timeout) {
            Ok(result) => result,
            Err(mpsc::RecvTimeoutError::Timeout) => {
                warn!(class_name, timeout_ms = self.timeout.as_millis() as u64, "Node load timed out");
                Err(LoadError::Timeout {
                    class_name: class_name.to_string(),
                    timeout_ms: self.timeout.as_millis() as u64,
                })
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                Err(LoadError::Panicked(class_name.to_string()))
            }
        }
    }
}

//! Dual-source loading: both documents of a drop are read on the runtime in
//! parallel, and their completions are joined on the UI thread through a
//! two-slot gate tagged with the load generation.

pub mod partition;

use tokio::runtime::Handle;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

use crate::bundle::{AssetBundle, DroppedFile};
use crate::error::ViewerError;

pub use partition::{ATLAS_SUFFIX, Partitioned, SKELETON_SUFFIX, partition};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Skeleton,
    Atlas,
}

impl DocumentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DocumentKind::Skeleton => "skeleton",
            DocumentKind::Atlas => "atlas",
        }
    }
}

/// Completion of one background document read.
#[derive(Debug)]
pub struct LoadMessage {
    pub generation: u64,
    pub kind: DocumentKind,
    pub result: Result<String, ViewerError>,
}

/// Both documents of one generation, ready for assembly.
#[derive(Debug)]
pub struct LoadedDocuments {
    pub generation: u64,
    pub skeleton_text: String,
    pub atlas_text: String,
    pub bundle: AssetBundle,
}

#[derive(Debug)]
pub enum LoadOutcome {
    Ready(LoadedDocuments),
    Failed(ViewerError),
}

/// Join gate for the two reads of the current generation.
#[derive(Debug)]
pub struct PendingLoad {
    pub generation: u64,
    skeleton: Option<String>,
    atlas: Option<String>,
    bundle: AssetBundle,
}

impl PendingLoad {
    pub fn new(generation: u64, bundle: AssetBundle) -> Self {
        Self {
            generation,
            skeleton: None,
            atlas: None,
            bundle,
        }
    }

    /// Store one document. Returns `true` once both slots are filled.
    pub fn fill(&mut self, kind: DocumentKind, text: String) -> bool {
        match kind {
            DocumentKind::Skeleton => self.skeleton = Some(text),
            DocumentKind::Atlas => self.atlas = Some(text),
        }
        self.is_ready()
    }

    pub fn is_ready(&self) -> bool {
        self.skeleton.is_some() && self.atlas.is_some()
    }

    /// Consume the gate; `None` while a slot is still empty.
    pub fn into_documents(self) -> Option<LoadedDocuments> {
        Some(LoadedDocuments {
            generation: self.generation,
            skeleton_text: self.skeleton?,
            atlas_text: self.atlas?,
            bundle: self.bundle,
        })
    }
}

pub struct Loader {
    generation: u64,
    pending: Option<PendingLoad>,
    sender: UnboundedSender<LoadMessage>,
    receiver: UnboundedReceiver<LoadMessage>,
    runtime: Handle,
}

impl Loader {
    pub fn new(runtime: Handle) -> Self {
        let (sender, receiver) = unbounded_channel();
        Self {
            generation: 0,
            pending: None,
            sender,
            receiver,
            runtime,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    /// Invalidate whatever is in flight. Late completions become stale.
    pub fn cancel(&mut self) -> u64 {
        self.generation += 1;
        self.pending = None;
        self.generation
    }

    /// Start a new generation for `files` and spawn both document reads.
    pub fn begin(&mut self, files: Vec<DroppedFile>) -> Result<u64, ViewerError> {
        let generation = self.cancel();
        let Partitioned {
            skeleton,
            atlas,
            bundle,
        } = partition(files)?;

        log::info!(
            "Loading generation {generation}: {} + {} with {} image(s)",
            skeleton.name,
            atlas.name,
            bundle.len()
        );
        self.pending = Some(PendingLoad::new(generation, bundle));
        self.spawn_read(generation, DocumentKind::Skeleton, skeleton);
        self.spawn_read(generation, DocumentKind::Atlas, atlas);
        Ok(generation)
    }

    fn spawn_read(&self, generation: u64, kind: DocumentKind, file: DroppedFile) {
        let sender = self.sender.clone();
        self.runtime.spawn(async move {
            let result = file.source.read_text().await.map_err(|e| {
                ViewerError::new("read-failed")
                    .with_arg("file", &file.name)
                    .with_arg("document", kind.as_str())
                    .push_viewer(e)
            });
            // receiver gone means the viewer shut down
            let _ = sender.send(LoadMessage {
                generation,
                kind,
                result,
            });
        });
    }

    /// Feed one completion into the gate. Yields an outcome exactly once per
    /// generation: when the second document lands, or on the first failure.
    pub fn accept(&mut self, message: LoadMessage) -> Option<LoadOutcome> {
        if message.generation != self.generation {
            log::warn!(
                "Ignoring stale {} read from generation {} (current {})",
                message.kind.as_str(),
                message.generation,
                self.generation
            );
            return None;
        }
        let Some(pending) = self.pending.as_mut() else {
            log::debug!("No load pending for {} read", message.kind.as_str());
            return None;
        };

        match message.result {
            Ok(text) => {
                if !pending.fill(message.kind, text) {
                    return None;
                }
                self.pending
                    .take()
                    .and_then(PendingLoad::into_documents)
                    .map(LoadOutcome::Ready)
            }
            Err(err) => {
                log::error!("{}", err.message());
                self.pending = None;
                Some(LoadOutcome::Failed(err))
            }
        }
    }

    /// Drain completions without blocking.
    pub fn poll(&mut self) -> Option<LoadOutcome> {
        while let Ok(message) = self.receiver.try_recv() {
            if let Some(outcome) = self.accept(message) {
                return Some(outcome);
            }
        }
        None
    }

    /// Wait for the current generation to finish. `None` when nothing is pending.
    pub async fn next_outcome(&mut self) -> Option<LoadOutcome> {
        while self.pending.is_some() {
            let message = self.receiver.recv().await?;
            if let Some(outcome) = self.accept(message) {
                return Some(outcome);
            }
        }
        None
    }
}

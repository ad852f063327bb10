//! Batch upload and insertion.
//!
//! A gesture (drop, paste, file picker) hands over a batch of files. The
//! batch is filtered by content type, the insertion position is captured
//! once, and every accepted file then uploads on its own. Each completion
//! inserts a media node at the captured position, in whatever order the
//! uploads finish. The document is borrowed only for the synchronous
//! insertion, never across an await.

use std::cell::RefCell;
use std::future::Future;
use std::rc::{Rc, Weak};

use futures_util::StreamExt;
use futures_util::stream::FuturesUnordered;
use weaver_common::UploadConfig;
use weaver_richtext::{DocumentEngine, EngineError, MediaNode, Step, Transaction};

use crate::file::{PendingFile, UploadProgress};
use crate::notify::Notifier;
use crate::transport::Transport;

/// One accepted file and the position captured for it at gesture time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadTask {
    pub file: PendingFile,
    pub target_position: usize,
}

/// The accepted part of a gesture, ready to run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Batch {
    pub tasks: Vec<UploadTask>,
    /// Names of files filtered out by content type.
    pub rejected: Vec<String>,
}

impl Batch {
    /// Whether the platform's own handling of the gesture should be
    /// suppressed: true as soon as one file was accepted.
    pub fn suppress_default(&self) -> bool {
        !self.tasks.is_empty()
    }
}

/// What happened to each file of a batch.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub suppress_default: bool,
    pub rejected: Vec<String>,
    /// Uploaded files whose node was inserted, in completion order.
    pub inserted: Vec<String>,
    /// Files whose upload or insertion failed.
    pub failed: Vec<String>,
}

enum TaskOutcome {
    Inserted(String),
    Failed(String),
}

pub struct UploadPipeline<T, N> {
    accepted_types: Vec<String>,
    transport: T,
    notifier: N,
}

impl<T: Transport, N: Notifier> UploadPipeline<T, N> {
    pub fn new(config: &UploadConfig, transport: T, notifier: N) -> Self {
        Self {
            accepted_types: config
                .accepted_types
                .iter()
                .map(|t| t.trim().to_ascii_lowercase())
                .collect(),
            transport,
            notifier,
        }
    }

    /// Whether a declared content type is on the allow-list.
    ///
    /// Parameters are ignored and `type/*` entries match any subtype.
    pub fn accepts(&self, content_type: &str) -> bool {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        self.accepted_types.iter().any(|accepted| {
            match accepted.strip_suffix("/*") {
                Some(top) => essence
                    .split_once('/')
                    .is_some_and(|(essence_top, _)| essence_top == top),
                None => *accepted == essence,
            }
        })
    }

    /// Partition `files` and capture `position` for every accepted one.
    ///
    /// Sends at most one warning, covering all rejected files.
    pub fn begin_batch(&self, files: Vec<PendingFile>, position: usize) -> Batch {
        let mut batch = Batch::default();
        for file in files {
            if self.accepts(&file.content_type) {
                batch.tasks.push(UploadTask {
                    file,
                    target_position: position,
                });
            } else {
                tracing::debug!(name = %file.name, content_type = %file.content_type, "rejecting file");
                batch.rejected.push(file.name);
            }
        }

        if !batch.rejected.is_empty() {
            let message = match batch.rejected.len() {
                1 => format!("{} is not a supported image type", batch.rejected[0]),
                n => format!(
                    "{n} files are not supported image types: {}",
                    batch.rejected.join(", ")
                ),
            };
            self.notifier.warning(&message);
        }
        if batch.tasks.is_empty() && !batch.rejected.is_empty() {
            tracing::info!(rejected = batch.rejected.len(), "no acceptable files in batch");
        }
        batch
    }

    /// Upload every task of `batch` concurrently, inserting as each finishes.
    pub async fn run_batch<D: DocumentEngine>(
        &self,
        doc: &Weak<RefCell<D>>,
        batch: Batch,
    ) -> BatchReport {
        let mut report = BatchReport {
            suppress_default: batch.suppress_default(),
            rejected: batch.rejected,
            ..Default::default()
        };

        let mut running: FuturesUnordered<_> = batch
            .tasks
            .into_iter()
            .map(|task| self.run_task(doc, task))
            .collect();
        while let Some(outcome) = running.next().await {
            match outcome {
                TaskOutcome::Inserted(name) => report.inserted.push(name),
                TaskOutcome::Failed(name) => report.failed.push(name),
            }
        }
        report
    }

    /// Filter, upload and insert `files` at `position`.
    pub async fn handle_batch<D: DocumentEngine>(
        &self,
        doc: &Weak<RefCell<D>>,
        files: Vec<PendingFile>,
        position: usize,
    ) -> BatchReport {
        let batch = self.begin_batch(files, position);
        self.run_batch(doc, batch).await
    }

    /// Start a batch against `doc` at `position`.
    ///
    /// The filtering and the warning happen before this returns. `None`
    /// means nothing was accepted and the gesture should fall through to the
    /// default handling; otherwise the default is suppressed and the
    /// returned future completes the uploads.
    pub fn submit<'a, D: DocumentEngine + 'a>(
        &'a self,
        doc: Weak<RefCell<D>>,
        files: Vec<PendingFile>,
        position: usize,
    ) -> Option<impl Future<Output = BatchReport> + 'a> {
        let batch = self.begin_batch(files, position);
        if !batch.suppress_default() {
            return None;
        }
        Some(async move { self.run_batch(&doc, batch).await })
    }

    /// Paste gesture: files land at the current selection head.
    pub fn handle_paste<'a, D: DocumentEngine + 'a>(
        &'a self,
        doc: &Rc<RefCell<D>>,
        files: Vec<PendingFile>,
    ) -> Option<impl Future<Output = BatchReport> + use<'a, T, N, D>> {
        let position = doc.borrow().selection().head;
        self.submit(Rc::downgrade(doc), files, position)
    }

    /// File picker gesture: files land at the current selection head.
    pub fn handle_picker<'a, D: DocumentEngine + 'a>(
        &'a self,
        doc: &Rc<RefCell<D>>,
        files: Vec<PendingFile>,
    ) -> Option<impl Future<Output = BatchReport> + use<'a, T, N, D>> {
        let position = doc.borrow().selection().head;
        self.submit(Rc::downgrade(doc), files, position)
    }

    async fn run_task<D: DocumentEngine>(
        &self,
        doc: &Weak<RefCell<D>>,
        task: UploadTask,
    ) -> TaskOutcome {
        let UploadTask {
            file,
            target_position,
        } = task;
        tracing::debug!(name = %file.name, position = target_position, "uploading file");

        let name = file.name.as_str();
        let progress = |p: UploadProgress| {
            tracing::trace!(name, loaded = p.loaded, total = p.total, "upload progress");
        };
        let uploaded = match self.transport.upload(&file, &progress).await {
            Ok(uploaded) => uploaded,
            Err(err) => {
                tracing::error!(name, error = %err, "upload failed");
                self.notifier
                    .error(&format!("Failed to upload {name}: {err}"));
                return TaskOutcome::Failed(file.name);
            }
        };

        match insert_media(doc, target_position, &uploaded.file_url) {
            Ok(()) => {
                tracing::info!(name, url = %uploaded.file_url, position = target_position, "media inserted");
                self.notifier.success(&format!("{name} uploaded"));
                TaskOutcome::Inserted(file.name)
            }
            Err(EngineError::Detached) => {
                tracing::debug!(name, "editor gone before upload finished");
                TaskOutcome::Failed(file.name)
            }
            Err(err) => {
                tracing::warn!(name, error = %err, "could not insert uploaded media");
                self.notifier
                    .error(&format!("Could not insert {name}: {err}"));
                TaskOutcome::Failed(file.name)
            }
        }
    }
}

fn insert_media<D: DocumentEngine>(
    doc: &Weak<RefCell<D>>,
    pos: usize,
    src: &str,
) -> Result<(), EngineError> {
    let doc = doc.upgrade().ok_or(EngineError::Detached)?;
    let mut doc = doc.try_borrow_mut().map_err(|_| EngineError::Busy)?;
    doc.apply(Transaction::single(Step::InsertNode {
        pos,
        node: MediaNode::new(src),
    }))
}

// SPDX-License-Identifier: GPL-3.0-only

//! Notifications sent from the controller to the UI layer
//!
//! Events may be received on any thread. Receivers that touch UI state must
//! hop back onto their UI thread themselves.

use super::state::SessionState;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

/// Receiving end of the controller event stream
pub type EventReceiver = mpsc::UnboundedReceiver<ControllerEvent>;

/// Why a recording ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// `stop_recording` was called
    Requested,
    /// The maximum duration elapsed
    DurationCap,
    /// The movie output finished on its own
    OutputFinished,
    /// The session was stopped underneath the recording
    SessionStopped,
}

/// Completion of a recording
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingFinished {
    pub id: Uuid,
    /// Where the movie output wrote the file
    pub path: PathBuf,
    /// Final duration, never above the cap
    pub duration: Duration,
    /// Too short to use; the UI must not hand it to the player
    pub discarded: bool,
    pub reason: StopReason,
}

impl RecordingFinished {
    pub fn duration_secs(&self) -> f64 {
        self.duration.as_secs_f64()
    }

    pub fn is_usable(&self) -> bool {
        !self.discarded
    }
}

/// Everything the controller reports to its collaborator
#[derive(Debug, Clone, PartialEq)]
pub enum ControllerEvent {
    /// A recording ended, usable or discarded
    RecordingFinished(RecordingFinished),
    /// A device configuration (or session start) failed; the change was dropped
    ConfigurationFailed { operation: &'static str },
    /// An output (movie or photo) failed to start or write
    OutputFailed {
        operation: &'static str,
        message: String,
    },
    /// Controller moved to a new state
    StateChanged(SessionState),
}

/// Single-shot completion handle returned by `start_recording`
#[derive(Debug)]
pub struct RecordingHandle {
    id: Uuid,
    path: PathBuf,
    receiver: oneshot::Receiver<RecordingFinished>,
}

impl RecordingHandle {
    pub(crate) fn new(
        id: Uuid,
        path: PathBuf,
        receiver: oneshot::Receiver<RecordingFinished>,
    ) -> Self {
        Self { id, path, receiver }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Wait for the recording to end
    ///
    /// Returns `None` if the controller went away before the recording
    /// completed.
    pub async fn finished(self) -> Option<RecordingFinished> {
        self.receiver.await.ok()
    }

    /// Non-blocking check for completion
    pub fn try_finished(&mut self) -> Option<RecordingFinished> {
        self.receiver.try_recv().ok()
    }
}

// SPDX-License-Identifier: GPL-3.0-only

//! Controller state machine types

use super::events::RecordingFinished;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::Instant;
use uuid::Uuid;

/// Externally visible controller state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Session stopped
    #[default]
    Idle,
    /// Session running, nothing being recorded
    Running,
    /// Session running with an active recording
    Recording,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Idle => write!(f, "idle"),
            SessionState::Running => write!(f, "running"),
            SessionState::Recording => write!(f, "recording"),
        }
    }
}

/// Recording state machine
///
/// Simple two-state design: either recording or not.
#[derive(Debug, Default)]
pub(crate) enum RecordingState {
    /// Not recording
    #[default]
    Idle,
    /// Actively recording
    Active(ActiveRecording),
}

/// Bookkeeping for the one recording a session may have
#[derive(Debug)]
pub(crate) struct ActiveRecording {
    pub id: Uuid,
    pub path: PathBuf,
    pub started_at: Instant,
    /// Single-shot completion for whoever started the recording
    pub completion: Option<oneshot::Sender<RecordingFinished>>,
    /// Timer task enforcing the duration cap
    pub cap_task: Option<tokio::task::JoinHandle<()>>,
}

impl RecordingState {
    /// Check if currently recording
    pub fn is_recording(&self) -> bool {
        matches!(self, RecordingState::Active(_))
    }

    pub fn id(&self) -> Option<Uuid> {
        match self {
            RecordingState::Idle => None,
            RecordingState::Active(active) => Some(active.id),
        }
    }

    /// Get the recording file path if recording
    pub fn file_path(&self) -> Option<&Path> {
        match self {
            RecordingState::Idle => None,
            RecordingState::Active(active) => Some(&active.path),
        }
    }

    /// Get the elapsed recording duration
    pub fn elapsed(&self) -> Option<Duration> {
        match self {
            RecordingState::Idle => None,
            RecordingState::Active(active) => Some(active.started_at.elapsed()),
        }
    }

    /// Take the active recording if it matches `id` (any recording for `None`)
    pub fn take_matching(&mut self, id: Option<Uuid>) -> Option<ActiveRecording> {
        let matches = match self {
            RecordingState::Idle => false,
            RecordingState::Active(active) => id.is_none_or(|id| id == active.id),
        };
        if !matches {
            return None;
        }
        match std::mem::take(self) {
            RecordingState::Active(active) => Some(active),
            RecordingState::Idle => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn active(id: Uuid) -> RecordingState {
        RecordingState::Active(ActiveRecording {
            id,
            path: PathBuf::from("/tmp/clip.mov"),
            started_at: Instant::now(),
            completion: None,
            cap_task: None,
        })
    }

    #[test]
    fn test_take_matching_ignores_other_ids() {
        let id = Uuid::new_v4();
        let mut state = active(id);

        assert!(state.take_matching(Some(Uuid::new_v4())).is_none());
        assert!(state.is_recording());

        let taken = state.take_matching(Some(id)).unwrap();
        assert_eq!(taken.id, id);
        assert!(!state.is_recording());
    }

    #[test]
    fn test_take_any() {
        let mut state = active(Uuid::new_v4());
        assert_eq!(state.file_path(), Some(Path::new("/tmp/clip.mov")));
        assert!(state.take_matching(None).is_some());
        assert!(state.take_matching(None).is_none());
        assert_eq!(state.elapsed(), None);
    }
}

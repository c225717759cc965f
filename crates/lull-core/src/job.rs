//! Backend job-status resource, as polled by the surrounding application.
//!
//! Playback never polls this itself; the application extracts
//! [`JobStatus::playlist_url`] and hands it to a host controller.

use serde::{Deserialize, Serialize};
use url::Url;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Pending,
    Processing,
    Streaming,
    Completed,
    Failed,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamingInfo {
    pub playlist_url: Option<Url>,
    #[serde(default)]
    pub segments_completed: u32,
    pub segments_total: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadInfo {
    pub available: bool,
    pub url: Option<Url>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStatus {
    pub job_id: String,
    pub status: JobState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub streaming: Option<StreamingInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download: Option<DownloadInfo>,
}

impl JobStatus {
    /// Playlist URL once the backend has started publishing segments.
    #[must_use]
    pub fn playlist_url(&self) -> Option<&Url> {
        match self.status {
            JobState::Streaming | JobState::Completed => self
                .streaming
                .as_ref()
                .and_then(|s| s.playlist_url.as_ref()),
            JobState::Pending | JobState::Processing | JobState::Failed => None,
        }
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self.status, JobState::Completed | JobState::Failed)
    }
}

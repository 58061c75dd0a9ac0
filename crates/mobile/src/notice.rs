use std::collections::VecDeque;

/// A user-visible message the UI shows as an alert.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    /// The user declined the location dialog.
    PermissionDenied,
    /// The OS call itself failed; distinct from a user denial.
    PermissionRequestFailed,
    /// Recenter was asked for without a location grant.
    PermissionNeeded,
    SubmissionFailed(String),
    ReportSubmitted,
}

impl Notice {
    pub fn title(&self) -> &'static str {
        match self {
            Notice::PermissionDenied => "Permission Denied",
            Notice::PermissionRequestFailed => "Error",
            Notice::PermissionNeeded => "Permission needed",
            Notice::SubmissionFailed(_) => "Error",
            Notice::ReportSubmitted => "Report sent",
        }
    }

    pub fn message(&self) -> String {
        match self {
            Notice::PermissionDenied => "Location access is required to show your position on the map. Please enable it in settings.".to_string(),
            Notice::PermissionRequestFailed => "An error occurred while requesting location permission.".to_string(),
            Notice::PermissionNeeded => "Please grant location access to center the map on your position.".to_string(),
            Notice::SubmissionFailed(reason) => format!("The report could not be submitted: {}", reason),
            Notice::ReportSubmitted => "Thank you, your report is now on the map.".to_string(),
        }
    }
}

/// FIFO of notices waiting to be shown.
#[derive(Debug, Default)]
pub struct Notices {
    queue: VecDeque<Notice>,
}

impl Notices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, notice: Notice) {
        tracing::debug!(title = notice.title(), "Notice queued");
        self.queue.push_back(notice);
    }

    pub fn pop(&mut self) -> Option<Notice> {
        self.queue.pop_front()
    }

    pub fn drain(&mut self) -> impl Iterator<Item = Notice> + '_ {
        self.queue.drain(..)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notices_are_fifo() {
        let mut notices = Notices::new();
        notices.push(Notice::PermissionNeeded);
        notices.push(Notice::PermissionDenied);
        assert_eq!(notices.len(), 2);
        assert_eq!(notices.pop(), Some(Notice::PermissionNeeded));
        assert_eq!(notices.drain().collect::<Vec<_>>(), vec![Notice::PermissionDenied]);
        assert!(notices.is_empty());
    }

    #[test]
    fn test_request_failure_is_not_a_denial() {
        assert_ne!(
            Notice::PermissionRequestFailed.message(),
            Notice::PermissionDenied.message()
        );
        assert_eq!(Notice::PermissionDenied.title(), "Permission Denied");
    }

    #[test]
    fn test_submission_failure_carries_reason() {
        let notice = Notice::SubmissionFailed("timeout".to_string());
        assert!(notice.message().ends_with("timeout"));
    }
}

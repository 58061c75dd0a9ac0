use std::future::Future;

use crate::error::CoreError;
use crate::notice::{Notice, Notices};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PermissionState {
    #[default]
    Unknown,
    Granted,
    Denied,
}

impl PermissionState {
    pub fn is_granted(self) -> bool {
        self == PermissionState::Granted
    }

    pub fn require_granted(self) -> Result<(), CoreError> {
        match self {
            PermissionState::Granted => Ok(()),
            PermissionState::Unknown | PermissionState::Denied => Err(CoreError::PermissionDenied),
        }
    }
}

/// What the user answered in the OS dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionOutcome {
    Granted,
    Denied,
}

/// OS location-permission service. Each call shows one dialog; `Err` means the call
/// itself failed, not that the user declined.
pub trait PermissionService {
    fn request_fine_location(&self) -> impl Future<Output = Result<PermissionOutcome, String>>;
}

/// Result of asking the gate to start a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStart {
    /// Nothing to do; no dialog.
    AlreadyGranted,
    /// A dialog is already up; the caller must not issue another.
    InFlight,
    /// The caller must now call the OS service and feed the answer to `resolve`.
    Started,
}

/// Tracks the location grant. The state only moves through `begin_request` followed by
/// `resolve`, so `Granted` always comes from a completed OS request.
#[derive(Debug, Default)]
pub struct PermissionGate {
    state: PermissionState,
    pending: bool,
}

impl PermissionGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> PermissionState {
        self.state
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn begin_request(&mut self) -> RequestStart {
        if self.state.is_granted() {
            return RequestStart::AlreadyGranted;
        }
        if self.pending {
            return RequestStart::InFlight;
        }
        self.pending = true;
        tracing::debug!(state = ?self.state, "Requesting location permission");
        RequestStart::Started
    }

    /// The grant was withdrawn from system settings. No notice: the user did it.
    pub fn revoke(&mut self) -> PermissionState {
        if self.state.is_granted() {
            tracing::info!("Location permission revoked");
            self.state = PermissionState::Denied;
        }
        self.state
    }

    /// Apply the OS answer to the request started by `begin_request`.
    pub fn resolve(
        &mut self,
        result: Result<PermissionOutcome, String>,
        notices: &mut Notices,
    ) -> PermissionState {
        if !self.pending {
            tracing::warn!("Permission answer without a pending request, ignored");
            return self.state;
        }
        self.pending = false;

        self.state = match result {
            Ok(PermissionOutcome::Granted) => {
                tracing::info!("Location permission granted");
                PermissionState::Granted
            }
            Ok(PermissionOutcome::Denied) => {
                tracing::warn!("Location permission denied");
                notices.push(Notice::PermissionDenied);
                PermissionState::Denied
            }
            Err(e) => {
                tracing::warn!(error = %e, "Location permission request failed");
                notices.push(Notice::PermissionRequestFailed);
                PermissionState::Denied
            }
        };
        self.state
    }

    /// Begin, await the service, resolve. Convenience for callers that can hold the gate
    /// across the dialog.
    pub async fn request<S: PermissionService>(
        &mut self,
        service: &S,
        notices: &mut Notices,
    ) -> PermissionState {
        match self.begin_request() {
            RequestStart::Started => {
                let result = service.request_fine_location().await;
                self.resolve(result, notices)
            }
            RequestStart::AlreadyGranted | RequestStart::InFlight => self.state,
        }
    }
}

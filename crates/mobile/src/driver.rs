//! Runs a [`MapSession`] on the current task.
//!
//! One `select!` loop owns the session, so handlers never overlap. The permission dialog,
//! the report fetches and report submission are awaited alongside the map streams; none
//! of them blocks camera or location events.

use std::future::Future;
use std::sync::Arc;

use cimes_shared::models::Report;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::api::{ApiError, ReportApi};
use crate::camera::RecenterOutcome;
use crate::events::{next_event, MapView};
use crate::loader::ReportLoader;
use crate::notice::Notice;
use crate::permission::{PermissionService, RequestStart};
use crate::selector::SelectionMode;
use crate::session::{MapSession, SessionSnapshot};
use crate::submission::ReportDraft;

/// User actions forwarded from the UI.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Recenter,
    ToggleMode,
    SetMode(SelectionMode),
    RequestPermission,
    /// The OS reported that the location grant was withdrawn.
    PermissionRevoked,
    /// Open a marker's details.
    SelectReport(Uuid),
    ClearSelection,
    Submit(ReportDraft),
    Shutdown,
}

/// The driver's side of the UI channels.
#[derive(Debug)]
pub struct SessionIo {
    pub commands: mpsc::UnboundedReceiver<Command>,
    pub snapshots: watch::Sender<SessionSnapshot>,
    pub notices: mpsc::UnboundedSender<Notice>,
}

/// The UI's side of the channels.
#[derive(Debug)]
pub struct SessionHandle {
    pub commands: mpsc::UnboundedSender<Command>,
    pub snapshots: watch::Receiver<SessionSnapshot>,
    pub notices: mpsc::UnboundedReceiver<Notice>,
}

/// Create the channel pair connecting a driver to its UI.
pub fn channels() -> (SessionIo, SessionHandle) {
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (snapshot_tx, snapshot_rx) = watch::channel(SessionSnapshot::default());
    let (notice_tx, notice_rx) = mpsc::unbounded_channel();
    (
        SessionIo {
            commands: command_rx,
            snapshots: snapshot_tx,
            notices: notice_tx,
        },
        SessionHandle {
            commands: command_tx,
            snapshots: snapshot_rx,
            notices: notice_rx,
        },
    )
}

async fn settle<F: Future + Unpin>(slot: &mut Option<F>) -> F::Output {
    match slot.as_mut() {
        Some(fut) => fut.await,
        None => std::future::pending().await,
    }
}

fn publish<M: MapView>(session: &mut MapSession<M>, io: &SessionIo) {
    for notice in session.drain_notices() {
        // The UI may have gone away; the session keeps running until told to stop.
        let _ = io.notices.send(notice);
    }
    let next = session.snapshot();
    io.snapshots.send_if_modified(|current| {
        if *current == next {
            return false;
        }
        *current = next;
        true
    });
}

/// Mount the session, run it until `Shutdown` or until the command channel closes, then
/// dispose it and hand it back.
pub async fn run_session<M, S, A>(
    mut session: MapSession<M>,
    service: &S,
    api: Arc<A>,
    mut io: SessionIo,
) -> MapSession<M>
where
    M: MapView,
    S: PermissionService,
    A: ReportApi + Send + Sync + 'static,
{
    let mut permission = match session.mount() {
        RequestStart::Started => Some(Box::pin(service.request_fine_location())),
        RequestStart::AlreadyGranted | RequestStart::InFlight => None,
    };

    let mut loader = ReportLoader::new();
    loader.start(api.clone(), session.report_area(), session.config().fetch);

    let mut submission: Option<JoinHandle<Result<Report, ApiError>>> = None;
    let mut selection: Option<JoinHandle<(Uuid, Result<Report, ApiError>)>> = None;

    publish(&mut session, &io);

    loop {
        tokio::select! {
            event = next_event(&mut session.viewport.subscription) => {
                session.handle_event(event);
            }
            event = next_event(&mut session.tracker.subscription) => {
                session.handle_event(event);
            }
            result = settle(&mut permission), if permission.is_some() => {
                permission = None;
                session.permission_resolved(result);
            }
            result = loader.finished(), if loader.is_running() => {
                match result {
                    Ok(reports) => {
                        session.set_reports(reports);
                    }
                    Err(e) => tracing::error!(error = %e, "Reports unavailable"),
                }
            }
            joined = settle(&mut submission), if submission.is_some() => {
                submission = None;
                let result = joined.unwrap_or_else(|e| Err(ApiError::Transport(e.to_string())));
                // Failures already reached the user as a notice.
                let _ = session.submission_finished(result);
            }
            joined = settle(&mut selection), if selection.is_some() => {
                selection = None;
                match joined {
                    Ok((id, result)) => session.selection_finished(id, result),
                    Err(e) => tracing::warn!(error = %e, "Report details task failed"),
                }
            }
            command = io.commands.recv() => {
                let Some(command) = command else {
                    tracing::debug!("Command channel closed");
                    break;
                };
                match command {
                    Command::Recenter => {
                        if session.recenter() == RecenterOutcome::PermissionRequested {
                            permission = Some(Box::pin(service.request_fine_location()));
                        }
                    }
                    Command::ToggleMode => {
                        session.toggle_mode();
                    }
                    Command::SetMode(mode) => {
                        session.set_mode(mode);
                    }
                    Command::RequestPermission => {
                        if session.request_permission() == RequestStart::Started {
                            permission = Some(Box::pin(service.request_fine_location()));
                        }
                    }
                    Command::PermissionRevoked => {
                        session.permission_revoked();
                    }
                    Command::SelectReport(id) => {
                        if session.select_report(id) {
                            if let Some(previous) = selection.take() {
                                previous.abort();
                            }
                            let api = api.clone();
                            selection = Some(tokio::spawn(async move {
                                (id, api.fetch_report(id).await)
                            }));
                        }
                    }
                    Command::ClearSelection => {
                        if let Some(previous) = selection.take() {
                            previous.abort();
                        }
                        session.clear_selection();
                    }
                    Command::Submit(draft) => {
                        if submission.is_some() {
                            tracing::debug!("Submission already in flight, ignored");
                        } else if let Ok(creation) = session.prepare_submission(&draft) {
                            let api = api.clone();
                            submission = Some(tokio::spawn(async move {
                                api.submit_report(creation).await
                            }));
                        }
                    }
                    Command::Shutdown => break,
                }
            }
        }
        publish(&mut session, &io);
    }

    loader.abort();
    if let Some(handle) = submission.take() {
        handle.abort();
    }
    if let Some(handle) = selection.take() {
        handle.abort();
    }
    session.dispose();
    publish(&mut session, &io);
    session
}

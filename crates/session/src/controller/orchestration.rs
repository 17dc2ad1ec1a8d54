//! Runs pending solver calls off the controller task and reports back
//! through the session event channel.

use shared::domain::{BackupLayout, PrimaryLayout};
use solver_client::PendingRequest;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

use super::events::SessionEvent;

pub(crate) fn dispatch_primary(
    events: UnboundedSender<SessionEvent>,
    pending: PendingRequest<PrimaryLayout>,
    revision: u64,
) {
    let PendingRequest { ticket, call } = pending;
    tokio::spawn(async move {
        let result = call.await;
        if events
            .send(SessionEvent::PrimarySettled {
                ticket,
                revision,
                result,
            })
            .is_err()
        {
            debug!(
                generation = ticket.generation,
                "session closed before the primary layout arrived"
            );
        }
    });
}

pub(crate) fn dispatch_contingency(
    events: UnboundedSender<SessionEvent>,
    pending: PendingRequest<BackupLayout>,
) {
    let PendingRequest { ticket, call } = pending;
    tokio::spawn(async move {
        let result = call.await;
        if events
            .send(SessionEvent::ContingencySettled { ticket, result })
            .is_err()
        {
            debug!(
                generation = ticket.generation,
                "session closed before the backup layout arrived"
            );
        }
    });
}

//! Opening rescue alerts and delivering caregiver notifications.

use std::future::Future;

use tracing::{error, info, warn};
use uuid::Uuid;

use db::{
    models::{DependentContactRow, RescueAlertRow},
    repository::rescues as rescue_repo,
    DbError,
};
use monitor::{Coordinate, RescueKind};
use notify::{format, send_with_retry, Message};

use crate::{error::ApiError, AppState};

/// Full name used in notifications.
pub fn display_name(contact: &DependentContactRow) -> String {
    format!("{} {}", contact.first_name, contact.last_name)
}

/// Push `messages` to the caregiver in the background.
///
/// Telemetry is acknowledged as soon as it is stored; delivery (with
/// retries) runs on its own task and failures are only logged.
pub fn dispatch(state: &AppState, contact: &DependentContactRow, messages: Vec<Message>) {
    let Some(to) = contact.line_user_id.clone() else {
        warn!(
            dependent_id = %contact.dependent_id,
            "caregiver has no LINE account linked, dropping notification"
        );
        return;
    };
    push(state, to, messages);
}

/// Push `messages` to a LINE user in the background.
pub fn push(state: &AppState, to: String, messages: Vec<Message>) {
    if messages.is_empty() {
        return;
    }

    let notifier = state.notifier.clone();
    let retry = state.config.retry.clone();

    tokio::spawn(async move {
        match send_with_retry(notifier.as_ref(), &to, messages, &retry).await {
            Ok(()) => info!(line_user_id = %to, "notification delivered"),
            Err(e) => error!(line_user_id = %to, "failed to deliver notification: {e}"),
        }
    });
}

/// Open a `PENDING` rescue alert for the dependent.
pub async fn open_rescue(
    state: &AppState,
    contact: &DependentContactRow,
    kind: RescueKind,
    position: Option<Coordinate>,
) -> Result<RescueAlertRow, ApiError> {
    let summary = format::rescue_summary(&display_name(contact), kind);

    let row = rescue_repo::create_rescue(
        &state.pool,
        contact.dependent_id,
        &kind.to_string(),
        &summary,
        position.map(|p| p.latitude),
        position.map(|p| p.longitude),
    )
    .await?;

    info!(rescue_id = %row.id, dependent_id = %contact.dependent_id, %kind, "rescue alert opened");
    Ok(row)
}

/// Open a rescue alert when `rescue` is set, then run `latch`.
///
/// The latch write only starts once the rescue row exists. If the insert
/// fails the latch keeps its old value and the next reading raises again.
pub async fn open_then_latch<F>(
    state: &AppState,
    contact: &DependentContactRow,
    rescue: Option<(RescueKind, Option<Coordinate>)>,
    latch: F,
) -> Result<Option<Uuid>, ApiError>
where
    F: Future<Output = Result<(), DbError>>,
{
    let rescue_id = match rescue {
        Some((kind, position)) => Some(open_rescue(state, contact, kind, position).await?.id),
        None => None,
    };
    latch.await?;
    Ok(rescue_id)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;
    use crate::router_tests;

    fn contact(line_user_id: Option<&str>) -> DependentContactRow {
        DependentContactRow {
            dependent_id: Uuid::new_v4(),
            first_name: "Somchai".into(),
            last_name: "Jaidee".into(),
            caregiver_id: Uuid::new_v4(),
            caregiver_phone: "0812345678".into(),
            line_user_id: line_user_id.map(str::to_owned),
        }
    }

    #[tokio::test]
    async fn latch_is_untouched_when_the_rescue_cannot_be_stored() {
        // The test pool points at a closed port, so the insert fails.
        let state = router_tests::state();
        let latched = AtomicBool::new(false);

        let result = open_then_latch(
            &state,
            &contact(Some("U1")),
            Some((RescueKind::HeartRate, None)),
            async {
                latched.store(true, Ordering::SeqCst);
                Ok(())
            },
        )
        .await;

        assert!(matches!(result, Err(ApiError::Database(_))), "{result:?}");
        assert!(!latched.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn latch_is_written_when_no_rescue_is_needed() {
        let state = router_tests::state();
        let latched = AtomicBool::new(false);

        let rescue_id = open_then_latch(&state, &contact(Some("U1")), None, async {
            latched.store(true, Ordering::SeqCst);
            Ok(())
        })
        .await
        .expect("no database access");

        assert_eq!(rescue_id, None);
        assert!(latched.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn notifications_go_to_the_linked_caregiver() {
        let (state, notifier) = router_tests::state_with_notifier();

        dispatch(&state, &contact(Some("U-caregiver")), vec![Message::text("hello")]);
        dispatch(&state, &contact(None), vec![Message::text("nobody to tell")]);

        router_tests::settle().await;
        assert_eq!(notifier.pushed_to(), vec!["U-caregiver".to_string()]);
    }
}

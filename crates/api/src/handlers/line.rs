//! LINE webhook: chat commands, rescue postbacks and follow events.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use serde_json::{json, Value};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use db::repository::{
    dependents as dependent_repo, rescues as rescue_repo, telemetry as telemetry_repo,
    users as user_repo,
};
use monitor::{Coordinate, RescueKind, RescueStatus};
use notify::{
    command::{parse_command, parse_postback, ChatCommand, CommandParseError, PostbackAction},
    format,
    signature,
    webhook::{Event, EventMessage, WebhookPayload},
    Message,
};

use super::{
    liff::{caller, Caller},
    AppState,
};
use crate::error::{ApiError, OrNotFound};

pub const SIGNATURE_HEADER: &str = "x-line-signature";

/// Verify the signature, then handle each event.
///
/// Failures inside a single event are logged and do not fail the batch:
/// LINE retries the whole delivery on any non-2xx response.
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let presented = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::Unauthorized)?;

    if !signature::verify(&state.config.line_channel_secret, &body, presented) {
        warn!("webhook signature mismatch");
        return Err(ApiError::Unauthorized);
    }

    let payload: WebhookPayload = serde_json::from_slice(&body)
        .map_err(|e| ApiError::Validation(format!("malformed webhook payload: {e}")))?;

    debug!(events = payload.events.len(), "webhook received");

    for event in payload.events {
        if let Err(e) = handle_event(&state, event).await {
            warn!("webhook event failed: {e}");
        }
    }

    Ok((StatusCode::OK, Json(json!({ "success": true }))))
}

async fn handle_event(state: &AppState, event: Event) -> Result<(), ApiError> {
    let Some(user_id) = event.user_id().map(str::to_owned) else {
        debug!("ignoring event without a user source");
        return Ok(());
    };

    match event {
        Event::Follow { reply_token, .. } => {
            let message = if registered(state, &user_id).await? {
                format::help_menu()
            } else {
                format::registration_prompt(&state.config.liff.register)
            };
            reply(state, &reply_token, vec![message]).await;
        }
        Event::Unfollow { .. } => info!(line_user_id = %user_id, "bot unfollowed"),
        Event::Message {
            reply_token,
            message: EventMessage::Text { text },
            ..
        } => {
            let messages = on_text(state, &user_id, &text).await?;
            reply(state, &reply_token, messages).await;
        }
        Event::Postback {
            reply_token,
            postback,
            ..
        } => {
            let messages = match parse_postback(&postback.data) {
                Some(action) => on_postback(state, &user_id, action).await?,
                None => {
                    debug!(data = %postback.data, "ignoring unknown postback");
                    return Ok(());
                }
            };
            reply(state, &reply_token, messages).await;
        }
        Event::Message { .. } | Event::Other => debug!("ignoring unsupported event"),
    }

    Ok(())
}

/// Reply tokens are single-use, so replies are not retried.
async fn reply(state: &AppState, reply_token: &str, messages: Vec<Message>) {
    if messages.is_empty() {
        return;
    }
    if let Err(e) = state.notifier.reply(reply_token, messages).await {
        warn!("reply failed: {e}");
    }
}

async fn registered(state: &AppState, line_user_id: &str) -> Result<bool, ApiError> {
    Ok(user_repo::find_by_line_id(&state.pool, line_user_id).await?.is_some())
}

/// Resolve the caller, or `None` when they still have to register.
async fn try_caller(state: &AppState, line_user_id: &str) -> Result<Option<Caller>, ApiError> {
    match caller(state, line_user_id).await {
        Ok(c) => Ok(Some(c)),
        Err(ApiError::NotFound(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

// ---------------------------------------------------------------------------
// Text commands
// ---------------------------------------------------------------------------

#[instrument(skip(state, text))]
async fn on_text(state: &AppState, line_user_id: &str, text: &str) -> Result<Vec<Message>, ApiError> {
    let command = match parse_command(text) {
        Ok(c) => c,
        Err(CommandParseError::Empty) => return Ok(Vec::new()),
        Err(e @ CommandParseError::UnknownCommand(_)) => {
            debug!("{e}");
            return Ok(vec![format::help_menu()]);
        }
    };

    if command == ChatCommand::Register {
        let message = if registered(state, line_user_id).await? {
            Message::text("You are already registered.")
        } else {
            format::registration_prompt(&state.config.liff.register)
        };
        return Ok(vec![message]);
    }
    if command == ChatCommand::Help {
        return Ok(vec![format::help_menu()]);
    }

    let Some(caller) = try_caller(state, line_user_id).await? else {
        return Ok(vec![format::registration_prompt(&state.config.liff.register)]);
    };

    match command {
        ChatCommand::Location => locations(state, &caller).await,
        ChatCommand::Status => status(state, &caller).await,
        ChatCommand::RequestHelp => request_help(state, &caller).await,
        ChatCommand::Borrow => Ok(vec![format::open_form("Borrow equipment", &state.config.liff.borrow)]),
        ChatCommand::Settings => Ok(vec![format::open_form("Settings", &state.config.liff.settings)]),
        ChatCommand::Help | ChatCommand::Register => Ok(vec![format::help_menu()]),
    }
}

async fn locations(state: &AppState, caller: &Caller) -> Result<Vec<Message>, ApiError> {
    let mut messages = Vec::new();
    for dependent in dependent_repo::list_for_caregiver(&state.pool, caller.caregiver.id).await? {
        let name = format!("{} {}", dependent.first_name, dependent.last_name);
        match telemetry_repo::latest_location(&state.pool, dependent.id).await? {
            Some(record) => messages.push(Message::location(
                format!("{name} ({} %, {})", record.battery, record.recorded_at.format("%H:%M")),
                record.latitude,
                record.longitude,
            )),
            None => messages.push(Message::text(format!("No location has been reported for {name} yet."))),
        }
    }
    if messages.is_empty() {
        messages.push(Message::text("You have no dependents registered."));
    }
    Ok(format::fit_reply(messages))
}

async fn status(state: &AppState, caller: &Caller) -> Result<Vec<Message>, ApiError> {
    let mut lines = Vec::new();
    for dependent in dependent_repo::list_for_caregiver(&state.pool, caller.caregiver.id).await? {
        let location = telemetry_repo::latest_location(&state.pool, dependent.id).await?;
        let heart = telemetry_repo::recent_heart_rates(&state.pool, dependent.id, 1).await?;
        let temperature = telemetry_repo::recent_temperatures(&state.pool, dependent.id, 1).await?;
        let open = rescue_repo::list_open_for_dependent(&state.pool, dependent.id).await?;

        let mut line = format!("{} {}", dependent.first_name, dependent.last_name);
        match location {
            Some(l) => line.push_str(&format!("\n• {:.0} m from home, battery {} %", l.distance_m, l.battery)),
            None => line.push_str("\n• no location yet"),
        }
        if let Some(h) = heart.first() {
            line.push_str(&format!("\n• heart rate {} bpm", h.bpm));
        }
        if let Some(t) = temperature.first() {
            line.push_str(&format!("\n• temperature {:.1} °C", t.celsius));
        }
        if !open.is_empty() {
            line.push_str(&format!("\n• {} open rescue alert(s)", open.len()));
        }
        lines.push(line);
    }

    if lines.is_empty() {
        return Ok(vec![Message::text("You have no dependents registered.")]);
    }
    Ok(vec![Message::text(lines.join("\n\n"))])
}

/// Open a manual rescue for the caregiver's first dependent.
async fn request_help(state: &AppState, caller: &Caller) -> Result<Vec<Message>, ApiError> {
    let dependents = dependent_repo::list_for_caregiver(&state.pool, caller.caregiver.id).await?;
    let Some(dependent) = dependents.first() else {
        return Ok(vec![Message::text("You have no dependents registered.")]);
    };

    let contact = dependent_repo::get_contact(&state.pool, dependent.id)
        .await
        .or_not_found("dependent")?;
    let position = telemetry_repo::latest_location(&state.pool, dependent.id)
        .await?
        .and_then(|l| Coordinate::new(l.latitude, l.longitude).ok());

    let rescue = crate::alerts::open_rescue(state, &contact, RescueKind::Manual, position).await?;

    Ok(vec![Message::text(format!(
        "{}. The care team has been alerted (reference {}).",
        rescue.message,
        short_id(rescue.id)
    ))])
}

fn short_id(id: Uuid) -> String {
    id.simple().to_string()[..8].to_owned()
}

// ---------------------------------------------------------------------------
// Rescue postbacks
// ---------------------------------------------------------------------------

#[instrument(skip(state))]
async fn on_postback(
    state: &AppState,
    line_user_id: &str,
    action: PostbackAction,
) -> Result<Vec<Message>, ApiError> {
    let Some(caller) = try_caller(state, line_user_id).await? else {
        return Ok(vec![format::registration_prompt(&state.config.liff.register)]);
    };

    let rescue_id = match action {
        PostbackAction::AcceptRescue(id) | PostbackAction::CloseRescue(id) => id,
    };
    let rescue = rescue_repo::get_rescue(&state.pool, rescue_id)
        .await
        .or_not_found("rescue alert")?;

    let dependent = dependent_repo::get_dependent(&state.pool, rescue.dependent_id)
        .await
        .or_not_found("dependent")?;
    if dependent.caregiver_id != caller.caregiver.id {
        warn!(%rescue_id, "postback for another caregiver's rescue");
        return Ok(vec![Message::text("This alert belongs to another caregiver.")]);
    }

    let current: RescueStatus = rescue.status.parse()?;
    let next = match action {
        PostbackAction::AcceptRescue(_) => current.accept(),
        PostbackAction::CloseRescue(_) => current.close(),
    };
    let next = match next {
        Ok(next) => next,
        Err(e) => return Ok(vec![Message::text(format!("Sorry, {e}."))]),
    };

    let row = match rescue_repo::transition_rescue(
        &state.pool,
        rescue_id,
        &current.to_string(),
        &next.to_string(),
        line_user_id,
    )
    .await
    {
        Ok(row) => row,
        Err(db::DbError::Conflict(_)) => {
            return Ok(vec![Message::text("This alert was already updated by someone else.")])
        }
        Err(e) => return Err(e.into()),
    };

    info!(%rescue_id, status = %next, "rescue updated from chat");
    let message = match next {
        RescueStatus::Accepted => format::rescue_accepted(&row.message),
        _ => format::rescue_closed(&row.message),
    };
    Ok(vec![message])
}

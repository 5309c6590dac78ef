//! Caregiver-facing message builders.

use monitor::{
    BorrowStatus, Coordinate, Deviation, FallCode, HeartRateRange, RescueKind, VitalDecision,
    ZoneEvent,
};
use uuid::Uuid;

use crate::{
    command::PostbackAction,
    message::MAX_MESSAGES_PER_REQUEST,
    message::{Action, Message},
};

/// Accept/close buttons attached to every rescue notification.
fn rescue_buttons(alt_text: &str, text: &str, rescue_id: Uuid) -> Message {
    Message::buttons(
        alt_text,
        text,
        vec![
            Action::postback("Accept", PostbackAction::AcceptRescue(rescue_id).to_data()),
            Action::postback("Close", PostbackAction::CloseRescue(rescue_id).to_data()),
        ],
    )
}

/// Messages for a safe-zone transition. `rescue_id` is set when the event
/// opened a rescue alert.
pub fn zone_event(
    name: &str,
    event: ZoneEvent,
    distance_m: f64,
    position: Coordinate,
    rescue_id: Option<Uuid>,
) -> Vec<Message> {
    let text = match event {
        ZoneEvent::LeftInner => {
            format!("{name} has left the inner safe zone ({distance_m:.0} m from home).")
        }
        ZoneEvent::ApproachingOuter => {
            format!("{name} is approaching the edge of the safe zone ({distance_m:.0} m from home).")
        }
        ZoneEvent::LeftOuter => {
            format!("{name} has left the safe zone ({distance_m:.0} m from home). Please check on them.")
        }
        ZoneEvent::Returned => format!("{name} is back inside the safe zone."),
    };

    let mut messages = vec![Message::text(text)];
    if event != ZoneEvent::Returned {
        messages.push(Message::location(
            format!("{name}'s location"),
            position.latitude,
            position.longitude,
        ));
    }
    if let Some(id) = rescue_id {
        messages.push(rescue_buttons("Safe zone alert", "Safe zone alert", id));
    }
    messages
}

/// Messages for a heart-rate decision, or `None` when nothing should be sent.
pub fn heart_rate(
    name: &str,
    bpm: i32,
    decision: VitalDecision,
    range: HeartRateRange,
    rescue_id: Option<Uuid>,
) -> Option<Vec<Message>> {
    let text = match decision {
        VitalDecision::Raise(Deviation::High) => format!(
            "{name}'s heart rate is high: {bpm} bpm (limit {} bpm).",
            range.max_bpm
        ),
        VitalDecision::Raise(Deviation::Low) => format!(
            "{name}'s heart rate is low: {bpm} bpm (limit {} bpm).",
            range.min_bpm
        ),
        VitalDecision::Clear => format!("{name}'s heart rate is back to normal: {bpm} bpm."),
        VitalDecision::Hold => return None,
    };

    let mut messages = vec![Message::text(text)];
    if let Some(id) = rescue_id {
        messages.push(rescue_buttons("Heart rate alert", "Heart rate alert", id));
    }
    Some(messages)
}

/// Messages for a temperature decision, or `None` when nothing should be sent.
pub fn temperature(
    name: &str,
    celsius: f64,
    decision: VitalDecision,
    max_celsius: f64,
    rescue_id: Option<Uuid>,
) -> Option<Vec<Message>> {
    let text = match decision {
        VitalDecision::Raise(_) => format!(
            "{name}'s body temperature is high: {celsius:.1} °C (limit {max_celsius:.1} °C)."
        ),
        VitalDecision::Clear => {
            format!("{name}'s body temperature is back to normal: {celsius:.1} °C.")
        }
        VitalDecision::Hold => return None,
    };

    let mut messages = vec![Message::text(text)];
    if let Some(id) = rescue_id {
        messages.push(rescue_buttons("Temperature alert", "Temperature alert", id));
    }
    Some(messages)
}

/// Messages for a fall report. Recovered falls are informational only.
pub fn fall(name: &str, code: FallCode, position: Option<Coordinate>, rescue_id: Option<Uuid>) -> Vec<Message> {
    let text = match code {
        FallCode::Recovered => format!("{name} fell but confirmed they are OK."),
        FallCode::Fallen => format!("{name} has fallen and is not responding! Please help immediately."),
        FallCode::Sos => format!("{name} pressed the SOS button! Please help immediately."),
    };

    let mut messages = vec![Message::text(text)];
    if let Some(p) = position {
        messages.push(Message::location(format!("{name}'s location"), p.latitude, p.longitude));
    }
    if let Some(id) = rescue_id {
        let title = match code {
            FallCode::Sos => "SOS",
            _ => "Fall detected",
        };
        messages.push(rescue_buttons(title, title, id));
    }
    messages
}

/// Text stored on the rescue alert row.
pub fn rescue_summary(name: &str, kind: RescueKind) -> String {
    match kind {
        RescueKind::Fall => format!("{name} fell and did not respond"),
        RescueKind::Sos => format!("{name} pressed SOS"),
        RescueKind::Zone => format!("{name} left the safe zone"),
        RescueKind::HeartRate => format!("{name} has an abnormal heart rate"),
        RescueKind::Temperature => format!("{name} has a high body temperature"),
        RescueKind::Manual => format!("Help requested for {name}"),
    }
}

pub fn rescue_accepted(summary: &str) -> Message {
    Message::text(format!("Rescue accepted: {summary}. Thank you for responding."))
}

pub fn rescue_closed(summary: &str) -> Message {
    Message::text(format!("Rescue closed: {summary}."))
}

/// Sent to the borrower when an admin reviews their request.
pub fn borrow_update(status: BorrowStatus) -> Option<Message> {
    let text = match status {
        BorrowStatus::Approved => "Your equipment request has been approved.",
        BorrowStatus::Rejected => "Your equipment request has been rejected.",
        BorrowStatus::Returned => "Your equipment return has been confirmed. Thank you.",
        BorrowStatus::ReturnFailed => {
            "Your equipment return could not be confirmed. Please contact the office."
        }
        BorrowStatus::Pending | BorrowStatus::ReturnPending => return None,
    };
    Some(Message::text(text))
}

/// Reply for LINE users who have not registered yet.
pub fn registration_prompt(register_url: &str) -> Message {
    Message::buttons(
        "Please register to use this service",
        "Please register as a caregiver to start monitoring.",
        vec![Action::uri("Register", register_url)],
    )
}

pub fn help_menu() -> Message {
    Message::text(
        "Commands:\n\
         • location – latest position\n\
         • status – latest readings\n\
         • request help – alert the care team\n\
         • borrow – request equipment\n\
         • settings – safe zone and thresholds",
    )
}

/// Link to a LIFF page, e.g. the borrow or settings form.
pub fn open_form(title: &str, url: &str) -> Message {
    Message::buttons(title, title, vec![Action::uri("Open", url)])
}

/// Fit a reply into one request. A reply token is single-use, so overflow
/// is folded into a closing note rather than sent separately.
pub fn fit_reply(mut messages: Vec<Message>) -> Vec<Message> {
    if messages.len() <= MAX_MESSAGES_PER_REQUEST {
        return messages;
    }
    let hidden = messages.len() - (MAX_MESSAGES_PER_REQUEST - 1);
    messages.truncate(MAX_MESSAGES_PER_REQUEST - 1);
    messages.push(Message::text(format!(
        "{hidden} more not shown. Send \"status\" for a summary of everyone."
    )));
    messages
}

#[cfg(test)]
mod tests {
    use super::*;

    const RANGE: HeartRateRange = HeartRateRange { min_bpm: 50, max_bpm: 120 };

    fn home() -> Coordinate {
        Coordinate::new(13.75, 100.5).unwrap()
    }

    #[test]
    fn leaving_the_zone_sends_text_location_and_buttons() {
        let id = Uuid::new_v4();
        let messages = zone_event("Somchai", ZoneEvent::LeftOuter, 612.4, home(), Some(id));
        assert_eq!(messages.len(), 3);
        assert_eq!(
            messages[0],
            Message::text("Somchai has left the safe zone (612 m from home). Please check on them.")
        );
        assert!(matches!(messages[1], Message::Location { .. }));
        assert!(matches!(messages[2], Message::Template { .. }));
    }

    #[test]
    fn returning_sends_text_only() {
        let messages = zone_event("Somchai", ZoneEvent::Returned, 10.0, home(), None);
        assert_eq!(messages, vec![Message::text("Somchai is back inside the safe zone.")]);
    }

    #[test]
    fn held_vitals_send_nothing() {
        assert!(heart_rate("A", 80, VitalDecision::Hold, RANGE, None).is_none());
        assert!(temperature("A", 36.5, VitalDecision::Hold, 37.5, None).is_none());
    }

    #[test]
    fn low_heart_rate_mentions_the_lower_limit() {
        let messages =
            heart_rate("A", 42, VitalDecision::Raise(Deviation::Low), RANGE, None).unwrap();
        assert_eq!(messages, vec![Message::text("A's heart rate is low: 42 bpm (limit 50 bpm).")]);
    }

    #[test]
    fn sos_includes_rescue_buttons_with_postback_ids() {
        let id = Uuid::new_v4();
        let messages = fall("A", FallCode::Sos, Some(home()), Some(id));
        let Message::Template { template, .. } = &messages[2] else {
            panic!("expected buttons, got {:?}", messages[2]);
        };
        let json = serde_json::to_value(template).unwrap();
        assert_eq!(json["actions"][0]["data"], format!("action=accept_rescue&id={id}"));
        assert_eq!(json["actions"][1]["data"], format!("action=close_rescue&id={id}"));
    }

    #[test]
    fn pending_borrow_states_are_silent() {
        assert!(borrow_update(BorrowStatus::Pending).is_none());
        assert!(borrow_update(BorrowStatus::ReturnPending).is_none());
        assert!(borrow_update(BorrowStatus::Approved).is_some());
    }

    #[test]
    fn short_replies_are_untouched() {
        let messages = vec![Message::text("a"), Message::text("b")];
        assert_eq!(fit_reply(messages.clone()), messages);
    }

    #[test]
    fn long_replies_end_with_an_overflow_note() {
        let messages: Vec<Message> = (0..7).map(|i| Message::text(format!("dependent {i}"))).collect();
        let fitted = fit_reply(messages);
        assert_eq!(fitted.len(), MAX_MESSAGES_PER_REQUEST);
        assert_eq!(fitted[3], Message::text("dependent 3"));
        assert_eq!(
            fitted[4],
            Message::text("3 more not shown. Send \"status\" for a summary of everyone.")
        );
    }
}

//! Portfolio publication as an explicit state machine.
//!
//! A profile update hands the previous and new `portfolio_published` values to
//! [`transition`], which yields at most one [`PublishEvent`]. The caller dispatches the event
//! only after its transaction has committed.

/// Who changed the flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishActor {
    Owner,
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishEvent {
    Published,
    Unpublished { by_admin: bool },
}

/// `previous` is `None` when the profile is being created.
pub fn transition(previous: Option<bool>, current: bool, actor: PublishActor) -> Option<PublishEvent> {
    match (previous, current) {
        (None, false) => None,
        (None, true) => Some(PublishEvent::Published),
        (Some(before), after) if before == after => None,
        (Some(_), true) => Some(PublishEvent::Published),
        (Some(_), false) => Some(PublishEvent::Unpublished {
            by_admin: actor == PublishActor::Admin,
        }),
    }
}

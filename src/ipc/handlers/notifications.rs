use crate::ipc::error::{reply, HandlerErr};
use crate::ipc::helpers::{date_or, optional_str, require_staff, required_str, string_list, viewer};
use crate::ipc::types::{AppState, Request};
use crate::model::{Notification, RECIPIENT_ALL};
use crate::views;
use serde_json::json;
use uuid::Uuid;

fn notifications_list(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let v = viewer(&req.params)?;
    let snap = state.store.snapshot();
    let visible = views::notifications_for(&snap, &v);
    let unread = visible.iter().filter(|n| !n.read).count();
    Ok(json!({
        "unreadCount": unread,
        "notifications": visible,
    }))
}

fn notifications_mark_read(
    state: &mut AppState,
    req: &Request,
) -> Result<serde_json::Value, HandlerErr> {
    let v = viewer(&req.params)?;
    let id = required_str(&req.params, "notificationId")?;
    // Hidden notifications behave like unknown ids.
    let visible = views::notifications_for(&state.store.snapshot(), &v)
        .iter()
        .any(|n| n.id == id);
    let updated = visible && state.store.mark_notification_read(&id);
    if updated {
        tracing::info!(notification = %id, "notification marked read");
    }
    Ok(json!({ "notificationId": id, "updated": updated }))
}

fn notifications_create(
    state: &mut AppState,
    req: &Request,
) -> Result<serde_json::Value, HandlerErr> {
    let v = viewer(&req.params)?;
    require_staff(&v)?;
    let p = &req.params;
    let title = required_str(p, "title")?;
    let message = optional_str(p, "message").unwrap_or_default();
    let date = date_or(p, "date", state.clock.today())?;
    let mut recipients = string_list(p, "recipients")?;
    if recipients.is_empty() {
        recipients.push(RECIPIENT_ALL.to_string());
    }
    let id = optional_str(p, "id").unwrap_or_else(|| Uuid::new_v4().to_string());

    if state.store.snapshot().notifications.iter().any(|n| n.id == id) {
        return Err(HandlerErr::new("conflict", "notification id already exists")
            .with_details(json!({ "notificationId": id })));
    }

    state.store.add_notification(Notification {
        id: id.clone(),
        title,
        message,
        date,
        read: false,
        recipients,
    });
    tracing::info!(notification = %id, "notification created");
    Ok(json!({ "notificationId": id }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let res = match req.method.as_str() {
        "notifications.list" => notifications_list(state, req),
        "notifications.markRead" => notifications_mark_read(state, req),
        "notifications.create" => notifications_create(state, req),
        _ => return None,
    };
    Some(reply(&req.id, res))
}

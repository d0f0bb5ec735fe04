use crate::clock::is_iso_date;
use crate::ipc::error::HandlerErr;
use crate::model::{Role, Viewer};
use serde::Serialize;

pub fn optional_str(params: &serde_json::Value, key: &str) -> Option<String> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

pub fn required_str(params: &serde_json::Value, key: &str) -> Result<String, HandlerErr> {
    optional_str(params, key).ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))
}

/// ISO date from `key`, or `fallback` when absent.
pub fn date_or(params: &serde_json::Value, key: &str, fallback: String) -> Result<String, HandlerErr> {
    let date = optional_str(params, key).unwrap_or(fallback);
    if !is_iso_date(&date) {
        return Err(HandlerErr::bad_params(format!("{} must be YYYY-MM-DD", key)));
    }
    Ok(date)
}

pub fn required_u32(params: &serde_json::Value, key: &str) -> Result<u32, HandlerErr> {
    let Some(v) = params.get(key) else {
        return Err(HandlerErr::bad_params(format!("missing {}", key)));
    };
    v.as_u64()
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| HandlerErr::bad_params(format!("{} must be a non-negative integer", key)))
}

pub fn string_list(params: &serde_json::Value, key: &str) -> Result<Vec<String>, HandlerErr> {
    let Some(raw) = params.get(key) else {
        return Ok(Vec::new());
    };
    let Some(arr) = raw.as_array() else {
        return Err(HandlerErr::bad_params(format!("{} must be an array", key)));
    };
    let mut out = Vec::with_capacity(arr.len());
    for v in arr {
        let Some(s) = v.as_str().map(str::trim).filter(|s| !s.is_empty()) else {
            return Err(HandlerErr::bad_params(format!(
                "{} must contain only non-empty strings",
                key
            )));
        };
        if !out.iter().any(|o: &String| o == s) {
            out.push(s.to_string());
        }
    }
    Ok(out)
}

pub fn viewer(params: &serde_json::Value) -> Result<Viewer, HandlerErr> {
    let Some(raw) = params.get("viewer") else {
        return Err(HandlerErr::bad_params("missing viewer"));
    };
    let viewer: Viewer = serde_json::from_value(raw.clone())
        .map_err(|e| HandlerErr::bad_params(format!("invalid viewer: {}", e)))?;
    if matches!(viewer.role, Role::Student | Role::Parent) && viewer.user_id().is_none() {
        return Err(HandlerErr::bad_params(format!(
            "viewer.userId is required for role {}",
            viewer.role.as_str()
        )));
    }
    Ok(viewer)
}

pub fn require_staff(viewer: &Viewer) -> Result<(), HandlerErr> {
    if viewer.role.can_manage() {
        Ok(())
    } else {
        Err(HandlerErr::forbidden(format!(
            "role {} cannot perform this action",
            viewer.role.as_str()
        )))
    }
}

pub fn require_admin(viewer: &Viewer) -> Result<(), HandlerErr> {
    if viewer.role == Role::Admin {
        Ok(())
    } else {
        Err(HandlerErr::forbidden("admin role required"))
    }
}

pub fn to_json<T: Serialize>(value: &T) -> Result<serde_json::Value, HandlerErr> {
    serde_json::to_value(value).map_err(|e| HandlerErr::new("serialize_failed", e.to_string()))
}

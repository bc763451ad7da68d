use actix_web::web;
use diesel::prelude::*;
use log::{error, warn};

use crate::config::{ApiError, DbPool};
use crate::models::{ActivityEntry, NewActivityEntry};

// Action names as they appear in the admin activity view
pub const ACTION_USER_REGISTERED: &str = "user.registered";
pub const ACTION_USER_LOGIN: &str = "user.login";
pub const ACTION_BOOKING_CREATED: &str = "booking.created";
pub const ACTION_BOOKING_STATUS_CHANGED: &str = "booking.status_changed";
pub const ACTION_TOUR_CREATED: &str = "tour.created";
pub const ACTION_TOUR_UPDATED: &str = "tour.updated";
pub const ACTION_TOUR_DELETED: &str = "tour.deleted";
pub const ACTION_NEWS_CREATED: &str = "news.created";
pub const ACTION_NEWS_UPDATED: &str = "news.updated";
pub const ACTION_NEWS_DELETED: &str = "news.deleted";

pub struct ActivityLog;

impl ActivityLog {
    /// Best-effort append to the activity log. A failed write is logged and
    /// swallowed so it never breaks the operation being recorded.
    pub async fn record(actor_id: Option<i32>, action: &str, detail: String, pool: &DbPool) {
        let entry = NewActivityEntry {
            actor_id,
            action: action.to_string(),
            detail,
        };

        let conn = match pool.get() {
            Ok(conn) => conn,
            Err(e) => {
                warn!("Skipping activity record {}: no database connection: {}", action, e);
                return;
            }
        };

        let action_name = entry.action.clone();
        let result = web::block(move || {
            use crate::schema::activity_log::dsl::*;
            let mut conn = conn;
            diesel::insert_into(activity_log)
                .values(&entry)
                .execute(&mut conn)
        })
        .await;

        match result {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => warn!("Failed to record activity {}: {}", action_name, e),
            Err(e) => warn!("Activity record {} did not run: {}", action_name, e),
        }
    }

    pub async fn list_recent(limit: i64, pool: &DbPool) -> Result<Vec<ActivityEntry>, ApiError> {
        let conn = pool.get()
            .map_err(|e| {
                error!("Failed to get database connection: {}", e);
                ApiError::DatabaseError(e.to_string())
            })?;

        let entries = web::block(move || {
            use crate::schema::activity_log::dsl::*;
            let mut conn = conn;
            activity_log
                .order(created_at.desc())
                .limit(limit)
                .load::<ActivityEntry>(&mut conn)
        })
        .await
        .map_err(|e| {
            error!("Database operation error: {}", e);
            ApiError::DatabaseError(e.to_string())
        })?
        .map_err(|e| {
            error!("Failed to list activity log: {}", e);
            ApiError::DatabaseError(e.to_string())
        })?;

        Ok(entries)
    }
}

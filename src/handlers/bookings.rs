use actix_web::{get, post, web, HttpResponse};
use log::{debug, warn};
use serde_json::json;

use crate::activity::{ActivityLog, ACTION_BOOKING_CREATED};
use crate::config::{ApiError, DbPool};
use crate::handlers::validation_failure;
use crate::middleware::{encode_query_value, AuthContext};
use crate::models::{BookingRequest, User};
use crate::services::{BookingService, TourService, UserService};

/// A valid session is not proof of a profile row; nothing may be inserted
/// for a user the users table does not know.
fn require_profile(user_id: i32, profile: Option<User>) -> Result<User, ApiError> {
    profile.ok_or_else(|| {
        warn!(
            "Booking attempt by authenticated user {} failed: no matching profile row",
            user_id
        );
        ApiError::ValidationError(
            "Your user profile is not fully set up. Please try logging out and back in, or contact support if the issue persists.".to_string()
        )
    })
}

#[post("/book-tour")]
pub async fn submit_booking(
    pool: web::Data<DbPool>,
    ctx: AuthContext,
    booking_data: web::Json<BookingRequest>,
) -> Result<HttpResponse, ApiError> {
    debug!("Booking request from user {} for tour {}", ctx.user_id, booking_data.tour_id);

    require_profile(ctx.user_id, UserService::find_by_id(ctx.user_id, &pool).await?)?;

    let tour_date = match booking_data.validate() {
        Ok(date) => date,
        Err(errors) => return Ok(validation_failure(errors)),
    };

    let tour = TourService::find_by_id(booking_data.tour_id, &pool)
        .await?
        .ok_or_else(|| {
            debug!("Booking rejected: tour {} not found", booking_data.tour_id);
            ApiError::NotFoundError("Could not find tour details. Please try again.".to_string())
        })?;

    let booking = BookingService::create(
        ctx.user_id,
        &tour,
        tour_date,
        booking_data.number_of_people,
        booking_data.notes.clone(),
        &pool,
    )
    .await?;

    ActivityLog::record(
        Some(ctx.user_id),
        ACTION_BOOKING_CREATED,
        format!(
            "booking {} for tour \"{}\" on {} ({} people)",
            booking.id, tour.name, booking.tour_date, booking.number_of_people
        ),
        &pool,
    )
    .await;

    let message = format!(
        "Booking request for \"{}\" submitted successfully! We will confirm shortly.",
        tour.name
    );
    let redirect_to = format!("/bookings?message={}", encode_query_value(&message));

    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "message": message,
        "booking": booking,
        "redirect_to": redirect_to,
    })))
}

#[get("/bookings")]
pub async fn my_bookings(
    pool: web::Data<DbPool>,
    ctx: AuthContext,
) -> Result<HttpResponse, ApiError> {
    let bookings = BookingService::list_for_user(ctx.user_id, &pool).await?;
    Ok(HttpResponse::Ok().json(bookings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn profile_row(id: i32) -> User {
        let now = Utc::now().naive_utc();
        User {
            id,
            email: "amina@example.com".to_string(),
            password_hash: "hash".to_string(),
            full_name: "Amina Hassan".to_string(),
            phone: None,
            role: "user".to_string(),
            status: "active".to_string(),
            last_login: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn booking_requires_a_profile_row() {
        let err = require_profile(42, None).unwrap_err();
        match err {
            ApiError::ValidationError(message) => {
                assert!(message.contains("profile is not fully set up"));
            }
            other => panic!("unexpected error: {:?}", other),
        }

        let user = require_profile(7, Some(profile_row(7))).unwrap();
        assert_eq!(user.id, 7);
    }
}

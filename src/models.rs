use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use diesel::prelude::*;
use validator::{Validate, ValidationError, ValidationErrors};

/// Booking lifecycle values. Membership is the only guard: any status may
/// follow any other, there is deliberately no transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
    Rescheduled,
}

impl BookingStatus {
    pub const ALL: [BookingStatus; 5] = [
        BookingStatus::Pending,
        BookingStatus::Confirmed,
        BookingStatus::Cancelled,
        BookingStatus::Completed,
        BookingStatus::Rescheduled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Completed => "completed",
            BookingStatus::Rescheduled => "rescheduled",
        }
    }

    pub fn parse(value: &str) -> Option<BookingStatus> {
        Self::ALL.iter().copied().find(|s| s.as_str() == value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TourStatus {
    Available,
    Unavailable,
    Draft,
}

impl TourStatus {
    pub const ALL: [TourStatus; 3] = [
        TourStatus::Available,
        TourStatus::Unavailable,
        TourStatus::Draft,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TourStatus::Available => "available",
            TourStatus::Unavailable => "unavailable",
            TourStatus::Draft => "draft",
        }
    }

    pub fn parse(value: &str) -> Option<TourStatus> {
        Self::ALL.iter().copied().find(|s| s.as_str() == value)
    }
}

pub const ROLE_USER: &str = "user";
pub const ROLE_ADMIN: &str = "admin";

#[derive(Queryable, Serialize, Debug, Clone)]
pub struct User {
    pub id: i32,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub role: String,
    pub status: String,
    pub last_login: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::users)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub role: String,
}

#[derive(Queryable, Serialize, Debug, Clone)]
pub struct Tour {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub location: String,
    pub price: Option<Decimal>,
    pub duration_hours: Option<Decimal>,
    pub image_url: Option<String>,
    pub status: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::tours)]
pub struct NewTour {
    pub name: String,
    pub description: String,
    pub location: String,
    pub price: Option<Decimal>,
    pub duration_hours: Option<Decimal>,
    pub image_url: Option<String>,
    pub status: String,
}

#[derive(Queryable, Serialize, Debug)]
pub struct Booking {
    pub id: i32,
    pub user_id: i32,
    pub tour_id: i32,
    pub tour_date: NaiveDate,
    pub number_of_people: i32,
    pub status: String,
    pub total_price: Option<Decimal>,
    pub notes: Option<String>,
    pub booking_date: NaiveDateTime,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::bookings)]
pub struct NewBooking {
    pub user_id: i32,
    pub tour_id: i32,
    pub tour_date: NaiveDate,
    pub number_of_people: i32,
    pub status: String,
    pub total_price: Option<Decimal>,
    pub notes: Option<String>,
    pub booking_date: NaiveDateTime,
}

#[derive(Queryable, Serialize, Debug)]
pub struct Review {
    pub id: i32,
    pub user_id: i32,
    pub tour_id: i32,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Queryable, Serialize, Debug)]
pub struct NewsUpdate {
    pub id: i32,
    pub title: String,
    pub content: String,
    pub category: Option<String>,
    pub publish_date: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::news_updates)]
pub struct NewNewsUpdate {
    pub title: String,
    pub content: String,
    pub category: Option<String>,
    pub publish_date: Option<NaiveDateTime>,
}

#[derive(Queryable, Serialize, Debug)]
pub struct SessionToken {
    pub id: i32,
    pub user_id: i32,
    pub token: String,
    pub expires_at: NaiveDateTime,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::session_tokens)]
pub struct NewSessionToken {
    pub user_id: i32,
    pub token: String,
    pub expires_at: NaiveDateTime,
}

#[derive(Queryable, Serialize, Debug)]
pub struct ActivityEntry {
    pub id: i32,
    pub actor_id: Option<i32>,
    pub action: String,
    pub detail: String,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::activity_log)]
pub struct NewActivityEntry {
    pub actor_id: Option<i32>,
    pub action: String,
    pub detail: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct Claims {
    pub sub: String,      // Subject (user id)
    pub exp: usize,       // Expiration time
    pub iat: usize,       // Issued at
    pub user_id: i32,
    pub email: String,
}

// DTOs

/// A field name paired with a user-facing message, collected during form
/// validation and returned to the client as an `errors` map.
pub type FieldError = (&'static str, String);

/// Flattens `ValidationErrors` into one message per field, keeping the
/// `errors` map shape the frontend forms render.
fn collect_field_errors(outcome: Result<(), ValidationErrors>) -> Result<(), Vec<FieldError>> {
    match outcome {
        Ok(()) => Ok(()),
        Err(errors) => Err(errors
            .field_errors()
            .into_iter()
            .map(|(field, field_errors)| {
                let message = field_errors
                    .first()
                    .and_then(|e| e.message.clone())
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid value for {}.", field));
                (field, message)
            })
            .collect()),
    }
}

fn field_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(message.into());
    error
}

#[derive(Deserialize, Debug, Validate)]
pub struct SignupRequest {
    #[validate(email(message = "Invalid email address."))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters long."))]
    pub password: String,
    #[validate(length(min = 2, message = "Full name is required."))]
    pub full_name: String,
    pub phone: Option<String>,
}

impl SignupRequest {
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        collect_field_errors(Validate::validate(self))
    }
}

#[derive(Deserialize, Debug)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    pub redirect_to: Option<String>,
}

#[derive(Serialize, Debug)]
pub struct LoginResponse {
    pub token: String,
    pub refresh_token: String,
    pub user_id: i32,
    pub email: String,
    pub full_name: String,
    pub role: String,
    pub redirect_to: String,
}

#[derive(Deserialize, Debug, Validate)]
pub struct BookingRequest {
    pub tour_id: i32,
    #[validate(custom = "validate_tour_date")]
    pub tour_date: String,
    #[validate(range(min = 1, message = "Number of people must be at least 1."))]
    pub number_of_people: i32,
    #[validate(length(max = 500, message = "Notes cannot exceed 500 characters."))]
    pub notes: Option<String>,
}

impl BookingRequest {
    /// Field-level validation; passing yields the parsed tour date.
    pub fn validate(&self) -> Result<NaiveDate, Vec<FieldError>> {
        collect_field_errors(Validate::validate(self))?;
        parse_tour_date(&self.tour_date)
            .ok_or_else(|| vec![("tour_date", "Please select a valid date.".to_string())])
    }
}

#[derive(Deserialize, Debug)]
pub struct BookingStatusRequest {
    pub status: String,
}

#[derive(Deserialize, Debug, Clone, Validate)]
pub struct TourInput {
    #[validate(length(min = 3, message = "Name must be at least 3 characters."))]
    pub name: String,
    #[validate(length(min = 10, message = "Description must be at least 10 characters."))]
    pub description: String,
    #[validate(length(min = 3, message = "Location is required."))]
    pub location: String,
    #[validate(custom = "validate_price")]
    pub price: Option<Decimal>,
    #[validate(custom = "validate_duration")]
    pub duration_hours: Option<Decimal>,
    #[validate(
        url(message = "Please enter a valid URL for the image."),
        custom = "validate_web_url"
    )]
    pub image_url: Option<String>,
    #[validate(custom = "validate_tour_status")]
    pub status: String,
}

impl TourInput {
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        collect_field_errors(Validate::validate(self))
    }
}

#[derive(Deserialize, Debug, Clone, Validate)]
pub struct NewsInput {
    #[validate(length(min = 3, message = "Title must be at least 3 characters."))]
    pub title: String,
    #[validate(length(min = 10, message = "Content must be at least 10 characters."))]
    pub content: String,
    pub category: Option<String>,
    #[validate(custom = "validate_publish_date")]
    pub publish_date: Option<String>,
}

impl NewsInput {
    /// Field-level validation; passing yields the parsed publish date.
    pub fn validate(&self) -> Result<Option<NaiveDateTime>, Vec<FieldError>> {
        collect_field_errors(Validate::validate(self))?;
        Ok(self
            .publish_date
            .as_deref()
            .filter(|raw| !raw.is_empty())
            .and_then(parse_publish_date))
    }
}

#[derive(Deserialize, Debug, Validate)]
pub struct ProfileUpdateRequest {
    #[validate(length(min = 2, message = "Full name is required."))]
    pub full_name: String,
    pub phone: Option<String>,
}

impl ProfileUpdateRequest {
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        collect_field_errors(Validate::validate(self))
    }
}

#[derive(Deserialize, Debug, Validate)]
pub struct PasswordChangeRequest {
    #[validate(length(min = 8, message = "Password must be at least 8 characters long."))]
    pub password: String,
}

impl PasswordChangeRequest {
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        collect_field_errors(Validate::validate(self))
    }
}

/// Booking row joined with tour name/location for the user's bookings page.
#[derive(Queryable, Serialize, Debug)]
pub struct BookingWithTour {
    #[serde(flatten)]
    pub booking: Booking,
    pub tour_name: String,
    pub tour_location: String,
}

/// Booking row joined with tour and customer details for the admin list.
#[derive(Queryable, Serialize, Debug)]
pub struct BookingWithDetails {
    #[serde(flatten)]
    pub booking: Booking,
    pub tour_name: String,
    pub user_full_name: String,
    pub user_email: String,
}

#[derive(Queryable, Serialize, Debug)]
pub struct ReviewWithNames {
    #[serde(flatten)]
    pub review: Review,
    pub user_full_name: String,
    pub tour_name: String,
}

#[derive(Serialize, Debug)]
pub struct DashboardStats {
    pub bookings: i64,
    pub available_tours: i64,
    pub total_tours: i64,
    pub reviews: i64,
    pub users: i64,
}

fn validate_tour_date(raw: &str) -> Result<(), ValidationError> {
    if parse_tour_date(raw).is_some() {
        Ok(())
    } else {
        Err(field_error("tour_date", "Please select a valid date."))
    }
}

fn validate_publish_date(raw: &str) -> Result<(), ValidationError> {
    // An empty string means "publish immediately" and is fine.
    if raw.is_empty() || parse_publish_date(raw).is_some() {
        Ok(())
    } else {
        Err(field_error("publish_date", "Invalid publish date."))
    }
}

fn validate_price(price: &Decimal) -> Result<(), ValidationError> {
    if *price >= Decimal::ZERO {
        Ok(())
    } else {
        Err(field_error("price", "Price must be a positive number."))
    }
}

fn validate_duration(duration: &Decimal) -> Result<(), ValidationError> {
    if *duration >= Decimal::new(5, 1) {
        Ok(())
    } else {
        Err(field_error("duration_hours", "Duration must be at least 0.5 hours."))
    }
}

// The `url` check accepts any scheme; images must be fetchable over the web.
fn validate_web_url(value: &str) -> Result<(), ValidationError> {
    if value.starts_with("http://") || value.starts_with("https://") {
        Ok(())
    } else {
        Err(field_error("image_url", "Please enter a valid URL for the image."))
    }
}

fn validate_tour_status(value: &str) -> Result<(), ValidationError> {
    if TourStatus::parse(value).is_some() {
        Ok(())
    } else {
        Err(field_error("status", "Invalid status."))
    }
}

/// Accepts a plain YYYY-MM-DD date or a full RFC 3339 timestamp, normalizing
/// to the date part.
pub fn parse_tour_date(raw: &str) -> Option<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    chrono::DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.date_naive())
}

pub fn parse_publish_date(raw: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M") {
        return Some(dt);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn booking_status_accepts_only_the_five_members() {
        for value in ["pending", "confirmed", "cancelled", "completed", "rescheduled"] {
            assert!(BookingStatus::parse(value).is_some(), "{} should parse", value);
        }
        for value in ["Pending", "archived", "", "canceled", "done"] {
            assert!(BookingStatus::parse(value).is_none(), "{} should be rejected", value);
        }
    }

    #[test]
    fn tour_status_membership() {
        assert_eq!(TourStatus::parse("available"), Some(TourStatus::Available));
        assert_eq!(TourStatus::parse("draft"), Some(TourStatus::Draft));
        assert!(TourStatus::parse("hidden").is_none());
    }

    #[test]
    fn booking_request_validation_collects_field_errors() {
        let req = BookingRequest {
            tour_id: 1,
            tour_date: "not-a-date".to_string(),
            number_of_people: 0,
            notes: Some("x".repeat(501)),
        };
        let errors = req.validate().unwrap_err();
        let mut fields: Vec<&str> = errors.iter().map(|(f, _)| *f).collect();
        fields.sort_unstable();
        assert_eq!(fields, vec!["notes", "number_of_people", "tour_date"]);
    }

    #[test]
    fn booking_request_normalizes_rfc3339_dates() {
        let req = BookingRequest {
            tour_id: 1,
            tour_date: "2025-07-14T09:30:00+03:00".to_string(),
            number_of_people: 2,
            notes: None,
        };
        let date = req.validate().unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2025, 7, 14).unwrap());
    }

    #[test]
    fn tour_input_validation() {
        let valid = TourInput {
            name: "Spice Farm Walk".to_string(),
            description: "Half-day guided walk through a working spice farm.".to_string(),
            location: "Kizimbani".to_string(),
            price: Some(dec!(35.00)),
            duration_hours: Some(dec!(4.0)),
            image_url: Some("https://images.example.com/spice.jpg".to_string()),
            status: "available".to_string(),
        };
        assert!(valid.validate().is_ok());

        let invalid = TourInput {
            name: "ab".to_string(),
            description: "too short".to_string(),
            location: "".to_string(),
            price: Some(dec!(-1)),
            duration_hours: Some(dec!(0.25)),
            image_url: Some("ftp://nope".to_string()),
            status: "open".to_string(),
        };
        let errors = invalid.validate().unwrap_err();
        assert_eq!(errors.len(), 7);
    }

    #[test]
    fn signup_validation_checks_email_and_password_length() {
        let req = SignupRequest {
            email: "no-at-sign".to_string(),
            password: "short".to_string(),
            full_name: "A".to_string(),
            phone: None,
        };
        let errors = req.validate().unwrap_err();
        assert_eq!(errors.len(), 3);

        let req = SignupRequest {
            email: "amina@example.com".to_string(),
            password: "longenough".to_string(),
            full_name: "Amina Hassan".to_string(),
            phone: Some("+255700000000".to_string()),
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn signup_rejects_addresses_with_spaces_and_empty_labels() {
        for email in ["a b@exa mple..com", "amina@", "@example.com", "amina@@example.com"] {
            let req = SignupRequest {
                email: email.to_string(),
                password: "longenough".to_string(),
                full_name: "Amina Hassan".to_string(),
                phone: None,
            };
            let errors = req.validate().unwrap_err();
            assert!(
                errors.iter().any(|(field, _)| *field == "email"),
                "{} should be rejected",
                email
            );
        }
    }

    #[test]
    fn news_input_parses_optional_publish_date() {
        let none = NewsInput {
            title: "Rainy season hours".to_string(),
            content: "Morning departures move to 07:00 during March.".to_string(),
            category: None,
            publish_date: Some("".to_string()),
        };
        assert_eq!(none.validate().unwrap(), None);

        let dated = NewsInput {
            publish_date: Some("2025-03-01".to_string()),
            ..none.clone()
        };
        let parsed = dated.validate().unwrap().unwrap();
        assert_eq!(parsed.date(), NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());

        let bad = NewsInput {
            publish_date: Some("sometime soon".to_string()),
            ..dated
        };
        assert!(bad.validate().is_err());
    }
}

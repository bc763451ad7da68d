pub mod auth;
pub mod bookings;
pub mod news;
pub mod profile;
pub mod tours;
pub mod admin;

use actix_web::HttpResponse;
use serde_json::json;

use crate::models::FieldError;

/// 400 response carrying per-field messages for form feedback.
pub fn validation_failure(errors: Vec<FieldError>) -> HttpResponse {
    let mut fields = serde_json::Map::new();
    for (field, message) in errors {
        fields.insert(field.to_string(), json!(message));
    }
    HttpResponse::BadRequest().json(json!({
        "error": "Invalid form data. Please check your inputs.",
        "errors": fields,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;
    use actix_web::http::StatusCode;

    #[actix_web::test]
    async fn validation_failure_carries_field_map() {
        let res = validation_failure(vec![
            ("tour_date", "Please select a valid date.".to_string()),
            ("number_of_people", "Number of people must be at least 1.".to_string()),
        ]);
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let body = to_bytes(res.into_body()).await.unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed["errors"]["tour_date"], "Please select a valid date.");
        assert_eq!(
            parsed["errors"]["number_of_people"],
            "Number of people must be at least 1."
        );
    }
}

use actix_web::{get, web, HttpResponse};
use serde_json::json;

use crate::config::{ApiError, DbPool};
use crate::services::{ReviewService, TourService};

#[get("/tours")]
pub async fn list_tours(pool: web::Data<DbPool>) -> Result<HttpResponse, ApiError> {
    let tours = TourService::list_available(&pool).await?;
    Ok(HttpResponse::Ok().json(tours))
}

#[get("/tours/{id}")]
pub async fn tour_detail(
    pool: web::Data<DbPool>,
    path: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    let tour_id = path.into_inner();

    let tour = TourService::find_by_id(tour_id, &pool)
        .await?
        .ok_or_else(|| ApiError::NotFoundError("Tour not found".to_string()))?;
    let reviews = ReviewService::list_for_tour(tour_id, &pool).await?;

    Ok(HttpResponse::Ok().json(json!({
        "tour": tour,
        "reviews": reviews,
    })))
}

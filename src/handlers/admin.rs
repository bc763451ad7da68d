use actix_web::{delete, get, post, put, web, HttpResponse};
use log::debug;
use serde_json::json;

use crate::activity::{
    ActivityLog, ACTION_BOOKING_STATUS_CHANGED, ACTION_NEWS_CREATED, ACTION_NEWS_DELETED,
    ACTION_NEWS_UPDATED, ACTION_TOUR_CREATED, ACTION_TOUR_DELETED, ACTION_TOUR_UPDATED,
};
use crate::config::{ApiError, DbPool};
use crate::handlers::validation_failure;
use crate::middleware::{encode_query_value, AuthContext};
use crate::models::{BookingStatus, BookingStatusRequest, NewsInput, TourInput};
use crate::services::{BookingService, NewsService, ReviewService, StatsService, TourService, UserService};

#[get("/admin/stats")]
pub async fn dashboard_stats(pool: web::Data<DbPool>) -> Result<HttpResponse, ApiError> {
    let stats = StatsService::dashboard(&pool).await?;
    Ok(HttpResponse::Ok().json(stats))
}

#[get("/admin/bookings")]
pub async fn list_bookings(pool: web::Data<DbPool>) -> Result<HttpResponse, ApiError> {
    let bookings = BookingService::list_all(&pool).await?;
    Ok(HttpResponse::Ok().json(bookings))
}

#[put("/admin/bookings/{id}/status")]
pub async fn update_booking_status(
    pool: web::Data<DbPool>,
    ctx: AuthContext,
    path: web::Path<i32>,
    status_data: web::Json<BookingStatusRequest>,
) -> Result<HttpResponse, ApiError> {
    let booking_id = path.into_inner();

    // Membership in the closed status set is checked before any write.
    let new_status = BookingStatus::parse(&status_data.status)
        .ok_or_else(|| {
            debug!(
                "Rejected status value {:?} for booking {}",
                status_data.status, booking_id
            );
            ApiError::ValidationError("Invalid booking status.".to_string())
        })?;

    let booking = BookingService::update_status(booking_id, new_status, &pool).await?;

    ActivityLog::record(
        Some(ctx.user_id),
        ACTION_BOOKING_STATUS_CHANGED,
        format!("booking {} set to {}", booking.id, booking.status),
        &pool,
    )
    .await;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": format!("Booking status successfully updated to {}.", booking.status),
        "booking": booking,
    })))
}

#[get("/admin/tours")]
pub async fn list_tours(pool: web::Data<DbPool>) -> Result<HttpResponse, ApiError> {
    let tours = TourService::list_all(&pool).await?;
    Ok(HttpResponse::Ok().json(tours))
}

#[post("/admin/tours")]
pub async fn create_tour(
    pool: web::Data<DbPool>,
    ctx: AuthContext,
    input: web::Json<TourInput>,
) -> Result<HttpResponse, ApiError> {
    if let Err(errors) = input.validate() {
        return Ok(validation_failure(errors));
    }

    let tour = TourService::create(&input, &pool).await?;

    ActivityLog::record(
        Some(ctx.user_id),
        ACTION_TOUR_CREATED,
        format!("tour {} \"{}\" created", tour.id, tour.name),
        &pool,
    )
    .await;

    let message = "Tour created successfully!";
    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "message": message,
        "tour": tour,
        "redirect_to": format!("/admin/tours?message={}", encode_query_value(message)),
    })))
}

#[put("/admin/tours/{id}")]
pub async fn update_tour(
    pool: web::Data<DbPool>,
    ctx: AuthContext,
    path: web::Path<i32>,
    input: web::Json<TourInput>,
) -> Result<HttpResponse, ApiError> {
    let tour_id = path.into_inner();

    if let Err(errors) = input.validate() {
        return Ok(validation_failure(errors));
    }

    let tour = TourService::update(tour_id, &input, &pool).await?;

    ActivityLog::record(
        Some(ctx.user_id),
        ACTION_TOUR_UPDATED,
        format!("tour {} \"{}\" updated", tour.id, tour.name),
        &pool,
    )
    .await;

    let message = "Tour updated successfully!";
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": message,
        "tour": tour,
        "redirect_to": format!("/admin/tours?message={}", encode_query_value(message)),
    })))
}

#[delete("/admin/tours/{id}")]
pub async fn delete_tour(
    pool: web::Data<DbPool>,
    ctx: AuthContext,
    path: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    let tour_id = path.into_inner();

    TourService::delete(tour_id, &pool).await?;

    ActivityLog::record(
        Some(ctx.user_id),
        ACTION_TOUR_DELETED,
        format!("tour {} deleted", tour_id),
        &pool,
    )
    .await;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Tour deleted successfully!",
    })))
}

#[get("/admin/news")]
pub async fn list_news(pool: web::Data<DbPool>) -> Result<HttpResponse, ApiError> {
    let items = NewsService::list_all(&pool).await?;
    Ok(HttpResponse::Ok().json(items))
}

#[post("/admin/news")]
pub async fn create_news(
    pool: web::Data<DbPool>,
    ctx: AuthContext,
    input: web::Json<NewsInput>,
) -> Result<HttpResponse, ApiError> {
    let publish_date = match input.validate() {
        Ok(date) => date,
        Err(errors) => return Ok(validation_failure(errors)),
    };

    let item = NewsService::create(&input, publish_date, &pool).await?;

    ActivityLog::record(
        Some(ctx.user_id),
        ACTION_NEWS_CREATED,
        format!("news {} \"{}\" created", item.id, item.title),
        &pool,
    )
    .await;

    let message = "News article created successfully!";
    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "message": message,
        "news_item": item,
        "redirect_to": format!("/admin/news?message={}", encode_query_value(message)),
    })))
}

#[put("/admin/news/{id}")]
pub async fn update_news(
    pool: web::Data<DbPool>,
    ctx: AuthContext,
    path: web::Path<i32>,
    input: web::Json<NewsInput>,
) -> Result<HttpResponse, ApiError> {
    let news_id = path.into_inner();

    let publish_date = match input.validate() {
        Ok(date) => date,
        Err(errors) => return Ok(validation_failure(errors)),
    };

    let item = NewsService::update(news_id, &input, publish_date, &pool).await?;

    ActivityLog::record(
        Some(ctx.user_id),
        ACTION_NEWS_UPDATED,
        format!("news {} \"{}\" updated", item.id, item.title),
        &pool,
    )
    .await;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "News article updated successfully!",
        "news_item": item,
    })))
}

#[delete("/admin/news/{id}")]
pub async fn delete_news(
    pool: web::Data<DbPool>,
    ctx: AuthContext,
    path: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    let news_id = path.into_inner();

    NewsService::delete(news_id, &pool).await?;

    ActivityLog::record(
        Some(ctx.user_id),
        ACTION_NEWS_DELETED,
        format!("news {} deleted", news_id),
        &pool,
    )
    .await;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "News article deleted successfully!",
    })))
}

#[get("/admin/users")]
pub async fn list_users(pool: web::Data<DbPool>) -> Result<HttpResponse, ApiError> {
    let users = UserService::list_all(&pool).await?;
    Ok(HttpResponse::Ok().json(users))
}

#[get("/admin/reviews")]
pub async fn list_reviews(pool: web::Data<DbPool>) -> Result<HttpResponse, ApiError> {
    let reviews = ReviewService::list_all(&pool).await?;
    Ok(HttpResponse::Ok().json(reviews))
}

#[get("/admin/activity")]
pub async fn activity_log(pool: web::Data<DbPool>) -> Result<HttpResponse, ApiError> {
    let entries = ActivityLog::list_recent(100, &pool).await?;
    Ok(HttpResponse::Ok().json(entries))
}

use actix_web::{get, put, web, HttpResponse};
use log::debug;
use serde_json::json;

use crate::config::{ApiError, DbPool};
use crate::handlers::validation_failure;
use crate::middleware::AuthContext;
use crate::models::ProfileUpdateRequest;
use crate::services::UserService;

#[get("/profile")]
pub async fn get_profile(
    pool: web::Data<DbPool>,
    ctx: AuthContext,
) -> Result<HttpResponse, ApiError> {
    let user = UserService::get_by_id(ctx.user_id, &pool).await?;
    Ok(HttpResponse::Ok().json(user))
}

#[put("/profile")]
pub async fn update_profile(
    pool: web::Data<DbPool>,
    ctx: AuthContext,
    update: web::Json<ProfileUpdateRequest>,
) -> Result<HttpResponse, ApiError> {
    debug!("Profile update for user {}", ctx.user_id);

    if let Err(errors) = update.validate() {
        return Ok(validation_failure(errors));
    }

    let user = UserService::update_profile(ctx.user_id, &update, &pool).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Profile updated successfully.",
        "user": user,
    })))
}

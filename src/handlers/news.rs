use actix_web::{get, web, HttpResponse};

use crate::config::{ApiError, DbPool};
use crate::services::NewsService;

#[get("/news")]
pub async fn list_news(pool: web::Data<DbPool>) -> Result<HttpResponse, ApiError> {
    let items = NewsService::list_all(&pool).await?;
    Ok(HttpResponse::Ok().json(items))
}

use actix_web::cookie::{time as cookie_time, Cookie};
use actix_web::{post, web, HttpResponse};
use log::{debug, info};
use serde_json::json;

use crate::activity::{ActivityLog, ACTION_USER_LOGIN, ACTION_USER_REGISTERED};
use crate::config::{ApiError, AppConfig, DbPool};
use crate::handlers::validation_failure;
use crate::middleware::{AuthContext, SESSION_COOKIE};
use crate::models::{LoginRequest, LoginResponse, PasswordChangeRequest, SignupRequest, ROLE_ADMIN};
use crate::services::{AuthService, UserService};

#[post("/auth/signup")]
pub async fn signup(
    pool: web::Data<DbPool>,
    signup_data: web::Json<SignupRequest>,
) -> Result<HttpResponse, ApiError> {
    debug!("Signup attempt for email: {}", signup_data.email);

    if let Err(errors) = signup_data.validate() {
        return Ok(validation_failure(errors));
    }

    if UserService::find_by_email(&signup_data.email, &pool).await?.is_some() {
        debug!("Signup failed: email already exists {}", signup_data.email);
        return Err(ApiError::ValidationError("Email already exists".to_string()));
    }

    let user_id = UserService::create_user(&signup_data, &pool).await?;
    let user = UserService::get_by_id(user_id, &pool).await?;

    ActivityLog::record(
        Some(user_id),
        ACTION_USER_REGISTERED,
        format!("{} signed up", user.email),
        &pool,
    )
    .await;

    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "message": "Account created successfully. You can now log in.",
        "user": user,
    })))
}

#[post("/auth/login")]
pub async fn login(
    pool: web::Data<DbPool>,
    config: web::Data<AppConfig>,
    login_data: web::Json<LoginRequest>,
) -> Result<HttpResponse, ApiError> {
    debug!("Login attempt for user: {}", login_data.email);

    let user = match UserService::find_by_email(&login_data.email, &pool).await? {
        Some(user) => user,
        None => {
            debug!("Login failed: user not found with email {}", login_data.email);
            return Err(ApiError::AuthError("Invalid credentials".to_string()));
        }
    };

    let valid = AuthService::verify_password(&login_data.password, &user.password_hash)?;
    if !valid {
        debug!("Login failed: invalid password for user {}", login_data.email);
        return Err(ApiError::AuthError("Invalid credentials".to_string()));
    }

    let token = AuthService::generate_token(user.id, &user.email, &config)?;
    let refresh_token_str = AuthService::generate_refresh_token();
    AuthService::store_refresh_token(user.id, &refresh_token_str, &config, &pool).await?;
    AuthService::update_last_login(user.id, &pool).await?;

    // Admins land on the back-office; everyone else goes where they came from.
    let redirect_to = if user.role == ROLE_ADMIN {
        "/admin".to_string()
    } else {
        login_data.redirect_to.clone().unwrap_or_else(|| "/".to_string())
    };

    info!("User {} logged in successfully", user.email);

    ActivityLog::record(
        Some(user.id),
        ACTION_USER_LOGIN,
        format!("{} logged in", user.email),
        &pool,
    )
    .await;

    let session_cookie = Cookie::build(SESSION_COOKIE, token.clone())
        .path("/")
        .http_only(true)
        .max_age(cookie_time::Duration::hours(config.jwt_expiry))
        .finish();

    let login_response = LoginResponse {
        token,
        refresh_token: refresh_token_str,
        user_id: user.id,
        email: user.email.clone(),
        full_name: user.full_name.clone(),
        role: user.role.clone(),
        redirect_to,
    };

    Ok(HttpResponse::Ok().cookie(session_cookie).json(login_response))
}

#[post("/auth/logout")]
pub async fn logout(
    pool: web::Data<DbPool>,
    ctx: Option<AuthContext>,
) -> Result<HttpResponse, ApiError> {
    if let Some(ctx) = &ctx {
        AuthService::revoke_refresh_tokens(ctx.user_id, &pool).await?;
        info!("User {} logged out", ctx.email);
    }

    let mut removal = Cookie::new(SESSION_COOKIE, "");
    removal.set_path("/");
    removal.make_removal();

    Ok(HttpResponse::Ok().cookie(removal).json(json!({
        "success": true,
        "redirect_to": "/auth/login?message=Successfully logged out.",
    })))
}

#[post("/auth/refresh-token")]
pub async fn refresh_token(
    pool: web::Data<DbPool>,
    config: web::Data<AppConfig>,
    refresh_req: web::Json<serde_json::Value>,
) -> Result<HttpResponse, ApiError> {
    let refresh_token_str = match refresh_req.get("refresh_token") {
        Some(token) => token
            .as_str()
            .ok_or(ApiError::ValidationError("Invalid refresh token".to_string()))?,
        None => return Err(ApiError::ValidationError("Refresh token is required".to_string())),
    };

    let user_id = match AuthService::consume_refresh_token(refresh_token_str, &pool).await? {
        Some(user_id) => user_id,
        None => return Err(ApiError::AuthError("Invalid or expired refresh token".to_string())),
    };

    let user = UserService::get_by_id(user_id, &pool).await?;
    let new_token = AuthService::generate_token(user.id, &user.email, &config)?;
    let new_refresh_token_str = AuthService::generate_refresh_token();
    AuthService::store_refresh_token(user.id, &new_refresh_token_str, &config, &pool).await?;

    info!("Token refreshed for user {}", user.email);

    let session_cookie = Cookie::build(SESSION_COOKIE, new_token.clone())
        .path("/")
        .http_only(true)
        .max_age(cookie_time::Duration::hours(config.jwt_expiry))
        .finish();

    Ok(HttpResponse::Ok().cookie(session_cookie).json(json!({
        "token": new_token,
        "refresh_token": new_refresh_token_str,
        "user_id": user.id,
        "email": user.email,
    })))
}

#[post("/auth/reset-password")]
pub async fn reset_password(
    pool: web::Data<DbPool>,
    ctx: AuthContext,
    change: web::Json<PasswordChangeRequest>,
) -> Result<HttpResponse, ApiError> {
    if let Err(errors) = change.validate() {
        return Ok(validation_failure(errors));
    }

    UserService::update_password(ctx.user_id, &change.password, &pool).await?;
    AuthService::revoke_refresh_tokens(ctx.user_id, &pool).await?;

    info!("Password updated for user {}", ctx.email);

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "redirect_to": "/profile?message=Password updated successfully.",
    })))
}

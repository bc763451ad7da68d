use crate::models::*;
use crate::config::{ApiError, AppConfig, DbPool};
use actix_web::web;
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, NaiveDate, Utc};
use diesel::prelude::*;
use diesel::{QueryDsl, RunQueryDsl, ExpressionMethods};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use log::{debug, error, info};
use rust_decimal::Decimal;
use uuid::Uuid;

/// Maps the error from a keyed write: only the missing-row case becomes a
/// 404, anything else stays a database error.
fn not_found_or_db(e: diesel::result::Error, missing: &str) -> ApiError {
    match e {
        diesel::result::Error::NotFound => ApiError::NotFoundError(missing.to_string()),
        e => {
            error!("Database error: {}", e);
            ApiError::DatabaseError(e.to_string())
        }
    }
}

pub struct AuthService;

impl AuthService {
    pub fn hash_password(password: &str) -> Result<String, ApiError> {
        hash(password, DEFAULT_COST)
            .map_err(|e| {
                error!("Failed to hash password: {}", e);
                ApiError::InternalError("Failed to hash password".to_string())
            })
    }

    pub fn verify_password(password: &str, hash: &str) -> Result<bool, ApiError> {
        verify(password, hash)
            .map_err(|e| {
                error!("Failed to verify password: {}", e);
                ApiError::InternalError("Failed to verify password".to_string())
            })
    }

    pub fn generate_token(user_id: i32, email: &str, config: &AppConfig) -> Result<String, ApiError> {
        let now = Utc::now();
        let iat = now.timestamp() as usize;
        let exp = (now + Duration::hours(config.jwt_expiry)).timestamp() as usize;

        let claims = Claims {
            sub: user_id.to_string(),
            exp,
            iat,
            user_id,
            email: email.to_string(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.jwt_secret.as_bytes())
        )
        .map_err(|e| {
            error!("Failed to generate token: {}", e);
            ApiError::InternalError("Failed to generate token".to_string())
        })
    }

    pub fn decode_token(token: &str, config: &AppConfig) -> Result<Claims, ApiError> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            &Validation::default()
        )
        .map(|data| data.claims)
        .map_err(|e| {
            debug!("Session token rejected: {}", e);
            ApiError::AuthError("Invalid or expired session".to_string())
        })
    }

    pub fn generate_refresh_token() -> String {
        Uuid::new_v4().to_string()
    }

    pub async fn store_refresh_token(
        user_id: i32,
        token: &str,
        config: &AppConfig,
        pool: &DbPool
    ) -> Result<(), ApiError> {
        let expires_at = (Utc::now() + Duration::days(config.refresh_expiry)).naive_utc();

        let new_token = NewSessionToken {
            user_id,
            token: token.to_string(),
            expires_at,
        };

        let conn = pool.get()
            .map_err(|e| {
                error!("Failed to get database connection: {}", e);
                ApiError::DatabaseError(e.to_string())
            })?;

        web::block(move || {
            use crate::schema::session_tokens::dsl::*;
            let mut conn = conn;
            diesel::insert_into(session_tokens)
                .values(&new_token)
                .execute(&mut conn)
        })
        .await
        .map_err(|e| {
            error!("Database operation error: {}", e);
            ApiError::DatabaseError(e.to_string())
        })?
        .map_err(|e| {
            error!("Failed to store refresh token: {}", e);
            ApiError::DatabaseError(e.to_string())
        })?;

        Ok(())
    }

    /// Exchanges a stored, unexpired refresh token for its owning user id and
    /// deletes it so it cannot be replayed.
    pub async fn consume_refresh_token(token_value: &str, pool: &DbPool) -> Result<Option<i32>, ApiError> {
        let token_copy = token_value.to_string();
        let conn = pool.get()
            .map_err(|e| {
                error!("Failed to get database connection: {}", e);
                ApiError::DatabaseError(e.to_string())
            })?;

        let record = web::block(move || {
            use crate::schema::session_tokens::dsl::*;
            let mut conn = conn;
            let found = session_tokens
                .filter(token.eq(&token_copy))
                .filter(expires_at.gt(Utc::now().naive_utc()))
                .first::<crate::models::SessionToken>(&mut conn)
                .optional()?;
            if found.is_some() {
                diesel::delete(session_tokens.filter(token.eq(&token_copy)))
                    .execute(&mut conn)?;
            }
            QueryResult::Ok(found)
        })
        .await
        .map_err(|e| {
            error!("Database operation error: {}", e);
            ApiError::DatabaseError(e.to_string())
        })?
        .map_err(|e| {
            error!("Failed to look up refresh token: {}", e);
            ApiError::DatabaseError(e.to_string())
        })?;

        Ok(record.map(|r| r.user_id))
    }

    pub async fn revoke_refresh_tokens(user_id_param: i32, pool: &DbPool) -> Result<(), ApiError> {
        let conn = pool.get()
            .map_err(|e| {
                error!("Failed to get database connection: {}", e);
                ApiError::DatabaseError(e.to_string())
            })?;

        web::block(move || {
            use crate::schema::session_tokens::dsl::*;
            let mut conn = conn;
            diesel::delete(session_tokens.filter(user_id.eq(user_id_param)))
                .execute(&mut conn)
        })
        .await
        .map_err(|e| {
            error!("Database operation error: {}", e);
            ApiError::DatabaseError(e.to_string())
        })?
        .map_err(|e| {
            error!("Failed to revoke refresh tokens: {}", e);
            ApiError::DatabaseError(e.to_string())
        })?;

        Ok(())
    }

    pub async fn update_last_login(user_id_param: i32, pool: &DbPool) -> Result<(), ApiError> {
        let conn = pool.get()
            .map_err(|e| {
                error!("Failed to get database connection: {}", e);
                ApiError::DatabaseError(e.to_string())
            })?;

        web::block(move || {
            use crate::schema::users::dsl::*;
            let mut conn = conn;
            diesel::update(users.find(user_id_param))
                .set(last_login.eq(Some(Utc::now().naive_utc())))
                .execute(&mut conn)
        })
        .await
        .map_err(|e| {
            error!("Database operation error: {}", e);
            ApiError::DatabaseError(e.to_string())
        })?
        .map_err(|e| {
            error!("Failed to update last login: {}", e);
            ApiError::DatabaseError(e.to_string())
        })?;

        Ok(())
    }
}

pub struct UserService;

impl UserService {
    pub async fn find_by_email(email_addr: &str, pool: &DbPool) -> Result<Option<User>, ApiError> {
        let email_copy = email_addr.to_string();
        let conn = pool.get()
            .map_err(|e| {
                error!("Failed to get database connection: {}", e);
                ApiError::DatabaseError(e.to_string())
            })?;

        let user = web::block(move || {
            use crate::schema::users::dsl::*;
            let mut conn = conn;
            users
                .filter(email.eq(email_copy))
                .first::<User>(&mut conn)
                .optional()
        })
        .await
        .map_err(|e| {
            error!("Database operation error: {}", e);
            ApiError::DatabaseError(e.to_string())
        })?
        .map_err(|e| {
            error!("Error finding user by email: {}", e);
            ApiError::DatabaseError(e.to_string())
        })?;

        Ok(user)
    }

    pub async fn create_user(signup: &SignupRequest, pool: &DbPool) -> Result<i32, ApiError> {
        let password_hash = AuthService::hash_password(&signup.password)?;

        let new_user = NewUser {
            email: signup.email.trim().to_string(),
            password_hash,
            full_name: signup.full_name.trim().to_string(),
            phone: signup.phone.clone(),
            role: ROLE_USER.to_string(),
        };

        let new_user_clone = new_user.clone();
        let conn = pool.get()
            .map_err(|e| {
                error!("Failed to get database connection: {}", e);
                ApiError::DatabaseError(e.to_string())
            })?;

        let created_id = web::block(move || {
            use crate::schema::users::dsl::*;
            let mut conn = conn;
            diesel::insert_into(users)
                .values(&new_user)
                .returning(id)
                .get_result::<i32>(&mut conn)
        })
        .await
        .map_err(|e| {
            error!("Database operation error: {}", e);
            ApiError::DatabaseError(e.to_string())
        })?
        .map_err(|e| {
            if e.to_string().contains("unique constraint") {
                debug!("Attempted to create user with existing email: {}", new_user_clone.email);
                ApiError::ValidationError("Email already exists".to_string())
            } else {
                error!("Failed to create user: {}", e);
                ApiError::DatabaseError(e.to_string())
            }
        })?;

        info!("Created new user with ID: {}", created_id);
        Ok(created_id)
    }

    /// The booking flow depends on this returning None, not an error, when
    /// the session has no matching profile row.
    pub async fn find_by_id(user_id: i32, pool: &DbPool) -> Result<Option<User>, ApiError> {
        let conn = pool.get()
            .map_err(|e| {
                error!("Failed to get database connection: {}", e);
                ApiError::DatabaseError(e.to_string())
            })?;

        let user = web::block(move || {
            use crate::schema::users::dsl::*;
            let mut conn = conn;
            users.find(user_id).first::<User>(&mut conn).optional()
        })
        .await
        .map_err(|e| {
            error!("Database operation error: {}", e);
            ApiError::DatabaseError(e.to_string())
        })?
        .map_err(|e| {
            error!("Error finding user by id {}: {}", user_id, e);
            ApiError::DatabaseError(e.to_string())
        })?;

        Ok(user)
    }

    pub async fn get_by_id(user_id: i32, pool: &DbPool) -> Result<User, ApiError> {
        Self::find_by_id(user_id, pool)
            .await?
            .ok_or_else(|| {
                debug!("User not found with ID {}", user_id);
                ApiError::NotFoundError("User not found".to_string())
            })
    }

    /// Role lookup for the admin gate. A missing profile yields None.
    pub async fn find_role(user_id: i32, pool: &DbPool) -> Result<Option<String>, ApiError> {
        let conn = pool.get()
            .map_err(|e| {
                error!("Failed to get database connection: {}", e);
                ApiError::DatabaseError(e.to_string())
            })?;

        let found = web::block(move || {
            use crate::schema::users::dsl::*;
            let mut conn = conn;
            users
                .find(user_id)
                .select(role)
                .first::<String>(&mut conn)
                .optional()
        })
        .await
        .map_err(|e| {
            error!("Database operation error: {}", e);
            ApiError::DatabaseError(e.to_string())
        })?
        .map_err(|e| {
            error!("Error resolving role for user {}: {}", user_id, e);
            ApiError::DatabaseError(e.to_string())
        })?;

        Ok(found)
    }

    pub async fn list_all(pool: &DbPool) -> Result<Vec<User>, ApiError> {
        let conn = pool.get()
            .map_err(|e| {
                error!("Failed to get database connection: {}", e);
                ApiError::DatabaseError(e.to_string())
            })?;

        let all = web::block(move || {
            use crate::schema::users::dsl::*;
            let mut conn = conn;
            users.order(created_at.desc()).load::<User>(&mut conn)
        })
        .await
        .map_err(|e| {
            error!("Database operation error: {}", e);
            ApiError::DatabaseError(e.to_string())
        })?
        .map_err(|e| {
            error!("Failed to list users: {}", e);
            ApiError::DatabaseError(e.to_string())
        })?;

        Ok(all)
    }

    pub async fn update_profile(
        user_id: i32,
        update: &ProfileUpdateRequest,
        pool: &DbPool
    ) -> Result<User, ApiError> {
        let full_name_value = update.full_name.trim().to_string();
        let phone_value = update.phone.clone();
        let conn = pool.get()
            .map_err(|e| {
                error!("Failed to get database connection: {}", e);
                ApiError::DatabaseError(e.to_string())
            })?;

        let user = web::block(move || {
            use crate::schema::users::dsl::*;
            let mut conn = conn;
            diesel::update(users.find(user_id))
                .set((
                    full_name.eq(full_name_value),
                    phone.eq(phone_value),
                    updated_at.eq(Utc::now().naive_utc()),
                ))
                .get_result::<User>(&mut conn)
        })
        .await
        .map_err(|e| {
            error!("Database operation error: {}", e);
            ApiError::DatabaseError(e.to_string())
        })?
        .map_err(|e| {
            debug!("Profile update failed for user {}: {}", user_id, e);
            not_found_or_db(e, "User not found")
        })?;

        Ok(user)
    }

    pub async fn update_password(user_id: i32, password: &str, pool: &DbPool) -> Result<(), ApiError> {
        let new_hash = AuthService::hash_password(password)?;
        let conn = pool.get()
            .map_err(|e| {
                error!("Failed to get database connection: {}", e);
                ApiError::DatabaseError(e.to_string())
            })?;

        web::block(move || {
            use crate::schema::users::dsl::*;
            let mut conn = conn;
            diesel::update(users.find(user_id))
                .set((
                    password_hash.eq(new_hash),
                    updated_at.eq(Utc::now().naive_utc()),
                ))
                .execute(&mut conn)
        })
        .await
        .map_err(|e| {
            error!("Database operation error: {}", e);
            ApiError::DatabaseError(e.to_string())
        })?
        .map_err(|e| {
            error!("Failed to update password for user {}: {}", user_id, e);
            ApiError::DatabaseError(e.to_string())
        })?;

        Ok(())
    }
}

pub struct TourService;

impl TourService {
    pub async fn list_available(pool: &DbPool) -> Result<Vec<Tour>, ApiError> {
        let conn = pool.get()
            .map_err(|e| {
                error!("Failed to get database connection: {}", e);
                ApiError::DatabaseError(e.to_string())
            })?;

        let listed = web::block(move || {
            use crate::schema::tours::dsl::*;
            let mut conn = conn;
            tours
                .filter(status.eq(TourStatus::Available.as_str()))
                .order(created_at.desc())
                .load::<Tour>(&mut conn)
        })
        .await
        .map_err(|e| {
            error!("Database operation error: {}", e);
            ApiError::DatabaseError(e.to_string())
        })?
        .map_err(|e| {
            error!("Failed to list available tours: {}", e);
            ApiError::DatabaseError(e.to_string())
        })?;

        Ok(listed)
    }

    pub async fn list_all(pool: &DbPool) -> Result<Vec<Tour>, ApiError> {
        let conn = pool.get()
            .map_err(|e| {
                error!("Failed to get database connection: {}", e);
                ApiError::DatabaseError(e.to_string())
            })?;

        let listed = web::block(move || {
            use crate::schema::tours::dsl::*;
            let mut conn = conn;
            tours.order(created_at.desc()).load::<Tour>(&mut conn)
        })
        .await
        .map_err(|e| {
            error!("Database operation error: {}", e);
            ApiError::DatabaseError(e.to_string())
        })?
        .map_err(|e| {
            error!("Failed to list tours: {}", e);
            ApiError::DatabaseError(e.to_string())
        })?;

        Ok(listed)
    }

    pub async fn find_by_id(tour_id: i32, pool: &DbPool) -> Result<Option<Tour>, ApiError> {
        let conn = pool.get()
            .map_err(|e| {
                error!("Failed to get database connection: {}", e);
                ApiError::DatabaseError(e.to_string())
            })?;

        let tour = web::block(move || {
            use crate::schema::tours::dsl::*;
            let mut conn = conn;
            tours.find(tour_id).first::<Tour>(&mut conn).optional()
        })
        .await
        .map_err(|e| {
            error!("Database operation error: {}", e);
            ApiError::DatabaseError(e.to_string())
        })?
        .map_err(|e| {
            error!("Error finding tour {}: {}", tour_id, e);
            ApiError::DatabaseError(e.to_string())
        })?;

        Ok(tour)
    }

    pub async fn create(input: &TourInput, pool: &DbPool) -> Result<Tour, ApiError> {
        let new_tour = NewTour {
            name: input.name.trim().to_string(),
            description: input.description.trim().to_string(),
            location: input.location.trim().to_string(),
            price: input.price,
            duration_hours: input.duration_hours,
            image_url: input.image_url.clone(),
            status: input.status.clone(),
        };

        let conn = pool.get()
            .map_err(|e| {
                error!("Failed to get database connection: {}", e);
                ApiError::DatabaseError(e.to_string())
            })?;

        let tour = web::block(move || {
            use crate::schema::tours::dsl::*;
            let mut conn = conn;
            diesel::insert_into(tours)
                .values(&new_tour)
                .get_result::<Tour>(&mut conn)
        })
        .await
        .map_err(|e| {
            error!("Database operation error: {}", e);
            ApiError::DatabaseError(e.to_string())
        })?
        .map_err(|e| {
            error!("Failed to create tour: {}", e);
            ApiError::DatabaseError(e.to_string())
        })?;

        info!("Created tour {} ({})", tour.id, tour.name);
        Ok(tour)
    }

    pub async fn update(tour_id: i32, input: &TourInput, pool: &DbPool) -> Result<Tour, ApiError> {
        let input = input.clone();
        let conn = pool.get()
            .map_err(|e| {
                error!("Failed to get database connection: {}", e);
                ApiError::DatabaseError(e.to_string())
            })?;

        let tour = web::block(move || {
            use crate::schema::tours::dsl::*;
            let mut conn = conn;
            diesel::update(tours.find(tour_id))
                .set((
                    name.eq(input.name.trim().to_string()),
                    description.eq(input.description.trim().to_string()),
                    location.eq(input.location.trim().to_string()),
                    price.eq(input.price),
                    duration_hours.eq(input.duration_hours),
                    image_url.eq(input.image_url),
                    status.eq(input.status),
                    updated_at.eq(Utc::now().naive_utc()),
                ))
                .get_result::<Tour>(&mut conn)
        })
        .await
        .map_err(|e| {
            error!("Database operation error: {}", e);
            ApiError::DatabaseError(e.to_string())
        })?
        .map_err(|e| {
            debug!("Tour update failed for {}: {}", tour_id, e);
            not_found_or_db(e, "Tour not found")
        })?;

        Ok(tour)
    }

    /// Deleting a tour that has bookings would orphan them, so the delete is
    /// refused with a conflict instead.
    pub async fn delete(tour_id: i32, pool: &DbPool) -> Result<(), ApiError> {
        let conn = pool.get()
            .map_err(|e| {
                error!("Failed to get database connection: {}", e);
                ApiError::DatabaseError(e.to_string())
            })?;

        let booking_count = web::block(move || {
            use crate::schema::bookings::dsl as b;
            let mut conn = conn;
            b::bookings
                .filter(b::tour_id.eq(tour_id))
                .count()
                .get_result::<i64>(&mut conn)
        })
        .await
        .map_err(|e| {
            error!("Database operation error: {}", e);
            ApiError::DatabaseError(e.to_string())
        })?
        .map_err(|e| {
            error!("Failed to count bookings for tour {}: {}", tour_id, e);
            ApiError::DatabaseError(e.to_string())
        })?;

        if booking_count > 0 {
            debug!("Refused to delete tour {} with {} bookings", tour_id, booking_count);
            return Err(ApiError::ConflictError(
                "This tour has existing bookings and cannot be deleted.".to_string()
            ));
        }

        let conn = pool.get()
            .map_err(|e| {
                error!("Failed to get database connection: {}", e);
                ApiError::DatabaseError(e.to_string())
            })?;

        let deleted = web::block(move || {
            use crate::schema::tours::dsl::*;
            let mut conn = conn;
            diesel::delete(tours.find(tour_id)).execute(&mut conn)
        })
        .await
        .map_err(|e| {
            error!("Database operation error: {}", e);
            ApiError::DatabaseError(e.to_string())
        })?
        .map_err(|e| {
            error!("Failed to delete tour {}: {}", tour_id, e);
            ApiError::DatabaseError(e.to_string())
        })?;

        if deleted == 0 {
            return Err(ApiError::NotFoundError("Tour not found".to_string()));
        }

        info!("Deleted tour {}", tour_id);
        Ok(())
    }
}

pub struct BookingService;

impl BookingService {
    /// Price snapshot taken at creation: None when the tour carries no price.
    pub fn compute_total_price(price: Option<Decimal>, number_of_people: i32) -> Option<Decimal> {
        price.map(|p| p * Decimal::from(number_of_people))
    }

    pub async fn create(
        user_id: i32,
        tour: &Tour,
        tour_date: NaiveDate,
        number_of_people: i32,
        notes: Option<String>,
        pool: &DbPool
    ) -> Result<Booking, ApiError> {
        let new_booking = NewBooking {
            user_id,
            tour_id: tour.id,
            tour_date,
            number_of_people,
            status: BookingStatus::Pending.as_str().to_string(),
            total_price: Self::compute_total_price(tour.price, number_of_people),
            notes,
            booking_date: Utc::now().naive_utc(),
        };

        let conn = pool.get()
            .map_err(|e| {
                error!("Failed to get database connection: {}", e);
                ApiError::DatabaseError(e.to_string())
            })?;

        let booking = web::block(move || {
            use crate::schema::bookings::dsl::*;
            let mut conn = conn;
            diesel::insert_into(bookings)
                .values(&new_booking)
                .get_result::<Booking>(&mut conn)
        })
        .await
        .map_err(|e| {
            error!("Database operation error: {}", e);
            ApiError::DatabaseError(e.to_string())
        })?
        .map_err(|e| {
            if e.to_string().contains("fk_bookings_tour") {
                debug!("Booking insert hit a dangling tour reference: {}", e);
                ApiError::ValidationError(
                    "The selected tour is no longer available or valid. Please refresh and try again.".to_string()
                )
            } else {
                error!("Failed to create booking: {}", e);
                ApiError::DatabaseError(e.to_string())
            }
        })?;

        info!("Booking {} created for tour {} by user {}", booking.id, booking.tour_id, user_id);
        Ok(booking)
    }

    pub async fn list_for_user(user_id_param: i32, pool: &DbPool) -> Result<Vec<BookingWithTour>, ApiError> {
        let conn = pool.get()
            .map_err(|e| {
                error!("Failed to get database connection: {}", e);
                ApiError::DatabaseError(e.to_string())
            })?;

        let listed = web::block(move || {
            use crate::schema::bookings;
            use crate::schema::tours;
            let mut conn = conn;
            bookings::table
                .inner_join(tours::table)
                .filter(bookings::user_id.eq(user_id_param))
                .order(bookings::created_at.desc())
                .select((bookings::all_columns, tours::name, tours::location))
                .load::<BookingWithTour>(&mut conn)
        })
        .await
        .map_err(|e| {
            error!("Database operation error: {}", e);
            ApiError::DatabaseError(e.to_string())
        })?
        .map_err(|e| {
            error!("Failed to list bookings for user {}: {}", user_id_param, e);
            ApiError::DatabaseError(e.to_string())
        })?;

        Ok(listed)
    }

    pub async fn list_all(pool: &DbPool) -> Result<Vec<BookingWithDetails>, ApiError> {
        let conn = pool.get()
            .map_err(|e| {
                error!("Failed to get database connection: {}", e);
                ApiError::DatabaseError(e.to_string())
            })?;

        let listed = web::block(move || {
            use crate::schema::bookings;
            use crate::schema::tours;
            use crate::schema::users;
            let mut conn = conn;
            bookings::table
                .inner_join(tours::table)
                .inner_join(users::table)
                .order(bookings::booking_date.desc())
                .select((
                    bookings::all_columns,
                    tours::name,
                    users::full_name,
                    users::email,
                ))
                .load::<BookingWithDetails>(&mut conn)
        })
        .await
        .map_err(|e| {
            error!("Database operation error: {}", e);
            ApiError::DatabaseError(e.to_string())
        })?
        .map_err(|e| {
            error!("Failed to list bookings for admin: {}", e);
            ApiError::DatabaseError(e.to_string())
        })?;

        Ok(listed)
    }

    /// Caller must have validated `new_status` against `BookingStatus::ALL`
    /// already; this only touches `status` and `updated_at`, never
    /// `total_price`.
    pub async fn update_status(
        booking_id: i32,
        new_status: BookingStatus,
        pool: &DbPool
    ) -> Result<Booking, ApiError> {
        let conn = pool.get()
            .map_err(|e| {
                error!("Failed to get database connection: {}", e);
                ApiError::DatabaseError(e.to_string())
            })?;

        let booking = web::block(move || {
            use crate::schema::bookings::dsl::*;
            let mut conn = conn;
            diesel::update(bookings.find(booking_id))
                .set((
                    status.eq(new_status.as_str()),
                    updated_at.eq(Utc::now().naive_utc()),
                ))
                .get_result::<Booking>(&mut conn)
        })
        .await
        .map_err(|e| {
            error!("Database operation error: {}", e);
            ApiError::DatabaseError(e.to_string())
        })?
        .map_err(|e| {
            debug!("Status update failed for booking {}: {}", booking_id, e);
            not_found_or_db(e, "Booking not found")
        })?;

        info!("Booking {} status set to {}", booking.id, booking.status);
        Ok(booking)
    }
}

pub struct NewsService;

impl NewsService {
    pub async fn list_all(pool: &DbPool) -> Result<Vec<NewsUpdate>, ApiError> {
        let conn = pool.get()
            .map_err(|e| {
                error!("Failed to get database connection: {}", e);
                ApiError::DatabaseError(e.to_string())
            })?;

        let listed = web::block(move || {
            use crate::schema::news_updates::dsl::*;
            let mut conn = conn;
            news_updates
                .order(publish_date.desc())
                .load::<NewsUpdate>(&mut conn)
        })
        .await
        .map_err(|e| {
            error!("Database operation error: {}", e);
            ApiError::DatabaseError(e.to_string())
        })?
        .map_err(|e| {
            error!("Failed to list news updates: {}", e);
            ApiError::DatabaseError(e.to_string())
        })?;

        Ok(listed)
    }

    pub async fn create(input: &NewsInput, publish_date_value: Option<chrono::NaiveDateTime>, pool: &DbPool) -> Result<NewsUpdate, ApiError> {
        let new_item = NewNewsUpdate {
            title: input.title.trim().to_string(),
            content: input.content.trim().to_string(),
            category: input.category.clone(),
            publish_date: publish_date_value,
        };

        let conn = pool.get()
            .map_err(|e| {
                error!("Failed to get database connection: {}", e);
                ApiError::DatabaseError(e.to_string())
            })?;

        let item = web::block(move || {
            use crate::schema::news_updates::dsl::*;
            let mut conn = conn;
            diesel::insert_into(news_updates)
                .values(&new_item)
                .get_result::<NewsUpdate>(&mut conn)
        })
        .await
        .map_err(|e| {
            error!("Database operation error: {}", e);
            ApiError::DatabaseError(e.to_string())
        })?
        .map_err(|e| {
            error!("Failed to create news update: {}", e);
            ApiError::DatabaseError(e.to_string())
        })?;

        info!("Created news update {} ({})", item.id, item.title);
        Ok(item)
    }

    pub async fn update(
        news_id: i32,
        input: &NewsInput,
        publish_date_value: Option<chrono::NaiveDateTime>,
        pool: &DbPool
    ) -> Result<NewsUpdate, ApiError> {
        let input = input.clone();
        let conn = pool.get()
            .map_err(|e| {
                error!("Failed to get database connection: {}", e);
                ApiError::DatabaseError(e.to_string())
            })?;

        let item = web::block(move || {
            use crate::schema::news_updates::dsl::*;
            let mut conn = conn;
            diesel::update(news_updates.find(news_id))
                .set((
                    title.eq(input.title.trim().to_string()),
                    content.eq(input.content.trim().to_string()),
                    category.eq(input.category),
                    publish_date.eq(publish_date_value),
                    updated_at.eq(Utc::now().naive_utc()),
                ))
                .get_result::<NewsUpdate>(&mut conn)
        })
        .await
        .map_err(|e| {
            error!("Database operation error: {}", e);
            ApiError::DatabaseError(e.to_string())
        })?
        .map_err(|e| {
            debug!("News update failed for {}: {}", news_id, e);
            not_found_or_db(e, "News article not found")
        })?;

        Ok(item)
    }

    pub async fn delete(news_id: i32, pool: &DbPool) -> Result<(), ApiError> {
        let conn = pool.get()
            .map_err(|e| {
                error!("Failed to get database connection: {}", e);
                ApiError::DatabaseError(e.to_string())
            })?;

        let deleted = web::block(move || {
            use crate::schema::news_updates::dsl::*;
            let mut conn = conn;
            diesel::delete(news_updates.find(news_id)).execute(&mut conn)
        })
        .await
        .map_err(|e| {
            error!("Database operation error: {}", e);
            ApiError::DatabaseError(e.to_string())
        })?
        .map_err(|e| {
            error!("Failed to delete news update {}: {}", news_id, e);
            ApiError::DatabaseError(e.to_string())
        })?;

        if deleted == 0 {
            return Err(ApiError::NotFoundError("News article not found".to_string()));
        }

        info!("Deleted news update {}", news_id);
        Ok(())
    }
}

pub struct ReviewService;

impl ReviewService {
    pub async fn list_for_tour(tour_id_param: i32, pool: &DbPool) -> Result<Vec<ReviewWithNames>, ApiError> {
        let conn = pool.get()
            .map_err(|e| {
                error!("Failed to get database connection: {}", e);
                ApiError::DatabaseError(e.to_string())
            })?;

        let listed = web::block(move || {
            use crate::schema::user_reviews;
            use crate::schema::users;
            use crate::schema::tours;
            let mut conn = conn;
            user_reviews::table
                .inner_join(users::table)
                .inner_join(tours::table)
                .filter(user_reviews::tour_id.eq(tour_id_param))
                .order(user_reviews::created_at.desc())
                .select((
                    user_reviews::all_columns,
                    users::full_name,
                    tours::name,
                ))
                .load::<ReviewWithNames>(&mut conn)
        })
        .await
        .map_err(|e| {
            error!("Database operation error: {}", e);
            ApiError::DatabaseError(e.to_string())
        })?
        .map_err(|e| {
            error!("Failed to list reviews for tour {}: {}", tour_id_param, e);
            ApiError::DatabaseError(e.to_string())
        })?;

        Ok(listed)
    }

    pub async fn list_all(pool: &DbPool) -> Result<Vec<ReviewWithNames>, ApiError> {
        let conn = pool.get()
            .map_err(|e| {
                error!("Failed to get database connection: {}", e);
                ApiError::DatabaseError(e.to_string())
            })?;

        let listed = web::block(move || {
            use crate::schema::user_reviews;
            use crate::schema::users;
            use crate::schema::tours;
            let mut conn = conn;
            user_reviews::table
                .inner_join(users::table)
                .inner_join(tours::table)
                .order(user_reviews::created_at.desc())
                .select((
                    user_reviews::all_columns,
                    users::full_name,
                    tours::name,
                ))
                .load::<ReviewWithNames>(&mut conn)
        })
        .await
        .map_err(|e| {
            error!("Database operation error: {}", e);
            ApiError::DatabaseError(e.to_string())
        })?
        .map_err(|e| {
            error!("Failed to list reviews: {}", e);
            ApiError::DatabaseError(e.to_string())
        })?;

        Ok(listed)
    }
}

pub struct StatsService;

impl StatsService {
    pub async fn dashboard(pool: &DbPool) -> Result<DashboardStats, ApiError> {
        let conn = pool.get()
            .map_err(|e| {
                error!("Failed to get database connection: {}", e);
                ApiError::DatabaseError(e.to_string())
            })?;

        let stats = web::block(move || {
            use crate::schema::bookings;
            use crate::schema::tours;
            use crate::schema::user_reviews;
            use crate::schema::users;
            let mut conn = conn;

            let bookings_count = bookings::table.count().get_result::<i64>(&mut conn)?;
            let available_tours = tours::table
                .filter(tours::status.eq(TourStatus::Available.as_str()))
                .count()
                .get_result::<i64>(&mut conn)?;
            let total_tours = tours::table.count().get_result::<i64>(&mut conn)?;
            let reviews_count = user_reviews::table.count().get_result::<i64>(&mut conn)?;
            let users_count = users::table.count().get_result::<i64>(&mut conn)?;

            QueryResult::Ok(DashboardStats {
                bookings: bookings_count,
                available_tours,
                total_tours,
                reviews: reviews_count,
                users: users_count,
            })
        })
        .await
        .map_err(|e| {
            error!("Database operation error: {}", e);
            ApiError::DatabaseError(e.to_string())
        })?
        .map_err(|e| {
            error!("Failed to gather dashboard stats: {}", e);
            ApiError::DatabaseError(e.to_string())
        })?;

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn keyed_write_errors_keep_their_kind() {
        let missing = not_found_or_db(diesel::result::Error::NotFound, "Tour not found");
        assert!(matches!(missing, ApiError::NotFoundError(ref m) if m == "Tour not found"));

        let broken = not_found_or_db(
            diesel::result::Error::QueryBuilderError("connection reset".into()),
            "Tour not found",
        );
        assert!(matches!(broken, ApiError::DatabaseError(_)));
    }

    #[test]
    fn total_price_is_price_times_people() {
        assert_eq!(
            BookingService::compute_total_price(Some(dec!(50.00)), 3),
            Some(dec!(150.00))
        );
        assert_eq!(
            BookingService::compute_total_price(Some(dec!(19.99)), 2),
            Some(dec!(39.98))
        );
    }

    #[test]
    fn total_price_is_none_for_unpriced_tours() {
        assert_eq!(BookingService::compute_total_price(None, 4), None);
    }

    #[test]
    fn password_hash_round_trip() {
        let hashed = AuthService::hash_password("correct horse battery").unwrap();
        assert!(AuthService::verify_password("correct horse battery", &hashed).unwrap());
        assert!(!AuthService::verify_password("wrong guess", &hashed).unwrap());
    }

    #[test]
    fn token_round_trip_preserves_identity() {
        let config = AppConfig {
            jwt_secret: "test-secret".to_string(),
            jwt_expiry: 1,
            refresh_expiry: 1,
        };
        let token = AuthService::generate_token(42, "amina@example.com", &config).unwrap();
        let claims = AuthService::decode_token(&token, &config).unwrap();
        assert_eq!(claims.user_id, 42);
        assert_eq!(claims.email, "amina@example.com");
        assert_eq!(claims.sub, "42");
    }

    #[test]
    fn token_with_wrong_secret_is_rejected() {
        let config = AppConfig {
            jwt_secret: "test-secret".to_string(),
            jwt_expiry: 1,
            refresh_expiry: 1,
        };
        let other = AppConfig {
            jwt_secret: "different-secret".to_string(),
            ..config.clone()
        };
        let token = AuthService::generate_token(7, "x@example.com", &config).unwrap();
        assert!(AuthService::decode_token(&token, &other).is_err());
    }

    #[test]
    fn refresh_tokens_are_unique() {
        let a = AuthService::generate_refresh_token();
        let b = AuthService::generate_refresh_token();
        assert_ne!(a, b);
    }
}

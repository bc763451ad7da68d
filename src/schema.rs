// Database schema definitions
diesel::table! {
    users (id) {
        id -> Int4,
        email -> Varchar,
        password_hash -> Varchar,
        full_name -> Varchar,
        phone -> Nullable<Varchar>,
        role -> Varchar,
        status -> Varchar,
        last_login -> Nullable<Timestamp>,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

diesel::table! {
    tours (id) {
        id -> Int4,
        name -> Varchar,
        description -> Text,
        location -> Varchar,
        price -> Nullable<Numeric>,
        duration_hours -> Nullable<Numeric>,
        image_url -> Nullable<Varchar>,
        status -> Varchar,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

diesel::table! {
    bookings (id) {
        id -> Int4,
        user_id -> Int4,
        tour_id -> Int4,
        tour_date -> Date,
        number_of_people -> Int4,
        status -> Varchar,
        total_price -> Nullable<Numeric>,
        notes -> Nullable<Text>,
        booking_date -> Timestamp,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

diesel::table! {
    user_reviews (id) {
        id -> Int4,
        user_id -> Int4,
        tour_id -> Int4,
        rating -> Int4,
        comment -> Nullable<Text>,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

diesel::table! {
    news_updates (id) {
        id -> Int4,
        title -> Varchar,
        content -> Text,
        category -> Nullable<Varchar>,
        publish_date -> Nullable<Timestamp>,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

diesel::table! {
    session_tokens (id) {
        id -> Int4,
        user_id -> Int4,
        token -> Varchar,
        expires_at -> Timestamp,
        created_at -> Timestamp,
    }
}

diesel::table! {
    activity_log (id) {
        id -> Int4,
        actor_id -> Nullable<Int4>,
        action -> Varchar,
        detail -> Text,
        created_at -> Timestamp,
    }
}

diesel::joinable!(bookings -> users (user_id));
diesel::joinable!(bookings -> tours (tour_id));
diesel::joinable!(user_reviews -> users (user_id));
diesel::joinable!(user_reviews -> tours (tour_id));
diesel::joinable!(session_tokens -> users (user_id));
diesel::joinable!(activity_log -> users (actor_id));

diesel::allow_tables_to_appear_in_same_query!(
    users, tours, bookings, user_reviews,
    news_updates, session_tokens, activity_log,
);

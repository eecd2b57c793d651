// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{admin, attempt, auth, chapter, dashboard, question, quiz, subject},
    state::AppState,
    utils::session::{admin_middleware, auth_middleware},
};

/// Assembles the main application router.
///
/// * Public: registration and login.
/// * Session required: landing, logout, user pages, quiz attempts.
/// * Admin session required: content management and reports.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin([
            HeaderValue::from_static("http://localhost:3000"),
            HeaderValue::from_static("http://127.0.0.1:3000"),
        ])
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true);

    let public_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login));

    let user_routes = Router::new()
        .route("/", get(auth::index))
        .route("/logout", post(auth::logout))
        .route("/user_dashboard", get(dashboard::user_dashboard))
        .route("/quiz/{id}/view", get(dashboard::view_quiz))
        .route("/scoreboard", get(dashboard::scoreboard))
        .route("/user_summary", get(dashboard::user_summary))
        .route("/user_summary/score_trend.svg", get(dashboard::score_trend_chart))
        .route("/user_summary/quiz_averages.svg", get(dashboard::quiz_averages_chart))
        .route("/user_summary/weekly_attempts.svg", get(dashboard::weekly_attempts_chart))
        .route(
            "/start_quiz/{id}",
            get(attempt::show_question).post(attempt::answer_question),
        )
        .route(
            "/save_score/{id}",
            get(attempt::save_score).post(attempt::save_score),
        );

    let admin_routes = Router::new()
        // Content hierarchy
        .route("/add_subject", post(subject::create_subject))
        .route("/subject/{id}", get(subject::get_subject))
        .route("/edit_subject/{id}", post(subject::update_subject))
        .route(
            "/delete_subject/{id}",
            post(subject::delete_subject).delete(subject::delete_subject),
        )
        .route("/show_chapters/{id}", get(subject::list_chapters))
        .route("/add_chapter/{id}", post(chapter::create_chapter))
        .route("/chapter/{id}", get(chapter::get_chapter))
        .route("/edit_chapter/{id}", post(chapter::update_chapter))
        .route(
            "/delete_chapter/{id}",
            post(chapter::delete_chapter).delete(chapter::delete_chapter),
        )
        .route("/show_quizzes/{id}", get(chapter::list_quizzes))
        .route("/add_quiz/{id}", post(quiz::create_quiz))
        .route("/quiz/{id}", get(quiz::get_quiz))
        .route("/edit_quiz/{id}", post(quiz::update_quiz))
        .route(
            "/delete_quiz/{id}",
            post(quiz::delete_quiz).delete(quiz::delete_quiz),
        )
        .route("/quiz/{id}/add_question", post(question::create_question))
        .route("/quiz/{id}/questions", get(question::list_questions))
        .route("/question/{id}", get(question::get_question))
        .route("/edit_question/{id}", post(question::update_question))
        .route(
            "/delete_question/{id}",
            post(question::delete_question).delete(question::delete_question),
        )
        // Reports
        .route("/admin", get(admin::dashboard))
        .route("/admin/search", get(admin::search))
        .route("/admin/user/{id}", get(admin::show_user))
        .route("/admin/user/{id}/chart.svg", get(admin::user_chart))
        .route("/admin/subject/{id}", get(admin::show_subject))
        .route("/admin/subject/{id}/chart.svg", get(admin::subject_chart))
        .route("/admin/quiz/{id}", get(admin::show_quiz))
        .route("/admin/quiz/{id}/chart.svg", get(admin::quiz_chart))
        .route("/admin/summary", get(admin::summary))
        .route("/admin/summary/top_scores.svg", get(admin::top_scores_chart))
        .route("/admin/summary/average_scores.svg", get(admin::average_scores_chart))
        .route("/admin/summary/users_attempted.svg", get(admin::users_attempted_chart))
        // Auth first, then the admin check
        .route_layer(middleware::from_fn(admin_middleware))
        .route_layer(middleware::from_fn_with_state(
            state.sessions.clone(),
            auth_middleware,
        ));

    let user_routes = user_routes.route_layer(middleware::from_fn_with_state(
        state.sessions.clone(),
        auth_middleware,
    ));

    Router::new()
        .merge(public_routes)
        .merge(user_routes)
        .merge(admin_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

// src/handlers/mod.rs

use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};

pub mod admin;
pub mod attempt;
pub mod auth;
pub mod chapter;
pub mod dashboard;
pub mod question;
pub mod quiz;
pub mod subject;

/// Serves a rendered chart, or 204 when there was nothing to draw.
pub(crate) fn svg_response(svg: Option<String>) -> Response {
    match svg {
        Some(svg) => ([(header::CONTENT_TYPE, "image/svg+xml")], svg).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

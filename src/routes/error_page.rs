use askama_axum::Template;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

#[derive(Template)]
#[template(path = "error.html")]
struct ErrorPage<'a> {
    message: &'a str,
}

pub fn error_response(status: StatusCode, message: &str) -> Response {
    (status, ErrorPage { message }).into_response()
}

pub async fn error_page() -> Response {
    error_response(StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong")
}

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> axum::response::Response {
        Json(self).into_response()
    }
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    /// A page that carries data but reports a rejected submission,
    /// e.g. a form re-rendered with its validation errors.
    pub fn rejected(data: T, message: String) -> Self {
        Self {
            success: false,
            data: Some(data),
            message: Some(message),
        }
    }
}

/// `302 Found` to `location`, the redirect every form view answers with.
pub fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaginatedResponse<T: Serialize> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
    pub total_pages: u64,
}

impl<T: Serialize> PaginatedResponse<T> {
    pub fn new(items: Vec<T>, total: u64, page: u64, per_page: u64) -> Self {
        Self {
            items,
            total,
            page,
            per_page,
            total_pages: total_pages(total, per_page),
        }
    }
}

/// Number of pages for `total` items; an empty listing still has one page.
pub fn total_pages(total: u64, per_page: u64) -> u64 {
    if per_page == 0 {
        return 1;
    }
    total.div_ceil(per_page).max(1)
}

/// `?page=` as typed by a visitor. Anything unparsable means the first page.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct PageQuery {
    pub page: Option<String>,
}

impl PageQuery {
    /// Resolve the requested page against the listing size.
    ///
    /// Missing or non-numeric values give page 1; numbers outside
    /// `1..=last` give the last page.
    pub fn resolve(&self, total: u64, per_page: u64) -> u64 {
        let last = total_pages(total, per_page);
        match self.page.as_deref().map(str::trim).map(str::parse::<i64>) {
            None | Some(Err(_)) => 1,
            Some(Ok(n)) if n >= 1 && (n as u64) <= last => n as u64,
            Some(Ok(_)) => last,
        }
    }

    /// The page asked for, when it is known without counting the listing.
    /// `None` for numbers below 1, which resolve to the last page.
    pub fn requested_page(&self) -> Option<u64> {
        match self.page.as_deref().map(str::trim).map(str::parse::<i64>) {
            None | Some(Err(_)) => Some(1),
            Some(Ok(n)) if n >= 1 => Some(n as u64),
            Some(Ok(_)) => None,
        }
    }
}

use crate::error::{AppError, AppResult};
use crate::forms::{
    auth::{safe_next, LoginForm, LoginValues, SignupForm, SignupValues},
    FormErrors,
};
use crate::middleware::AuthUser;
use crate::response::{found, ApiResponse};
use crate::services::auth::AuthService;
use crate::utils::{
    cookie::{build_clear_cookie, build_session_cookie},
    jwt::session_expiry_seconds,
};
use anyhow::anyhow;
use axum::{
    extract::Query,
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    Extension, Form,
};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

const BAD_CREDENTIALS: &str =
    "Please enter a correct username and password. Note that both fields may be case-sensitive.";

#[derive(Debug, Serialize, ToSchema)]
pub struct SignupPage {
    pub form: SignupValues,
    pub errors: FormErrors,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginPage {
    pub form: LoginValues,
    pub errors: FormErrors,
}

#[derive(Debug, Default, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

#[utoipa::path(
    get,
    path = "/auth/signup/",
    responses((status = 200, description = "Empty signup form", body = SignupPage)),
    tag = "auth"
)]
pub async fn signup_form() -> impl IntoResponse {
    ApiResponse::ok(SignupPage {
        form: SignupValues::default(),
        errors: FormErrors::default(),
    })
}

#[utoipa::path(
    post,
    path = "/auth/signup/",
    request_body(content = SignupForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 302, description = "Registered and logged in, redirect to the index"),
        (status = 200, description = "Form re-rendered with errors", body = SignupPage),
    ),
    tag = "auth"
)]
pub async fn signup(
    Extension(db): Extension<DatabaseConnection>,
    Form(form): Form<SignupForm>,
) -> AppResult<Response> {
    let signup = match form.clean() {
        Ok(signup) => signup,
        Err((values, errors)) => return Ok(rejected_signup(values, errors)),
    };

    match AuthService::new(db).register(&signup).await {
        Ok((user, token)) => {
            tracing::info!("User '{}' signed up", user.username);
            let mut response = found("/");
            set_session_cookie(&mut response, &token)?;
            Ok(response)
        }
        Err(AppError::Conflict(message)) => {
            let mut errors = FormErrors::default();
            errors.add("username", message);
            let values = SignupValues {
                username: signup.username,
                email: signup.email,
            };
            Ok(rejected_signup(values, errors))
        }
        Err(e) => Err(e),
    }
}

#[utoipa::path(
    get,
    path = "/auth/login/",
    params(("next" = Option<String>, Query, description = "Where to go after login")),
    responses((status = 200, description = "Empty login form", body = LoginPage)),
    tag = "auth"
)]
pub async fn login_form(Query(query): Query<NextQuery>) -> impl IntoResponse {
    ApiResponse::ok(LoginPage {
        form: LoginValues {
            username: String::new(),
            next: query.next,
        },
        errors: FormErrors::default(),
    })
}

#[utoipa::path(
    post,
    path = "/auth/login/",
    request_body(content = LoginForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 302, description = "Logged in, redirect to `next` or the index"),
        (status = 200, description = "Form re-rendered with errors", body = LoginPage),
    ),
    tag = "auth"
)]
pub async fn login(
    Extension(db): Extension<DatabaseConnection>,
    Form(form): Form<LoginForm>,
) -> AppResult<Response> {
    let errors = form.missing_fields();
    if !errors.is_empty() {
        return Ok(rejected_login(form.values(), errors));
    }

    match AuthService::new(db)
        .login(form.username.trim(), &form.password)
        .await
    {
        Ok((user, token)) => {
            tracing::info!("User '{}' logged in", user.username);
            let target = safe_next(form.next.as_deref()).unwrap_or("/");
            let mut response = found(target);
            set_session_cookie(&mut response, &token)?;
            Ok(response)
        }
        Err(AppError::Unauthorized) => {
            let mut errors = FormErrors::default();
            errors.add(FormErrors::NON_FIELD, BAD_CREDENTIALS);
            Ok(rejected_login(form.values(), errors))
        }
        Err(e) => Err(e),
    }
}

#[utoipa::path(
    post,
    path = "/auth/logout/",
    security(("jwt_token" = [])),
    responses((status = 302, description = "Session cleared, redirect to the index")),
    tag = "auth"
)]
pub async fn logout(auth_user: AuthUser) -> AppResult<Response> {
    tracing::info!("User '{}' logged out", auth_user.username);
    let mut response = found("/");
    append_set_cookie(&mut response, &build_clear_cookie())?;
    Ok(response)
}

fn rejected_signup(form: SignupValues, errors: FormErrors) -> Response {
    let summary = errors.summary();
    ApiResponse::rejected(SignupPage { form, errors }, summary).into_response()
}

fn rejected_login(form: LoginValues, errors: FormErrors) -> Response {
    let summary = errors.summary();
    ApiResponse::rejected(LoginPage { form, errors }, summary).into_response()
}

fn set_session_cookie(response: &mut Response, token: &str) -> AppResult<()> {
    append_set_cookie(
        response,
        &build_session_cookie(token, session_expiry_seconds()),
    )
}

fn append_set_cookie(response: &mut Response, cookie_value: &str) -> AppResult<()> {
    let value = HeaderValue::from_str(cookie_value).map_err(|e| {
        AppError::Internal(anyhow!("Failed to build Set-Cookie header value: {}", e))
    })?;
    response.headers_mut().append(header::SET_COOKIE, value);
    Ok(())
}

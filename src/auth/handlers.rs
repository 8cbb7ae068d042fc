use actix_web::cookie::{time::Duration as CookieDuration, Cookie, SameSite};
use actix_web::http::{header, StatusCode};
use actix_web::{web, HttpRequest, HttpResponse, Responder};

use super::identity::AuthError;
use super::jwt::{generate_session_token, get_session_token_expiry};
use super::middleware::{validate_request_token, SESSION_COOKIE};
use super::model::{LoginForm, LoginRequest, TokenResponse};
use crate::panel::html::{login_form, page};
use crate::state::AppState;

fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, token)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(CookieDuration::seconds(get_session_token_expiry()))
        .finish()
}

fn login_page_response(status: StatusCode, error: Option<&str>, email: &str) -> HttpResponse {
    HttpResponse::build(status)
        .content_type("text/html; charset=utf-8")
        .body(page("Sign in", None, &login_form(error, email), None))
}

/// GET /login
pub async fn login_page(req: HttpRequest) -> HttpResponse {
    if validate_request_token(&req).is_ok() {
        return HttpResponse::SeeOther()
            .insert_header((header::LOCATION, "/reports"))
            .finish();
    }
    login_page_response(StatusCode::OK, None, "")
}

/// POST /login
pub async fn login(state: web::Data<AppState>, form: web::Form<LoginForm>) -> HttpResponse {
    let identity = match state.identity.sign_in(&form.email, &form.password).await {
        Ok(identity) => identity,
        Err(AuthError::InvalidCredentials) => {
            return login_page_response(
                StatusCode::UNAUTHORIZED,
                Some("Invalid email or password"),
                &form.email,
            );
        }
        Err(e) => {
            log::error!("Sign-in of {} failed: {}", form.email, e);
            return login_page_response(
                StatusCode::BAD_GATEWAY,
                Some("Sign-in is unavailable right now, please try again"),
                &form.email,
            );
        }
    };

    match generate_session_token(&identity) {
        Ok(token) => {
            log::info!("Administrator {} signed in", identity.email);
            HttpResponse::SeeOther()
                .cookie(session_cookie(token))
                .insert_header((header::LOCATION, "/reports"))
                .finish()
        }
        Err(e) => {
            log::error!("Failed to generate session token: {:?}", e);
            login_page_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                Some("Failed to start a session"),
                &form.email,
            )
        }
    }
}

/// POST /logout
pub async fn logout() -> HttpResponse {
    let mut removal = Cookie::build(SESSION_COOKIE, "").path("/").finish();
    removal.make_removal();

    HttpResponse::SeeOther()
        .cookie(removal)
        .insert_header((header::LOCATION, "/login"))
        .finish()
}

/// Login endpoint
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Authentication",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = TokenResponse),
        (status = 401, description = "Invalid credentials", body = crate::ErrorResponse),
        (status = 502, description = "Identity service unavailable", body = crate::ErrorResponse)
    )
)]
pub async fn api_login(state: web::Data<AppState>, body: web::Json<LoginRequest>) -> impl Responder {
    let identity = match state.identity.sign_in(&body.email, &body.password).await {
        Ok(identity) => identity,
        Err(AuthError::InvalidCredentials) => {
            return HttpResponse::Unauthorized().json(crate::ErrorResponse::new(
                "Unauthorized",
                "Invalid email or password",
            ));
        }
        Err(e) => {
            log::error!("Sign-in of {} failed: {}", body.email, e);
            return HttpResponse::BadGateway().json(crate::ErrorResponse::new(
                "BadGateway",
                &e.to_string(),
            ));
        }
    };

    let access_token = match generate_session_token(&identity) {
        Ok(t) => t,
        Err(e) => {
            log::error!("Failed to generate session token: {:?}", e);
            return HttpResponse::InternalServerError().json(crate::ErrorResponse::internal_error(
                "Failed to generate token",
            ));
        }
    };

    HttpResponse::Ok().json(TokenResponse {
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: get_session_token_expiry(),
    })
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/login")
            .route(web::get().to(login_page))
            .route(web::post().to(login)),
    )
    .route("/logout", web::post().to(logout));
}

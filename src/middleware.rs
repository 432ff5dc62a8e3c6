use actix_cors::Cors;
use actix_web::http::header::{self, HeaderName};
use actix_web::middleware::Next;
use actix_web::{
    Error, ResponseError,
    body::{BoxBody, MessageBody},
    dev::{ServiceRequest, ServiceResponse},
    web::Data,
};
use tracing::warn;

use crate::config::Config;
use crate::error::ApiError;

const CORS_MAX_AGE_SECS: usize = 86400;

fn app_config(req: &ServiceRequest) -> Result<Data<Config>, Error> {
    req.app_data::<Data<Config>>()
        .cloned()
        .ok_or_else(|| actix_web::error::ErrorInternalServerError("App config missing"))
}

/// Rejects requests whose `Host` header is not in `ALLOWED_HOSTS`.
pub async fn allowed_hosts_middleware<B: MessageBody + 'static>(
    req: ServiceRequest,
    next: Next<B>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let config = app_config(&req)?;
    let host = req.connection_info().host().to_string();

    if !config.host_allowed(&host) {
        warn!(host = %host, "Rejected request for disallowed host");
        let resp = ApiError::BadRequest(format!("Invalid HTTP_HOST header: '{host}'."))
            .error_response();
        return Ok(req.into_response(resp));
    }

    next.call(req).await.map(ServiceResponse::map_into_boxed_body)
}

/// CORS policy for `CORS_ALLOWED_ORIGINS`. Requests from other origins still
/// reach the handlers but get no CORS headers, leaving the browser to block
/// them; preflights for them or for unexposed methods are refused.
pub fn cors(config: &Config) -> Cors {
    let config = config.clone();
    Cors::default()
        .allowed_origin_fn(move |origin, _| {
            origin.to_str().is_ok_and(|origin| config.origin_allowed(origin))
        })
        .allowed_methods(["GET", "POST", "DELETE"])
        .allowed_headers([
            header::ACCEPT,
            header::CONTENT_TYPE,
            HeaderName::from_static("x-requested-with"),
        ])
        .max_age(CORS_MAX_AGE_SECS)
        .block_on_origin_mismatch(false)
}

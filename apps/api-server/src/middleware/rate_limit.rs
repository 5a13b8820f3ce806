//! Per-client request throttling for the auth endpoints.

use actix_web::{
    Error, HttpResponse,
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    http::header::{self, HeaderName, HeaderValue},
    web,
};
use quill_shared::ErrorResponse;
use std::future::{Future, Ready, ready};
use std::pin::Pin;

use crate::state::AppState;

const REMAINING_HEADER: &str = "x-ratelimit-remaining";

/// Rate limiting middleware factory.
///
/// Uses the limiter in [`AppState`]; requests pass straight through when
/// none is configured.
pub struct RateLimitMiddleware;

impl<S, B> Transform<S, ServiceRequest> for RateLimitMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = RateLimitMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitMiddlewareService { service }))
    }
}

pub struct RateLimitMiddlewareService<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for RateLimitMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let Some(limiter) = req
            .app_data::<web::Data<AppState>>()
            .and_then(|state| state.rate_limiter.clone())
        else {
            let fut = self.service.call(req);
            return Box::pin(async move { Ok(fut.await?.map_into_left_body()) });
        };

        let client = req
            .connection_info()
            .realip_remote_addr()
            .unwrap_or("unknown")
            .to_string();

        let remaining = match limiter.check(&client) {
            Ok(result) if !result.allowed => {
                tracing::warn!(client = %client, "Rate limit exceeded");

                let retry_after = result.reset_after.as_secs().max(1);
                let response = HttpResponse::TooManyRequests()
                    .insert_header((REMAINING_HEADER, "0"))
                    .insert_header((header::RETRY_AFTER, retry_after.to_string()))
                    .json(ErrorResponse::too_many_requests(format!(
                        "Too many requests. Try again in {retry_after} seconds."
                    )));

                let (http_req, _) = req.into_parts();
                let res = ServiceResponse::new(http_req, response);
                return Box::pin(async move { Ok(res.map_into_right_body()) });
            }
            Ok(result) => Some(result.remaining),
            Err(e) => {
                tracing::error!("Rate limiter error, letting request through: {}", e);
                None
            }
        };

        let fut = self.service.call(req);
        Box::pin(async move {
            let mut res = fut.await?;
            if let Some(remaining) = remaining {
                res.headers_mut()
                    .insert(HeaderName::from_static(REMAINING_HEADER), HeaderValue::from(remaining));
            }
            Ok(res.map_into_left_body())
        })
    }
}

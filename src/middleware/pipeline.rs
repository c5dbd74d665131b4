//! Security pipeline applied to every inbound request.
//!
//! Stage order:
//!   policy → rate limit → body validation → authenticate → authorize
//!   → principal headers → auth context
//!
//! Each stage owns the `Exchange` for its turn; the first `AppError` ends the
//! chain and becomes the response. CORS, request-id, tracing, body limit and
//! timeout are tower layers outside of this one (see `app.rs`).

use axum::{
    Router,
    body::Body,
    extract::State,
    http::Request,
    middleware::{self, Next},
    response::{IntoResponse, Response},
};

use crate::error::AppError;
use crate::middleware::{
    auth::access, auth_context, auth_request, exchange::Exchange, policy, principal_headers,
    rate_limit,
};
use crate::state::AppState;

pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    // axum 0.8: State needs `from_fn_with_state`
    router.layer(middleware::from_fn_with_state(state, pipeline_middleware))
}

async fn pipeline_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    match run_stages(&state, Exchange::new(req)).await {
        Ok(exchange) => next.run(exchange.into_request()).await,
        Err(err) => err.into_response(),
    }
}

pub async fn run_stages(state: &AppState, exchange: Exchange) -> Result<Exchange, AppError> {
    let exchange = policy::enforce(state, exchange).await?;
    let exchange = rate_limit::enforce(state, exchange).await?;
    let exchange = auth_request::validate(state, exchange).await?;

    let exchange = if state.auth_enabled {
        let exchange = access::authenticate(state, exchange).await?;
        access::authorize(exchange).await?
    } else {
        exchange
    };

    let exchange = principal_headers::inject(exchange).await;
    Ok(auth_context::attach(state, exchange).await)
}

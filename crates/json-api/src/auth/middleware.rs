//! Auth middleware.
//!
//! Requests without an `Authorization` header proceed as anonymous callers;
//! bookings without a registered guest stay reachable that way. A bearer
//! token that fails to resolve is rejected outright.

use std::sync::Arc;

use salvo::{http::header::AUTHORIZATION, prelude::*};
use tracing::error;

use stayrate_app::auth::{Identity, IdentityError};

use crate::{extensions::*, state::State};

#[salvo::handler]
pub(crate) async fn handler(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
    ctrl: &mut FlowCtrl,
) {
    let identity = match extract_bearer_token(req) {
        None => Identity::anonymous(),
        Some(token) => {
            let state = match depot.obtain::<Arc<State>>() {
                Ok(state) => state,
                Err(_error) => {
                    res.render(StatusError::internal_server_error());

                    return;
                }
            };

            match state.app.identity.resolve(token).await {
                Ok(identity) => identity,
                Err(IdentityError::NotFound) => {
                    res.render(StatusError::unauthorized().brief("Invalid session token"));

                    return;
                }
                Err(IdentityError::Sql(source)) => {
                    error!("failed to resolve session token: {source}");

                    res.render(StatusError::internal_server_error());

                    return;
                }
            }
        }
    };

    depot.insert_identity(identity);

    ctrl.call_next(req, depot, res).await;
}

fn extract_bearer_token(req: &Request) -> Option<&str> {
    let value = req.headers().get(AUTHORIZATION)?.to_str().ok()?;
    let mut parts = value.splitn(2, ' ');

    let scheme = parts.next()?;
    let token = parts.next()?.trim();

    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return None;
    }

    Some(token)
}

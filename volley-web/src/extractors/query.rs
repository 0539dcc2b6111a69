use axum::{extract::FromRequestParts, http::request::Parts};
use volley_core::QueryParams;

use crate::errors::WebError;

/// Query parameter selecting one run on the status and stop endpoints
pub const RUN_ID_PARAM: &str = "runid";

fn query_params(parts: &Parts) -> QueryParams {
    let raw = parts.uri.query().unwrap_or_default();
    QueryParams::from_pairs(url::form_urlencoded::parse(raw.as_bytes()).into_owned())
}

/// Every query parameter of a run request, repeated names kept in order
#[derive(Debug, Clone)]
pub struct RunQuery(pub QueryParams);

impl<S> FromRequestParts<S> for RunQuery
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(RunQuery(query_params(parts)))
    }
}

/// Optional `runid` parameter; absent, empty and `0` all select every run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunIdQuery(pub Option<u64>);

impl RunIdQuery {
    fn parse(raw: Option<&str>) -> Result<Self, WebError> {
        match raw.map(str::trim) {
            None | Some("") => Ok(RunIdQuery(None)),
            Some(value) => value
                .parse::<u64>()
                .map(|id| RunIdQuery(Some(id).filter(|id| *id > 0)))
                .map_err(|e| WebError::bad_request("invalid run id", format!("{:?}: {}", value, e))),
        }
    }
}

impl<S> FromRequestParts<S> for RunIdQuery
where
    S: Send + Sync,
{
    type Rejection = WebError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let query = query_params(parts);
        RunIdQuery::parse(query.first(RUN_ID_PARAM))
    }
}

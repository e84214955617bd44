//! HTTP API: router, bearer middleware, access checks and request/response
//! mapping over the infra services.

pub mod app;
pub mod authz;
pub mod context;
pub mod middleware;

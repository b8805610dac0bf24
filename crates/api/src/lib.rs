//! HTTP API: router, request/response mapping, and error bodies.

pub mod app;

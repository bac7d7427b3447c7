//! HTTP client wrapper with URL macros and interceptor registries
//!
//! Wraps `reqwest` with a small amount of request plumbing. Transport,
//! redirects and timeouts stay with `reqwest`.
//!
//! ## Features
//!
//! - **URL macros**: `${key}` placeholders in request URLs, resolved from a
//!   shared environment, an instance environment, request params and body
//! - **Interceptors**: ordered request and response hooks, registered once on
//!   an [`HttpContext`] and captured by every client built from it
//! - **Business codes**: payloads with a non-zero `code` field surface as
//!   [`HttpError::Business`]
//! - **Trait-based design**: Mockable via [`HttpApi`]
//!
//! ```ignore
//! use macrohttp::{hooks, HttpApi, HttpClient, HttpConfig, HttpContext, RequestOptions};
//!
//! let context = HttpContext::new();
//! context.set_environment([("version", "v2")]);
//! context.register_request_hook(Some(hooks::request_fn(|req| Ok(req.header("X-App", "demo")))));
//!
//! let client = HttpClient::new(HttpConfig::new().with_base_url("https://api.example.com"), &context)?;
//! let user = client
//!     .get("${version}/users${id}", RequestOptions::new().param("id", 42))
//!     .await?
//!     .settle()?;
//! ```

pub mod business;
pub mod client;
pub mod config;
pub mod context;
pub mod env;
pub mod error;
pub mod hooks;
pub mod request;
pub mod response;
pub mod rewrite;
pub mod template;

pub use client::{shared_client, HttpApi, HttpClient};
pub use config::HttpConfig;
pub use context::HttpContext;
pub use env::{EnvValue, Environment};
pub use error::{HttpError, Result};
pub use hooks::{HookRegistry, RequestHook, ResponseHook};
pub use request::{FormPart, MultipartForm, RequestBody, RequestConfig, RequestOptions};
pub use response::ApiResponse;
pub use rewrite::UrlTemplateHook;

/// Re-export commonly used types
pub use reqwest::{header, Method, StatusCode};

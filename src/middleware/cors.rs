//! Cross-origin access control.
//!
//! [`OriginPolicy::evaluate`] is a pure function of the configured policy and
//! the request's `Origin` header. Its [`OriginDecision`] is applied to the
//! outgoing header map together with the headers every response carries:
//!
//! | Origin | Allow-list | Credentials | Allow-Origin | Credentials header | Vary |
//! |---|---|---|---|---|---|
//! | present | unset | on | echoed | `true` | `Origin` |
//! | present | unset | off | `*` | - | - |
//! | listed | set | on | echoed | `true` | `Origin` |
//! | listed | set | off | echoed | - | `Origin` |
//! | unlisted | set | any | - | - | - |
//! | absent | unset | off | `*` | - | - |
//! | absent | unset | on | - | - | - |
//! | absent | set | any | - | - | - |
//!
//! A set list with no entries (`ALLOWED_ORIGINS=","`) lists nothing, so every
//! origin falls in the "unlisted" row.
//!
//! A rejected origin simply gets no `Access-Control-Allow-Origin`; the
//! browser does the blocking.

use http::HeaderMap;
use http::header::{
    ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_HEADERS,
    ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_EXPOSE_HEADERS,
    ACCESS_CONTROL_REQUEST_HEADERS, HeaderValue, ORIGIN, VARY,
};

use crate::config::Config;

pub const ALLOW_METHODS: &str = "GET, POST, PUT, PATCH, DELETE, OPTIONS";
pub const EXPOSE_HEADERS: &str = "X-Served-By, X-Timestamp, Content-Length";
pub const DEFAULT_ALLOW_HEADERS: &str =
    "Content-Type, Authorization, X-Requested-With, X-Api-Key, Accept";

/// Static CORS configuration: the allow-list and the credentials flag.
#[derive(Clone, Debug, Default)]
pub struct OriginPolicy {
    /// `None` allows every origin; `Some` is matched entry by entry.
    allowed: Option<Vec<String>>,
    allow_credentials: bool,
}

/// Value echoed in `Access-Control-Allow-Origin`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AllowOrigin {
    Any,
    /// The request's `Origin`, byte for byte.
    Exact(HeaderValue),
}

/// Per-request outcome of [`OriginPolicy::evaluate`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OriginDecision {
    pub allow_origin: Option<AllowOrigin>,
    pub allow_credentials: bool,
    pub vary_origin: bool,
}

impl OriginPolicy {
    /// `allowed: None` allows every origin. `Some(vec![])` allows none.
    pub fn new(allowed: Option<Vec<String>>, allow_credentials: bool) -> Self {
        Self { allowed, allow_credentials }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.allowed_origins.clone(), config.allow_credentials)
    }

    pub fn allows_all(&self) -> bool {
        self.allowed.is_none()
    }

    fn is_listed(&self, origin: &HeaderValue) -> bool {
        self.allowed
            .iter()
            .flatten()
            .any(|entry| entry.as_bytes() == origin.as_bytes())
    }

    /// Decides the `Allow-Origin` family of headers for a request whose
    /// `Origin` header is `origin`. Values are compared as raw bytes, so an
    /// origin that is not valid UTF-8 is still echoed when allowed.
    pub fn evaluate(&self, origin: Option<&HeaderValue>) -> OriginDecision {
        let origin = origin.filter(|o| !o.is_empty());

        match (origin, self.allows_all(), self.allow_credentials) {
            (Some(origin), true, true) => OriginDecision::echo(origin, true),
            (Some(_), true, false) | (None, true, false) => OriginDecision::any(),
            (Some(origin), false, credentials) if self.is_listed(origin) => {
                OriginDecision::echo(origin, credentials)
            }
            _ => OriginDecision::default(),
        }
    }

    /// Evaluates the request headers and writes every CORS response header
    /// into `out`.
    pub fn apply(&self, request: &HeaderMap, out: &mut HeaderMap) -> OriginDecision {
        let decision = self.evaluate(request.get(ORIGIN));
        decision.write_headers(out);

        out.insert(ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static(ALLOW_METHODS));
        out.insert(ACCESS_CONTROL_EXPOSE_HEADERS, HeaderValue::from_static(EXPOSE_HEADERS));
        let allow_headers = request
            .get(ACCESS_CONTROL_REQUEST_HEADERS)
            .filter(|v| !v.is_empty())
            .cloned()
            .unwrap_or_else(|| HeaderValue::from_static(DEFAULT_ALLOW_HEADERS));
        out.insert(ACCESS_CONTROL_ALLOW_HEADERS, allow_headers);

        decision
    }
}

impl OriginDecision {
    fn any() -> Self {
        Self { allow_origin: Some(AllowOrigin::Any), ..Self::default() }
    }

    fn echo(origin: &HeaderValue, allow_credentials: bool) -> Self {
        Self {
            allow_origin: Some(AllowOrigin::Exact(origin.clone())),
            allow_credentials,
            vary_origin: true,
        }
    }

    pub fn is_allowed(&self) -> bool {
        self.allow_origin.is_some()
    }

    pub fn write_headers(&self, out: &mut HeaderMap) {
        let value = match &self.allow_origin {
            Some(AllowOrigin::Any) => HeaderValue::from_static("*"),
            Some(AllowOrigin::Exact(origin)) => origin.clone(),
            None => return,
        };
        out.insert(ACCESS_CONTROL_ALLOW_ORIGIN, value);

        if self.allow_credentials {
            out.insert(ACCESS_CONTROL_ALLOW_CREDENTIALS, HeaderValue::from_static("true"));
        }
        if self.vary_origin {
            out.append(VARY, HeaderValue::from_static("Origin"));
        }
    }
}

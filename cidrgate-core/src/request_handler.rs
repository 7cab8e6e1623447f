//! HTTP request handling.
//!
//! Binds the decision engine to two routes:
//!
//! - `/` derives the client's network from `X-Forwarded-For` and admits or
//!   rejects the request (200 / 429). Requests without the header are not
//!   attributable to a network and are always answered with 200.
//! - `/reset?ip=<address>` forgets the network containing `<address>`.
//!
//! Every other path answers 404. Routing is by path only; the method is not
//! inspected.

use http_body_util::Full;
use hyper::{Request, Response, StatusCode};
use std::convert::Infallible;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::clock::Clock;
use crate::error::CidrGateError;
use crate::headers;
use crate::history::RequestHistory;
use crate::network::NetworkKey;
use crate::rate_limiter;
use crate::types::ConfigProvider;

/// Body of every successful response.
pub const OK_BODY: &str = "OK!\n";
/// Body of a rate limited response.
pub const TOO_MANY_REQUESTS_BODY: &str = "Too Many Requests\n";
/// Body of a `/reset` request without `ip`.
pub const BAD_REQUEST_BODY: &str = "Bad Request\n";
/// Body of an unknown path.
pub const NOT_FOUND_BODY: &str = "Status Not Found\n";

/// Handles an incoming HTTP request.
///
/// Generic over the request body, which is never read.
///
/// # Arguments
///
/// * `req` - The incoming HTTP request
/// * `history` - The shared request history
/// * `config` - Configuration provider for prefix and rate limits
/// * `clock` - Source of the decision instant
///
/// # Returns
///
/// Always returns `Ok` with one of 200, 400, 404, 429 or 500.
pub async fn handle_request<B, C: ConfigProvider>(
    req: Request<B>,
    history: RequestHistory,
    config: Arc<C>,
    clock: Arc<dyn Clock>,
) -> Result<Response<Full<bytes::Bytes>>, Infallible> {
    let response = match req.uri().path() {
        "/" => handle_root(&req, &history, config.as_ref(), clock.as_ref()),
        "/reset" => handle_reset(&req, &history, config.as_ref()),
        path => {
            debug!(path = %path, "Unknown path");
            text_response(StatusCode::NOT_FOUND, NOT_FOUND_BODY)
        }
    };

    Ok(response)
}

/// `/`: rate limit by the network of the forwarded client address.
fn handle_root<B>(
    req: &Request<B>,
    history: &RequestHistory,
    config: &impl ConfigProvider,
    clock: &dyn Clock,
) -> Response<Full<bytes::Bytes>> {
    let Some(xff) = req.headers().get(headers::X_FORWARDED_FOR) else {
        return text_response(StatusCode::OK, OK_BODY);
    };
    if xff.is_empty() {
        return text_response(StatusCode::OK, OK_BODY);
    }

    let now = clock.now();
    let derived = match xff.to_str() {
        Ok(value) => NetworkKey::derive(
            headers::client_address_from_xff(value),
            config.network_prefix(),
        ),
        Err(_) => Err(CidrGateError::MalformedAddress(
            String::from_utf8_lossy(xff.as_bytes()).into_owned(),
        )),
    };

    let key = match derived {
        Ok(key) => key,
        Err(err) => return error_response(&err),
    };

    if rate_limiter::admit(history, &key, now, config) {
        text_response(StatusCode::OK, OK_BODY)
    } else {
        text_response(StatusCode::TOO_MANY_REQUESTS, TOO_MANY_REQUESTS_BODY)
    }
}

/// `/reset?ip=<address>`: forget the network containing `<address>`.
fn handle_reset<B>(
    req: &Request<B>,
    history: &RequestHistory,
    config: &impl ConfigProvider,
) -> Response<Full<bytes::Bytes>> {
    let Some(ip) = query_param(req.uri().query(), headers::RESET_IP_PARAM) else {
        return text_response(StatusCode::BAD_REQUEST, BAD_REQUEST_BODY);
    };

    match NetworkKey::derive(&ip, config.network_prefix()) {
        Ok(key) => {
            let existed = history.forget(&key);
            info!(network = %key, existed, "Network reset");
            text_response(StatusCode::OK, OK_BODY)
        }
        Err(err) => error_response(&err),
    }
}

/// Logs `err` and turns it into its client-facing response.
fn error_response(err: &CidrGateError) -> Response<Full<bytes::Bytes>> {
    if err.is_server_error() {
        error!(error = %err, "Cannot derive network key");
    } else {
        warn!(error = %err, "Cannot derive network key");
    }
    text_response(err.status_code(), err.user_message())
}

/// Creates a `text/plain` response.
///
/// Falls back to a bare response if building fails (should never happen
/// with a valid StatusCode).
///
/// # Example
///
/// ```
/// use cidrgate_core::request_handler::text_response;
/// use hyper::StatusCode;
///
/// let response = text_response(StatusCode::TOO_MANY_REQUESTS, "Too Many Requests\n");
/// assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
/// ```
pub fn text_response(status: StatusCode, body: &str) -> Response<Full<bytes::Bytes>> {
    Response::builder()
        .status(status)
        .header(headers::CONTENT_TYPE, headers::TEXT_PLAIN)
        .body(Full::new(bytes::Bytes::from(body.to_string())))
        .unwrap_or_else(|_| Response::new(Full::new(bytes::Bytes::from(body.to_string()))))
}

/// Returns the decoded value of the first `name` parameter in `query`.
///
/// A parameter without `=` (`?ip`) is present with an empty value.
fn query_param(query: Option<&str>, name: &str) -> Option<String> {
    query?.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        (url_decode(key) == name).then(|| url_decode(value))
    })
}

/// Decodes a form-urlencoded component (`%XX` escapes and `+` as space).
///
/// Invalid escapes are kept verbatim; invalid UTF-8 is replaced.
fn url_decode(input: &str) -> String {
    let mut bytes = Vec::with_capacity(input.len());
    let mut chars = input.chars();

    while let Some(c) = chars.next() {
        match c {
            '%' => {
                let hex: String = chars.by_ref().take(2).collect();
                if hex.len() == 2
                    && let Ok(byte) = u8::from_str_radix(&hex, 16)
                {
                    bytes.push(byte);
                    continue;
                }
                bytes.push(b'%');
                bytes.extend_from_slice(hex.as_bytes());
            }
            '+' => bytes.push(b' '),
            _ => {
                let mut buf = [0u8; 4];
                bytes.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            }
        }
    }

    String::from_utf8_lossy(&bytes).into_owned()
}

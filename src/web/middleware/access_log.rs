//! HTTP access log in combined log format.

use axum::{
    body::Body,
    http::{header, HeaderMap, Request, Version},
    middleware::Next,
    response::Response,
};
use chrono::{DateTime, Local};

use super::rate_limit::client_ip;
use crate::logging::ACCESS_TARGET;

/// One combined-format line per request, emitted under [`ACCESS_TARGET`].
pub async fn access_log(req: Request<Body>, next: Next) -> Response {
    let ip = client_ip(req.headers(), req.extensions());
    let method = req.method().clone();
    let path = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());
    let version = req.version();
    let referer = header_or_dash(req.headers(), header::REFERER);
    let user_agent = header_or_dash(req.headers(), header::USER_AGENT);
    let started = Local::now();

    let response = next.run(req).await;

    let bytes = header_or_dash(response.headers(), header::CONTENT_LENGTH);
    let line = combined_line(
        &ip,
        &started,
        &format!("{} {} {}", method, path, http_version(version)),
        response.status().as_u16(),
        &bytes,
        &referer,
        &user_agent,
    );
    tracing::info!(target: ACCESS_TARGET, "{}", line);

    response
}

fn header_or_dash(headers: &HeaderMap, name: header::HeaderName) -> String {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .unwrap_or("-")
        .to_string()
}

fn http_version(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "HTTP/0.9",
        Version::HTTP_10 => "HTTP/1.0",
        Version::HTTP_2 => "HTTP/2.0",
        Version::HTTP_3 => "HTTP/3.0",
        _ => "HTTP/1.1",
    }
}

fn combined_line(
    ip: &str,
    time: &DateTime<Local>,
    request: &str,
    status: u16,
    bytes: &str,
    referer: &str,
    user_agent: &str,
) -> String {
    format!(
        "{ip} - - [{}] \"{request}\" {status} {bytes} \"{referer}\" \"{user_agent}\"",
        time.format("%d/%b/%Y:%H:%M:%S %z")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_combined_line_format() {
        let time = Local.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap();
        let line = combined_line(
            "203.0.113.7",
            &time,
            "GET /api/posts?page=2 HTTP/1.1",
            200,
            "512",
            "-",
            "curl/8.0",
        );
        assert!(line.starts_with("203.0.113.7 - - [05/Mar/2024:14:07:09 "));
        assert!(line.ends_with("] \"GET /api/posts?page=2 HTTP/1.1\" 200 512 \"-\" \"curl/8.0\""));
    }

    #[test]
    fn test_header_or_dash() {
        let mut headers = HeaderMap::new();
        assert_eq!(header_or_dash(&headers, header::REFERER), "-");
        headers.insert(header::REFERER, "https://blog.example/".parse().unwrap());
        assert_eq!(
            header_or_dash(&headers, header::REFERER),
            "https://blog.example/"
        );
    }

    #[test]
    fn test_http_version() {
        assert_eq!(http_version(Version::HTTP_11), "HTTP/1.1");
        assert_eq!(http_version(Version::HTTP_2), "HTTP/2.0");
    }
}

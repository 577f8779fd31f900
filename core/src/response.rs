//! Classification of raw HTTP responses.
//!
//! `classify` is a pure function of the response triple, the service name
//! and the URL queried. It either yields the decoded JSON body (`None` for
//! 204 No Content) or exactly one `ServiceError`.

use serde_json::Value;

use crate::error::ServiceError;
use crate::http::HttpResponse;

const NO_EXPLANATION: &str = "The server returned an invalid request error with no explanation";

/// Turn a response into a decoded body or a typed error.
pub fn classify(
    response: &HttpResponse,
    service: &str,
    url: &str,
) -> Result<Option<Value>, ServiceError> {
    let status = response.status;
    let body = response.body.as_deref().unwrap_or("");

    match status {
        200 => decode_success(body, service, url).map(Some),
        204 => {
            if body.is_empty() {
                Ok(None)
            } else {
                Err(ServiceError::WebService {
                    message: format!(
                        "Received a 204 response for {service} along with an unexpected HTTP body: {body}"
                    ),
                    status,
                    url: url.to_string(),
                })
            }
        }
        400..=499 => Err(client_error(status, response.content_type.as_deref(), body, service, url)),
        500..=599 => Err(ServiceError::Http {
            message: format!("Received a server error ({status}) for {service}"),
            status,
            url: url.to_string(),
        }),
        _ => Err(ServiceError::Http {
            message: format!("Received an unexpected HTTP status ({status}) for {service}"),
            status,
            url: url.to_string(),
        }),
    }
}

/// True when the media type, ignoring parameters and case, is
/// `application/json`.
pub fn is_json_content_type(content_type: Option<&str>) -> bool {
    content_type
        .and_then(|ct| ct.split(';').next())
        .map(|media| media.trim().eq_ignore_ascii_case("application/json"))
        .unwrap_or(false)
}

fn decode_success(body: &str, service: &str, url: &str) -> Result<Value, ServiceError> {
    if body.is_empty() {
        return Err(ServiceError::WebService {
            message: format!("Received a 200 response for {service} but did not receive a HTTP body."),
            status: 200,
            url: url.to_string(),
        });
    }
    serde_json::from_str(body).map_err(|e| ServiceError::WebService {
        message: format!(
            "Received a 200 response for {service} but could not decode the response as JSON: {e}. Body: {body}"
        ),
        status: 200,
        url: url.to_string(),
    })
}

fn client_error(
    status: u16,
    content_type: Option<&str>,
    body: &str,
    service: &str,
    url: &str,
) -> ServiceError {
    if body.is_empty() {
        return ServiceError::Http {
            message: format!("Received a {status} error for {service} with no body"),
            status,
            url: url.to_string(),
        };
    }
    if !is_json_content_type(content_type) {
        return ServiceError::Http {
            message: format!("Received a {status} error for {service} with the following body: {body}"),
            status,
            url: url.to_string(),
        };
    }

    let decoded: Value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(e) => {
            return ServiceError::WebService {
                message: format!(
                    "Received a {status} error for {service} but could not decode the response as JSON: {e}. Body: {body}"
                ),
                status,
                url: url.to_string(),
            }
        }
    };

    let code = field(&decoded, "code");
    let error = field(&decoded, "error");
    if code.is_none() && error.is_none() {
        return ServiceError::Http {
            message: format!(
                "Error response contains JSON but it does not specify code or error keys: {body}"
            ),
            status,
            url: url.to_string(),
        };
    }

    let message = error.unwrap_or_else(|| NO_EXPLANATION.to_string());
    service_error(code, message, status, url)
}

/// A present, non-null member of a JSON object, rendered as text.
fn field(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Map a service error code onto its variant.
fn service_error(code: Option<String>, message: String, status: u16, url: &str) -> ServiceError {
    let url = url.to_string();
    let Some(code) = code else {
        return ServiceError::InvalidRequest {
            message,
            code: None,
            status,
            url,
        };
    };

    match code.as_str() {
        "INSUFFICIENT_FUNDS" => ServiceError::InsufficientFunds {
            message,
            code,
            status,
            url,
        },
        "ACCOUNT_ID_REQUIRED"
        | "ACCOUNT_ID_UNKNOWN"
        | "AUTHORIZATION_INVALID"
        | "LICENSE_KEY_REQUIRED"
        | "USER_ID_REQUIRED"
        | "USER_ID_UNKNOWN" => ServiceError::Authentication {
            message,
            code,
            status,
            url,
        },
        "PERMISSION_REQUIRED" => ServiceError::PermissionRequired {
            message,
            code,
            status,
            url,
        },
        "IP_ADDRESS_NOT_FOUND" | "IP_ADDRESS_RESERVED" => ServiceError::IpAddressNotFound {
            message,
            code,
            status,
            url,
        },
        _ => ServiceError::InvalidRequest {
            message,
            code: Some(code),
            status,
            url,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SERVICE: &str = "TestService";
    const URL: &str = "https://api.maxmind.com/path";

    fn run(status: u16, content_type: Option<&str>, body: Option<&str>) -> Result<Option<Value>, ServiceError> {
        classify(&HttpResponse::new(status, content_type, body), SERVICE, URL)
    }

    fn json_error(status: u16, body: &str) -> ServiceError {
        run(status, Some("application/json"), Some(body)).unwrap_err()
    }

    #[test]
    fn ok_with_json_body_decodes() {
        let value = run(200, Some("application/json"), Some(r#"{"a":"b"}"#)).unwrap();
        assert_eq!(value, Some(json!({"a": "b"})));
    }

    #[test]
    fn ok_ignores_content_type() {
        let value = run(200, Some("text/plain"), Some("[1,2]")).unwrap();
        assert_eq!(value, Some(json!([1, 2])));
    }

    #[test]
    fn ok_with_malformed_json_is_web_service_error() {
        let err = run(200, Some("application/json"), Some("{")).unwrap_err();
        assert!(matches!(err, ServiceError::WebService { status: 200, .. }));
        assert!(err.message().starts_with(
            "Received a 200 response for TestService but could not decode the response as JSON: "
        ));
        assert!(err.message().ends_with(". Body: {"));
        assert_eq!(err.url(), Some(URL));
    }

    #[test]
    fn ok_without_body_is_web_service_error() {
        for body in [None, Some("")] {
            let err = run(200, Some("application/json"), body).unwrap_err();
            assert_eq!(
                err.message(),
                "Received a 200 response for TestService but did not receive a HTTP body."
            );
            assert!(matches!(err, ServiceError::WebService { .. }));
        }
    }

    #[test]
    fn no_content_is_none() {
        assert_eq!(run(204, Some("application/json"), Some("")).unwrap(), None);
        assert_eq!(run(204, None, None).unwrap(), None);
    }

    #[test]
    fn no_content_with_body_is_web_service_error() {
        let err = run(204, Some("application/json"), Some("non-empty response body")).unwrap_err();
        assert_eq!(
            err,
            ServiceError::WebService {
                message: "Received a 204 response for TestService along with an unexpected HTTP body: non-empty response body".to_string(),
                status: 204,
                url: URL.to_string(),
            }
        );
    }

    #[test]
    fn other_success_codes_are_unexpected() {
        for status in [201, 202, 206] {
            let err = run(status, Some("application/json"), Some("{}")).unwrap_err();
            assert_eq!(
                err.message(),
                format!("Received an unexpected HTTP status ({status}) for TestService")
            );
        }
    }

    #[test]
    fn redirects_are_unexpected() {
        for status in [300, 301, 302] {
            let err = run(status, Some("application/json"), Some("")).unwrap_err();
            assert_eq!(
                err,
                ServiceError::Http {
                    message: format!("Received an unexpected HTTP status ({status}) for TestService"),
                    status,
                    url: URL.to_string(),
                }
            );
        }
    }

    #[test]
    fn informational_and_out_of_range_are_unexpected() {
        for status in [100, 0, 600, 999] {
            let err = run(status, None, None).unwrap_err();
            assert!(matches!(err, ServiceError::Http { .. }));
            assert!(err.message().starts_with("Received an unexpected HTTP status"));
        }
    }

    #[test]
    fn server_errors_ignore_body() {
        let err = run(500, Some("application/json"), Some(r#"{"code":"X","error":"y"}"#)).unwrap_err();
        assert_eq!(err.message(), "Received a server error (500) for TestService");
        let err = run(503, None, None).unwrap_err();
        assert_eq!(err.message(), "Received a server error (503) for TestService");
        assert_eq!(err.status(), Some(503));
    }

    #[test]
    fn insufficient_funds() {
        let err = json_error(402, r#"{"code":"INSUFFICIENT_FUNDS","error":"out of credit"}"#);
        assert!(matches!(err, ServiceError::InsufficientFunds { status: 402, .. }));
        assert_eq!(err.message(), "out of credit");
        assert_eq!(err.code(), Some("INSUFFICIENT_FUNDS"));
    }

    #[test]
    fn authentication_codes() {
        for code in [
            "ACCOUNT_ID_REQUIRED",
            "ACCOUNT_ID_UNKNOWN",
            "AUTHORIZATION_INVALID",
            "LICENSE_KEY_REQUIRED",
            "USER_ID_REQUIRED",
            "USER_ID_UNKNOWN",
        ] {
            let err = json_error(401, &format!(r#"{{"code":"{code}","error":"Invalid auth"}}"#));
            assert!(matches!(err, ServiceError::Authentication { .. }), "{code}");
            assert_eq!(err.message(), "Invalid auth");
        }
    }

    #[test]
    fn permission_required() {
        let err = json_error(403, r#"{"code":"PERMISSION_REQUIRED","error":"Permission required"}"#);
        assert!(matches!(err, ServiceError::PermissionRequired { .. }));
        assert_eq!(err.message(), "Permission required");
    }

    #[test]
    fn invalid_ip_is_plain_invalid_request() {
        let err = json_error(400, r#"{"code":"IP_ADDRESS_INVALID","error":"IP invalid"}"#);
        assert_eq!(
            err,
            ServiceError::InvalidRequest {
                message: "IP invalid".to_string(),
                code: Some("IP_ADDRESS_INVALID".to_string()),
                status: 400,
                url: URL.to_string(),
            }
        );
    }

    #[test]
    fn ip_not_found_and_reserved_are_refined() {
        for code in ["IP_ADDRESS_NOT_FOUND", "IP_ADDRESS_RESERVED"] {
            let err = json_error(404, &format!(r#"{{"code":"{code}","error":"nope"}}"#));
            assert!(matches!(err, ServiceError::IpAddressNotFound { .. }), "{code}");
            assert!(err.is_invalid_request());
        }
    }

    #[test]
    fn unknown_code_is_invalid_request() {
        let err = json_error(400, r#"{"code":"SOMETHING_NEW","error":"new failure"}"#);
        assert!(matches!(err, ServiceError::InvalidRequest { .. }));
        assert_eq!(err.code(), Some("SOMETHING_NEW"));
        assert_eq!(err.message(), "new failure");
    }

    #[test]
    fn missing_error_uses_default_message() {
        let err = json_error(400, r#"{"code":"IP_ADDRESS_INVALID"}"#);
        assert!(matches!(err, ServiceError::InvalidRequest { .. }));
        assert_eq!(err.message(), NO_EXPLANATION);
    }

    #[test]
    fn missing_code_is_invalid_request() {
        let err = json_error(400, r#"{"error":"something went wrong"}"#);
        assert_eq!(
            err,
            ServiceError::InvalidRequest {
                message: "something went wrong".to_string(),
                code: None,
                status: 400,
                url: URL.to_string(),
            }
        );
    }

    #[test]
    fn json_without_code_or_error_is_http_error() {
        let err = json_error(400, r#"{"not":"expected"}"#);
        assert_eq!(
            err,
            ServiceError::Http {
                message: r#"Error response contains JSON but it does not specify code or error keys: {"not":"expected"}"#.to_string(),
                status: 400,
                url: URL.to_string(),
            }
        );
    }

    #[test]
    fn null_keys_count_as_missing() {
        let err = json_error(400, r#"{"code":null,"error":null}"#);
        assert!(matches!(err, ServiceError::Http { .. }));
    }

    #[test]
    fn non_object_json_is_http_error() {
        let err = json_error(400, "[1,2,3]");
        assert!(err
            .message()
            .starts_with("Error response contains JSON but it does not specify code or error keys"));
    }

    #[test]
    fn client_error_with_malformed_json() {
        let err = json_error(400, r#"{"blah"}"#);
        assert!(matches!(err, ServiceError::WebService { status: 400, .. }));
        assert!(err.message().starts_with(
            "Received a 400 error for TestService but could not decode the response as JSON: "
        ));
        assert!(err.message().ends_with(r#". Body: {"blah"}"#));
    }

    #[test]
    fn client_error_without_body() {
        for body in [None, Some("")] {
            let err = run(400, Some("application/json"), body).unwrap_err();
            assert_eq!(err.message(), "Received a 400 error for TestService with no body");
            assert!(matches!(err, ServiceError::Http { .. }));
        }
    }

    #[test]
    fn client_error_with_non_json_body() {
        let err = run(400, Some("text/plain"), Some("text")).unwrap_err();
        assert_eq!(
            err.message(),
            "Received a 400 error for TestService with the following body: text"
        );
        let err = run(404, None, Some("missing")).unwrap_err();
        assert_eq!(
            err.message(),
            "Received a 404 error for TestService with the following body: missing"
        );
    }

    #[test]
    fn json_content_type_detection() {
        assert!(is_json_content_type(Some("application/json")));
        assert!(is_json_content_type(Some("application/json; charset=UTF-8")));
        assert!(is_json_content_type(Some("Application/JSON")));
        assert!(is_json_content_type(Some(" application/json ;charset=utf-8")));
        assert!(!is_json_content_type(Some("text/plain")));
        assert!(!is_json_content_type(Some("application/jsonp")));
        assert!(!is_json_content_type(Some("application/vnd.api+json")));
        assert!(!is_json_content_type(None));
    }

    #[test]
    fn classification_is_repeatable() {
        let responses = [
            HttpResponse::new(200, Some("application/json"), Some(r#"{"a":"b"}"#)),
            HttpResponse::new(402, Some("application/json"), Some(r#"{"code":"INSUFFICIENT_FUNDS","error":"x"}"#)),
            HttpResponse::new(302, None, None),
        ];
        for response in &responses {
            assert_eq!(
                classify(response, SERVICE, URL),
                classify(response, SERVICE, URL)
            );
        }
    }
}

use std::future::{ready, Ready};

use actix_web::{FromRequest, HttpRequest};

use crate::errors::AppError;

/// Header carrying the caller's principal. Authentication happens upstream
/// (the identity provider is not this service's concern); the value here is
/// an opaque, already-verified identity string.
pub const PRINCIPAL_HEADER: &str = "X-Principal";

const MAX_PRINCIPAL_LEN: usize = 128;

/// The authenticated principal a profile and its badges are stored under.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Principal(pub String);

impl Principal {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Principal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromRequest for Principal {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
        let principal = req
            .headers()
            .get(PRINCIPAL_HEADER)
            .and_then(|h| h.to_str().ok())
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .ok_or_else(|| {
                AppError::Unauthorized(format!("Missing {} header", PRINCIPAL_HEADER))
            })
            .and_then(|p| {
                if p.len() > MAX_PRINCIPAL_LEN {
                    Err(AppError::ValidationError(format!(
                        "Principal exceeds {} characters",
                        MAX_PRINCIPAL_LEN
                    )))
                } else {
                    Ok(Principal(p.to_string()))
                }
            });

        ready(principal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[actix_web::test]
    async fn test_principal_extracted_from_header() {
        let req = TestRequest::default()
            .insert_header((PRINCIPAL_HEADER, "aaaaa-bbbbb-ccccc"))
            .to_http_request();

        let principal = Principal::extract(&req).await.unwrap();
        assert_eq!(principal.as_str(), "aaaaa-bbbbb-ccccc");
    }

    #[actix_web::test]
    async fn test_missing_header_is_unauthorized() {
        let req = TestRequest::default().to_http_request();

        let result = Principal::extract(&req).await;
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[actix_web::test]
    async fn test_blank_header_is_unauthorized() {
        let req = TestRequest::default()
            .insert_header((PRINCIPAL_HEADER, "   "))
            .to_http_request();

        let result = Principal::extract(&req).await;
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[actix_web::test]
    async fn test_oversized_header_is_rejected() {
        let req = TestRequest::default()
            .insert_header((PRINCIPAL_HEADER, "x".repeat(200)))
            .to_http_request();

        let result = Principal::extract(&req).await;
        assert!(matches!(result, Err(AppError::ValidationError(_))));
    }
}

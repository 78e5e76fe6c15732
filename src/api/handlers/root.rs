use axum::response::IntoResponse;

// axum handler for the undocumented root route
pub async fn root() -> impl IntoResponse {
    concat!(env!("CARGO_PKG_NAME"), " ", env!("CARGO_PKG_VERSION"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::to_bytes, response::IntoResponse};

    #[tokio::test]
    async fn root_reports_name_and_version() {
        let response = root().await.into_response();
        let bytes = to_bytes(response.into_body(), 1024)
            .await
            .unwrap_or_default();
        let body = String::from_utf8_lossy(&bytes);
        assert!(body.starts_with(env!("CARGO_PKG_NAME")));
        assert!(body.contains(env!("CARGO_PKG_VERSION")));
    }
}

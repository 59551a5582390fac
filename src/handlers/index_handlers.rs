//! Static landing page.

use axum::{http::header, response::IntoResponse};

const INDEX_HTML: &str = r#"<html>
	<head><title>S3 Image Exporter</title></head>
		<body>
			<h1>S3 Image Exporter</h1>
			<p><a href="/metrics">Metrics</a></p>
		</body>
	</html>"#;

/// GET `/` — informational page linking to the metrics route.
pub async fn index() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/html")], INDEX_HTML)
}

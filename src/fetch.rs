//! Document loading from files, strings, and HTTP URLs.

use std::path::Path;

use serde_json::Value;
use tracing::{debug, info};

use crate::error::LoadError;
use crate::types::{Record, Registry};

#[cfg(feature = "remote")]
use std::time::Duration;

/// Timeout for HTTP requests. The registry is a few megabytes.
#[cfg(feature = "remote")]
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Load a JSON document from a file path.
///
/// # Errors
///
/// Returns `LoadError::FileNotFound` if the file doesn't exist,
/// or `LoadError::InvalidJson` if the file isn't valid JSON.
pub fn load_json(path: &Path) -> Result<Value, LoadError> {
    if !path.exists() {
        return Err(LoadError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = std::fs::read_to_string(path).map_err(|source| LoadError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), bytes = content.len(), "loaded file");

    serde_json::from_str(&content).map_err(|source| LoadError::InvalidJson {
        origin: path.display().to_string(),
        source,
    })
}

/// Load a JSON document from a string.
pub fn load_json_str(content: &str) -> Result<Value, LoadError> {
    serde_json::from_str(content).map_err(|source| LoadError::InvalidJson {
        origin: "<string>".to_string(),
        source,
    })
}

/// Load a JSON document from an HTTP/HTTPS URL with a single blocking GET.
///
/// Requires the `remote` feature (enabled by default). Non-success statuses
/// and non-JSON bodies are both reported as `LoadError::NetworkError`.
#[cfg(feature = "remote")]
pub fn load_json_url(url: &str) -> Result<Value, LoadError> {
    let network_error = |source: reqwest::Error| LoadError::NetworkError {
        url: url.to_string(),
        source,
    };

    let client = reqwest::blocking::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .map_err(network_error)?;

    let response = client.get(url).send().map_err(network_error)?;
    debug!(url, status = %response.status(), "fetched");

    // Check for HTTP errors before parsing
    let response = response.error_for_status().map_err(network_error)?;

    response.json().map_err(network_error)
}

/// Check if a string looks like a URL (starts with http:// or https://).
pub fn is_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

/// Load a JSON document from a file path or URL.
///
/// URL loading requires the `remote` feature.
pub fn load_json_auto(source: &str) -> Result<Value, LoadError> {
    if is_url(source) {
        #[cfg(feature = "remote")]
        {
            load_json_url(source)
        }
        #[cfg(not(feature = "remote"))]
        {
            Err(LoadError::FileNotFound {
                path: std::path::PathBuf::from(source),
            })
        }
    } else {
        load_json(Path::new(source))
    }
}

/// Fetch a registry and return its destination records in registry order.
///
/// # Errors
///
/// Any load error, or `LoadError::InvalidRegistry` when the document has
/// no `destinations` array of objects.
pub fn fetch_registry(source: &str) -> Result<Vec<Record>, LoadError> {
    let document = load_json_auto(source)?;
    let registry = registry_from_value(document, source)?;
    info!(
        source,
        destinations = registry.destinations.len(),
        "fetched registry"
    );
    Ok(registry.destinations)
}

fn registry_from_value(document: Value, origin: &str) -> Result<Registry, LoadError> {
    serde_json::from_value(document).map_err(|source| LoadError::InvalidRegistry {
        origin: origin.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn load_json_valid_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"type": "object"}}"#).unwrap();

        let doc = load_json(file.path()).unwrap();
        assert_eq!(doc["type"], "object");
    }

    #[test]
    fn load_json_file_not_found() {
        let result = load_json(Path::new("/nonexistent/tasks.json"));
        assert!(matches!(result, Err(LoadError::FileNotFound { .. })));
    }

    #[test]
    fn load_json_invalid_json() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "not valid json").unwrap();

        let result = load_json(file.path());
        assert!(matches!(result, Err(LoadError::InvalidJson { .. })));
    }

    #[test]
    fn load_json_str_invalid() {
        let result = load_json_str("{");
        assert!(matches!(result, Err(LoadError::InvalidJson { .. })));
    }

    #[test]
    fn is_url_detection() {
        assert!(is_url("https://connectors.airbyte.com/registry.json"));
        assert!(is_url("http://localhost:1234/registry.json"));
        assert!(!is_url("./registry.json"));
        assert!(!is_url("file:///tmp/registry.json"));
    }

    #[test]
    fn fetch_registry_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            "{}",
            json!({
                "sources": [],
                "destinations": [{ "name": "Postgres" }, { "name": "BigQuery" }]
            })
        )
        .unwrap();

        let destinations = fetch_registry(file.path().to_str().unwrap()).unwrap();
        assert_eq!(destinations.len(), 2);
        assert_eq!(destinations[1]["name"], "BigQuery");
    }

    #[test]
    fn registry_without_destinations_is_rejected() {
        let result = registry_from_value(json!({ "sources": [] }), "test");
        assert!(matches!(result, Err(LoadError::InvalidRegistry { .. })));

        let result = registry_from_value(json!({ "destinations": [1, 2] }), "test");
        assert!(matches!(result, Err(LoadError::InvalidRegistry { .. })));
    }

    #[cfg(feature = "remote")]
    mod remote {
        use super::*;

        #[test]
        fn load_json_url_served() {
            let mut server = mockito::Server::new();
            let mock = server
                .mock("GET", "/registry.json")
                .with_status(200)
                .with_header("content-type", "application/json")
                .with_body(r#"{"destinations": []}"#)
                .create();

            let doc = load_json_url(&format!("{}/registry.json", server.url())).unwrap();
            assert_eq!(doc["destinations"], json!([]));
            mock.assert();
        }

        #[test]
        fn load_json_url_http_error() {
            let mut server = mockito::Server::new();
            let _mock = server.mock("GET", "/missing.json").with_status(404).create();

            let result = load_json_url(&format!("{}/missing.json", server.url()));
            assert!(matches!(result, Err(LoadError::NetworkError { .. })));
        }

        #[test]
        fn load_json_url_non_json_body() {
            let mut server = mockito::Server::new();
            let _mock = server
                .mock("GET", "/registry.json")
                .with_status(200)
                .with_body("<html>maintenance</html>")
                .create();

            let result = load_json_url(&format!("{}/registry.json", server.url()));
            assert!(matches!(result, Err(LoadError::NetworkError { .. })));
        }
    }
}

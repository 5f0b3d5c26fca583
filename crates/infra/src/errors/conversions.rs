//! Conversions from external infrastructure errors into port errors.

use reqwest::Error as HttpError;
use weavelink_core::TransportError;
use weavelink_domain::WeaveError;

/// Extension trait keeping the `reqwest` mapping on the infrastructure side.
pub trait IntoTransportError {
    fn into_transport_error(self) -> TransportError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → TransportError */
/* -------------------------------------------------------------------------- */

impl IntoTransportError for HttpError {
    fn into_transport_error(self) -> TransportError {
        if self.is_timeout() {
            return TransportError::Timeout(self.to_string());
        }

        #[cfg(not(target_arch = "wasm32"))]
        if self.is_connect() {
            return TransportError::Connect(self.to_string());
        }

        TransportError::Other(self.to_string())
    }
}

/// Building an HTTP client is a configuration problem, not a transport one.
pub(crate) fn client_build_error(err: &HttpError) -> WeaveError {
    WeaveError::Config(format!("Failed to build HTTP client: {err}"))
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;
    use std::time::Duration;

    use reqwest::Client;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[tokio::test]
    async fn refused_connection_maps_to_connect() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = Client::new().get(format!("http://{addr}")).send().await.unwrap_err();

        assert!(matches!(err.into_transport_error(), TransportError::Connect(_)));
    }

    #[tokio::test]
    async fn slow_response_maps_to_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let err = Client::new()
            .get(server.uri())
            .timeout(Duration::from_millis(50))
            .send()
            .await
            .unwrap_err();

        assert!(matches!(err.into_transport_error(), TransportError::Timeout(_)));
    }

    #[test]
    fn invalid_url_maps_to_other() {
        let err = reqwest::blocking::Client::builder()
            .build()
            .unwrap()
            .get("http://[::1")
            .send()
            .unwrap_err();
        assert!(matches!(err.into_transport_error(), TransportError::Other(_)));
    }
}

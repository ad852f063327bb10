//! Persisting uploaded files.

use std::future::Future;

use reqwest::multipart::{Form, Part};
use weaver_common::UploadConfig;

use crate::error::TransportError;
use crate::file::{PendingFile, UploadProgress, UploadedFile};

/// Stores a file and returns where it can be fetched from.
///
/// Progress reports are advisory and may be sparse.
pub trait Transport {
    fn upload(
        &self,
        file: &PendingFile,
        on_progress: &dyn Fn(UploadProgress),
    ) -> impl Future<Output = Result<UploadedFile, TransportError>>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn upload(
        &self,
        file: &PendingFile,
        on_progress: &dyn Fn(UploadProgress),
    ) -> impl Future<Output = Result<UploadedFile, TransportError>> {
        (**self).upload(file, on_progress)
    }
}

/// Multipart POST to an HTTP endpoint answering `{"fileUrl": "..."}`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTransport {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }

    pub fn from_config(config: &UploadConfig) -> Result<Self, TransportError> {
        config
            .endpoint
            .as_deref()
            .map(Self::new)
            .ok_or(TransportError::MissingEndpoint)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Transport for HttpTransport {
    async fn upload(
        &self,
        file: &PendingFile,
        on_progress: &dyn Fn(UploadProgress),
    ) -> Result<UploadedFile, TransportError> {
        let total = file.data.len() as u64;
        on_progress(UploadProgress::new(0, total));

        let part = Part::bytes(file.data.to_vec())
            .file_name(file.name.clone())
            .mime_str(&file.content_type)?;
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await?;
        on_progress(UploadProgress::new(total, total));

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use wiremock::matchers::{header_regex, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn png() -> PendingFile {
        PendingFile::new("a.png", "image/png", &b"\x89PNG"[..])
    }

    async fn server_answering(template: ResponseTemplate) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/files"))
            .respond_with(template)
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn posts_multipart_form_and_reads_file_url() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/files"))
            .and(header_regex("content-type", "^multipart/form-data; boundary="))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"fileUrl": "https://cdn.example/a.png"}"#),
            )
            .expect(1)
            .mount(&server)
            .await;

        let transport = HttpTransport::new(format!("{}/files", server.uri()));
        let progress = RefCell::new(Vec::new());
        let uploaded = transport
            .upload(&png(), &|p| progress.borrow_mut().push(p))
            .await
            .unwrap();

        assert_eq!(uploaded.file_url, "https://cdn.example/a.png");
        assert_eq!(
            *progress.borrow(),
            vec![UploadProgress::new(0, 4), UploadProgress::new(4, 4)]
        );

        let requests = server.received_requests().await.unwrap();
        let body = String::from_utf8_lossy(&requests[0].body).to_ascii_lowercase();
        assert!(body.contains(r#"name="file"; filename="a.png""#), "{body}");
        assert!(body.contains("content-type: image/png"), "{body}");
    }

    #[tokio::test]
    async fn error_status_keeps_code_and_body() {
        for code in [413, 500] {
            let server =
                server_answering(ResponseTemplate::new(code).set_body_string("too large")).await;
            let transport = HttpTransport::new(format!("{}/files", server.uri()));
            let err = transport.upload(&png(), &|_| {}).await.unwrap_err();
            assert!(
                matches!(&err, TransportError::Status { status, body } if *status == code && body == "too large"),
                "{err:?}"
            );
        }
    }

    #[tokio::test]
    async fn malformed_response_is_invalid() {
        for body in ["not json", r#"{"url": "https://cdn.example/a.png"}"#] {
            let server = server_answering(ResponseTemplate::new(200).set_body_string(body)).await;
            let transport = HttpTransport::new(format!("{}/files", server.uri()));
            let err = transport.upload(&png(), &|_| {}).await.unwrap_err();
            assert!(matches!(err, TransportError::InvalidResponse(_)), "{body}: {err:?}");
        }
    }

    #[test]
    fn endpoint_comes_from_config() {
        let config = UploadConfig {
            endpoint: Some("https://upload.example/files".into()),
            ..Default::default()
        };
        let transport = HttpTransport::from_config(&config).unwrap();
        assert_eq!(transport.endpoint(), "https://upload.example/files");

        let err = HttpTransport::from_config(&UploadConfig::default()).unwrap_err();
        assert!(matches!(err, TransportError::MissingEndpoint));
    }
}

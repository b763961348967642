use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use ::common::storage::memory::MemoryBlobStore;
use ::common::storage::{BlobStore, ContentHash, StorageError};
use reqwest::Client;
use reqwest::header::HeaderMap;
use reqwest::multipart::{Form, Part};

use snapbin::config::AppConfig;
use snapbin::state::AppState;

pub mod routes {
    pub const PING: &str = "/ping";
    pub const UPLOAD: &str = "/upload.cgi";

    pub fn page(hash: &str) -> String {
        format!("/{hash}")
    }

    pub fn image(hash: &str) -> String {
        format!("/{hash}.png")
    }
}

/// The three bytes every JPEG starts with.
pub const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF];

/// A running test server.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    /// The store behind the server, for assertions. `None` when a custom store was injected.
    pub store: Option<Arc<MemoryBlobStore>>,
}

/// Parsed HTTP response for test assertions.
pub struct TestResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub bytes: Vec<u8>,
}

/// Blob store whose backend is always down.
pub struct UnavailableStore;

#[async_trait]
impl BlobStore for UnavailableStore {
    async fn put(&self, _hash: &ContentHash, _data: &[u8]) -> Result<(), StorageError> {
        Err(StorageError::BackendUnavailable("connection refused".into()))
    }

    async fn get(&self, _hash: &ContentHash) -> Result<Vec<u8>, StorageError> {
        Err(StorageError::BackendUnavailable("connection refused".into()))
    }

    async fn exists(&self, _hash: &ContentHash) -> Result<bool, StorageError> {
        Err(StorageError::BackendUnavailable("connection refused".into()))
    }
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with_config(AppConfig::default()).await
    }

    pub async fn spawn_with_config(config: AppConfig) -> Self {
        let store = Arc::new(MemoryBlobStore::new());
        let mut app = Self::spawn_with_store(config, store.clone()).await;
        app.store = Some(store);
        app
    }

    pub async fn spawn_with_store(config: AppConfig, blob_store: Arc<dyn BlobStore>) -> Self {
        let state = AppState { config, blob_store };
        let app = snapbin::build_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            client: Client::new(),
            store: None,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url(), path)
    }

    /// Number of blobs in the in-memory store.
    pub fn stored_blobs(&self) -> usize {
        self.store
            .as_ref()
            .expect("stored_blobs needs the default in-memory store")
            .len()
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    pub async fn get_with_header(&self, path: &str, name: &str, value: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .header(name, value)
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    pub async fn post_form(&self, path: &str, form: Form) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .multipart(form)
            .send()
            .await
            .expect("Failed to send multipart upload request");

        TestResponse::from_response(res).await
    }

    /// Upload `bytes` as the `imagedata` part.
    pub async fn upload(&self, bytes: Vec<u8>) -> TestResponse {
        self.post_form(routes::UPLOAD, Form::new().part("imagedata", image_part(bytes)))
            .await
    }

    /// Upload `bytes` and return the key from the response URL.
    pub async fn upload_ok(&self, bytes: Vec<u8>) -> String {
        let res = self.upload(bytes).await;
        assert_eq!(res.status, 200, "upload failed: {}", res.text());
        res.text()
            .rsplit('/')
            .next()
            .expect("response should be a URL")
            .trim_end_matches(".png")
            .to_string()
    }
}

pub fn image_part(bytes: Vec<u8>) -> Part {
    Part::bytes(bytes)
        .file_name("image.png")
        .mime_str("image/png")
        .expect("Failed to set MIME type")
}

impl TestResponse {
    pub async fn from_response(res: reqwest::Response) -> Self {
        let status = res.status().as_u16();
        let headers = res.headers().clone();
        let bytes = res.bytes().await.map(|b| b.to_vec()).unwrap_or_default();
        Self {
            status,
            headers,
            bytes,
        }
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

//! Demo request handlers served by the `rawhttp` binary.

pub mod relay;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use tokio::io::AsyncWrite;
use url::Url;

use crate::http::request::Request;
use crate::http::headers::Headers;
use crate::http::response::{StatusCode, default_headers};
use crate::http::writer::ResponseWriter;
use crate::server::{Handler, HandlerError};

pub use relay::Relay;

const RELAY_PREFIX: &str = "/httpbin/";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_VIDEO_PATH: &str = "assets/vim.mp4";

const BODY_200: &str = "<html>
  <head>
    <title>200 OK</title>
  </head>
  <body>
    <h1>Success!</h1>
    <p>Your request was an absolute banger.</p>
  </body>
</html>";

const BODY_400: &str = "<html>
  <head>
    <title>400 Bad Request</title>
  </head>
  <body>
    <h1>Bad Request</h1>
    <p>Your request honestly kinda sucked.</p>
  </body>
</html>";

const BODY_500: &str = "<html>
  <head>
    <title>500 Internal Server Error</title>
  </head>
  <body>
    <h1>Internal Server Error</h1>
    <p>Okay, you know what? This one is on me.</p>
  </body>
</html>";

/// Routes:
/// - `/yourproblem*` → 400 page
/// - `/myproblem*` → 500 page
/// - `/httpbin/<path>` → relayed from the upstream (GET only)
/// - `GET /video` → the video file, as `video/mp4`
/// - anything else → 200 page
pub struct DemoHandler {
    relay: Relay,
    video_path: PathBuf,
}

impl DemoHandler {
    pub fn new(upstream: &str) -> anyhow::Result<Self> {
        let upstream = Url::parse(upstream).context("Invalid upstream URL")?;
        Ok(Self {
            relay: Relay::new(upstream, CONNECT_TIMEOUT),
            video_path: PathBuf::from(DEFAULT_VIDEO_PATH),
        })
    }

    /// Serves `/video` from `path` instead of [`DEFAULT_VIDEO_PATH`].
    pub fn with_video_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.video_path = path.into();
        self
    }

    async fn serve_video<W>(&self, w: &mut ResponseWriter<W>) -> Result<(), HandlerError>
    where
        W: AsyncWrite + Unpin + Send,
    {
        let video = match tokio::fs::read(&self.video_path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(path = %self.video_path.display(), error = %e, "Failed to read video");
                let mut headers = Headers::new();
                headers.replace("Content-Type", "text/plain")?;
                headers.replace("Connection", "close")?;
                w.write_internal_server_error(e, headers).await?;
                return Ok(());
            }
        };

        let mut headers = default_headers(video.len());
        headers.replace("Content-Type", "video/mp4")?;

        w.write_status_line(StatusCode::OK).await?;
        w.write_headers(&headers).await?;
        w.write_body(&video).await?;
        Ok(())
    }
}

impl Handler for DemoHandler {
    async fn handle<W>(&self, w: &mut ResponseWriter<W>, req: &Request) -> Result<(), HandlerError>
    where
        W: AsyncWrite + Unpin + Send,
    {
        let target = req.target();

        if let Some(path) = target.strip_prefix(RELAY_PREFIX) {
            if req.method() != "GET" {
                return Err(HandlerError::bad_request("relay only supports GET"));
            }
            return self.relay.relay(w, path).await;
        }

        if target == "/video" && req.method() == "GET" {
            return self.serve_video(w).await;
        }

        let (status, body) = if target.starts_with("/yourproblem") {
            (StatusCode::BAD_REQUEST, BODY_400)
        } else if target.starts_with("/myproblem") {
            (StatusCode::INTERNAL_SERVER_ERROR, BODY_500)
        } else {
            (StatusCode::OK, BODY_200)
        };

        let mut headers = default_headers(body.len());
        headers.replace("Content-Type", "text/html")?;

        w.write_status_line(status).await?;
        w.write_headers(&headers).await?;
        w.write_body(body.as_bytes()).await?;
        Ok(())
    }
}

use std::ops::{Deref, DerefMut};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use thiserror::Error;
use tracing::{debug, info};

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: Url,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned HTTP {status}")]
    Status { url: Url, status: u16 },
    #[error("session already closed")]
    Closed,
}

/// A loaded document: the final URL after redirects and its HTML.
#[derive(Debug, Clone)]
pub struct Page {
    pub url: Url,
    pub html: String,
}

/// A browsing session the pagination loop drives.
#[async_trait]
pub trait Session: Send {
    async fn navigate(&mut self, url: &Url) -> Result<Page, SessionError>;

    /// Release the session. Called exactly once by [`SessionGuard`].
    fn close(&mut self);
}

/// Plain HTTP session. The catalog renders results server-side, so fetching
/// the document is equivalent to loading it in a browser.
pub struct HttpSession {
    client: Option<reqwest::Client>,
}

impl HttpSession {
    pub fn launch(connect_timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(connect_timeout)
            .build()?;
        debug!("HTTP session opened");
        Ok(Self {
            client: Some(client),
        })
    }
}

#[async_trait]
impl Session for HttpSession {
    async fn navigate(&mut self, url: &Url) -> Result<Page, SessionError> {
        let client = self.client.as_ref().ok_or(SessionError::Closed)?;
        let request_err = |source| SessionError::Request {
            url: url.clone(),
            source,
        };

        let resp = client.get(url.clone()).send().await.map_err(request_err)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(SessionError::Status {
                url: url.clone(),
                status: status.as_u16(),
            });
        }
        let final_url = resp.url().clone();
        let html = resp.text().await.map_err(request_err)?;
        debug!("Loaded {} ({} bytes)", final_url, html.len());

        Ok(Page {
            url: final_url,
            html,
        })
    }

    fn close(&mut self) {
        self.client = None;
    }
}

/// Owns a session and guarantees `close()` runs exactly once, whether the
/// guard is released explicitly or dropped during error propagation.
pub struct SessionGuard<S: Session> {
    session: S,
    closed: bool,
}

impl<S: Session> SessionGuard<S> {
    pub fn new(session: S) -> Self {
        Self {
            session,
            closed: false,
        }
    }

    pub fn release(mut self) {
        self.close_once();
    }

    fn close_once(&mut self) {
        if !self.closed {
            self.closed = true;
            self.session.close();
            info!("Session closed.");
        }
    }
}

impl<S: Session> Deref for SessionGuard<S> {
    type Target = S;

    fn deref(&self) -> &S {
        &self.session
    }
}

impl<S: Session> DerefMut for SessionGuard<S> {
    fn deref_mut(&mut self) -> &mut S {
        &mut self.session
    }
}

impl<S: Session> Drop for SessionGuard<S> {
    fn drop(&mut self) {
        self.close_once();
    }
}

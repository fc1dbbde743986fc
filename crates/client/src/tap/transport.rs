//! The page's request primitives and their tapped wrappers.
//!
//! A wrapper hands the request to the real primitive untouched and returns
//! whatever it returns. The observer gets a copy of the request on a detached
//! task, so nothing it does can delay or fail the real call.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::runtime::Handle;

use super::body::RequestBody;
use super::{RequestObserver, TapError};

/// A request as issued by the page.
#[derive(Debug)]
pub struct PageRequest {
    pub url: String,
    pub method: String,
    pub headers: BTreeMap<String, String>,
    pub body: RequestBody,
}

impl PageRequest {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self { url: url.into(), method: method.into(), headers: BTreeMap::new(), body: RequestBody::Empty }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn body(mut self, body: impl Into<RequestBody>) -> Self {
        self.body = body.into();
        self
    }

    fn tee(self) -> (Self, Self) {
        let (sent, observed) = self.body.tee();
        let copy = PageRequest {
            url: self.url.clone(),
            method: self.method.clone(),
            headers: self.headers.clone(),
            body: observed,
        };
        (PageRequest { body: sent, ..self }, copy)
    }
}

/// The promise-style primitive.
#[async_trait]
pub trait FetchPrimitive: Send + Sync {
    type Response: Send + 'static;

    async fn fetch(&self, request: PageRequest) -> Self::Response;

    /// Sentinel checked before wrapping.
    fn is_tapped(&self) -> bool {
        false
    }
}

/// The callback-style primitive: requests are opened, given headers, then sent.
pub trait XhrPrimitive: Send + Sync {
    fn create(&self) -> Box<dyn XhrRequest>;

    /// Sentinel checked before wrapping.
    fn is_tapped(&self) -> bool {
        false
    }
}

/// One callback-style request. Completion is reported through the
/// implementation's own callbacks.
pub trait XhrRequest: Send {
    fn open(&mut self, method: &str, url: &str);
    fn set_request_header(&mut self, name: &str, value: &str);
    fn send(self: Box<Self>, body: RequestBody);
}

fn observe_detached(runtime: &Handle, observer: &Arc<dyn RequestObserver>, request: PageRequest) {
    let observer = Arc::clone(observer);
    runtime.spawn(async move {
        observer.observe(request).await;
    });
}

/// Tapped promise-style primitive.
pub struct TappedFetch<R> {
    inner: Arc<dyn FetchPrimitive<Response = R>>,
    observer: Arc<dyn RequestObserver>,
    runtime: Handle,
}

#[async_trait]
impl<R: Send + 'static> FetchPrimitive for TappedFetch<R> {
    type Response = R;

    async fn fetch(&self, request: PageRequest) -> R {
        let (sent, observed) = request.tee();
        let response = self.inner.fetch(sent).await;
        observe_detached(&self.runtime, &self.observer, observed);
        response
    }

    fn is_tapped(&self) -> bool {
        true
    }
}

/// Tapped callback-style primitive.
pub struct TappedXhr {
    inner: Arc<dyn XhrPrimitive>,
    observer: Arc<dyn RequestObserver>,
    runtime: Handle,
}

impl XhrPrimitive for TappedXhr {
    fn create(&self) -> Box<dyn XhrRequest> {
        Box::new(TappedXhrRequest {
            inner: self.inner.create(),
            observer: Arc::clone(&self.observer),
            runtime: self.runtime.clone(),
            method: String::new(),
            url: String::new(),
            headers: BTreeMap::new(),
        })
    }

    fn is_tapped(&self) -> bool {
        true
    }
}

struct TappedXhrRequest {
    inner: Box<dyn XhrRequest>,
    observer: Arc<dyn RequestObserver>,
    runtime: Handle,
    method: String,
    url: String,
    headers: BTreeMap<String, String>,
}

impl XhrRequest for TappedXhrRequest {
    fn open(&mut self, method: &str, url: &str) {
        self.method = method.to_string();
        self.url = url.to_string();
        self.headers.clear();
        self.inner.open(method, url);
    }

    fn set_request_header(&mut self, name: &str, value: &str) {
        self.headers.insert(name.to_string(), value.to_string());
        self.inner.set_request_header(name, value);
    }

    fn send(self: Box<Self>, body: RequestBody) {
        let this = *self;
        let (sent, observed) = body.tee();
        let request = PageRequest { url: this.url, method: this.method, headers: this.headers, body: observed };
        observe_detached(&this.runtime, &this.observer, request);
        this.inner.send(sent);
    }
}

/// The page's two request primitives.
pub struct Primitives<R> {
    pub fetch: Arc<dyn FetchPrimitive<Response = R>>,
    pub xhr: Arc<dyn XhrPrimitive>,
}

impl<R: Send + 'static> Primitives<R> {
    /// Wrap both primitives with `observer`. Already-tapped primitives are
    /// returned as they are, so installing twice observes each request once.
    ///
    /// # Errors
    ///
    /// Returns `TapError::NoRuntime` outside a tokio runtime.
    pub fn install_tap(self, observer: Arc<dyn RequestObserver>) -> Result<Self, TapError> {
        let runtime = Handle::try_current().map_err(|_| TapError::NoRuntime)?;

        let fetch: Arc<dyn FetchPrimitive<Response = R>> = if self.fetch.is_tapped() {
            tracing::debug!("fetch primitive already tapped");
            self.fetch
        } else {
            Arc::new(TappedFetch { inner: self.fetch, observer: Arc::clone(&observer), runtime: runtime.clone() })
        };

        let xhr: Arc<dyn XhrPrimitive> = if self.xhr.is_tapped() {
            tracing::debug!("xhr primitive already tapped");
            self.xhr
        } else {
            Arc::new(TappedXhr { inner: self.xhr, observer, runtime })
        };

        Ok(Self { fetch, xhr })
    }
}

use http::StatusCode;
use verbatim_header::managed::HttpDate;
use verbatim_header::{HeaderError, ResponseHeaders};

use crate::protocol::{FileContent, ResponseContent};

const HTML_MEDIA_TYPE: &str = "text/html;charset=utf-8";

/// A response: a status, headers and a content.
///
/// The headers describing the content, like `Content-Length`, are set when the
/// response is sent.
#[derive(Debug)]
pub struct Response {
    status: StatusCode,
    headers: ResponseHeaders,
    content: ResponseContent,
}

impl Response {
    /// An empty response.
    pub fn new(status: StatusCode) -> Self {
        Self::with_content(status, ResponseContent::Empty)
    }

    pub fn with_content(status: StatusCode, content: ResponseContent) -> Self {
        Self { status, headers: ResponseHeaders::new(), content }
    }

    pub fn text<S: Into<String>>(status: StatusCode, text: S) -> Self {
        Self::with_content(status, ResponseContent::text(text))
    }

    pub fn html<S: Into<String>>(status: StatusCode, html: S) -> Self {
        Self::with_content(status, ResponseContent::text_with_type(html, HTML_MEDIA_TYPE))
    }

    /// A `206 Partial Content` response if only a part of the file is sent, `200 OK`
    /// otherwise.
    pub fn file(content: FileContent) -> Self {
        let status = if content.is_partial() { StatusCode::PARTIAL_CONTENT } else { StatusCode::OK };
        Self::with_content(status, ResponseContent::File(content))
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    pub fn headers(&self) -> &ResponseHeaders {
        &self.headers
    }

    pub fn content(&self) -> &ResponseContent {
        &self.content
    }

    pub fn set_content(&mut self, content: ResponseContent) {
        self.content = content;
    }

    pub(crate) fn into_parts(self) -> (StatusCode, ResponseHeaders, ResponseContent) {
        (self.status, self.headers, self.content)
    }
}

/// Sets the headers every response carries, right before it is sent.
pub trait DefaultResponseHeaders: Send + Sync {
    fn apply(&self, headers: &ResponseHeaders) -> Result<(), HeaderError>;
}

/// Sets `Date` to the current time and `Server` to the server name, unless the
/// response already carries them.
#[derive(Debug, Clone)]
pub struct StandardHeaders {
    server_name: String,
}

impl StandardHeaders {
    pub fn new<S: Into<String>>(server_name: S) -> Self {
        Self { server_name: server_name.into() }
    }
}

impl DefaultResponseHeaders for StandardHeaders {
    fn apply(&self, headers: &ResponseHeaders) -> Result<(), HeaderError> {
        if headers.date().value().is_none() {
            headers.date().set_value(Some(HttpDate::now()));
        }
        if headers.server().is_none() {
            headers.set_server(Some(self.server_name.as_str()))?;
        }
        Ok(())
    }
}

use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::io::{self, Cursor, Read};

/// Path under a reserved internal area.
pub const CODE_FORBIDDEN_ACCESS: StatusCode = StatusCode::FORBIDDEN;
/// Asset, action or method could not be resolved.
pub const CODE_NOT_FOUND: StatusCode = StatusCode::NOT_FOUND;
/// A filter or handler failed.
pub const CODE_INTERNAL_ERROR: StatusCode = StatusCode::INTERNAL_SERVER_ERROR;

pub const CONTENT_TYPE_JSON: &str = "application/json;charset=UTF-8";
const CONTENT_TYPE_TEXT: &str = "text/plain;charset=UTF-8";

/// Structured body written by [`HttpResponse::set_data_by_json_command`].
///
/// `data` carries optional detail, e.g. the diagnostic trace of a failed dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonCommand {
    pub code: u16,
    pub msg: String,
    pub data: Option<String>,
}

impl JsonCommand {
    #[must_use]
    pub fn new(code: StatusCode, msg: &str, data: Option<&str>) -> Self {
        Self {
            code: code.as_u16(),
            msg: msg.to_string(),
            data: data.map(ToString::to_string),
        }
    }

    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        serde_json::to_vec(self).unwrap_or_else(|_| b"{}".to_vec())
    }
}

/// Everything the router (and handlers) may do to a response.
///
/// Every routing outcome is communicated through exactly one of these calls.
pub trait HttpResponse {
    /// Plain error with a status code and short message.
    fn set_error(&mut self, code: StatusCode, message: &str);

    /// Stream a body. `None` leaves the content type to the transport.
    fn set_data_stream(&mut self, content_type: Option<&str>, stream: Box<dyn Read + Send>);

    /// Structured JSON command body, see [`JsonCommand`].
    fn set_data_by_json_command(&mut self, code: StatusCode, message: &str, detail: Option<&str>);

    /// Success body for handlers returning arbitrary JSON.
    fn set_data_by_json(&mut self, value: &Value) {
        let bytes = value.to_string().into_bytes();
        self.set_data_stream(Some(CONTENT_TYPE_JSON), Box::new(Cursor::new(bytes)));
    }
}

/// Body recorded by [`RouteResponse`].
pub enum ResponseBody {
    Empty,
    Text(String),
    Stream(Box<dyn Read + Send>),
    Json(JsonCommand),
}

impl fmt::Debug for ResponseBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseBody::Empty => write!(f, "Empty"),
            ResponseBody::Text(text) => f.debug_tuple("Text").field(text).finish(),
            ResponseBody::Stream(_) => write!(f, "Stream(..)"),
            ResponseBody::Json(cmd) => f.debug_tuple("Json").field(cmd).finish(),
        }
    }
}

/// In-memory response used by the bundled transport and by tests.
#[derive(Debug)]
pub struct RouteResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: ResponseBody,
}

impl Default for RouteResponse {
    fn default() -> Self {
        Self::new()
    }
}

impl RouteResponse {
    #[must_use]
    pub fn new() -> Self {
        Self {
            status: StatusCode::OK,
            content_type: None,
            body: ResponseBody::Empty,
        }
    }

    /// The structured command, if the last write was one.
    #[must_use]
    pub fn json_command(&self) -> Option<&JsonCommand> {
        match &self.body {
            ResponseBody::Json(cmd) => Some(cmd),
            _ => None,
        }
    }

    /// Drain the body into bytes, consuming streamed content.
    pub fn into_bytes(self) -> io::Result<Vec<u8>> {
        match self.body {
            ResponseBody::Empty => Ok(Vec::new()),
            ResponseBody::Text(text) => Ok(text.into_bytes()),
            ResponseBody::Json(cmd) => Ok(cmd.to_bytes()),
            ResponseBody::Stream(mut stream) => {
                let mut buf = Vec::new();
                stream.read_to_end(&mut buf)?;
                Ok(buf)
            }
        }
    }
}

impl HttpResponse for RouteResponse {
    fn set_error(&mut self, code: StatusCode, message: &str) {
        self.status = code;
        self.content_type = Some(CONTENT_TYPE_TEXT.to_string());
        self.body = ResponseBody::Text(message.to_string());
    }

    fn set_data_stream(&mut self, content_type: Option<&str>, stream: Box<dyn Read + Send>) {
        self.status = StatusCode::OK;
        self.content_type = content_type.map(ToString::to_string);
        self.body = ResponseBody::Stream(stream);
    }

    fn set_data_by_json_command(&mut self, code: StatusCode, message: &str, detail: Option<&str>) {
        self.status = code;
        self.content_type = Some(CONTENT_TYPE_JSON.to_string());
        self.body = ResponseBody::Json(JsonCommand::new(code, message, detail));
    }
}

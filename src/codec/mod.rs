//! HTTP/1.1 message framing
//!
//! Builds outbound requests and responses and parses inbound ones from any
//! buffered async reader. Both the client driver and the server connection
//! handler go through this module.

pub mod message;
pub mod parse;


pub use message::{
    build_redirect, build_request, build_response, now_millis, system_time_millis, HttpMessage,
    LineEnding, HTTP_VERSION,
};
pub use parse::{
    read_exact_or_eof, read_headers, read_line, read_request_head, read_response, Headers,
    HttpRequest, HttpResponse,
};

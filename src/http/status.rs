//! Status code constants and their reason phrases.

pub const CONTINUE: u16 = 100;
pub const SWITCHING_PROTOCOLS: u16 = 101;
pub const PROCESSING: u16 = 102;
pub const OK: u16 = 200;
pub const CREATED: u16 = 201;
pub const ACCEPTED: u16 = 202;
pub const NO_CONTENT: u16 = 204;
pub const MOVED_PERMANENTLY: u16 = 301;
pub const FOUND: u16 = 302;
pub const SEE_OTHER: u16 = 303;
pub const NOT_MODIFIED: u16 = 304;
pub const BAD_REQUEST: u16 = 400;
pub const UNAUTHORIZED: u16 = 401;
pub const FORBIDDEN: u16 = 403;
pub const NOT_FOUND: u16 = 404;
pub const METHOD_NOT_ALLOWED: u16 = 405;
pub const NOT_ACCEPTABLE: u16 = 406;
pub const REQUEST_TIMEOUT: u16 = 408;
pub const GONE: u16 = 410;
pub const LENGTH_REQUIRED: u16 = 411;
pub const REQUEST_ENTITY_TOO_LARGE: u16 = 413;
pub const REQUEST_URI_TOO_LONG: u16 = 414;
pub const UNSUPPORTED_MEDIA_TYPE: u16 = 415;
pub const EXPECTATION_FAILED: u16 = 417;
pub const UNPROCESSABLE_ENTITY: u16 = 422;
pub const LOCKED: u16 = 423;
pub const TOO_MANY_REQUESTS: u16 = 429;
pub const INTERNAL_SERVER_ERROR: u16 = 500;
pub const NOT_IMPLEMENTED: u16 = 501;
pub const BAD_GATEWAY: u16 = 502;
pub const SERVICE_UNAVAILABLE: u16 = 503;

/// Standard reason phrase for a status code, empty for codes outside
/// the supported set.
pub fn reason_phrase(status: u16) -> &'static str {
    match status {
        CONTINUE => "Continue",
        SWITCHING_PROTOCOLS => "Switching Protocols",
        PROCESSING => "Processing",
        OK => "OK",
        CREATED => "Created",
        ACCEPTED => "Accepted",
        NO_CONTENT => "No Content",
        MOVED_PERMANENTLY => "Moved Permanently",
        FOUND => "Found",
        SEE_OTHER => "See Other",
        NOT_MODIFIED => "Not Modified",
        BAD_REQUEST => "Bad Request",
        UNAUTHORIZED => "Unauthorized",
        FORBIDDEN => "Forbidden",
        NOT_FOUND => "Not Found",
        METHOD_NOT_ALLOWED => "Method Not Allowed",
        NOT_ACCEPTABLE => "Not Acceptable",
        REQUEST_TIMEOUT => "Request Timeout",
        GONE => "Gone",
        LENGTH_REQUIRED => "Length Required",
        REQUEST_ENTITY_TOO_LARGE => "Request Entity Too Large",
        REQUEST_URI_TOO_LONG => "Request URI Too Long",
        UNSUPPORTED_MEDIA_TYPE => "Unsupported Media Type",
        EXPECTATION_FAILED => "Expectation Failed",
        UNPROCESSABLE_ENTITY => "Unprocessable Entity",
        LOCKED => "Locked",
        TOO_MANY_REQUESTS => "Too Many Requests",
        INTERNAL_SERVER_ERROR => "Internal Server Error",
        NOT_IMPLEMENTED => "Not Implemented",
        BAD_GATEWAY => "Bad Gateway",
        SERVICE_UNAVAILABLE => "Service Unavailable",
        _ => "",
    }
}

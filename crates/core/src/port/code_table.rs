// Error-Code Table Port
// The engine only needs a validity predicate plus the two codes it emits itself.

/// JSON-RPC error codes
pub mod code {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;

    /// Implementation-defined server errors
    pub const SERVER_ERROR_MIN: i32 = -32099;
    pub const SERVER_ERROR_MAX: i32 = -32000;

    // Provider errors
    pub const USER_REJECTED: i32 = 4001;
    pub const UNAUTHORIZED: i32 = 4100;
    pub const UNSUPPORTED_METHOD: i32 = 4200;
    pub const DISCONNECTED: i32 = 4900;
    pub const CHAIN_DISCONNECTED: i32 = 4901;
}

/// Code table interface (allows custom code spaces and mocking in tests)
#[cfg_attr(test, mockall::automock)]
pub trait CodeTable: Send + Sync {
    /// Whether `code` belongs to the recognised code space
    fn is_valid(&self, code: i32) -> bool;

    /// Code used for requests rejected before any middleware runs
    fn invalid_request(&self) -> i32 {
        code::INVALID_REQUEST
    }

    /// Code used for contract violations and wrapped failures
    fn internal(&self) -> i32 {
        code::INTERNAL_ERROR
    }
}

/// JSON-RPC 2.0 reserved codes, the server range and the common provider codes
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardCodes;

impl CodeTable for StandardCodes {
    fn is_valid(&self, c: i32) -> bool {
        matches!(
            c,
            code::PARSE_ERROR
                | code::INVALID_REQUEST
                | code::METHOD_NOT_FOUND
                | code::INVALID_PARAMS
                | code::INTERNAL_ERROR
                | code::USER_REJECTED
                | code::UNAUTHORIZED
                | code::UNSUPPORTED_METHOD
                | code::DISCONNECTED
                | code::CHAIN_DISCONNECTED
        ) || (code::SERVER_ERROR_MIN..=code::SERVER_ERROR_MAX).contains(&c)
    }
}

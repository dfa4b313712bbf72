pub const APP_NAME: &str = "Cove";

// Limits
pub const MAX_MESSAGE_BODY_LENGTH: usize = 8000;
pub const MAX_WORKSPACE_NAME_LENGTH: usize = 100;
pub const MAX_CHANNEL_NAME_LENGTH: usize = 80;
pub const MAX_REACTION_VALUE_LENGTH: usize = 32;
pub const MIN_PASSWORD_LENGTH: usize = 8;

// Feed pagination
pub const MESSAGE_PAGE_SIZE: i64 = 20;
pub const MAX_MESSAGE_PAGE_SIZE: i64 = 100;

// Workspace join codes
pub const JOIN_CODE_LENGTH: usize = 6;

// Sessions
pub const SESSION_TTL_DAYS: i64 = 30;

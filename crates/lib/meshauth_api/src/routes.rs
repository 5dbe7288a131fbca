//! Route paths.

pub const GET_HEALTH: &str = "/health";
pub const POST_AUTH_REGISTER: &str = "/auth/register";
pub const POST_AUTH_LOGIN: &str = "/auth/login";
pub const GET_AUTH_VERIFY: &str = "/auth/verify";
pub const POST_AUTH_REFRESH: &str = "/auth/refresh";
pub const GET_AUTH_ME: &str = "/auth/me";

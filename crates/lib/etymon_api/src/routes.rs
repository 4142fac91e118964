//! Route paths.

pub const GET_HEALTH: &str = "/health";

pub const GET_AUTH_GOOGLE: &str = "/auth/google";
pub const GET_AUTH_GOOGLE_CALLBACK: &str = "/auth/google/callback";
pub const GET_AUTH_ME: &str = "/auth/me";
pub const GET_AUTH_LOGOUT: &str = "/auth/logout";
pub const GET_AUTH_STATUS: &str = "/auth/status";

pub const GET_ARTICLES_SUMMARY: &str = "/articles/summary";

pub const GET_ADMIN_STATUS: &str = "/admin/status";
pub const GET_ADMIN_USERS: &str = "/admin/users";
pub const POST_ADMIN_CONTENT: &str = "/admin/content";
pub const ADMIN_CONTENT_ID: &str = "/admin/content/{id}";

/// Client-side route receiving the token after a successful login.
pub const CLIENT_AUTH_CALLBACK: &str = "/auth-callback";
/// Client-side route shown when login fails.
pub const CLIENT_LOGIN: &str = "/login";

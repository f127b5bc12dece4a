//! Role names stored on `users.role`.

/// Full access: catalog management, manual sweeps, restocks, purchases.
pub const ROLE_ADMIN: &str = "admin";

/// Default role for self-registered accounts.
pub const ROLE_CUSTOMER: &str = "customer";

pub mod auth;
pub mod middleware;
pub mod rest;
pub mod state;

// Re-export the handlers the binary needs to build the web server router.
pub use middleware::require_auth;
pub use rest::{
    analyze_handler, generate_handler, get_profile_handler, list_documents_handler,
    put_profile_handler, subscription_handler, upgrade_handler,
};

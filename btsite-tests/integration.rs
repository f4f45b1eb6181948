//! Integration tests for btsite
//!
//! These tests drive clients built by the factory against a scripted engine
//! and check the behaviour callers rely on across both architectures.

#[path = "integration/fixtures.rs"]
mod fixtures;

#[path = "integration/config_reload.rs"]
mod config_reload;
#[path = "integration/factory_dispatch.rs"]
mod factory_dispatch;
#[path = "integration/pagination_safety.rs"]
mod pagination_safety;
#[path = "integration/sign_in_flow.rs"]
mod sign_in_flow;
#[path = "integration/site_requests.rs"]
mod site_requests;

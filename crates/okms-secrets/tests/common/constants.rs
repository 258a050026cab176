//! Shared test constants

pub const OKMS_ID: &str = "2b9ed1b0-5f8a-4d51-9bd5-6d2b5c1a7e10";
pub const TEST_TOKEN: &str = "test-okms-token";
pub const STORE_NAME: &str = "test-store";

/// Error code OKMS answers with for a missing secret
pub const NOT_FOUND_CODE: u32 = 17125377;

/// Error code OKMS answers with for a stale CAS version
pub const CAS_MISMATCH_CODE: u32 = 17125380;

/// API prefix every endpoint lives under
pub fn api_prefix() -> String {
    format!("/api/{}/v2", OKMS_ID)
}

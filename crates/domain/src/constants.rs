//! Application constants
//!
//! Centralized location for endpoint paths, wire literals and defaults used
//! throughout the workspace.

// Connection defaults
pub const DEFAULT_BASE_URL: &str = "https://opensupplyhub.org";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_THROTTLE_BUDGET_SECS: f64 = 30.0;
pub const HEALTH_CHECK_TIMEOUT_SECS: u64 = 5;

// Throttling
pub const THROTTLE_FALLBACK_DELAY_SECS: f64 = 1.0;
pub const THROTTLE_PHRASE: &str = "Expected available in";

// Credential keys (environment variables and YAML credential files)
pub const ENV_URL_KEY: &str = "OSH_URL";
pub const ENV_TOKEN_KEY: &str = "OSH_TOKEN";
pub const DEFAULT_CREDENTIALS_FILE: &str = "./.env.yml";

// Endpoints
pub const HEALTH_CHECK_PATH: &str = "/health-check/";
pub const FACILITIES_PATH: &str = "/api/facilities/";
pub const FACILITIES_COUNT_PATH: &str = "/api/facilities/count/";
pub const FACILITY_MATCHES_PATH: &str = "/api/facility-matches/";
pub const COUNTRIES_PATH: &str = "/api/countries/";
pub const COUNTRIES_ACTIVE_COUNT_PATH: &str = "/api/countries/active_count/";
pub const CONTRIBUTORS_PATH: &str = "/api/contributors/";
pub const CONTRIBUTORS_ACTIVE_COUNT_PATH: &str = "/api/contributors/active_count/";
pub const CONTRIBUTOR_TYPES_PATH: &str = "/api/contributor-types/";
pub const CONTRIBUTOR_LISTS_PATH: &str = "/api/contributor-lists/";
pub const SECTORS_PATH: &str = "/api/sectors/";
pub const PRODUCT_TYPES_PATH: &str = "/api/product-types/";
pub const FACILITY_PROCESSING_TYPES_PATH: &str = "/api/facility-processing-types/";
pub const PARENT_COMPANIES_PATH: &str = "/api/parent-companies/";
pub const WORKERS_RANGES_PATH: &str = "/api/workers-ranges/";
pub const FACILITIES_DOWNLOADS_PATH: &str = "/api/facilities-downloads/";
pub const CONTRIBUTOR_EMBED_CONFIGS_PATH: &str = "/api/contributor-embed-configs/";

// Facility record defaults
pub const DEFAULT_SECTOR: &str = "Unspecified";
pub const REQUIRED_COLUMNS: [&str; 3] = ["name", "address", "country"];

// Bulk result columns
pub const COLUMN_STATUS: &str = "status";
pub const COLUMN_OS_ID: &str = "os_id";
pub const COLUMN_MATCHES: &str = "matches";
pub const COLUMN_ERROR: &str = "error";
pub const COLUMN_DIAGNOSIS: &str = "diagnosis";
pub const COLUMN_CLEANSED: &str = "cleansed";
pub const DIAGNOSIS_VALID: &str = "VALID";

// Workers ranges: open-ended upper bound for "More than N"
pub const WORKERS_RANGE_UNBOUNDED: i64 = 999_999;

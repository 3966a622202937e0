// Constants module - centralized default values for configuration
//
// Every default used by the config structs lives here so that the YAML
// defaults, the in-code defaults and the tests agree on one value.

// =============================================================================
// Server defaults
// =============================================================================

/// Default bind address
pub const DEFAULT_ADDRESS: &str = "localhost";

/// Default listen port
pub const DEFAULT_PORT: u16 = 8080;

/// Default number of worker threads
pub const DEFAULT_THREADS: usize = 4;

/// Default maximum request body size (32 MB)
pub const DEFAULT_MAX_BODY_SIZE: usize = 32 * 1024 * 1024;

/// Default number of transforms allowed to run at once
pub const DEFAULT_MAX_CONCURRENT_TRANSFORMS: usize = 8;

// =============================================================================
// CORS defaults
// =============================================================================

/// Origin wildcard accepted by the CORS policy
pub const CORS_ANY_ORIGIN: &str = "*";

/// Methods allowed by the default CORS policy
pub const DEFAULT_CORS_METHODS: &[&str] = &["GET", "POST", "OPTIONS"];

/// Request headers allowed on preflight by default
pub const DEFAULT_CORS_HEADERS: &[&str] = &["Origin", "Accept", "Content-Type", "X-Requested-With"];

// =============================================================================
// Storage defaults
// =============================================================================

/// Default directory receiving transformed images
pub const DEFAULT_IMAGE_DIR: &str = "image_folder";

// =============================================================================
// Image defaults
// =============================================================================

/// JPEG quality used when re-encoding (1-100)
pub const DEFAULT_JPEG_QUALITY: u8 = 90;

/// PNG compression level used when re-encoding (0-9, 0 = fastest)
pub const DEFAULT_PNG_COMPRESSION_LEVEL: u8 = 0;

/// Maximum requested output width
pub const DEFAULT_MAX_WIDTH: u32 = 8192;

/// Maximum requested output height
pub const DEFAULT_MAX_HEIGHT: u32 = 8192;

/// Maximum decoded source size in pixels (100 megapixels)
pub const DEFAULT_MAX_SOURCE_PIXELS: u64 = 100_000_000;

// =============================================================================
// Upload contract
// =============================================================================

/// Multipart field carrying the uploaded image
pub const FILE_FIELD: &str = "file";

/// Message returned with 415 responses
pub const UNSUPPORTED_IMAGE_MESSAGE: &str = "Unsupported image type";

//! Application-wide constants
//!
//! This module contains all magic numbers and string literals used throughout
//! the application, providing a single source of truth for constant values.

/// Window filtering constants
pub mod filter {
    /// Windows narrower or shorter than this are always excluded
    pub const MIN_WINDOW_DIMENSION: i64 = 40;

    /// Label used when a rule body carries no criteria at all
    pub const EMPTY_BODY_LABEL: &str = "empty filter";
}

/// Configuration file and store keys
pub mod config {
    /// Directory under the XDG config dir
    pub const APP_DIR: &str = "taskbar-filter";

    /// Config file name
    pub const FILENAME: &str = "config.json";

    /// Environment variable overriding the config file path
    pub const PATH_ENV: &str = "TASKBAR_FILTER_CONFIG";

    /// Store key holding the rule collection
    pub const FILTERS_KEY: &str = "filters";

    /// Store key holding the rule collection format marker
    pub const FORMAT_KEY: &str = "filtersFormat";

    /// Marker value written once the collection is in the labeled shape
    pub const LABELED_FORMAT: &str = "labeled";
}

/// X11 and /proc constants used by the window source
pub mod x11 {
    /// Max length (in 32-bit units) requested for string properties
    pub const MAX_PROPERTY_LENGTH: u32 = 1024;

    /// Page size used to convert /proc/<pid>/statm pages into bytes
    pub const PAGE_SIZE: i64 = 4096;
}

use thiserror::Error;

/// Main error type for the GridLine system
#[derive(Error, Debug)]
pub enum GlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Data error: {0}")]
    Data(#[from] DataError),

    #[error("Simulation error: {0}")]
    Sim(#[from] SimError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Configuration-related errors. Fatal at startup: there is no sensible
/// default to fall back to when the parameter universe is malformed.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing configuration file: {path}")]
    MissingFile { path: String },

    #[error("Unknown parameter: {name}")]
    UnknownParameter { name: String },

    #[error("No draft order file for index {index} under {dir}")]
    MissingBackingFile { index: i64, dir: String },

    #[error("Invalid value for {parameter}: {message}")]
    InvalidValue { parameter: String, message: String },

    #[error("Malformed configuration document: {message}")]
    MalformedDocument { message: String },

    #[error(
        "Found {count} legacy intermediate_*.json file(s) in {dir}; \
         delete them manually before rerunning"
    )]
    LegacyArtifacts { count: usize, dir: String },
}

/// Historical-data errors. One bad season is skipped with a warning; zero
/// usable seasons is fatal.
#[derive(Error, Debug)]
pub enum DataError {
    #[error("No valid season data found under {root}")]
    NoValidSeasons { root: String },

    #[error("Season {season} missing required structure: {missing}")]
    MissingStructure { season: String, missing: String },

    #[error("Season {season} has {found} draftable players, need {required}")]
    InsufficientPlayers {
        season: String,
        found: usize,
        required: usize,
    },

    #[error("Data parsing error: {message}")]
    ParseError { message: String },
}

/// Per-simulation errors. Caught and excluded from the batch aggregate;
/// never aborts sibling simulations.
#[derive(Error, Debug)]
pub enum SimError {
    #[error("Config not registered: {config_id}")]
    ConfigNotRegistered { config_id: String },

    #[error("Draft failed: {message}")]
    DraftFailed { message: String },

    #[error("Season failed at week {week}: {message}")]
    SeasonFailed { week: u8, message: String },

    #[error("Invalid week number: {week} (must be 1-17)")]
    InvalidWeek { week: u8 },
}

/// Result type alias for GridLine operations
pub type GlResult<T> = Result<T, GlError>;

/// Macro for creating validation errors
#[macro_export]
macro_rules! validation_error {
    ($($arg:tt)*) => {
        $crate::GlError::Validation(format!($($arg)*))
    };
}

/// Macro for creating internal errors
#[macro_export]
macro_rules! internal_error {
    ($($arg:tt)*) => {
        $crate::GlError::Internal(format!($($arg)*))
    };
}

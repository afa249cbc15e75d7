use std::fmt;

#[derive(Debug)]
pub enum CleanError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (empty input path, unsafe vocabulary alias, etc.).
    ConfigValidation(String),
    /// Input table lacks one or more required columns. Fatal for the whole run.
    MissingColumns { table: String, columns: Vec<String> },
    /// CSV framing error while reading an input table.
    Csv { table: String, message: String },
    /// IO error (file read, etc.).
    Io(String),
}

impl fmt::Display for CleanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::MissingColumns { table, columns } => {
                write!(f, "{table}: missing columns {}", columns.join(", "))
            }
            Self::Csv { table, message } => write!(f, "{table}: CSV error: {message}"),
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for CleanError {}

use std::time::Duration;

/// Settings for one session. There is no configuration file and no
/// command line; callers start from [`Config::default`] and override fields.
#[derive(Clone, Debug)]
pub struct Config {
    /// Timeout for downloading remote spreadsheets
    pub http_timeout: Duration,
    /// User agent sent with remote requests
    pub user_agent: String,
    /// Number of rows shown when previewing a table
    pub preview_rows: usize,
    /// File name of the exported workbook
    pub output_file_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            http_timeout: Duration::from_secs(60),
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_owned(),
            preview_rows: 5,
            output_file_name: crate::table::export::FILE_NAME.to_owned(),
        }
    }
}

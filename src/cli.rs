use clap::Parser;

/// Command-line arguments for diag-collector.
///
/// The only input is the run identifier. Output location, archival and
/// tool installation are set through the configuration file and
/// `DIAG_COLLECTOR_*` environment variables.
#[derive(Parser, Debug)]
#[clap(
    name = "diag-collector",
    version,
    about = "Collect Linux system, hardware and GPU diagnostics into a single directory"
)]
pub struct Args {
    /// Run identifier; names the output directory and every file in it
    /// (letters, digits, '-' and '_')
    #[clap(value_parser = parse_identifier)]
    pub identifier: String,
}

/// Validate a run identifier.
///
/// The identifier becomes a directory name and part of every file name, so
/// it is limited to ASCII alphanumerics, `-` and `_`.
pub fn parse_identifier(value: &str) -> Result<String, String> {
    if value.is_empty() {
        return Err("identifier must not be empty".to_string());
    }

    match value
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
    {
        Some(c) => Err(format!(
            "invalid character {:?} in identifier (allowed: letters, digits, '-' and '_')",
            c
        )),
        None => Ok(value.to_string()),
    }
}

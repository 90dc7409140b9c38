//! CLI argument definitions using clap derive macros.

use clap::Parser;
use wget_core::RunOptions;

/// Retrieve files over HTTP, one at a time, from a list, or as a shallow site mirror.
///
/// With a URL the file is saved into the download directory. `-i` reads URLs
/// from a file, `--mirror` saves a page with the assets it references.
#[derive(Parser, Debug)]
#[command(name = "wget")]
#[command(author, version, about)]
pub struct Args {
    /// Increase diagnostic verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only report errors in diagnostics
    #[arg(short, long)]
    pub quiet: bool,

    /// Download in the background, writing output to 'wget-log'
    #[arg(short = 'B', long)]
    pub background: bool,

    /// Save the file under a different name
    #[arg(short = 'O', long = "output-document", value_name = "NAME")]
    pub output_document: Option<String>,

    /// Directory to save files in (a leading ~ is the home directory)
    #[arg(short = 'P', long = "directory-prefix", value_name = "DIR")]
    pub directory_prefix: Option<String>,

    /// Maximum write speed, e.g. 400k or 2M (bytes per second)
    #[arg(long, value_name = "RATE")]
    pub rate_limit: Option<String>,

    /// File with one URL per line to download
    #[arg(short = 'i', long = "input-file", value_name = "FILE")]
    pub input_file: Option<String>,

    /// Mirror the page at URL and the assets it references
    #[arg(long)]
    pub mirror: bool,

    /// Comma-separated suffixes to skip while mirroring (e.g. .gif,.css)
    #[arg(short = 'R', long, value_name = "LIST")]
    pub reject: Option<String>,

    /// Comma-separated path prefixes to skip while mirroring (e.g. /img)
    #[arg(short = 'X', long = "exclude-directories", value_name = "LIST")]
    pub exclude_directories: Option<String>,

    /// Check the mirrored page's HTTP status before saving anything
    #[arg(long)]
    pub strict_status: bool,

    /// URL to download or mirror
    pub url: Option<String>,
}

impl Args {
    /// Raw option values for [`wget_core::RunConfig::resolve`].
    #[must_use]
    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            url: self.url.clone(),
            background: self.background,
            output_document: self.output_document.clone(),
            directory_prefix: self.directory_prefix.clone(),
            rate_limit: self.rate_limit.clone(),
            input_file: self.input_file.clone(),
            mirror: self.mirror,
            reject: self.reject.clone(),
            exclude_directories: self.exclude_directories.clone(),
            strict_status: self.strict_status,
        }
    }
}

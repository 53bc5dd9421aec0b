use clap::Parser;
use reconsage::config::ScanDefaults;

fn default_concurrency() -> u16 {
    ScanDefaults::default().concurrency
}

fn default_timeout_secs() -> u64 {
    ScanDefaults::default().timeout_secs
}

#[derive(clap::Parser, Debug)]
#[command(
    author,
    version,
    about = "reconsage - adaptive HTTP(S) recon scanner",
    long_about = None,
    after_help = "EXAMPLES:
  Directory scan:
    reconsage scan https://target.tld --wordlist common.txt

  WAF/CDN fingerprinting:
    reconsage waf-scan https://target.tld --wordlist waf-probes.txt

  Rate-limit detection:
    reconsage rate-scan https://target.tld --domains seed.txt --user-paths paths.txt

  False-positive analysis of a prior directory scan:
    reconsage fp-scan --json-file-to-read run/directory_scans/report.json"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable detailed debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Enable verbose output
    #[arg(long, global = true)]
    pub verbose: bool,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Directory scan: enumerate reachable endpoints from a wordlist (C9/directory)
    Scan {
        /// Target base URL, e.g. https://example.com
        target: String,

        /// Path to a wordlist of path suffixes
        #[arg(long)]
        wordlist: String,

        /// Optional second wordlist, concatenated (no deduplication)
        #[arg(long)]
        wordlist_2: Option<String>,

        /// Output directory hint (folder_hint for the report sink)
        #[arg(short = 'o', long)]
        json_file_path: Option<String>,

        /// Report filename
        #[arg(long, default_value = "directory_scan.json")]
        json_file_name: String,

        /// Starting concurrency budget, adjusted by the AIMD governor
        #[arg(short = 'c', long, default_value_t = default_concurrency())]
        concurrency: u16,

        /// Per-request timeout in seconds
        #[arg(long, default_value_t = default_timeout_secs())]
        timeout: u64,
    },

    /// WAF/CDN fingerprint scan (≤10 paths) (C9/waf)
    WafScan {
        target: String,

        /// Path to a wordlist of path suffixes (truncated to 10)
        #[arg(long)]
        wordlist: String,

        #[arg(short = 'o', long)]
        json_file_path: Option<String>,

        #[arg(long, default_value = "waf_scan.json")]
        json_file_name: String,

        #[arg(short = 'c', long, default_value_t = default_concurrency())]
        concurrency: u16,

        #[arg(long, default_value_t = default_timeout_secs())]
        timeout: u64,
    },

    /// Rate-limit detection scan (C9/rate-limit)
    RateScan {
        target: String,

        /// Wordlist of warm-up seed paths (≤5)
        #[arg(long)]
        domains: String,

        /// Wordlist of main-batch paths
        #[arg(long)]
        user_paths: String,

        #[arg(short = 'o', long)]
        json_file_path: Option<String>,

        #[arg(long, default_value = "ratelimit_scan.json")]
        json_file_name: String,

        #[arg(short = 'c', long, default_value_t = default_concurrency())]
        concurrency: u16,

        #[arg(long, default_value_t = default_timeout_secs())]
        timeout: u64,
    },

    /// False-positive cluster analysis, either over a prior directory
    /// scan report or a live list of URLs (C9/fp)
    FpScan {
        #[arg(long)]
        json_file_to_read: Option<String>,

        /// Newline-delimited file of full URLs to re-probe live
        #[arg(long)]
        targets_file: Option<String>,

        #[arg(short = 'o', long)]
        json_full_path: Option<String>,

        #[arg(long, default_value = "fp_analysis.json")]
        json_file_name: String,

        #[arg(short = 'c', long, default_value_t = default_concurrency())]
        concurrency: u16,

        #[arg(long, default_value_t = default_timeout_secs())]
        timeout: u64,
    },
}

pub fn parse_cli() -> Cli {
    Cli::parse()
}

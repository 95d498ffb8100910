use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use openqe_tls::files::{self, CaCache};
use openqe_tls::options::{CaOptions, PkiOptions, TlsConfig};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "openqe-tls")]
#[command(about = "TLS oriented test utilities")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// TOML file overriding the built-in defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate CA key/cert pair to files
    CaGen(CaArgs),

    /// Generate TLS key/cert pair to files, signed by a given CA.
    ///
    /// The CA key/cert files must exist; `ca-gen` creates a pair for testing.
    CertGen {
        #[command(flatten)]
        ca: CaArgs,

        /// The TLS certificate subject
        #[arg(long)]
        subject: Option<String>,

        /// The SAN added to the TLS certificate
        #[arg(long)]
        dns_name: Option<String>,

        /// The file path of the TLS private key to be generated to
        #[arg(long)]
        tls_key_file: Option<PathBuf>,

        /// The file path of the TLS certificate to be generated to
        #[arg(long)]
        tls_cert_file: Option<PathBuf>,
    },

    /// Check if a CA certificate is included in a CA bundle file.
    ///
    /// Exits 0 when the certificate is found in the bundle and 1 otherwise.
    CaCheck {
        /// The CA certificate file to check
        #[arg(long)]
        ca_cert_file: Option<PathBuf>,

        /// The CA bundle file to check against
        #[arg(long)]
        ca_bundle_file: Option<PathBuf>,
    },
}

#[derive(Args)]
struct CaArgs {
    /// The CA certificate subject used to generate the TLS CA
    #[arg(long)]
    ca_subject: Option<String>,

    /// The SAN used to generate the TLS CA
    #[arg(long)]
    ca_dns_name: Option<String>,

    /// The CA private key file path
    #[arg(long)]
    ca_key_file: Option<PathBuf>,

    /// The CA certificate file path
    #[arg(long)]
    ca_cert_file: Option<PathBuf>,
}

impl CaArgs {
    fn apply(self, opts: &mut CaOptions) {
        if let Some(subject) = self.ca_subject {
            opts.subject = subject;
        }
        if let Some(dns_name) = self.ca_dns_name {
            opts.dns_name = dns_name;
        }
        if let Some(key_file) = self.ca_key_file {
            opts.key_file = key_file;
        }
        if let Some(cert_file) = self.ca_cert_file {
            opts.cert_file = cert_file;
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    initialise_logging(cli.verbose);

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Runs the selected command. `Ok(false)` is a negative `ca-check` outcome.
fn run(cli: Cli) -> anyhow::Result<bool> {
    let config = match &cli.config {
        Some(path) => TlsConfig::load(path)?,
        None => TlsConfig::default(),
    };

    match cli.command {
        Commands::CaGen(args) => {
            let mut opts = config.ca_options();
            args.apply(&mut opts);
            files::generate_ca_to_files(&opts)
                .context("Failed to generate the CA key/cert pair")?;
        }
        Commands::CertGen {
            ca,
            subject,
            dns_name,
            tls_key_file,
            tls_cert_file,
        } => {
            let mut opts: PkiOptions = config.pki_options();
            ca.apply(&mut opts.ca);
            if let Some(subject) = subject {
                opts.subject = subject;
            }
            if let Some(dns_name) = dns_name {
                opts.dns_name = dns_name;
            }
            if let Some(key_file) = tls_key_file {
                opts.key_file = key_file;
            }
            if let Some(cert_file) = tls_cert_file {
                opts.cert_file = cert_file;
            }

            let mut cache = CaCache::new();
            files::generate_tls_key_cert_pair_to_files(&opts, &mut cache)
                .context("Failed to generate the TLS key/cert pair")?;
        }
        Commands::CaCheck {
            ca_cert_file,
            ca_bundle_file,
        } => {
            let mut opts = config.check_options();
            if let Some(cert_file) = ca_cert_file {
                opts.cert_file = cert_file;
            }
            if let Some(bundle_file) = ca_bundle_file {
                opts.bundle_file = bundle_file;
            }
            anyhow::ensure!(
                !opts.cert_file.as_os_str().is_empty(),
                "--ca-cert-file is required"
            );
            anyhow::ensure!(
                !opts.bundle_file.as_os_str().is_empty(),
                "--ca-bundle-file is required"
            );

            let found = files::check_ca_cert_in_bundle(&opts.cert_file, &opts.bundle_file)
                .context("Error checking CA certificate in bundle")?;
            if !found {
                eprintln!("CA certificate NOT found in bundle");
                return Ok(false);
            }
            info!("CA certificate found in bundle");
        }
    }
    Ok(true)
}

fn initialise_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    if tracing::subscriber::set_global_default(
        FmtSubscriber::builder().with_env_filter(filter).finish(),
    )
    .is_err()
    {
        // Subscriber already installed; keep it.
    }
}

//! One-time administrative push of the media bucket's CORS policy.

use clap::Parser;
use fairlist_api::config::{DEFAULT_BUCKET, DEFAULT_REGION};
use fairlist_api::storage::{apply_bucket_cors, CorsPolicy};
use tracing_subscriber::EnvFilter;

/// Allow browsers to upload directly to the Fairlist media bucket.
#[derive(Parser)]
#[command(name = "fairlist-bucket-cors")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Bucket to configure
    #[arg(short, long, default_value = DEFAULT_BUCKET)]
    bucket: String,

    /// AWS region of the bucket
    #[arg(short, long, default_value = DEFAULT_REGION)]
    region: String,

    /// Allowed origin; repeat for several (default: any origin)
    #[arg(short, long = "origin")]
    origins: Vec<String>,

    /// Seconds browsers may cache the preflight response
    #[arg(long, default_value_t = 3000)]
    max_age: i32,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let mut policy = CorsPolicy {
        max_age_secs: cli.max_age,
        ..CorsPolicy::default()
    };
    if !cli.origins.is_empty() {
        policy.allowed_origins = cli.origins;
    }

    let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(aws_config::Region::new(cli.region))
        .load()
        .await;
    let client = aws_sdk_s3::Client::new(&sdk_config);

    println!("Applying CORS policy to {}...", cli.bucket);

    if let Err(e) = apply_bucket_cors(&client, &cli.bucket, &policy).await {
        eprintln!("Error: {e}");
        eprintln!("Check that the bucket name and region are correct.");
        std::process::exit(1);
    }

    println!(
        "Bucket {} now accepts {} from {}",
        cli.bucket,
        policy.allowed_methods.join("/"),
        policy.allowed_origins.join(", ")
    );
}

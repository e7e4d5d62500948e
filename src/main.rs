use anyhow::Context;
use clap::{Parser, Subcommand};
use http::Method;
use kasasagi::config::Config;
use kasasagi::files::format_size;
use kasasagi::s3::RequestDescriptor;
use kasasagi::StoreClient;
use std::path::PathBuf;

/// Kasasagi - SigV4 signing and listing for S3-compatible stores
#[derive(Parser, Debug)]
#[command(name = "kasasagi")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List buckets
    Buckets,

    /// List folders and files under a prefix
    Ls {
        bucket: String,
        #[arg(default_value = "")]
        prefix: String,
        /// Follow continuation tokens until the listing is complete
        #[arg(long)]
        all: bool,
        /// Print the listing as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print a presigned GET URL for an object
    Presign {
        bucket: String,
        key: String,
        /// Validity in seconds (defaults to presign.expires_in)
        #[arg(long)]
        expires: Option<u64>,
    },

    /// Print content type and length of an object
    Head { bucket: String, key: String },

    /// Print the signed headers for a request without sending it
    Sign { method: String, url: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = Config::from_file(&args.config)
        .with_context(|| format!("Failed to load configuration from {}", args.config.display()))?;

    kasasagi::logging::init_subscriber(&config.logging)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging subsystem: {}", e))?;

    tracing::debug!(
        config_file = %args.config.display(),
        endpoint = %config.store.endpoint,
        region = %config.store.region,
        "Configuration loaded successfully"
    );

    let client = StoreClient::with_http(&config)?;

    match args.command {
        Command::Buckets => {
            for bucket in client.list_buckets().await? {
                println!("{}\t{}", bucket.creation_date, bucket.name);
            }
        }
        Command::Ls {
            bucket,
            prefix,
            all,
            json,
        } => {
            let listing = if all {
                client.list_all_objects(&bucket, &prefix).await?
            } else {
                client.list_objects(&bucket, &prefix, None).await?
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&listing)?);
            } else {
                for folder in &listing.folders {
                    println!("{:>10}  {:<12}  {:<7}  {}/", "-", "Folder", "", folder.name);
                }
                for file in &listing.files {
                    println!(
                        "{:>10}  {:<12}  {:<7}  {}",
                        format_size(file.size),
                        file.kind().label(),
                        if file.is_previewable() { "preview" } else { "" },
                        file.name
                    );
                }
                if listing.is_truncated {
                    if let Some(token) = &listing.next_continuation_token {
                        println!("... truncated, continuation token: {}", token);
                    }
                }
            }
        }
        Command::Presign {
            bucket,
            key,
            expires,
        } => {
            println!("{}", client.presigned_url(&bucket, &key, expires)?);
        }
        Command::Head { bucket, key } => {
            let meta = client.head_object(&bucket, &key).await?;
            println!("content-type: {}", meta.content_type);
            println!("content-length: {}", meta.content_length);
        }
        Command::Sign { method, url } => {
            let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())
                .context("Invalid HTTP method")?;
            let signed = client.signer().sign(&RequestDescriptor::new(method, url))?;
            for (name, value) in &signed.headers {
                println!("{}: {}", name, value);
            }
        }
    }

    Ok(())
}

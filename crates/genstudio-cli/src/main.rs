//! genstudio CLI: submit image edits and image-to-video jobs to the genstudio API.
//!
//! Set GENSTUDIO_TOKEN (session JWT) and optionally GENSTUDIO_API_URL.

use anyhow::Context;
use clap::{Parser, Subcommand};
use genstudio_cli::{init_tracing, progress_line, ApiClient, ApiJobSource, Provider};
use genstudio_providers::JobPoller;
use serde::Serialize;
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "genstudio", about = "genstudio API CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Edit an image with a text instruction (Replicate)
    EditImage {
        /// Image URL or storage path (`{user_id}/{project_id}/file.png`)
        #[arg(long)]
        image: String,
        /// Edit instruction
        #[arg(long)]
        prompt: String,
        #[arg(long)]
        aspect_ratio: Option<String>,
        /// Record the edit in this project
        #[arg(long)]
        project: Option<String>,
        /// Poll until the prediction finishes
        #[arg(long)]
        wait: bool,
    },
    /// Turn an image into a video (Runway)
    GenerateVideo {
        /// Image URL, storage path or data URI used as the first frame
        #[arg(long)]
        image: String,
        /// Output resolution, e.g. 1280:720
        #[arg(long)]
        ratio: String,
        /// Seconds: 5 or 10
        #[arg(long)]
        duration: Option<u32>,
        #[arg(long)]
        prompt: Option<String>,
        #[arg(long)]
        model: Option<String>,
        #[arg(long)]
        project: Option<String>,
        /// Poll until the task finishes
        #[arg(long)]
        wait: bool,
    },
    /// Show a job's state
    Status {
        #[arg(value_enum)]
        provider: Provider,
        /// Prediction or task id
        id: String,
        /// Poll until the job finishes
        #[arg(long)]
        wait: bool,
    },
    /// Sign storage paths
    Sign {
        #[arg(required = true)]
        paths: Vec<String>,
        /// Seconds (capped by the server)
        #[arg(long)]
        expires_in: Option<u64>,
    },
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}

fn job_id(response: &Value) -> anyhow::Result<String> {
    response["id"]
        .as_str()
        .map(str::to_string)
        .context("Response has no job id")
}

/// Poll the API until the job is terminal, printing a progress line per fetch.
async fn wait_for(client: &ApiClient, provider: Provider, id: &str) -> anyhow::Result<()> {
    let poller = JobPoller::new(provider.poll_config());
    let source = ApiJobSource::new(client, provider);

    let snapshot = poller
        .poll(&source, id, |snapshot| eprintln!("{}", progress_line(snapshot)))
        .await?;
    print_json(&snapshot)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let client = ApiClient::from_env()
        .context("Failed to create API client. Set GENSTUDIO_TOKEN and GENSTUDIO_API_URL")?;
    tracing::debug!(base_url = %client.base_url(), "API client ready");

    match cli.command {
        Commands::EditImage {
            image,
            prompt,
            aspect_ratio,
            project,
            wait,
        } => {
            let body = json!({
                "prompt": prompt,
                "input_image": image,
                "aspect_ratio": aspect_ratio,
                "project_id": project,
            });
            let response = client.edit_image(&body).await?;
            if wait {
                wait_for(&client, Provider::Replicate, &job_id(&response)?).await?;
            } else {
                print_json(&response)?;
            }
        }
        Commands::GenerateVideo {
            image,
            ratio,
            duration,
            prompt,
            model,
            project,
            wait,
        } => {
            let body = json!({
                "prompt_image": image,
                "ratio": ratio,
                "duration": duration,
                "prompt_text": prompt,
                "model": model,
                "project_id": project,
            });
            let response = client.generate_video(&body).await?;
            if wait {
                wait_for(&client, Provider::Runway, &job_id(&response)?).await?;
            } else {
                print_json(&response)?;
            }
        }
        Commands::Status { provider, id, wait } => {
            if wait {
                wait_for(&client, provider, &id).await?;
            } else {
                print_json(&client.job(provider, &id).await?)?;
            }
        }
        Commands::Sign { paths, expires_in } => {
            let response = client.sign(&paths, expires_in).await?;
            print_json(&response)?;
        }
    }

    Ok(())
}

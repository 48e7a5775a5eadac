mod cli;

use anyhow::Context;
use clap::Parser;
use cli::{Cli, Commands, ScanArgs, ScanOptions, UploadArgs};
use notebook_image_uploader::{
    scan_tree, GitHubUploader, NotebookPipeline, PipelineConfig, UploaderConfig,
};
use std::time::Duration;
use tracing::{error, info, Level};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    let result = match &cli.command {
        Commands::Upload(args) => handle_upload_command(args).await,
        Commands::Scan(args) => handle_scan_command(args).await,
    };

    if let Err(e) = result {
        error!("Operation failed: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

fn pipeline_config(options: &ScanOptions) -> PipelineConfig {
    PipelineConfig {
        min_payload_len: options.min_length,
        extension: options.extension.clone(),
        excluded_dir: options.exclude_dir.clone(),
        ..PipelineConfig::default()
    }
}

async fn handle_upload_command(args: &UploadArgs) -> anyhow::Result<()> {
    // Credentials are checked before any document is touched.
    let token = GitHubUploader::token_from_env(&args.token_env)?;

    let uploader = GitHubUploader::new(UploaderConfig {
        api_base: args.api_base.clone(),
        owner: args.owner.clone(),
        repo: args.repo.clone(),
        branch: args.branch.clone(),
        token,
    })
    .context("Failed to configure uploader")?;

    let config = PipelineConfig {
        image_folder: args.image_folder.clone(),
        throttle: Duration::from_millis(args.throttle_ms),
        ..pipeline_config(&args.scan)
    };

    info!(
        "Uploading images from {} to {}/{}@{}",
        args.scan.root.display(),
        args.owner,
        args.repo,
        args.branch
    );

    let pipeline = NotebookPipeline::new(uploader, config)?;
    let summary = pipeline.process_all(&args.scan.root).await?;

    println!("\n{}", "=".repeat(60));
    println!("Done!");
    println!("  Notebooks found:    {}", summary.documents_found);
    println!("  Notebooks modified: {}", summary.documents_modified);
    println!("  Images uploaded:    {}", summary.images_uploaded);
    println!("  Errors:             {}", summary.errors);
    println!("{}", "=".repeat(60));

    Ok(())
}

async fn handle_scan_command(args: &ScanArgs) -> anyhow::Result<()> {
    let config = pipeline_config(&args.scan);
    info!("Scanning {}", args.scan.root.display());

    let scans = scan_tree(&args.scan.root, &config).await?;

    let mut total_payloads = 0;
    let mut errors = 0;
    for scan in &scans {
        println!("\n=== {} ===", scan.path.display());
        if let Some(reason) = &scan.error {
            println!("Error: {}", reason);
            errors += 1;
            continue;
        }
        if scan.payloads.is_empty() {
            println!("No embedded images");
            continue;
        }
        for payload in &scan.payloads {
            let types = if payload.image_types.is_empty() {
                String::new()
            } else {
                format!(" [{}]", payload.image_types.join(", "))
            };
            println!(
                "  {:?}{}: {} chars, {} occurrence(s) -> {}",
                payload.form, types, payload.payload_len, payload.occurrences, payload.filename
            );
        }
        total_payloads += scan.payloads.len();
    }

    println!("\n=== Scan Summary ===");
    println!("Notebooks scanned: {}", scans.len());
    println!("Payloads found: {}", total_payloads);
    println!("Errors: {}", errors);

    if let Some(json_path) = &args.json_output {
        let report = serde_json::json!({
            "root": args.scan.root,
            "generated_at": chrono::Utc::now().to_rfc3339(),
            "documents": scans,
        });
        let json_content =
            serde_json::to_string_pretty(&report).context("Failed to serialize scan report")?;

        tokio::fs::write(json_path, json_content)
            .await
            .context("Failed to write JSON scan report")?;

        info!("Scan report written to: {}", json_path.display());
    }

    Ok(())
}

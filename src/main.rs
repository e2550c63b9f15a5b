mod cli;

use m4bforge::{config, conversion, server};
use m4bforge_av::{check_tools as probe_tools, EncodeJob, FfmpegEncoder, InputKind, MediaEncoder};
use m4bforge_common::{derive_intervals, Chapter};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::path::{Path, PathBuf};
use std::sync::Arc;

async fn start_server(
    host: String,
    port: u16,
    config_path: Option<&Path>,
) -> Result<()> {
    // Load config
    let mut config = config::load_config_or_default(config_path)?;

    // Override host/port from CLI
    config.server.host = host;
    config.server.port = port;

    tracing::info!("Starting m4bforge server");
    tracing::info!(
        "Server will listen on {}:{}",
        config.server.host,
        config.server.port
    );

    let encoder: Arc<dyn MediaEncoder> =
        Arc::new(FfmpegEncoder::new(config.tools.ffmpeg_path.clone()));

    server::start_server(config, encoder).await
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let debug_requests = matches!(cli.command, Commands::Web { debug: true, .. });

    // Respect RUST_LOG env var if set, otherwise use defaults based on flags
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "m4bforge=trace,m4bforge_av=trace,m4bforge_common=debug,tower_http=debug".to_string()
        } else if debug_requests {
            "m4bforge=debug,m4bforge_av=debug,tower_http=debug".to_string()
        } else {
            "m4bforge=info,m4bforge_av=info,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Web { host, port, .. } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(start_server(host, port, cli.config.as_deref()))
        }
        Commands::Convert {
            input,
            output,
            chapter,
            bitrate,
        } => convert_file(&input, &output, &chapter, bitrate, cli.config.as_deref()),
        Commands::CheckTools => check_tools(cli.config.as_deref()),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
    }
}

/// Turn the flat `--chapter TITLE START` value list into derived chapters.
fn parse_cli_chapters(values: &[String]) -> Result<Vec<Chapter>> {
    let chapters = values
        .chunks(2)
        .map(|pair| match pair {
            [title, start] => Chapter::parse(title.as_str(), start.as_str())
                .with_context(|| format!("Invalid time format for chapter '{}'", title)),
            _ => anyhow::bail!("Each --chapter needs a TITLE and a START_TIME"),
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(derive_intervals(chapters))
}

fn convert_file(
    input: &Path,
    output: &Path,
    chapter_args: &[String],
    bitrate: Option<String>,
    config_path: Option<&Path>,
) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;

    if !input.exists() {
        anyhow::bail!("Input file '{}' not found", input.display());
    }

    let kind = InputKind::from_extension(input).with_context(|| {
        format!(
            "Unsupported input file '{}'. Only MP3 and M3U8 files are allowed.",
            input.display()
        )
    })?;

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory {:?}", parent))?;
    }

    let encoder = FfmpegEncoder::new(config.tools.ffmpeg_path.clone());
    if !encoder.check().available {
        anyhow::bail!(
            "FFmpeg is not installed or not in PATH. Install it from https://ffmpeg.org/download.html"
        );
    }

    let chapters = parse_cli_chapters(chapter_args)?;

    for chapter in &chapters {
        tracing::debug!(
            "Chapter {:?}: {} -> {:?}",
            chapter.title,
            chapter.start_time,
            chapter.end_time
        );
    }

    let job = EncodeJob::new(input, PathBuf::from(output), kind)
        .with_chapters(chapters)
        .with_bitrate(bitrate);

    println!("Converting: {} -> {}", input.display(), output.display());

    let rt = tokio::runtime::Runtime::new()?;
    let produced = rt.block_on(conversion::convert(&encoder, &config.conversion, &job))?;

    println!("✓ Conversion complete: {}", output.display());
    tracing::info!("Wrote {} bytes to {:?}", produced.size, produced.path);

    Ok(())
}

fn check_tools(config_path: Option<&Path>) -> Result<()> {
    println!("Checking external tools...\n");

    let config = config::load_config_or_default(config_path)?;
    let tools = probe_tools(config.tools.ffmpeg_path.as_deref());
    let mut all_ok = true;

    for tool in &tools {
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.name);

        if let Some(ref version) = tool.version {
            print!(" ({})", version.lines().next().unwrap_or(""));
        }

        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }

        println!();
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
    } else {
        println!("FFmpeg is missing. Install it to enable conversions.");
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            config
        }
        None => {
            println!("No config file specified, using defaults");
            config::Config::default()
        }
    };

    println!("  Server: {}:{}", config.server.host, config.server.port);
    println!("  Max upload: {}MB", config.server.max_upload_mb);
    println!(
        "  FFmpeg: {}",
        config
            .tools
            .ffmpeg_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(PATH)".to_string())
    );
    println!(
        "  Audio: {} ({} for MP3, {} for M3U8)",
        config.conversion.audio_codec, config.conversion.mp3_bitrate, config.conversion.m3u8_bitrate
    );

    Ok(())
}

//! CLI entry point for the Kling tool suite.
//!
//! Lists tools, validates credentials, and invokes a tool with JSON
//! parameters, printing the emitted message stream and saving any
//! downloaded media to an output directory.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde_json::{json, Value};

use kling_tools::config::{Credentials, DEFAULT_BASE_URL};
use kling_tools::emit::{MessageSink, ToolMessage};
use kling_tools::media::MediaInput;
use kling_tools::provider::validate_credentials;
use kling_tools::tools::{ToolContext, ToolRegistry};
use kling_tools::utils::{pretty_json, write_bytes};

#[derive(Parser)]
#[command(name = "kling", version, about = "Kling AI generative media tools")]
struct Cli {
    /// Kling access key (falls back to KLING_ACCESS_KEY)
    #[arg(long, global = true)]
    access_key: Option<String>,

    /// Kling secret key (falls back to KLING_SECRET_KEY)
    #[arg(long, global = true)]
    secret_key: Option<String>,

    /// API base URL override
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the available tools
    List,
    /// Validate the configured credentials against the live API
    Validate,
    /// Invoke a tool with JSON parameters
    Invoke {
        /// Tool name (see `kling list`)
        tool: String,

        /// Tool parameters as a JSON object. String values of the form
        /// "@path" are read from disk and sent as base64 media.
        #[arg(long)]
        params: Option<String>,

        /// Directory for downloaded media files
        #[arg(long, default_value = "kling-output")]
        output_dir: PathBuf,
    },
}

/// Prints the message stream and tracks whether any failure was reported.
struct CliSink {
    output_dir: PathBuf,
    failed: bool,
}

impl MessageSink for CliSink {
    fn emit(&mut self, message: ToolMessage) {
        match message {
            ToolMessage::Text(text) => {
                if text.starts_with('❌') {
                    self.failed = true;
                    eprintln!("{}", text.red());
                } else {
                    println!("{text}");
                }
            }
            ToolMessage::Json(value) => println!("{}", pretty_json(&value).dimmed()),
            ToolMessage::Blob {
                filename, bytes, ..
            } => {
                let path = self.output_dir.join(&filename);
                match write_bytes(&path, &bytes) {
                    Ok(()) => println!("{}", format!("Saved {}", path.display()).green()),
                    Err(e) => {
                        self.failed = true;
                        eprintln!("{}", format!("❌ {e:#}").red());
                    }
                }
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let credentials = Credentials::resolve(cli.access_key, cli.secret_key);
    let base_url = cli
        .base_url
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

    match cli.command {
        Commands::List => {
            let registry = ToolRegistry::with_defaults();
            for name in registry.names() {
                if let Some(tool) = registry.get(name) {
                    println!("{}  {}", name.bold(), tool.description());
                }
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Validate => {
            validate_credentials(&credentials, &base_url).await?;
            println!("{}", "Credentials accepted.".green());
            Ok(ExitCode::SUCCESS)
        }
        Commands::Invoke {
            tool,
            params,
            output_dir,
        } => {
            let registry = ToolRegistry::with_defaults();
            let Some(tool_impl) = registry.get(&tool) else {
                bail!("unknown tool '{tool}'; run `kling list`");
            };

            let mut params_value: Value = match params {
                Some(raw) => {
                    serde_json::from_str(&raw).context("--params must be valid JSON")?
                }
                None => json!({}),
            };
            resolve_local_media(&mut params_value)?;

            let context = ToolContext::new(credentials).with_base_url(base_url);
            let mut sink = CliSink {
                output_dir,
                failed: false,
            };
            tool_impl.invoke(&context, &params_value, &mut sink).await;

            if sink.failed {
                Ok(ExitCode::FAILURE)
            } else {
                Ok(ExitCode::SUCCESS)
            }
        }
    }
}

/// Replace `@path` string parameters with base64 of the file's contents, so
/// local media can be passed where the API expects base64 or a URL.
fn resolve_local_media(params: &mut Value) -> Result<()> {
    let Some(map) = params.as_object_mut() else {
        return Ok(());
    };
    for value in map.values_mut() {
        expand_media_value(value)?;
    }
    Ok(())
}

fn expand_media_value(value: &mut Value) -> Result<()> {
    match value {
        Value::String(s) if s.starts_with('@') => {
            let path = &s[1..];
            let bytes = std::fs::read(path)
                .with_context(|| format!("Failed to read media file: {path}"))?;
            let encoded = MediaInput::Bytes(bytes)
                .resolve()
                .map_err(|e| anyhow!(e))?
                .unwrap_or_default();
            *value = Value::String(encoded);
        }
        Value::Array(items) => {
            for item in items {
                expand_media_value(item)?;
            }
        }
        _ => {}
    }
    Ok(())
}

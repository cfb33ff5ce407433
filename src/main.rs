use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use codecontext::config::{self, ProjectConfig};
use codecontext::graph::{GraphBuilder, ProgressConfig};
use codecontext::mcp::{McpServer, ServerSettings};
use codecontext::semantic::SemanticConfig;

/// Code graph analysis with an MCP server for AI assistants.
#[derive(Parser)]
#[command(name = "codecontext", about = "Code graph analysis with an MCP server")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize project configuration under .codecontext/
    Init {
        /// Project path (default: current directory)
        path: Option<String>,
    },
    /// Analyze a directory and print a summary
    Analyze {
        /// Project path (default: current directory)
        path: Option<String>,
        /// Extra exclude patterns; '!' prefix re-includes matches
        #[arg(short, long)]
        exclude: Vec<String>,
        /// Disable the built-in default exclude list
        #[arg(long)]
        no_default_excludes: bool,
        /// Output the full graph metadata as JSON
        #[arg(short, long)]
        json: bool,
    },
    /// Start the MCP server on stdio
    Serve {
        /// Project path served as the default target (default: current directory)
        path: Option<String>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("❌ Error: {}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> codecontext::Result<()> {
    match cli.command {
        Commands::Init { path } => {
            let project_path = resolve_path(path);
            let config = ProjectConfig {
                root_dir: project_path.to_string_lossy().to_string(),
                ..ProjectConfig::default()
            };
            config::save_config(&project_path, &config)?;
            println!(
                "✅ Initialized configuration at {}",
                config::get_config_path(&project_path).display()
            );
        }
        Commands::Analyze {
            path,
            exclude,
            no_default_excludes,
            json,
        } => {
            let project_path = resolve_path(path);
            let config = config::load_config(&project_path)?;

            let mut builder = GraphBuilder::new();
            let mut patterns = config.exclude.clone();
            patterns.extend(exclude);
            builder.set_exclude_patterns(patterns);
            builder.set_use_default_excludes(config.use_default_excludes && !no_default_excludes);
            builder.set_progress_config(ProgressConfig {
                interval: config.progress_interval.max(1),
                show_percentage: false,
            });
            builder.set_semantic_config(SemanticConfig {
                window_days: config.semantic_window_days,
                ..SemanticConfig::default()
            });
            builder.set_progress_callback(Arc::new(|message| {
                eprintln!("{message}");
            }));

            let store = builder.analyze(&project_path)?;
            let meta = store.metadata();
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(meta).unwrap_or_default()
                );
            } else {
                println!("✅ Analysis complete");
                println!("  Files:   {}", meta.total_files);
                println!("  Symbols: {}", meta.total_symbols);
                println!("  Edges:   {}", store.edge_count());
                println!("  Time:    {} ms", meta.analysis_time_ms);
            }
        }
        Commands::Serve { path } => {
            let project_path = resolve_path(path);
            let config = config::load_config(&project_path)?;
            let settings = ServerSettings {
                exclude_patterns: config.exclude.clone(),
                use_default_excludes: config.use_default_excludes,
                progress_interval: config.progress_interval,
            };
            let server = McpServer::new(project_path, settings);

            let runtime = tokio::runtime::Runtime::new().map_err(|e| {
                codecontext::AnalyzerError::Config {
                    message: format!("failed to start async runtime: {e}"),
                }
            })?;
            runtime.block_on(server.run())?;
        }
    }
    Ok(())
}

fn resolve_path(path: Option<String>) -> PathBuf {
    match path {
        Some(p) => PathBuf::from(p),
        None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

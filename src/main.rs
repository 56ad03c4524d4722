use clap::Parser;
use npack::application::{PackOptions, WorkspaceSelection};
use npack::commands::{PackRequest, pack};
use npack::error::PackError;
use std::path::PathBuf;
use std::process::ExitCode;

/// npack - build npm package tarballs
///
/// Packs the current project, workspaces, local directories or registry
/// packages into `<name>-<version>.tgz` files and prints their filenames.
///
/// Examples:
///   npack pack                   # Pack the current project
///   npack pack --workspaces      # Pack every workspace
///   npack pack abbrev@1.0.0      # Repack a published version
#[derive(Parser, Debug)]
#[command(author, version = env!("NPACK_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Project root (defaults to the nearest directory with a package.json)
    #[arg(long, env = "NPACK_PREFIX", value_name = "PATH", global = true)]
    prefix: Option<PathBuf>,

    /// Registry URL (defaults to https://registry.npmjs.org)
    #[arg(long, env = "NPACK_REGISTRY", value_name = "URL", global = true)]
    registry: Option<String>,

    /// Log level when RUST_LOG is not set
    #[arg(long, value_name = "LEVEL", default_value = "warn", global = true)]
    loglevel: String,

    /// Suppress notices and the progress spinner
    #[arg(long, global = true)]
    silent: bool,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Create a tarball from a package
    Pack(PackArgs),
}

#[derive(clap::Args, Debug)]
struct PackArgs {
    /// Directories, `file:` paths or registry packages (`name[@version|tag]`)
    #[arg(value_name = "SPEC")]
    specs: Vec<String>,

    /// Pack only the named workspace (repeatable)
    #[arg(long = "workspace", short = 'w', value_name = "NAME")]
    workspace: Vec<String>,

    /// Pack every workspace
    #[arg(long)]
    workspaces: bool,

    /// Do everything except writing the tarball
    #[arg(long)]
    dry_run: bool,

    /// Print one JSON record per tarball
    #[arg(long)]
    json: bool,

    /// Use unicode symbols in notices
    #[arg(long)]
    unicode: bool,

    /// Directory the tarballs are written to (defaults to the current directory)
    #[arg(long, env = "NPACK_PACK_DESTINATION", value_name = "PATH")]
    pack_destination: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&cli.loglevel))
        .init();
    let runtime = npack::runtime::RealRuntime;

    match cli.command {
        Commands::Pack(args) => {
            let json = args.json;
            let request = PackRequest {
                specs: args.specs,
                selection: WorkspaceSelection::from_flags(args.workspaces, args.workspace),
                options: PackOptions {
                    dry_run: args.dry_run,
                    json: args.json,
                    unicode: args.unicode,
                },
                silent: cli.silent,
                prefix: cli.prefix,
                registry: cli.registry,
                destination: args.pack_destination,
            };

            match pack(runtime, request).await {
                Ok(_) => ExitCode::SUCCESS,
                Err(err) => {
                    report_error(&err, json);
                    ExitCode::FAILURE
                }
            }
        }
    }
}

fn report_error(err: &anyhow::Error, json: bool) {
    if !json {
        eprintln!("Error: {:#}", err);
        return;
    }

    let code = err
        .downcast_ref::<PackError>()
        .map(PackError::code)
        .unwrap_or("EUNKNOWN");
    let body = serde_json::json!({
        "error": {
            "code": code,
            "summary": format!("{:#}", err),
        }
    });
    eprintln!("{}", body);
}

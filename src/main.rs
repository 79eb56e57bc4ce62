use clap::{Parser, Subcommand};
use clashdock::{
    commands::{self, up::UpOptions, Context},
    config::AppConfig,
    output, AppError,
};
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "clashdock")]
#[command(about = "Provision and launch Clash with the YACD dashboard in Docker")]
#[command(version)]
struct Cli {
    /// Log debug diagnostics to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Alternative settings file (default: ./clashdock.toml if present)
    #[arg(long, global = true, value_name = "FILE")]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the configuration and start the services (default)
    Up {
        /// Clash configuration to use instead of searching the working directory
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Do not download the GeoIP database when it is missing
        #[arg(long)]
        skip_geoip: bool,

        /// Run the connectivity check once the controller answers
        #[arg(long)]
        probe: bool,
    },
    /// Show container, proxy group and connectivity status
    Status,
    /// Check outbound connectivity through the proxy
    Test,
    /// Print the controller URL and API secret
    Secret,
    /// Remove containers, images and generated files
    Uninstall {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "clashdock=debug"
    } else {
        "clashdock=warn"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = AppConfig::load(cli.settings.as_deref())?;
    debug!("Settings loaded: {:?}", config);

    if let Err(e) = dispatch(config, cli.command).await {
        output::error(format!("{:#}", e));
        if let Some(hint) = e.downcast_ref::<AppError>().and_then(AppError::hint) {
            output::info(hint);
        }
        std::process::exit(1);
    }
    Ok(())
}

async fn dispatch(config: AppConfig, command: Option<Commands>) -> anyhow::Result<()> {
    let command = command.unwrap_or(Commands::Up {
        config: None,
        skip_geoip: false,
        probe: false,
    });

    let ctx = Context::new(config);
    match command {
        Commands::Up {
            config,
            skip_geoip,
            probe,
        } => {
            let opts = UpOptions {
                config,
                skip_geoip,
                probe,
            };
            commands::up::run(&ctx, &opts).await?;
        }
        Commands::Status => commands::status::run(&ctx).await?,
        Commands::Test => {
            commands::connectivity::run(&ctx).await?;
        }
        Commands::Secret => commands::secret::run(&ctx.config)?,
        Commands::Uninstall { yes } => commands::uninstall::run(&ctx, yes).await?,
    }
    Ok(())
}

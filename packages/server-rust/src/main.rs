use clap::Parser;
use tidings_server::cli::{Cli, Commands};
use tidings_server::cmd;
use tidings_server::telemetry::{self, LogFormat};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = telemetry::init_logging(LogFormat::from_json_flag(cli.log_json)) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }

    let result = match cli.command {
        Commands::Serve(args) => cmd::serve::run(args).await,
        Commands::Publish(args) => cmd::publish::run(args).await,
        Commands::Subscribe(args) => cmd::subscribe::run(args).await,
        Commands::Clear(args) => cmd::clear::run(args).await,
    };
    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

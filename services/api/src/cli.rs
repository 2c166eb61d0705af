use crate::demo::{run_demo, run_metrics_report, DemoArgs, MetricsReportArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use deepcx::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "DeepCX",
    about = "Run the DeepCX survey service or inspect satisfaction metrics from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Compute NPS/CSAT metrics from a response CSV export
    Metrics(MetricsReportArgs),
    /// Run an end-to-end demo: define a survey, collect responses, report metrics
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Metrics(args) => run_metrics_report(args),
        Command::Demo(args) => run_demo(args),
    }
}

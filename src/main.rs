use hostscan::app::App;
use hostscan::cli::Cli;
use hostscan::logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::from_args();
    logging::init(cli.log_filter());

    let code = App::run(&cli).await?;
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}

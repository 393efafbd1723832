use clap::Parser;

fn main() -> anyhow::Result<()> {
    let cli = selnav::ui::cli::Cli::parse();
    let config = selnav::infra::config::Config::load()?;
    selnav::init(&config);

    cli.run(&config)
}

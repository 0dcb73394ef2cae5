use anyhow::Result;
use blend::{CLIArguments, Command, catalog_main, check_main, solve_main};
use clap::Parser;
use fern::colors::{Color, ColoredLevelConfig};

fn setup_logger(log_level: log::LevelFilter) -> Result<()> {
    let colors = ColoredLevelConfig::new()
        .debug(Color::White)
        .info(Color::Green)
        .warn(Color::BrightYellow)
        .error(Color::BrightRed);

    fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "{} | {:5} | {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                colors.color(record.level()),
                message
            ))
        })
        .level(log_level)
        .chain(std::io::stderr())
        .apply()?;
    Ok(())
}

fn main() -> Result<()> {
    let args = CLIArguments::parse();
    setup_logger(args.log_level())?;

    match args.command {
        Command::Solve(args) => solve_main(args),
        Command::Catalog(args) => catalog_main(args),
        Command::Check(args) => check_main(args),
    }
}

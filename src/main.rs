use clap::Parser;
use iconpress::cli::{Cli, Commands};
use iconpress::output::Printer;
use miette::Result;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let printer = Printer::new().quiet(cli.quiet);

    match cli.command {
        Commands::Build(args) => iconpress::cli::build::run(args, &printer)?,
        Commands::List(args) => iconpress::cli::list::run(args, &printer)?,
        Commands::Normalize(args) => iconpress::cli::normalize::run(args, &printer)?,
        Commands::Validate(args) => iconpress::cli::validate::run(args, &printer)?,
        Commands::Init(args) => iconpress::cli::init::run(args, &printer)?,
        Commands::Completions(args) => iconpress::cli::completions::run(args)?,
    }

    Ok(())
}

use clap::{Parser, Subcommand};

mod analyze;
mod finance;
mod report;
mod split;
mod words;

#[derive(Parser, Debug)]
#[command(
    name = "usv-analyzer",
    version,
    about = "USV statistics and small calculator utilities"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Aggregate a dataset and list its animals, variables and metrics
    Report(report::ReportArgs),
    /// Describe, test and plot metrics by one or two factors
    Analyze(analyze::AnalyzeArgs),
    /// Monthly/yearly figures and a 10 year savings projection
    Finance(finance::FinanceArgs),
    /// Split an expense evenly or by percentages
    Split(split::SplitArgs),
    /// Most frequent words of a text
    Words(words::WordsArgs),
}

impl Cli {
    pub fn dispatch(self) -> anyhow::Result<()> {
        match self.command {
            Command::Report(args) => report::handle(args),
            Command::Analyze(args) => analyze::handle(args),
            Command::Finance(args) => finance::handle(args),
            Command::Split(args) => split::handle(args),
            Command::Words(args) => words::handle(args),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/cli/mod.rs"]
mod tests;

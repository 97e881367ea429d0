use clap::Args;

use crate::tools::split::{custom_split, even_split};

#[derive(Args, Debug)]
pub struct SplitArgs {
    /// Total amount to split
    #[arg(long, allow_negative_numbers = true)]
    pub(crate) total: f64,

    /// Number of people
    #[arg(long)]
    pub(crate) people: usize,

    /// Percentage per person in order; repeat for each person
    #[arg(long = "percent", allow_negative_numbers = true)]
    pub(crate) percents: Vec<f64>,

    /// Scale the other shares so the total is 100 % around the last one
    #[arg(long)]
    pub(crate) rebalance: bool,
}

pub fn handle(args: SplitArgs) -> anyhow::Result<()> {
    let plan = if args.percents.is_empty() {
        even_split(args.total, args.people)?
    } else {
        custom_split(args.total, args.people, &args.percents, args.rebalance)?
    };
    print!("{}", plan.render());
    Ok(())
}

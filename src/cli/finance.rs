use std::path::PathBuf;

use clap::Args;
use tracing::info;

use crate::plot::write_plot;
use crate::tools::finance::{Currency, FinanceInput, calculate};

#[derive(Args, Debug)]
pub struct FinanceArgs {
    /// Monthly gross income
    #[arg(long, allow_negative_numbers = true)]
    pub(crate) income: f64,

    /// Monthly expenses
    #[arg(long, allow_negative_numbers = true)]
    pub(crate) expenses: f64,

    /// Tax rate in percent
    #[arg(long, allow_negative_numbers = true)]
    pub(crate) tax_rate: f64,

    #[arg(long, value_enum, default_value = "kr")]
    pub(crate) currency: CurrencyArg,

    /// Write the savings projection plot into this directory
    #[arg(long)]
    pub(crate) out: Option<PathBuf>,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum CurrencyArg {
    Kr,
    Usd,
    Eur,
    Gbp,
}

impl From<CurrencyArg> for Currency {
    fn from(value: CurrencyArg) -> Self {
        match value {
            CurrencyArg::Kr => Currency::Kr,
            CurrencyArg::Usd => Currency::Usd,
            CurrencyArg::Eur => Currency::Eur,
            CurrencyArg::Gbp => Currency::Gbp,
        }
    }
}

pub fn handle(args: FinanceArgs) -> anyhow::Result<()> {
    let summary = calculate(&FinanceInput {
        monthly_income: args.income,
        monthly_expenses: args.expenses,
        tax_rate: args.tax_rate,
        currency: args.currency.into(),
    })?;
    println!("Financial Summary");
    print!("{}", summary.render());

    if let Some(out) = args.out {
        let svg = summary.savings_plot().to_svg()?;
        let files = write_plot(&svg, &out, "savings_projection")?;
        info!(png = %files.png.display(), "savings plot written");
    }
    Ok(())
}

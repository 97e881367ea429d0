use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::plot::line::LinePlot;
use crate::tools::{ToolError, group_thousands};

pub const PROJECTION_YEARS: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Currency {
    #[default]
    Kr,
    Usd,
    Eur,
    Gbp,
}

impl Currency {
    pub fn code(self) -> &'static str {
        match self {
            Currency::Kr => "KR",
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "KR" => Ok(Currency::Kr),
            "USD" => Ok(Currency::Usd),
            "EUR" => Ok(Currency::Eur),
            "GBP" => Ok(Currency::Gbp),
            other => Err(ToolError::InvalidInput(format!("unknown currency: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FinanceInput {
    pub monthly_income: f64,
    pub monthly_expenses: f64,
    /// Percent, `25.0` for 25 %.
    pub tax_rate: f64,
    pub currency: Currency,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinanceSummary {
    pub currency: Currency,
    pub monthly_income: f64,
    pub monthly_expenses: f64,
    pub tax_rate: f64,
    pub monthly_tax: f64,
    pub monthly_net: f64,
    pub yearly_salary: f64,
    pub yearly_expenses: f64,
    pub yearly_tax: f64,
    pub yearly_net: f64,
    /// `(year, cumulative savings)` for years 1 through 10.
    pub savings: Vec<(u32, f64)>,
}

pub fn calculate(input: &FinanceInput) -> Result<FinanceSummary, ToolError> {
    for (name, value) in [
        ("monthly income", input.monthly_income),
        ("monthly expenses", input.monthly_expenses),
        ("tax rate", input.tax_rate),
    ] {
        if !value.is_finite() {
            return Err(ToolError::InvalidInput(format!("{name} must be a number")));
        }
    }

    let monthly_tax = input.monthly_income * (input.tax_rate / 100.0);
    let monthly_net = input.monthly_income - monthly_tax - input.monthly_expenses;
    let yearly_salary = input.monthly_income * 12.0;
    let yearly_expenses = input.monthly_expenses * 12.0;
    let yearly_tax = monthly_tax * 12.0;
    let yearly_net = yearly_salary - yearly_expenses - yearly_tax;
    let savings = (1..=PROJECTION_YEARS)
        .map(|year| (year, monthly_net * 12.0 * year as f64))
        .collect();

    Ok(FinanceSummary {
        currency: input.currency,
        monthly_income: input.monthly_income,
        monthly_expenses: input.monthly_expenses,
        tax_rate: input.tax_rate,
        monthly_tax,
        monthly_net,
        yearly_salary,
        yearly_expenses,
        yearly_tax,
        yearly_net,
        savings,
    })
}

impl FinanceSummary {
    pub fn render(&self) -> String {
        let c = self.currency.code();
        let money = |v: f64| format!("{c}{}", group_thousands(v, 2));
        let mut out = String::new();
        out.push_str(&format!("Monthly Income: {}\n", money(self.monthly_income)));
        out.push_str(&format!("Tax Rate: {:.0}%\n", self.tax_rate));
        out.push_str(&format!("Monthly Tax: {}\n", money(self.monthly_tax)));
        out.push_str(&format!("Monthly Expenses: {}\n", money(self.monthly_expenses)));
        out.push_str(&format!("Monthly Net Income: {}\n", money(self.monthly_net)));
        out.push_str(&format!("Yearly Salary: {}\n", money(self.yearly_salary)));
        out.push_str(&format!("Yearly Expenses: {}\n", money(self.yearly_expenses)));
        out.push_str(&format!("Yearly Tax Paid: {}\n", money(self.yearly_tax)));
        out.push_str(&format!("Yearly Net Income: {}\n", money(self.yearly_net)));
        out
    }

    pub fn savings_plot(&self) -> LinePlot {
        LinePlot {
            title: "Estimated Savings Over 10 Years".to_string(),
            x_label: "Years".to_string(),
            y_label: format!("Savings ({})", self.currency.code()),
            points: self.savings.iter().map(|&(y, s)| (y as f64, s)).collect(),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/tools/finance.rs"]
mod tests;

//! Metric catalog: which statement supplies each metric id.
//!
//! The lookup table is built once on first use and shared for the lifetime of
//! the process. Ids outside the balance-sheet and cash-flow sets resolve to the
//! income statement.

use crate::schema::MetricOrigin;
use std::collections::HashMap;
use std::sync::OnceLock;

pub const INCOME_METRICS: &[&str] = &[
    "revenue",
    "costOfRevenue",
    "grossProfit",
    "grossProfitRatio",
    "researchAndDevelopmentExpenses",
    "generalAndAdministrativeExpenses",
    "sellingAndMarketingExpenses",
    "sellingGeneralAndAdministrativeExpenses",
    "otherExpenses",
    "operatingExpenses",
    "costAndExpenses",
    "interestIncome",
    "interestExpense",
    "depreciationAndAmortization",
    "ebitda",
    "ebitdaratio",
    "operatingIncome",
    "operatingIncomeRatio",
    "totalOtherIncomeExpensesNet",
    "incomeBeforeTax",
    "incomeBeforeTaxRatio",
    "incomeTaxExpense",
    "netIncome",
    "netIncomeRatio",
    "eps",
    "epsdiluted",
    "weightedAverageShsOut",
    "weightedAverageShsOutDil",
];

pub const BALANCE_SHEET_METRICS: &[&str] = &[
    "cashAndCashEquivalents",
    "shortTermInvestments",
    "cashAndShortTermInvestments",
    "netReceivables",
    "inventory",
    "otherCurrentAssets",
    "totalCurrentAssets",
    "propertyPlantEquipmentNet",
    "goodwill",
    "intangibleAssets",
    "goodwillAndIntangibleAssets",
    "longTermInvestments",
    "taxAssets",
    "otherNonCurrentAssets",
    "totalNonCurrentAssets",
    "otherAssets",
    "totalAssets",
    "accountPayables",
    "shortTermDebt",
    "taxPayables",
    "deferredRevenue",
    "otherCurrentLiabilities",
    "totalCurrentLiabilities",
    "longTermDebt",
    "deferredRevenueNonCurrent",
    "deferredTaxLiabilitiesNonCurrent",
    "otherNonCurrentLiabilities",
    "totalNonCurrentLiabilities",
    "otherLiabilities",
    "capitalLeaseObligations",
    "totalLiabilities",
    "preferredStock",
    "commonStock",
    "retainedEarnings",
    "accumulatedOtherComprehensiveIncomeLoss",
    "othertotalStockholdersEquity",
    "totalStockholdersEquity",
    "totalEquity",
    "totalLiabilitiesAndStockholdersEquity",
    "minorityInterest",
    "totalLiabilitiesAndTotalEquity",
    "totalInvestments",
    "totalDebt",
    "netDebt",
];

pub const CASH_FLOW_METRICS: &[&str] = &[
    "deferredIncomeTax",
    "stockBasedCompensation",
    "changeInWorkingCapital",
    "accountsReceivables",
    "accountsPayables",
    "otherWorkingCapital",
    "otherNonCashItems",
    "netCashProvidedByOperatingActivities",
    "investmentsInPropertyPlantAndEquipment",
    "acquisitionsNet",
    "purchasesOfInvestments",
    "salesMaturitiesOfInvestments",
    "otherInvestingActivites",
    "netCashUsedForInvestingActivites",
    "debtRepayment",
    "commonStockIssued",
    "commonStockRepurchased",
    "dividendsPaid",
    "otherFinancingActivites",
    "netCashUsedProvidedByFinancingActivities",
    "effectOfForexChangesOnCash",
    "netChangeInCash",
    "cashAtEndOfPeriod",
    "cashAtBeginningOfPeriod",
    "operatingCashFlow",
    "capitalExpenditure",
    "freeCashFlow",
];

/// Metrics that are not summed when rolling quarters into a TTM figure.
const NON_ADDITIVE_METRICS: &[&str] = &["weightedAverageShsOut", "weightedAverageShsOutDil"];

static METRIC_ORIGINS: OnceLock<HashMap<&'static str, MetricOrigin>> = OnceLock::new();

fn origin_table() -> &'static HashMap<&'static str, MetricOrigin> {
    METRIC_ORIGINS.get_or_init(|| {
        let mut table = HashMap::new();
        for id in INCOME_METRICS {
            table.insert(*id, MetricOrigin::Income);
        }
        for id in BALANCE_SHEET_METRICS {
            table.insert(*id, MetricOrigin::BalanceSheet);
        }
        for id in CASH_FLOW_METRICS {
            table.insert(*id, MetricOrigin::CashFlow);
        }
        table
    })
}

pub fn metric_origin(metric_id: &str) -> MetricOrigin {
    origin_table()
        .get(metric_id)
        .copied()
        .unwrap_or(MetricOrigin::Income)
}

pub fn is_known_metric(metric_id: &str) -> bool {
    origin_table().contains_key(metric_id)
}

pub fn known_metrics(origin: MetricOrigin) -> &'static [&'static str] {
    match origin {
        MetricOrigin::Income => INCOME_METRICS,
        MetricOrigin::BalanceSheet => BALANCE_SHEET_METRICS,
        MetricOrigin::CashFlow => CASH_FLOW_METRICS,
    }
}

/// Whether quarterly values of this metric add up to a yearly value.
/// Ratios, per-share figures and share counts do not.
pub fn is_additive(metric_id: &str) -> bool {
    let lower = metric_id.to_ascii_lowercase();
    !(lower.contains("ratio")
        || lower.starts_with("eps")
        || lower.ends_with("pershare")
        || NON_ADDITIVE_METRICS.contains(&metric_id))
}

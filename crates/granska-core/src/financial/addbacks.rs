use rust_decimal::Decimal;
use std::collections::BTreeMap;

use crate::model::{AddBackCategory, AddBackSuggestion, FinancialYear, SuggestionConfidence};

const OWNER_SALARY_SHARE: Decimal = Decimal::from_parts(5, 0, 0, false, 2);
const REVENUE_VOLATILITY_TRIGGER: Decimal = Decimal::from_parts(20, 0, 0, false, 2);
const NON_RECURRING_SHARE: Decimal = Decimal::from_parts(10, 0, 0, false, 2);
const COST_VOLATILITY_TRIGGER: Decimal = Decimal::from_parts(30, 0, 0, false, 2);
const ONE_TIME_COST_SHARE: Decimal = Decimal::from_parts(20, 0, 0, false, 2);
const STOCK_COMPENSATION_SHARE: Decimal = Decimal::from_parts(2, 0, 0, false, 2);

/// A row whose label matched an add-back keyword, with its amount per year.
#[derive(Debug, Clone, PartialEq)]
pub struct FlaggedItem {
    pub category: AddBackCategory,
    pub label: String,
    pub amounts: BTreeMap<i32, Decimal>,
}

/// Suggest EBITDA adjustments from a year series.
///
/// Nothing is suggested for fewer than two years. The financial figures are
/// only read.
pub fn suggest_add_backs(years: &[FinancialYear], flagged: &[FlaggedItem]) -> Vec<AddBackSuggestion> {
    if years.len() < 2 {
        return Vec::new();
    }

    let revenues: Vec<Decimal> = years.iter().map(|y| y.revenue).collect();
    let costs: Vec<Decimal> = years.iter().map(|y| y.costs.abs()).collect();
    let avg_revenue = average(&revenues);
    let avg_costs = average(&costs);
    let revenue_range = range(&revenues);
    let cost_range = range(&costs);

    let mut out = Vec::new();

    if avg_revenue > Decimal::ZERO {
        out.push(suggestion(
            AddBackCategory::OwnerSalary,
            "Normalize owner compensation to a market-rate salary".into(),
            avg_revenue * OWNER_SALARY_SHARE,
            SuggestionConfidence::Medium,
            "Compare the owner's salary and benefits with market compensation for the role \
             and add back any excess",
        ));
    }

    if revenue_range > avg_revenue * REVENUE_VOLATILITY_TRIGGER {
        out.push(suggestion(
            AddBackCategory::NonRecurringRevenue,
            format!(
                "Revenue varies by {} SEK across {} years; part may be non-recurring",
                revenue_range.round_dp(0),
                years.len()
            ),
            revenue_range * NON_RECURRING_SHARE,
            SuggestionConfidence::Low,
            "Identify one-off contracts, asset sales or grants and exclude them from \
             normalized revenue",
        ));
    }

    if cost_range > avg_costs * COST_VOLATILITY_TRIGGER {
        out.push(suggestion(
            AddBackCategory::OneTimeCost,
            format!(
                "Costs vary by {} SEK across {} years; some may be one-time",
                cost_range.round_dp(0),
                years.len()
            ),
            cost_range * ONE_TIME_COST_SHARE,
            SuggestionConfidence::Low,
            "Review the cost ledger for restructuring, litigation or other one-time items",
        ));
    }

    out.push(suggestion(
        AddBackCategory::StockCompensation,
        "Check for share-based compensation or option programs".into(),
        avg_revenue * STOCK_COMPENSATION_SHARE,
        SuggestionConfidence::Low,
        "Ask whether employees or management hold options or shares granted as pay; \
         non-cash compensation can be added back",
    ));

    for item in flagged {
        let amounts: Vec<Decimal> = years
            .iter()
            .filter_map(|y| item.amounts.get(&y.year))
            .map(|a| a.abs())
            .collect();
        let avg = average(&amounts);
        if avg.is_zero() {
            continue;
        }
        let mut s = suggestion(
            item.category,
            format!("Line item '{}' is a candidate {} adjustment", item.label, item.category),
            avg,
            SuggestionConfidence::Medium,
            flagged_recommendation(item.category),
        );
        s.source_label = Some(item.label.clone());
        out.push(s);
    }

    out
}

fn suggestion(
    category: AddBackCategory,
    description: String,
    amount: Decimal,
    confidence: SuggestionConfidence,
    recommendation: &str,
) -> AddBackSuggestion {
    AddBackSuggestion {
        category,
        description,
        estimated_amount: amount.round_dp(0),
        confidence,
        recommendation: recommendation.to_string(),
        source_label: None,
    }
}

fn flagged_recommendation(category: AddBackCategory) -> &'static str {
    match category {
        AddBackCategory::OwnerSalary => {
            "Verify the amount against market compensation and add back the excess"
        }
        AddBackCategory::OneTimeCost => {
            "Confirm the cost will not recur and obtain supporting invoices"
        }
        AddBackCategory::NonRecurringRevenue => {
            "Confirm the income is one-off and deduct it from normalized revenue"
        }
        AddBackCategory::StockCompensation => {
            "Confirm the expense is non-cash and add it back"
        }
        AddBackCategory::RelatedParty => {
            "Check that related-party transactions are priced at arm's length and adjust to market terms"
        }
    }
}

fn average(values: &[Decimal]) -> Decimal {
    if values.is_empty() {
        return Decimal::ZERO;
    }
    values.iter().sum::<Decimal>() / Decimal::from(values.len())
}

fn range(values: &[Decimal]) -> Decimal {
    let max = values.iter().max().copied().unwrap_or_default();
    let min = values.iter().min().copied().unwrap_or_default();
    max - min
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn year(year: i32, revenue: Decimal, costs: Decimal) -> FinancialYear {
        let mut y = FinancialYear::empty(year);
        y.revenue = revenue;
        y.costs = costs;
        y.ebitda = revenue - costs;
        y
    }

    fn categories(s: &[AddBackSuggestion]) -> Vec<AddBackCategory> {
        s.iter().map(|s| s.category).collect()
    }

    #[test]
    fn test_single_year_gets_nothing() {
        assert!(suggest_add_backs(&[year(2023, dec!(10000000), dec!(8000000))], &[]).is_empty());
    }

    #[test]
    fn test_steady_series() {
        let years = [
            year(2022, dec!(10000000), dec!(8000000)),
            year(2023, dec!(11000000), dec!(8500000)),
            year(2024, dec!(12000000), dec!(9000000)),
        ];
        let s = suggest_add_backs(&years, &[]);
        assert_eq!(
            categories(&s),
            vec![AddBackCategory::OwnerSalary, AddBackCategory::StockCompensation]
        );
        assert_eq!(s[0].estimated_amount, dec!(550000));
        assert_eq!(s[0].confidence, SuggestionConfidence::Medium);
        assert_eq!(s[1].estimated_amount, dec!(220000));
        assert_eq!(s[1].confidence, SuggestionConfidence::Low);
    }

    #[test]
    fn test_volatile_series() {
        // revenue range 6M > 20% of 8M; cost range 4M > 30% of 6M
        let years = [
            year(2022, dec!(5000000), dec!(-4000000)),
            year(2023, dec!(11000000), dec!(-8000000)),
        ];
        let s = suggest_add_backs(&years, &[]);
        assert_eq!(
            categories(&s),
            vec![
                AddBackCategory::OwnerSalary,
                AddBackCategory::NonRecurringRevenue,
                AddBackCategory::OneTimeCost,
                AddBackCategory::StockCompensation
            ]
        );
        assert_eq!(s[1].estimated_amount, dec!(600000));
        assert_eq!(s[2].estimated_amount, dec!(800000));
    }

    #[test]
    fn test_amounts_rounded_to_whole_kronor() {
        let years = [
            year(2022, dec!(1000001), dec!(0)),
            year(2023, dec!(1000002), dec!(0)),
        ];
        let s = suggest_add_backs(&years, &[]);
        assert_eq!(s[0].estimated_amount, dec!(50000));
        assert_eq!(s[0].estimated_amount.scale(), 0);
    }

    #[test]
    fn test_flagged_items() {
        let years = [
            year(2022, dec!(10000000), dec!(8000000)),
            year(2023, dec!(11000000), dec!(8500000)),
        ];
        let flagged = [
            FlaggedItem {
                category: AddBackCategory::RelatedParty,
                label: "Hyra närstående".into(),
                amounts: BTreeMap::from([(2022, dec!(-300000)), (2023, dec!(-340000))]),
            },
            FlaggedItem {
                category: AddBackCategory::OneTimeCost,
                label: "Engångskostnad".into(),
                amounts: BTreeMap::from([(2022, dec!(0)), (2023, dec!(0))]),
            },
        ];
        let s = suggest_add_backs(&years, &flagged);
        let related = s
            .iter()
            .find(|s| s.category == AddBackCategory::RelatedParty)
            .unwrap();
        assert_eq!(related.estimated_amount, dec!(320000));
        assert_eq!(related.source_label.as_deref(), Some("Hyra närstående"));
        assert!(!s
            .iter()
            .any(|s| s.source_label.as_deref() == Some("Engångskostnad")));
    }

    #[test]
    fn test_years_not_modified() {
        let years = vec![
            year(2022, dec!(10000000), dec!(8000000)),
            year(2023, dec!(11000000), dec!(8500000)),
        ];
        let before = years.clone();
        let _ = suggest_add_backs(&years, &[]);
        assert_eq!(years, before);
    }
}

use crate::model::{DataQuality, FinancialYear};

const ERROR_PENALTY: f64 = 20.0;
const MAX_ERROR_PENALTY: f64 = 50.0;
const BASELINE_YEARS: usize = 3;
const MISSING_YEAR_PENALTY: f64 = 10.0;
const CANONICAL_FIELDS: usize = 6;
const COMPLETENESS_TARGET: f64 = 0.8;

/// Share of canonical fields filled across all years: revenue, costs,
/// ebitda, ebit, net income and assets. 0 with no years.
pub fn completeness(years: &[FinancialYear]) -> f64 {
    if years.is_empty() {
        return 0.0;
    }
    let filled: usize = years
        .iter()
        .map(|y| {
            [
                !y.revenue.is_zero(),
                !y.costs.is_zero(),
                !y.ebitda.is_zero(),
                !y.ebit.is_zero(),
                !y.net_income.is_zero(),
                y.assets.is_some(),
            ]
            .iter()
            .filter(|f| **f)
            .count()
        })
        .sum();
    filled as f64 / (years.len() * CANONICAL_FIELDS) as f64
}

/// Score extraction quality on 0–100 as a sum of fixed penalties.
pub fn quality_score(years: &[FinancialYear], error_count: usize) -> f64 {
    let mut score = 100.0;
    score -= (ERROR_PENALTY * error_count as f64).min(MAX_ERROR_PENALTY);
    score -= MISSING_YEAR_PENALTY * BASELINE_YEARS.saturating_sub(years.len()) as f64;
    let c = completeness(years);
    if c < COMPLETENESS_TARGET {
        score -= (1.0 - c) * 100.0 / 2.0;
    }
    score.clamp(0.0, 100.0)
}

pub fn rate(years: &[FinancialYear], error_count: usize) -> (f64, DataQuality) {
    let score = quality_score(years, error_count);
    (score, DataQuality::from_score(score))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn full_year(year: i32) -> FinancialYear {
        FinancialYear {
            year,
            revenue: dec!(10000000),
            costs: dec!(8000000),
            ebitda: dec!(2000000),
            ebit: dec!(1500000),
            net_income: dec!(1100000),
            assets: Some(dec!(6000000)),
            liabilities: None,
            equity: None,
            cash: None,
        }
    }

    fn partial_year(year: i32) -> FinancialYear {
        let mut y = FinancialYear::empty(year);
        y.revenue = dec!(10000000);
        y.costs = dec!(8000000);
        y.ebitda = dec!(2000000);
        y
    }

    #[test]
    fn test_complete_three_years_is_excellent() {
        let years: Vec<_> = (2022..=2024).map(full_year).collect();
        assert_eq!(completeness(&years), 1.0);
        assert_eq!(rate(&years, 0), (100.0, DataQuality::Excellent));
    }

    #[test]
    fn test_half_complete_three_years_is_good() {
        let years: Vec<_> = (2022..=2024).map(partial_year).collect();
        assert_eq!(completeness(&years), 0.5);
        assert_eq!(rate(&years, 0), (75.0, DataQuality::Good));
    }

    #[test]
    fn test_no_years_with_error_is_zero() {
        assert_eq!(completeness(&[]), 0.0);
        assert_eq!(rate(&[], 1), (0.0, DataQuality::Poor));
        // 100 - 30 (missing years) - 50 (completeness)
        assert_eq!(quality_score(&[], 0), 20.0);
    }

    #[test]
    fn test_error_penalty_is_capped() {
        let years: Vec<_> = (2022..=2024).map(full_year).collect();
        assert_eq!(quality_score(&years, 1), 80.0);
        assert_eq!(quality_score(&years, 2), 60.0);
        assert_eq!(quality_score(&years, 3), 50.0);
        assert_eq!(quality_score(&years, 10), 50.0);
    }

    #[test]
    fn test_missing_years_penalty() {
        assert_eq!(quality_score(&[full_year(2023)], 0), 80.0);
        assert_eq!(quality_score(&[full_year(2022), full_year(2023)], 0), 90.0);
        let five: Vec<_> = (2019..=2023).map(full_year).collect();
        assert_eq!(quality_score(&five, 0), 100.0);
    }

    #[test]
    fn test_score_always_within_bounds() {
        for errors in 0..6 {
            for n in 0..5 {
                let years: Vec<_> = (0..n).map(|i| partial_year(2020 + i)).collect();
                let s = quality_score(&years, errors);
                assert!((0.0..=100.0).contains(&s), "score {s} out of range");
            }
        }
    }
}

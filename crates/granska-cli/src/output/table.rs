use granska_core::model::{DocumentExtractionResult, FinancialYear, ParsedFinancialData};

const PREVIEW_LINES: usize = 40;

pub fn print_extraction(result: &DocumentExtractionResult) {
    println!("=== {} ===\n", result.format);
    println!(
        "  Method:     {}",
        result.extraction_method().unwrap_or("unknown")
    );
    println!("  Confidence: {:.2}", result.confidence);
    if let Some(pages) = result.pages {
        println!("  Pages:      {pages}");
    }
    if let Some(ref sheets) = result.sheets {
        println!("  Sheets:     {}", sheets.join(", "));
    }
    for (key, value) in &result.metadata {
        if key == granska_core::model::META_EXTRACTION_METHOD
            || key == granska_core::model::META_WARNINGS
            || value.is_object()
            || value.is_array()
        {
            continue;
        }
        println!("  {key}: {value}");
    }

    let warnings = result.warnings();
    if !warnings.is_empty() {
        println!("\n  Warnings:");
        for w in &warnings {
            println!("    - {w}");
        }
    }

    println!();
    let total = result.text.lines().count();
    for line in result.text.lines().take(PREVIEW_LINES) {
        println!("  | {line}");
    }
    if total > PREVIEW_LINES {
        println!(
            "  ... {} more line(s); use -o json for the full text",
            total - PREVIEW_LINES
        );
    }
}

pub fn print_financials(parsed: &ParsedFinancialData) {
    if let Some(ref sheet) = parsed.source_sheet {
        println!("=== {sheet} ===\n");
    }
    println!(
        "  Data quality: {} ({:.0}/100)\n",
        parsed.data_quality, parsed.quality_score
    );

    if !parsed.years.is_empty() {
        print_years(&parsed.years);
        println!();
    }

    if !parsed.add_backs_suggestions.is_empty() {
        println!("  Add-back suggestions:");
        for s in &parsed.add_backs_suggestions {
            println!(
                "    {:<22} {:>14} SEK  [{}]",
                s.category.to_string(),
                group_digits(&s.estimated_amount.to_string()),
                s.confidence
            );
            println!("      {}", s.description);
            println!("      -> {}", s.recommendation);
        }
        println!();
    }

    if !parsed.errors.is_empty() {
        println!("  Errors:");
        for e in &parsed.errors {
            println!("    - {e}");
        }
    }
    if !parsed.warnings.is_empty() {
        println!("  Warnings:");
        for w in &parsed.warnings {
            println!("    - {w}");
        }
    }
}

fn print_years(years: &[FinancialYear]) {
    type Getter = fn(&FinancialYear) -> Option<String>;
    let fields: [(&str, Getter); 9] = [
        ("Revenue", |y| Some(y.revenue.round_dp(0).to_string())),
        ("Costs", |y| Some(y.costs.round_dp(0).to_string())),
        ("EBITDA", |y| Some(y.ebitda.round_dp(0).to_string())),
        ("EBIT", |y| Some(y.ebit.round_dp(0).to_string())),
        ("Net income", |y| Some(y.net_income.round_dp(0).to_string())),
        ("Assets", |y| y.assets.map(|v| v.round_dp(0).to_string())),
        ("Liabilities", |y| y.liabilities.map(|v| v.round_dp(0).to_string())),
        ("Equity", |y| y.equity.map(|v| v.round_dp(0).to_string())),
        ("Cash", |y| y.cash.map(|v| v.round_dp(0).to_string())),
    ];

    print!("  {:<12}", "");
    for y in years {
        print!("  {:>14}", y.year);
    }
    println!();
    println!("  {}", "-".repeat(12 + years.len() * 16));

    for (name, get) in fields {
        let values: Vec<Option<String>> = years.iter().map(get).collect();
        if values.iter().all(Option::is_none) {
            continue;
        }
        print!("  {name:<12}");
        for v in &values {
            let cell = v.as_deref().map(group_digits).unwrap_or_else(|| "-".into());
            print!("  {cell:>14}");
        }
        println!();
    }
}

/// Insert a space every three digits of the integer part: "-1234567" -> "-1 234 567".
fn group_digits(number: &str) -> String {
    let (sign, digits) = match number.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", number),
    };
    let (int, frac) = match digits.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (digits, None),
    };
    let mut grouped = String::new();
    for (i, c) in int.chars().enumerate() {
        if i > 0 && (int.len() - i) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(c);
    }
    match frac {
        Some(f) => format!("{sign}{grouped}.{f}"),
        None => format!("{sign}{grouped}"),
    }
}

//! Plain-text rendering of ranked results and summary stats.

use pricelens_core::{ProductResult, ResultStats};

/// Prints the ranked result table, cheapest-relevant first per the chosen
/// ordering.
pub fn print_results(results: &[ProductResult]) {
    if results.is_empty() {
        println!("no results");
        return;
    }

    for (index, result) in results.iter().enumerate() {
        let discount = result.discount_percent();
        let discount_badge = if discount > 0 {
            format!(" (-{discount}%)")
        } else {
            String::new()
        };
        let sales = result
            .sales_volume
            .map(|v| format!("  sold {}", format_count(v)))
            .unwrap_or_default();
        let rating = result
            .rating
            .map(|r| format!("  ★{r:.1}"))
            .unwrap_or_default();

        println!(
            "{:>3}. [{:<7}] {:>10.2}{}  {}{}{}",
            index + 1,
            result.platform,
            result.price,
            discount_badge,
            truncate(&result.name, 48),
            rating,
            sales,
        );
        println!("     {}", result.product_url);
    }
}

pub fn print_stats(stats: &ResultStats) {
    let lowest = stats
        .lowest_price
        .map(|p| format!("{p:.2}"))
        .unwrap_or_else(|| "-".to_owned());
    let sales = stats
        .highest_sales
        .map(format_count)
        .unwrap_or_else(|| "-".to_owned());
    println!(
        "\nlowest price: {lowest}   highest sales: {sales}   platforms: {}",
        stats.platform_count
    );
}

/// Shortens counts the way the platforms display them: `12.3k`, `1.2萬`.
fn format_count(count: u64) -> String {
    #[allow(clippy::cast_precision_loss)]
    let value = count as f64;
    if count >= 10_000 {
        format!("{:.1}萬", value / 10_000.0)
    } else if count >= 1_000 {
        format!("{:.1}k", value / 1_000.0)
    } else {
        count.to_string()
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_owned();
    }
    let mut shortened: String = text.chars().take(max_chars).collect();
    shortened.push('…');
    shortened
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_count_uses_platform_shorthand() {
        assert_eq!(format_count(532), "532");
        assert_eq!(format_count(1_500), "1.5k");
        assert_eq!(format_count(12_000), "1.2萬");
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("短名", 48), "短名");
        let long = "無線藍牙耳機".repeat(20);
        let shortened = truncate(&long, 10);
        assert_eq!(shortened.chars().count(), 11, "10 chars + ellipsis");
    }
}

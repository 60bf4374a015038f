use crate::domain::model::{Market, OfferListing, ResultTier, SearchResult};
use crate::utils::error::{DiscoveryError, Result};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Csv,
}

/// One flattened line of a search result, used by the CSV output.
#[derive(Debug, Clone, Serialize)]
struct ReportRow<'a> {
    tier: &'static str,
    kind: &'static str,
    id: i64,
    name: &'a str,
    market: &'a str,
    city: &'a str,
    postal_code: &'a str,
    premium: bool,
    price: &'a str,
    expires_at: String,
}

impl<'a> ReportRow<'a> {
    fn market(tier: &ResultTier, market: &'a Market) -> Self {
        Self {
            tier: tier.kind.label(),
            kind: "market",
            id: market.id,
            name: &market.name,
            market: &market.name,
            city: &market.city,
            postal_code: market.postal_code.as_deref().unwrap_or(""),
            premium: market.is_premium,
            price: "",
            expires_at: String::new(),
        }
    }

    fn offer(tier: &ResultTier, listing: &'a OfferListing) -> Self {
        Self {
            tier: tier.kind.label(),
            kind: "offer",
            id: listing.offer.id,
            name: &listing.offer.product_name,
            market: &listing.market.name,
            city: &listing.market.city,
            postal_code: listing.market.postal_code.as_deref().unwrap_or(""),
            premium: false,
            price: &listing.offer.price,
            expires_at: listing.offer.expires_at.to_rfc3339(),
        }
    }
}

fn rows(result: &SearchResult) -> Vec<ReportRow<'_>> {
    let mut rows = Vec::with_capacity(result.total_results);
    for tier in result.tiers() {
        rows.extend(tier.markets.iter().map(|m| ReportRow::market(tier, m)));
        rows.extend(tier.offers.iter().map(|l| ReportRow::offer(tier, l)));
    }
    rows
}

pub fn render(result: &SearchResult, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Table => Ok(render_table(result)),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(result)?),
        OutputFormat::Csv => render_csv(result),
    }
}

pub fn render_csv(result: &SearchResult) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows(result) {
        writer.serialize(row)?;
    }
    let data = writer
        .into_inner()
        .map_err(|e| DiscoveryError::IoError(e.into_error()))?;
    String::from_utf8(data).map_err(|e| DiscoveryError::ConfigError {
        message: format!("CSV output is not UTF-8: {}", e),
    })
}

pub fn render_table(result: &SearchResult) -> String {
    let mut out = String::new();

    if !result.criteria_supplied {
        out.push_str("No search criteria given. Use --q, --city or --plz.\n");
        return out;
    }
    if !result.has_results {
        out.push_str("No results.\n");
    }

    for tier in result.tiers() {
        if tier.is_empty() {
            continue;
        }
        let _ = writeln!(out, "== {} ({})", tier.kind.label(), tier.count);
        for market in &tier.markets {
            let _ = writeln!(
                out,
                "  {} [market #{}] {} {}",
                if market.is_premium { "★" } else { " " },
                market.id,
                market.name,
                locality_label(market)
            );
        }
        for listing in &tier.offers {
            let _ = writeln!(
                out,
                "    [offer #{}] {} {} @ {} {}",
                listing.offer.id,
                listing.offer.product_name,
                listing.offer.price,
                listing.market.name,
                locality_label(&listing.market)
            );
        }
    }

    let _ = writeln!(
        out,
        "Total: {} ({} markets, {} offers)",
        result.total_results, result.total_markets, result.total_offers
    );
    for failure in &result.failed_lookups {
        let _ = writeln!(out, "! {} unavailable: {}", failure.lookup, failure.reason);
    }
    out
}

fn locality_label(market: &Market) -> String {
    match market.postal_code.as_deref() {
        Some(code) => format!("({} {})", code, market.city),
        None => format!("({})", market.city),
    }
}

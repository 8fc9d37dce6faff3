//! landed-cost: price listings from the command line
//!
//! Usage:
//!   landed-cost quote <weight_kg> <item_price> <tariff_rate> <category_id> [--snap]
//!   landed-cost batch <items.csv>
//!   landed-cost advise <max_quantity> <base_shipping> <incremental_shipping>
//!                      <item_price> <tariff_rate>
//!
//! Tables and policy come from config/default, config/local and LANDED_COST__* env vars.
//! Results are printed as JSON on stdout; logs go to stderr.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use csv::ReaderBuilder;
use landed_cost::config::PricingConfig;
use landed_cost::persistence::{load_category_limits, load_rate_table};
use landed_cost::shipping::{BatchItem, WeightBandConvention};
use landed_cost::types::ShippingRequest;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Serialize)]
struct Report<T: Serialize> {
    generated_at: DateTime<Utc>,
    config: String,
    #[serde(flatten)]
    body: T,
}

/// One line of a batch input file
#[derive(Debug, Deserialize)]
struct BatchRecord {
    id: String,
    #[serde(with = "rust_decimal::serde::str")]
    weight_kg: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    item_price: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    tariff_rate: Decimal,
    category_id: String,
}

fn main() -> Result<()> {
    init_logging();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = args.first().map(String::as_str).unwrap_or("");

    let cfg = PricingConfig::load()?;
    info!("Config: {}", cfg.digest());

    match command {
        "quote" => quote(&cfg, &args[1..]),
        "batch" => batch(&cfg, &args[1..]),
        "advise" => advise(&cfg, &args[1..]),
        _ => bail!(
            "usage: landed-cost <quote|batch|advise> ...\n\
             \x20 quote <weight_kg> <item_price> <tariff_rate> <category_id> [--snap]\n\
             \x20 batch <items.csv>\n\
             \x20 advise <max_quantity> <base_shipping> <incremental_shipping> <item_price> <tariff_rate>"
        ),
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LANDED_COST_LOG_JSON")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn parse_decimal(name: &str, value: Option<&String>) -> Result<Decimal> {
    let raw = value.with_context(|| format!("missing argument <{}>", name))?;
    Decimal::from_str(raw).with_context(|| format!("<{}> is not a decimal: {}", name, raw))
}

fn print_report<T: Serialize>(cfg: &PricingConfig, body: T) -> Result<()> {
    let report = Report {
        generated_at: Utc::now(),
        config: cfg.digest(),
        body,
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&report).context("Failed to serialize report")?
    );
    Ok(())
}

fn quote(cfg: &PricingConfig, args: &[String]) -> Result<()> {
    let mut weight_kg = parse_decimal("weight_kg", args.first())?;
    let item_price = parse_decimal("item_price", args.get(1))?;
    let tariff_rate = parse_decimal("tariff_rate", args.get(2))?;
    let category_id = args.get(3).context("missing argument <category_id>")?.clone();

    if args.iter().any(|a| a == "--snap") {
        let convention = WeightBandConvention::default();
        weight_kg = convention
            .snap_to_tier_key(weight_kg)
            .with_context(|| format!("{}kg is outside the weight band convention", weight_kg))?;
        info!(tier_key = %weight_kg, "Weight snapped to tier key");
    }

    let rates = load_rate_table(&cfg.data.rate_table_path)?;
    let limits = load_category_limits(&cfg.data.category_limits_path)?;
    let calculator = cfg.shipping_calculator()?;

    let request = ShippingRequest {
        actual_weight_kg: weight_kg,
        item_price,
        tariff_rate,
        sales_tax_rate: cfg.policy.sales_tax_rate,
        service_fee: cfg.policy.service_fee,
        category_id,
    };
    let result = calculator.calculate(&request, &rates, &limits);
    if result.is_viable {
        info!(buyer_total = %result.buyer_total(), reason = %result.reason_code, "Quote priced");
    } else {
        warn!(reason = %result.reason_code, "Item cannot be listed as priced");
    }

    #[derive(Serialize)]
    struct QuoteBody {
        request: ShippingRequest,
        result: landed_cost::ShippingCalculationResult,
    }
    print_report(
        cfg,
        QuoteBody {
            request,
            result: result.rounded(),
        },
    )
}

fn batch(cfg: &PricingConfig, args: &[String]) -> Result<()> {
    let path = args.first().context("missing argument <items.csv>")?;
    let file = std::fs::File::open(path).with_context(|| format!("Failed to open {}", path))?;
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let mut items = Vec::new();
    for result in reader.deserialize() {
        let record: BatchRecord = result.context("Failed to deserialize batch record")?;
        items.push(BatchItem {
            id: record.id,
            request: ShippingRequest {
                actual_weight_kg: record.weight_kg,
                item_price: record.item_price,
                tariff_rate: record.tariff_rate,
                sales_tax_rate: cfg.policy.sales_tax_rate,
                service_fee: cfg.policy.service_fee,
                category_id: record.category_id,
            },
        });
    }

    let rates = load_rate_table(&cfg.data.rate_table_path)?;
    let limits = load_category_limits(&cfg.data.category_limits_path)?;
    let calculator = cfg.shipping_calculator()?;
    let mut outcomes = calculator.calculate_batch(&items, &rates, &limits);
    for outcome in &mut outcomes {
        outcome.result = outcome.result.rounded();
    }

    #[derive(Serialize)]
    struct BatchBody {
        outcomes: Vec<landed_cost::shipping::BatchOutcome>,
    }
    print_report(cfg, BatchBody { outcomes })
}

fn advise(cfg: &PricingConfig, args: &[String]) -> Result<()> {
    let max_quantity: u32 = args
        .first()
        .context("missing argument <max_quantity>")?
        .parse()
        .context("<max_quantity> must be a positive integer")?;
    if max_quantity == 0 {
        bail!("<max_quantity> must be at least 1");
    }
    let base = parse_decimal("base_shipping", args.get(1))?;
    let incremental = parse_decimal("incremental_shipping", args.get(2))?;
    let item_price = parse_decimal("item_price", args.get(3))?;
    let tariff_rate = parse_decimal("tariff_rate", args.get(4))?;

    let inputs = cfg.multi_unit_inputs(base, incremental, item_price, tariff_rate);
    let decisions = cfg.advisor().advise_quantities(1..=max_quantity, &inputs)?;

    #[derive(Serialize)]
    struct AdviseBody {
        decisions: Vec<landed_cost::shipping::AdvisorDecision>,
    }
    print_report(cfg, AdviseBody { decisions })
}

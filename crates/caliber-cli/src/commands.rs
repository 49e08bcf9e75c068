use anyhow::{bail, Context};
use caliber_score::{BrandTier, MeanRating, ScoreBreakdown};
use caliber_sdk::{
    Caliber, CaliberConfig, Comment, InMemoryCaliberStore, ProfileStats, Review,
    ThreadDisplayConfig, TreeNode,
};
use caliber_thread::{flatten_for_display, visible_lines, DisplayRow, ThreadLine};
use caliber_types::{Stars, Threadable, Watch};
use colored::Colorize;
use serde::Serialize;

use crate::cli::*;
use crate::fixture::{Fixture, Loaded, ThreadTarget};

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = CaliberConfig::load_or_default(cli.config.as_deref())?;
    match cli.command {
        Command::Score(args) => cmd_score(&config, cli.format, args),
        Command::Tiers(args) => cmd_tiers(&config, cli.format, args),
        Command::Sync(args) => cmd_sync(&config, cli.format, args),
        Command::Thread(args) => cmd_thread(&config, cli.format, args),
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Parse `BRAND/CATEGORY`, splitting at the last slash.
pub fn parse_watch(raw: &str) -> anyhow::Result<Watch> {
    let Some((brand, category)) = raw.rsplit_once('/') else {
        bail!("`{raw}` is not BRAND/CATEGORY");
    };
    let (brand, category) = (brand.trim(), category.trim());
    if brand.is_empty() || category.is_empty() {
        bail!("`{raw}` is not BRAND/CATEGORY");
    }
    Ok(Watch::new(brand, category))
}

fn cmd_score(config: &CaliberConfig, format: OutputFormat, args: ScoreArgs) -> anyhow::Result<()> {
    let engine = config.score.build_engine()?;
    let vault = args
        .watches
        .iter()
        .map(|raw| parse_watch(raw))
        .collect::<anyhow::Result<Vec<_>>>()?;
    let rating = args.rating.map(MeanRating::new).transpose()?;
    let breakdown = engine.breakdown(&vault, rating);

    match format {
        OutputFormat::Json => print_json(&breakdown),
        OutputFormat::Text => {
            for watch in &vault {
                let weight = engine.watch_prestige(watch);
                println!(
                    "  {:<28} {:<14} {:>4}  {}",
                    watch.brand,
                    watch.category.dimmed(),
                    weight,
                    BrandTier::for_weight(weight).label().cyan()
                );
            }
            print_breakdown(&breakdown);
            Ok(())
        }
    }
}

fn print_breakdown(breakdown: &ScoreBreakdown) {
    println!(
        "Base {} + diversity {} ({} categories) x {:.2}",
        breakdown.base,
        breakdown.diversity,
        breakdown.distinct_categories,
        breakdown.multiplier
    );
    println!(
        "{} Legacy Score {}",
        "✓".green().bold(),
        breakdown.total.to_string().yellow().bold()
    );
}

#[derive(Serialize)]
struct TierRow<'a> {
    brand: &'a str,
    weight: u32,
    tier: &'static str,
}

fn cmd_tiers(config: &CaliberConfig, format: OutputFormat, args: TiersArgs) -> anyhow::Result<()> {
    let table = config.score.tier_table()?;
    let rows: Vec<TierRow<'_>> = table
        .entries()
        .into_iter()
        .filter(|(_, weight)| args.min_weight.map_or(true, |min| *weight >= min))
        .map(|(brand, weight)| TierRow {
            brand,
            weight,
            tier: BrandTier::for_weight(weight).label(),
        })
        .collect();

    match format {
        OutputFormat::Json => print_json(&rows),
        OutputFormat::Text => {
            for row in &rows {
                println!("{:>4}  {:<10} {}", row.weight, row.tier.cyan(), row.brand);
            }
            println!(
                "{} brands listed; unlisted brands weigh {}",
                rows.len().to_string().bold(),
                table.default_weight()
            );
            Ok(())
        }
    }
}

#[derive(Serialize)]
struct SyncRow<'a> {
    collector: &'a str,
    #[serde(flatten)]
    stats: ProfileStats,
}

fn cmd_sync(config: &CaliberConfig, format: OutputFormat, args: SyncArgs) -> anyhow::Result<()> {
    let app = Caliber::with_config(InMemoryCaliberStore::new(), config)?;
    let loaded = Fixture::load(&args.fixture)?.apply(&app)?;

    let mut rows = Vec::new();
    for (name, id) in &loaded.collectors {
        if args.collector.as_deref().is_some_and(|only| only != name) {
            continue;
        }
        let stats = app
            .sync_profile(*id)
            .with_context(|| format!("syncing {name}"))?;
        rows.push(SyncRow {
            collector: name,
            stats,
        });
    }
    if let Some(only) = &args.collector {
        if rows.is_empty() {
            bail!("unknown collector `{only}`");
        }
    }

    match format {
        OutputFormat::Json => print_json(&rows),
        OutputFormat::Text => {
            for row in &rows {
                println!(
                    "{:<16} {:>3} pieces {:>3} complications  score {}",
                    row.collector.bold(),
                    row.stats.total_pieces,
                    row.stats.total_complications,
                    row.stats.legacy_score.to_string().yellow()
                );
            }
            Ok(())
        }
    }
}

fn cmd_thread(config: &CaliberConfig, format: OutputFormat, args: ThreadArgs) -> anyhow::Result<()> {
    let app = Caliber::with_config(InMemoryCaliberStore::new(), config)?;
    let loaded = Fixture::load(&args.fixture)?.apply(&app)?;
    let display = app.display_config();
    match loaded.thread_target(&args.target)? {
        ThreadTarget::Rated(target) => {
            print_thread(&app.review_thread(target)?, &loaded, format, args.all, display)
        }
        ThreadTarget::Post(post) => {
            print_thread(&app.comment_thread(post)?, &loaded, format, args.all, display)
        }
    }
}

/// Text shown for one thread item.
trait ThreadText: Threadable {
    fn body(&self) -> &str;

    fn stars(&self) -> Option<Stars> {
        None
    }
}

impl ThreadText for Review {
    fn body(&self) -> &str {
        &self.body
    }

    fn stars(&self) -> Option<Stars> {
        self.stars
    }
}

impl ThreadText for Comment {
    fn body(&self) -> &str {
        &self.body
    }
}

fn print_thread<T: ThreadText + Serialize>(
    forest: &[TreeNode<T>],
    loaded: &Loaded,
    format: OutputFormat,
    all: bool,
    display: &ThreadDisplayConfig,
) -> anyhow::Result<()> {
    if format == OutputFormat::Json {
        return print_json(&forest);
    }
    if forest.is_empty() {
        println!("Nothing posted yet.");
        return Ok(());
    }

    if all {
        for row in flatten_for_display(forest, display.max_indent) {
            print_item(&row, loaded);
        }
        return Ok(());
    }

    for line in visible_lines(forest, &display.view_state(), display) {
        match line {
            ThreadLine::Item(row) => print_item(&row, loaded),
            ThreadLine::ViewReplies { count, indent, .. } => {
                println!("{}{}", "  ".repeat(indent), format!("view {count} replies").dimmed());
            }
            ThreadLine::ShowMore {
                remaining, indent, ..
            } => {
                println!("{}{}", "  ".repeat(indent), format!("show {remaining} more").dimmed());
            }
            ThreadLine::Hide { indent, .. } => {
                println!("{}{}", "  ".repeat(indent), "hide".dimmed());
            }
        }
    }
    Ok(())
}

fn print_item<T: ThreadText>(row: &DisplayRow<'_, T>, loaded: &Loaded) {
    let item = row.item;
    let stars = item
        .stars()
        .map(|s| format!("{} ", "★".repeat(s.get() as usize).yellow()))
        .unwrap_or_default();
    let tallies = item.tallies();
    println!(
        "{}{}{}  {}  {}",
        "  ".repeat(row.indent),
        stars,
        loaded.name_of(item.author()).bold(),
        item.body(),
        format!("+{} -{}", tallies.up, tallies.down).dimmed()
    );
}

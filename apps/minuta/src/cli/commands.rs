//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use crate::api;
use crate::config::{Backend, MinutaConfig, read_bounded};
use minuta_core::{
    Engine, LevelAnalysis, LevelId, MenuId, MinutaError, ModalityId, Nutrient, OverrideBackend,
    RedbOverrides, RequirementScope, SaveRow, WeekPlan, WeeklyCompliance,
};
use std::path::Path;

/// Maximum file size for a save batch (8 MB).
const MAX_SAVE_FILE_SIZE: u64 = 8 * 1024 * 1024;

/// Pretty JSON for `--json-mode`.
fn print_json<T: serde::Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).unwrap_or_default()
    );
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_server(
    config: MinutaConfig,
    host: Option<String>,
    port: Option<u16>,
) -> Result<(), MinutaError> {
    let engine = config.open_engine()?;
    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);

    println!("minuta server starting...");
    println!();
    println!("Configuration:");
    println!("  Host:     {}", host);
    println!("  Port:     {}", port);
    println!("  Backend:  {}", config.backend);
    println!("  Catalog:  {}", config.catalog.display());
    println!("  Database: {}", config.database.display());
    println!();
    println!("Endpoints:");
    println!("  POST /analysis           - Analyze one (menu, level)");
    println!("  POST /analysis/all       - Analyze a menu for every level");
    println!("  POST /analysis/overrides - Save edited weights");
    println!("  POST /analysis/reset     - Discard saved weights");
    println!("  POST /weekly             - Validate a week of menus");
    println!("  GET  /status             - Catalog and override counters");
    println!("  GET  /health             - Health check");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let addr = format!("{}:{}", host, port);
    api::run_server(&addr, engine, config.server.body_limit_bytes).await
}

// =============================================================================
// STATUS COMMAND
// =============================================================================

/// Show catalog and override counters.
pub fn cmd_status(config: &MinutaConfig, json_mode: bool) -> Result<(), MinutaError> {
    let engine = config.open_engine()?;
    let status = engine.status()?;
    let batches = match engine.backend() {
        OverrideBackend::Persistent(redb) => Some(redb.batches_committed()?),
        OverrideBackend::InMemory(_) => None,
    };

    if json_mode {
        let output = serde_json::json!({
            "catalog": config.catalog.to_string_lossy(),
            "database": config.database.to_string_lossy(),
            "backend": config.backend,
            "menus": status.menus,
            "compositions": status.compositions,
            "levels": status.levels,
            "saved_analyses": status.saved_analyses,
            "batches_committed": batches,
        });
        print_json(&output);
        return Ok(());
    }

    println!("minuta Status");
    println!("=============");
    println!("Catalog:  {}", config.catalog.display());
    println!("Backend:  {}", config.backend);
    if engine.is_persistent() {
        println!("Database: {}", config.database.display());
    }
    println!();
    println!("Menus:          {}", status.menus);
    println!("Compositions:   {}", status.compositions);
    println!("School levels:  {}", status.levels);
    println!("Saved analyses: {}", status.saved_analyses);
    if let Some(batches) = batches {
        println!("Saved batches:  {}", batches);
    }

    Ok(())
}

// =============================================================================
// ANALYZE COMMAND
// =============================================================================

/// Analyze a menu for one level, or for every level.
pub fn cmd_analyze(
    config: &MinutaConfig,
    json_mode: bool,
    menu: u64,
    level: Option<u64>,
) -> Result<(), MinutaError> {
    let engine = config.open_engine()?;
    let analyses = match level {
        Some(level) => vec![engine.analyze(MenuId(menu), LevelId(level))?],
        None => engine.analyze_all_levels(MenuId(menu))?,
    };

    if json_mode {
        match analyses.as_slice() {
            [single] if level.is_some() => print_json(single),
            all => print_json(&all),
        }
        return Ok(());
    }

    for analysis in &analyses {
        print_analysis(analysis);
        println!();
    }
    Ok(())
}

fn print_analysis(analysis: &LevelAnalysis) {
    println!(
        "{} - {} (menu {}, level {})",
        analysis.menu_name, analysis.level_name, analysis.menu, analysis.level
    );
    println!("{}", "=".repeat(60));

    match analysis.requirement_scope {
        RequirementScope::Scoped => {}
        RequirementScope::LevelOnly => println!("Requirement: level-only fallback"),
        RequirementScope::Missing => println!("Requirement: none configured, percentages are 0"),
    }
    if let Some(reference) = analysis.reference_adequacy {
        println!("Reference adequacy: {:.1}%", reference);
    }

    for prep in &analysis.preparations {
        println!();
        println!("{}", prep.name);
        for row in &prep.ingredients {
            let flag = if row.composition_found { "" } else { "  [no composition]" };
            println!(
                "  {:<8} {:<28} net {:>7.1} g  gross {:>7.1} g  {:>7.1} kcal{}",
                row.ingredient.as_str(),
                row.name,
                row.net_weight,
                row.gross_weight,
                row.values.calorias,
                flag
            );
        }
    }

    println!();
    println!(
        "{:<14} {:>10} {:>10} {:>8}  state",
        "nutrient", "total", "target", "%"
    );
    for nutrient in Nutrient::ALL {
        let adequacy = analysis.adequacy.get(&nutrient);
        println!(
            "{:<14} {:>10.2} {:>10.2} {:>8.1}  {}",
            format!("{} ({})", nutrient, nutrient.unit()),
            analysis.totals.nutrients.get(nutrient),
            analysis.requirement.get(nutrient),
            adequacy.map_or(0.0, |a| a.percentage),
            adequacy.map_or("-", |a| a.state.as_str()),
        );
    }

    if analysis.override_count > 0 {
        println!();
        println!("{} ingredient rows use saved weights", analysis.override_count);
    }
}

// =============================================================================
// SAVE COMMAND
// =============================================================================

/// Save a batch of edited weights read from a JSON file.
pub fn cmd_save(
    config: &MinutaConfig,
    json_mode: bool,
    menu: u64,
    level: u64,
    file: &Path,
    user: &str,
) -> Result<(), MinutaError> {
    let contents = read_bounded(file, MAX_SAVE_FILE_SIZE)?;
    let rows: Vec<SaveRow> = serde_json::from_slice(&contents)
        .map_err(|e| MinutaError::SerializationError(format!("save batch: {}", e)))?;
    if config.backend == Backend::Memory {
        tracing::warn!("memory backend: saved weights are discarded on exit");
    }

    let mut engine = config.open_engine()?;
    let outcome = engine.save_override(MenuId(menu), LevelId(level), &rows, user)?;

    if json_mode {
        print_json(&outcome);
        return Ok(());
    }

    println!("Saved {} row(s), {} failed", outcome.saved.len(), outcome.failed.len());
    for failure in &outcome.failed {
        println!(
            "  preparation {} ingredient {}: {}",
            failure.preparation, failure.ingredient, failure.reason
        );
    }
    match &outcome.summary {
        Some(summary) => {
            println!();
            println!("Revision {} by {}", summary.revision, summary.updated_by);
            for (nutrient, pct) in summary.percentages.iter() {
                println!("  {:<14} {:>8.1}%", nutrient.key(), pct);
            }
        }
        None => println!("Nothing written"),
    }
    Ok(())
}

// =============================================================================
// RESET COMMAND
// =============================================================================

/// Discard saved overrides for a (menu, level).
pub fn cmd_reset(
    config: &MinutaConfig,
    json_mode: bool,
    menu: u64,
    level: u64,
) -> Result<(), MinutaError> {
    let mut engine = config.open_engine()?;
    let removed = engine.reset_overrides(MenuId(menu), LevelId(level))?;

    if json_mode {
        print_json(&serde_json::json!({
            "menu": menu,
            "level": level,
            "removed": removed,
        }));
    } else if removed {
        println!("Saved weights for menu {} level {} discarded", menu, level);
    } else {
        println!("Menu {} level {} had no saved weights", menu, level);
    }
    Ok(())
}

// =============================================================================
// WEEKLY COMMAND
// =============================================================================

/// Validate a week of menus.
pub fn cmd_weekly(
    config: &MinutaConfig,
    json_mode: bool,
    modality: u64,
    menus: &[u64],
) -> Result<(), MinutaError> {
    let plan = WeekPlan::new(menus.iter().copied().map(MenuId).collect())?;
    let engine = config.open_engine()?;
    let report = engine.validate_week(ModalityId(modality), &plan)?;

    if json_mode {
        print_json(&report);
        return Ok(());
    }

    print_weekly(&report);
    Ok(())
}

fn verdict(complies: bool) -> &'static str {
    if complies { "OK" } else { "FAIL" }
}

fn print_weekly(report: &WeeklyCompliance) {
    println!("Weekly compliance - modality {}", report.modality);
    println!("{}", "=".repeat(60));
    for day in &report.days {
        println!("  {:<10} {}", day.label, day.menu_name);
    }

    println!();
    println!("{:<24} {:>8} {:>9} {:>6}", "group", "required", "effective", "actual");
    for group in &report.groups {
        println!(
            "{:<24} {:>8} {:>9} {:>6}  {}",
            group.group_name,
            group.required,
            group.effective_required,
            group.actual,
            verdict(group.complies)
        );
        if let Some(exclusion) = &group.exclusion {
            println!(
                "    shared with '{}': {} of {} combined",
                exclusion.set_name, exclusion.combined_usage, exclusion.shared_frequency
            );
        }
    }

    if !report.restrictions.is_empty() {
        println!();
        for restriction in &report.restrictions {
            println!(
                "{:<24} {:>8} {:>9} {:>6}  {}",
                restriction.name,
                restriction.required,
                "",
                restriction.actual,
                verdict(restriction.complies)
            );
            for hit in &restriction.hits {
                println!(
                    "    day {}: {} in {}",
                    hit.day + 1,
                    hit.ingredient_name,
                    hit.preparation_name
                );
            }
        }
    }

    println!();
    if report.complies {
        println!("Week complies");
    } else {
        println!("Week does not comply: {}", report.failures().join(", "));
    }
}

// =============================================================================
// INIT COMMAND
// =============================================================================

/// Create the override database, or compact an existing one.
pub fn cmd_init(config: &MinutaConfig, force: bool) -> Result<(), MinutaError> {
    if config.backend == Backend::Memory {
        println!("Memory backend: nothing to initialize");
        return Ok(());
    }

    let path = &config.database;
    if path.exists() {
        if force {
            std::fs::remove_file(path)
                .map_err(|e| MinutaError::IoError(format!("Remove {}: {}", path.display(), e)))?;
            tracing::info!(database = %path.display(), "existing database removed");
        } else {
            let mut store = RedbOverrides::open(path)?;
            store.compact()?;
            println!("Database {} already exists; compacted", path.display());
            return Ok(());
        }
    }

    RedbOverrides::open(path)?;
    println!("Initialized database at {}", path.display());

    // Catalog is optional here.
    if config.catalog.exists() {
        let engine = Engine::new(crate::config::load_catalog(&config.catalog)?);
        let status = engine.status()?;
        println!(
            "Catalog {}: {} menus, {} compositions",
            config.catalog.display(),
            status.menus,
            status.compositions
        );
    }
    Ok(())
}

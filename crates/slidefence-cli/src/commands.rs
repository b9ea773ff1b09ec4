use std::io::Write;

use serde_json::json;
use slidefence_core::EngineOptions;
use slidefence_report::{FixSuggestions, OverflowReport};

use crate::cli::{CheckConfigArgs, SuggestArgs, SummaryArgs};
use crate::error::{CliError, Result};

pub(crate) fn run_summary(args: &SummaryArgs, json: bool, out: &mut dyn Write) -> Result<()> {
    let report = OverflowReport::from_path(&args.report)?;
    let summary = report.summary;

    if json {
        let slides: Vec<_> = report
            .overflow_slides
            .iter()
            .map(|s| {
                json!({
                    "index": s.index,
                    "indices": s.indices,
                    "title": s.title,
                    "overflowAmount": s.overflow_amount,
                })
            })
            .collect();
        let body = json!({
            "status": "ok",
            "report": args.report.display().to_string(),
            "summary": summary,
            "overflowSlides": slides,
        });
        writeln!(out, "{}", serde_json::to_string_pretty(&body)?)?;
    } else {
        writeln!(
            out,
            "slides: {} total, {} ok, {} overflow",
            summary.total, summary.ok, summary.overflow
        )?;
        for s in &report.overflow_slides {
            writeln!(
                out,
                "  #{:<3} [{}] {:?}: vertical {}px, horizontal {}px",
                s.index,
                s.indices,
                s.title,
                s.overflow_amount.vertical,
                s.overflow_amount.horizontal
            )?;
        }
    }

    tracing::info!(
        target: "slidefence.cli",
        report = %args.report.display(),
        total = summary.total,
        overflow = summary.overflow,
        "report summarized"
    );

    if args.fail_on_overflow && summary.overflow > 0 {
        return Err(CliError::exit(
            2,
            format!("{} of {} slides overflow", summary.overflow, summary.total),
        ));
    }
    Ok(())
}

pub(crate) fn run_suggest(args: &SuggestArgs, json: bool, out: &mut dyn Write) -> Result<()> {
    let report = OverflowReport::from_path(&args.report)?;
    let suggestions = FixSuggestions::from_report(&report);

    if let Some(path) = &args.output {
        suggestions.write_to(path)?;
        tracing::info!(target: "slidefence.cli", path = %path.display(), fixes = suggestions.fixes.len(), "suggestions written");
    }

    if json {
        writeln!(out, "{}", suggestions.to_json_pretty()?)?;
        return Ok(());
    }

    if suggestions.fixes.is_empty() {
        writeln!(out, "no fixes suggested")?;
    }
    for fix in &suggestions.fixes {
        writeln!(
            out,
            "{:<8} {}: {}px - {}",
            fix.severity.as_str(),
            fix.file,
            fix.overflow,
            fix.action.as_str()
        )?;
    }
    if !suggestions.dense_slide_files.is_empty() {
        writeln!(out, "dense-slide candidates:")?;
        for file in &suggestions.dense_slide_files {
            writeln!(out, "  {file}")?;
        }
    }
    if let Some(path) = &args.output {
        writeln!(out, "wrote {}", path.display())?;
    }
    Ok(())
}

pub(crate) fn run_check_config(
    args: &CheckConfigArgs,
    json: bool,
    out: &mut dyn Write,
) -> Result<()> {
    let options =
        EngineOptions::from_path(&args.path).map_err(|e| CliError::config(&args.path, e))?;
    let config = options
        .clone()
        .build()
        .map_err(|e| CliError::config(&args.path, e))?;

    if json {
        let body = json!({
            "status": "ok",
            "path": args.path.display().to_string(),
            "options": options,
        });
        writeln!(out, "{}", serde_json::to_string_pretty(&body)?)?;
        return Ok(());
    }

    let exclude: Vec<String> = config
        .exclude_selectors()
        .iter()
        .map(ToString::to_string)
        .collect();
    let readiness = config
        .readiness_timeout()
        .map_or_else(|| "none".to_string(), |t| format!("{}ms", t.as_millis()));
    writeln!(out, "ok: {}", args.path.display())?;
    writeln!(out, "  mode: {}", config.mode())?;
    writeln!(out, "  threshold: {}px", config.threshold())?;
    writeln!(out, "  checkInterval: {}ms", config.check_interval().as_millis())?;
    writeln!(out, "  maxIterations: {}", config.max_iterations())?;
    writeln!(out, "  readinessTimeout: {readiness}")?;
    writeln!(out, "  enableLogs: {}", config.enable_logs())?;
    writeln!(out, "  autoResize: {}", config.auto_resize())?;
    writeln!(out, "  constrainContainer: {}", config.constrain_container())?;
    writeln!(out, "  exclude: {}", exclude.join(", "))?;
    Ok(())
}

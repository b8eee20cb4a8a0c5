use anyhow::Result;
use std::io::Write;
use std::sync::Arc;
use tfguard_policy::{Check, Report};

use crate::Output;

pub fn write(report: &Report, output: Output, w: &mut impl Write) -> Result<()> {
    match output {
        Output::Json => {
            serde_json::to_writer_pretty(&mut *w, report)?;
            writeln!(w)?;
        }
        Output::Text => write_text(report, w)?,
    }
    Ok(())
}

fn write_text(report: &Report, w: &mut impl Write) -> Result<()> {
    let s = &report.summary;
    writeln!(
        w,
        "Passed checks: {}, Failed checks: {}, Skipped checks: {} ({} resources)",
        s.passed, s.failed, s.skipped, s.resources
    )?;
    for r in &report.records {
        writeln!(w)?;
        writeln!(w, "Check: {}: \"{}\"", r.check_id, r.check_name)?;
        writeln!(w, "\t{} for resource: {}", r.verdict, r.resource)?;
        if let Some(file) = &r.file {
            writeln!(w, "\tFile: {}", file.display())?;
        }
        if let Some(url) = &r.guideline {
            writeln!(w, "\tGuide: {url}")?;
        }
    }
    Ok(())
}

pub fn list<'a>(checks: impl Iterator<Item = &'a Arc<dyn Check>>, w: &mut impl Write) -> Result<()> {
    for check in checks {
        let meta = check.metadata();
        writeln!(w, "{}\t{}\t{}", meta.id, meta.supported_resources.join(","), meta.name)?;
    }
    Ok(())
}

use crate::input::path_display;
use crate::pipeline::stage1_load::AnalysisCtx;

pub fn render_report(ctx: &AnalysisCtx) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Your dataset contains data for {} animals.\n\n",
        ctx.n_animals
    ));

    out.push_str("Identified variables:\n");
    for factor in &ctx.factors {
        out.push_str(&format!("  - {factor}\n"));
    }

    out.push_str("\nAvailable metrics:\n");
    for metric in &ctx.metrics {
        out.push_str(&format!("  - {metric}\n"));
    }

    if !ctx.skipped.is_empty() {
        out.push_str(&format!(
            "\nSkipped files ({} of {} listed):\n",
            ctx.skipped.len(),
            ctx.metadata_rows
        ));
        for skipped in &ctx.skipped {
            out.push_str(&format!(
                "  - {} ({}, {}): {}\n",
                path_display(&skipped.path),
                skipped.animal_id,
                skipped.timepoint,
                skipped.reason
            ));
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/src_inline/report/text.rs"]
mod tests;

//! `askdb ask`: answer a single question.

use std::time::Instant;

use console::style;

use askdb_core::database::SqlDatabase;
use askdb_core::pipeline::QueryPipeline;

use super::chat::renderer::ChatRenderer;
use super::spinner;

pub async fn ask<D: SqlDatabase>(
    pipeline: &QueryPipeline<D>,
    question: &str,
    show_sql: bool,
    json: bool,
    quiet: bool,
) -> anyhow::Result<()> {
    if json || quiet {
        let answer = pipeline.run(question).await?;
        if json {
            println!("{}", serde_json::to_string_pretty(&answer)?);
        } else {
            println!("{}", answer.answer);
        }
        return Ok(());
    }

    let spinner = spinner("thinking...");
    let start = Instant::now();
    let mut answering = false;
    let result = pipeline
        .run_streaming(question, |_| {
            if !answering {
                answering = true;
                spinner.set_message("writing the answer...");
            }
        })
        .await;
    spinner.finish_and_clear();
    let answer = result?;

    let renderer = ChatRenderer::new();
    println!();
    println!("  {}", renderer.render_final(&answer.answer).trim_end());
    if show_sql {
        println!();
        renderer.print_sql(
            &answer.sql,
            answer
                .repair
                .as_ref()
                .map(|r| (r.failed_sql.as_str(), r.error.as_str())),
        );
    } else if answer.was_repaired() {
        println!(
            "\n  {}",
            style("(the first query failed and was regenerated; --show-sql for details)").dim()
        );
    }
    renderer.print_stats_footer(
        answer.result.row_count(),
        start.elapsed(),
        &pipeline.settings().model,
    );
    println!();
    Ok(())
}

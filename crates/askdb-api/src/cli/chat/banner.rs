//! Welcome banner shown when a chat session starts.

use console::style;

/// Print the dialect, model and schema mode, plus a hint about slash commands.
pub fn print_welcome_banner(dialect: &str, model: &str, retrieval: bool) {
    let mode = if retrieval {
        "retrieved schema chunks"
    } else {
        "full schema"
    };

    println!();
    println!("  {} {}", style("?").cyan().bold(), style("askdb").cyan().bold());
    println!(
        "  {}",
        style("Ask questions about your database in plain language.").dim()
    );
    println!();
    println!("  {}  {}", style("Database:").bold(), style(dialect).dim());
    println!("  {}     {}", style("Model:").bold(), style(model).dim());
    println!("  {}    {}", style("Schema:").bold(), style(mode).dim());
    println!();
    println!(
        "  {}",
        style("Type /help for commands, Ctrl+D to exit").dim()
    );
    println!("  {}", style("---").dim());
    println!();
}

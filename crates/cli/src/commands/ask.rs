//! `askbook ask` and `askbook lucky`: Ask the book from the terminal.

use std::path::Path;

use askbook_pipeline::AskOutcome;

use super::load_config;

pub async fn run(
    config_path: Option<&Path>,
    question: &str,
    show_context: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config_path)?;
    let flow = askbook_gateway::build_flow(&config).await?;

    let outcome = flow.ask(question).await?;
    print_outcome(&outcome, show_context);
    Ok(())
}

pub async fn lucky(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config_path)?;
    let flow = askbook_gateway::build_flow(&config).await?;

    let outcome = flow.lucky().await?;
    print_outcome(&outcome, false);
    Ok(())
}

fn print_outcome(outcome: &AskOutcome, show_context: bool) {
    println!("Q: {}", outcome.question);
    println!();
    println!("A: {}", outcome.answer);
    println!();

    let source = if outcome.cached { "cache" } else { "model" };
    println!(
        "   (from {source}, asked {} time{})",
        outcome.ask_count,
        if outcome.ask_count == 1 { "" } else { "s" }
    );

    if show_context {
        println!();
        println!("── Context ──");
        println!("{}", outcome.context);
    }
}

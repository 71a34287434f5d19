//! CLI handlers for `plankit tool` subcommands.

use anyhow::{Context, Result};

use plankit_core::tools::{ToolContext, ToolRegistry};

use crate::ToolCommands;

pub async fn run_tool_command(command: ToolCommands, ctx: &ToolContext) -> Result<()> {
    let registry = ToolRegistry::builtin()?;
    match command {
        ToolCommands::List { json } => {
            let descriptors = registry.describe();
            if json {
                println!("{}", serde_json::to_string_pretty(&descriptors)?);
            } else {
                let name_w = descriptors.iter().map(|d| d.name.len()).max().unwrap_or(4);
                for d in &descriptors {
                    println!("{:<name_w$}  {}", d.name, d.description);
                }
            }
        }
        ToolCommands::Call { name, args } => {
            let args: serde_json::Value =
                serde_json::from_str(&args).context("--args is not valid JSON")?;
            let result = registry.call(&name, ctx, args).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }
    Ok(())
}

//! Command execution.

use crate::Commands;
use colored::Colorize;
use filepool_client::Client;
use std::path::Path;

/// Executes a command and returns the formatted output.
pub async fn execute(client: &Client, cmd: Commands) -> Result<String, Box<dyn std::error::Error>> {
    match cmd {
        Commands::List => {
            let names = client.list().await?;
            if names.is_empty() {
                return Ok("No files stored".yellow().to_string());
            }

            let mut output = String::new();
            for name in &names {
                output.push_str(name);
                output.push('\n');
            }
            output.push_str(&format!("{} file(s)", names.len()).dimmed().to_string());
            Ok(output)
        }

        Commands::Get { name, output } => {
            let data = client.download(&name).await?;
            let target = output.unwrap_or_else(|| Path::new(&name).to_path_buf());
            std::fs::write(&target, &data)?;
            Ok(format!(
                "{} {} ({} bytes) -> {}",
                "Downloaded".green(),
                name.cyan(),
                data.len(),
                target.display()
            ))
        }

        Commands::Put { path, name } => {
            let data = std::fs::read(&path)?;
            let name = match name {
                Some(name) => name,
                None => path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .map(str::to_string)
                    .ok_or_else(|| format!("cannot derive a file name from {:?}", path))?,
            };

            client.upload(&name, &data).await?;
            Ok(format!(
                "{} {} ({} bytes)",
                "Uploaded".green(),
                name.cyan(),
                data.len()
            ))
        }

        Commands::Delete { name } => {
            client.delete(&name).await?;
            Ok(format!("{} {}", "Deleted".green(), name.cyan()))
        }
    }
}

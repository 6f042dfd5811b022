use anyhow::Context;
use biblio_app::{shutdown_signal, Application};
use biblio_kernel::settings::Settings;
use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "biblio", about = "Book catalogue service", version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP service (default)
    Serve {
        /// Override the configured listen port
        #[arg(long)]
        port: Option<u16>,
    },
    /// Print the effective settings as JSON
    Settings,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut settings = Settings::load().with_context(|| "failed to load BIBLIO settings")?;

    match cli.command.unwrap_or(Command::Serve { port: None }) {
        Command::Settings => {
            let rendered = serde_json::to_string_pretty(&settings)
                .context("failed to render settings")?;
            println!("{rendered}");
            Ok(())
        }
        Command::Serve { port } => {
            if let Some(port) = port {
                settings.server.port = port;
            }
            biblio_telemetry::init(&settings.telemetry)?;
            tracing::info!(env = ?settings.environment, "biblio serve starting");

            let app = Application::bootstrap(settings).await?;
            app.run(shutdown_signal()).await
        }
    }
}

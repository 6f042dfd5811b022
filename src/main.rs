use anyhow::Context;
use biblio_app::{shutdown_signal, Application};
use biblio_kernel::settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().with_context(|| "failed to load BIBLIO settings")?;
    biblio_telemetry::init(&settings.telemetry)?;

    tracing::info!(
        env = ?settings.environment,
        db = %settings.database.url,
        "biblio-app bootstrap starting"
    );

    let app = Application::bootstrap(settings).await?;
    app.run(shutdown_signal()).await
}

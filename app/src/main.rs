use crate::prompt::Prompt;
use engine::Settings;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod menu;
mod prompt;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    setup_logging()?;

    let settings = Settings::from_env()?;
    let mut prompt = Prompt::stdin();
    menu::run(&mut prompt, &settings).await?;
    Ok(())
}

fn setup_logging() -> anyhow::Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

use planner_app::app::{run, AppConfig};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let config = AppConfig::from_env()?;
    if let Err(err) = run(config) {
        tracing::error!(%err, "weekly planner failed");
        return Err(err);
    }
    Ok(())
}

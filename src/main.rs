//! Process entry: env → settings → logging → one pipeline cycle.

use aetherborn_swarm::error::PipelineError;
use aetherborn_swarm::logging;
use aetherborn_swarm::pipeline::{self, RunOutcome};
use aetherborn_swarm::settings::Settings;
use tracing::{error, info, warn};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main(flavor = "current_thread")]
async fn main() {
    dotenv::dotenv().ok();

    let settings = match Settings::from_env() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("configuration error: {e:#}");
            std::process::exit(2);
        }
    };

    let _guard = logging::init(&settings.log_dir);

    info!("AETHERBORN SWARM v{VERSION}");
    info!(
        "mode: {} | risk: {} ({})",
        settings.mode.as_str(),
        settings.risk.code(),
        settings.risk.label()
    );
    info!("endpoint: {}", settings.rpc_url);

    match pipeline::run(&settings).await {
        // Completed runs exit zero, including a partial fee-leg failure.
        Ok(RunOutcome::StandDown) => info!("cycle complete: stand down"),
        Ok(RunOutcome::Simulated) => info!("cycle complete: simulated"),
        Ok(RunOutcome::LiveDry) => {
            warn!("cycle complete: live, no submission (vault unavailable)")
        }
        Ok(RunOutcome::Live {
            fee_leg_failed: true,
            ..
        }) => warn!("cycle complete: principal settled, fee leg failed"),
        Ok(RunOutcome::Live { .. }) => info!("cycle complete: both legs settled"),
        Err(e) => {
            error!("cycle aborted: {e}");
            let code = match e {
                PipelineError::MissingFile(_) | PipelineError::InvalidCredential { .. } => 2,
                _ => 1,
            };
            std::process::exit(code);
        }
    }
}

use anyhow::Result;
use tracing::{debug, info, trace};

use super::initdb::connect_and_migrate;
use super::serve::run_server;
use crate::config::{Settings, build_mailer, build_app_state};

pub async fn migrate_and_serve(settings: Settings) -> Result<()> {
    trace!("Entering migrate_and_serve function");
    info!("Applying database migrations and starting server");
    debug!("Database URL: {}", settings.database_url);

    let db = connect_and_migrate(&settings.database_url).await?;

    let bind_address = settings.bind_address.clone();
    let mailer = build_mailer(&settings.email)?;
    let state = build_app_state(db, settings, mailer)?;
    debug!("Application state initialized successfully");

    run_server(state, &bind_address).await
}

use std::sync::Arc;
use tracing::{error, info};

use console_log_sink::init::init_tracing;
use console_log_sink::{Base, ConsoleLogger};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let base = Arc::new(Base::new());
    base.set_attr("service", "auth");
    base.add_logger(Box::new(ConsoleLogger::new(None)))?;
    base.init_loggers()?;

    init_tracing(Arc::clone(&base));

    info!("starting service");

    error!(
        user_id = 42,
        reason = "invalid password",
        "authentication failed"
    );

    base.shutdown_loggers()?;
    Ok(())
}

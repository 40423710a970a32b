use console_log_sink::{Attrs, Base, ConsoleLogger, ConsoleLoggerConfig, LogLevel, Template};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut logger = ConsoleLogger::new(Some(ConsoleLoggerConfig::from_env()));
    logger.set_template(Some(Template::new(
        "{{.Timestamp}} [{{color}}{{ucase .LevelName}}{{reset}}] {{.Message}}\
         {{range $key, $val := .Attrs}} {{$key}}={{$val}}{{end}}",
    )?))?;

    let base = Base::from_env();
    base.set_attr("service", "billing");
    base.add_logger(Box::new(logger))?;
    base.init_loggers()?;

    base.info("service started")?;

    let request: Attrs = [("request_id".to_string(), serde_json::json!("a1b2"))]
        .into_iter()
        .collect();
    let adapter = base.new_log_adapter(request);
    adapter.log(LogLevel::Warning, format_args!("slow response: {}ms", 1250))?;
    adapter.log(LogLevel::Error, "payment provider unreachable")?;

    base.shutdown_loggers()?;
    Ok(())
}

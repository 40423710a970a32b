use chrono::Utc;
use console_log_sink::{
    Attrs, Base, ConsoleLogger, ConsoleLoggerConfig, LogLevel, Logger, LoggerError, MemoryWriter,
    Template,
};
use serde_json::json;
use std::sync::Arc;

const ATTRS_TEMPLATE: &str = "[{{color}}{{ucase .LevelName}}{{reset}}] {{.Message}}\
    {{if .Attrs}}{{range $key, $val := .Attrs}}\n   {{$key}}: {{$val}}{{end}}{{end}}";

fn attrs(value: serde_json::Value) -> Attrs {
    serde_json::from_value(value).unwrap()
}

fn logger_with_writer(colorize: bool) -> (ConsoleLogger, Arc<MemoryWriter>) {
    let cfg = ConsoleLoggerConfig::default().with_colorize(colorize);
    let mut logger = ConsoleLogger::new(Some(cfg));
    let w = Arc::new(MemoryWriter::new());
    logger.set_writer(w.clone());
    (logger, w)
}

#[test]
fn string_formatting_through_base() {
    let base = Base::new();
    base.init_loggers().unwrap();

    let (logger, w) = logger_with_writer(false);
    base.add_logger(Box::new(logger)).unwrap();

    base.debug(format_args!("msg {}%", 100)).unwrap();
    base.shutdown_loggers().unwrap();

    assert_eq!(w.output(), vec!["[DEBUG] msg 100%\n"]);
}

#[test]
fn attrs_merged_from_base_and_adapter() {
    let base = Base::new();
    base.set_attr("base_attr", "foo");
    base.init_loggers().unwrap();

    let (mut logger, w) = logger_with_writer(false);
    logger
        .set_template(Some(Template::new(ATTRS_TEMPLATE).unwrap()))
        .unwrap();
    base.add_logger(Box::new(logger)).unwrap();

    let adapter = base.new_log_adapter(attrs(json!({"adapter_attr": "bar"})));
    adapter
        .logm(
            LogLevel::Debug,
            Some(&attrs(json!({"log_attr": "baz"}))),
            format_args!("msg {}%", 100),
        )
        .unwrap();

    base.shutdown_loggers().unwrap();

    assert_eq!(
        w.output(),
        vec!["[DEBUG] msg 100%\n   adapter_attr: bar\n   base_attr: foo\n   log_attr: baz\n"]
    );
}

#[test]
fn call_attrs_override_base_attrs_in_output() {
    let base = Base::new();
    base.set_attr("attr1", 7890);
    base.set_attr("attr2", "val2");

    let (mut logger, w) = logger_with_writer(false);
    logger
        .set_template(Some(Template::new(ATTRS_TEMPLATE).unwrap()))
        .unwrap();
    base.add_logger(Box::new(logger)).unwrap();

    base.logm(
        LogLevel::Debug,
        Some(&attrs(json!({"attr1": 4321, "attr3": "val3"}))),
        "test 1234",
    )
    .unwrap();

    assert_eq!(
        w.output(),
        vec!["[DEBUG] test 1234\n   attr1: 4321\n   attr2: val2\n   attr3: val3\n"]
    );
}

#[test]
fn adapter_attrs_sit_between_base_and_call() {
    let base = Base::new();
    base.set_attr("who", "base");

    let (mut logger, w) = logger_with_writer(false);
    logger
        .set_template(Some(Template::new("{{.Attrs.who}}").unwrap()))
        .unwrap();
    base.add_logger(Box::new(logger)).unwrap();

    let adapter = base.new_log_adapter(attrs(json!({"who": "adapter"})));
    adapter
        .logm(LogLevel::Info, Some(&attrs(json!({"who": "call"}))), "m")
        .unwrap();
    adapter.logm(LogLevel::Info, None, "m").unwrap();
    base.info("m").unwrap();

    assert_eq!(w.output(), vec!["call\n", "adapter\n", "base\n"]);
}

#[test]
fn base_attrs_hidden_by_default_template() {
    let base = Base::new();
    base.set_attr("attr1", 7890);

    let (logger, w) = logger_with_writer(false);
    base.add_logger(Box::new(logger)).unwrap();
    base.logm(LogLevel::Debug, Some(&attrs(json!({"attr3": "val3"}))), "test 1234")
        .unwrap();

    assert_eq!(w.output(), vec!["[DEBUG] test 1234\n"]);
}

#[test]
fn set_template_rejects_none_and_keeps_previous() {
    let (mut logger, w) = logger_with_writer(false);

    logger.logm(Utc::now(), LogLevel::Info, None, "before").unwrap();

    let err = logger.set_template(None).unwrap_err();
    assert_eq!(err, LoggerError::InvalidTemplate);

    logger.logm(Utc::now(), LogLevel::Info, None, "after").unwrap();
    assert_eq!(w.output(), vec!["[INFO] before\n", "[INFO] after\n"]);

    logger
        .set_template(Some(Template::new("").unwrap()))
        .unwrap();
    logger.logm(Utc::now(), LogLevel::Info, None, "empty").unwrap();
    assert_eq!(w.output().last().map(String::as_str), Some("\n"));
}

#[test]
fn lifecycle_flag() {
    let mut logger = ConsoleLogger::new(None);
    assert!(!logger.is_initialized());

    logger.init_logger().unwrap();
    logger.init_logger().unwrap();
    assert!(logger.is_initialized());

    logger.shutdown_logger().unwrap();
    logger.shutdown_logger().unwrap();
    assert!(!logger.is_initialized());
}

#[test]
fn colored_fatal() {
    let (logger, w) = logger_with_writer(true);
    logger.logm(Utc::now(), LogLevel::Fatal, None, "test").unwrap();
    assert_eq!(w.output(), vec!["[\x1b[1;31mFATAL\x1b[0m] test\n"]);
}

#[test]
fn colored_levels_use_their_codes() {
    let (logger, w) = logger_with_writer(true);
    for level in LogLevel::ALL {
        logger.logm(Utc::now(), level, None, "x").unwrap();
    }
    assert_eq!(
        w.output(),
        vec![
            "[\x1b[36mDEBUG\x1b[0m] x\n",
            "[\x1b[32mINFO\x1b[0m] x\n",
            "[\x1b[33mWARNING\x1b[0m] x\n",
            "[\x1b[31mERROR\x1b[0m] x\n",
            "[\x1b[1;31mFATAL\x1b[0m] x\n",
        ]
    );
}

#[test]
fn no_escapes_without_colorize() {
    let (mut logger, w) = logger_with_writer(false);
    logger
        .set_template(Some(
            Template::new("{{color}}{{.LevelName}}{{reset}} {{paint .Message}}").unwrap(),
        ))
        .unwrap();
    for level in LogLevel::ALL {
        logger.logm(Utc::now(), level, None, "plain").unwrap();
    }
    assert_eq!(w.len(), 5);
    assert!(w.output().iter().all(|line| !line.contains("\x1b[")));
}

#[test]
fn per_level_writers() {
    let info = Arc::new(MemoryWriter::new());
    let errors = Arc::new(MemoryWriter::new());
    let cfg = ConsoleLoggerConfig::default()
        .with_colorize(false)
        .with_writer(LogLevel::Info, info.clone())
        .with_writer(LogLevel::Error, errors.clone())
        .with_writer(LogLevel::Fatal, errors.clone());
    let logger = ConsoleLogger::new(Some(cfg));

    logger.logm(Utc::now(), LogLevel::Info, None, "hello").unwrap();
    logger.logm(Utc::now(), LogLevel::Error, None, "oops").unwrap();
    logger.logm(Utc::now(), LogLevel::Fatal, None, "dead").unwrap();

    assert_eq!(info.output(), vec!["[INFO] hello\n"]);
    assert_eq!(errors.output(), vec!["[ERROR] oops\n", "[FATAL] dead\n"]);
}

#[test]
fn unresolvable_level_writes_nothing() {
    let info = Arc::new(MemoryWriter::new());
    let cfg = ConsoleLoggerConfig::default()
        .with_colorize(false)
        .with_writer(LogLevel::Info, info.clone())
        .without_stdout_fallback();
    let logger = ConsoleLogger::new(Some(cfg));

    let err = logger
        .logm(Utc::now(), LogLevel::Warning, None, "lost")
        .unwrap_err();
    assert_eq!(err, LoggerError::UnsupportedLevel(LogLevel::Warning));
    assert!(info.is_empty());

    logger.logm(Utc::now(), LogLevel::Info, None, "kept").unwrap();
    assert_eq!(info.output(), vec!["[INFO] kept\n"]);
}

#[test]
fn render_error_propagates_through_base() {
    let base = Base::new();
    let (mut logger, w) = logger_with_writer(false);
    logger
        .set_template(Some(Template::new("{{.NoSuchField}}").unwrap()))
        .unwrap();
    base.add_logger(Box::new(logger)).unwrap();

    let err = base.info("x").unwrap_err();
    assert!(matches!(err, LoggerError::Render(_)));
    assert!(w.is_empty());
}

// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod batch;
mod config;
mod runtime;

use anyhow::{Context, Result, anyhow, bail};
use batch::OutputFormat;
use config::Config;
use qshell_app::{Action, Session};
use qshell_client::Client;
use qshell_tui::{AppRuntime, ShellOptions};
use runtime::{DemoRuntime, HttpRuntime};
use std::env;
use std::fs::OpenOptions;
use std::path::PathBuf;

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `qshell --print-example-config` to generate a v1 template",
            options.config_path.display()
        )
    })?;
    init_logging(&config, options.query.is_none())?;

    let client = Client::new(config.base_url(), config.timeout()?).with_context(|| {
        format!(
            "invalid [server] config in {}; fix base_url/timeout values",
            options.config_path.display()
        )
    })?;
    if options.check_only {
        return Ok(());
    }

    if options.demo {
        log::info!("starting in demo mode");
        return launch(&options, &config, &mut DemoRuntime);
    }
    log::info!("using query server {}", client.base_url());
    launch(&options, &config, &mut HttpRuntime::new(client))
}

fn launch<R: AppRuntime>(options: &CliOptions, config: &Config, runtime: &mut R) -> Result<()> {
    if let Some(query) = &options.query {
        let action = if options.analyze {
            Action::Analyze
        } else {
            Action::Produce
        };
        let output = batch::run_batch(runtime, query, action, options.format)?;
        print!("{output}");
        return Ok(());
    }

    let mut session = Session::new(config.completion_enabled());
    let shell = ShellOptions {
        wait_delay: config.wait_delay()?,
    };
    qshell_tui::run_app(&mut session, runtime, &shell)
}

/// The shell owns the terminal, so interactive sessions log only to a file.
fn init_logging(config: &Config, interactive: bool) -> Result<()> {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(config.log_level()?).parse_default_env();
    if interactive {
        let Some(path) = config.log_file() else {
            return Ok(());
        };
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| {
                format!(
                    "open log file {} -- fix [log].file or QSHELL_LOG_FILE",
                    path.display()
                )
            })?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.try_init().context("initialize logger")?;
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    print_config_path: bool,
    print_example: bool,
    check_only: bool,
    demo: bool,
    query: Option<String>,
    format: OutputFormat,
    analyze: bool,
    show_help: bool,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        print_config_path: false,
        print_example: false,
        check_only: false,
        demo: false,
        query: None,
        format: OutputFormat::Text,
        analyze: false,
        show_help: false,
    };
    let mut format_set = false;

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--query" | "-q" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--query requires query text"))?;
                options.query = Some(value.as_ref().to_owned());
            }
            "--format" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--format requires text or html"))?;
                options.format = OutputFormat::parse(value.as_ref()).ok_or_else(|| {
                    anyhow!(
                        "unknown format {:?}; use --format text or --format html",
                        value.as_ref()
                    )
                })?;
                format_set = true;
            }
            "--analyze" => {
                options.analyze = true;
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--demo" => {
                options.demo = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                return Err(anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    if options.query.is_none() && (format_set || options.analyze) {
        bail!("--format and --analyze only apply to a --query run");
    }

    Ok(options)
}

fn print_help() {
    println!("qshell - interactive query shell");
    println!("  --config <path>          Use a specific config path");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a v1 config template");
    println!("  --query, -q <text>       Evaluate one query, print the result and exit");
    println!("  --format <text|html>     Output format for --query (default text)");
    println!("  --analyze                Print the SQL for --query instead of its rows");
    println!("  --demo                   Answer from a built-in demo catalog (no server)");
    println!("  --check                  Validate config and exit");
    println!("  --help                   Show this help");
}

#[cfg(test)]
mod tests {
    use super::{CliOptions, OutputFormat, parse_cli_args};
    use anyhow::Result;
    use std::path::PathBuf;

    fn default_options_path() -> PathBuf {
        PathBuf::from("/tmp/qshell-config.toml")
    }

    #[test]
    fn parse_cli_args_defaults_to_provided_config_path() -> Result<()> {
        let options = parse_cli_args(Vec::<String>::new(), default_options_path())?;
        assert_eq!(
            options,
            CliOptions {
                config_path: default_options_path(),
                print_config_path: false,
                print_example: false,
                check_only: false,
                demo: false,
                query: None,
                format: OutputFormat::Text,
                analyze: false,
                show_help: false,
            }
        );
        Ok(())
    }

    #[test]
    fn parse_cli_args_sets_config_path_override() -> Result<()> {
        let options = parse_cli_args(
            vec!["--config", "/custom/config.toml"],
            default_options_path(),
        )?;
        assert_eq!(options.config_path, PathBuf::from("/custom/config.toml"));
        Ok(())
    }

    #[test]
    fn parse_cli_args_errors_for_missing_values() {
        let error = parse_cli_args(vec!["--config"], default_options_path())
            .expect_err("missing config value should fail");
        assert!(error.to_string().contains("--config requires a file path"));

        let error = parse_cli_args(vec!["--query"], default_options_path())
            .expect_err("missing query should fail");
        assert!(error.to_string().contains("--query requires query text"));
    }

    #[test]
    fn parse_cli_args_errors_for_unknown_argument() {
        let error = parse_cli_args(vec!["--wat"], default_options_path())
            .expect_err("unknown arg should fail");
        let message = error.to_string();
        assert!(message.contains("unknown argument"));
        assert!(message.contains("--help"));
    }

    #[test]
    fn parse_cli_args_reads_a_batch_query() -> Result<()> {
        let options = parse_cli_args(
            vec!["-q", "/school", "--format", "html", "--analyze", "--demo"],
            default_options_path(),
        )?;
        assert_eq!(options.query.as_deref(), Some("/school"));
        assert_eq!(options.format, OutputFormat::Html);
        assert!(options.analyze);
        assert!(options.demo);
        Ok(())
    }

    #[test]
    fn parse_cli_args_rejects_batch_flags_without_a_query() {
        let error = parse_cli_args(vec!["--analyze"], default_options_path())
            .expect_err("analyze without query should fail");
        assert!(error.to_string().contains("only apply to a --query run"));

        let error = parse_cli_args(vec!["-q", "/school", "--format", "pdf"], default_options_path())
            .expect_err("unknown format should fail");
        assert!(error.to_string().contains("unknown format"));
    }

    #[test]
    fn parse_cli_args_sets_print_and_check_flags() -> Result<()> {
        let options = parse_cli_args(
            vec!["--print-config-path", "--print-example-config", "--check"],
            default_options_path(),
        )?;
        assert!(options.print_config_path);
        assert!(options.print_example);
        assert!(options.check_only);
        assert!(!options.demo);
        assert!(!options.show_help);
        Ok(())
    }

    #[test]
    fn parse_cli_args_sets_help_flag_for_long_and_short_variants() -> Result<()> {
        let long = parse_cli_args(vec!["--help"], default_options_path())?;
        assert!(long.show_help);

        let short = parse_cli_args(vec!["-h"], default_options_path())?;
        assert!(short.show_help);
        Ok(())
    }
}

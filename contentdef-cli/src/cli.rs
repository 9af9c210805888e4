//! Application definition.

extern crate simplelog;

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Error, Result};
use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use colored::*;

use contentdef::lang::tokenize;
use contentdef::tree::print::print_root;
use contentdef::tree::{convert, Array, Node};
use contentdef::{ContentEngine, EngineConfig, Loaded};

use crate::util;

pub const VERSION: &'static str = env!("CARGO_PKG_VERSION");
pub const AUTHORS: &'static str = env!("CARGO_PKG_AUTHORS");

pub fn app<'a, 'b>() -> App<'a, 'b> {
    let file_arg = Arg::with_name("file")
        .required(true)
        .value_name("file")
        .help("Path to the content file");
    let config_arg = Arg::with_name("config")
        .long("config")
        .short("c")
        .takes_value(true)
        .value_name("path")
        .help("Path to an engine config file (toml or yaml). Without one, \
               the content root is the directory holding the file");

    App::new("contentdef")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .version(VERSION)
        .author(AUTHORS)
        .about("Inspect and evaluate content definition files.")
        .arg(Arg::with_name("verbosity")
            .long("verbosity")
            .short("v")
            .takes_value(true)
            .default_value("warn")
            .value_name("verb")
            .global(true)
            .help("Set the verbosity of the log output \
                   [possible values: none, err, warn, info, debug, trace, 0-5]"))

        // tokens subcommand
        .subcommand(SubCommand::with_name("tokens")
            .display_order(10)
            .about("Print the token stream of a file")
            .arg(file_arg.clone())
            .arg(Arg::with_name("unique-id")
                .long("unique-id")
                .short("u")
                .takes_value(true)
                .value_name("id")
                .help("String substituted for `&`")))

        // parse subcommand
        .subcommand(SubCommand::with_name("parse")
            .display_order(11)
            .about("Print the parsed source tree of a file")
            .arg(file_arg.clone())
            .arg(Arg::with_name("compact")
                .long("compact")
                .help("Print each top level element on a single line")))

        // load subcommand
        .subcommand(SubCommand::with_name("load")
            .display_order(20)
            .about("Load a file, running the structural pass")
            .arg(file_arg.clone())
            .arg(config_arg.clone())
            .arg(Arg::with_name("late")
                .long("late")
                .short("l")
                .help("Also resolve late calls, as consuming the content would"))
            .arg(Arg::with_name("format")
                .long("format")
                .short("f")
                .takes_value(true)
                .possible_values(&["dsl", "toml"])
                .default_value("dsl")
                .help("Output format"))
            .arg(Arg::with_name("seed")
                .long("seed")
                .short("s")
                .takes_value(true)
                .value_name("n")
                .help("Seed for random picks, overrides the config")))

        // refresh subcommand
        .subcommand(SubCommand::with_name("refresh")
            .display_order(21)
            .about("Load and resolve a file, then check whether refreshing \
                    would change the result")
            .arg(file_arg)
            .arg(config_arg))
}

pub fn app_matches() -> ArgMatches<'static> {
    app().get_matches()
}

pub fn start(matches: ArgMatches) -> Result<()> {
    setup_log_verbosity(&matches);
    match matches.subcommand() {
        ("tokens", Some(m)) => start_tokens(m),
        ("parse", Some(m)) => start_parse(m),
        ("load", Some(m)) => start_load(m),
        ("refresh", Some(m)) => start_refresh(m),
        _ => Ok(()),
    }
}

fn start_tokens(matches: &ArgMatches) -> Result<()> {
    let path = PathBuf::from(matches.value_of("file").unwrap_or_default());
    let text = util::read_source(&path)?;
    let file = path.to_string_lossy();
    let (tokens, diagnostics) =
        tokenize(&text, &file, matches.value_of("unique-id").unwrap_or(""));
    for token in &tokens {
        let kind = if token.is_string { "text" } else { "symbol" };
        println!(
            "{:>4}:{:<4} {:<6} {}",
            token.meta.location.line,
            token.meta.location.column,
            kind,
            token.value
        );
    }
    util::print_diagnostics(&diagnostics, |_| Some(text.clone()));
    Ok(())
}

fn start_parse(matches: &ArgMatches) -> Result<()> {
    let path = PathBuf::from(matches.value_of("file").unwrap_or_default());
    let text = util::read_source(&path)?;
    let file = path.to_string_lossy();
    let (root, diagnostics) = contentdef::lang::parse_text(&text, &file, "");
    print!("{}", print_root(&root, !matches.is_present("compact")));
    util::print_diagnostics(&diagnostics, |_| Some(text.clone()));
    Ok(())
}

fn start_load(matches: &ArgMatches) -> Result<()> {
    let (mut config, file) = setup_config(matches)?;
    if let Some(seed) = matches.value_of("seed") {
        let seed: u64 = seed
            .parse()
            .with_context(|| format!("invalid seed: {}", seed))?;
        config.seed = Some(seed);
    }
    let mut engine = ContentEngine::from_config(config);

    let loaded = engine.load_file(&file)?;
    let mut diagnostics = loaded.diagnostics.clone();
    let mut items = loaded.items().to_vec();
    if matches.is_present("late") {
        items = resolve_items(&mut engine, &loaded);
        diagnostics.extend(engine.take_diagnostics());
    }
    let root = Array::new(items, loaded.root.meta().clone());

    match matches.value_of("format") {
        Some("toml") => print!("{}", to_toml_string(&root)?),
        _ => print!("{}", print_root(&root, true)),
    }
    let config = engine.config().clone();
    util::print_diagnostics(&diagnostics, |file| util::read_content(&config, file));
    Ok(())
}

fn start_refresh(matches: &ArgMatches) -> Result<()> {
    let (config, file) = setup_config(matches)?;
    let mut engine = ContentEngine::from_config(config);
    let loaded = engine.load_file(&file)?;
    resolve_items(&mut engine, &loaded);
    let config = engine.config().clone();
    util::print_diagnostics(&loaded.diagnostics, |file| {
        util::read_content(&config, file)
    });
    if engine.would_change_from_refresh(&loaded) {
        println!("{}", "refresh would change the content".yellow());
    } else {
        println!("{}", "content is up to date".green());
    }
    Ok(())
}

/// Builds the engine config for the file given on the command line,
/// returning the file path relative to the content root.
fn setup_config(matches: &ArgMatches) -> Result<(EngineConfig, String)> {
    let path = PathBuf::from(matches.value_of("file").unwrap_or_default());
    let (config, file) = match matches.value_of("config") {
        Some(config_path) => {
            let config = EngineConfig::from_path(Path::new(config_path))?;
            (config, path.to_string_lossy().to_string())
        }
        None => {
            let file = path
                .file_name()
                .ok_or_else(|| Error::msg(format!("not a file path: {:?}", path)))?
                .to_string_lossy()
                .to_string();
            let content_root = match path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
                _ => PathBuf::from("."),
            };
            let config = EngineConfig {
                content_root,
                ..EngineConfig::default()
            };
            (config, file)
        }
    };
    debug!("content root: {:?}, file: {}", config.content_root, file);
    Ok((config, file))
}

/// Runs the consumption pass over every top level element. Elements that
/// aren't ready are kept as they are.
fn resolve_items(engine: &mut ContentEngine, loaded: &Loaded) -> Vec<Node> {
    let mut items = Vec::with_capacity(loaded.items().len());
    for item in loaded.items() {
        match engine.resolve(item) {
            Some(node) => items.push(node),
            None => {
                warn!("{}: not ready, left unresolved", item.location());
                items.push(item.clone());
            }
        }
    }
    items
}

/// Toml documents need a table at the top. A file made of a single block
/// gives that table, anything else is put under an `items` key.
fn to_toml_string(root: &Array) -> Result<String> {
    let value = match &root.items[..] {
        [Node::Block(block)] => convert::to_toml(&Node::Block(block.clone()))?,
        _ => {
            let items = convert::to_toml(&Node::Array(root.clone()))?;
            let mut table = toml::value::Table::new();
            if let Some(items) = items {
                table.insert("items".to_string(), items);
            }
            Some(toml::Value::Table(table))
        }
    };
    match value {
        Some(value) => Ok(toml::to_string_pretty(&value)?),
        None => Ok(String::new()),
    }
}

fn setup_log_verbosity(matches: &ArgMatches) {
    use self::simplelog::{LevelFilter, TermLogger};
    let level_filter = match matches.value_of("verbosity") {
        Some(s) => match s {
            "0" | "none" => LevelFilter::Off,
            "1" | "err" | "error" | "min" => LevelFilter::Error,
            "2" | "warn" | "warning" | "default" => LevelFilter::Warn,
            "3" | "info" => LevelFilter::Info,
            "4" | "debug" => LevelFilter::Debug,
            "5" | "trace" | "max" | "all" => LevelFilter::Trace,
            _ => LevelFilter::Warn,
        },
        _ => LevelFilter::Warn,
    };
    let mut config_builder = simplelog::ConfigBuilder::new();
    let logger_conf = config_builder
        .set_time_level(LevelFilter::Error)
        .set_target_level(LevelFilter::Debug)
        .set_location_level(LevelFilter::Error)
        .set_time_format_str("%H:%M:%S%.6f")
        .build();
    let _ = TermLogger::init(level_filter, logger_conf, simplelog::TerminalMode::Mixed);
}

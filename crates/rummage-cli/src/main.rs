//! rummage CLI entry point.
//!
//! Usage:
//!   rummage ls [dir]                 # Direct children
//!   rummage kind audio [dir]         # Direct children of one media category
//!   rummage find [dir] --match RE    # Bounded recursive file search
//!   rummage cat <file> --inflate     # Read a file through the codec

use std::env;
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use rummage_kernel::{
    Content, Directory, Entity, Envelope, FindOptions, Host, ListOptions, MediaCategory, ReadOptions,
    RummageConfig, Status, Template,
};
use serde_json::json;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() -> ExitCode {
    // Initialize tracing (respects RUST_LOG env var)
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:?}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<ExitCode> {
    let args: Vec<String> = env::args().collect();

    match args.get(1).map(|s| s.as_str()) {
        None | Some("--help" | "-h") => {
            print_help();
            Ok(ExitCode::SUCCESS)
        }

        Some("--version" | "-V") => {
            println!("rummage {}", env!("CARGO_PKG_VERSION"));
            Ok(ExitCode::SUCCESS)
        }

        Some(command) => {
            let opts = Opts::parse(&args[2..])?;
            let config = RummageConfig::load()?;
            let host = Host::from_config(&config);
            tracing::debug!(?opts, root = %config.project_root.display(), trust = ?config.trust, "starting");
            dispatch(command, &host, &config, &opts)
        }
    }
}

fn dispatch(command: &str, host: &Host, config: &RummageConfig, opts: &Opts) -> Result<ExitCode> {
    match command {
        "ls" => {
            let dir = opts.dir(host);
            let env = dir.blocking().get_all(Some(&opts.list()?))?;
            Ok(report(env, opts))
        }

        "files" => {
            let dir = opts.dir(host);
            let env = dir.blocking().get_files(Some(&opts.list()?))?;
            Ok(report(env.map(into_entities), opts))
        }

        "dirs" => {
            let dir = opts.dir(host);
            let env = dir.blocking().get_directories(Some(&opts.list()?))?;
            Ok(report(env.map(into_entities), opts))
        }

        "kind" => {
            let name = opts.positional.first().context("kind requires a category")?;
            let category = MediaCategory::from_name(name)
                .with_context(|| format!("unknown category {name:?} (audio, image, video, json, txt)"))?;
            let dir = host.directory(opts.positional.get(1).map_or(".", String::as_str));
            let env = dir.blocking().get_category(category, Some(&opts.list()?))?;
            Ok(report(env.map(into_entities), opts))
        }

        "find" => {
            let dir = opts.dir(host);
            let env = dir.blocking().find_files(Some(&opts.find(config)?))?;
            Ok(report(env.map(into_entities), opts))
        }

        "finddirs" => {
            let dir = opts.dir(host);
            let env = dir.blocking().find_directories(Some(&opts.find(config)?))?;
            Ok(report(env.map(into_entities), opts))
        }

        "cat" => {
            let path = opts.positional.first().context("cat requires a file path")?;
            let read = ReadOptions::raw().decompress(opts.inflate).parse(opts.json);
            let env = host.file(path).blocking().read(Some(&read))?;
            let (status, content) = env.into_parts();
            match content {
                Some(Content::Json(value)) => println!("{}", serde_json::to_string_pretty(&value)?),
                Some(Content::Bytes(bytes)) => print!("{}", String::from_utf8_lossy(&bytes)),
                None => {}
            }
            Ok(exit_code(status))
        }

        "mkdir" => {
            let path = opts.positional.first().context("mkdir requires a path")?;
            let env = host.directory(path).blocking().create()?;
            Ok(exit_code(env.status_code()))
        }

        "rmdir" => {
            let path = opts.positional.first().context("rmdir requires a path")?;
            let env = host.directory(path).blocking().remove()?;
            Ok(exit_code(env.status_code()))
        }

        unknown => {
            eprintln!("Unknown command: {unknown}");
            eprintln!("Run 'rummage --help' for usage.");
            Ok(ExitCode::FAILURE)
        }
    }
}

fn print_help() {
    println!(
        r#"rummage v{}

Usage:
  rummage ls [dir]               List direct children
  rummage files [dir]            List direct child files
  rummage dirs [dir]             List direct child directories
  rummage kind <category> [dir]  List files of one category (audio, image, video, json, txt)
  rummage find [dir]             Search files, descending up to --limit directories
  rummage finddirs [dir]         Search directories the same way
  rummage cat <file>             Print a file
  rummage mkdir <dir>            Create a directory
  rummage rmdir <dir>            Remove an empty directory

Options:
  --match <regex>                Keep names matching a regex
  --name <name>                  Keep one exact name
  --limit <n>                    Directories a search may examine (default from config)
  --json                         Print results as JSON; with cat, parse the payload
  --inflate                      With cat, inflate a zlib payload first
  -h, --help                     Show this help
  -V, --version                  Show version

Configuration is read from the platform config directory (rummage/config.toml).
Set RUST_LOG=rummage_kernel=debug to trace host calls.
"#,
        env!("CARGO_PKG_VERSION")
    );
}

#[derive(Debug, Default)]
struct Opts {
    positional: Vec<String>,
    pattern: Option<String>,
    name: Option<String>,
    limit: Option<usize>,
    json: bool,
    inflate: bool,
}

impl Opts {
    fn parse(args: &[String]) -> Result<Self> {
        let mut opts = Opts::default();
        let mut iter = args.iter();

        while let Some(arg) = iter.next() {
            let (flag, inline) = match arg.split_once('=') {
                Some((flag, value)) if arg.starts_with("--") => (flag, Some(value.to_string())),
                _ => (arg.as_str(), None),
            };
            let mut value = |what: &str| -> Result<String> {
                match inline.clone() {
                    Some(value) => Ok(value),
                    None => iter.next().cloned().with_context(|| format!("{flag} requires {what}")),
                }
            };

            match flag {
                "--match" => opts.pattern = Some(value("a regex")?),
                "--name" => opts.name = Some(value("a name")?),
                "--limit" => {
                    let raw = value("a number")?;
                    opts.limit = Some(raw.parse().with_context(|| format!("invalid --limit {raw:?}"))?);
                }
                "--json" => opts.json = true,
                "--inflate" => opts.inflate = true,
                flag if flag.starts_with("--") => bail!("unknown option: {flag}"),
                _ => opts.positional.push(arg.clone()),
            }
        }

        Ok(opts)
    }

    fn dir(&self, host: &Host) -> Directory {
        host.directory(self.positional.first().map_or(".", String::as_str))
    }

    fn template(&self) -> Result<Template> {
        match (&self.pattern, &self.name) {
            (Some(_), Some(_)) => bail!("--match and --name are mutually exclusive"),
            (Some(pattern), None) => {
                Template::pattern(pattern).with_context(|| format!("invalid --match {pattern:?}"))
            }
            (None, name) => Ok(Template::from(name.clone())),
        }
    }

    fn list(&self) -> Result<ListOptions> {
        Ok(ListOptions::with_template(self.template()?))
    }

    fn find(&self, config: &RummageConfig) -> Result<FindOptions> {
        Ok(FindOptions::new()
            .template(self.template()?)
            .search_limit(self.limit.unwrap_or(config.search_limit)))
    }
}

fn into_entities<E: Into<Entity>>(items: Vec<E>) -> Vec<Entity> {
    items.into_iter().map(Into::into).collect()
}

fn report(env: Envelope<Vec<Entity>>, opts: &Opts) -> ExitCode {
    let (status, entities) = env.into_parts();
    let entities = entities.unwrap_or_default();

    if opts.json {
        let data: Vec<_> = entities
            .iter()
            .map(|e| json!({ "path": e.full_path(), "kind": e.kind() }))
            .collect();
        println!("{}", json!({ "status": status, "data": data }));
    } else {
        for entity in &entities {
            if entity.is_directory() {
                println!("{}/", entity.full_path());
            } else {
                println!("{}", entity.full_path());
            }
        }
    }

    exit_code(status)
}

fn exit_code(status: Status) -> ExitCode {
    if status.is_ok() {
        ExitCode::SUCCESS
    } else {
        eprintln!("{status}");
        ExitCode::from(2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_flags_and_positionals() {
        let opts = Opts::parse(&args(&["www/audio", "--match", r"\.ogg$", "--limit=8", "--json"])).unwrap();
        assert_eq!(opts.positional, ["www/audio"]);
        assert_eq!(opts.pattern.as_deref(), Some(r"\.ogg$"));
        assert_eq!(opts.limit, Some(8));
        assert!(opts.json);
        assert!(!opts.inflate);
    }

    #[test]
    fn rejects_unknown_flags_and_bad_limits() {
        assert!(Opts::parse(&args(&["--frobnicate"])).is_err());
        assert!(Opts::parse(&args(&["--limit", "many"])).is_err());
        assert!(Opts::parse(&args(&["--match"])).is_err());
    }

    #[test]
    fn template_from_flags() {
        let opts = Opts::parse(&args(&["--name", "System.json"])).unwrap();
        let template = opts.template().unwrap();
        assert!(template.matches("System.json"));
        assert!(!template.matches("Actors.json"));

        assert!(Opts::default().template().unwrap().is_any());

        let both = Opts::parse(&args(&["--name", "a", "--match", "b"])).unwrap();
        assert!(both.template().is_err());
    }
}

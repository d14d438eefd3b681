//! svg-api-cli: SVG 图标 API 命令行工具
//!
//! Usage:
//!   svg-api-cli icon <name> [options]          Show icon metadata and SVG
//!   svg-api-cli svg <name> [--out <path>]      Print or save the raw SVG
//!   svg-api-cli search <query> [options]       Search icons
//!   svg-api-cli sources                        List icon sources
//!   svg-api-cli categories [--source <id>]     List categories
//!   svg-api-cli random [options]               Show a random icon

use anyhow::{anyhow, bail, Context};
use std::collections::HashMap;
use svg_api::{
    IconOptions, RandomOptions, SearchOptions, SvgApiClient, SvgApiClientBuilder,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        std::process::exit(1);
    }

    let result = match args[1].as_str() {
        "icon" => cmd_icon(&args[2..]).await,
        "svg" => cmd_svg(&args[2..]).await,
        "search" => cmd_search(&args[2..]).await,
        "sources" => cmd_sources(&args[2..]).await,
        "categories" => cmd_categories(&args[2..]).await,
        "random" => cmd_random(&args[2..]).await,
        "version" | "--version" | "-V" => {
            cmd_version();
            Ok(())
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {other}");
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn print_usage() {
    println!(
        r#"svg-api-cli: SVG 图标 API 命令行工具

USAGE:
    svg-api-cli <COMMAND> [OPTIONS]

COMMANDS:
    icon <name>                 Show icon metadata and SVG
    svg <name> [--out <path>]   Print the raw SVG, or write it to a file
    search <query>              Search icons
    sources                     List icon sources
    categories                  List categories
    random                      Show a random icon
    version                     Show version information
    help                        Show this help message

OPTIONS:
    --source <id>               Icon source (default: heroicons)
    --size <px>                 Icon size, 8-512
    --color <color>             #rrggbb or a color name
    --stroke <width>            Stroke width, 0.5-3
    --category <id>             Category filter (search, random)
    --limit <n>                 Results per page (search, 1-100)
    --offset <n>                Pagination offset (search)
    --config <file>             YAML configuration file

ENVIRONMENT:
    SVG_API_BASE_URL            API base URL
    SVG_API_KEY                 API key
    SVG_API_TIMEOUT_SECS        Per-attempt timeout
    SVG_API_MAX_RETRIES         Retries after the first attempt
    SVG_API_PROXY_URL           HTTP proxy
    RUST_LOG                    Log filter (e.g. svg_api=debug)"#
    );
}

fn cmd_version() {
    println!("svg-api-cli {}", env!("CARGO_PKG_VERSION"));
}

/// Splits `args` into positionals and `--flag value` pairs.
fn parse_args(args: &[String]) -> anyhow::Result<(Vec<String>, HashMap<String, String>)> {
    let mut positional = Vec::new();
    let mut flags = HashMap::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if let Some(name) = arg.strip_prefix("--") {
            let value = iter
                .next()
                .ok_or_else(|| anyhow!("missing value for --{name}"))?;
            flags.insert(name.to_string(), value.clone());
        } else {
            positional.push(arg.clone());
        }
    }
    Ok((positional, flags))
}

fn parse_flag<T: std::str::FromStr>(
    flags: &HashMap<String, String>,
    name: &str,
) -> anyhow::Result<Option<T>> {
    match flags.get(name) {
        None => Ok(None),
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|_| anyhow!("invalid value for --{name}: {raw}")),
    }
}

async fn client(flags: &HashMap<String, String>) -> anyhow::Result<SvgApiClient> {
    let builder = match flags.get("config") {
        Some(path) => SvgApiClientBuilder::from_yaml_file(path)
            .await
            .with_context(|| format!("loading {path}"))?,
        None => SvgApiClientBuilder::from_env(),
    };
    Ok(builder.build()?)
}

fn icon_options(flags: &HashMap<String, String>) -> anyhow::Result<IconOptions> {
    Ok(IconOptions {
        source: flags.get("source").cloned(),
        size: parse_flag(flags, "size")?,
        color: flags.get("color").cloned(),
        stroke: parse_flag(flags, "stroke")?,
    })
}

fn required<'a>(positional: &'a [String], what: &str) -> anyhow::Result<&'a str> {
    match positional.first() {
        Some(v) => Ok(v.as_str()),
        None => bail!("missing <{what}>"),
    }
}

async fn cmd_icon(args: &[String]) -> anyhow::Result<()> {
    let (positional, flags) = parse_args(args)?;
    let name = required(&positional, "name")?;
    let client = client(&flags).await?;
    let icon = client.get_icon(name, &icon_options(&flags)?).await?;
    println!("{icon}");
    if let Some(category) = &icon.category {
        println!("  category: {category}");
    }
    if !icon.tags.is_empty() {
        println!("  tags:     {}", icon.tags.join(", "));
    }
    if let Some(license) = &icon.license {
        println!("  license:  {}", license.kind);
    }
    println!();
    println!("{}", icon.svg);
    Ok(())
}

async fn cmd_svg(args: &[String]) -> anyhow::Result<()> {
    let (positional, flags) = parse_args(args)?;
    let name = required(&positional, "name")?;
    let client = client(&flags).await?;
    let options = icon_options(&flags)?;
    match flags.get("out") {
        Some(out) => {
            let path = client.download_icon(name, out, &options).await?;
            println!("wrote {}", path.display());
        }
        None => println!("{}", client.get_icon_svg(name, &options).await?),
    }
    Ok(())
}

async fn cmd_search(args: &[String]) -> anyhow::Result<()> {
    let (positional, flags) = parse_args(args)?;
    let query = positional.join(" ");
    let client = client(&flags).await?;
    let options = SearchOptions {
        source: flags.get("source").cloned(),
        category: flags.get("category").cloned(),
        limit: parse_flag(&flags, "limit")?,
        offset: parse_flag(&flags, "offset")?,
    };
    let response = client.search(&query, &options).await?;
    for result in response.iter() {
        println!("{result}");
    }
    if let Some(total) = response.meta.total {
        println!("\n{} of {} results", response.len(), total);
    }
    Ok(())
}

async fn cmd_sources(args: &[String]) -> anyhow::Result<()> {
    let (_, flags) = parse_args(args)?;
    let client = client(&flags).await?;
    for source in client.sources().await? {
        println!(
            "{:<20} {:>6} icons  {}",
            source.id, source.icon_count, source.name
        );
    }
    Ok(())
}

async fn cmd_categories(args: &[String]) -> anyhow::Result<()> {
    let (_, flags) = parse_args(args)?;
    let client = client(&flags).await?;
    let categories = client
        .categories(flags.get("source").map(String::as_str))
        .await?;
    for category in categories {
        println!(
            "{:<20} {:>6} icons  {}",
            category.id, category.icon_count, category.name
        );
    }
    Ok(())
}

async fn cmd_random(args: &[String]) -> anyhow::Result<()> {
    let (_, flags) = parse_args(args)?;
    let client = client(&flags).await?;
    let options = RandomOptions {
        source: flags.get("source").cloned(),
        category: flags.get("category").cloned(),
    };
    let icon = client.random(&options).await?;
    println!("{icon}");
    println!("{}", icon.svg);
    Ok(())
}

//! Command handlers.

use std::path::PathBuf;

use anyhow::{Context, Result};
use gantry_codegen::{GenerateOptions, generate};
use gantry_discover::{
    CommandKind, DEFAULT_BUILD_TAG, DiscoverOptions, OsFileSystem, PackageModel, discover,
};
use tracing::debug;

use super::args::{Cli, Commands, DiscoverArgs, GenerateArgs};
use crate::config::GantryConfig;

/// Load configuration and run the selected subcommand.
pub fn dispatch_command(cli: Cli) -> Result<()> {
    let cwd = std::env::current_dir().context("failed to determine working directory")?;
    let config = GantryConfig::resolve(cli.config.as_deref(), &cwd)?;
    let tag = cli.tag.clone();

    match cli.command {
        Commands::Discover(args) => run_discover(&args, tag, &config),
        Commands::Generate(args) => run_generate(&args, tag, &config),
    }
}

/// Merge flags, config and defaults into discovery options.
pub fn discover_options(
    args: &DiscoverArgs,
    tag: Option<String>,
    config: &GantryConfig,
) -> DiscoverOptions {
    let defaults = DiscoverOptions::default();
    DiscoverOptions {
        start_dir: args
            .root
            .clone()
            .or_else(|| config.root.clone())
            .unwrap_or(defaults.start_dir),
        build_tag: tag
            .or_else(|| config.tag.clone())
            .unwrap_or(defaults.build_tag),
        multi_package: args.multi_package
            || config.multi_package.unwrap_or(defaults.multi_package),
        skip_hidden_dirs: !args.include_hidden
            && config.skip_hidden_dirs.unwrap_or(defaults.skip_hidden_dirs),
    }
}

/// Merge flags, config and defaults into generation options.
pub fn generate_options(
    args: &GenerateArgs,
    tag: Option<String>,
    config: &GantryConfig,
) -> GenerateOptions {
    let dir = args
        .dir
        .clone()
        .or_else(|| config.generate.dir.clone())
        .or_else(|| config.root.clone())
        .unwrap_or_else(|| PathBuf::from("."));
    let build_tag = if args.no_tag {
        None
    } else {
        Some(
            tag.or_else(|| config.tag.clone())
                .unwrap_or_else(|| DEFAULT_BUILD_TAG.to_string()),
        )
    };

    GenerateOptions {
        dir,
        build_tag,
        only_tagged: args.only_tagged || config.generate.only_tagged.unwrap_or(false),
    }
}

fn run_discover(args: &DiscoverArgs, tag: Option<String>, config: &GantryConfig) -> Result<()> {
    let options = discover_options(args, tag, config);
    debug!("Discovering with {:?}", options);

    let packages = discover(&OsFileSystem, &options)
        .with_context(|| format!("discovery failed in {}", options.start_dir.display()))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&packages)?);
    } else if packages.is_empty() {
        println!(
            "No files tagged '{}' under {}",
            options.build_tag,
            options.start_dir.display()
        );
    } else {
        print!("{}", format_packages(&packages));
    }

    Ok(())
}

fn run_generate(args: &GenerateArgs, tag: Option<String>, config: &GantryConfig) -> Result<()> {
    let options = generate_options(args, tag, config);
    debug!("Generating with {:?}", options);

    match generate(&OsFileSystem, &options)
        .with_context(|| format!("generation failed in {}", options.dir.display()))?
    {
        Some(path) => println!("Wrote {}", path.display()),
        None => println!("Nothing to generate in {}", options.dir.display()),
    }

    Ok(())
}

/// Human-readable listing of discovered packages.
pub fn format_packages(packages: &[PackageModel]) -> String {
    let mut out = String::new();

    for (i, package) in packages.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push_str(&format!(
            "{} ({})\n",
            package.package_name,
            package.dir.display()
        ));
        if let Some(summary) = package.doc.lines().next() {
            out.push_str(&format!("  {}\n", summary));
        }

        let names: Vec<String> = package.commands.iter().map(|c| c.command_name()).collect();
        let width = names.iter().map(String::len).max().unwrap_or(0);
        for (command, name) in package.commands.iter().zip(&names) {
            let marker = match command.kind {
                CommandKind::Function => ' ',
                CommandKind::Type => '*',
            };
            let summary = command.description.lines().next().unwrap_or("");
            let line = format!("  {}{:<width$}  {}", marker, name, summary);
            out.push_str(line.trim_end());
            out.push('\n');
        }
    }

    out
}

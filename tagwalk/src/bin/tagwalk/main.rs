mod output;
mod theme;
mod type_expr;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{
    ColorChoice, Command, CommandFactory, FromArgMatches, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Color as ClapColor, RgbColor, Style},
    },
};
use colored::{Color as ThemeColor, control::SHOULD_COLORIZE};
use comfy_table::{Cell, Table};
use serde::Serialize;
use tagwalk::{Config, Tag, Value, parse_tag};

use output::{GlobalOptions, OutputFormat, OutputManager, TableDisplay, create_table, header_cells};
use theme::{ICONS, THEME};
use type_expr::parse_type_expr;

#[derive(Parser)]
#[command(name = "tagwalk")]
#[command(version)]
#[command(
    about = "Inspect field annotations and coerce loosely typed values",
    long_about = r#"Command-line companion to the tagwalk library:

  parse    Split a raw annotation into its name and options
  coerce   Convert a JSON value into a destination type
"#
)]
#[command(subcommand_required = true, arg_required_else_help = true)]
struct Cli {
    /// Output format
    #[arg(long, value_enum, default_value = "table")]
    output: OutputFormat,

    /// TOML configuration file
    #[arg(long, env = "TAGWALK_CONFIG")]
    config: Option<PathBuf>,

    /// Suppress output (only errors will be shown)
    #[arg(short = 'q', long)]
    quiet: bool,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Split a raw annotation such as "id,omitempty"
    Parse {
        /// Raw annotation text
        raw: String,

        /// Annotation key to report
        #[arg(long, default_value = "json")]
        key: String,
    },

    /// Coerce a JSON value into a type such as "Vec<i32>" or "Option<bool>"
    Coerce {
        /// Destination type expression
        #[arg(long = "into", value_name = "TYPE")]
        into: String,

        /// Input value as JSON ("\"1,2,3\"", "42", "[1, 2]")
        json: String,
    },
}

impl Cli {
    fn parse_with_styles() -> Self {
        // help and usage errors are rendered before the flag is parsed
        if std::env::args_os().any(|arg| arg == "--no-color") {
            disable_color();
        }
        let matches = build_cli_command().styles(help_styles()).get_matches();
        let cli = Cli::from_arg_matches(&matches).unwrap_or_else(|err| err.exit());
        if cli.no_color {
            disable_color();
        }
        cli
    }
}

fn disable_color() {
    colored::control::set_override(false);
}

fn build_cli_command() -> Command {
    let use_color = SHOULD_COLORIZE.should_colorize();
    Cli::command().color(if use_color {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    })
}

fn help_styles() -> Styles {
    let theme = &THEME;
    Styles::styled()
        .usage(style_from_color(theme.primary).bold())
        .header(style_from_color(theme.highlight).bold())
        .literal(style_from_color(theme.secondary))
        .placeholder(style_from_color(theme.muted))
        .valid(style_from_color(theme.success))
        .error(style_from_color(theme.error).bold())
}

fn style_from_color(color: ThemeColor) -> Style {
    Style::new().fg_color(Some(color_to_clap_color(color)))
}

fn color_to_clap_color(color: ThemeColor) -> ClapColor {
    match color {
        ThemeColor::Black => ClapColor::Ansi(AnsiColor::Black),
        ThemeColor::Red => ClapColor::Ansi(AnsiColor::Red),
        ThemeColor::Green => ClapColor::Ansi(AnsiColor::Green),
        ThemeColor::Yellow => ClapColor::Ansi(AnsiColor::Yellow),
        ThemeColor::Blue => ClapColor::Ansi(AnsiColor::Blue),
        ThemeColor::Magenta => ClapColor::Ansi(AnsiColor::Magenta),
        ThemeColor::Cyan => ClapColor::Ansi(AnsiColor::Cyan),
        ThemeColor::White => ClapColor::Ansi(AnsiColor::White),
        ThemeColor::BrightBlack => ClapColor::Ansi(AnsiColor::BrightBlack),
        ThemeColor::BrightRed => ClapColor::Ansi(AnsiColor::BrightRed),
        ThemeColor::BrightGreen => ClapColor::Ansi(AnsiColor::BrightGreen),
        ThemeColor::BrightYellow => ClapColor::Ansi(AnsiColor::BrightYellow),
        ThemeColor::BrightBlue => ClapColor::Ansi(AnsiColor::BrightBlue),
        ThemeColor::BrightMagenta => ClapColor::Ansi(AnsiColor::BrightMagenta),
        ThemeColor::BrightCyan => ClapColor::Ansi(AnsiColor::BrightCyan),
        ThemeColor::BrightWhite => ClapColor::Ansi(AnsiColor::BrightWhite),
        ThemeColor::TrueColor { r, g, b } => ClapColor::Rgb(RgbColor(r, g, b)),
    }
}

/// Parsed annotation as printed by `tagwalk parse`.
#[derive(Serialize)]
#[serde(transparent)]
struct ParseReport {
    tag: Tag,
}

impl TableDisplay for ParseReport {
    fn to_table(&self, options: &GlobalOptions) -> Table {
        let mut table = create_table(options);
        table.set_header(header_cells(options, &["Key", "Name", "Options"]));
        table.add_row(vec![
            Cell::new(&self.tag.key),
            Cell::new(&self.tag.name),
            Cell::new(self.tag.options.join(", ")),
        ]);
        table
    }

    fn to_compact(&self) -> String {
        format!("{}:{} [{}]", self.tag.key, self.tag.name, self.tag.options.join(","))
    }
}

/// Result of `tagwalk coerce`.
#[derive(Serialize)]
struct CoerceReport {
    target: String,
    input: Value,
    output: Value,
}

impl TableDisplay for CoerceReport {
    fn to_table(&self, options: &GlobalOptions) -> Table {
        let mut table = create_table(options);
        table.set_header(header_cells(options, &["Target", "Input", "Output"]));
        table.add_row(vec![
            Cell::new(&self.target),
            Cell::new(self.input.to_string()),
            Cell::new(self.output.to_string()),
        ]);
        table
    }

    fn to_compact(&self) -> String {
        format!("{} {} {}: {}", self.input, ICONS.arrow, self.target, self.output)
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse_with_styles();
    let output = OutputManager::new(GlobalOptions {
        output_format: cli.output.clone(),
        quiet: cli.quiet,
        no_color: cli.no_color,
    });

    if let Err(err) = execute(cli, &output) {
        output.error(&format!("{err:#}"));
        std::process::exit(1);
    }
}

fn execute(cli: Cli, output: &OutputManager) -> Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    log::debug!("using config {config:?}");

    match cli.command {
        Commands::Parse { raw, key } => {
            let report = ParseReport {
                tag: parse_tag(&key, &raw, Value::Nil),
            };
            output.display(&report)?;
        }
        Commands::Coerce { into, json } => {
            let target = parse_type_expr(&into)?;
            let parsed: serde_json::Value =
                serde_json::from_str(&json).with_context(|| format!("invalid JSON input {json:?}"))?;
            let input = Value::from(parsed);
            let coerced = config
                .coercer()
                .coerce(&target, target.zero_value(), input.clone())
                .with_context(|| format!("cannot coerce into {target}"))?;
            output.display(&CoerceReport {
                target: target.to_string(),
                input,
                output: coerced,
            })?;
            output.success("coerced");
        }
    }

    Ok(())
}

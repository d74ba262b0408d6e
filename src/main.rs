//! docbook-adoc - DocBook to AsciiDoc converter

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgAction, Parser};

use docbook_adoc::{Config, convert_file};

#[derive(Parser)]
#[command(name = "docbook-adoc")]
#[command(version, about = "Convert DocBook XML to AsciiDoc", long_about = None)]
#[command(after_help = "EXAMPLES:
    docbook-adoc guide.xml                   Write guide.adoc (and included files)
    docbook-adoc --stdout guide.xml          Print the converted top-level file
    docbook-adoc -a url-docs=https://x.org guide.xml
                                             Collapse matching links to {url-docs}")]
struct Cli {
    /// DocBook files to convert
    #[arg(value_name = "INPUT", required = true)]
    inputs: Vec<PathBuf>,

    /// Prefix for generated and normalized ids
    #[arg(long, value_name = "PREFIX", default_value = "_")]
    idprefix: String,

    /// Word separator for generated and normalized ids
    #[arg(long, value_name = "SEP", default_value = "_")]
    idseparator: String,

    /// Lower-case ids and fold `_`/`-` to the separator
    #[arg(long)]
    normalize_ids: bool,

    /// Emit AsciiDoc compatibility-mode markup
    #[arg(long)]
    compat_mode: bool,

    /// Put each sentence on its own line
    #[arg(long, conflicts_with = "preserve_line_wrap")]
    sentence_per_line: bool,

    /// Keep the line wrapping of the source prose
    #[arg(long)]
    preserve_line_wrap: bool,

    /// Leave single-block source listings undelimited
    #[arg(long)]
    no_delimit_source: bool,

    /// Document attribute (NAME=VALUE); values also collapse matching URLs
    #[arg(short, long = "attribute", value_name = "NAME=VALUE", value_parser = parse_attribute)]
    attributes: Vec<(String, String)>,

    /// Print the top-level result instead of writing files
    #[arg(long)]
    stdout: bool,

    /// More log output (repeat for more)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

fn parse_attribute(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw.split_once('=').unwrap_or((raw, ""));
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("attribute name missing in {raw:?}"));
    }
    Ok((name.to_string(), value.to_string()))
}

impl Cli {
    fn config(&self) -> Config {
        self.attributes.iter().fold(
            Config::new()
                .with_idprefix(&self.idprefix)
                .with_idseparator(&self.idseparator)
                .with_normalize_ids(self.normalize_ids)
                .with_compat_mode(self.compat_mode)
                .with_sentence_per_line(self.sentence_per_line)
                .with_preserve_line_wrap(self.preserve_line_wrap)
                .with_delimit_source(!self.no_delimit_source),
            |config, (name, value)| config.with_attribute(name, value),
        )
    }

    fn log_level(&self) -> log::LevelFilter {
        if self.quiet {
            return log::LevelFilter::Error;
        }
        match self.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level())
        .parse_default_env()
        .format_timestamp(None)
        .init();

    let config = cli.config();
    let mut failed = false;
    for input in &cli.inputs {
        if let Err(e) = convert(input, &config, cli.stdout) {
            eprintln!("error: {}: {e}", input.display());
            failed = true;
        }
    }

    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn convert(input: &Path, config: &Config, stdout: bool) -> docbook_adoc::Result<()> {
    let document = convert_file(input, config)?;
    if stdout {
        print!("{}", document.content());
    } else {
        document.write()?;
    }
    Ok(())
}

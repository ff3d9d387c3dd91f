use chart::ChartOptions;
use config::Config;
use population::{PopulationTable, Selection, Summary};

use clap::builder::PossibleValuesParser;
use clap::Parser;
use env_logger::Env;
use polars::prelude::*;
use std::error::Error;
use std::fs::File;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use log::{debug, error, info};

const DEFAULT_CONFIG: &str = ".lt-population.yml";
const DEFAULT_DETAIL: &str = "lt_population.csv";
const PREVIEW_ROWS: usize = 5;

enum OutputType {
    Csv,
    Polar,
}

impl OutputType {
    fn from_str(s: &str) -> Option<Self> {
        match s {
            "csv" => Some(OutputType::Csv),
            "polar" => Some(OutputType::Polar),
            _ => None,
        }
    }
}

trait Output {
    fn output(&self) -> Result<(), Box<dyn Error>>;
}

/// Prints the first and last rows of the table.
struct PolarOutput {
    df: DataFrame,
}

impl PolarOutput {
    fn new(df: DataFrame) -> Self {
        PolarOutput { df }
    }
}

impl Output for PolarOutput {
    fn output(&self) -> Result<(), Box<dyn Error>> {
        println!("{}", self.df.head(Some(PREVIEW_ROWS)));
        println!("{}", self.df.tail(Some(PREVIEW_ROWS)));
        Ok(())
    }
}

struct CsvOutput {
    filename: PathBuf,
    df: DataFrame,
}

impl CsvOutput {
    fn new(filename: PathBuf, df: DataFrame) -> Self {
        CsvOutput { filename, df }
    }
}

impl Output for CsvOutput {
    fn output(&self) -> Result<(), Box<dyn Error>> {
        let mut file = File::create(&self.filename)?;
        let mut m_df = self.df.clone();
        CsvWriter::new(&mut file).finish(&mut m_df)?;
        info!("CSV file written successfully: {:?}", self.filename);
        Ok(())
    }
}

fn get_output(output_type: OutputType, df: DataFrame, detail: PathBuf) -> Box<dyn Output> {
    match output_type {
        OutputType::Csv => Box::new(CsvOutput::new(detail, df)),
        OutputType::Polar => Box::new(PolarOutput::new(df)),
    }
}

/// Lithuania population change from a Eurostat SDMX-CSV extract
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
struct Args {
    /// Eurostat CSV file; asked for on stdin when omitted
    input: Option<PathBuf>,

    #[arg(
        short = 'c',
        long = "config",
        default_value = DEFAULT_CONFIG,
        help = "yaml config file, defaults apply when it does not exist"
    )]
    config: PathBuf,

    #[arg(short = 'o', long = "out-dir", help = "directory for the png charts")]
    out_dir: Option<PathBuf>,

    #[arg(
        short = 'F',
        long = "format",
        value_parser = PossibleValuesParser::new(["csv", "polar"]),
        default_value = "polar",
        help = "table output format"
    )]
    format: String,

    #[arg(
        long = "detail",
        help = "csv file for --format csv, e.g. --detail lt_population.csv"
    )]
    detail: Option<PathBuf>,

    #[arg(long = "no-charts", action=clap::ArgAction::SetTrue, help="skip rendering the charts")]
    no_charts: bool,
}

fn prompt_for_input() -> Result<PathBuf, Box<dyn Error>> {
    println!("Please enter the path of your Eurostat CSV file (SDMX-CSV format).");
    print!("> ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let path = line.trim();
    if path.is_empty() {
        return Err(Box::new(io::Error::new(
            io::ErrorKind::InvalidInput,
            "no input file given",
        )));
    }
    Ok(PathBuf::from(path))
}

fn selection_from(conf: &Config) -> Selection {
    Selection {
        geo: conf.geo.clone(),
        sex: conf.sex.clone(),
        age: conf.age.clone(),
        first_year: conf.first_year,
        last_year: conf.last_year,
    }
}

fn chart_options_from(conf: &Config, out_dir: Option<PathBuf>) -> ChartOptions {
    ChartOptions {
        dpi: conf.dpi,
        figure_size: conf.figure_size,
        out_dir: out_dir.unwrap_or_else(|| conf.out_dir.clone()),
        period: (conf.first_year, conf.last_year),
    }
}

/// Renders all three charts; a failed chart does not stop the others.
fn render_charts(table: &PopulationTable, options: &ChartOptions) -> usize {
    let renderers: [(&str, fn(&PopulationTable, &ChartOptions) -> chart::Result<PathBuf>); 3] = [
        ("trend", chart::plot_population_trend),
        ("absolute change", chart::plot_abs_change),
        ("percent change", chart::plot_pct_change),
    ];
    let mut failed = 0;
    for (name, render) in renderers {
        match render(table, options) {
            Ok(path) => debug!("{} chart: {:?}", name, path),
            Err(e) => {
                error!("{} chart failed: {}", name, e);
                failed += 1;
            }
        }
    }
    failed
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let conf = Config::new(&args.config)?;
    debug!("config: {:?}", conf);

    let csv_path = match args.input {
        Some(path) => path,
        None => prompt_for_input()?,
    };
    info!("file loaded: {:?}", csv_path);

    let selection = selection_from(&conf);
    let rows = population::load_lithuania_population(&csv_path, &selection)?;
    let table = population::add_change_columns(rows);

    let out_type = OutputType::from_str(args.format.as_str()).ok_or("unknown output format")?;
    let detail = args
        .detail
        .unwrap_or_else(|| Path::new(DEFAULT_DETAIL).to_path_buf());
    get_output(out_type, table.to_dataframe()?, detail).output()?;

    let summary = Summary::from_table(&table, selection.period())?;
    println!("{}", summary);

    if args.no_charts {
        info!("charts skipped");
        return Ok(());
    }
    let options = chart_options_from(&conf, args.out_dir);
    let failed = render_charts(&table, &options);
    if failed > 0 {
        return Err(format!("{} of 3 charts failed", failed).into());
    }
    info!("all figures saved to {:?}", options.out_dir);
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if let Err(e) = run(args) {
        error!("{}", e);
        std::process::exit(1);
    }
}

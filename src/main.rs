use anyhow::{Context, Result};
use clap::{Arg, Command};
use log::LevelFilter;
use osm2geojson::input::{self, InputFormat};
use osm2geojson::{AreaKeys, ConvertOptions, PolygonRules};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

fn main() -> Result<()> {
    let matches = Command::new("osm2geojson")
        .version("0.1.0")
        .about("Convert OpenStreetMap data (OSM XML, Overpass JSON or PBF) to GeoJSON")
        .arg(
            Arg::new("input")
                .help("Input OSM XML, Overpass JSON or PBF file path")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("FILE")
                .help("Output GeoJSON file (stdout if not specified)"),
        )
        .arg(
            Arg::new("format")
                .short('f')
                .long("format")
                .value_name("FORMAT")
                .help("Input format")
                .value_parser(["auto", "json", "xml", "pbf"])
                .default_value("auto"),
        )
        .arg(
            Arg::new("pretty")
                .short('p')
                .long("pretty")
                .action(clap::ArgAction::SetTrue)
                .help("Pretty-print JSON output"),
        )
        .arg(
            Arg::new("no-unused-filter")
                .long("no-unused-filter")
                .action(clap::ArgAction::SetTrue)
                .help("Keep elements that are already part of another feature"),
        )
        .arg(
            Arg::new("raise-on-failure")
                .long("raise-on-failure")
                .action(clap::ArgAction::SetTrue)
                .help("Abort on the first element that cannot be converted"),
        )
        .arg(
            Arg::new("polygons")
                .long("polygons")
                .value_name("FILE")
                .help("JSON polygon feature rules (bundled rules if omitted)"),
        )
        .arg(
            Arg::new("areas")
                .long("areas")
                .value_name("FILE")
                .help("JSON area keys kept on relation areas (all tags if omitted)"),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .value_name("LEVEL")
                .help("Log level for conversion diagnostics")
                .value_parser(["off", "error", "warn", "info", "debug", "trace"])
                .default_value("error"),
        )
        .arg(
            Arg::new("no-parallel")
                .long("no-parallel")
                .action(clap::ArgAction::SetTrue)
                .help("Disable parallel processing and use single-threaded mode"),
        )
        .arg(
            Arg::new("threads")
                .long("threads")
                .value_name("N")
                .value_parser(clap::value_parser!(usize))
                .help("Worker threads for parallel mode (default: number of CPUs)"),
        )
        .get_matches();

    // Required and defaulted arguments are always present.
    let input_path = Path::new(matches.get_one::<String>("input").map_or("", String::as_str));
    let output_path = matches.get_one::<String>("output");
    let format = matches.get_one::<String>("format").map_or("auto", String::as_str);
    let pretty_print = matches.get_flag("pretty");
    let use_parallel = !matches.get_flag("no-parallel");
    let log_level = matches
        .get_one::<String>("log-level")
        .map_or("error", String::as_str)
        .parse::<LevelFilter>()
        .context("Invalid log level")?;

    env_logger::Builder::new().filter_level(log_level).init();

    if !input_path.exists() {
        anyhow::bail!("Input file does not exist: {}", input_path.display());
    }

    let format = match format {
        "json" => InputFormat::OverpassJson,
        "xml" => InputFormat::OsmXml,
        "pbf" => InputFormat::Pbf,
        _ => InputFormat::detect(input_path).with_context(|| {
            format!(
                "Cannot detect the format of {}, use --format",
                input_path.display()
            )
        })?,
    };

    let polygon_features = match matches.get_one::<String>("polygons") {
        Some(path) => Some(
            PolygonRules::from_path(Path::new(path))
                .with_context(|| format!("Failed to load polygon rules: {}", path))?,
        ),
        None => None,
    };
    let area_keys = match matches.get_one::<String>("areas") {
        Some(path) => Some(
            AreaKeys::from_path(Path::new(path))
                .with_context(|| format!("Failed to load area keys: {}", path))?,
        ),
        None => None,
    };

    let options = ConvertOptions {
        filter_used_refs: !matches.get_flag("no-unused-filter"),
        raise_on_failure: matches.get_flag("raise-on-failure"),
        area_keys,
        polygon_features,
        log_level,
    };

    let elements = input::read_elements(input_path, format)?;
    log::info!("Read {} elements from {}", elements.len(), input_path.display());

    let collection = if use_parallel {
        let threads = matches
            .get_one::<usize>("threads")
            .copied()
            .unwrap_or_else(num_cpus::get);
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("Failed to start worker threads")?;
        osm2geojson::convert_to_geojson_parallel(&elements, &options)?
    } else {
        osm2geojson::convert_to_geojson(&elements, &options)?
    };
    log::info!("Converted {} features", collection.features.len());

    let mut writer: Box<dyn Write> = match output_path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path))?;
            Box::new(BufWriter::new(file))
        }
        None => Box::new(std::io::stdout()),
    };

    if pretty_print {
        serde_json::to_writer_pretty(&mut writer, &collection)?;
    } else {
        serde_json::to_writer(&mut writer, &collection)?;
    }
    writeln!(writer)?;
    writer.flush()?;

    Ok(())
}

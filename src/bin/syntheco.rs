/*
This code is part of the syntheco population synthesis library.
License: MIT
*/

//! Thin CLI front-end: loads a fixture and a config, drives
//! `orchestrator::run`, and prints a summary report plus two CSV outputs.

use std::env;
use std::fs::File;
use std::io::{Error, ErrorKind, Write};
use std::time::Instant;
use syntheco::config::{load_config, SynthecoConfig};
use syntheco::fixture::load_pipeline_tables;
use syntheco::output::{HouseholdAssignments, Households, Persons};
use syntheco::utils::get_formatted_elapsed_time;
use syntheco::RunReport;

fn main() {
    env_logger::init();
    match run() {
        Ok(()) => {}
        Err(err) => {
            eprintln!("error: {}", err);
            std::process::exit(1);
        }
    }
}

fn run() -> Result<(), Error> {
    let args: Vec<String> = env::args().collect();

    let mut input_path = String::new();
    let mut config_path = String::new();
    let mut households_out = "households.csv".to_string();
    let mut persons_out = "persons.csv".to_string();
    let mut coords_out = String::new();
    let mut verbose = false;

    for arg in &args[1..] {
        let flag_val = arg.to_lowercase().replace("--", "-");
        if flag_val == "-h" || flag_val == "-help" {
            help();
            return Ok(());
        } else if flag_val == "-version" {
            version();
            return Ok(());
        } else if flag_val.starts_with("-input") {
            input_path = take_value(arg, "-input");
        } else if flag_val.starts_with("-config") {
            config_path = take_value(arg, "-config");
        } else if flag_val.starts_with("-households_out") {
            households_out = take_value(arg, "-households_out");
        } else if flag_val.starts_with("-persons_out") {
            persons_out = take_value(arg, "-persons_out");
        } else if flag_val.starts_with("-coords_out") {
            coords_out = take_value(arg, "-coords_out");
        } else if flag_val.starts_with("-v") {
            verbose = true;
        }
    }

    if input_path.is_empty() {
        version();
        help();
        return Err(Error::new(ErrorKind::InvalidInput, "missing -input=<fixture.json>"));
    }

    version();
    if verbose {
        println!("loading input fixture from {}", input_path);
    }

    let tables = load_pipeline_tables(&input_path)
        .map_err(|e| Error::new(ErrorKind::InvalidData, e.to_string()))?;

    let config = if config_path.is_empty() {
        SynthecoConfig::default()
    } else {
        load_config(&config_path)?
    };

    let start = Instant::now();
    let (households, persons, report) = syntheco::run(tables, &config)
        .map_err(|e| Error::new(ErrorKind::Other, e.to_string()))?;

    write_households_csv(&households_out, &households)?;
    write_persons_csv(&persons_out, &persons)?;
    if !coords_out.is_empty() {
        write_coords_csv(&coords_out, &households.assignments())?;
    }

    print_report(&report, start);
    Ok(())
}

fn take_value(arg: &str, flag: &str) -> String {
    let mut v = arg
        .trim_start_matches("--")
        .trim_start_matches('-')
        .to_string();
    let prefix = flag.trim_start_matches('-');
    if v.to_lowercase().starts_with(prefix) {
        v = v[prefix.len()..].to_string();
    }
    v = v.replace('"', "").replace('\'', "");
    if let Some(stripped) = v.strip_prefix('=') {
        stripped.to_string()
    } else {
        v
    }
}

fn write_households_csv(path: &str, households: &Households) -> Result<(), Error> {
    let mut file = File::create(path)?;
    writeln!(file, "hh_serial,area_id,lon,lat,attrs")?;
    for record in &households.records {
        let attrs: Vec<String> = record.attrs.iter().map(|c| c.to_string()).collect();
        writeln!(
            file,
            "{},{},{},{},\"{}\"",
            record.hh_serial,
            record.area,
            record.lon,
            record.lat,
            attrs.join("|")
        )?;
    }
    Ok(())
}

fn write_coords_csv(path: &str, assignments: &HouseholdAssignments) -> Result<(), Error> {
    let mut file = File::create(path)?;
    writeln!(file, "hh_serial,area_id,lon,lat")?;
    for (hh_serial, area, lon, lat) in &assignments.rows {
        writeln!(file, "{},{},{},{}", hh_serial, area, lon, lat)?;
    }
    Ok(())
}

fn write_persons_csv(path: &str, persons: &Persons) -> Result<(), Error> {
    let mut file = File::create(path)?;
    writeln!(file, "hh_serial,area_id,person_attrs")?;
    for record in &persons.records {
        let mut attrs: Vec<(&String, &String)> = record.person_attrs.iter().collect();
        attrs.sort_by_key(|(k, _)| k.clone());
        let joined: Vec<String> = attrs
            .into_iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        writeln!(
            file,
            "{},{},\"{}\"",
            record.hh_serial,
            record.area,
            joined.join("|")
        )?;
    }
    Ok(())
}

fn print_report(report: &RunReport, start: Instant) {
    println!(
        "\n{} areas considered, {} emitted, {} failed",
        report.areas_considered,
        report.areas_emitted,
        report.areas_failed.len()
    );
    for (area, stage, reason) in &report.areas_failed {
        println!("  area '{}' failed at {}: {}", area, stage, reason);
    }
    println!(
        "{} households, {} persons synthesized in {}",
        report.households_total,
        report.persons_total,
        get_formatted_elapsed_time(start)
    );
}

fn help() {
    let s = "syntheco Help

The following commands are recognized:
-input=<path>          Path to the input fixture JSON file (required).
-config=<path>         Path to a SynthecoConfig JSON file. Defaults used if omitted.
-households_out=<path> Path to write the synthesized households CSV (default households.csv).
-persons_out=<path>    Path to write the synthesized persons CSV (default persons.csv).
-coords_out=<path>     Path to write a coordinates-only households CSV. Omitted if unset.
-v                     Verbose mode.
-h, --help             Prints help information.
--version              Prints the version information.

Example Usage:
>> syntheco -input=region.json -config=syntheco_config.json -v
";
    println!("{}", s);
}

fn version() {
    const VERSION: Option<&'static str> = option_env!("CARGO_PKG_VERSION");
    println!(
        "syntheco v{}: spatially located population synthesis from marginal tables, microdata, and small-area polygons.",
        VERSION.unwrap_or("unknown")
    );
}

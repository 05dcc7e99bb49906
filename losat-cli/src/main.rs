use std::env;
use std::fs;
use std::io::{self, Read, Write};

use anyhow::Error;
use clap::{values_t, App, AppSettings, Arg};
use env_logger::{fmt, Builder, Target};
use log::{error, info};
use log::{Level, LevelFilter, Record};

use losat::solver::Solver;
use losat::SolverConfigUpdate;

fn main() {
    let exit_code = match main_with_err() {
        Err(err) => {
            error!("{}", err);
            1
        }
        Ok(exit_code) => exit_code,
    };
    std::process::exit(exit_code);
}

fn init_logging() {
    let format = |buf: &mut fmt::Formatter, record: &Record| {
        if record.level() == Level::Info {
            writeln!(buf, "c {}", record.args())
        } else {
            writeln!(buf, "c {}: {}", record.level(), record.args())
        }
    };

    let mut builder = Builder::new();
    builder
        .target(Target::Stdout)
        .format(format)
        .filter(None, LevelFilter::Info);

    if let Ok(ref env_var) = env::var("LOSAT_LOG") {
        builder.parse_filters(env_var);
    }

    builder.init();
}

fn banner() {
    info!("This is losat {}", env!("CARGO_PKG_VERSION"));
}

/// The solution in the storage format: comma separated true variables after `T:`, false ones
/// after `F:`.
fn format_solution(assignment: &std::collections::BTreeMap<isize, bool>) -> String {
    let true_vars: Vec<String> = assignment
        .iter()
        .filter(|(_, &value)| value)
        .map(|(name, _)| name.to_string())
        .collect();
    let false_vars: Vec<String> = assignment
        .iter()
        .filter(|(_, &value)| !value)
        .map(|(name, _)| name.to_string())
        .collect();

    let mut result = String::new();
    if !true_vars.is_empty() {
        result.push_str("T:");
        result.push_str(&true_vars.join(","));
        result.push('\n');
    }
    if !false_vars.is_empty() {
        result.push_str("F:");
        result.push_str(&false_vars.join(","));
        result.push('\n');
    }
    result
}

fn main_with_err() -> Result<i32, Error> {
    let matches = App::new("losat")
        .version(env!("CARGO_PKG_VERSION"))
        .setting(AppSettings::DisableHelpSubcommand)
        .arg_from_usage("[INPUT] 'The DIMACS CNF input file to use (stdin if omitted)'")
        .arg_from_usage(
            "[line-input] -l --line=[SET] 'Solve a single-line formula, e.g. 1|-2&3'",
        )
        .arg(
            Arg::from_usage("[mode] -m --mode=[MODE] 'Canonicalization mode'")
                .possible_values(&["normal", "lou", "lo", "flo", "flop"])
                .case_insensitive(true),
        )
        .arg_from_usage("-z --sort-by-size 'Group clauses by length before canonicalization'")
        .arg_from_usage(
            "--thief 'Pre-order clauses by length and input position before canonicalization'",
        )
        .arg_from_usage(
            "-e --exit-upon-solving 'Stop as soon as one satisfying assignment is found'",
        )
        .arg_from_usage("[threads] --threads=[N] 'Number of worker threads (0 = all cores)'")
        .arg_from_usage("[config-file] --config=[FILE] 'Read parameters from configuration file'")
        .arg(
            Arg::from_usage("[config-option] -C --config-option")
                .value_name("OPTION>=<VALUE")
                .help("Specify a single config option, e.g. -C mode=\"flo\"")
                .multiple(true)
                .number_of_values(1),
        )
        .arg_from_usage("[graph-file] --graph=[FILE] 'Write the explored DAG in DOT format'")
        .arg_from_usage("[solution-file] --solution=[FILE] 'Write the solution to a file'")
        .arg_from_usage("--verify 'Check the model against the input before reporting'")
        .get_matches();

    init_logging();
    banner();

    let mut config_update = SolverConfigUpdate::new();

    if let Some(config_path) = matches.value_of("config-file") {
        let mut config_contents = String::new();
        fs::File::open(config_path)?.read_to_string(&mut config_contents)?;

        config_update.merge(toml::from_str(&config_contents)?);
    }

    for config_option in values_t!(matches, "config-option", String).unwrap_or_else(|_| vec![]) {
        config_update.merge(toml::from_str(&config_option)?);
    }

    if let Some(mode) = matches.value_of("mode") {
        config_update.mode = Some(mode.to_ascii_lowercase());
    }
    if matches.is_present("sort-by-size") {
        config_update.sort_by_size = Some(true);
    }
    if matches.is_present("thief") {
        config_update.thief_method = Some(true);
    }
    if matches.is_present("exit-upon-solving") {
        config_update.exit_upon_solving = Some(true);
    }
    if let Some(threads) = matches.value_of("threads") {
        config_update.threads = Some(threads.parse()?);
    }

    let mut solver = Solver::new();
    solver.config(&config_update)?;

    if let Some(line) = matches.value_of("line-input") {
        info!("Reading single-line formula from the command line");
        solver.add_line_format(line)?;
    } else {
        let stdin = io::stdin();

        let mut locked_stdin;
        let mut opened_file;

        let file = match matches.value_of("INPUT") {
            Some(path) => {
                info!("Reading file '{}'", path);
                opened_file = fs::File::open(path)?;
                &mut opened_file as &mut dyn io::Read
            }
            None => {
                info!("Reading from stdin");
                locked_stdin = stdin.lock();
                &mut locked_stdin as &mut dyn io::Read
            }
        };

        solver.add_dimacs_cnf(file)?;
    }

    let satisfiable = solver.solve();

    if let Some(path) = matches.value_of("graph-file") {
        info!("Writing DOT graph to file '{}'", path);
        let mut file = fs::File::create(path)?;
        solver.write_dot(&mut file)?;
    }

    if let Some(stats) = solver.stats() {
        info!(
            "unique nodes: {} | redundant subtrees: {} | redundant hits: {}",
            stats.root.unique_descendants,
            stats.root.redundant_descendants,
            stats.root.redundant_hits
        );
    }

    if matches.is_present("verify") {
        match solver.verify_model() {
            Some(true) => info!("model verified against every input clause"),
            Some(false) => {
                error!("the model does not satisfy the input");
                println!("s UNKNOWN");
                return Ok(0);
            }
            None => (),
        }
    }

    if satisfiable {
        let assignment: std::collections::BTreeMap<isize, bool> = solver
            .assignment()
            .map(|assignment| {
                assignment
                    .iter()
                    .map(|(var, &value)| (var.to_dimacs(), value))
                    .collect()
            })
            .unwrap_or_default();

        if let Some(path) = matches.value_of("solution-file") {
            info!("Writing solution to file '{}'", path);
            fs::File::create(path)?.write_all(format_solution(&assignment).as_bytes())?;
        }

        println!("s SATISFIABLE");
        print!("v");
        for lit in solver.model().unwrap_or_default() {
            print!(" {}", lit);
        }
        println!(" 0");
        Ok(10)
    } else {
        println!("s UNSATISFIABLE");
        Ok(20)
    }
}

use std::process::ExitCode;

use bernoulli_roots::{
    Decimal120,
    Error,
    Poly,
    Real,
    Result,
    Solver,
    SolverParams,
};
use clap::{
    Arg,
    ArgAction,
    ArgMatches,
    Command,
};
use env_logger::Env;
use log::info;
use num_rational::BigRational;

/// x^3 - 6x^2 + 11x - 6 = (x - 1)(x - 2)(x - 3)
const DEMO_COEFFS: [&str; 4] = ["1.0", "-6.0", "11.0", "-6.0"];

/// f64 cannot get anywhere near the high-precision default.
const FLOAT_TOLERANCE: &str = "1e-12";

fn cli() -> Command {
    Command::new("rpe")
        .about("Finds the real roots of a polynomial with Bernoulli's method and deflation")
        .arg(
            Arg::new("coefficients")
                .help("Decimal coefficients, highest degree first [default: 1.0 -6.0 11.0 -6.0]")
                .num_args(1..)
                .allow_negative_numbers(true)
                .value_name("COEFF"),
        )
        .arg(
            Arg::new("tolerance")
                .short('e')
                .long("tolerance")
                .help("Accept a root once |f(x)| is below this [default: 1e-42, or 1e-12 for float]")
                .value_name("EPS"),
        )
        .arg(
            Arg::new("max_iterations")
                .short('n')
                .long("max-iterations")
                .help("Recurrence steps allowed per root")
                .value_parser(clap::value_parser!(usize))
                .value_name("NUM")
                .default_value("10000"),
        )
        .arg(
            Arg::new("clamp")
                .short('c')
                .long("clamp")
                .help("Decimal places kept in deflated coefficients")
                .value_parser(clap::value_parser!(u32))
                .value_name("PLACES")
                .default_value("6"),
        )
        .arg(
            Arg::new("no_clamp")
                .long("no-clamp")
                .help("Keep deflated coefficients at full precision")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("backend")
                .short('b')
                .long("backend")
                .help("Number type used for the computation")
                .value_parser(["decimal", "rational", "float"])
                .default_value("decimal"),
        )
}

fn run<R: Real>(matches: &ArgMatches, fallback_tolerance: Option<&str>) -> Result<()> {
    let coeffs: Vec<&str> = match matches.get_many::<String>("coefficients") {
        Some(values) => values.map(String::as_str).collect(),
        None => DEMO_COEFFS.to_vec(),
    };
    let poly = Poly::<R>::parse(&coeffs)?;
    if poly.degree() == 0 {
        return Err(Error::InvalidPolynomial {
            reason: "a constant polynomial has no roots".to_owned(),
        });
    }

    let tolerance = matches.get_one::<String>("tolerance")
        .map(String::as_str)
        .or(fallback_tolerance)
        .map(R::parse_decimal)
        .transpose()?;
    let max_iterations = matches.get_one::<usize>("max_iterations").copied();
    let mut params = SolverParams::new(tolerance, max_iterations);
    if *matches.get_one::<bool>("no_clamp").unwrap_or(&false) {
        params.clamp_places = None;
    } else if let Some(places) = matches.get_one::<u32>("clamp") {
        params.clamp_places = Some(*places);
    }
    info!("tolerance {}, at most {} iterations per root, clamp {:?}",
        params.tolerance, params.max_iterations, params.clamp_places);

    println!();
    println!("Solving equation with coefficients (highest degree first):");
    println!("    {}", poly);
    println!();

    for extraction in Solver::new(poly, params) {
        println!();
        println!("{}", extraction?);
        println!();
    }
    Ok(())
}

fn main() -> ExitCode {
    let env = Env::default()
        .filter_or("RPE_LOG_LEVEL", "warn")
        .write_style_or("RPE_LOG_STYLE", "auto");
    env_logger::Builder::from_env(env).init();

    let matches = cli().get_matches();
    let result = match matches.get_one::<String>("backend").map(String::as_str) {
        Some("rational") => run::<BigRational>(&matches, None),
        Some("float") => run::<f64>(&matches, Some(FLOAT_TOLERANCE)),
        _ => run::<Decimal120>(&matches, None),
    };

    // all roots extracted is success; anything else is reported and fails
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        },
    }
}

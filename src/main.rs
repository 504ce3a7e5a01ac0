use std::error::Error;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use huber_op::{AnyTensor, Backend, CheckConfig, DType, HuberLoss};

#[derive(Parser, Debug)]
#[command(name = "huber-op")]
#[command(version, about = "Huber loss operator: evaluate it or run the operator test table.")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the operator test table against the f64 reference.
    Check {
        /// JSON case table; the built-in table is used when omitted.
        #[arg(long)]
        config: Option<String>,

        /// Override the RNG seed of every case.
        #[arg(long)]
        seed: Option<u64>,

        /// Override the backend of every case (serial or parallel).
        #[arg(long)]
        backend: Option<Backend>,

        /// Print reports as JSON instead of one line per case.
        #[arg(long)]
        json: bool,

        /// Write the effective case table to this path and exit.
        #[arg(long)]
        dump_config: Option<String>,
    },
    /// Evaluate the loss for comma-separated values.
    Eval {
        /// Threshold between the quadratic and linear regions.
        #[arg(long, default_value_t = 1.0)]
        delta: f64,

        #[arg(long)]
        prediction: String,

        #[arg(long)]
        target: String,

        /// float16, float32 or float64.
        #[arg(long, default_value = "float32")]
        dtype: String,
    },
}

fn init_logging() {
    let env = env_logger::Env::new()
        .filter_or("HUBER_LOG", "info")
        .write_style("HUBER_LOG_STYLE");
    env_logger::init_from_env(env);
}

fn parse_values(csv: &str) -> Result<Vec<f64>, Box<dyn Error>> {
    let mut values = Vec::new();
    for v in csv.split(',') {
        let v = v.trim();
        let value = v.parse::<f64>().map_err(|e| format!("invalid value `{v}`: {e}"))?;
        values.push(value);
    }
    Ok(values)
}

fn run_check(
    config: Option<String>,
    seed: Option<u64>,
    backend: Option<Backend>,
    json: bool,
    dump_config: Option<String>,
) -> Result<bool, Box<dyn Error>> {
    let mut table = match config {
        Some(path) => {
            log::info!("Loading case table from {path}");
            CheckConfig::load_json(&path)?
        }
        None => CheckConfig::default(),
    };
    for case in &mut table.cases {
        if let Some(seed) = seed {
            case.seed = seed;
        }
        if let Some(backend) = backend {
            case.backend = backend;
        }
    }

    if let Some(path) = dump_config {
        table.save_json(&path)?;
        log::info!("Wrote {} cases to {path}", table.cases.len());
        return Ok(true);
    }

    let reports = huber_op::run_all(&table)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for report in &reports {
            println!("{}", report.summary_line());
        }
    }
    Ok(reports.iter().all(|r| r.passed()))
}

fn run_eval(delta: f64, prediction: &str, target: &str, dtype: &str) -> Result<(), Box<dyn Error>> {
    let dtype = DType::parse(dtype)?;
    let prediction = parse_values(prediction)?;
    let target = parse_values(target)?;

    let loss = HuberLoss::new(delta)?;
    let p = AnyTensor::from_f64(dtype, &[prediction.len()], &prediction)?;
    let t = AnyTensor::from_f64(dtype, &[target.len()], &target)?;
    let (residual, out) = loss.forward_any(&p, &t)?.to_f64();

    println!("{:>12} {:>12} {:>12} {:>12}", "prediction", "target", "residual", "loss");
    for i in 0..residual.len() {
        println!(
            "{:>12.6} {:>12.6} {:>12.6} {:>12.6}",
            prediction[i],
            target[i],
            residual.data()[i],
            out.data()[i]
        );
    }
    Ok(())
}

fn main() -> Result<ExitCode, Box<dyn Error>> {
    init_logging();
    let args = Args::parse();

    match args.command {
        Command::Check { config, seed, backend, json, dump_config } => {
            if run_check(config, seed, backend, json, dump_config)? {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }
        Command::Eval { delta, prediction, target, dtype } => {
            run_eval(delta, &prediction, &target, &dtype)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

use std::cmp::Ordering;
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use rust_containers::{Set, read_input};
use serde_json::Value;

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Op {
    Union,
    Intersection,
    Difference,
    SymmetricDifference,
    Subset,
    Superset,
    Disjoint,
    Equal,
}

#[derive(Parser, Debug)]
#[command(version, about = "Set algebra over two JSON arrays", long_about = None)]
struct Args {
    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Sort the resulting elements: numbers by value, strings lexically
    #[arg(short, long)]
    sorted: bool,

    #[arg(value_enum)]
    op: Op,

    /// Left operand: a JSON array, or @FILE to read one (@- for stdin)
    a: String,

    /// Right operand: a JSON array, or @FILE to read one (@- for stdin)
    b: String,
}

enum Outcome {
    Set(Set<String>),
    Bool(bool),
}

// Elements are keyed by their compact JSON text, so 1 and "1" stay distinct.
fn parse_operand(arg: &str) -> Result<Set<String>> {
    let text = match arg.strip_prefix('@') {
        Some(path) => read_input(Some(path))?,
        None => arg.to_string(),
    };
    let items: Vec<Value> =
        serde_json::from_str(&text).with_context(|| format!("operand is not a JSON array: {}", arg))?;
    Ok(items.iter().map(Value::to_string).collect())
}

fn run(op: Op, a: &Set<String>, b: &Set<String>) -> Outcome {
    match op {
        Op::Union => Outcome::Set(a.union(b)),
        Op::Intersection => Outcome::Set(a.intersection(b)),
        Op::Difference => Outcome::Set(a.difference(b)),
        Op::SymmetricDifference => Outcome::Set(a.symmetric_difference(b)),
        Op::Subset => Outcome::Bool(a.is_subset(b)),
        Op::Superset => Outcome::Bool(a.is_superset(b)),
        Op::Disjoint => Outcome::Bool(a.is_disjoint(b)),
        Op::Equal => Outcome::Bool(a.equal(b)),
    }
}

fn rank(v: &Value) -> u8 {
    match v {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// Orders by kind (null, bool, number, string, array, object), then by
/// value within a kind. Arrays and objects fall back to their JSON text.
fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => {
                let (x, y) = (x.as_f64().unwrap_or(f64::NAN), y.as_f64().unwrap_or(f64::NAN));
                x.partial_cmp(&y)
                    .unwrap_or(Ordering::Equal)
                    .then_with(|| a.to_string().cmp(&b.to_string()))
            }
        },
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => rank(a)
            .cmp(&rank(b))
            .then_with(|| a.to_string().cmp(&b.to_string())),
    }
}

fn render(set: &Set<String>, sorted: bool) -> Result<String> {
    let mut values = set
        .iter()
        .map(|k| serde_json::from_str::<Value>(k))
        .collect::<Result<Vec<_>, _>>()
        .context("failed to decode set element")?;
    if sorted {
        values.sort_by(compare_values);
    }
    Ok(serde_json::to_string(&values)?)
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let a = parse_operand(&args.a)?;
    let b = parse_operand(&args.b)?;

    if args.verbose {
        eprintln!("op: {:?}, |a|={}, |b|={}", args.op, a.len(), b.len());
    }

    match run(args.op, &a, &b) {
        Outcome::Set(s) => {
            if args.verbose {
                eprintln!("result has {} elements", s.len());
            }
            println!("{}", render(&s, args.sorted)?);
        }
        Outcome::Bool(v) => println!("{}", v),
    }

    Ok(())
}

use anyhow::{Context, Result, bail};
use clap::Parser;
use rust_containers::{Vector, read_input};

#[derive(Parser, Debug)]
#[command(version, about = "Apply vector operations to a JSON integer array", long_about = None)]
struct Args {
    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Input file holding a JSON array ('-' for stdin) [default: $CONTAINERS_INPUT, then stdin]
    #[arg(short, long)]
    input: Option<String>,

    /// Print the sum of the resulting elements instead of the array
    #[arg(long)]
    sum: bool,

    /// Fail on the first operation the vector rejects
    #[arg(long)]
    strict: bool,

    /// Operations applied left to right: push:N pop set:I:N insert:I:N delete:I
    /// remove:N swap:I:J slice:I:J reverse clear map-add:N filter-gt:N
    ops: Vec<String>,
}

fn arg<T: std::str::FromStr>(op: &str, parts: &[&str], n: usize) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw = parts
        .get(n)
        .with_context(|| format!("{}: missing argument {}", op, n))?;
    raw.parse()
        .with_context(|| format!("{}: bad argument {:?}", op, raw))
}

/// Applies one operation. Returns false when the vector rejected it.
fn apply(v: &mut Vector<'static, i64>, op: &str) -> Result<bool> {
    let parts: Vec<&str> = op.split(':').collect();
    let ok = match parts[0] {
        "push" => {
            v.push(arg(op, &parts, 1)?);
            true
        }
        "pop" => v.pop().is_some(),
        "set" => v.set(arg(op, &parts, 1)?, arg(op, &parts, 2)?),
        "insert" => v.insert(arg(op, &parts, 1)?, arg(op, &parts, 2)?),
        "delete" => v.delete(arg(op, &parts, 1)?),
        "remove" => v.remove(&arg(op, &parts, 1)?),
        "swap" => v.swap(arg(op, &parts, 1)?, arg(op, &parts, 2)?),
        "slice" => {
            let i = arg(op, &parts, 1)?;
            let j = arg(op, &parts, 2)?;
            let window = v.slice(i, j).map(|s| s.collect().to_vec());
            match window {
                Some(items) => {
                    *v = Vector::from(items);
                    true
                }
                None => false,
            }
        }
        "reverse" => {
            v.reverse();
            true
        }
        "clear" => {
            v.clear();
            true
        }
        "map-add" => {
            let n: i64 = arg(op, &parts, 1)?;
            *v = v.map(|t| t.wrapping_add(n));
            true
        }
        "filter-gt" => {
            let n: i64 = arg(op, &parts, 1)?;
            *v = v.filter(|t| *t > n);
            true
        }
        other => bail!("unknown operation: {}", other),
    };
    Ok(ok)
}

/// Applies `ops` in order. A rejected operation aborts when `strict` is set
/// and is otherwise reported and skipped. Returns the number rejected.
fn run_ops<S: AsRef<str>>(
    v: &mut Vector<'static, i64>,
    ops: &[S],
    strict: bool,
    verbose: bool,
) -> Result<usize> {
    let mut rejected = 0;
    for op in ops {
        let op = op.as_ref();
        if !apply(v, op)? {
            if strict {
                bail!("operation rejected: {} (len {})", op, v.len());
            }
            eprintln!("Warning: operation rejected: {} (len {})", op, v.len());
            rejected += 1;
        } else if verbose {
            eprintln!("{} -> {}", op, v);
        }
    }
    Ok(rejected)
}

// Integer overflow wraps, like the rest of the arithmetic here.
fn sum(v: &Vector<'_, i64>) -> i64 {
    v.reduce(|acc, t| acc.wrapping_add(*t))
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let text = read_input(args.input.as_deref())?;
    let mut v: Vector<'static, i64> = Vector::new();
    v.unmarshal_json(text.as_bytes())
        .context("input is not a JSON array of integers")?;

    if args.verbose {
        eprintln!("loaded {} elements", v.len());
    }

    run_ops(&mut v, &args.ops[..], args.strict, args.verbose)?;

    if args.sum {
        println!("{}", sum(&v));
    } else {
        println!("{}", v.marshal_json()?);
    }

    Ok(())
}

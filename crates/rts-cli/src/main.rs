//! Runtime Support CLI
//!
//! Command-line front-end over the exported entry points: identity text
//! encoding and decoding, base-32 grouping and bignum evaluation.

use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use log::debug;

use rts_host::{Handle, Host, RtsConfig, Runtime};

#[derive(Parser)]
#[command(name = "rts", version, about = "Runtime support core")]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long)]
    verbose: bool,

    /// Highest heap address in bytes
    #[arg(long, value_name = "BYTES")]
    heap_limit: Option<u32>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Encode hex payload bytes as identity text
    Encode { hex: String },
    /// Decode identity text to hex payload bytes
    Decode { text: String },
    /// Lower-case and hyphenate base-32 text
    Group { text: String },
    /// Evaluate a bignum operation on decimal operands
    Bigint {
        op: Op,
        a: String,
        b: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Op {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
    Neg,
    Abs,
    Lsh,
    Eq,
    Lt,
    Gt,
    Le,
    Ge,
    Isneg,
    Bits,
}

/// Traps end the process
struct ExitHost;

impl Host for ExitHost {
    fn trap(&self, msg: &str) -> ! {
        eprintln!("trap: {}", msg);
        process::exit(1);
    }
}

fn fail(msg: &str) -> ! {
    eprintln!("Error: {}", msg);
    process::exit(1);
}

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    let mut config = RtsConfig::default();
    if let Some(limit) = cli.heap_limit {
        config = config.with_heap_limit(limit);
    }
    debug!("config: {:?}", config);
    let mut rt = Runtime::new(config, ExitHost);

    match cli.command {
        Command::Encode { hex } => {
            let bytes = hex::decode(&hex).unwrap_or_else(|e| fail(&format!("invalid hex: {}", e)));
            let blob = rt.heap_mut().alloc_blob_from(&bytes).unwrap_or_else(|e| ExitHost.trap(&e.to_string()));
            let text = rt.principal_of_blob(blob);
            println!("{}", String::from_utf8_lossy(rt.blob_bytes(text)));
        }
        Command::Decode { text } => {
            let t = rt.text_of_str(&text);
            let blob = rt.blob_of_principal(t);
            println!("{}", hex::encode(rt.blob_bytes(blob)));
        }
        Command::Group { text } => {
            let t = rt.text_of_str(&text);
            let g = rt.base32_to_principal(t);
            println!("{}", String::from_utf8_lossy(rt.blob_bytes(g)));
        }
        Command::Bigint { op, a, b } => {
            let out = eval(&mut rt, op, &a, b.as_deref());
            println!("{}", out);
        }
    }
}

fn eval(rt: &mut Runtime<ExitHost>, op: Op, a: &str, b: Option<&str>) -> String {
    let x = rt.bigint_of_decimal(a);
    let operand = |rt: &mut Runtime<ExitHost>| -> Handle {
        match b {
            Some(b) => rt.bigint_of_decimal(b),
            None => fail("operation needs a second operand"),
        }
    };

    let result = match op {
        Op::Neg => rt.bigint_neg(x),
        Op::Abs => rt.bigint_abs(x),
        Op::Isneg => return rt.bigint_isneg(x).to_string(),
        Op::Bits => return rt.bigint_count_bits(x).to_string(),
        Op::Lsh => {
            let shift = b
                .and_then(|s| s.parse::<i32>().ok())
                .unwrap_or_else(|| fail("lsh needs a 32-bit shift count"));
            rt.bigint_lsh(x, shift)
        }
        Op::Eq | Op::Lt | Op::Gt | Op::Le | Op::Ge => {
            let y = operand(rt);
            let r = match op {
                Op::Eq => rt.bigint_eq(x, y),
                Op::Lt => rt.bigint_lt(x, y),
                Op::Gt => rt.bigint_gt(x, y),
                Op::Le => rt.bigint_le(x, y),
                _ => rt.bigint_ge(x, y),
            };
            return r.to_string();
        }
        Op::Add | Op::Sub | Op::Mul | Op::Div | Op::Rem | Op::Pow => {
            let y = operand(rt);
            match op {
                Op::Add => rt.bigint_add(x, y),
                Op::Sub => rt.bigint_sub(x, y),
                Op::Mul => rt.bigint_mul(x, y),
                Op::Div => rt.bigint_div(x, y),
                Op::Rem => rt.bigint_rem(x, y),
                _ => rt.bigint_pow(x, y),
            }
        }
    };
    rt.bigint_to_decimal(result)
}

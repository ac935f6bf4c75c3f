use std::env;
use std::sync::Arc;
use std::time::Instant;

use square_matrix::{multiply_on_runtime, SquareMatrix};
use tracing::{info, warn};

const PRINT_LIMIT: usize = 8;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = env::args().collect();

    let n = args.get(1).map_or(Ok(800), |s| s.parse::<usize>())?;
    let threads = args.get(2).map_or(Ok(2), |s| s.parse::<usize>())?;
    let min = args.get(3).map_or(Ok(0.0), |s| s.parse::<f64>())?;
    let max = args.get(4).map_or(Ok(10.0), |s| s.parse::<f64>())?;

    info!(n, threads, min, max, "generating operands");
    let a = SquareMatrix::random(n, min, max)?;
    let b = SquareMatrix::random(n, min, max)?;

    let start = Instant::now();
    let plain = a.multiply(&b)?;
    println!("Plain mult: {}", start.elapsed().as_secs_f64());

    let start = Instant::now();
    let threaded = a.multiply_concurrent(&b, threads)?;
    println!("Multithreaded mult: {}", start.elapsed().as_secs_f64());

    let a = Arc::new(a);
    let b = Arc::new(b);
    let start = Instant::now();
    let pooled = multiply_on_runtime(Arc::clone(&a), Arc::clone(&b), threads).await?;
    println!("Pooled mult: {}", start.elapsed().as_secs_f64());

    for (name, result) in [("multithreaded", &threaded), ("pooled", &pooled)] {
        if !plain.approx_eq(result)? {
            warn!(strategy = name, "result differs from plain multiplication");
            println!();
            println!("Fast mult failed!!! ({})", name);
        }
    }

    if n <= PRINT_LIMIT {
        println!("A:\n{}", a);
        println!("B:\n{}", b);
        println!("A x B:\n{}", plain);
    }

    Ok(())
}

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use anyhow::{bail, Context};
use clap::Parser;
use gol_fifo::{Capacity, ErrorKind, Fifo, Message, Timeout};
use tracing_subscriber::EnvFilter;

const GREETING_STATE: i32 = 1;
const BULK_STATE: i32 = 2;

#[derive(Parser, Debug)]
#[command(
    name = "gol-fifo-stress",
    about = "Hammer a gol-fifo with producer threads and drain it from the main thread until a quit message arrives."
)]
struct Args {
    /// Number of bulk producer threads
    #[arg(long, default_value_t = 1)]
    producers: usize,

    /// Messages enqueued by each bulk producer
    #[arg(long, default_value_t = 100_000)]
    messages: u64,

    /// Maximum buffered messages (unbounded when omitted)
    #[arg(long, value_name = "N")]
    capacity: Option<usize>,

    /// Dequeue timeout in milliseconds; timeouts are reported and retried (blocks forever when omitted)
    #[arg(long, value_name = "MS")]
    timeout_ms: Option<u64>,

    /// Only log warnings and errors
    #[arg(long, action = clap::ArgAction::SetTrue)]
    quiet: bool,
}

#[derive(Debug, Default)]
struct Summary {
    received: u64,
    after_quit: u64,
    timeouts: u64,
    greeting: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let default_level = if args.quiet { "warn" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    run(args)
}

fn run(args: Args) -> anyhow::Result<()> {
    if args.capacity == Some(0) {
        bail!("--capacity must be at least 1");
    }

    let capacity = Capacity::from(args.capacity);
    let timeout = Timeout::from(args.timeout_ms.map(Duration::from_millis));
    let fifo: Arc<Fifo<Message>> =
        Arc::new(Fifo::create(capacity).context("create fifo")?);

    tracing::info!(
        producers = args.producers,
        messages = args.messages,
        ?capacity,
        ?timeout,
        "starting"
    );
    let start = Instant::now();

    let mut producers = Vec::with_capacity(args.producers + 1);
    for id in 0..args.producers {
        let fifo = fifo.clone();
        let messages = args.messages;
        producers.push(spawn_producer(format!("bulk-{id}"), move || {
            for _ in 0..messages {
                fifo.enqueue(Message::new(BULK_STATE).with_data(id), Timeout::Infinite)?;
            }
            Ok(())
        })?);
    }
    {
        let fifo = fifo.clone();
        producers.push(spawn_producer("greeter".to_string(), move || {
            fifo.enqueue(
                Message::new(GREETING_STATE).with_text("Hello World"),
                Timeout::Infinite,
            )?;
            fifo.enqueue(Message::quit(), Timeout::Infinite)?;
            Ok(())
        })?);
    }

    let mut summary = Summary::default();
    loop {
        match fifo.dequeue(timeout) {
            Ok(msg) => {
                summary.received += 1;
                if msg.state == GREETING_STATE {
                    tracing::info!(text = ?msg.text, "received greeting");
                    summary.greeting = msg.text;
                } else if msg.is_quit() {
                    break;
                }
            }
            Err(err) if err.kind() == ErrorKind::Timeout => {
                tracing::warn!("{err}");
                summary.timeouts += 1;
            }
            Err(err) => return Err(err).context("dequeue"),
        }
    }
    tracing::info!(received = summary.received, "quit received, draining");

    // Bulk producers may still be running (and blocked on a bounded fifo); keep draining until
    // they are done so joining them cannot deadlock.
    while producers.iter().any(|p| !p.is_finished()) {
        match fifo.dequeue(Timeout::from_millis(10)) {
            Ok(_) => summary.after_quit += 1,
            Err(err) if err.is_timeout() => {}
            Err(err) => return Err(err).context("drain"),
        }
    }
    for producer in producers {
        let name = producer.thread().name().unwrap_or("producer").to_string();
        producer
            .join()
            .map_err(|_| anyhow::anyhow!("{name} panicked"))?
            .with_context(|| format!("{name} failed"))?;
    }

    let fifo = Arc::into_inner(fifo).context("fifo still shared after joining producers")?;
    let remaining = fifo.destroy();
    summary.after_quit += remaining.len() as u64;
    summary.received += summary.after_quit;

    let elapsed = start.elapsed();
    println!(
        "received {} messages ({} after quit), {} timeouts in {:.1} ms",
        summary.received,
        summary.after_quit,
        summary.timeouts,
        elapsed.as_secs_f64() * 1e3,
    );
    if let Some(greeting) = &summary.greeting {
        println!("greeting: {greeting}");
    }

    let expected = args.producers as u64 * args.messages + 2;
    if summary.received != expected {
        bail!("expected {expected} messages, received {}", summary.received);
    }
    Ok(())
}

fn spawn_producer(
    name: String,
    f: impl FnOnce() -> gol_fifo::Result<()> + Send + 'static,
) -> anyhow::Result<JoinHandle<gol_fifo::Result<()>>> {
    thread::Builder::new()
        .name(name.clone())
        .spawn(f)
        .with_context(|| format!("spawn {name}"))
}

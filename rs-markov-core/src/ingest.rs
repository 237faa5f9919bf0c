use std::fs::{self, File};
use std::io::{BufRead, BufReader, Cursor};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use crate::cancel::CancelFlag;
use crate::error::{Error, Result};
use crate::io::display_name;
use crate::model::chain::Chain;

/// Default spacing between two progress events (about 30 per second).
pub const DEFAULT_PROGRESS_INTERVAL: Duration = Duration::from_millis(1000 / 30);

/// A readable text source.
///
/// Each source is ingested as one token sequence: its last token on a line
/// links to the first token of the next line, but not to the next source.
#[derive(Clone, Debug)]
pub enum Source {
	File(PathBuf),
	Text { name: String, text: String },
}

impl Source {
	pub fn file(path: impl Into<PathBuf>) -> Self {
		Self::File(path.into())
	}

	pub fn text(name: impl Into<String>, text: impl Into<String>) -> Self {
		Self::Text { name: name.into(), text: text.into() }
	}

	pub fn name(&self) -> String {
		match self {
			Self::File(path) => display_name(path),
			Self::Text { name, .. } => name.clone(),
		}
	}

	/// Size in bytes, or 0 when unknown.
	fn size(&self) -> u64 {
		match self {
			Self::File(path) => fs::metadata(path).map(|metadata| metadata.len()).unwrap_or(0),
			Self::Text { text, .. } => text.len() as u64,
		}
	}

	fn open(&self) -> std::io::Result<Box<dyn BufRead + '_>> {
		match self {
			Self::File(path) => Ok(Box::new(BufReader::new(File::open(path)?))),
			Self::Text { text, .. } => Ok(Box::new(Cursor::new(text.as_bytes()))),
		}
	}
}

/// Notifications sent by an ingestion run, in order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IngestEvent {
	/// A source is about to be read.
	Loading { index: usize, name: String },
	/// Bytes consumed so far over all sources. Both values never decrease.
	Progress { processed: u64, total: u64 },
	/// A source could not be opened, or failed while being read. Tokens read
	/// before a failure stay in the chain.
	Skipped { index: usize, name: String, reason: String },
	/// The cancellation request was observed.
	Cancelled,
	/// Sent exactly once, last.
	Finished(IngestReport),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IngestReport {
	/// Distinct tokens in the chain after the run.
	pub nodes: usize,
	/// Tokens merged during the run.
	pub tokens: usize,
	/// Number of sources that could not be read.
	pub skipped: usize,
	/// When set, the chain was left unfinalized.
	pub cancelled: bool,
}

/// Ingestion parameters.
#[derive(Clone, Debug)]
pub struct IngestOptions {
	/// Worker threads used when several sources are given.
	pub jobs: usize,
	/// Minimum spacing between two progress events.
	pub progress_interval: Duration,
}

impl Default for IngestOptions {
	fn default() -> Self {
		Self { jobs: num_cpus::get(), progress_interval: DEFAULT_PROGRESS_INTERVAL }
	}
}

/// Running background ingestion.
///
/// The chain belongs to the worker until [`IngestHandle::join`] hands it
/// back, so nothing can read it half-built.
pub struct IngestHandle {
	cancel: CancelFlag,
	events: Receiver<IngestEvent>,
	worker: JoinHandle<Chain>,
}

impl IngestHandle {
	/// Asks the worker to stop at the next token.
	pub fn cancel(&self) {
		self.cancel.cancel();
	}

	pub fn cancel_flag(&self) -> CancelFlag {
		self.cancel.clone()
	}

	/// Event stream. Iteration ends once the worker has exited.
	pub fn events(&self) -> &Receiver<IngestEvent> {
		&self.events
	}

	/// Waits for the worker and returns the chain.
	pub fn join(self) -> Result<Chain> {
		self.worker.join().map_err(|_| Error::WorkerPanicked)
	}
}

/// Ingests `sources` into `chain` on a background thread.
///
/// # Parameters
/// - `chain`: moved into the worker; new observations are merged into it.
/// - `sources`: ingested in order, each as its own token sequence.
/// - `options`: worker count and progress spacing.
///
/// # Behavior
/// - Runs [`run`] on a new thread and forwards its events to
///   [`IngestHandle::events`].
/// - The chain is only reachable again through [`IngestHandle::join`], once
///   the worker is done with it.
///
/// # Notes
/// - [`IngestHandle::cancel`] stops the worker at the next token. The chain
///   handed back is then left unfinalized.
pub fn spawn(mut chain: Chain, sources: Vec<Source>, options: IngestOptions) -> IngestHandle {
	let cancel = CancelFlag::new();
	let (tx, rx) = mpsc::channel();

	let worker = {
		let cancel = cancel.clone();
		thread::spawn(move || {
			run(&mut chain, &sources, &options, &cancel, &tx);
			chain
		})
	};

	IngestHandle { cancel, events: rx, worker }
}

/// Ingests `sources` into `chain` on the calling thread.
///
/// # Parameters
/// - `chain`: receives every token read.
/// - `sources`: files or in-memory texts, streamed line by line.
/// - `options`: with `jobs > 1`, sources are spread over that many threads
///   and the partial chains merged in a fixed order.
/// - `cancel`: checked before each token.
/// - `events`: receives `Loading`, `Progress`, `Skipped` and `Cancelled`
///   events, then exactly one `Finished`.
///
/// # Behavior
/// - A source that cannot be opened or fails midway is reported as
///   `Skipped`; the run goes on with the next one.
/// - Invalid UTF-8 is replaced, not treated as a failure.
/// - Unless cancelled, the chain is finalized before `Finished` is sent.
///
/// # Notes
/// - A closed receiver does not stop the run.
pub fn run(
	chain: &mut Chain,
	sources: &[Source],
	options: &IngestOptions,
	cancel: &CancelFlag,
	events: &Sender<IngestEvent>,
) -> IngestReport {
	let total: u64 = sources.iter().map(Source::size).sum();
	let mut notifier = Notifier::new(events, total, options.progress_interval);
	let workers = options.jobs.max(1).min(sources.len().max(1));

	info!("Ingesting {} sources ({} bytes) with {} workers", sources.len(), total, workers);

	let mut report = if workers > 1 {
		run_parallel(chain, sources, workers, cancel, &mut notifier)
	} else {
		run_sequential(chain, sources, cancel, &mut notifier)
	};
	notifier.flush();

	report.cancelled = cancel.is_cancelled();
	if report.cancelled {
		info!("Ingestion cancelled after {} tokens", report.tokens);
		notifier.send(IngestEvent::Cancelled);
	} else {
		chain.finalize();
	}
	report.nodes = chain.count();

	info!("Ingestion finished: {} nodes, {} tokens, {} skipped", report.nodes, report.tokens, report.skipped);
	notifier.send(IngestEvent::Finished(report.clone()));
	report
}

fn run_sequential(
	chain: &mut Chain,
	sources: &[Source],
	cancel: &CancelFlag,
	notifier: &mut Notifier<'_>,
) -> IngestReport {
	let mut report = IngestReport::default();

	for (index, source) in sources.iter().enumerate() {
		if cancel.is_cancelled() {
			break;
		}
		notifier.loading(index, source.name());
		let outcome = ingest_source(chain, source, cancel, &mut |bytes: u64| notifier.advance(bytes));
		report.tokens += outcome.tokens;
		if let Some(e) = outcome.error {
			report.skipped += 1;
			notifier.skipped(index, source.name(), &e);
		}
	}

	report
}

/// Messages from a parallel worker to the coordinating thread.
enum WorkerMessage {
	Loading { index: usize, name: String },
	Advanced(u64),
	Skipped { index: usize, name: String, error: Error },
	Done { worker: usize, partial: Chain, tokens: usize },
}

/// Splits sources round-robin over `workers` threads, each building a partial
/// chain, then merges the partials in worker order.
fn run_parallel(
	chain: &mut Chain,
	sources: &[Source],
	workers: usize,
	cancel: &CancelFlag,
	notifier: &mut Notifier<'_>,
) -> IngestReport {
	let mut report = IngestReport::default();
	let (tx, rx) = mpsc::channel();

	let partials = thread::scope(|scope| {
		for worker in 0..workers {
			let tx = tx.clone();
			scope.spawn(move || {
				let mut partial = Chain::new();
				let mut tokens = 0;
				for (index, source) in sources.iter().enumerate().skip(worker).step_by(workers) {
					if cancel.is_cancelled() {
						break;
					}
					let _ = tx.send(WorkerMessage::Loading { index, name: source.name() });
					let mut advanced = |bytes: u64| {
						let _ = tx.send(WorkerMessage::Advanced(bytes));
					};
					let outcome = ingest_source(&mut partial, source, cancel, &mut advanced);
					tokens += outcome.tokens;
					if let Some(error) = outcome.error {
						let _ = tx.send(WorkerMessage::Skipped { index, name: source.name(), error });
					}
				}
				let _ = tx.send(WorkerMessage::Done { worker, partial, tokens });
			});
		}
		drop(tx);

		let mut partials: Vec<Option<Chain>> = (0..workers).map(|_| None).collect();
		for message in rx.iter() {
			match message {
				WorkerMessage::Loading { index, name } => notifier.loading(index, name),
				WorkerMessage::Advanced(bytes) => notifier.advance(bytes),
				WorkerMessage::Skipped { index, name, error } => {
					report.skipped += 1;
					notifier.skipped(index, name, &error);
				}
				WorkerMessage::Done { worker, partial, tokens } => {
					debug!("Worker {worker} built {} nodes from {tokens} tokens", partial.count());
					report.tokens += tokens;
					partials[worker] = Some(partial);
				}
			}
		}
		partials
	});

	for partial in partials.into_iter().flatten() {
		chain.merge(&partial);
	}
	report
}

/// What one source contributed.
struct SourceOutcome {
	/// Tokens merged, including those read before a failure.
	tokens: usize,
	/// Set when the source could not be opened or stopped reading midway.
	error: Option<Error>,
}

/// Streams one source line by line into `chain`, reporting bytes consumed.
///
/// Lines are decoded leniently: invalid UTF-8 becomes U+FFFD instead of
/// failing the source. Only real I/O failures end it early, and tokens merged
/// before such a failure are kept and counted.
fn ingest_source(
	chain: &mut Chain,
	source: &Source,
	cancel: &CancelFlag,
	advanced: &mut dyn FnMut(u64),
) -> SourceOutcome {
	let unreadable = |io: std::io::Error| Error::SourceRead { source_name: source.name(), io };

	let mut reader = match source.open() {
		Ok(reader) => reader,
		Err(io) => return SourceOutcome { tokens: 0, error: Some(unreadable(io)) },
	};

	let mut ingestion = chain.begin(cancel);
	let mut buffer = Vec::new();
	let mut error = None;
	loop {
		buffer.clear();
		let read = match reader.read_until(b'\n', &mut buffer) {
			Ok(0) => break,
			Ok(read) => read,
			Err(io) => {
				error = Some(unreadable(io));
				break;
			}
		};
		let more = ingestion.push_line(&String::from_utf8_lossy(&buffer));
		advanced(read as u64);
		if !more {
			break;
		}
	}

	let tokens = ingestion.tokens();
	debug!("Read {tokens} tokens from {}", source.name());
	SourceOutcome { tokens, error }
}

/// Sends events, rate-limiting progress.
struct Notifier<'a> {
	events: &'a Sender<IngestEvent>,
	processed: u64,
	total: u64,
	interval: Duration,
	last_sent: Option<Instant>,
	reported: u64,
}

impl<'a> Notifier<'a> {
	fn new(events: &'a Sender<IngestEvent>, total: u64, interval: Duration) -> Self {
		Self { events, processed: 0, total, interval, last_sent: None, reported: 0 }
	}

	/// A closed receiver only means nobody is listening anymore.
	fn send(&self, event: IngestEvent) {
		let _ = self.events.send(event);
	}

	fn loading(&self, index: usize, name: String) {
		debug!("Loading source #{index}: {name}");
		self.send(IngestEvent::Loading { index, name });
	}

	fn skipped(&self, index: usize, name: String, error: &Error) {
		warn!("Skipping source #{index} ({name}): {error}");
		self.send(IngestEvent::Skipped { index, name, reason: error.to_string() });
	}

	fn advance(&mut self, bytes: u64) {
		self.processed += bytes;
		if self.last_sent.is_none_or(|sent| sent.elapsed() >= self.interval) {
			self.report();
		}
	}

	fn flush(&mut self) {
		if self.reported != self.processed {
			self.report();
		}
	}

	fn report(&mut self) {
		// Files may grow while being read; total never falls behind processed.
		self.total = self.total.max(self.processed);
		self.send(IngestEvent::Progress { processed: self.processed, total: self.total });
		self.last_sent = Some(Instant::now());
		self.reported = self.processed;
	}
}

//! Interactive session.
//!
//! [`App`] is the only owner of the [`Controller`]. Input lines and finished lookups both arrive
//! as [`Event`]s on one channel and are handled one at a time, so state is never touched from two
//! places at once. Lookups run on a thread pool and report back through the same channel.

use crate::client::{FetchError, ReceiptApi};
use crate::controller::{Controller, Ticket};
use crate::export::ExportError;
use crate::receipt::TransactionReceiptView;
use crate::ui::Screen;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::any::Any;
use std::io::{self, BufRead, Write};
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::{env, thread};
use thiserror::Error;
use tracing::{debug, error, info};

// Lookups are user-paced, a handful of threads is plenty.
const DEFAULT_THREADPOOL_SIZE: usize = 4;

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("Error parsing RAYON_NUM_THREADS")]
    RayonThreadPoolSize(#[source] std::num::ParseIntError),

    #[error("Rayon thread pool error")]
    RayonThreadPoolInit(#[from] rayon::ThreadPoolBuildError),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Thread Pool error")]
    ThreadPool(#[from] PoolError),

    #[error("Unable to draw the screen")]
    Io(#[from] io::Error),
}

pub enum Event {
    /// One line of user input, without the line terminator.
    Input(String),

    /// A lookup finished.
    Resolved(Ticket, Result<TransactionReceiptView, FetchError>),

    /// No more input will arrive.
    Closed,
}

enum Command<'a> {
    ExportPdf,
    ExportQr(&'a str),
    Quit,
    Submit(&'a str),
}

impl<'a> Command<'a> {
    fn parse(line: &'a str) -> Self {
        match line.trim() {
            ":pdf" => Self::ExportPdf,
            ":quit" | ":q" => Self::Quit,
            cmd => match cmd.strip_prefix(":qr") {
                Some(path) if path.is_empty() || path.starts_with(' ') => {
                    Self::ExportQr(path.trim())
                }
                _ => Self::Submit(line),
            },
        }
    }
}

pub struct App<A, W> {
    controller: Controller,
    api: Arc<A>,
    pool: ThreadPool,
    output_dir: PathBuf,
    out: W,
    tx: Sender<Event>,
    rx: Receiver<Event>,
    pending: usize,
    closed: bool,
}

impl<A, W> App<A, W>
where
    A: ReceiptApi + Send + Sync + 'static,
    W: Write,
{
    /// PDF exports are written to `output_dir`. The screen is drawn to `out`.
    pub fn new(
        api: Arc<A>,
        controller: Controller,
        output_dir: impl Into<PathBuf>,
        out: W,
    ) -> Result<Self, AppError> {
        let (num_threads, pool) = create_thread_pool()?;
        let (tx, rx) = mpsc::channel();

        debug!("Lookup thread pool has {num_threads} threads");

        Ok(Self {
            controller,
            api,
            pool,
            output_dir: output_dir.into(),
            out,
            tx,
            rx,
            pending: 0,
            closed: false,
        })
    }

    /// A sender for feeding events into the loop, e.g. with [`spawn_input`].
    pub fn sender(&self) -> Sender<Event> {
        self.tx.clone()
    }

    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    /// Handle events until input is closed and every outstanding lookup has been applied.
    pub fn run(&mut self) -> Result<(), AppError> {
        self.draw()?;

        while !self.closed || self.pending > 0 {
            // `self.tx` keeps the channel open, so this only fails if the loop is broken.
            let Ok(event) = self.rx.recv() else {
                break;
            };
            self.handle(event)?;
        }

        Ok(())
    }

    /// Wait for every outstanding lookup and apply it.
    pub fn drain(&mut self) -> Result<(), AppError> {
        while self.pending > 0 {
            let Ok(event) = self.rx.recv() else {
                break;
            };
            self.handle(event)?;
        }

        Ok(())
    }

    /// Handle one event and redraw.
    pub fn handle(&mut self, event: Event) -> Result<(), AppError> {
        match event {
            Event::Input(_) if self.closed => return Ok(()),
            Event::Input(line) => match Command::parse(&line) {
                Command::ExportPdf => self.export_pdf()?,
                Command::ExportQr(path) => self.export_qr(Path::new(path))?,
                Command::Quit => self.closed = true,
                Command::Submit(query) => {
                    self.controller.set_query(query);
                    let ticket = self.controller.submit();
                    self.spawn_lookup(ticket);
                }
            },
            Event::Resolved(ticket, result) => {
                self.pending = self.pending.saturating_sub(1);
                self.controller.resolve(ticket, result);
            }
            Event::Closed => self.closed = true,
        }

        self.draw()
    }

    fn spawn_lookup(&mut self, ticket: Ticket) {
        let api = Arc::clone(&self.api);
        let tx = self.tx.clone();
        self.pending += 1;

        self.pool.spawn(move || {
            let result = panic::catch_unwind(AssertUnwindSafe(|| api.fetch_receipt(ticket.query())))
                .unwrap_or_else(|payload| Err(panic_to_fetch_error(payload)));

            // The receiver lives as long as the app, which waits for pending lookups.
            let _ = tx.send(Event::Resolved(ticket, result));
        });
    }

    fn export_pdf(&mut self) -> Result<(), AppError> {
        match self.controller.export_pdf(&self.output_dir) {
            Ok(Some(path)) => writeln!(self.out, "Saved {}", path.display())?,
            Ok(None) => writeln!(self.out, "Nothing to export yet.")?,
            Err(err) => self.report(err)?,
        }

        Ok(())
    }

    fn export_qr(&mut self, path: &Path) -> Result<(), AppError> {
        if path.as_os_str().is_empty() {
            writeln!(self.out, "Usage: :qr <path>")?;
            return Ok(());
        }

        match self.controller.export_qr_svg(path) {
            Ok(true) => writeln!(self.out, "Saved {}", path.display())?,
            Ok(false) => writeln!(self.out, "Nothing to export yet.")?,
            Err(err) => self.report(err)?,
        }

        Ok(())
    }

    /// Export failures are shown and logged, the session goes on.
    fn report(&mut self, err: ExportError) -> Result<(), AppError> {
        error!("{err}");

        writeln!(self.out, "Export failed: {err}")?;
        if let Some(source) = std::error::Error::source(&err) {
            writeln!(self.out, "  Caused by: {source}")?;
        }

        Ok(())
    }

    fn draw(&mut self) -> Result<(), AppError> {
        writeln!(self.out, "{}", Screen(&self.controller))?;
        self.out.flush()?;

        Ok(())
    }
}

/// Forward every line of `reader` as [`Event::Input`], then send [`Event::Closed`].
pub fn spawn_input<R>(reader: R, tx: Sender<Event>) -> thread::JoinHandle<()>
where
    R: BufRead + Send + 'static,
{
    thread::spawn(move || {
        for line in reader.lines() {
            match line {
                Ok(line) => {
                    if tx.send(Event::Input(line)).is_err() {
                        return;
                    }
                }
                Err(err) => {
                    error!("Unable to read input: {err}");
                    break;
                }
            }
        }

        info!("Input closed");
        let _ = tx.send(Event::Closed);
    })
}

pub(crate) fn create_thread_pool() -> Result<(usize, ThreadPool), PoolError> {
    let num_threads = env::var("RAYON_NUM_THREADS")
        .unwrap_or_else(|_| DEFAULT_THREADPOOL_SIZE.to_string())
        .parse()
        .map_err(PoolError::RayonThreadPoolSize)?;

    let pool = ThreadPoolBuilder::new().num_threads(num_threads).build()?;

    Ok((num_threads, pool))
}

/// Panics carrying a string keep their message. Anything else is an unknown error.
fn panic_to_fetch_error(payload: Box<dyn Any + Send>) -> FetchError {
    if let Some(message) = payload.downcast_ref::<&str>() {
        FetchError::transport(*message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        FetchError::transport(message.as_str())
    } else {
        FetchError::Unknown
    }
}

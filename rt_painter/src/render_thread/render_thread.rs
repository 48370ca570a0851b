/// Render thread: owns a graphics device and drains render commands in order
///
/// Producers enqueue boxed closures without blocking. One dedicated thread
/// receives them over a crossbeam channel and runs them one at a time, so no
/// two render commands ever overlap.

use std::cell::Cell;
use std::sync::{Arc, Mutex, RwLock};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use crossbeam_channel::{Receiver, Sender, TrySendError};

use crate::error::{Error, Result};
use crate::graphics_device::GraphicsDevice;

// ===== THREAD AFFINITY =====

thread_local! {
    static IN_RENDERING_THREAD: Cell<bool> = const { Cell::new(false) };
}

/// True only while running inside a render thread
pub fn is_in_rendering_thread() -> bool {
    IN_RENDERING_THREAD.with(|flag| flag.get())
}

/// Marks the current thread as a rendering thread until dropped
pub(crate) struct RenderingThreadScope {
    previous: bool,
}

impl RenderingThreadScope {
    pub(crate) fn enter() -> Self {
        let previous = IN_RENDERING_THREAD.with(|flag| flag.replace(true));
        Self { previous }
    }
}

impl Drop for RenderingThreadScope {
    fn drop(&mut self) {
        IN_RENDERING_THREAD.with(|flag| flag.set(self.previous));
    }
}

/// Clears the running flag when the worker exits, panicking or not
struct RunningFlag(Arc<AtomicBool>);

impl Drop for RunningFlag {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

// ===== MESSAGES =====

/// Body of a render command
pub type RenderCommandBody = Box<dyn FnOnce(&mut dyn GraphicsDevice) -> Result<()> + Send>;

/// Unit of work crossing the handoff queue
pub struct RenderCommand {
    pub name: String,
    body: RenderCommandBody,
}

/// Render thread control messages
enum RenderThreadMessage {
    /// Run a command
    Command(RenderCommand),
    /// Exit after every message queued before this one
    Shutdown,
}

// ===== CONFIG =====

/// Render thread configuration
#[derive(Debug, Clone)]
pub struct RenderThreadConfig {
    /// OS thread name
    pub thread_name: String,
    /// Maximum queued commands (None = unbounded)
    ///
    /// A full bounded queue makes `enqueue` fail immediately.
    pub queue_capacity: Option<usize>,
}

impl Default for RenderThreadConfig {
    fn default() -> Self {
        Self {
            thread_name: "RenderThread".to_string(),
            queue_capacity: None,
        }
    }
}

// ===== RENDER THREAD =====

/// Render thread handle
pub struct RenderThread {
    name: String,
    sender: RwLock<Option<Sender<RenderThreadMessage>>>,
    thread_handle: Mutex<Option<JoinHandle<Box<dyn GraphicsDevice>>>>,
    running: Arc<AtomicBool>,
    executed: Arc<AtomicU64>,
}

impl RenderThread {
    /// Start a render thread that takes ownership of `device`
    ///
    /// # Errors
    ///
    /// `Error::InitializationFailed` if the OS thread cannot be spawned.
    pub fn spawn(device: Box<dyn GraphicsDevice>, config: RenderThreadConfig) -> Result<Self> {
        let (sender, receiver) = match config.queue_capacity {
            Some(capacity) => crossbeam_channel::bounded::<RenderThreadMessage>(capacity),
            None => crossbeam_channel::unbounded::<RenderThreadMessage>(),
        };
        let running = Arc::new(AtomicBool::new(true));
        let executed = Arc::new(AtomicU64::new(0));

        let running_clone = Arc::clone(&running);
        let executed_clone = Arc::clone(&executed);
        let thread_handle = thread::Builder::new()
            .name(config.thread_name.clone())
            .spawn(move || Self::render_thread_main(device, receiver, running_clone, executed_clone))
            .map_err(|e| {
                crate::engine_error!("rtp::RenderThread", "Failed to spawn '{}': {}", config.thread_name, e);
                Error::InitializationFailed(format!("render thread spawn failed: {}", e))
            })?;

        crate::engine_info!("rtp::RenderThread", "'{}' started", config.thread_name);

        Ok(Self {
            name: config.thread_name,
            sender: RwLock::new(Some(sender)),
            thread_handle: Mutex::new(Some(thread_handle)),
            running,
            executed,
        })
    }

    fn render_thread_main(
        mut device: Box<dyn GraphicsDevice>,
        receiver: Receiver<RenderThreadMessage>,
        running: Arc<AtomicBool>,
        executed: Arc<AtomicU64>,
    ) -> Box<dyn GraphicsDevice> {
        let _scope = RenderingThreadScope::enter();
        let _running = RunningFlag(running);

        for message in receiver.iter() {
            match message {
                RenderThreadMessage::Command(command) => {
                    crate::engine_trace!("rtp::RenderThread", "running '{}'", command.name);
                    let RenderCommand { name, body } = command;
                    if let Err(e) = body(device.as_mut()) {
                        crate::engine_error!("rtp::RenderThread", "render command '{}' failed: {}", name, e);
                        panic!("render command '{}' failed: {}", name, e);
                    }
                    executed.fetch_add(1, Ordering::SeqCst);
                }
                RenderThreadMessage::Shutdown => break,
            }
        }
        device
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// False once the worker has exited (shutdown or fatal command)
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Number of commands that completed
    pub fn executed_count(&self) -> u64 {
        self.executed.load(Ordering::SeqCst)
    }

    /// Number of messages waiting in the queue
    pub fn pending_count(&self) -> usize {
        match self.sender.read() {
            Ok(sender) => sender.as_ref().map_or(0, |s| s.len()),
            Err(_) => 0,
        }
    }

    /// Append a command to the queue without blocking
    ///
    /// `body` runs on the render thread after every previously enqueued
    /// command, with exclusive access to the device. An `Err` returned by
    /// `body` is fatal for the render thread.
    ///
    /// # Errors
    ///
    /// `Error::BackendError` if the thread is shut down or a bounded queue is full.
    pub fn enqueue<F>(&self, name: &str, body: F) -> Result<()>
    where
        F: FnOnce(&mut dyn GraphicsDevice) -> Result<()> + Send + 'static,
    {
        let guard = self.sender.read()
            .map_err(|_| crate::engine_err!("rtp::RenderThread",
                "enqueue '{}': render thread '{}' sender lock poisoned", name, self.name))?;

        let Some(sender) = guard.as_ref() else {
            return Err(crate::engine_err!("rtp::RenderThread",
                "enqueue '{}': render thread '{}' is shut down", name, self.name));
        };

        let message = RenderThreadMessage::Command(RenderCommand {
            name: name.to_string(),
            body: Box::new(body),
        });
        match sender.try_send(message) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(crate::engine_err!("rtp::RenderThread",
                "enqueue '{}': queue of '{}' is full", name, self.name)),
            Err(TrySendError::Disconnected(_)) => Err(crate::engine_err!("rtp::RenderThread",
                "enqueue '{}': render thread '{}' has stopped", name, self.name)),
        }
    }

    /// Drain every queued command, stop the thread and hand the device back
    ///
    /// # Errors
    ///
    /// - `Error::BackendError` if the thread was already joined, if called from
    ///   the render thread itself, or if a command failed and the thread panicked
    pub fn shutdown(&self) -> Result<Box<dyn GraphicsDevice>> {
        let mut handle_lock = self.thread_handle.lock()
            .map_err(|_| Error::BackendError("render thread handle lock poisoned".to_string()))?;

        if let Some(handle) = handle_lock.as_ref() {
            if handle.thread().id() == thread::current().id() {
                return Err(crate::engine_err!("rtp::RenderThread",
                    "'{}' cannot shut itself down", self.name));
            }
        }

        let Some(handle) = handle_lock.take() else {
            return Err(crate::engine_err!("rtp::RenderThread", "'{}' is already shut down", self.name));
        };

        let sender = match self.sender.write() {
            Ok(mut sender) => sender.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(sender) = sender {
            // Disconnected means the worker already exited; join reports why.
            let _ = sender.send(RenderThreadMessage::Shutdown);
        }

        match handle.join() {
            Ok(device) => {
                crate::engine_info!("rtp::RenderThread",
                    "'{}' stopped after {} command(s)", self.name, self.executed_count());
                Ok(device)
            }
            Err(_) => Err(crate::engine_err!("rtp::RenderThread",
                "'{}' terminated by a failed render command", self.name)),
        }
    }
}

impl Drop for RenderThread {
    fn drop(&mut self) {
        let joinable = matches!(self.thread_handle.get_mut(), Ok(handle) if handle.is_some());
        if joinable {
            let _ = self.shutdown();
        }
    }
}

impl std::fmt::Debug for RenderThread {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderThread")
            .field("name", &self.name)
            .field("running", &self.is_running())
            .field("executed", &self.executed_count())
            .finish()
    }
}

#[cfg(test)]
#[path = "render_thread_tests.rs"]
mod tests;

/// RtPainter - Singleton manager for render threads and logging
///
/// This module provides global singleton management for named render threads
/// and the engine logger. It uses thread-safe static storage with RwLock for
/// safe concurrent access.

use std::sync::{OnceLock, RwLock, Arc};
use std::time::SystemTime;
use rustc_hash::FxHashMap;
use crate::error::{Result, Error};
use crate::graphics_device::GraphicsDevice;
use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
use crate::render_thread::{RenderThread, RenderThreadConfig};

// ===== INTERNAL STATE =====

/// Global engine state storage
static ENGINE_STATE: OnceLock<EngineState> = OnceLock::new();

/// Global logger (initialized with DefaultLogger)
static LOGGER: OnceLock<RwLock<Box<dyn Logger>>> = OnceLock::new();

/// Internal state structure holding all engine singletons
struct EngineState {
    /// Render threads by name
    render_threads: RwLock<FxHashMap<String, Arc<RenderThread>>>,
}

impl EngineState {
    fn new() -> Self {
        Self {
            render_threads: RwLock::new(FxHashMap::default()),
        }
    }
}

fn logger_lock() -> &'static RwLock<Box<dyn Logger>> {
    LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger::default())))
}

// ===== PUBLIC API =====

/// Main engine singleton manager
///
/// Owns every named render thread. Each render thread owns its graphics
/// device, so the device is handed back when the thread is destroyed.
///
/// # Example
///
/// ```no_run
/// use rt_painter::rtp::{Engine, thread::RenderThreadConfig};
/// use rt_painter_renderer_soft::SoftGraphicsDevice;
///
/// Engine::initialize()?;
/// let device = SoftGraphicsDevice::new(Default::default())?;
/// let render_thread = Engine::create_render_thread("main", Box::new(device), RenderThreadConfig::default())?;
///
/// // Enqueue draws through render_thread...
///
/// Engine::shutdown();
/// # Ok::<(), rt_painter::rtp::Error>(())
/// ```
pub struct Engine;

impl Engine {
    /// Helper to log errors before returning them (internal use)
    fn log_and_return_error(error: Error) -> Error {
        match &error {
            Error::InitializationFailed(msg) => {
                crate::engine_error!("rtp::Engine", "Initialization failed: {}", msg);
            }
            Error::BackendError(msg) => {
                crate::engine_error!("rtp::Engine", "Backend error: {}", msg);
            }
            _ => {
                crate::engine_error!("rtp::Engine", "Engine error: {}", error);
            }
        }
        error
    }

    fn state() -> Result<&'static EngineState> {
        ENGINE_STATE.get()
            .ok_or_else(|| Self::log_and_return_error(
                Error::InitializationFailed("Engine not initialized. Call Engine::initialize() first.".to_string())
            ))
    }

    /// Initialize the engine
    ///
    /// Idempotent. Must be called before creating any render thread.
    pub fn initialize() -> Result<()> {
        ENGINE_STATE.get_or_init(EngineState::new);
        Ok(())
    }

    /// Shutdown every render thread
    ///
    /// Queued commands are drained before each thread stops. Devices are
    /// dropped. After calling this, render threads may be created again.
    pub fn shutdown() {
        let Some(state) = ENGINE_STATE.get() else {
            return;
        };
        let drained: Vec<(String, Arc<RenderThread>)> = match state.render_threads.write() {
            Ok(mut threads) => threads.drain().collect(),
            Err(_) => return,
        };
        for (name, render_thread) in drained {
            match render_thread.shutdown() {
                Ok(_device) => crate::engine_info!("rtp::Engine", "Render thread '{}' shut down", name),
                Err(e) => crate::engine_warn!("rtp::Engine", "Render thread '{}' shut down with error: {}", name, e),
            }
        }
    }

    // ===== RENDER THREAD API =====

    /// Spawn and register a named render thread owning `device`
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The engine is not initialized
    /// - A render thread with the same name already exists
    /// - The OS thread cannot be spawned
    pub fn create_render_thread(
        name: &str,
        device: Box<dyn GraphicsDevice>,
        config: RenderThreadConfig,
    ) -> Result<Arc<RenderThread>> {
        let state = Self::state()?;

        let mut lock = state.render_threads.write()
            .map_err(|_| Self::log_and_return_error(
                Error::BackendError("RenderThread lock poisoned".to_string())
            ))?;

        if lock.contains_key(name) {
            return Err(Self::log_and_return_error(
                Error::InitializationFailed(format!(
                    "RenderThread '{}' already exists. Call Engine::destroy_render_thread() first.", name
                ))
            ));
        }

        let render_thread = Arc::new(RenderThread::spawn(device, config)?);
        lock.insert(name.to_string(), Arc::clone(&render_thread));

        crate::engine_info!("rtp::Engine", "RenderThread '{}' created successfully", name);

        Ok(render_thread)
    }

    /// Get a registered render thread by name
    ///
    /// # Errors
    ///
    /// Returns an error if the engine is not initialized or the name is unknown.
    pub fn render_thread(name: &str) -> Result<Arc<RenderThread>> {
        let state = Self::state()?;

        let lock = state.render_threads.read()
            .map_err(|_| Self::log_and_return_error(
                Error::BackendError("RenderThread lock poisoned".to_string())
            ))?;

        lock.get(name).cloned()
            .ok_or_else(|| Self::log_and_return_error(
                Error::InitializationFailed(format!(
                    "RenderThread '{}' not created. Call Engine::create_render_thread() first.", name
                ))
            ))
    }

    /// Unregister a render thread, drain its queue and return its device
    ///
    /// Other `Arc<RenderThread>` clones stay valid, but reject new commands.
    pub fn destroy_render_thread(name: &str) -> Result<Box<dyn GraphicsDevice>> {
        let state = Self::state()?;

        let removed = state.render_threads.write()
            .map_err(|_| Self::log_and_return_error(
                Error::BackendError("RenderThread lock poisoned".to_string())
            ))?
            .remove(name);

        let render_thread = removed
            .ok_or_else(|| Self::log_and_return_error(
                Error::InvalidResource(format!("RenderThread '{}' not found", name))
            ))?;

        let device = render_thread.shutdown()?;

        crate::engine_info!("rtp::Engine", "RenderThread '{}' destroyed", name);

        Ok(device)
    }

    /// Number of registered render threads (0 if not initialized)
    pub fn render_thread_count() -> usize {
        ENGINE_STATE.get()
            .and_then(|state| state.render_threads.read().ok().map(|threads| threads.len()))
            .unwrap_or(0)
    }

    /// Sorted names of registered render threads
    pub fn render_thread_names() -> Vec<String> {
        let mut names: Vec<String> = ENGINE_STATE.get()
            .and_then(|state| state.render_threads.read().ok()
                .map(|threads| threads.keys().cloned().collect()))
            .unwrap_or_default();
        names.sort();
        names
    }

    /// Reset all singletons for testing (only available in test builds)
    #[cfg(test)]
    pub fn reset_for_testing() {
        Self::shutdown();
        Self::reset_logger();
    }

    // ===== LOGGING API =====

    /// Set a custom logger
    ///
    /// Replace the default logger with a custom implementation (file logger,
    /// capture logger, etc.)
    ///
    /// # Example
    ///
    /// ```no_run
    /// use rt_painter::rtp::{Engine, log::{Logger, LogEntry}};
    ///
    /// struct FileLogger;
    /// impl Logger for FileLogger {
    ///     fn log(&self, entry: &LogEntry) {
    ///         // Write to file...
    ///     }
    /// }
    ///
    /// Engine::set_logger(FileLogger);
    /// ```
    pub fn set_logger<L: Logger + 'static>(logger: L) {
        if let Ok(mut lock) = logger_lock().write() {
            *lock = Box::new(logger);
        }
    }

    /// Reset logger to default (DefaultLogger)
    pub fn reset_logger() {
        if let Ok(mut lock) = logger_lock().write() {
            *lock = Box::new(DefaultLogger::default());
        }
    }

    /// Internal logging method (for simple logs without file:line)
    ///
    /// Used by macros like engine_info!, engine_warn!, etc.
    pub fn log(severity: LogSeverity, source: &str, message: String) {
        if let Ok(lock) = logger_lock().read() {
            lock.log(&LogEntry {
                severity,
                timestamp: SystemTime::now(),
                source: source.to_string(),
                message,
                file: None,
                line: None,
            });
        }
    }

    /// Internal logging method with file:line information (for ERROR logs)
    ///
    /// Used by engine_error! macro to include source location.
    pub fn log_detailed(
        severity: LogSeverity,
        source: &str,
        message: String,
        file: &'static str,
        line: u32,
    ) {
        if let Ok(lock) = logger_lock().read() {
            lock.log(&LogEntry {
                severity,
                timestamp: SystemTime::now(),
                source: source.to_string(),
                message,
                file: Some(file),
                line: Some(line),
            });
        }
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;

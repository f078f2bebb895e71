/// Quasar3D Engine - Singleton manager for engine subsystems
///
/// Global singleton management for the resource manager and the logger.
/// Thread-safe static storage with RwLock for concurrent access; the
/// "one pool per resource kind" cardinality of the engine lives behind
/// the single ResourceManager instance created here.

use std::sync::{Arc, Mutex, OnceLock, RwLock};
use std::time::SystemTime;

use crate::error::{Error, Result};
use crate::log::{DefaultLogger, LogEntry, LogSeverity, Logger};
use crate::resource::ResourceManager;

// ===== INTERNAL STATE =====

/// Global engine state storage
static ENGINE_STATE: OnceLock<EngineState> = OnceLock::new();

/// Global logger (initialized with DefaultLogger)
static LOGGER: OnceLock<RwLock<Box<dyn Logger>>> = OnceLock::new();

/// Internal state structure holding all engine singletons
struct EngineState {
    /// Resource manager singleton
    resource_manager: RwLock<Option<Arc<Mutex<ResourceManager>>>>,
}

impl EngineState {
    fn new() -> Self {
        Self {
            resource_manager: RwLock::new(None),
        }
    }
}

// ===== PUBLIC API =====

/// Main engine singleton manager
///
/// Manages the lifecycle of the engine subsystems using a singleton
/// pattern with thread-safe access.
///
/// # Example
///
/// ```no_run
/// use quasar_3d_engine::quasar3d::Engine;
///
/// Engine::initialize()?;
/// Engine::create_resource_manager()?;
///
/// let rm = Engine::resource_manager()?;
/// // Use rm.lock().unwrap()...
///
/// Engine::shutdown();
/// # Ok::<(), quasar_3d_engine::quasar3d::Error>(())
/// ```
pub struct Engine;

impl Engine {
    /// Helper to log errors before returning them (internal use)
    fn log_and_return_error(error: Error) -> Error {
        crate::engine_error!("quasar3d::Engine", "{}", error);
        error
    }

    /// Initialize the engine
    ///
    /// Must be called once at application startup before creating any
    /// subsystems.
    ///
    /// # Errors
    ///
    /// Currently always succeeds, but returns Result for future
    /// extensibility.
    pub fn initialize() -> Result<()> {
        ENGINE_STATE.get_or_init(EngineState::new);
        Ok(())
    }

    /// Shutdown the entire engine and destroy all singletons
    ///
    /// After calling this, `initialize()` must be called again before
    /// creating new subsystems.
    pub fn shutdown() {
        if let Some(state) = ENGINE_STATE.get() {
            if let Ok(mut rm) = state.resource_manager.write() {
                *rm = None;
            }
        }
    }

    // ===== RESOURCE MANAGER API =====

    /// Create and register the resource manager singleton
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The engine is not initialized
    /// - A resource manager already exists
    pub fn create_resource_manager() -> Result<()> {
        Self::register_resource_manager(ResourceManager::new())
    }

    /// Create and register a resource manager with a specific texture
    /// pool capacity (the texture pool is the engine's one fixed-size,
    /// concurrently shared pool).
    pub fn create_resource_manager_with_texture_capacity(capacity: u32) -> Result<()> {
        Self::register_resource_manager(ResourceManager::with_texture_capacity(capacity))
    }

    fn register_resource_manager(manager: ResourceManager) -> Result<()> {
        let state = ENGINE_STATE.get().ok_or_else(|| {
            Self::log_and_return_error(Error::InitializationFailed(
                "Engine not initialized. Call Engine::initialize() first.".to_string(),
            ))
        })?;

        let mut lock = state.resource_manager.write().map_err(|_| {
            Self::log_and_return_error(Error::InitializationFailed(
                "ResourceManager lock poisoned".to_string(),
            ))
        })?;

        if lock.is_some() {
            return Err(Self::log_and_return_error(Error::InitializationFailed(
                "ResourceManager already exists. Call Engine::destroy_resource_manager() first."
                    .to_string(),
            )));
        }

        *lock = Some(Arc::new(Mutex::new(manager)));

        crate::engine_info!("quasar3d::Engine", "ResourceManager singleton created successfully");

        Ok(())
    }

    /// Get the resource manager singleton
    ///
    /// # Returns
    ///
    /// A shared pointer to the ResourceManager wrapped in a Mutex for
    /// thread-safe access
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The engine is not initialized
    /// - The resource manager has not been created
    pub fn resource_manager() -> Result<Arc<Mutex<ResourceManager>>> {
        let state = ENGINE_STATE.get().ok_or_else(|| {
            Self::log_and_return_error(Error::InitializationFailed(
                "Engine not initialized. Call Engine::initialize() first.".to_string(),
            ))
        })?;

        let lock = state.resource_manager.read().map_err(|_| {
            Self::log_and_return_error(Error::InitializationFailed(
                "ResourceManager lock poisoned".to_string(),
            ))
        })?;

        lock.clone().ok_or_else(|| {
            Self::log_and_return_error(Error::InitializationFailed(
                "ResourceManager not created. Call Engine::create_resource_manager() first."
                    .to_string(),
            ))
        })
    }

    /// Destroy the resource manager singleton
    ///
    /// Removes the singleton, allowing a new one to be created. Existing
    /// references remain valid until dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine is not initialized
    pub fn destroy_resource_manager() -> Result<()> {
        let state = ENGINE_STATE.get().ok_or_else(|| {
            Self::log_and_return_error(Error::InitializationFailed(
                "Engine not initialized".to_string(),
            ))
        })?;

        let mut lock = state.resource_manager.write().map_err(|_| {
            Self::log_and_return_error(Error::InitializationFailed(
                "ResourceManager lock poisoned".to_string(),
            ))
        })?;

        *lock = None;

        crate::engine_info!("quasar3d::Engine", "ResourceManager singleton destroyed");

        Ok(())
    }

    /// Reset all singletons for testing (only available in test builds)
    #[cfg(test)]
    pub fn reset_for_testing() {
        if let Some(state) = ENGINE_STATE.get() {
            if let Ok(mut rm) = state.resource_manager.write() {
                *rm = None;
            }
        }
    }

    // ===== LOGGING API =====

    /// Set a custom logger
    ///
    /// Replace the default logger with a custom implementation (file
    /// logger, test capture, etc.)
    pub fn set_logger<L: Logger + 'static>(logger: L) {
        let logger_lock = LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger::default())));
        if let Ok(mut lock) = logger_lock.write() {
            *lock = Box::new(logger);
        }
    }

    /// Reset logger to the default colored console logger
    pub fn reset_logger() {
        let logger_lock = LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger::default())));
        if let Ok(mut lock) = logger_lock.write() {
            *lock = Box::new(DefaultLogger::default());
        }
    }

    /// Internal logging method (for simple logs without file:line)
    ///
    /// Used by the engine_trace!/debug!/info!/warn! macros.
    pub fn log(severity: LogSeverity, source: &str, message: String) {
        let logger_lock = LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger::default())));
        if let Ok(lock) = logger_lock.read() {
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
    /// Used by the engine_error! macro to include the source location.
    pub fn log_detailed(
        severity: LogSeverity,
        source: &str,
        message: String,
        file: &'static str,
        line: u32,
    ) {
        let logger_lock = LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger::default())));
        if let Ok(lock) = logger_lock.read() {
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

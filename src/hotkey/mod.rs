//! Global hotkey routing.
//!
//! [`HotkeyRouter`] owns the process-wide OS hotkey hook with an explicit
//! start/stop lifecycle. Bound combos map to [`CaptureIntent`]s; when a combo
//! fires, the listener thread only enqueues the intent on a channel for the
//! owning thread to process. It never touches settings, the overlay, or the
//! filesystem, so there is nothing to race against.

pub mod combo;

pub use combo::KeyCombo;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use global_hotkey::hotkey::HotKey;
use global_hotkey::{GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState};
use thiserror::Error;
use tokio::sync::mpsc;

use crate::capture::CaptureIntent;

#[derive(Debug, Error)]
pub enum HotkeyError {
    #[error("invalid hotkey '{spec}': {reason}")]
    Parse { spec: String, reason: String },

    #[error("hotkey '{combo}' is already bound to {existing:?}")]
    DuplicateBinding {
        combo: String,
        existing: CaptureIntent,
    },

    #[error("hotkey backend error: {0}")]
    Backend(String),
}

/// How long the listener thread waits for an event before re-checking the
/// shutdown flag.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Registers global key combinations and forwards fired intents over an
/// unbounded channel, decoupled from the UI thread.
pub struct HotkeyRouter {
    bindings: HashMap<KeyCombo, CaptureIntent>,
    intent_tx: mpsc::UnboundedSender<CaptureIntent>,
    manager: Option<GlobalHotKeyManager>,
    /// OS hotkey id -> (hook handle, intent), populated while started.
    registered: HashMap<u32, (HotKey, CaptureIntent)>,
    /// Shared with the listener thread so late registrations are visible.
    intents_by_id: Arc<Mutex<HashMap<u32, CaptureIntent>>>,
    listener: Option<thread::JoinHandle<()>>,
    running: Arc<AtomicBool>,
}

impl HotkeyRouter {
    /// Creates a router plus the receiving end of its intent channel.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<CaptureIntent>) {
        let (intent_tx, intent_rx) = mpsc::unbounded_channel();
        let router = Self {
            bindings: HashMap::new(),
            intent_tx,
            manager: None,
            registered: HashMap::new(),
            intents_by_id: Arc::new(Mutex::new(HashMap::new())),
            listener: None,
            running: Arc::new(AtomicBool::new(false)),
        };
        (router, intent_rx)
    }

    /// Binds a combo string to an intent.
    ///
    /// Re-registering a combo for the same intent replaces the previous
    /// binding (and its OS hook, when started) without leaking it. Binding a
    /// combo that the *other* intent already holds fails with
    /// [`HotkeyError::DuplicateBinding`].
    pub fn register(&mut self, spec: &str, intent: CaptureIntent) -> Result<(), HotkeyError> {
        let combo = KeyCombo::parse(spec)?;

        if let Some(&existing) = self.bindings.get(&combo) {
            if existing != intent {
                return Err(HotkeyError::DuplicateBinding {
                    combo: combo.to_string(),
                    existing,
                });
            }
            // Same combo, same intent: drop the old hook before re-hooking.
            if self.manager.is_some() {
                self.unhook_combo(&combo);
            }
        }

        // An intent keeps at most one combo; rebinding it replaces the old one.
        if let Some(old) = self
            .bindings
            .iter()
            .find(|(c, i)| **i == intent && **c != combo)
            .map(|(c, _)| c.clone())
        {
            log::debug!("rebinding {intent:?} from '{old}' to '{combo}'");
            if self.manager.is_some() {
                self.unhook_combo(&old);
            }
            self.bindings.remove(&old);
        }

        if self.manager.is_some() {
            self.hook(&combo, intent)?;
        }
        self.bindings.insert(combo, intent);
        Ok(())
    }

    /// Acquires the OS hook, registers all bindings, and starts the listener
    /// thread. Calling `start` on a started router is a no-op.
    pub fn start(&mut self) -> Result<(), HotkeyError> {
        if self.manager.is_some() {
            return Ok(());
        }

        let manager = GlobalHotKeyManager::new().map_err(|e| HotkeyError::Backend(e.to_string()))?;
        self.manager = Some(manager);

        let bindings: Vec<_> = self
            .bindings
            .iter()
            .map(|(c, i)| (c.clone(), *i))
            .collect();
        for (combo, intent) in bindings {
            if let Err(e) = self.hook(&combo, intent) {
                self.stop();
                return Err(e);
            }
        }

        self.running.store(true, Ordering::SeqCst);
        let running = Arc::clone(&self.running);
        let intents_by_id = Arc::clone(&self.intents_by_id);
        let intent_tx = self.intent_tx.clone();

        self.listener = Some(
            thread::Builder::new()
                .name("hotkey-listener".to_string())
                .spawn(move || {
                    let receiver = GlobalHotKeyEvent::receiver();
                    while running.load(Ordering::SeqCst) {
                        let event = match receiver.recv_timeout(POLL_INTERVAL) {
                            Ok(event) => event,
                            Err(crossbeam_channel::RecvTimeoutError::Timeout) => continue,
                            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => break,
                        };
                        if event.state() != HotKeyState::Pressed {
                            continue;
                        }
                        let intent = intents_by_id
                            .lock()
                            .ok()
                            .and_then(|map| map.get(&event.id()).copied());
                        if let Some(intent) = intent {
                            log::debug!("hotkey fired: {intent:?}");
                            if intent_tx.send(intent).is_err() {
                                // Receiver gone; the app is shutting down.
                                break;
                            }
                        }
                    }
                })
                .map_err(|e| HotkeyError::Backend(e.to_string()))?,
        );

        log::info!("hotkey router started with {} binding(s)", self.bindings.len());
        Ok(())
    }

    /// Unregisters all bindings and releases the OS hook and listener thread.
    /// Idempotent; safe to call on a router that was never started.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(listener) = self.listener.take() {
            let _ = listener.join();
        }

        if let Some(manager) = self.manager.take() {
            for (hotkey, _) in self.registered.values() {
                if let Err(e) = manager.unregister(*hotkey) {
                    log::warn!("failed to unregister hotkey: {e}");
                }
            }
        }
        self.registered.clear();
        self.bindings.clear();
        if let Ok(mut map) = self.intents_by_id.lock() {
            map.clear();
        }
        log::debug!("hotkey router stopped");
    }

    fn hook(&mut self, combo: &KeyCombo, intent: CaptureIntent) -> Result<(), HotkeyError> {
        let manager = self
            .manager
            .as_ref()
            .ok_or_else(|| HotkeyError::Backend("router not started".to_string()))?;
        let hotkey = combo.to_hotkey()?;
        manager
            .register(hotkey)
            .map_err(|e| HotkeyError::Backend(e.to_string()))?;
        self.registered.insert(hotkey.id(), (hotkey, intent));
        if let Ok(mut map) = self.intents_by_id.lock() {
            map.insert(hotkey.id(), intent);
        }
        log::info!("registered hotkey '{combo}' for {intent:?}");
        Ok(())
    }

    fn unhook_combo(&mut self, combo: &KeyCombo) {
        let Ok(hotkey) = combo.to_hotkey() else {
            return;
        };
        if let Some((hotkey, _)) = self.registered.remove(&hotkey.id()) {
            if let Some(manager) = self.manager.as_ref() {
                if let Err(e) = manager.unregister(hotkey) {
                    log::warn!("failed to unregister hotkey '{combo}': {e}");
                }
            }
            if let Ok(mut map) = self.intents_by_id.lock() {
                map.remove(&hotkey.id());
            }
        }
    }
}

impl Drop for HotkeyRouter {
    fn drop(&mut self) {
        self.stop();
    }
}

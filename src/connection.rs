//! Connection lifecycle tracker.
//!
//! ```text
//!            connected(ok)
//!   ┌──────┐ ─────────────▶ ┌───────────┐
//!   │ Idle │                │ Connected │
//!   └──────┘ ◀───────────── └───────────┘
//!     ▲  │   disconnected | recycled
//!     └──┘
//!   connected(err)
//! ```
//!
//! Runs in the stack's notification context: every handler is
//! non-blocking and only records state, emits events, and submits
//! intents. Advertising is restarted by submitting
//! [`AdvTrigger::Recycled`] once the stack has released the connection
//! object; a disconnect alone never restarts advertising because the
//! object may still be held and a start would fail for lack of a free
//! connection slot.
//!
//! At most one link is tracked. Handle-bearing notifications that do not
//! match the active link are rejected with [`LinkError`], logged at error
//! level, and reported as [`AppEvent::LinkViolation`].

use core::fmt;

use log::{error, info, warn};

use crate::app::events::AppEvent;
use crate::app::intents::AdvTrigger;
use crate::app::notifications::{STATUS_SUCCESS, StackNotification, StatusCode};
use crate::app::ports::EventSink;
use crate::bond::BleAddress;
use crate::deferred::IntentQueue;
use crate::error::LinkError;

/// Stack-assigned connection handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnHandle(pub u16);

impl fmt::Display for ConnHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Link security level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SecurityLevel {
    /// No encryption.
    None,
    /// Encrypted, unauthenticated (Just Works).
    Encrypted,
    /// Encrypted with MITM protection.
    Authenticated,
}

impl SecurityLevel {
    /// Map a numeric security level (1 = none, 2 = encrypted,
    /// 3 = authenticated, 4 = authenticated LE Secure Connections).
    pub const fn from_raw(level: u8) -> Self {
        match level {
            0 | 1 => Self::None,
            2 => Self::Encrypted,
            _ => Self::Authenticated,
        }
    }
}

impl fmt::Display for SecurityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Encrypted => write!(f, "encrypted"),
            Self::Authenticated => write!(f, "authenticated"),
        }
    }
}

/// The one link currently up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveLink {
    pub handle: ConnHandle,
    pub peer: BleAddress,
    pub security: SecurityLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Idle,
    Connected(ActiveLink),
}

/// Tracks the single link and turns recycle notifications into
/// advertising restarts.
pub struct ConnectionTracker<'q> {
    queue: &'q IntentQueue,
    state: LinkState,
    last_released: Option<ConnHandle>,
}

impl<'q> ConnectionTracker<'q> {
    pub const fn new(queue: &'q IntentQueue) -> Self {
        Self {
            queue,
            state: LinkState::Idle,
            last_released: None,
        }
    }

    /// Dispatch one stack notification to its handler.
    pub fn on_notification(
        &mut self,
        notification: StackNotification,
        sink: &mut impl EventSink,
    ) -> Result<(), LinkError> {
        match notification {
            StackNotification::Connected {
                handle,
                peer,
                status,
            } => self.on_connected(handle, peer, status, sink),
            StackNotification::Disconnected { handle, reason } => {
                self.on_disconnected(handle, reason, sink)
            }
            StackNotification::Recycled => {
                self.on_recycled(sink);
                Ok(())
            }
            StackNotification::SecurityChanged {
                handle,
                level,
                status,
            } => self.on_security_changed(handle, level, status, sink),
            StackNotification::PasskeyDisplay { handle, passkey } => {
                self.on_passkey_display(handle, passkey, sink)
            }
            StackNotification::PairingCancelled { handle } => {
                self.on_pairing_cancelled(handle, sink)
            }
        }
    }

    /// A link attempt completed. A failed attempt acquires no handle and
    /// leaves the state untouched.
    pub fn on_connected(
        &mut self,
        handle: ConnHandle,
        peer: BleAddress,
        status: StatusCode,
        sink: &mut impl EventSink,
    ) -> Result<(), LinkError> {
        if status != STATUS_SUCCESS {
            warn!("LINK: connection failed (err 0x{:02x})", status);
            sink.emit(&AppEvent::LinkFailed { status });
            return Ok(());
        }

        if let LinkState::Connected(active) = self.state {
            return Err(reject(
                LinkError::AlreadyConnected {
                    active: active.handle,
                    incoming: handle,
                },
                sink,
            ));
        }

        info!("LINK: connected {} {}", handle, peer);
        self.state = LinkState::Connected(ActiveLink {
            handle,
            peer,
            security: SecurityLevel::None,
        });
        sink.emit(&AppEvent::LinkUp { handle, peer });
        Ok(())
    }

    /// The link went down. Advertising is not restarted here.
    pub fn on_disconnected(
        &mut self,
        handle: ConnHandle,
        reason: u8,
        sink: &mut impl EventSink,
    ) -> Result<(), LinkError> {
        let link = match self.active(handle) {
            Ok(link) => link,
            Err(e) => return Err(reject(e, sink)),
        };
        info!("LINK: disconnected {} (reason 0x{:02x})", link.peer, reason);
        self.release(handle);
        sink.emit(&AppEvent::LinkDown { handle, reason });
        Ok(())
    }

    /// The stack released the connection object: queue an advertising
    /// restart. A recycle without a preceding disconnect also releases
    /// the active link.
    pub fn on_recycled(&mut self, sink: &mut impl EventSink) {
        if let LinkState::Connected(active) = self.state {
            warn!("LINK: recycled while {} still up, releasing", active.handle);
            self.release(active.handle);
        }
        info!("LINK: connection object recycled, queueing advertising restart");
        sink.emit(&AppEvent::LinkRecycled);
        self.queue.submit(AdvTrigger::Recycled);
    }

    /// Security procedure finished. On failure the level is unchanged.
    pub fn on_security_changed(
        &mut self,
        handle: ConnHandle,
        level: SecurityLevel,
        status: StatusCode,
        sink: &mut impl EventSink,
    ) -> Result<(), LinkError> {
        let mut link = match self.active(handle) {
            Ok(link) => link,
            Err(e) => return Err(reject(e, sink)),
        };

        if status != STATUS_SUCCESS {
            warn!(
                "LINK: security failed: {} level {} err 0x{:02x}",
                link.peer, level, status
            );
            sink.emit(&AppEvent::SecurityFailed {
                handle,
                level,
                status,
            });
            return Ok(());
        }

        info!("LINK: security changed: {} level {}", link.peer, level);
        link.security = level;
        self.state = LinkState::Connected(link);
        sink.emit(&AppEvent::SecurityChanged { handle, level });
        Ok(())
    }

    pub fn on_passkey_display(
        &mut self,
        handle: ConnHandle,
        passkey: u32,
        sink: &mut impl EventSink,
    ) -> Result<(), LinkError> {
        let link = match self.active(handle) {
            Ok(link) => link,
            Err(e) => return Err(reject(e, sink)),
        };
        info!("LINK: enter passkey on {}: {:06}", link.peer, passkey);
        sink.emit(&AppEvent::PasskeyDisplay { handle, passkey });
        Ok(())
    }

    pub fn on_pairing_cancelled(
        &mut self,
        handle: ConnHandle,
        sink: &mut impl EventSink,
    ) -> Result<(), LinkError> {
        let link = match self.active(handle) {
            Ok(link) => link,
            Err(e) => return Err(reject(e, sink)),
        };
        info!("LINK: pairing cancelled: {}", link.peer);
        sink.emit(&AppEvent::PairingCancelled { handle });
        Ok(())
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn active_link(&self) -> Option<&ActiveLink> {
        match &self.state {
            LinkState::Connected(link) => Some(link),
            LinkState::Idle => None,
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self.state, LinkState::Connected(_))
    }

    // ── Internal ──────────────────────────────────────────────

    /// The active link, if `handle` refers to it.
    fn active(&self, handle: ConnHandle) -> Result<ActiveLink, LinkError> {
        match self.state {
            LinkState::Connected(link) if link.handle == handle => Ok(link),
            _ if self.last_released == Some(handle) => Err(LinkError::StaleHandle(handle)),
            _ => Err(LinkError::UnknownHandle(handle)),
        }
    }

    fn release(&mut self, handle: ConnHandle) {
        self.state = LinkState::Idle;
        self.last_released = Some(handle);
    }
}

fn reject(err: LinkError, sink: &mut impl EventSink) -> LinkError {
    error!("LINK: {}", err);
    sink.emit(&AppEvent::LinkViolation(err));
    err
}

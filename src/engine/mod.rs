mod error;
mod mutations;
pub mod policy;
mod queries;

pub use error::EngineError;
pub use policy::{AllOf, BusinessHours, NoOverlap, SchedulingPolicy, WeekdayOnly};

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tokio::sync::{RwLock, mpsc, oneshot};

use crate::journal::Journal;
use crate::model::*;

pub type SharedRoomState = Arc<RwLock<RoomState>>;

// ── Group-commit journal channel ─────────────────────────

pub(super) enum JournalCommand {
    Append {
        event: Event,
        response: oneshot::Sender<io::Result<()>>,
    },
    Compact {
        events: Vec<Event>,
        response: oneshot::Sender<io::Result<()>>,
    },
    AppendsSinceCompact {
        response: oneshot::Sender<u64>,
    },
}

/// Sole owner of the open journal. Appends are group-committed: the first
/// Append blocks the loop, everything already sitting in the channel joins
/// its batch, and one fsync covers them all before any caller gets an ack.
/// Compaction runs on the same task, so it can never interleave with a
/// half-written batch.
async fn journal_writer_loop(mut journal: Journal, mut rx: mpsc::Receiver<JournalCommand>) {
    while let Some(cmd) = rx.recv().await {
        match cmd {
            JournalCommand::Append { event, response } => {
                let mut batch = vec![(event, response)];

                loop {
                    match rx.try_recv() {
                        Ok(JournalCommand::Append { event, response }) => {
                            batch.push((event, response));
                        }
                        Ok(other) => {
                            // A non-append closes the batch window.
                            flush_and_respond(&mut journal, &mut batch);
                            handle_non_append(&mut journal, other);
                            break;
                        }
                        Err(_) => break,
                    }
                }

                if !batch.is_empty() {
                    flush_and_respond(&mut journal, &mut batch);
                }
            }
            other => handle_non_append(&mut journal, other),
        }
    }
}

fn flush_and_respond(
    journal: &mut Journal,
    batch: &mut Vec<(Event, oneshot::Sender<io::Result<()>>)>,
) {
    metrics::histogram!(crate::observability::JOURNAL_FLUSH_BATCH_SIZE)
        .record(batch.len() as f64);
    let flush_start = std::time::Instant::now();
    let result = write_batch(journal, batch);
    metrics::histogram!(crate::observability::JOURNAL_FLUSH_DURATION_SECONDS)
        .record(flush_start.elapsed().as_secs_f64());

    // Every waiter gets the same verdict: the whole batch shares one fsync.
    for (_, tx) in batch.drain(..) {
        let r = match &result {
            Ok(()) => Ok(()),
            Err(e) => Err(io::Error::new(e.kind(), e.to_string())),
        };
        let _ = tx.send(r);
    }
}

fn write_batch(
    journal: &mut Journal,
    batch: &mut [(Event, oneshot::Sender<io::Result<()>>)],
) -> io::Result<()> {
    let mut append_err: Option<io::Error> = None;
    for (event, _) in batch.iter() {
        if let Err(e) = journal.append_buffered(event) {
            append_err = Some(e);
            break;
        }
    }
    // Flush even after an append error, or partially buffered bytes from a
    // batch we reported as failed would ride along with the next one.
    let flush_err = journal.flush_sync().err();
    if let Some(e) = append_err {
        return Err(e);
    }
    if let Some(e) = flush_err {
        return Err(e);
    }
    Ok(())
}

fn handle_non_append(journal: &mut Journal, cmd: JournalCommand) {
    match cmd {
        JournalCommand::Compact { events, response } => {
            let result = Journal::write_compact_file(journal.path(), &events)
                .and_then(|()| journal.swap_compact_file());
            let _ = response.send(result);
        }
        JournalCommand::AppendsSinceCompact { response } => {
            let _ = response.send(journal.appends_since_compact());
        }
        JournalCommand::Append { .. } => unreachable!(),
    }
}

/// The booking orchestrator. Sole owner of the no-double-booking invariant:
/// all booking creation goes through the room's write lock, so the
/// read-existing / validate / insert sequence is serialized per room.
pub struct Engine {
    users: DashMap<UserId, User>,
    rooms: DashMap<RoomId, SharedRoomState>,
    /// Reverse lookup: booking id → room id.
    booking_to_room: DashMap<BookingId, RoomId>,
    next_user_id: AtomicU64,
    next_room_id: AtomicU64,
    next_booking_id: AtomicU64,
    journal_tx: mpsc::Sender<JournalCommand>,
    policy: Box<dyn SchedulingPolicy>,
}

impl Engine {
    /// Replay the journal at `journal_path` and start the background
    /// group-commit writer. `policy` is the booking admission strategy —
    /// injected here so alternative rules swap in without touching the
    /// orchestrator.
    pub fn new(journal_path: PathBuf, policy: Box<dyn SchedulingPolicy>) -> io::Result<Self> {
        let events = Journal::replay(&journal_path)?;
        let journal = Journal::open(&journal_path)?;
        let (journal_tx, journal_rx) = mpsc::channel(4096);
        tokio::spawn(journal_writer_loop(journal, journal_rx));

        let engine = Self {
            users: DashMap::new(),
            rooms: DashMap::new(),
            booking_to_room: DashMap::new(),
            next_user_id: AtomicU64::new(1),
            next_room_id: AtomicU64::new(1),
            next_booking_id: AtomicU64::new(1),
            journal_tx,
            policy,
        };

        // Next ids are max created id + 1 — deletes don't free ids as long as
        // the creation event survives in the journal. Compaction drops events
        // for deleted entities, at which point their ids become reusable.
        let mut max_user: UserId = 0;
        let mut max_room: RoomId = 0;
        let mut max_booking: BookingId = 0;

        // Nothing else holds these Arcs yet, so try_read/try_write cannot
        // fail here.
        for event in events {
            match event {
                Event::UserCreated { id, name, email } => {
                    max_user = max_user.max(id);
                    engine.users.insert(id, User { id, name, email });
                }
                Event::UserDeleted { id } => {
                    engine.users.remove(&id);
                }
                Event::RoomCreated { id, name, capacity, location } => {
                    max_room = max_room.max(id);
                    let rs = RoomState::new(id, name, capacity, location);
                    engine.rooms.insert(id, Arc::new(RwLock::new(rs)));
                }
                Event::RoomDeleted { id } => {
                    if let Some((_, rs)) = engine.rooms.remove(&id) {
                        let guard = rs.try_read().expect("replay: uncontended read");
                        for booking in &guard.bookings {
                            engine.booking_to_room.remove(&booking.id);
                        }
                    }
                }
                Event::BookingCreated { id, room_id, user_id, span } => {
                    max_booking = max_booking.max(id);
                    if let Some(entry) = engine.rooms.get(&room_id) {
                        let rs = entry.value().clone();
                        let mut guard = rs.try_write().expect("replay: uncontended write");
                        guard.insert_booking(Booking { id, room_id, user_id, span });
                        engine.booking_to_room.insert(id, room_id);
                    }
                }
                Event::BookingCancelled { id, room_id } => {
                    if let Some(entry) = engine.rooms.get(&room_id) {
                        let rs = entry.value().clone();
                        let mut guard = rs.try_write().expect("replay: uncontended write");
                        guard.remove_booking(id);
                    }
                    engine.booking_to_room.remove(&id);
                }
            }
        }

        engine.next_user_id.store(max_user + 1, Ordering::Relaxed);
        engine.next_room_id.store(max_room + 1, Ordering::Relaxed);
        engine.next_booking_id.store(max_booking + 1, Ordering::Relaxed);

        Ok(engine)
    }

    /// Write an event to the journal via the background group-commit writer.
    /// Called BEFORE the in-memory mutation — a journal failure leaves memory
    /// and disk in agreement (both without the change).
    pub(super) async fn journal_append(&self, event: &Event) -> Result<(), EngineError> {
        let (tx, rx) = oneshot::channel();
        self.journal_tx
            .send(JournalCommand::Append {
                event: event.clone(),
                response: tx,
            })
            .await
            .map_err(|_| EngineError::Journal("journal writer shut down".into()))?;
        rx.await
            .map_err(|_| EngineError::Journal("journal writer dropped response".into()))?
            .map_err(|e| EngineError::Journal(e.to_string()))
    }

    pub fn get_room(&self, id: &RoomId) -> Option<SharedRoomState> {
        self.rooms.get(id).map(|e| e.value().clone())
    }

    pub fn get_user(&self, id: &UserId) -> Option<User> {
        self.users.get(id).map(|e| e.value().clone())
    }

    pub fn room_for_booking(&self, booking_id: &BookingId) -> Option<RoomId> {
        self.booking_to_room.get(booking_id).map(|e| *e.value())
    }

    pub(super) fn alloc_user_id(&self) -> UserId {
        self.next_user_id.fetch_add(1, Ordering::Relaxed)
    }

    pub(super) fn alloc_room_id(&self) -> RoomId {
        self.next_room_id.fetch_add(1, Ordering::Relaxed)
    }

    pub(super) fn alloc_booking_id(&self) -> BookingId {
        self.next_booking_id.fetch_add(1, Ordering::Relaxed)
    }
}

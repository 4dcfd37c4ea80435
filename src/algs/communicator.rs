//! Thin façade over intra-process or inter-process (MPI) message passing.
//!
//! Messages are *contiguous byte slices*. All handles are **waitable**:
//! blocking semantics are obtained by posting and immediately calling
//! `.wait()`, which is what every call site in `balance` does; the planner
//! protocol has no overlap to exploit.

use std::collections::VecDeque;
use std::sync::Arc;
use std::thread::JoinHandle;

use bytes::Bytes;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use parking_lot::Mutex;

/// Typed message tag. Planning epochs reserve a small contiguous block of
/// tags via [`CommTag::offset`] so concurrent protocols never collide.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct CommTag(pub u16);

impl CommTag {
    pub const fn new(v: u16) -> Self {
        Self(v)
    }
    pub const fn as_u16(self) -> u16 {
        self.0
    }
    /// A tag `n` slots above this one.
    pub const fn offset(self, n: u16) -> Self {
        Self(self.0 + n)
    }
}

/// Point-to-point communication interface (minimal by design).
///
/// Delivery is assumed reliable, exactly-once, and FIFO per
/// `(sender, receiver, tag)`, as MPI guarantees. There is no timeout:
/// a peer that never sends stalls the matching `wait()`. Callers needing
/// liveness guarantees wrap their backend at this seam.
pub trait Communicator: Send + Sync + 'static {
    /// Handle returned by `isend`.
    type SendHandle: Wait;
    /// Handle returned by `irecv`.
    type RecvHandle: Wait;

    /// This process's rank id in `[0, size)`.
    fn rank(&self) -> usize;
    /// Number of cooperating ranks.
    fn size(&self) -> usize;

    fn isend(&self, peer: usize, tag: u16, buf: &[u8]) -> Self::SendHandle;
    fn irecv(&self, peer: usize, tag: u16, buf: &mut [u8]) -> Self::RecvHandle;
}

/// Anything that can be waited on.
pub trait Wait {
    /// Wait for completion and return the received data (if any).
    fn wait(self) -> Option<Vec<u8>>;
}

impl Wait for () {
    fn wait(self) -> Option<Vec<u8>> {
        None
    }
}

/// Compile-time no-op comm for pure serial unit tests: one rank, no peers.
#[derive(Clone, Debug, Default)]
pub struct NoComm;

impl Communicator for NoComm {
    type SendHandle = ();
    type RecvHandle = ();

    fn rank(&self) -> usize {
        0
    }
    fn size(&self) -> usize {
        1
    }
    fn isend(&self, _peer: usize, _tag: u16, _buf: &[u8]) {}
    fn irecv(&self, _peer: usize, _tag: u16, _buf: &mut [u8]) {}
}

// --- LocalComm: intra-process, thread-per-rank ---

type Key = (usize, usize, u16); // (src, dst, tag)

/// Process-wide mailbox; one FIFO queue per `(src, dst, tag)` key.
static MAILBOX: Lazy<DashMap<Key, Mutex<VecDeque<Bytes>>>> = Lazy::new(DashMap::new);

pub struct LocalHandle {
    buf: Arc<Mutex<Option<Vec<u8>>>>,
    handle: Option<JoinHandle<()>>,
}

impl Wait for LocalHandle {
    fn wait(mut self) -> Option<Vec<u8>> {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
        let mut guard = self.buf.lock();
        guard.take()
    }
}

/// In-process backend: every simulated rank owns one `LocalComm` and runs on
/// its own thread; messages pass through the process-wide [`MAILBOX`].
///
/// Tests sharing the mailbox must either use disjoint tag blocks or run under
/// `#[serial]`.
#[derive(Clone, Debug)]
pub struct LocalComm {
    rank: usize,
    size: usize,
}

impl LocalComm {
    pub fn new(rank: usize, size: usize) -> Self {
        Self { rank, size }
    }
}

impl Communicator for LocalComm {
    type SendHandle = ();
    type RecvHandle = LocalHandle;

    fn rank(&self) -> usize {
        self.rank
    }
    fn size(&self) -> usize {
        self.size
    }

    fn isend(&self, peer: usize, tag: u16, buf: &[u8]) {
        let key = (self.rank, peer, tag);
        let queue = MAILBOX.entry(key).or_insert_with(|| Mutex::new(VecDeque::new()));
        queue.lock().push_back(Bytes::copy_from_slice(buf));
    }

    fn irecv(&self, peer: usize, tag: u16, buf: &mut [u8]) -> LocalHandle {
        let key = (peer, self.rank, tag);
        let buf_arc = Arc::new(Mutex::new(None));
        let buf_arc_clone = buf_arc.clone();
        let buf_len = buf.len();
        let handle = std::thread::spawn(move || loop {
            let popped = MAILBOX
                .get(&key)
                .and_then(|queue| queue.lock().pop_front());
            if let Some(bytes) = popped {
                let n = buf_len.min(bytes.len());
                *buf_arc_clone.lock() = Some(bytes[..n].to_vec());
                break;
            }
            std::thread::yield_now();
        });
        LocalHandle {
            buf: buf_arc,
            handle: Some(handle),
        }
    }
}

// --- MPI backend (feature = "mpi-support") ---
#[cfg(feature = "mpi-support")]
mod mpi_backend {
    use super::Wait;
    use mpi::topology::SimpleCommunicator;
    use mpi::traits::*;

    /// MPI-backed communicator over the world communicator.
    ///
    /// Sends complete before `isend` returns and receives complete inside
    /// `irecv`; the handles only carry results through the [`Wait`] contract.
    pub struct MpiComm {
        world: SimpleCommunicator,
        rank: usize,
        size: usize,
    }

    impl MpiComm {
        /// Wrap an already-initialized world communicator.
        pub fn new(world: SimpleCommunicator) -> Self {
            let rank = world.rank() as usize;
            let size = world.size() as usize;
            Self { world, rank, size }
        }
    }

    pub struct MpiRecvHandle(Option<Vec<u8>>);

    impl Wait for MpiRecvHandle {
        fn wait(self) -> Option<Vec<u8>> {
            self.0
        }
    }

    impl super::Communicator for MpiComm {
        type SendHandle = ();
        type RecvHandle = MpiRecvHandle;

        fn rank(&self) -> usize {
            self.rank
        }
        fn size(&self) -> usize {
            self.size
        }

        fn isend(&self, peer: usize, tag: u16, buf: &[u8]) {
            self.world
                .process_at_rank(peer as i32)
                .send_with_tag(buf, tag as i32);
        }

        fn irecv(&self, peer: usize, tag: u16, buf: &mut [u8]) -> MpiRecvHandle {
            let (data, _status) = self
                .world
                .process_at_rank(peer as i32)
                .receive_vec_with_tag::<u8>(tag as i32);
            let n = buf.len().min(data.len());
            buf[..n].copy_from_slice(&data[..n]);
            MpiRecvHandle(Some(data))
        }
    }
}

#[cfg(feature = "mpi-support")]
pub use mpi_backend::MpiComm;

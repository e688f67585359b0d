//! Trace and span id generation.

use crate::span::{SpanId, TraceId};
use rand::{rngs, Rng, SeedableRng};
use std::cell::RefCell;
use std::fmt;

/// Interface for generating trace and span ids.
pub trait IdGenerator: Send + Sync + fmt::Debug {
    /// Generate a new trace id.
    fn new_trace_id(&self) -> TraceId;

    /// Generate a new span id.
    fn new_span_id(&self) -> SpanId;
}

/// Default [`IdGenerator`] implementation.
///
/// Draws random non-zero ids from a thread-local rng. Collisions are
/// treated as practically impossible; ids are not checked against spans
/// already in memory.
#[derive(Clone, Debug, Default)]
pub struct RandomIdGenerator {
    _private: (),
}

impl IdGenerator for RandomIdGenerator {
    fn new_trace_id(&self) -> TraceId {
        with_rng(|rng| loop {
            let id = rng.random::<u128>();
            if id != 0 {
                return TraceId::from(id);
            }
        })
    }

    fn new_span_id(&self) -> SpanId {
        with_rng(|rng| loop {
            let id = rng.random::<u64>();
            if id != 0 {
                return SpanId::from(id);
            }
        })
    }
}

thread_local! {
    /// Store random number generator for each thread
    static CURRENT_RNG: RefCell<rngs::SmallRng> = RefCell::new(rngs::SmallRng::from_os_rng());
}

/// Run `f` with the thread-local rng shared by id generation and sampling.
pub(crate) fn with_rng<T>(f: impl FnOnce(&mut rngs::SmallRng) -> T) -> T {
    CURRENT_RNG.with(|rng| f(&mut rng.borrow_mut()))
}

#[cfg(any(test, feature = "testing"))]
mod increment {
    use crate::id_generator::IdGenerator;
    use crate::span::{SpanId, TraceId};
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    /// [`IdGenerator`] that increments a counter for each new id, producing
    /// predictable ids for tests.
    #[derive(Clone, Debug)]
    pub struct IncrementIdGenerator(Arc<AtomicU64>);

    impl IncrementIdGenerator {
        /// Create a new [`IncrementIdGenerator`] starting at 1.
        pub fn new() -> Self {
            Self::default()
        }
    }

    impl Default for IncrementIdGenerator {
        fn default() -> Self {
            Self(Arc::new(AtomicU64::new(1)))
        }
    }

    impl IdGenerator for IncrementIdGenerator {
        fn new_trace_id(&self) -> TraceId {
            TraceId::from(self.0.fetch_add(1, Ordering::SeqCst) as u128)
        }

        fn new_span_id(&self) -> SpanId {
            SpanId::from(self.0.fetch_add(1, Ordering::SeqCst))
        }
    }
}

#[cfg(any(test, feature = "testing"))]
pub use increment::IncrementIdGenerator;

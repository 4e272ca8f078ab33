//! FIFO and delayed queues over atomic store scripts.
//!
//! Each queue name owns two collections: a plain list for [`enqueue`] /
//! [`dequeue`], and a set ordered by ready-at time for the delayed
//! operations. A delayed item is either waiting, due, or gone; taking a due
//! item is one atomic script, so concurrent consumers never both receive it.
//!
//! [`enqueue`]: DelayedQueue::enqueue
//! [`dequeue`]: DelayedQueue::dequeue

mod clock;
mod config;
mod delayed;
mod error;
pub(crate) mod scripts;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{QueueConfig, DEFAULT_DELAYED_NAMESPACE, DEFAULT_QUEUE_NAMESPACE};
pub use delayed::DelayedQueue;
pub use error::QueueError;

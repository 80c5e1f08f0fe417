use thiserror::Error;

pub type PhaserResult<T> = std::result::Result<T, PhaserError>;

/// Call-discipline violations a phaser can observe.
///
/// A phaser has no recoverable failure modes: every variant here means a
/// caller broke the participation contract. The panicking entry points
/// ([`crate::Phaser::arrive_and_wait`], [`crate::Phaser::arrive_and_drop`])
/// turn these into panics, the `try_` variants hand them back.
#[derive(Clone, Debug, Eq, PartialEq, Copy, Error)]
pub enum PhaserError {
    /// An arrival found the countdown already at zero, so more threads
    /// arrived in this phase than there are participants. Typical causes are
    /// a thread arriving after `arrive_and_drop`, or a completion callback
    /// re-entering the phaser it is completing.
    #[error("more arrivals than participants in phase {generation}: a departed or reentrant caller arrived")]
    ArrivalOverflow { generation: u64 },
}

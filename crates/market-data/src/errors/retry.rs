/// Classification for how a refresh cycle reacts to an error.
///
/// # Behavior Summary
///
/// | Class | Abort cycle? | Back off throttle? |
/// |-------|--------------|--------------------|
/// | `Never` | n/a | No |
/// | `BackOff` | Yes | Yes |
/// | `NextCycle` | Yes | No |
/// | `SkipEntry` | No (skip one ticker) | No |
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RetryClass {
    /// Terminal or lifecycle error. Retrying won't help.
    Never,

    /// The remote service signalled trouble (non-success status, timeout,
    /// connection failure). The throttle window is pushed out so the next
    /// scheduled attempt is delayed further.
    BackOff,

    /// The endpoint answered but the payload could not be used.
    /// Expected to self-correct, so the next cycle runs on its normal cadence.
    NextCycle,

    /// A single ticker record is unusable. The rest of the payload is
    /// still processed.
    SkipEntry,
}

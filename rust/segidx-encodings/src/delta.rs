use segidx_common::error::Error;

/// Running state carried from one value to the next while encoding or decoding
/// a column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeltaState {
    /// Last raw value.
    pub prev: i64,
    /// Difference between the last two raw values (used by the second-order step).
    pub prev_delta: i64,
}

impl DeltaState {
    pub fn new(initial: i64) -> DeltaState {
        DeltaState {
            prev: initial,
            prev_delta: 0,
        }
    }
}

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeltaKind {
    Delta = 1,
    DeltaDelta = 2,
}

impl TryFrom<u8> for DeltaKind {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(DeltaKind::Delta),
            2 => Ok(DeltaKind::DeltaDelta),
            _ => Err(Error::invalid_format("column delta kind")),
        }
    }
}

/// Strategy that turns raw values into residuals and back.
///
/// Encoding and decoding must be driven with the same sequence of states, starting
/// from `DeltaState::new(initial)`.
pub trait DeltaStep {
    const KIND: DeltaKind;

    fn encode(state: &mut DeltaState, value: i64) -> i64;

    fn decode(state: &mut DeltaState, residual: i64) -> i64;
}

/// First-order delta: the residual is the difference from the previous value.
#[derive(Debug, Clone, Copy, Default)]
pub struct Delta;

impl DeltaStep for Delta {
    const KIND: DeltaKind = DeltaKind::Delta;

    #[inline]
    fn encode(state: &mut DeltaState, value: i64) -> i64 {
        let residual = value.wrapping_sub(state.prev);
        state.prev = value;
        residual
    }

    #[inline]
    fn decode(state: &mut DeltaState, residual: i64) -> i64 {
        state.prev = state.prev.wrapping_add(residual);
        state.prev
    }
}

/// Second-order delta: the residual is the change of the difference between
/// consecutive values. Near-linear sequences produce residuals close to zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeltaDelta;

impl DeltaStep for DeltaDelta {
    const KIND: DeltaKind = DeltaKind::DeltaDelta;

    #[inline]
    fn encode(state: &mut DeltaState, value: i64) -> i64 {
        let delta = value.wrapping_sub(state.prev);
        let residual = delta.wrapping_sub(state.prev_delta);
        state.prev = value;
        state.prev_delta = delta;
        residual
    }

    #[inline]
    fn decode(state: &mut DeltaState, residual: i64) -> i64 {
        let delta = state.prev_delta.wrapping_add(residual);
        state.prev = state.prev.wrapping_add(delta);
        state.prev_delta = delta;
        state.prev
    }
}
